#![forbid(unsafe_code)]

//! End-to-end behavior of overlays, overflow rows, and the clone/dropdown
//! pair, driven through the headless DOM.
//!
//! Run:
//!   cargo test -p popkit-widgets --test overlay_properties

use std::cell::Cell;
use std::rc::Rc;

use popkit_layout::compute;
use popkit_runtime::{Duration, EventLoop};
use popkit_widgets::headless::{HeadlessDom, HeadlessNode};
use popkit_widgets::{
    Content, DualOverlaySynchronizer, OverlayController, OverlayEnv, OverlayPhase, ShowOptions,
    TagOverflowList,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

struct Page {
    dom: HeadlessDom,
    lp: EventLoop,
    anchor: HeadlessNode,
}

impl Page {
    fn new() -> Self {
        let dom = HeadlessDom::new();
        let anchor = dom.sized("button", 80.0, 24.0);
        Self {
            dom,
            lp: EventLoop::new(),
            anchor,
        }
    }

    fn env(&self) -> OverlayEnv {
        OverlayEnv::new(self.lp.clone(), self.dom.panel_factory(), self.dom.document())
    }

    fn overlay(&self, on_show: impl Fn() + 'static) -> OverlayController {
        OverlayController::builder(self.env())
            .anchor(self.anchor.as_node_ref())
            .text("panel")
            .on_show(on_show)
            .build()
    }
}

// ============================================================================
// OverlayController
// ============================================================================

#[test]
fn repeated_show_builds_one_instance_and_fires_once() {
    let page = Page::new();
    let shows = Rc::new(Cell::new(0));
    let counter = Rc::clone(&shows);
    let ctl = page.overlay(move || counter.set(counter.get() + 1));

    ctl.show(ShowOptions::immediate());
    ctl.show(ShowOptions::immediate());
    ctl.show(ShowOptions::default());
    page.lp.run_until_idle();

    assert_eq!(page.dom.panels().created(), 1);
    assert_eq!(ctl.instances_created(), 1);
    assert_eq!(shows.get(), 1);
    assert!(ctl.is_shown());
}

#[test]
fn cancelled_hide_never_fires() {
    let page = Page::new();
    let ctl = page.overlay(|| {});
    ctl.show(ShowOptions::immediate());
    ctl.hide(Some(ms(300)));
    page.lp.advance(ms(150));
    assert!(ctl.cancel_hide());
    page.lp.advance(ms(10_000));
    page.lp.run_until_idle();
    assert!(ctl.is_shown());
    assert_eq!(ctl.phase(), OverlayPhase::Shown);
    assert_eq!(page.dom.panels().hides(), 0);
}

#[test]
fn hide_supersedes_pending_show() {
    let page = Page::new();
    let ctl = page.overlay(|| {});
    ctl.show(ShowOptions::default());
    assert!(matches!(ctl.phase(), OverlayPhase::PendingShow(_)));
    ctl.hide(None);
    page.lp.run_until_idle();
    assert_eq!(ctl.phase(), OverlayPhase::Hidden);
    assert!(!ctl.is_shown());
    assert_eq!(page.dom.panels().created(), 0);
}

#[test]
fn reissued_delayed_hide_leaves_one_timer() {
    let page = Page::new();
    let ctl = page.overlay(|| {});
    ctl.show(ShowOptions::immediate());
    page.lp.run_frame();
    ctl.hide(Some(ms(300)));
    ctl.hide(Some(ms(300)));
    assert_eq!(page.lp.pending_timers(), 1);
    page.lp.advance(ms(300));
    assert!(!ctl.is_shown());
    assert_eq!(page.dom.panels().hides(), 1);
}

#[test]
fn uninstall_twice_leaves_nothing_behind() {
    let page = Page::new();
    let ctl = OverlayController::builder(page.env())
        .anchor(page.anchor.as_node_ref())
        .text("panel")
        .watch_resize(page.anchor.as_node_ref())
        .build();
    ctl.show(ShowOptions::immediate());
    ctl.hide(Some(ms(100)));
    page.anchor.resize(90.0, 24.0);

    ctl.uninstall();
    ctl.uninstall();

    assert_eq!(ctl.phase(), OverlayPhase::Hidden);
    assert!(!ctl.has_instance());
    assert!(!ctl.is_watching_resize());
    assert!(!ctl.has_document_listener());
    assert_eq!(page.lp.pending_timers(), 0);
    assert_eq!(page.lp.pending_frames(), 0);
    assert_eq!(page.anchor.resize_observer_count(), 0);
    assert_eq!(page.dom.panels().live(), 0);
}

#[test]
fn opening_click_does_not_close_panel() {
    let page = Page::new();
    let ctl = page.overlay(|| {});
    ctl.bind_trigger();
    page.dom.document().click(page.anchor.id());
    assert!(ctl.phase().is_pending() || ctl.phase().is_visible());
    page.lp.run_until_idle();
    assert!(ctl.is_shown());
    assert_eq!(page.dom.document().listener_count(), 1);

    let outside = page.dom.node("body");
    page.dom.document().click(outside.id());
    assert!(!ctl.is_shown());
    assert_eq!(page.dom.document().listener_count(), 0);
}

// ============================================================================
// Overflow
// ============================================================================

#[test]
fn overflow_reference_row() {
    let widths = [80.0, 80.0, 80.0, 80.0];
    let first = compute(300.0, &widths, 30.0, 1);
    assert_eq!(first.hidden_indices, vec![2, 3]);
    assert_eq!(first.hidden_count, 2);
    assert!(first.show_badge);
    assert_eq!(compute(300.0, &widths, 30.0, 1), first);
}

#[test]
fn first_child_survives_any_squeeze() {
    for container in [0.0, 10.0, 40.0, 79.0] {
        let layout = compute(container, &[120.0, 80.0, 80.0], 30.0, 1);
        assert!(!layout.is_hidden(0), "container {container}");
    }
    let single = compute(10.0, &[200.0], 30.0, 1);
    assert_eq!(single.hidden_count, 0);
    assert!(!single.show_badge);
}

#[test]
fn resize_burst_recomputes_once_with_last_size() {
    let page = Page::new();
    let container = page.dom.sized("row", 100.0, 24.0);
    let list: TagOverflowList<&'static str> =
        TagOverflowList::new(page.lp.clone(), container.as_node_ref(), 30.0);
    let tags = ["a", "b", "c", "d"]
        .into_iter()
        .map(|id| (id, page.dom.sized("tag", 80.0, 20.0).as_node_ref()))
        .collect();
    list.set_tags(tags);
    list.mount();
    page.lp.run_frame();
    let after_mount = list.passes();

    for i in 0..10 {
        container.resize(100.0 + f64::from(i) * 30.0, 24.0);
        page.lp.advance(ms(5));
    }
    assert_eq!(list.passes(), after_mount);
    page.lp.advance(ms(120));
    assert_eq!(list.passes(), after_mount + 1);
    // Final width 370 fits all four tags plus the badge.
    assert_eq!(list.hidden_count(), 0);
}

// ============================================================================
// DualOverlaySynchronizer
// ============================================================================

#[test]
fn data_change_yields_fresh_clone() {
    let page = Page::new();
    let region = page.dom.sized("region", 200.0, 24.0);
    let first_tag = page.dom.sized("tag", 60.0, 20.0);
    first_tag.set_text("alpha");
    region.append(&first_tag);
    region.append(&page.dom.sized("input", 80.0, 20.0));

    let sync = DualOverlaySynchronizer::builder(
        page.env(),
        region.as_node_ref(),
        page.anchor.as_node_ref(),
    )
    .dropdown_content(|| Some(Content::Text("options".into())))
    .build();

    sync.open();
    page.lp.run_frame();
    let stale = sync.clone_node().expect("clone");
    let stale_id = stale.node_id();

    first_tag.set_text("beta");
    sync.data_changed();
    sync.close();
    sync.open();

    let fresh = sync.clone_node().expect("fresh clone");
    assert_ne!(fresh.node_id(), stale_id);
    assert_eq!(sync.clone_generation(), 2);
    let fresh = page.dom.find(fresh.node_id()).expect("registered");
    assert_eq!(fresh.find_role("tag").map(|t| t.text()), Some("beta".to_owned()));
    assert_eq!(page.dom.find(stale_id).map(|n| n.total_listener_count()), Some(0));
    assert!(sync.is_open());
}
