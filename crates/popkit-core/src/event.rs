#![forbid(unsafe_code)]

//! DOM-facing input events and overlay lifecycle notifications.

use crate::dom::NodeId;

/// Kinds of DOM events the coordinator listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEventKind {
    Click,
    MouseEnter,
    MouseLeave,
    KeyDown,
    Input,
}

/// Keys the editing widgets react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Escape,
    Char(char),
}

/// A DOM event as delivered to a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    /// What happened.
    pub kind: DomEventKind,
    /// Innermost node the event was dispatched to.
    pub target: NodeId,
    /// Key for `KeyDown`.
    pub key: Option<Key>,
    /// Current value of the target input, for `KeyDown` and `Input`.
    pub value: Option<String>,
    /// Index of the list item under the pointer, when the target is one.
    pub item: Option<usize>,
}

impl DomEvent {
    /// A bare event of `kind` targeting `target`.
    #[must_use]
    pub fn new(kind: DomEventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            key: None,
            value: None,
            item: None,
        }
    }

    /// A click on `target`.
    #[must_use]
    pub fn click(target: NodeId) -> Self {
        Self::new(DomEventKind::Click, target)
    }

    /// A key press on an input holding `value`.
    #[must_use]
    pub fn key_down(target: NodeId, key: Key, value: impl Into<String>) -> Self {
        Self {
            key: Some(key),
            value: Some(value.into()),
            ..Self::new(DomEventKind::KeyDown, target)
        }
    }

    /// An `input` event carrying the new value.
    #[must_use]
    pub fn input(target: NodeId, value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(DomEventKind::Input, target)
        }
    }

    /// Attach the index of the list item the event hit.
    #[must_use]
    pub fn with_item(mut self, item: usize) -> Self {
        self.item = Some(item);
        self
    }
}

/// Lifecycle stage of a floating panel, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    /// About to become visible.
    Show,
    /// Visible and settled (one render pass after `Show`).
    Shown,
    /// About to hide.
    Hide,
    /// Fully hidden.
    Hidden,
}

impl OverlayEvent {
    /// Stable name used as the structured-log message.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Show => "overlay.show",
            Self::Shown => "overlay.shown",
            Self::Hide => "overlay.hide",
            Self::Hidden => "overlay.hidden",
        }
    }
}
