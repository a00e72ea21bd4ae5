#![forbid(unsafe_code)]

//! Input event model for the platform adapter.
//!
//! Listeners subscribe per node and per [`EventKind`]; the platform
//! delivers a [`PlatformEvent`] carrying the target node and a
//! kind-specific detail payload. There is no bubbling: an event
//! fires only the listeners registered on its target node, which is
//! what lets a backdrop click be distinguished from a content click
//! without hit-testing.
//!
//! Keyboard input has one routing rule on top of that: adapters
//! deliver key events for a trapped region to the region's container
//! node. Key listeners therefore go on container nodes and query the
//! platform's focus state when they care which descendant had focus.

use crate::platform::NodeId;

/// Kinds of input events a listener can subscribe to.
///
/// Animation completion is not an `EventKind`: it goes through the
/// one-shot [`Platform::on_animation_end`](crate::Platform::on_animation_end)
/// subscription because it may never be delivered at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    KeyDown,
    PointerDown,
    PointerMove,
    PointerUp,
}

bitflags::bitflags! {
    /// Keyboard modifier set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// Logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Char(char),
    /// Any key Scrim does not react to.
    Other,
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a key event with no modifiers.
    #[must_use]
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    /// Create a key event with the given modifiers.
    #[must_use]
    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// A pointer position in viewport coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Kind-specific event payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventDetail {
    /// Click and other payload-free events.
    None,
    Key(KeyEvent),
    Pointer(PointerEvent),
}

/// An event delivered to a listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformEvent {
    /// The node the listener was registered on.
    pub target: NodeId,
    pub detail: EventDetail,
}

impl PlatformEvent {
    /// The key payload, if this is a key event.
    #[must_use]
    pub fn key(&self) -> Option<KeyEvent> {
        match self.detail {
            EventDetail::Key(k) => Some(k),
            _ => None,
        }
    }

    /// The pointer payload, if this is a pointer event.
    #[must_use]
    pub fn pointer(&self) -> Option<PointerEvent> {
        match self.detail {
            EventDetail::Pointer(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_accessor_returns_payload() {
        let ev = PlatformEvent {
            target: NodeId::from_raw(1),
            detail: EventDetail::Key(KeyEvent::plain(Key::Escape)),
        };
        assert_eq!(ev.key().map(|k| k.key), Some(Key::Escape));
        assert!(ev.pointer().is_none());
    }

    #[test]
    fn pointer_accessor_returns_payload() {
        let ev = PlatformEvent {
            target: NodeId::from_raw(2),
            detail: EventDetail::Pointer(PointerEvent::at(3.0, 4.0)),
        };
        let p = ev.pointer().unwrap();
        assert_eq!((p.x, p.y), (3.0, 4.0));
        assert!(ev.key().is_none());
    }

    #[test]
    fn modifiers_default_empty() {
        assert!(KeyEvent::plain(Key::Tab).modifiers.is_empty());
        let shifted = KeyEvent::with_modifiers(Key::Tab, Modifiers::SHIFT);
        assert!(shifted.modifiers.contains(Modifiers::SHIFT));
    }
}
