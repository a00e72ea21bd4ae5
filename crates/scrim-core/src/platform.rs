#![forbid(unsafe_code)]

//! The platform adapter: every rendering-surface capability Scrim
//! needs, behind one object-safe trait.
//!
//! The lifecycle state machines (surface, toast, barrier) talk only
//! to this trait, so they are testable against the in-memory
//! implementation in [`crate::memory`] and portable to a real DOM
//! binding, which is an external collaborator.
//!
//! # Invariants
//!
//! 1. All operations complete synchronously within the calling turn;
//!    only timer and listener callbacks run later.
//! 2. Node, listener, and timer ids are never reused within one
//!    platform instance.
//! 3. Operations on removed nodes are silent no-ops, never panics.
//!
//! # Failure Modes
//!
//! - An animation-end subscription may never fire (interrupted or
//!   zero-area animations). Callers that must make progress pair it
//!   with a fallback timer; see [`crate::barrier`].

use std::rc::Rc;
use std::time::Duration;

use crate::event::{EventKind, PlatformEvent};

/// Opaque handle to one element in the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Build a node id from its raw value (test and adapter use).
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle to a pending timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// The rendering-surface capabilities Scrim depends on.
///
/// Implementations use interior mutability; every method takes
/// `&self` so the platform can be shared as `Rc<dyn Platform>`.
pub trait Platform {
    // --- Element lifecycle ---

    /// Create a detached element with the given tag name.
    fn create_element(&self, tag: &str) -> NodeId;

    /// Append `child` to `parent`, detaching it from any previous
    /// parent first.
    fn append(&self, parent: NodeId, child: NodeId);

    /// Detach a node (and its subtree) from the document.
    fn remove(&self, node: NodeId);

    /// Detach all children of a node.
    fn clear_children(&self, node: NodeId);

    /// The parent of a node, if attached.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` is reachable from the document body.
    fn is_connected(&self, node: NodeId) -> bool;

    /// The document body: the default mount point.
    fn body(&self) -> NodeId;

    /// The other children of `node`'s parent, in document order.
    fn siblings_of(&self, node: NodeId) -> Vec<NodeId>;

    // --- Presentation ---

    /// Replace a node's content with plain text.
    fn set_text(&self, node: NodeId, text: &str);

    /// Replace a node's content with markup. Callers are responsible
    /// for routing the string through the sanitizer first.
    fn set_html(&self, node: NodeId, html: &str);

    fn add_class(&self, node: NodeId, class: &str);
    fn remove_class(&self, node: NodeId, class: &str);
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn set_attr(&self, node: NodeId, name: &str, value: &str);
    fn remove_attr(&self, node: NodeId, name: &str);
    fn attr(&self, node: NodeId, name: &str) -> Option<String>;

    /// Set a CSS custom property on a node (the styling contract).
    fn set_css_var(&self, node: NodeId, name: &str, value: &str);

    // --- Input ---

    /// Register a listener for `kind` events on `node`.
    fn listen(
        &self,
        node: NodeId,
        kind: EventKind,
        callback: Rc<dyn Fn(&PlatformEvent)>,
    ) -> ListenerId;

    /// Remove a listener. Unknown ids are ignored.
    fn unlisten(&self, listener: ListenerId);

    // --- Timers ---

    /// Schedule `callback` to run once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a pending timeout. Unknown ids are ignored.
    fn clear_timeout(&self, timer: TimerId);

    // --- Animation ---

    /// Subscribe once to the animation-completion signal of `node`.
    ///
    /// The platform makes no delivery guarantee; see the module docs.
    fn on_animation_end(&self, node: NodeId, callback: Box<dyn FnOnce()>) -> ListenerId;

    // --- Focus ---

    /// The currently focused node, if any.
    fn focused(&self) -> Option<NodeId>;

    /// Move focus to `node`.
    fn focus(&self, node: NodeId);

    /// Focusable descendants of `node`, in document order.
    fn focusables_within(&self, node: NodeId) -> Vec<NodeId>;

    // --- Form values ---

    /// Current value of an input element ("" for non-inputs).
    fn value(&self, node: NodeId) -> String;

    /// Set the value of an input element.
    fn set_value(&self, node: NodeId, value: &str);

    // --- Environment ---

    /// Viewport size in CSS pixels.
    fn viewport(&self) -> (f64, f64);

    /// Rendered size of a node in CSS pixels.
    fn measure(&self, node: NodeId) -> (f64, f64);

    /// Whether the primary pointer is coarse (touch-first device).
    fn coarse_pointer(&self) -> bool;

    /// Width of the classic scrollbar in CSS pixels (0 on overlay
    /// scrollbar platforms).
    fn scrollbar_width(&self) -> f64;
}
