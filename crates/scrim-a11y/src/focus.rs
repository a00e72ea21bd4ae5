#![forbid(unsafe_code)]

//! Keyboard focus containment for modal surfaces.
//!
//! A [`FocusTrap`] remembers the focused element at install time,
//! moves focus into the trapped container, and cycles Tab and
//! Shift+Tab through the container's focusable descendants. On
//! release it restores the remembered element if it is still in the
//! document.
//!
//! The trap listens for key events on the container node. Platform
//! adapters route keyboard input for a trapped region to that node;
//! there is no event bubbling in the adapter contract.
//!
//! # Invariants
//!
//! 1. While a trap is installed, Tab from the last focusable wraps
//!    to the first, and Shift+Tab from the first wraps to the last.
//! 2. Release restores the pre-install focus at most once; repeated
//!    release calls are no-ops.
//! 3. A trap over a container with no focusable descendants focuses
//!    the container itself and leaves Tab inert.

use std::rc::Rc;

use scrim_core::{EventKind, Key, ListenerId, Modifiers, NodeId, Platform, PlatformEvent};
use tracing::trace;

/// RAII guard confining keyboard focus to one container.
pub struct FocusTrap {
    platform: Rc<dyn Platform>,
    previous: Option<NodeId>,
    listener: Option<ListenerId>,
}

impl FocusTrap {
    /// Install a trap over `container`.
    ///
    /// Focus moves to `initial` when given, otherwise to the first
    /// focusable descendant, otherwise to the container itself.
    pub fn install(
        platform: &Rc<dyn Platform>,
        container: NodeId,
        initial: Option<NodeId>,
    ) -> Self {
        let previous = platform.focused();

        let target = initial
            .or_else(|| platform.focusables_within(container).into_iter().next())
            .unwrap_or(container);
        if target == container {
            // Containers are not natively focusable.
            platform.set_attr(container, "tabindex", "-1");
        }
        platform.focus(target);

        let handler = {
            let platform = Rc::clone(platform);
            move |event: &PlatformEvent| {
                let Some(key) = event.key() else { return };
                if key.key != Key::Tab {
                    return;
                }
                cycle(&platform, container, key.modifiers.contains(Modifiers::SHIFT));
            }
        };
        let listener = platform.listen(container, EventKind::KeyDown, Rc::new(handler));
        trace!(container = container.raw(), "focus trap installed");

        Self {
            platform: Rc::clone(platform),
            previous,
            listener: Some(listener),
        }
    }

    /// Release the trap and restore the pre-install focus.
    ///
    /// Idempotent. The remembered element is only refocused while it
    /// is still connected to the document.
    pub fn release(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        self.platform.unlisten(listener);
        if let Some(previous) = self.previous.take()
            && self.platform.is_connected(previous)
        {
            self.platform.focus(previous);
        }
        trace!("focus trap released");
    }
}

impl Drop for FocusTrap {
    fn drop(&mut self) {
        self.release();
    }
}

fn cycle(platform: &Rc<dyn Platform>, container: NodeId, backward: bool) {
    let focusables = platform.focusables_within(container);
    if focusables.is_empty() {
        return;
    }
    let current = platform
        .focused()
        .and_then(|node| focusables.iter().position(|&f| f == node));
    let len = focusables.len();
    let next = match (current, backward) {
        (Some(i), false) => (i + 1) % len,
        (Some(i), true) => (i + len - 1) % len,
        (None, false) => 0,
        (None, true) => len - 1,
    };
    platform.focus(focusables[next]);
}
