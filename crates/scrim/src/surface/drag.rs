#![forbid(unsafe_code)]

//! Pointer dragging for modal surfaces.
//!
//! Pointer-down on the handle begins a drag; pointer-move applies a
//! translation through the `--scrim-drag-x`/`--scrim-drag-y` custom
//! properties; pointer-up ends it. The offset is clamped so no more
//! than 90% of the surface's own dimension can leave each viewport
//! edge, and the axis can be constrained.

use std::cell::RefCell;
use std::rc::Rc;

use scrim_core::{EventKind, ListenerId, NodeId, Platform};

/// Which axes a drag may move the surface along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DragAxis {
    #[default]
    Both,
    X,
    Y,
}

/// Drag configuration for a surface.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DragOptions {
    pub axis: DragAxis,
    /// Dragging is disabled on coarse-pointer devices unless forced.
    pub force_on_coarse_pointer: bool,
}

#[derive(Default)]
struct DragState {
    dragging: bool,
    /// Pointer position where the current drag began.
    grab: (f64, f64),
    /// Offset already applied when the current drag began.
    base: (f64, f64),
    offset: (f64, f64),
}

/// Share of the surface's own dimension allowed past a viewport edge.
const OVERHANG_RATIO: f64 = 0.9;

fn clamp_offset(offset: f64, viewport: f64, own: f64) -> f64 {
    // The surface starts centered; the limit keeps at least 10% of
    // it inside each edge.
    let limit = ((viewport - own) / 2.0 + OVERHANG_RATIO * own).max(0.0);
    offset.clamp(-limit, limit)
}

/// Active drag wiring for one surface. Released on drop.
pub struct DragController {
    platform: Rc<dyn Platform>,
    listeners: Vec<ListenerId>,
}

impl DragController {
    /// Wire dragging: `handle` receives pointer-down, the body
    /// receives move and up, `surface` gets the translation vars.
    pub fn install(
        platform: &Rc<dyn Platform>,
        handle: NodeId,
        surface: NodeId,
        axis: DragAxis,
    ) -> Self {
        let state = Rc::new(RefCell::new(DragState::default()));
        let body = platform.body();
        let mut listeners = Vec::with_capacity(3);

        {
            let state = Rc::clone(&state);
            listeners.push(platform.listen(
                handle,
                EventKind::PointerDown,
                Rc::new(move |event| {
                    let Some(pointer) = event.pointer() else { return };
                    let mut state = state.borrow_mut();
                    state.dragging = true;
                    state.grab = (pointer.x, pointer.y);
                    state.base = state.offset;
                }),
            ));
        }
        {
            let state = Rc::clone(&state);
            let platform_cb = Rc::clone(platform);
            listeners.push(platform.listen(
                body,
                EventKind::PointerMove,
                Rc::new(move |event| {
                    let Some(pointer) = event.pointer() else { return };
                    let mut state = state.borrow_mut();
                    if !state.dragging {
                        return;
                    }
                    let (vw, vh) = platform_cb.viewport();
                    let (w, h) = platform_cb.measure(surface);
                    let dx = pointer.x - state.grab.0;
                    let dy = pointer.y - state.grab.1;
                    let x = match axis {
                        DragAxis::Y => state.base.0,
                        DragAxis::Both | DragAxis::X => clamp_offset(state.base.0 + dx, vw, w),
                    };
                    let y = match axis {
                        DragAxis::X => state.base.1,
                        DragAxis::Both | DragAxis::Y => clamp_offset(state.base.1 + dy, vh, h),
                    };
                    state.offset = (x, y);
                    platform_cb.set_css_var(surface, "--scrim-drag-x", &format!("{x}px"));
                    platform_cb.set_css_var(surface, "--scrim-drag-y", &format!("{y}px"));
                }),
            ));
        }
        {
            let state = Rc::clone(&state);
            listeners.push(platform.listen(
                body,
                EventKind::PointerUp,
                Rc::new(move |_| {
                    state.borrow_mut().dragging = false;
                }),
            ));
        }

        Self {
            platform: Rc::clone(platform),
            listeners,
        }
    }

    /// Remove all drag listeners. Idempotent.
    pub fn release(&mut self) {
        for listener in self.listeners.drain(..) {
            self.platform.unlisten(listener);
        }
    }
}

impl Drop for DragController {
    fn drop(&mut self) {
        self.release();
    }
}
