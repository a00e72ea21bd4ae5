#![forbid(unsafe_code)]

//! Dual-signal animation barrier.
//!
//! Animation-completion events are unreliable: a zero-area element or
//! an interrupted animation may never report completion. The barrier
//! therefore arms two signals per watched element, the platform's
//! animation-end subscription and a fallback timer at the declared
//! duration plus a safety margin, and completes the element on
//! whichever fires first, cancelling the other. When every watched
//! element has completed, the join callback runs.
//!
//! # Invariants
//!
//! 1. Each watched element completes exactly once, no matter how
//!    many of its signals fire.
//! 2. The join callback runs exactly once, and only after every
//!    watched element completed.
//! 3. A missing animation-end event delays completion by at most
//!    the fallback margin; it never prevents it.
//!
//! # Failure Modes
//!
//! - Arming no elements before the signals can fire means the join
//!   callback never runs; callers that skip animation entirely call
//!   their completion path directly instead of using a barrier.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

use crate::platform::{ListenerId, NodeId, Platform, TimerId};

/// Safety margin added to the fallback timer.
pub const FALLBACK_MARGIN: Duration = Duration::from_millis(50);

struct BarrierInner {
    remaining: Cell<usize>,
    on_complete: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl BarrierInner {
    fn element_done(&self) {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0
            && let Some(callback) = self.on_complete.borrow_mut().take()
        {
            callback();
        }
    }
}

/// Exactly-once join over per-element completion signals.
///
/// All signals fire on the single UI thread in later turns, so
/// arming every element before returning to the event loop is
/// race-free by construction.
pub struct AnimationBarrier {
    inner: Rc<BarrierInner>,
}

impl AnimationBarrier {
    /// Create a barrier that runs `on_complete` once all watched
    /// elements have reported.
    pub fn new(on_complete: impl FnOnce() + 'static) -> Self {
        Self {
            inner: Rc::new(BarrierInner {
                remaining: Cell::new(0),
                on_complete: RefCell::new(Some(Box::new(on_complete))),
            }),
        }
    }

    /// Number of elements still pending.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.remaining.get()
    }

    /// Watch one animating element.
    ///
    /// Arms the animation-end subscription and a fallback timer at
    /// `duration` + [`FALLBACK_MARGIN`]. First signal wins; the
    /// loser is cancelled.
    pub fn watch(&self, platform: &Rc<dyn Platform>, node: NodeId, duration: Duration) {
        self.inner.remaining.set(self.inner.remaining.get() + 1);

        let fired = Rc::new(Cell::new(false));
        let timer_slot: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
        let listener_slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let anim_cb = {
            let inner = Rc::clone(&self.inner);
            let platform = Rc::clone(platform);
            let fired = Rc::clone(&fired);
            let timer_slot = Rc::clone(&timer_slot);
            Box::new(move || {
                if fired.replace(true) {
                    return;
                }
                if let Some(timer) = timer_slot.take() {
                    platform.clear_timeout(timer);
                }
                trace!("element settled via animation end");
                inner.element_done();
            })
        };
        let listener = platform.on_animation_end(node, anim_cb);
        listener_slot.set(Some(listener));

        let timer_cb = {
            let inner = Rc::clone(&self.inner);
            let platform = Rc::clone(platform);
            let fired = Rc::clone(&fired);
            let listener_slot = Rc::clone(&listener_slot);
            Box::new(move || {
                if fired.replace(true) {
                    return;
                }
                if let Some(listener) = listener_slot.take() {
                    platform.unlisten(listener);
                }
                trace!("element settled via fallback timer");
                inner.element_done();
            })
        };
        let timer = platform.set_timeout(duration + FALLBACK_MARGIN, timer_cb);
        timer_slot.set(Some(timer));
    }
}
