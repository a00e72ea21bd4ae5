#![forbid(unsafe_code)]

//! Core primitives for Scrim: the platform adapter, the in-memory
//! reference platform, the animation resolver, the dual-signal
//! animation barrier, and the single-fire promise latch.
//!
//! Everything in this crate is single-threaded by design: Scrim runs
//! on one UI thread, so shared state is `Rc`/`Cell`/`RefCell`, never
//! locks. "Concurrency" here means interleaved event-driven turns,
//! not parallelism.

pub mod animation;
pub mod barrier;
pub mod event;
pub mod memory;
pub mod platform;
pub mod promise;

pub use animation::{
    Anchor, AnimationSpec, Direction, Distance, Easing, Preset, ResolvedAnimation,
    ResolvedDirection, resolve,
};
pub use barrier::{AnimationBarrier, FALLBACK_MARGIN};
pub use event::{EventDetail, EventKind, Key, KeyEvent, Modifiers, PlatformEvent, PointerEvent};
pub use memory::MemoryPlatform;
pub use platform::{ListenerId, NodeId, Platform, TimerId};
pub use promise::{Promise, Resolver, promise};
