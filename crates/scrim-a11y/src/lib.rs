#![forbid(unsafe_code)]

//! Accessibility layer for Scrim.
//!
//! Two cooperating pieces keep assistive technology and keyboard
//! users inside an open modal surface:
//!
//! - [`FocusTrap`] confines Tab navigation to the surface and
//!   restores the previously focused element on release.
//! - [`SiblingHider`] marks everything outside the surface as
//!   `aria-hidden` so screen readers only see the modal content.
//!
//! Both are RAII guards: dropping one releases its effect.

pub mod focus;
pub mod hide;

pub use focus::FocusTrap;
pub use hide::SiblingHider;
