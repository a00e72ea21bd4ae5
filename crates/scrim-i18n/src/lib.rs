#![forbid(unsafe_code)]

//! Localized chrome labels for Scrim.
//!
//! Scrim renders a small, closed set of built-in strings: dialog
//! button captions and default titles. This crate holds them in a
//! [`LocaleRegistry`] so applications can register translations and
//! switch the active locale at runtime. Application content is never
//! routed through here; only Scrim's own chrome is.

pub mod registry;

pub use registry::{I18nError, LabelKey, LocaleBundle, LocaleRegistry, PartialBundle};
