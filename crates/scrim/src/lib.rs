#![forbid(unsafe_code)]

//! Scrim: modal surfaces, toasts, and promise dialogs for a
//! single-threaded UI.
//!
//! A [`Scrim`] instance owns one platform adapter, one configuration
//! store, and one lifecycle manager. At most one modal surface is
//! live at a time; further opens queue or reject per the configured
//! concurrency policy. Toasts stack per screen position with their
//! own caps and queues. Dialog helpers (`alert`, `confirm`, `prompt`,
//! `question`) wrap surfaces in single-settlement promises.
//!
//! ```
//! use std::rc::Rc;
//! use scrim::{MemoryPlatform, Platform, Scrim, SurfaceOptions};
//!
//! let platform: Rc<dyn Platform> = Rc::new(MemoryPlatform::new());
//! let scrim = Scrim::new(platform);
//! scrim.config().update(|c| c.animation.enabled = false);
//!
//! let handle = scrim.open(SurfaceOptions::new().title("Hello"))?;
//! assert!(handle.is_open());
//! handle.close(scrim::CloseResult::Programmatic)?;
//! # Ok::<(), scrim::Error>(())
//! ```
//!
//! For quick embedding there is also a thread-local default instance:
//! [`install`] binds it to a platform, and the free functions
//! ([`open`], [`toast`], [`alert`], ...) delegate to it.

pub mod config;
pub mod dialog;
pub mod error;
pub mod manager;
pub mod sanitize;
pub mod surface;
pub mod toast;

use std::cell::RefCell;
use std::rc::Rc;

use dialog::DialogEnv;
use surface::SurfaceEnv;
use toast::ToastEnv;

pub use config::{
    AnimationDefaults, Breakpoints, ConcurrencyPolicy, ConfigStore, ConfigSubscription,
    CountdownCue, ModalAlpha, ModalDefaults, OverlayConfig, ScrimConfig, Theme, ToastBehavior,
    ToastDefaults,
};
pub use dialog::{
    AlertOptions, ConfirmOptions, PromptOptions, QuestionButton, QuestionOptions,
};
pub use error::Error;
pub use sanitize::{Content, Passthrough, Sanitize};
pub use surface::{
    ButtonKind, ButtonSpec, CloseResult, Dismissal, DismissTriggers, DragAxis, DragOptions,
    FocusOptions, SizeClass, SurfaceHandle, SurfaceOptions, UpdateSpec,
};
pub use toast::{Timeout, ToastAction, ToastHandle, ToastKind, ToastOptions};

pub use scrim_core::{
    Anchor, AnimationSpec, Direction, Distance, Easing, EventDetail, EventKind, Key, KeyEvent,
    MemoryPlatform, Modifiers, NodeId, Platform, PlatformEvent, PointerEvent, Preset, Promise,
};
pub use scrim_i18n::{I18nError, LabelKey, LocaleBundle, LocaleRegistry, PartialBundle};

use manager::Manager;

struct ScrimCtx {
    platform: Rc<dyn Platform>,
    config: ConfigStore,
    manager: Rc<Manager>,
    sanitizer: RefCell<Rc<dyn Sanitize>>,
    i18n: Rc<RefCell<LocaleRegistry>>,
}

/// One toolkit instance. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Scrim {
    ctx: Rc<ScrimCtx>,
}

impl Scrim {
    /// Create an instance bound to `platform` with default
    /// configuration. Roots are mounted lazily on first use.
    #[must_use]
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        Self::with_config(platform, ConfigStore::new())
    }

    /// Create an instance with an externally built config store.
    #[must_use]
    pub fn with_config(platform: Rc<dyn Platform>, config: ConfigStore) -> Self {
        let manager = Rc::new(Manager::new(Rc::clone(&platform), config.clone()));
        Self {
            ctx: Rc::new(ScrimCtx {
                platform,
                config,
                manager,
                sanitizer: RefCell::new(Rc::new(Passthrough)),
                i18n: Rc::new(RefCell::new(LocaleRegistry::new())),
            }),
        }
    }

    /// The configuration store; `update` applies to surfaces and
    /// toasts opened afterwards.
    #[must_use]
    pub fn config(&self) -> &ConfigStore {
        &self.ctx.config
    }

    /// The platform adapter this instance renders through.
    #[must_use]
    pub fn platform(&self) -> Rc<dyn Platform> {
        Rc::clone(&self.ctx.platform)
    }

    /// The locale registry for Scrim's own chrome labels.
    #[must_use]
    pub fn i18n(&self) -> Rc<RefCell<LocaleRegistry>> {
        Rc::clone(&self.ctx.i18n)
    }

    /// Replace the content sanitizer. Applies to HTML content of
    /// surfaces and toasts opened afterwards.
    pub fn set_sanitizer(&self, sanitizer: Rc<dyn Sanitize>) {
        *self.ctx.sanitizer.borrow_mut() = sanitizer;
    }

    /// Open a modal surface through the concurrency gate.
    pub fn open(&self, options: SurfaceOptions) -> Result<SurfaceHandle, Error> {
        surface::open(&self.surface_env(), options)
    }

    /// Open a chrome-less surface for caller-rendered content.
    /// Lifecycle, dismissal, and focus behave as in [`Scrim::open`].
    pub fn bare(&self, options: SurfaceOptions) -> Result<SurfaceHandle, Error> {
        surface::open(&self.surface_env(), options.bare())
    }

    /// Alias for [`Scrim::bare`].
    pub fn mount(&self, options: SurfaceOptions) -> Result<SurfaceHandle, Error> {
        self.bare(options)
    }

    /// Show a toast notification.
    pub fn toast(&self, options: ToastOptions) -> ToastHandle {
        toast::show(&self.toast_env(), options)
    }

    /// Open an acknowledgement dialog; resolves on any close path.
    pub fn alert(
        &self,
        message: impl Into<Content>,
        options: AlertOptions,
    ) -> Result<Promise<()>, Error> {
        dialog::alert(&self.dialog_env(), message, options)
    }

    /// Open a yes/no dialog; dismissal resolves `false`.
    pub fn confirm(
        &self,
        message: impl Into<Content>,
        options: ConfirmOptions,
    ) -> Result<Promise<bool>, Error> {
        dialog::confirm(&self.dialog_env(), message, options)
    }

    /// Open a text input dialog; resolves `None` on cancel or
    /// dismissal.
    pub fn prompt(
        &self,
        message: impl Into<Content>,
        default: impl Into<String>,
        options: PromptOptions,
    ) -> Result<Promise<Option<String>>, Error> {
        dialog::prompt(&self.dialog_env(), message, default, options)
    }

    /// Open a multi-choice dialog; resolves with the clicked button
    /// id.
    pub fn question(&self, options: QuestionOptions) -> Result<Promise<String>, Error> {
        dialog::question(&self.dialog_env(), options)
    }

    fn surface_env(&self) -> SurfaceEnv {
        SurfaceEnv {
            platform: Rc::clone(&self.ctx.platform),
            manager: Rc::clone(&self.ctx.manager),
            config: self.ctx.config.clone(),
            sanitizer: Rc::clone(&self.ctx.sanitizer.borrow()),
        }
    }

    fn toast_env(&self) -> ToastEnv {
        ToastEnv {
            platform: Rc::clone(&self.ctx.platform),
            manager: Rc::clone(&self.ctx.manager),
            config: self.ctx.config.clone(),
            sanitizer: Rc::clone(&self.ctx.sanitizer.borrow()),
        }
    }

    fn dialog_env(&self) -> DialogEnv {
        DialogEnv {
            surface: self.surface_env(),
            i18n: Rc::clone(&self.ctx.i18n),
        }
    }
}

thread_local! {
    static DEFAULT: RefCell<Option<Scrim>> = const { RefCell::new(None) };
}

/// Bind the thread-local default instance to `platform`, replacing
/// any previous default.
pub fn install(platform: Rc<dyn Platform>) -> Scrim {
    let scrim = Scrim::new(platform);
    DEFAULT.with(|slot| *slot.borrow_mut() = Some(scrim.clone()));
    scrim
}

/// The thread-local default instance. Before [`install`] is called
/// it is backed by an in-memory platform.
pub fn default_instance() -> Scrim {
    DEFAULT.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| Scrim::new(Rc::new(MemoryPlatform::new())))
            .clone()
    })
}

/// [`Scrim::open`] on the default instance.
pub fn open(options: SurfaceOptions) -> Result<SurfaceHandle, Error> {
    default_instance().open(options)
}

/// [`Scrim::toast`] on the default instance.
pub fn toast(options: ToastOptions) -> ToastHandle {
    default_instance().toast(options)
}

/// [`Scrim::alert`] on the default instance.
pub fn alert(message: impl Into<Content>, options: AlertOptions) -> Result<Promise<()>, Error> {
    default_instance().alert(message, options)
}

/// [`Scrim::confirm`] on the default instance.
pub fn confirm(message: impl Into<Content>, options: ConfirmOptions) -> Result<Promise<bool>, Error> {
    default_instance().confirm(message, options)
}

/// [`Scrim::prompt`] on the default instance.
pub fn prompt(
    message: impl Into<Content>,
    default: impl Into<String>,
    options: PromptOptions,
) -> Result<Promise<Option<String>>, Error> {
    default_instance().prompt(message, default, options)
}

/// [`Scrim::question`] on the default instance.
pub fn question(options: QuestionOptions) -> Result<Promise<String>, Error> {
    default_instance().question(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let scrim = Scrim::new(Rc::new(MemoryPlatform::new()));
        scrim.config().update(|c| c.animation.enabled = false);
        let clone = scrim.clone();
        let _handle = scrim.open(SurfaceOptions::new().title("One")).unwrap();
        // The clone sees the live surface through the shared manager.
        assert!(matches!(
            clone
                .open(SurfaceOptions::new().title("Two"))
                .map(|h| h.is_open()),
            Ok(false)
        ));
    }

    #[test]
    fn default_instance_is_usable_without_install() {
        let scrim = default_instance();
        scrim.config().update(|c| c.animation.enabled = false);
        let toast = scrim.toast(ToastOptions::new().title("hi"));
        assert!(toast.is_visible());
    }

    #[test]
    fn install_replaces_the_default() {
        let platform: Rc<dyn Platform> = Rc::new(MemoryPlatform::new());
        let scrim = install(Rc::clone(&platform));
        assert!(Rc::ptr_eq(
            &scrim.platform(),
            &default_instance().platform()
        ));
    }
}
