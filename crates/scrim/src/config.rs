#![forbid(unsafe_code)]

//! Typed configuration and the live config store.
//!
//! Every recognized option is enumerated in [`ScrimConfig`] and its
//! sub-structs; there are no dynamic option bags. The store keeps
//! the current config in an [`ArcSwap`] so readers take cheap
//! snapshots, and notifies RAII subscriptions on every update.
//!
//! # Invariants
//!
//! 1. A snapshot from [`ConfigStore::get`] never changes under the
//!    caller; updates publish a fresh `Arc`.
//! 2. Change callbacks run after the new config is visible, outside
//!    any internal borrow.
//! 3. Dropping a [`ConfigSubscription`] removes its callback; a
//!    dropped subscription is never called again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use scrim_core::{Anchor, AnimationSpec, Direction, Easing, NodeId, Preset};

/// Visual theme applied to the root containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The root class for this theme.
    #[must_use]
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Light => "scrim-theme-light",
            Self::Dark => "scrim-theme-dark",
        }
    }
}

/// What happens when a modal is requested while one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConcurrencyPolicy {
    /// Defer the request; it renders when the active surface closes.
    #[default]
    Queue,
    /// Fail the request synchronously.
    Reject,
}

/// Animation master switch and defaults.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationDefaults {
    pub enabled: bool,
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for AnimationDefaults {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: Duration::from_millis(200),
            easing: Easing::EaseInOut,
        }
    }
}

/// Backdrop overlay appearance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverlayConfig {
    /// Fade the overlay with the surface's open and close animation.
    pub fade: bool,
    pub alpha: f64,
    pub blur_px: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fade: true,
            alpha: 0.5,
            blur_px: 0.0,
        }
    }
}

/// Modal surface defaults.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModalDefaults {
    pub policy: ConcurrencyPolicy,
    pub alpha: ModalAlpha,
    pub blur_px: f64,
}

/// Surface opacity, split out so the default is 1.0 rather than 0.0.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModalAlpha(pub f64);

impl Default for ModalAlpha {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Tie-break policy for a toast slot at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToastBehavior {
    /// Evict the oldest visible toast, then append.
    #[default]
    Stack,
    /// Clear the slot, then append.
    Replace,
    /// Append if below the cap, otherwise enqueue FIFO.
    Queue,
}

/// Visual countdown cue for auto-dismissed toasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CountdownCue {
    #[default]
    None,
    /// A thin bar along one edge.
    Bar { grow: bool },
    /// A translucent cover over the whole toast.
    Cover { grow: bool },
}

/// Toast defaults, overridable per call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToastDefaults {
    pub position: Anchor,
    pub behavior: ToastBehavior,
    pub max_visible: usize,
    /// `None` disables auto-dismiss.
    pub timeout: Option<Duration>,
    pub gap_px: f64,
    pub margin_px: f64,
    /// Added to the base z-index so toasts sit above modal surfaces.
    pub z_boost: u32,
    pub enter: AnimationSpec,
    pub exit: AnimationSpec,
    pub dismissible: bool,
    pub countdown: CountdownCue,
}

impl Default for ToastDefaults {
    fn default() -> Self {
        Self {
            position: Anchor::BottomRight,
            behavior: ToastBehavior::Stack,
            max_visible: 5,
            timeout: Some(Duration::from_secs(4)),
            gap_px: 8.0,
            margin_px: 16.0,
            z_boost: 50,
            enter: AnimationSpec::new()
                .preset(Preset::Slide)
                .direction(Direction::Auto),
            exit: AnimationSpec::new(),
            dismissible: true,
            countdown: CountdownCue::None,
        }
    }
}

/// Responsive breakpoints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Breakpoints {
    /// Viewport width at or below which the mobile size class applies.
    pub mobile_max_px: f64,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            mobile_max_px: 600.0,
        }
    }
}

/// The complete configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrimConfig {
    pub theme: Theme,
    /// Mount point for the root containers. `None` means the body.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub mount: Option<NodeId>,
    /// Base z-index for the modal root.
    pub z_index: u32,
    pub animation: AnimationDefaults,
    pub overlay: OverlayConfig,
    pub modal: ModalDefaults,
    pub toast: ToastDefaults,
    /// Default `aria-label` for surfaces without a title.
    pub a11y_label: String,
    pub breakpoints: Breakpoints,
}

impl Default for ScrimConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            mount: None,
            z_index: 1000,
            animation: AnimationDefaults::default(),
            overlay: OverlayConfig::default(),
            modal: ModalDefaults::default(),
            toast: ToastDefaults::default(),
            a11y_label: "Dialog".to_owned(),
            breakpoints: Breakpoints::default(),
        }
    }
}

type ChangeCallback = Rc<dyn Fn(&ScrimConfig)>;

struct Subscribers {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, ChangeCallback)>>,
}

/// Live configuration store with snapshot reads.
#[derive(Clone)]
pub struct ConfigStore {
    current: Arc<ArcSwap<ScrimConfig>>,
    subscribers: Rc<Subscribers>,
}

impl ConfigStore {
    /// A store holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ScrimConfig::default())
    }

    /// A store holding `config`.
    #[must_use]
    pub fn with_config(config: ScrimConfig) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(config)),
            subscribers: Rc::new(Subscribers {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Snapshot of the current configuration.
    #[must_use]
    pub fn get(&self) -> Arc<ScrimConfig> {
        self.current.load_full()
    }

    /// Apply `mutate` to a copy of the current config and publish it.
    pub fn update(&self, mutate: impl FnOnce(&mut ScrimConfig)) {
        let mut next = ScrimConfig::clone(&self.current.load_full());
        mutate(&mut next);
        let next = Arc::new(next);
        self.current.store(Arc::clone(&next));

        let callbacks: Vec<ChangeCallback> = self
            .subscribers
            .entries
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(&next);
        }
    }

    /// Register a change callback; it runs after every `update`.
    #[must_use]
    pub fn on_change(&self, callback: impl Fn(&ScrimConfig) + 'static) -> ConfigSubscription {
        let id = self.subscribers.next_id.get();
        self.subscribers.next_id.set(id + 1);
        self.subscribers
            .entries
            .borrow_mut()
            .push((id, Rc::new(callback)));
        ConfigSubscription {
            subscribers: Rc::clone(&self.subscribers),
            id,
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII registration from [`ConfigStore::on_change`].
pub struct ConfigSubscription {
    subscribers: Rc<Subscribers>,
    id: u64,
}

impl Drop for ConfigSubscription {
    fn drop(&mut self) {
        self.subscribers
            .entries
            .borrow_mut()
            .retain(|(id, _)| *id != self.id);
    }
}
