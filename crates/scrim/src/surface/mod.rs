#![forbid(unsafe_code)]

//! The surface lifecycle controller.
//!
//! Each modal surface runs one state machine: Rendering, then Open,
//! then Closing, then torn down. Instances are never reused; after
//! teardown the handle reports [`Error::SurfaceClosed`].
//!
//! Rendering happens synchronously inside a job admitted by the
//! [`Manager`] concurrency gate, so a queued surface renders only
//! when its predecessor has fully torn down.
//!
//! # Invariants
//!
//! 1. Teardown runs exactly once per surface, no matter how many
//!    close triggers fire.
//! 2. Every resource taken during rendering (scroll lock, focus
//!    trap, sibling hiding, drag wiring, listeners) is released
//!    during teardown, each release independent of the others.
//! 3. `close` is idempotent: a second call while closing is a no-op.
//!
//! # Failure Modes
//!
//! - The platform may never deliver an animation-end event for the
//!   exit animation; the dual-signal barrier still reaches teardown
//!   within duration plus margin.

pub mod drag;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use scrim_a11y::{FocusTrap, SiblingHider};
use scrim_core::{
    Anchor, AnimationBarrier, AnimationSpec, EventKind, Key, ListenerId, NodeId, Platform,
    PlatformEvent, resolve,
};
use tracing::{debug, trace};

use crate::config::ConfigStore;
use crate::error::Error;
use crate::manager::Manager;
use crate::sanitize::{Content, Sanitize};

pub use drag::{DragAxis, DragController, DragOptions};

bitflags::bitflags! {
    /// Which dismissal triggers a surface honors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DismissTriggers: u8 {
        const ESCAPE = 1;
        const BACKDROP = 1 << 1;
        const CLOSE_BUTTON = 1 << 2;
    }
}

impl Default for DismissTriggers {
    fn default() -> Self {
        Self::all()
    }
}

/// Surface width preset, applied as a `scrim-size-*` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeClass {
    #[default]
    Auto,
    Small,
    Medium,
    Large,
    Full,
}

impl SizeClass {
    fn class_name(self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            Self::Small => Some("scrim-size-small"),
            Self::Medium => Some("scrim-size-medium"),
            Self::Large => Some("scrim-size-large"),
            Self::Full => Some("scrim-size-full"),
        }
    }
}

/// Visual weight of a footer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonKind {
    #[default]
    Primary,
    Secondary,
    Danger,
}

impl ButtonKind {
    fn class_name(self) -> &'static str {
        match self {
            Self::Primary => "scrim-button-primary",
            Self::Secondary => "scrim-button-secondary",
            Self::Danger => "scrim-button-danger",
        }
    }
}

/// One footer button.
#[derive(Debug, Clone)]
pub struct ButtonSpec {
    pub id: String,
    pub label: String,
    pub kind: ButtonKind,
    /// Close the surface with `CloseResult::Button(id)` after the
    /// button callback runs. Dialog primaries that validate first
    /// turn this off and close manually.
    pub close_on_click: bool,
}

impl ButtonSpec {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ButtonKind::Primary,
            close_on_click: true,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: ButtonKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn close_on_click(mut self, close: bool) -> Self {
        self.close_on_click = close;
        self
    }
}

/// How a surface was dismissed, as opposed to a button action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    Escape,
    Backdrop,
    CloseButton,
}

/// Why a surface closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseResult {
    /// A footer button with this id.
    Button(String),
    Dismissed(Dismissal),
    /// `close` was called directly.
    Programmatic,
}

/// Focus behavior for a surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusOptions {
    /// Explicit initial focus target; default is the first focusable
    /// descendant.
    pub initial: Option<NodeId>,
    /// Disable the focus trap entirely.
    pub no_trap: bool,
}

type OpenCallback = Box<dyn FnOnce(&SurfaceHandle)>;
type CloseCallback = Box<dyn FnOnce(&CloseResult)>;
type ButtonCallback = Rc<dyn Fn(&SurfaceHandle, &str)>;

/// Everything a surface can be configured with.
pub struct SurfaceOptions {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<Content>,
    pub(crate) buttons: Vec<ButtonSpec>,
    pub(crate) size: SizeClass,
    pub(crate) kind: Option<String>,
    pub(crate) dismiss: DismissTriggers,
    pub(crate) chrome: bool,
    pub(crate) close_button: bool,
    pub(crate) animation: Option<AnimationSpec>,
    pub(crate) drag: Option<DragOptions>,
    pub(crate) focus: FocusOptions,
    pub(crate) on_open: Option<OpenCallback>,
    pub(crate) on_close: Option<CloseCallback>,
    pub(crate) on_button: Option<ButtonCallback>,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            title: None,
            content: None,
            buttons: Vec::new(),
            size: SizeClass::Auto,
            kind: None,
            dismiss: DismissTriggers::default(),
            chrome: true,
            close_button: true,
            animation: None,
            drag: None,
            focus: FocusOptions::default(),
            on_open: None,
            on_close: None,
            on_button: None,
        }
    }
}

impl SurfaceOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<Content>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn buttons(mut self, buttons: Vec<ButtonSpec>) -> Self {
        self.buttons = buttons;
        self
    }

    #[must_use]
    pub fn size(mut self, size: SizeClass) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn dismiss(mut self, triggers: DismissTriggers) -> Self {
        self.dismiss = triggers;
        self
    }

    /// Render without header/footer chrome (the `bare` surface).
    #[must_use]
    pub fn bare(mut self) -> Self {
        self.chrome = false;
        self
    }

    #[must_use]
    pub fn close_button(mut self, show: bool) -> Self {
        self.close_button = show;
        self
    }

    #[must_use]
    pub fn animation(mut self, spec: AnimationSpec) -> Self {
        self.animation = Some(spec);
        self
    }

    #[must_use]
    pub fn draggable(mut self, options: DragOptions) -> Self {
        self.drag = Some(options);
        self
    }

    #[must_use]
    pub fn focus(mut self, focus: FocusOptions) -> Self {
        self.focus = focus;
        self
    }

    #[must_use]
    pub fn on_open(mut self, callback: impl FnOnce(&SurfaceHandle) + 'static) -> Self {
        self.on_open = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_close(mut self, callback: impl FnOnce(&CloseResult) + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_button(mut self, callback: impl Fn(&SurfaceHandle, &str) + 'static) -> Self {
        self.on_button = Some(Rc::new(callback));
        self
    }
}

/// In-place replacement for an open surface; unset fields are kept.
#[derive(Default)]
pub struct UpdateSpec {
    pub title: Option<String>,
    pub content: Option<Content>,
    pub buttons: Option<Vec<ButtonSpec>>,
}

/// Shared collaborators a surface renders against.
#[derive(Clone)]
pub(crate) struct SurfaceEnv {
    pub platform: Rc<dyn Platform>,
    pub manager: Rc<Manager>,
    pub config: ConfigStore,
    pub sanitizer: Rc<dyn Sanitize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Closing,
}

struct LiveSurface {
    platform: Rc<dyn Platform>,
    manager: Rc<Manager>,
    sanitizer: Rc<dyn Sanitize>,
    overlay: NodeId,
    surface: NodeId,
    title_node: Option<NodeId>,
    body_host: NodeId,
    footer: Option<NodeId>,
    listeners: Vec<ListenerId>,
    button_listeners: Vec<ListenerId>,
    focus_trap: Option<FocusTrap>,
    hider: Option<SiblingHider>,
    drag: Option<DragController>,
    phase: Phase,
    anim_enabled: bool,
    anim_duration: Duration,
    overlay_fade: bool,
    on_close: Option<CloseCallback>,
    on_button: ButtonCallback,
}

enum SurfaceCell {
    /// Queued behind the concurrency gate; not rendered yet.
    Pending,
    Live(Box<LiveSurface>),
    Done,
}

/// Caller's handle to one surface.
#[derive(Clone)]
pub struct SurfaceHandle {
    cell: Rc<RefCell<SurfaceCell>>,
}

/// Open a surface through the concurrency gate.
///
/// The returned handle is `Pending` until the gate admits the render
/// job; under `Queue` policy that may be after earlier surfaces
/// close.
pub(crate) fn open(env: &SurfaceEnv, options: SurfaceOptions) -> Result<SurfaceHandle, Error> {
    env.manager.ensure_roots();
    let handle = SurfaceHandle {
        cell: Rc::new(RefCell::new(SurfaceCell::Pending)),
    };
    let manager = Rc::clone(&env.manager);
    let env = env.clone();
    let job_handle = handle.clone();
    manager.open_modal(Box::new(move || render(&env, options, &job_handle)))?;
    Ok(handle)
}

fn render(env: &SurfaceEnv, mut options: SurfaceOptions, handle: &SurfaceHandle) {
    let config = env.config.get();
    let roots = env.manager.ensure_roots();
    let platform = &env.platform;

    let overlay = platform.create_element("div");
    platform.add_class(overlay, "scrim-overlay");
    platform.set_css_var(overlay, "--scrim-overlay-alpha", &config.overlay.alpha.to_string());
    platform.set_css_var(
        overlay,
        "--scrim-overlay-blur",
        &format!("{}px", config.overlay.blur_px),
    );

    let surface = platform.create_element("div");
    platform.add_class(surface, "scrim-surface");
    if let Some(class) = options.size.class_name() {
        platform.add_class(surface, class);
    }
    if platform.viewport().0 <= config.breakpoints.mobile_max_px {
        platform.add_class(surface, "scrim-mobile");
    }
    if let Some(kind) = &options.kind {
        platform.add_class(surface, &format!("scrim-kind-{kind}"));
    }
    platform.set_attr(surface, "role", "dialog");
    platform.set_attr(surface, "aria-modal", "true");
    let label = options.title.as_deref().unwrap_or(&config.a11y_label);
    platform.set_attr(surface, "aria-label", label);
    platform.set_css_var(surface, "--scrim-modal-alpha", &config.modal.alpha.0.to_string());
    platform.set_css_var(
        surface,
        "--scrim-modal-blur",
        &format!("{}px", config.modal.blur_px),
    );

    let spec = options.animation.take().unwrap_or_default();
    let resolved = resolve(
        &spec,
        Anchor::Center,
        config.animation.duration,
        &config.animation.easing,
    );
    platform.set_css_var(surface, "--scrim-anim-duration", &resolved.duration_css());
    platform.set_css_var(surface, "--scrim-anim-easing", resolved.easing.as_css());
    platform.set_css_var(surface, "--scrim-anim-distance", &resolved.distance_css());

    platform.append(roots.modal_root, overlay);
    platform.append(overlay, surface);

    let mut listeners = Vec::new();
    let mut title_node = None;
    let mut header = None;
    let mut footer = None;

    if options.chrome {
        let header_node = platform.create_element("div");
        platform.add_class(header_node, "scrim-header");
        let title = platform.create_element("div");
        platform.add_class(title, "scrim-title");
        if let Some(text) = &options.title {
            platform.set_text(title, text);
        }
        platform.append(header_node, title);
        title_node = Some(title);

        if options.close_button && options.dismiss.contains(DismissTriggers::CLOSE_BUTTON) {
            let close = platform.create_element("button");
            platform.add_class(close, "scrim-close");
            platform.set_attr(close, "aria-label", "Close");
            platform.set_text(close, "\u{00d7}");
            platform.append(header_node, close);
            let h = handle.clone();
            listeners.push(platform.listen(
                close,
                EventKind::Click,
                Rc::new(move |_| {
                    let _ = h.close(CloseResult::Dismissed(Dismissal::CloseButton));
                }),
            ));
        }
        platform.append(surface, header_node);
        header = Some(header_node);
    }

    let body_host = platform.create_element("div");
    platform.add_class(body_host, "scrim-body");
    if let Some(content) = &options.content {
        content.apply(platform, body_host, &env.sanitizer);
    }
    platform.append(surface, body_host);

    let on_button: ButtonCallback = options.on_button.take().unwrap_or_else(|| Rc::new(|_, _| {}));
    let mut button_listeners = Vec::new();
    if options.chrome && !options.buttons.is_empty() {
        let footer_node = platform.create_element("div");
        platform.add_class(footer_node, "scrim-footer");
        button_listeners =
            build_buttons(platform, footer_node, &options.buttons, handle, &on_button);
        platform.append(surface, footer_node);
        footer = Some(footer_node);
    }

    if options.dismiss.contains(DismissTriggers::ESCAPE) {
        let h = handle.clone();
        listeners.push(platform.listen(
            surface,
            EventKind::KeyDown,
            Rc::new(move |event| {
                if event.key().is_some_and(|k| k.key == Key::Escape) {
                    let _ = h.close(CloseResult::Dismissed(Dismissal::Escape));
                }
            }),
        ));
    }
    if options.dismiss.contains(DismissTriggers::BACKDROP) {
        let h = handle.clone();
        listeners.push(platform.listen(
            overlay,
            EventKind::Click,
            Rc::new(move |_| {
                let _ = h.close(CloseResult::Dismissed(Dismissal::Backdrop));
            }),
        ));
    }

    env.manager.scroll_lock(true);
    // The toast root stays visible to assistive technology so live
    // toasts keep announcing while a modal is up.
    let hider = Some(SiblingHider::install(
        platform,
        &[roots.modal_root, roots.toast_root],
    ));
    let focus_trap = if options.focus.no_trap {
        None
    } else {
        Some(FocusTrap::install(platform, surface, options.focus.initial))
    };
    let drag = options.drag.as_ref().and_then(|opts| {
        if platform.coarse_pointer() && !opts.force_on_coarse_pointer {
            return None;
        }
        let grab = header.unwrap_or(surface);
        Some(DragController::install(platform, grab, surface, opts.axis))
    });

    let anim_enabled = config.animation.enabled;
    *handle.cell.borrow_mut() = SurfaceCell::Live(Box::new(LiveSurface {
        platform: Rc::clone(platform),
        manager: Rc::clone(&env.manager),
        sanitizer: Rc::clone(&env.sanitizer),
        overlay,
        surface,
        title_node,
        body_host,
        footer,
        listeners,
        button_listeners,
        focus_trap,
        hider,
        drag,
        phase: Phase::Open,
        anim_enabled,
        anim_duration: resolved.duration,
        overlay_fade: config.overlay.fade,
        on_close: options.on_close.take(),
        on_button,
    }));
    debug!("surface rendered");

    if anim_enabled {
        platform.add_class(surface, "is-opening");
        platform.add_class(overlay, "is-opening");
        let p = Rc::clone(platform);
        let cell = Rc::clone(&handle.cell);
        let barrier = AnimationBarrier::new(move || {
            // A close may have started while the open animation was
            // still playing; the exit classes then own both nodes.
            let still_opening =
                matches!(&*cell.borrow(), SurfaceCell::Live(live) if live.phase == Phase::Open);
            if !still_opening {
                return;
            }
            for node in [surface, overlay] {
                p.remove_class(node, "is-opening");
                p.add_class(node, "is-open");
            }
            trace!("open animation settled");
        });
        barrier.watch(platform, surface, resolved.duration);
    } else {
        platform.add_class(surface, "is-open");
        platform.add_class(overlay, "is-open");
    }

    if let Some(on_open) = options.on_open.take() {
        on_open(handle);
    }
}

fn build_buttons(
    platform: &Rc<dyn Platform>,
    footer: NodeId,
    buttons: &[ButtonSpec],
    handle: &SurfaceHandle,
    on_button: &ButtonCallback,
) -> Vec<ListenerId> {
    let mut listeners = Vec::with_capacity(buttons.len());
    for spec in buttons {
        let node = platform.create_element("button");
        platform.add_class(node, "scrim-button");
        platform.add_class(node, spec.kind.class_name());
        platform.set_attr(node, "data-id", &spec.id);
        platform.set_text(node, &spec.label);
        platform.append(footer, node);

        let h = handle.clone();
        let id = spec.id.clone();
        let close_on_click = spec.close_on_click;
        let callback = Rc::clone(on_button);
        listeners.push(platform.listen(
            node,
            EventKind::Click,
            Rc::new(move |_| {
                callback(&h, &id);
                if close_on_click {
                    let _ = h.close(CloseResult::Button(id.clone()));
                }
            }),
        ));
    }
    listeners
}

enum CloseAction {
    Noop,
    Teardown,
    Animate {
        platform: Rc<dyn Platform>,
        surface: NodeId,
        overlay: NodeId,
        duration: Duration,
        overlay_fade: bool,
    },
}

impl SurfaceHandle {
    /// Close the surface. Idempotent; the exit animation runs unless
    /// animation is disabled, and teardown happens exactly once.
    pub fn close(&self, result: CloseResult) -> Result<(), Error> {
        let action = {
            let mut cell = self.cell.borrow_mut();
            match &mut *cell {
                SurfaceCell::Pending => return Err(Error::SurfaceNotReady),
                SurfaceCell::Done => return Err(Error::SurfaceClosed),
                SurfaceCell::Live(live) => {
                    if live.phase == Phase::Closing {
                        CloseAction::Noop
                    } else {
                        live.phase = Phase::Closing;
                        if live.anim_enabled {
                            CloseAction::Animate {
                                platform: Rc::clone(&live.platform),
                                surface: live.surface,
                                overlay: live.overlay,
                                duration: live.anim_duration,
                                overlay_fade: live.overlay_fade,
                            }
                        } else {
                            CloseAction::Teardown
                        }
                    }
                }
            }
        };
        match action {
            CloseAction::Noop => Ok(()),
            CloseAction::Teardown => {
                Self::teardown(&self.cell, result);
                Ok(())
            }
            CloseAction::Animate {
                platform,
                surface,
                overlay,
                duration,
                overlay_fade,
            } => {
                platform.remove_class(surface, "is-opening");
                platform.remove_class(surface, "is-open");
                platform.add_class(surface, "is-closing");
                if overlay_fade {
                    platform.remove_class(overlay, "is-opening");
                    platform.remove_class(overlay, "is-open");
                    platform.add_class(overlay, "is-closing");
                }
                let cell = Rc::clone(&self.cell);
                let barrier = AnimationBarrier::new(move || Self::teardown(&cell, result));
                barrier.watch(&platform, surface, duration);
                if overlay_fade {
                    barrier.watch(&platform, overlay, duration);
                }
                trace!("exit animation started");
                Ok(())
            }
        }
    }

    fn teardown(cell: &Rc<RefCell<SurfaceCell>>, result: CloseResult) {
        let live = {
            let mut cell = cell.borrow_mut();
            match std::mem::replace(&mut *cell, SurfaceCell::Done) {
                SurfaceCell::Live(live) => live,
                other => {
                    *cell = other;
                    return;
                }
            }
        };
        let mut live = *live;

        // Each release is independent; none can abort the others.
        live.platform.remove(live.overlay);
        for listener in live.listeners.drain(..).chain(live.button_listeners.drain(..)) {
            live.platform.unlisten(listener);
        }
        if let Some(mut drag) = live.drag.take() {
            drag.release();
        }
        if let Some(mut trap) = live.focus_trap.take() {
            trap.release();
        }
        if let Some(mut hider) = live.hider.take() {
            hider.release();
        }
        live.manager.scroll_lock(false);
        debug!("surface torn down");
        // May immediately render the next queued surface.
        live.manager.close_modal();
        if let Some(on_close) = live.on_close.take() {
            on_close(&result);
        }
    }

    /// Register an input listener whose lifetime is tied to the
    /// surface: teardown removes it along with the built-in ones.
    pub fn listen(
        &self,
        node: NodeId,
        kind: EventKind,
        callback: Rc<dyn Fn(&PlatformEvent)>,
    ) -> Result<(), Error> {
        let mut cell = self.cell.borrow_mut();
        match &mut *cell {
            SurfaceCell::Pending => Err(Error::SurfaceNotReady),
            SurfaceCell::Done => Err(Error::SurfaceClosed),
            SurfaceCell::Live(live) => {
                live.listeners.push(live.platform.listen(node, kind, callback));
                Ok(())
            }
        }
    }

    /// Replace title, content, or buttons of an open surface.
    pub fn update(&self, update: UpdateSpec) -> Result<(), Error> {
        let mut cell = self.cell.borrow_mut();
        let live = match &mut *cell {
            SurfaceCell::Pending => return Err(Error::SurfaceNotReady),
            SurfaceCell::Done => return Err(Error::SurfaceClosed),
            SurfaceCell::Live(live) => {
                if live.phase == Phase::Closing {
                    return Err(Error::SurfaceClosed);
                }
                live
            }
        };

        if let Some(title) = update.title {
            if let Some(node) = live.title_node {
                live.platform.set_text(node, &title);
            }
            live.platform.set_attr(live.surface, "aria-label", &title);
        }
        if let Some(content) = update.content {
            live.platform.clear_children(live.body_host);
            content.apply(&live.platform, live.body_host, &live.sanitizer);
        }
        if let Some(buttons) = update.buttons {
            for listener in live.button_listeners.drain(..) {
                live.platform.unlisten(listener);
            }
            let footer = match live.footer {
                Some(node) => node,
                None => {
                    let node = live.platform.create_element("div");
                    live.platform.add_class(node, "scrim-footer");
                    live.platform.append(live.surface, node);
                    live.footer = Some(node);
                    node
                }
            };
            live.platform.clear_children(footer);
            live.button_listeners =
                build_buttons(&live.platform, footer, &buttons, self, &live.on_button);
        }
        Ok(())
    }

    /// Whether the surface is rendered and not yet closing.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(&*self.cell.borrow(), SurfaceCell::Live(live) if live.phase == Phase::Open)
    }

    /// The surface element, for embedders that render into it.
    pub fn surface_node(&self) -> Result<NodeId, Error> {
        self.with_live(|live| live.surface)
    }

    /// The backdrop overlay element.
    pub fn overlay_node(&self) -> Result<NodeId, Error> {
        self.with_live(|live| live.overlay)
    }

    /// The body host element.
    pub fn body_node(&self) -> Result<NodeId, Error> {
        self.with_live(|live| live.body_host)
    }

    fn with_live<T>(&self, f: impl FnOnce(&LiveSurface) -> T) -> Result<T, Error> {
        match &*self.cell.borrow() {
            SurfaceCell::Pending => Err(Error::SurfaceNotReady),
            SurfaceCell::Done => Err(Error::SurfaceClosed),
            SurfaceCell::Live(live) => Ok(f(live)),
        }
    }
}
