#![forbid(unsafe_code)]

//! The toast engine.
//!
//! Each toast is a container (the slot-positioned wrapper) holding
//! the toast element. The enter animation fully settles before any
//! exit trigger is armed; exit is two-staged: the exit animation on
//! the toast element, then a collapse animation on the container,
//! then removal and queue advancement through the manager.
//!
//! # Invariants
//!
//! 1. No exit trigger (timer, close button, action) is armed before
//!    the enter animation settled.
//! 2. The exit sequence runs at most once per toast; re-entrant
//!    dismissal is a no-op.
//! 3. A toast evicted by the manager (removed without animation)
//!    never reports itself removed a second time.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use scrim_core::{
    Anchor, AnimationBarrier, AnimationSpec, EventKind, ListenerId, NodeId, Platform,
    ResolvedAnimation, TimerId, resolve,
};
use tracing::{debug, trace};

use crate::config::{ConfigStore, CountdownCue, ToastBehavior};
use crate::manager::Manager;
use crate::sanitize::{Content, Sanitize};

/// Semantic flavor of a toast, applied as a `scrim-kind-*` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    fn class_suffix(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Auto-dismiss timing for one toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Use the configured default.
    #[default]
    Default,
    /// Never auto-dismiss.
    None,
    After(Duration),
}

/// An action button inside a toast.
#[derive(Debug, Clone)]
pub struct ToastAction {
    pub id: String,
    pub label: String,
    /// Dismiss the toast after the action callback runs.
    pub dismiss: bool,
}

impl ToastAction {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            dismiss: true,
        }
    }

    #[must_use]
    pub fn keep_open(mut self) -> Self {
        self.dismiss = false;
        self
    }
}

type ActionCallback = Rc<dyn Fn(&str)>;
type RemovedCallback = Box<dyn FnOnce()>;

/// Per-call toast configuration; unset fields use the configured
/// toast defaults.
#[derive(Default)]
pub struct ToastOptions {
    pub(crate) title: Option<String>,
    pub(crate) body: Option<Content>,
    pub(crate) kind: ToastKind,
    pub(crate) position: Option<Anchor>,
    pub(crate) behavior: Option<ToastBehavior>,
    pub(crate) max_visible: Option<usize>,
    pub(crate) timeout: Timeout,
    pub(crate) dismissible: Option<bool>,
    pub(crate) countdown: Option<CountdownCue>,
    pub(crate) enter: Option<AnimationSpec>,
    pub(crate) exit: Option<AnimationSpec>,
    pub(crate) actions: Vec<ToastAction>,
    pub(crate) on_action: Option<ActionCallback>,
    pub(crate) on_close: Option<RemovedCallback>,
}

impl ToastOptions {
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
    pub fn body(mut self, body: impl Into<Content>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ToastKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn position(mut self, position: Anchor) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn behavior(mut self, behavior: ToastBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    #[must_use]
    pub fn max_visible(mut self, cap: usize) -> Self {
        self.max_visible = Some(cap);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = Some(dismissible);
        self
    }

    #[must_use]
    pub fn countdown(mut self, cue: CountdownCue) -> Self {
        self.countdown = Some(cue);
        self
    }

    #[must_use]
    pub fn enter_animation(mut self, spec: AnimationSpec) -> Self {
        self.enter = Some(spec);
        self
    }

    #[must_use]
    pub fn exit_animation(mut self, spec: AnimationSpec) -> Self {
        self.exit = Some(spec);
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: Vec<ToastAction>) -> Self {
        self.actions = actions;
        self
    }

    #[must_use]
    pub fn on_action(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.on_action = Some(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn on_close(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToastPhase {
    /// Created but not yet admitted by the slot (queue behavior).
    Queued,
    Entering,
    Visible,
    Exiting,
    Removed,
}

struct ToastState {
    platform: Rc<dyn Platform>,
    manager: Rc<Manager>,
    phase: ToastPhase,
    position: Anchor,
    container: Option<NodeId>,
    element: Option<NodeId>,
    listeners: Vec<ListenerId>,
    timer: Option<TimerId>,
    anim_enabled: bool,
    exit_anim: ResolvedAnimation,
    timeout: Option<Duration>,
    on_close: Option<RemovedCallback>,
}

/// Caller's handle to one toast.
#[derive(Clone)]
pub struct ToastHandle {
    state: Rc<RefCell<ToastState>>,
}

impl ToastHandle {
    /// Dismiss the toast through the normal exit sequence.
    ///
    /// No-op while the toast is queued, already exiting, or removed.
    pub fn dismiss(&self) {
        begin_exit(&self.state);
    }

    /// Whether the toast is currently visible (entered, not exiting).
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.state.borrow().phase == ToastPhase::Visible
    }
}

/// Shared collaborators the toast engine renders against.
#[derive(Clone)]
pub(crate) struct ToastEnv {
    pub platform: Rc<dyn Platform>,
    pub manager: Rc<Manager>,
    pub config: ConfigStore,
    pub sanitizer: Rc<dyn Sanitize>,
}

/// Build and show a toast.
pub(crate) fn show(env: &ToastEnv, mut options: ToastOptions) -> ToastHandle {
    let config = env.config.get();
    let position = options.position.unwrap_or(config.toast.position);
    let behavior = options.behavior.unwrap_or(config.toast.behavior);
    let max_visible = options.max_visible.unwrap_or(config.toast.max_visible);
    let dismissible = options.dismissible.unwrap_or(config.toast.dismissible);
    let countdown = options.countdown.unwrap_or(config.toast.countdown);
    let timeout = match options.timeout {
        Timeout::Default => config.toast.timeout,
        Timeout::None => None,
        Timeout::After(d) => Some(d),
    };
    let enter_spec = options.enter.take().unwrap_or_else(|| config.toast.enter.clone());
    let exit_spec = options.exit.take().unwrap_or_else(|| config.toast.exit.clone());
    let enter = resolve(
        &enter_spec,
        position,
        config.animation.duration,
        &config.animation.easing,
    );
    let exit = resolve(
        &exit_spec,
        position,
        config.animation.duration,
        &config.animation.easing,
    );
    let anim_enabled = config.animation.enabled;

    let state = Rc::new(RefCell::new(ToastState {
        platform: Rc::clone(&env.platform),
        manager: Rc::clone(&env.manager),
        phase: ToastPhase::Queued,
        position,
        container: None,
        element: None,
        listeners: Vec::new(),
        timer: None,
        anim_enabled,
        exit_anim: exit,
        timeout,
        on_close: options.on_close.take(),
    }));
    let handle = ToastHandle {
        state: Rc::clone(&state),
    };

    let env = env.clone();
    let mount_state = Rc::clone(&state);
    let mount = Box::new(move |slot: NodeId| {
        mount_toast(
            &env,
            slot,
            &mount_state,
            &options,
            dismissible,
            countdown,
            timeout,
            &enter,
        )
    });
    env_manager(&state).show_toast(position, behavior, max_visible, mount);
    handle
}

fn env_manager(state: &Rc<RefCell<ToastState>>) -> Rc<Manager> {
    Rc::clone(&state.borrow().manager)
}

#[allow(clippy::too_many_arguments)]
fn mount_toast(
    env: &ToastEnv,
    slot: NodeId,
    state: &Rc<RefCell<ToastState>>,
    options: &ToastOptions,
    dismissible: bool,
    countdown: CountdownCue,
    timeout: Option<Duration>,
    enter: &ResolvedAnimation,
) -> NodeId {
    let platform = &env.platform;
    let mut listeners = Vec::new();

    let container = platform.create_element("div");
    platform.add_class(container, "scrim-toast-container");

    let element = platform.create_element("div");
    platform.add_class(element, "scrim-toast");
    platform.add_class(element, &format!("scrim-kind-{}", options.kind.class_suffix()));
    platform.set_attr(element, "role", "status");
    platform.set_css_var(element, "--scrim-anim-duration", &enter.duration_css());
    platform.set_css_var(element, "--scrim-anim-easing", enter.easing.as_css());
    platform.set_css_var(element, "--scrim-anim-distance", &enter.distance_css());
    platform.add_class(
        element,
        &format!("scrim-from-{}", enter.direction.class_suffix()),
    );

    if let Some(title) = &options.title {
        let node = platform.create_element("div");
        platform.add_class(node, "scrim-toast-title");
        platform.set_text(node, title);
        platform.append(element, node);
    }
    if let Some(body) = &options.body {
        let node = platform.create_element("div");
        platform.add_class(node, "scrim-toast-body");
        body.apply(platform, node, &env.sanitizer);
        platform.append(element, node);
    }

    if !options.actions.is_empty() {
        let bar = platform.create_element("div");
        platform.add_class(bar, "scrim-toast-actions");
        let on_action = options.on_action.clone();
        for action in &options.actions {
            let node = platform.create_element("button");
            platform.add_class(node, "scrim-toast-action");
            platform.set_attr(node, "data-id", &action.id);
            platform.set_text(node, &action.label);
            platform.append(bar, node);

            let state = Rc::clone(state);
            let id = action.id.clone();
            let dismiss = action.dismiss;
            let on_action = on_action.clone();
            listeners.push(platform.listen(
                node,
                EventKind::Click,
                Rc::new(move |_| {
                    if let Some(callback) = &on_action {
                        callback(&id);
                    }
                    if dismiss {
                        begin_exit(&state);
                    }
                }),
            ));
        }
        platform.append(element, bar);
    }

    if dismissible {
        let close = platform.create_element("button");
        platform.add_class(close, "scrim-toast-close");
        platform.set_attr(close, "aria-label", "Dismiss");
        platform.set_text(close, "\u{00d7}");
        platform.append(element, close);
        let state = Rc::clone(state);
        listeners.push(platform.listen(
            close,
            EventKind::Click,
            Rc::new(move |_| begin_exit(&state)),
        ));
    }

    if let (Some(duration), cue) = (timeout, countdown)
        && cue != CountdownCue::None
    {
        let node = platform.create_element("div");
        let (base, grow) = match cue {
            CountdownCue::Bar { grow } => ("scrim-countdown-bar", grow),
            CountdownCue::Cover { grow } => ("scrim-countdown-cover", grow),
            CountdownCue::None => unreachable!("filtered above"),
        };
        platform.add_class(node, "scrim-countdown");
        platform.add_class(node, base);
        platform.add_class(node, if grow { "is-growing" } else { "is-shrinking" });
        platform.set_css_var(
            node,
            "--scrim-countdown-duration",
            &format!("{}ms", duration.as_millis()),
        );
        platform.append(element, node);
    }

    platform.append(container, element);
    platform.append(slot, container);
    debug!("toast mounted");

    {
        let mut s = state.borrow_mut();
        s.container = Some(container);
        s.element = Some(element);
        s.listeners = listeners;
        s.phase = ToastPhase::Entering;
    }

    // Exit triggers arm only after the enter animation settles.
    if state.borrow().anim_enabled {
        platform.add_class(element, "is-opening");
        let settle_state = Rc::clone(state);
        let p = Rc::clone(platform);
        let barrier = AnimationBarrier::new(move || {
            // An exit trigger may have fired while the enter animation
            // was still playing; the exit classes then own the node.
            if settle_state.borrow().phase != ToastPhase::Entering {
                return;
            }
            p.remove_class(element, "is-opening");
            p.add_class(element, "is-open");
            finish_enter(&settle_state);
        });
        barrier.watch(platform, element, enter.duration);
    } else {
        platform.add_class(element, "is-open");
        finish_enter(state);
    }

    container
}

fn finish_enter(state: &Rc<RefCell<ToastState>>) {
    let timeout = {
        let mut s = state.borrow_mut();
        if s.phase != ToastPhase::Entering {
            return;
        }
        s.phase = ToastPhase::Visible;
        s.timeout
    };
    if let Some(duration) = timeout {
        let timer_state = Rc::clone(state);
        let timer = state.borrow().platform.set_timeout(
            duration,
            Box::new(move || {
                trace!("toast timeout fired");
                begin_exit(&timer_state);
            }),
        );
        state.borrow_mut().timer = Some(timer);
    }
}

/// Start the two-stage exit sequence. Safe to call from any trigger;
/// only the first call has an effect.
fn begin_exit(state: &Rc<RefCell<ToastState>>) {
    let (platform, element, container, anim_enabled, exit) = {
        let mut s = state.borrow_mut();
        match s.phase {
            ToastPhase::Entering | ToastPhase::Visible => {}
            ToastPhase::Queued | ToastPhase::Exiting | ToastPhase::Removed => return,
        }
        s.phase = ToastPhase::Exiting;
        if let Some(timer) = s.timer.take() {
            s.platform.clear_timeout(timer);
        }
        let (Some(element), Some(container)) = (s.element, s.container) else {
            return;
        };
        (
            Rc::clone(&s.platform),
            element,
            container,
            s.anim_enabled,
            s.exit_anim.clone(),
        )
    };

    // Evicted without animation by the manager: the container is
    // already gone and the slot already advanced.
    if !platform.is_connected(container) {
        finish_removal(state, false);
        return;
    }

    if !anim_enabled {
        collapse_container(state);
        return;
    }

    platform.set_css_var(element, "--scrim-anim-duration", &exit.duration_css());
    platform.set_css_var(element, "--scrim-anim-easing", exit.easing.as_css());
    platform.set_css_var(element, "--scrim-anim-distance", &exit.distance_css());
    platform.remove_class(element, "is-opening");
    platform.remove_class(element, "is-open");
    platform.add_class(element, "is-closing");
    let stage_state = Rc::clone(state);
    let barrier = AnimationBarrier::new(move || collapse_container(&stage_state));
    barrier.watch(&platform, element, exit.duration);
    trace!("toast exit started");
}

/// Stage two: collapse the container, then remove and advance.
fn collapse_container(state: &Rc<RefCell<ToastState>>) {
    let (platform, container, anim_enabled, duration) = {
        let s = state.borrow();
        let Some(container) = s.container else { return };
        (
            Rc::clone(&s.platform),
            container,
            s.anim_enabled,
            s.exit_anim.duration,
        )
    };
    if !anim_enabled {
        finish_removal(state, true);
        return;
    }
    platform.add_class(container, "is-collapsing");
    let done_state = Rc::clone(state);
    let barrier = AnimationBarrier::new(move || finish_removal(&done_state, true));
    barrier.watch(&platform, container, duration);
}

fn finish_removal(state: &Rc<RefCell<ToastState>>, notify_manager: bool) {
    let (platform, manager, container, position, listeners, on_close) = {
        let mut s = state.borrow_mut();
        if s.phase == ToastPhase::Removed {
            return;
        }
        s.phase = ToastPhase::Removed;
        let Some(container) = s.container.take() else {
            return;
        };
        s.element = None;
        (
            Rc::clone(&s.platform),
            Rc::clone(&s.manager),
            container,
            s.position,
            std::mem::take(&mut s.listeners),
            s.on_close.take(),
        )
    };
    for listener in listeners {
        platform.unlisten(listener);
    }
    platform.remove(container);
    debug!("toast removed");
    if notify_manager {
        manager.on_toast_removed(position, container);
    }
    if let Some(callback) = on_close {
        callback();
    }
}
