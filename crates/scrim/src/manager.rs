#![forbid(unsafe_code)]

//! The coordination point: root containers, the modal concurrency
//! gate, toast slots, and the scroll lock.
//!
//! One `Manager` exists per [`Scrim`](crate::Scrim) context. All
//! state is interior-mutable and every operation runs synchronously
//! within one event-loop turn, so mutation ordering is call ordering.
//!
//! # Invariants
//!
//! 1. At most one modal surface is rendered at a time; the active
//!    counter never exceeds 1.
//! 2. Queued modal jobs run strictly FIFO.
//! 3. A queued toast entry is dequeued only while its slot's visible
//!    count is strictly below the cap recorded at enqueue time.
//! 4. No internal borrow is held while a job or mount callback runs.
//!
//! # Failure Modes
//!
//! - `open_modal` under the `Reject` policy is the only operation
//!   that fails; everything else is effect-only.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use ahash::AHashMap;
use scrim_core::{Anchor, NodeId, Platform};
use tracing::{debug, trace};

use crate::config::{ConcurrencyPolicy, ConfigStore, ToastBehavior};
use crate::error::Error;

/// A deferred modal render, admitted by the concurrency gate.
pub type ModalJob = Box<dyn FnOnce()>;

/// Builds one toast container under the given slot node and returns
/// it. Run by the manager when the slot admits the toast.
pub type ToastMount = Box<dyn FnOnce(NodeId) -> NodeId>;

/// The two root containers, created lazily under the mount point.
#[derive(Debug, Clone, Copy)]
pub struct Roots {
    pub modal_root: NodeId,
    pub toast_root: NodeId,
}

struct QueuedToast {
    mount: ToastMount,
    /// Cap in effect when the toast was enqueued.
    max_visible: usize,
}

struct ToastSlot {
    node: NodeId,
    /// Visible toast containers, oldest first.
    visible: Vec<NodeId>,
    pending: VecDeque<QueuedToast>,
}

struct RootState {
    roots: Roots,
    mounted_under: NodeId,
    theme_class: &'static str,
}

/// Per-context coordination point.
pub struct Manager {
    platform: Rc<dyn Platform>,
    config: ConfigStore,
    roots: RefCell<Option<RootState>>,
    active: Cell<u32>,
    queue: RefCell<VecDeque<ModalJob>>,
    slots: RefCell<AHashMap<Anchor, ToastSlot>>,
    scroll_locked: Cell<bool>,
}

impl Manager {
    #[must_use]
    pub fn new(platform: Rc<dyn Platform>, config: ConfigStore) -> Self {
        Self {
            platform,
            config,
            roots: RefCell::new(None),
            active: Cell::new(0),
            queue: RefCell::new(VecDeque::new()),
            slots: RefCell::new(AHashMap::new()),
            scroll_locked: Cell::new(false),
        }
    }

    /// Idempotently create the modal and toast roots under the
    /// configured mount, re-parenting them if the mount changed, and
    /// apply the current theme class and z-index.
    pub fn ensure_roots(&self) -> Roots {
        let config = self.config.get();
        let mount = config.mount.unwrap_or_else(|| self.platform.body());
        let theme_class = config.theme.class_name();

        let mut state = self.roots.borrow_mut();
        let state = state.get_or_insert_with(|| {
            let modal_root = self.platform.create_element("div");
            self.platform.add_class(modal_root, "scrim-modal-root");
            let toast_root = self.platform.create_element("div");
            self.platform.add_class(toast_root, "scrim-toast-root");
            self.platform.append(mount, modal_root);
            self.platform.append(mount, toast_root);
            debug!("root containers created");
            RootState {
                roots: Roots {
                    modal_root,
                    toast_root,
                },
                mounted_under: mount,
                theme_class,
            }
        });

        if state.mounted_under != mount {
            self.platform.append(mount, state.roots.modal_root);
            self.platform.append(mount, state.roots.toast_root);
            state.mounted_under = mount;
            debug!("root containers re-parented");
        }
        if state.theme_class != theme_class {
            for root in [state.roots.modal_root, state.roots.toast_root] {
                self.platform.remove_class(root, state.theme_class);
            }
            state.theme_class = theme_class;
        }
        for root in [state.roots.modal_root, state.roots.toast_root] {
            self.platform.add_class(root, theme_class);
        }
        self.platform
            .set_css_var(state.roots.modal_root, "--scrim-z", &config.z_index.to_string());
        self.platform.set_css_var(
            state.roots.toast_root,
            "--scrim-z",
            &(config.z_index + config.toast.z_boost).to_string(),
        );
        state.roots
    }

    /// Run `job` now if no modal is active, otherwise queue or reject
    /// per the current concurrency policy.
    pub fn open_modal(&self, job: ModalJob) -> Result<(), Error> {
        if self.active.get() == 0 {
            self.active.set(1);
            trace!("modal admitted");
            job();
            return Ok(());
        }
        match self.config.get().modal.policy {
            ConcurrencyPolicy::Reject => {
                debug!("modal rejected by policy");
                Err(Error::ModalRejected)
            }
            ConcurrencyPolicy::Queue => {
                self.queue.borrow_mut().push_back(job);
                trace!(depth = self.queue.borrow().len(), "modal queued");
                Ok(())
            }
        }
    }

    /// Record a modal close and run the next queued job, if any.
    ///
    /// The dequeued job goes back through [`Self::open_modal`], so it
    /// is subject to the same concurrency check.
    pub fn close_modal(&self) {
        self.active.set(self.active.get().saturating_sub(1));
        trace!("modal closed");
        let next = self.queue.borrow_mut().pop_front();
        if let Some(job) = next {
            // Counter is 0 here, so this always admits.
            let _ = self.open_modal(job);
        }
    }

    /// Number of currently rendered modal surfaces (0 or 1).
    #[must_use]
    pub fn active_modals(&self) -> u32 {
        self.active.get()
    }

    /// Number of queued modal jobs.
    #[must_use]
    pub fn queued_modals(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Toggle the page scroll lock. Idempotent.
    pub fn scroll_lock(&self, enable: bool) {
        if self.scroll_locked.get() == enable {
            return;
        }
        self.scroll_locked.set(enable);
        let body = self.platform.body();
        if enable {
            self.platform.set_css_var(
                body,
                "--scrim-scrollbar-width",
                &format!("{}px", self.platform.scrollbar_width()),
            );
            self.platform.add_class(body, "scrim-scroll-lock");
        } else {
            self.platform.remove_class(body, "scrim-scroll-lock");
        }
    }

    /// Whether the page scroll lock is held.
    #[must_use]
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked.get()
    }

    /// The slot node for `position`, created lazily and cached for
    /// the page lifetime.
    pub fn toast_slot(&self, position: Anchor) -> NodeId {
        let roots = self.ensure_roots();
        if let Some(slot) = self.slots.borrow().get(&position) {
            return slot.node;
        }
        let config = self.config.get();
        let node = self.platform.create_element("div");
        self.platform.add_class(node, "scrim-slot");
        self.platform
            .add_class(node, &format!("scrim-slot-{}", position.class_suffix()));
        self.platform
            .set_css_var(node, "--scrim-toast-gap", &format!("{}px", config.toast.gap_px));
        self.platform.set_css_var(
            node,
            "--scrim-toast-margin",
            &format!("{}px", config.toast.margin_px),
        );
        self.platform.append(roots.toast_root, node);
        debug!(position = position.class_suffix(), "toast slot created");
        self.slots.borrow_mut().insert(
            position,
            ToastSlot {
                node,
                visible: Vec::new(),
                pending: VecDeque::new(),
            },
        );
        node
    }

    /// Admit a toast into its slot per `behavior`.
    pub fn show_toast(
        &self,
        position: Anchor,
        behavior: ToastBehavior,
        max_visible: usize,
        mount: ToastMount,
    ) {
        let slot_node = self.toast_slot(position);
        let max_visible = max_visible.max(1);

        // Decide and evict inside the borrow, mount outside it.
        let admit = {
            let mut slots = self.slots.borrow_mut();
            let slot = slots
                .get_mut(&position)
                .unwrap_or_else(|| unreachable!("slot created above"));
            match behavior {
                ToastBehavior::Stack => {
                    while slot.visible.len() >= max_visible {
                        let oldest = slot.visible.remove(0);
                        self.platform.remove(oldest);
                        trace!("toast evicted");
                    }
                    true
                }
                ToastBehavior::Replace => {
                    for old in slot.visible.drain(..) {
                        self.platform.remove(old);
                    }
                    true
                }
                ToastBehavior::Queue => {
                    if slot.visible.len() < max_visible {
                        true
                    } else {
                        slot.pending.push_back(QueuedToast { mount, max_visible });
                        trace!(depth = slot.pending.len(), "toast queued");
                        return;
                    }
                }
            }
        };
        debug_assert!(admit);

        let container = mount(slot_node);
        if let Some(slot) = self.slots.borrow_mut().get_mut(&position) {
            slot.visible.push(container);
        }
    }

    /// Report a toast's exit sequence finished; may dequeue the next
    /// pending mount for the position.
    pub fn on_toast_removed(&self, position: Anchor, container: NodeId) {
        let next = {
            let mut slots = self.slots.borrow_mut();
            let Some(slot) = slots.get_mut(&position) else {
                return;
            };
            slot.visible.retain(|&c| c != container);
            match slot.pending.front() {
                Some(entry) if slot.visible.len() < entry.max_visible => {
                    slot.pending.pop_front().map(|e| (e.mount, slot.node))
                }
                _ => None,
            }
        };
        if let Some((mount, slot_node)) = next {
            trace!("toast dequeued");
            let mounted = mount(slot_node);
            if let Some(slot) = self.slots.borrow_mut().get_mut(&position) {
                slot.visible.push(mounted);
            }
        }
    }

    /// Visible toast containers for a position, oldest first.
    #[must_use]
    pub fn visible_toasts(&self, position: Anchor) -> Vec<NodeId> {
        self.slots
            .borrow()
            .get(&position)
            .map(|slot| slot.visible.clone())
            .unwrap_or_default()
    }

    /// Number of queued toast mounts for a position.
    #[must_use]
    pub fn queued_toasts(&self, position: Anchor) -> usize {
        self.slots
            .borrow()
            .get(&position)
            .map_or(0, |slot| slot.pending.len())
    }
}
