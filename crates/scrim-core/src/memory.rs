#![forbid(unsafe_code)]

//! In-memory reference implementation of [`Platform`].
//!
//! `MemoryPlatform` maintains a real node tree, a listener table,
//! and a manually advanced clock. It is the backend every lifecycle
//! test runs against, and the backend the default Scrim context uses
//! when no real rendering surface has been installed.
//!
//! Time never passes on its own: [`MemoryPlatform::advance`] moves
//! the clock and fires due timers in due order. Animation-completion
//! signals are likewise explicit via
//! [`MemoryPlatform::complete_animation`] — a test that never calls
//! it models the platform's "animation event failed to fire" case.
//!
//! # Invariants
//!
//! 1. Timer callbacks fire in due order; equal deadlines fire in
//!    scheduling order.
//! 2. No internal borrow is held while a user callback runs, so
//!    callbacks may freely re-enter the platform.
//! 3. Detached nodes keep their data; only connectivity changes.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ahash::AHashMap;
use web_time::Instant;

use crate::event::{EventDetail, EventKind, PlatformEvent};
use crate::platform::{ListenerId, NodeId, Platform, TimerId};

const FOCUSABLE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];

#[derive(Default)]
struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: Vec<String>,
    text: String,
    html: String,
    value: String,
    attrs: AHashMap<String, String>,
    css_vars: AHashMap<String, String>,
}

struct ListenerEntry {
    id: ListenerId,
    node: NodeId,
    kind: EventKind,
    callback: Rc<dyn Fn(&PlatformEvent)>,
}

struct AnimListener {
    id: ListenerId,
    node: NodeId,
    callback: Box<dyn FnOnce()>,
}

struct TimerEntry {
    id: TimerId,
    due: Instant,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

struct MemState {
    nodes: AHashMap<NodeId, NodeData>,
    body: NodeId,
    listeners: Vec<ListenerEntry>,
    anim_listeners: Vec<AnimListener>,
    timers: Vec<TimerEntry>,
    focused: Option<NodeId>,
    now: Instant,
    viewport: (f64, f64),
    coarse_pointer: bool,
    scrollbar_width: f64,
    next_node: u64,
    next_listener: u64,
    next_timer: u64,
    next_seq: u64,
}

/// In-memory [`Platform`] with a manual clock.
pub struct MemoryPlatform {
    state: RefCell<MemState>,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    /// Create a platform with an empty body element.
    #[must_use]
    pub fn new() -> Self {
        let body = NodeId::from_raw(1);
        let mut nodes = AHashMap::new();
        nodes.insert(
            body,
            NodeData {
                tag: "body".to_string(),
                ..NodeData::default()
            },
        );
        Self {
            state: RefCell::new(MemState {
                nodes,
                body,
                listeners: Vec::new(),
                anim_listeners: Vec::new(),
                timers: Vec::new(),
                focused: None,
                now: Instant::now(),
                viewport: (1280.0, 800.0),
                coarse_pointer: false,
                scrollbar_width: 15.0,
                next_node: 2,
                next_listener: 1,
                next_timer: 1,
                next_seq: 0,
            }),
        }
    }

    // --- Clock ---

    /// Advance the clock by `delta`, firing due timers in order.
    pub fn advance(&self, delta: Duration) {
        let target = self.state.borrow().now + delta;
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let idx = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                match idx {
                    Some(i) => {
                        let entry = state.timers.remove(i);
                        state.now = state.now.max(entry.due);
                        Some(entry.callback)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    /// Number of input and animation-end listeners still registered.
    #[must_use]
    pub fn active_listeners(&self) -> usize {
        let state = self.state.borrow();
        state.listeners.len() + state.anim_listeners.len()
    }

    /// Number of timers still pending.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    // --- Signal injection ---

    /// Dispatch an event to the listeners registered on `node`.
    pub fn dispatch(&self, node: NodeId, kind: EventKind, detail: EventDetail) {
        let callbacks: Vec<Rc<dyn Fn(&PlatformEvent)>> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.node == node && l.kind == kind)
            .map(|l| Rc::clone(&l.callback))
            .collect();
        let event = PlatformEvent {
            target: node,
            detail,
        };
        for callback in callbacks {
            callback(&event);
        }
    }

    /// Fire every pending animation-end subscription for `node`.
    pub fn complete_animation(&self, node: NodeId) {
        let fired: Vec<Box<dyn FnOnce()>> = {
            let mut state = self.state.borrow_mut();
            let mut fired = Vec::new();
            let mut i = 0;
            while i < state.anim_listeners.len() {
                if state.anim_listeners[i].node == node {
                    fired.push(state.anim_listeners.remove(i).callback);
                } else {
                    i += 1;
                }
            }
            fired
        };
        for callback in fired {
            callback();
        }
    }

    // --- Environment control ---

    pub fn set_viewport(&self, width: f64, height: f64) {
        self.state.borrow_mut().viewport = (width, height);
    }

    pub fn set_coarse_pointer(&self, coarse: bool) {
        self.state.borrow_mut().coarse_pointer = coarse;
    }

    pub fn set_scrollbar_width(&self, width: f64) {
        self.state.borrow_mut().scrollbar_width = width;
    }

    // --- Inspection ---

    /// Children of `node`, in document order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// The tag a node was created with.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.state.borrow().nodes.get(&node).map(|n| n.tag.clone())
    }

    /// Current text content of a node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> String {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    /// Current markup content of a node.
    #[must_use]
    pub fn html(&self, node: NodeId) -> String {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.html.clone())
            .unwrap_or_default()
    }

    /// Class list of a node.
    #[must_use]
    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    /// A CSS custom property previously set on a node.
    #[must_use]
    pub fn css_var(&self, node: NodeId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.css_vars.get(name).cloned())
    }

    /// Connected nodes carrying `class`, in document order.
    #[must_use]
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        let state = self.state.borrow();
        let mut out = Vec::new();
        Self::walk(&state, state.body, &mut |id, data| {
            if data.classes.iter().any(|c| c == class) {
                out.push(id);
            }
        });
        out
    }

    /// Connected nodes where `attr(name) == value`, in document order.
    #[must_use]
    pub fn find_by_attr(&self, name: &str, value: &str) -> Vec<NodeId> {
        let state = self.state.borrow();
        let mut out = Vec::new();
        Self::walk(&state, state.body, &mut |id, data| {
            if data.attrs.get(name).is_some_and(|v| v == value) {
                out.push(id);
            }
        });
        out
    }

    fn walk(state: &MemState, node: NodeId, visit: &mut impl FnMut(NodeId, &NodeData)) {
        if let Some(data) = state.nodes.get(&node) {
            visit(node, data);
            for child in &data.children {
                Self::walk(state, *child, visit);
            }
        }
    }

    fn detach(state: &mut MemState, node: NodeId) {
        let parent = state.nodes.get(&node).and_then(|n| n.parent);
        if let Some(parent) = parent
            && let Some(pdata) = state.nodes.get_mut(&parent)
        {
            pdata.children.retain(|c| *c != node);
        }
        if let Some(data) = state.nodes.get_mut(&node) {
            data.parent = None;
        }
    }

    fn connected(state: &MemState, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == state.body {
                return true;
            }
            match state.nodes.get(&current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn collect_focusables(state: &MemState, node: NodeId, out: &mut Vec<NodeId>) {
        if let Some(data) = state.nodes.get(&node) {
            let focusable =
                FOCUSABLE_TAGS.contains(&data.tag.as_str()) || data.attrs.contains_key("tabindex");
            if focusable && node != state.body {
                out.push(node);
            }
            for child in &data.children {
                Self::collect_focusables(state, *child, out);
            }
        }
    }
}

impl Platform for MemoryPlatform {
    fn create_element(&self, tag: &str) -> NodeId {
        let mut state = self.state.borrow_mut();
        let id = NodeId::from_raw(state.next_node);
        state.next_node += 1;
        state.nodes.insert(
            id,
            NodeData {
                tag: tag.to_string(),
                ..NodeData::default()
            },
        );
        id
    }

    fn append(&self, parent: NodeId, child: NodeId) {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(&parent) || !state.nodes.contains_key(&child) {
            return;
        }
        Self::detach(&mut state, child);
        if let Some(pdata) = state.nodes.get_mut(&parent) {
            pdata.children.push(child);
        }
        if let Some(cdata) = state.nodes.get_mut(&child) {
            cdata.parent = Some(parent);
        }
    }

    fn remove(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        Self::detach(&mut state, node);
    }

    fn clear_children(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        let children = state
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            Self::detach(&mut state, child);
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().nodes.get(&node).and_then(|n| n.parent)
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let state = self.state.borrow();
        state.nodes.contains_key(&node) && Self::connected(&state, node)
    }

    fn body(&self) -> NodeId {
        self.state.borrow().body
    }

    fn siblings_of(&self, node: NodeId) -> Vec<NodeId> {
        let state = self.state.borrow();
        state
            .nodes
            .get(&node)
            .and_then(|n| n.parent)
            .and_then(|p| state.nodes.get(&p))
            .map(|p| p.children.iter().copied().filter(|c| *c != node).collect())
            .unwrap_or_default()
    }

    fn set_text(&self, node: NodeId, text: &str) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node) {
            data.text = text.to_string();
            data.html.clear();
        }
    }

    fn set_html(&self, node: NodeId, html: &str) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node) {
            data.html = html.to_string();
            data.text.clear();
        }
    }

    fn add_class(&self, node: NodeId, class: &str) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node)
            && !data.classes.iter().any(|c| c == class)
        {
            data.classes.push(class.to_string());
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node) {
            data.classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node) {
            data.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attr(&self, node: NodeId, name: &str) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node) {
            data.attrs.remove(name);
        }
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    fn set_css_var(&self, node: NodeId, name: &str, value: &str) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node) {
            data.css_vars.insert(name.to_string(), value.to_string());
        }
    }

    fn listen(
        &self,
        node: NodeId,
        kind: EventKind,
        callback: Rc<dyn Fn(&PlatformEvent)>,
    ) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push(ListenerEntry {
            id,
            node,
            kind,
            callback,
        });
        id
    }

    fn unlisten(&self, listener: ListenerId) {
        let mut state = self.state.borrow_mut();
        state.listeners.retain(|l| l.id != listener);
        state.anim_listeners.retain(|l| l.id != listener);
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_timer);
        state.next_timer += 1;
        let due = state.now + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(TimerEntry {
            id,
            due,
            seq,
            callback,
        });
        id
    }

    fn clear_timeout(&self, timer: TimerId) {
        self.state.borrow_mut().timers.retain(|t| t.id != timer);
    }

    fn on_animation_end(&self, node: NodeId, callback: Box<dyn FnOnce()>) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.anim_listeners.push(AnimListener { id, node, callback });
        id
    }

    fn focused(&self) -> Option<NodeId> {
        let state = self.state.borrow();
        state
            .focused
            .filter(|node| Self::connected(&state, *node))
    }

    fn focus(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        if state.nodes.contains_key(&node) {
            state.focused = Some(node);
        }
    }

    fn focusables_within(&self, node: NodeId) -> Vec<NodeId> {
        let state = self.state.borrow();
        let mut out = Vec::new();
        Self::collect_focusables(&state, node, &mut out);
        out
    }

    fn value(&self, node: NodeId) -> String {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&self, node: NodeId, value: &str) {
        if let Some(data) = self.state.borrow_mut().nodes.get_mut(&node) {
            data.value = value.to_string();
        }
    }

    fn viewport(&self) -> (f64, f64) {
        self.state.borrow().viewport
    }

    fn measure(&self, node: NodeId) -> (f64, f64) {
        // No layout engine: honor explicit data-width/data-height
        // attributes, otherwise report a plausible dialog size.
        let parse = |v: Option<String>| v.and_then(|s| s.parse::<f64>().ok());
        let w = parse(self.attr(node, "data-width")).unwrap_or(480.0);
        let h = parse(self.attr(node, "data-height")).unwrap_or(320.0);
        (w, h)
    }

    fn coarse_pointer(&self) -> bool {
        self.state.borrow().coarse_pointer
    }

    fn scrollbar_width(&self) -> f64 {
        self.state.borrow().scrollbar_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn append_connects_and_remove_detaches() {
        let p = MemoryPlatform::new();
        let div = p.create_element("div");
        assert!(!p.is_connected(div));

        p.append(p.body(), div);
        assert!(p.is_connected(div));
        assert_eq!(p.parent(div), Some(p.body()));

        p.remove(div);
        assert!(!p.is_connected(div));
        assert_eq!(p.children(p.body()), Vec::<NodeId>::new());
    }

    #[test]
    fn reappend_moves_between_parents() {
        let p = MemoryPlatform::new();
        let a = p.create_element("div");
        let b = p.create_element("div");
        let child = p.create_element("span");
        p.append(p.body(), a);
        p.append(p.body(), b);

        p.append(a, child);
        assert_eq!(p.children(a), vec![child]);

        p.append(b, child);
        assert_eq!(p.children(a), Vec::<NodeId>::new());
        assert_eq!(p.children(b), vec![child]);
    }

    #[test]
    fn classes_are_deduplicated() {
        let p = MemoryPlatform::new();
        let div = p.create_element("div");
        p.add_class(div, "x");
        p.add_class(div, "x");
        assert_eq!(p.classes(div), vec!["x".to_string()]);
        p.remove_class(div, "x");
        assert!(!p.has_class(div, "x"));
    }

    #[test]
    fn timers_fire_in_due_order() {
        let p = MemoryPlatform::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        p.set_timeout(Duration::from_millis(30), Box::new(move || o.borrow_mut().push(30)));
        let o = Rc::clone(&order);
        p.set_timeout(Duration::from_millis(10), Box::new(move || o.borrow_mut().push(10)));
        let o = Rc::clone(&order);
        p.set_timeout(Duration::from_millis(20), Box::new(move || o.borrow_mut().push(20)));

        p.advance(Duration::from_millis(25));
        assert_eq!(*order.borrow(), vec![10, 20]);
        assert_eq!(p.pending_timers(), 1);

        p.advance(Duration::from_millis(5));
        assert_eq!(*order.borrow(), vec![10, 20, 30]);
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let p = MemoryPlatform::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let o = Rc::clone(&order);
            p.set_timeout(Duration::from_millis(10), Box::new(move || o.borrow_mut().push(i)));
        }
        p.advance(Duration::from_millis(10));
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn cleared_timer_does_not_fire() {
        let p = MemoryPlatform::new();
        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let id = p.set_timeout(Duration::from_millis(5), Box::new(move || f.set(true)));
        p.clear_timeout(id);
        p.advance(Duration::from_millis(10));
        assert!(!fired.get());
    }

    #[test]
    fn timer_callback_may_reenter_platform() {
        let p = Rc::new(MemoryPlatform::new());
        let fired = Rc::new(Cell::new(false));
        let p2 = Rc::clone(&p);
        let f = Rc::clone(&fired);
        p.set_timeout(
            Duration::from_millis(5),
            Box::new(move || {
                let div = p2.create_element("div");
                p2.append(p2.body(), div);
                f.set(true);
            }),
        );
        p.advance(Duration::from_millis(5));
        assert!(fired.get());
        assert_eq!(p.children(p.body()).len(), 1);
    }

    #[test]
    fn dispatch_targets_only_registered_node() {
        let p = MemoryPlatform::new();
        let a = p.create_element("div");
        let b = p.create_element("div");
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        p.listen(a, EventKind::Click, Rc::new(move |_| h.set(h.get() + 1)));

        p.dispatch(b, EventKind::Click, EventDetail::None);
        assert_eq!(hits.get(), 0);
        p.dispatch(a, EventKind::Click, EventDetail::None);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn animation_end_is_one_shot() {
        let p = MemoryPlatform::new();
        let div = p.create_element("div");
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        p.on_animation_end(div, Box::new(move || c.set(c.get() + 1)));

        p.complete_animation(div);
        p.complete_animation(div);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn unlisten_removes_animation_subscription() {
        let p = MemoryPlatform::new();
        let div = p.create_element("div");
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let id = p.on_animation_end(div, Box::new(move || c.set(c.get() + 1)));
        p.unlisten(id);
        p.complete_animation(div);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn focusables_in_document_order() {
        let p = MemoryPlatform::new();
        let root = p.create_element("div");
        let input = p.create_element("input");
        let inner = p.create_element("div");
        let button = p.create_element("button");
        p.append(p.body(), root);
        p.append(root, input);
        p.append(root, inner);
        p.append(inner, button);

        assert_eq!(p.focusables_within(root), vec![input, button]);
    }

    #[test]
    fn focused_detached_node_reports_none() {
        let p = MemoryPlatform::new();
        let input = p.create_element("input");
        p.append(p.body(), input);
        p.focus(input);
        assert_eq!(p.focused(), Some(input));
        p.remove(input);
        assert_eq!(p.focused(), None);
    }

    #[test]
    fn find_by_class_skips_detached() {
        let p = MemoryPlatform::new();
        let a = p.create_element("div");
        let b = p.create_element("div");
        p.add_class(a, "needle");
        p.add_class(b, "needle");
        p.append(p.body(), a);
        assert_eq!(p.find_by_class("needle"), vec![a]);
    }
}
