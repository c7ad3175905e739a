//! DOM-style events and the listener registry.
//!
//! Listeners are stored per (target, kind). Dispatch copies the matching
//! callbacks out of the registry before invoking them, so a listener may add
//! or remove listeners (including itself) without re-entrancy problems.

use crate::dom::NodeKey;
use crate::page::Page;
use std::rc::Rc;

/// Event types the host dispatches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Scroll,
    Resize,
    Submit,
    DomContentLoaded,
}

impl EventKind {
    /// The DOM event type string.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Scroll => "scroll",
            Self::Resize => "resize",
            Self::Submit => "submit",
            Self::DomContentLoaded => "DOMContentLoaded",
        }
    }
}

/// Where a listener is attached / where an event is dispatched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Document,
    Node(NodeKey),
}

/// An event travelling along its propagation path.
#[derive(Clone, Debug)]
pub struct Event {
    kind: EventKind,
    target: EventTarget,
    current_target: EventTarget,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub const fn new(kind: EventKind, target: EventTarget) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    pub const fn target(&self) -> EventTarget {
        self.target
    }

    /// The target as a node, when the event was dispatched at an element.
    pub const fn target_node(&self) -> Option<NodeKey> {
        match self.target {
            EventTarget::Node(node) => Some(node),
            EventTarget::Window | EventTarget::Document => None,
        }
    }

    pub const fn current_target(&self) -> EventTarget {
        self.current_target
    }

    pub(crate) fn set_current_target(&mut self, target: EventTarget) {
        self.current_target = target;
    }

    /// Suppress the host's default action (link navigation, form submission).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub const fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop the event from reaching targets further up the path.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub const fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Callback signature for event listeners.
pub type Listener = Rc<dyn Fn(&Page, &mut Event)>;

/// Handle returned by `add_event_listener`, used for removal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    target: EventTarget,
    kind: EventKind,
    once: bool,
    callback: Listener,
}

/// All listeners registered on a page.
#[derive(Default)]
pub struct EventRegistry {
    next_id: u64,
    entries: Vec<ListenerEntry>,
}

impl EventRegistry {
    pub fn add(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        once: bool,
        callback: Listener,
    ) -> ListenerId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = ListenerId(self.next_id);
        self.entries.push(ListenerEntry {
            id,
            target,
            kind,
            once,
            callback,
        });
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    /// Callbacks for (target, kind) in registration order. Once-listeners are
    /// unregistered as they are handed out.
    pub fn take_for(&mut self, target: EventTarget, kind: EventKind) -> Vec<Listener> {
        let callbacks = self
            .entries
            .iter()
            .filter(|entry| entry.target == target && entry.kind == kind)
            .map(|entry| Rc::clone(&entry.callback))
            .collect();
        self.entries
            .retain(|entry| !(entry.once && entry.target == target && entry.kind == kind));
        callbacks
    }

    /// Number of listeners registered for (target, kind).
    pub fn count_for(&self, target: EventTarget, kind: EventKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.target == target && entry.kind == kind)
            .count()
    }
}
