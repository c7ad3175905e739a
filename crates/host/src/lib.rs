//! Headless page host for client-side page behaviors.
//!
//! This crate models the browser surface a page script sees: an element tree
//! queried with CSS selectors, bubbling events with default actions, virtual-clock
//! timers, intersection observers, window state and optional capabilities
//! (analytics tag function, clipboard). Everything is single-threaded and
//! deterministic so behaviors can be driven and inspected from tests.

/// Optional capabilities (tag function, clipboard, intersection observation).
pub mod capabilities;
pub mod console;
pub mod dom;
pub mod events;
/// Intersection observer registry and geometry.
pub mod observer;
pub mod page;
/// Virtual-clock timer queue.
pub mod timers;
pub mod values;
pub mod window;

pub use capabilities::{Capabilities, Clipboard, MemoryClipboard, RecordingTag, TagCall, TagFunction};
pub use console::{Console, ConsoleEntry};
pub use dom::{DOMNode, Document, LayoutRect, NodeKey, NodeKind, ReadyState};
pub use events::{Event, EventKind, EventTarget, ListenerId};
pub use observer::{IntersectionEntry, ObserverId, ObserverOptions, RootMargin};
pub use page::Page;
pub use timers::TimerId;
pub use values::{EventPayload, EventValue, LogLevel};
pub use window::{ScrollBehavior, ScrollRequest, Window};
