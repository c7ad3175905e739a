//! Optional browser capabilities, checked by behaviors before use.
//!
//! A page never assumes a capability exists: the analytics tag function, the
//! clipboard and intersection observation are each provided (or not) when the
//! page is constructed.

use crate::values::EventPayload;
use anyhow::{Result, anyhow};
use core::cell::RefCell;
use std::rc::Rc;

/// The page-global analytics tag function, called as `tag(command, name, payload)`.
pub trait TagFunction {
    /// Forward one command to the analytics backend.
    ///
    /// # Errors
    /// Implementations may fail; callers treat delivery as best-effort.
    fn call(&self, command: &str, name: &str, payload: &EventPayload) -> Result<()>;
}

/// Asynchronous clipboard access, reduced to the one operation pages use.
pub trait Clipboard {
    /// Replace the clipboard contents.
    ///
    /// # Errors
    /// Returns an error when the platform denies the write.
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Set of capabilities available to a page.
#[derive(Clone)]
pub struct Capabilities {
    intersection_observer: bool,
    tag_function: Option<Rc<dyn TagFunction>>,
    clipboard: Option<Rc<dyn Clipboard>>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Capabilities {
    /// Baseline modern browser: intersection observation, no tag function, no clipboard.
    pub const fn new() -> Self {
        Self {
            intersection_observer: true,
            tag_function: None,
            clipboard: None,
        }
    }

    #[must_use]
    pub const fn with_intersection_observer(mut self, available: bool) -> Self {
        self.intersection_observer = available;
        self
    }

    #[must_use]
    pub fn with_tag_function(mut self, tag: Rc<dyn TagFunction>) -> Self {
        self.tag_function = Some(tag);
        self
    }

    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Rc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub const fn intersection_observer(&self) -> bool {
        self.intersection_observer
    }

    pub fn tag_function(&self) -> Option<Rc<dyn TagFunction>> {
        self.tag_function.as_ref().map(Rc::clone)
    }

    pub fn clipboard(&self) -> Option<Rc<dyn Clipboard>> {
        self.clipboard.as_ref().map(Rc::clone)
    }
}

/// A recorded `tag(...)` invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct TagCall {
    pub command: String,
    pub name: String,
    pub payload: EventPayload,
}

/// Tag function that keeps every call in memory; used by headless embedders.
#[derive(Debug, Default)]
pub struct RecordingTag {
    calls: RefCell<Vec<TagCall>>,
    failing: bool,
}

impl RecordingTag {
    /// A tag function that records each call and then reports a failure.
    pub fn failing() -> Self {
        Self {
            calls: RefCell::default(),
            failing: true,
        }
    }

    pub fn calls(&self) -> Vec<TagCall> {
        self.calls.borrow().clone()
    }

    /// Names of the recorded events, in call order.
    pub fn event_names(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.name.clone())
            .collect()
    }
}

impl TagFunction for RecordingTag {
    fn call(&self, command: &str, name: &str, payload: &EventPayload) -> Result<()> {
        self.calls.borrow_mut().push(TagCall {
            command: command.to_owned(),
            name: name.to_owned(),
            payload: payload.clone(),
        });
        if self.failing {
            return Err(anyhow!("tag backend unavailable"));
        }
        Ok(())
    }
}

/// In-memory clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: RefCell<Option<String>>,
    denied: bool,
}

impl MemoryClipboard {
    /// A clipboard whose writes are always rejected (permission denied).
    pub fn denied() -> Self {
        Self {
            contents: RefCell::default(),
            denied: true,
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        if self.denied {
            return Err(anyhow!("clipboard write denied"));
        }
        *self.contents.borrow_mut() = Some(text.to_owned());
        Ok(())
    }
}
