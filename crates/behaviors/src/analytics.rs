//! Best-effort analytics fan-out.
//!
//! [`Analytics::track`] hands an event to every sink. Sinks may be missing or
//! fail; neither is reported to the caller and events are never queued or retried.

use anyhow::Result;
use log::trace;
use page_host::{EventPayload, EventValue, LogLevel, Page};
use serde::Serialize;
use std::rc::Rc;

/// A named analytics event with a flat payload of primitives.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    name: String,
    payload: EventPayload,
}

impl AnalyticsEvent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            payload: EventPayload::new(),
        }
    }

    /// Add a payload field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<EventValue>) -> Self {
        self.payload.insert(key.to_owned(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn payload(&self) -> &EventPayload {
        &self.payload
    }
}

/// Destination for analytics events.
pub trait EventSink {
    /// Deliver one event.
    ///
    /// # Errors
    /// Any delivery failure; [`Analytics`] swallows it.
    fn send(&self, page: &Page, event: &AnalyticsEvent) -> Result<()>;
}

/// Forwards to the page's global tag function as `tag("event", name, payload)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TagSink;

impl EventSink for TagSink {
    fn send(&self, page: &Page, event: &AnalyticsEvent) -> Result<()> {
        let Some(tag) = page.capabilities().tag_function() else {
            return Ok(());
        };
        tag.call("event", &event.name, &event.payload)
    }
}

/// Writes a JSON record to the page console when served from a loopback host.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn send(&self, page: &Page, event: &AnalyticsEvent) -> Result<()> {
        let loopback = page.window().is_loopback();
        if loopback {
            let record = serde_json::to_string(event)?;
            page.console_log(LogLevel::Debug, &format!("Analytics: {record}"));
        }
        Ok(())
    }
}

/// Shared analytics handle; cloning is cheap.
#[derive(Clone)]
pub struct Analytics {
    sinks: Vec<Rc<dyn EventSink>>,
}

impl Default for Analytics {
    fn default() -> Self {
        Self::standard()
    }
}

impl Analytics {
    /// Tag function and development console.
    pub fn standard() -> Self {
        Self {
            sinks: vec![Rc::new(TagSink), Rc::new(ConsoleSink)],
        }
    }

    /// No sinks at all; every event is dropped.
    pub const fn disabled() -> Self {
        Self { sinks: Vec::new() }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Rc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn track(&self, page: &Page, event: &AnalyticsEvent) {
        for sink in &self.sinks {
            if let Err(err) = sink.send(page, event) {
                trace!("Analytics: dropped {}: {err:#}", event.name);
            }
        }
    }

    /// Track an event without payload.
    pub fn track_name(&self, page: &Page, name: &str) {
        self.track(page, &AnalyticsEvent::new(name));
    }
}
