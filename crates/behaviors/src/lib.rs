//! Client-side behaviors for a marketing landing page.
//!
//! Each module wires one independent behavior onto a [`page_host::Page`]:
//! scroll-triggered reveals with animated counters, navbar and back-to-top
//! chrome, the mobile menu, FAQ accordion, lazy images, email validation,
//! copy buttons, analytics instrumentation and in-app browser deep links.
//! [`orchestrator::boot`] installs all of them once the document is parsed.

pub mod accordion;
/// Best-effort analytics sinks.
pub mod analytics;
pub mod clipboard;
pub mod config;
pub mod counter;
pub mod debounce;
pub mod environment;
pub mod forms;
pub mod lazy_load;
pub mod navigation;
pub mod orchestrator;
pub mod pulse;
pub mod reveal;
pub mod scroll_chrome;
pub mod structured_data;
pub mod tracking;

#[cfg(test)]
mod test_support;

pub use analytics::{Analytics, AnalyticsEvent, EventSink};
pub use config::BehaviorConfig;
pub use counter::{CounterTask, format_count};
pub use debounce::Debounced;
pub use environment::EnvironmentDescriptor;
pub use orchestrator::{Components, PageController, boot, boot_from_document, boot_with};
pub use pulse::PulseTask;
