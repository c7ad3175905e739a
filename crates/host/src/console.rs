//! Diagnostic console for the page host.
//!
//! Every line is forwarded to the `log` crate and kept in memory so embedders
//! (and tests) can inspect what a page wrote to its console.

use crate::values::LogLevel;
use log::{debug, error, info, warn};

/// One recorded console line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Console buffer for a single page view.
#[derive(Debug, Default)]
pub struct Console {
    entries: Vec<ConsoleEntry>,
}

impl Console {
    /// Record a line and forward it to the host log.
    pub fn write(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => debug!("[console]: {message}"),
            LogLevel::Info => info!("[console]: {message}"),
            LogLevel::Warn => warn!("[console]: {message}"),
            LogLevel::Error => error!("[console]: {message}"),
        }
        self.entries.push(ConsoleEntry {
            level,
            message: message.to_owned(),
        });
    }

    #[inline]
    pub fn log(&mut self, message: &str) {
        self.write(LogLevel::Info, message);
    }

    pub fn entries(&self) -> &[ConsoleEntry] {
        &self.entries
    }

    /// Messages only, in write order.
    pub fn messages(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.message.as_str())
            .collect()
    }
}
