//! Linear numeric counter animation.

use crate::config::CounterConfig;
use core::cell::Cell;
use core::ops::ControlFlow;
use core::time::Duration;
use page_host::{NodeKey, Page, TimerId};

/// Tick length and number formatting for a counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterStyle {
    pub tick: Duration,
    pub separator: String,
}

impl Default for CounterStyle {
    fn default() -> Self {
        Self::from(&CounterConfig::default())
    }
}

impl From<&CounterConfig> for CounterStyle {
    fn from(config: &CounterConfig) -> Self {
        Self {
            tick: config.tick(),
            separator: config.separator.clone(),
        }
    }
}

/// Handle to a running counter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CounterTask {
    timer: TimerId,
}

impl CounterTask {
    pub fn is_running(self, page: &Page) -> bool {
        page.is_timer_active(self.timer)
    }

    /// Stop the animation where it is.
    pub fn cancel(self, page: &Page) -> bool {
        page.clear_timer(self.timer)
    }
}

/// Animate `node`'s text from `start` to `end` over `duration` with the default style.
pub fn animate(
    page: &Page,
    node: NodeKey,
    start: f64,
    end: f64,
    duration: Duration,
) -> Option<CounterTask> {
    animate_with(page, node, start, end, duration, &CounterStyle::default())
}

/// Animate `node`'s text from `start` to `end`.
///
/// Every tick adds `(end - start) / (duration / tick)` and displays the floored
/// value. Once the running value reaches `end` the text is set to `end` and the
/// timer stops, so an overshoot is never shown. Inputs that cannot animate
/// (`end <= start`, non-finite values, a duration shorter than one tick) show
/// `end` immediately and return `None`.
pub fn animate_with(
    page: &Page,
    node: NodeKey,
    start: f64,
    end: f64,
    duration: Duration,
    style: &CounterStyle,
) -> Option<CounterTask> {
    let tick = style.tick.max(Duration::from_millis(1));
    let steps = duration.as_nanos() as f64 / tick.as_nanos() as f64;
    let degenerate = !start.is_finite() || !end.is_finite() || end <= start || steps < 1.0;
    if degenerate {
        if end.is_finite() {
            page.document_mut()
                .set_text_content(node, &format_count(end, &style.separator));
        }
        return None;
    }

    let increment = (end - start) / steps;
    let current = Cell::new(start);
    let separator = style.separator.clone();
    page.document_mut()
        .set_text_content(node, &format_count(start, &separator));
    let timer = page.set_interval(tick, move |host| {
        let next = current.get() + increment;
        current.set(next);
        if next >= end {
            host.document_mut()
                .set_text_content(node, &format_count(end, &separator));
            return ControlFlow::Break(());
        }
        host.document_mut()
            .set_text_content(node, &format_count(next, &separator));
        ControlFlow::Continue(())
    });
    Some(CounterTask { timer })
}

/// Floor `value` and group its digits in threes: `1234567.8` → `"1,234,567"`.
pub fn format_count(value: f64, separator: &str) -> String {
    let whole = value.floor() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len() + 1);
    if whole < 0 {
        out.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(digit);
    }
    out
}
