//! Periodic attention pulse on call-to-action elements.

use crate::config::PulseConfig;
use core::ops::ControlFlow;
use log::debug;
use page_host::{Page, TimerId};

/// Handle to the pulse interval.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PulseTask {
    timer: TimerId,
}

impl PulseTask {
    pub fn is_running(self, page: &Page) -> bool {
        page.is_timer_active(self.timer)
    }

    pub fn cancel(self, page: &Page) -> bool {
        page.clear_timer(self.timer)
    }
}

/// Toggle the pulse class on every matching element each period. Returns
/// `None` when nothing matches.
pub fn start(page: &Page, config: &PulseConfig) -> Option<PulseTask> {
    let targets = page.query_selector_all(&config.selector);
    if targets.is_empty() {
        debug!("Pulse: nothing to pulse");
        return None;
    }
    let class = config.class.clone();
    let timer = page.set_interval(config.period(), move |host| {
        let mut document = host.document_mut();
        for target in &targets {
            document.toggle_class(*target, &class);
        }
        ControlFlow::Continue(())
    });
    Some(PulseTask { timer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blank_page, body_element};
    use anyhow::{Result, bail};
    use core::time::Duration;

    #[test]
    fn toggles_every_period_until_cancelled() -> Result<()> {
        let page = blank_page()?;
        let cta = body_element(&page, "a", &[("data-pulse", ""), ("href", "#signup")])?;
        let Some(task) = start(&page, &PulseConfig::default()) else {
            bail!("pulse target exists");
        };
        page.advance(Duration::from_millis(2999));
        assert!(!page.document().has_class(cta, "pulse"));
        page.advance(Duration::from_millis(1));
        assert!(page.document().has_class(cta, "pulse"));
        page.advance(Duration::from_secs(3));
        assert!(!page.document().has_class(cta, "pulse"));

        assert!(task.cancel(&page));
        assert!(!task.is_running(&page));
        page.advance(Duration::from_secs(9));
        assert!(!page.document().has_class(cta, "pulse"));
        Ok(())
    }

    #[test]
    fn no_targets_no_timer() -> Result<()> {
        let page = blank_page()?;
        assert!(start(&page, &PulseConfig::default()).is_none());
        assert_eq!(page.pending_timers(), 0);
        Ok(())
    }
}
