//! Declarative click tracking and scroll-depth milestones.

use crate::analytics::{Analytics, AnalyticsEvent};
use crate::config::TrackingConfig;
use crate::debounce::Debounced;
use core::cell::RefCell;
use log::debug;
use page_host::{EventKind, EventTarget, Page};
use std::rc::Rc;

/// Report a click on every element carrying the tracking attribute, named by
/// that attribute and labelled with the element's text. Returns the number of
/// elements wired.
pub fn install_click_tracking(page: &Page, config: &TrackingConfig, analytics: &Analytics) -> usize {
    let targets = page.query_selector_all(&config.click_selector);
    for target in &targets {
        let target = *target;
        let attribute = config.click_attribute.clone();
        let analytics = analytics.clone();
        page.add_event_listener(EventTarget::Node(target), EventKind::Click, move |host, _| {
            let event = {
                let document = host.document();
                document
                    .get_attribute(target, &attribute)
                    .filter(|name| !name.is_empty())
                    .map(|name| {
                        AnalyticsEvent::new(name).with("label", document.text_content(target).trim())
                    })
            };
            if let Some(event) = event {
                analytics.track(host, &event);
            }
        });
    }
    debug!("Tracking: {} click targets", targets.len());
    targets.len()
}

/// Percentage of the document seen so far: the bottom edge of the viewport over
/// the document height, capped at 100.
pub fn scroll_depth(scroll_y: f64, viewport_height: f64, document_height: f64) -> f64 {
    if document_height <= 0.0 {
        return 100.0;
    }
    ((scroll_y + viewport_height) / document_height * 100.0).clamp(0.0, 100.0)
}

/// Milestones not yet reported, ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollDepthTracker {
    remaining: Vec<u32>,
}

impl ScrollDepthTracker {
    pub fn new(marks: &[u32]) -> Self {
        let mut remaining = marks.to_vec();
        remaining.sort_unstable();
        remaining.dedup();
        Self { remaining }
    }

    /// Take every milestone reached at `depth`. Each one is returned only once.
    pub fn reached(&mut self, depth: f64) -> Vec<u32> {
        let split = self
            .remaining
            .iter()
            .position(|mark| f64::from(*mark) > depth)
            .unwrap_or(self.remaining.len());
        self.remaining.drain(..split).collect()
    }

    pub fn remaining(&self) -> &[u32] {
        &self.remaining
    }
}

/// Report scroll-depth milestones on debounced window scroll. Returns the
/// shared tracker so callers can inspect what is left.
pub fn install_scroll_depth(
    page: &Page,
    config: &TrackingConfig,
    analytics: &Analytics,
) -> Rc<RefCell<ScrollDepthTracker>> {
    let tracker = Rc::new(RefCell::new(ScrollDepthTracker::new(&config.depth_marks)));
    let state = Rc::clone(&tracker);
    let analytics = analytics.clone();
    let report = Debounced::new(config.scroll_debounce(), move |host: &Page, depth: f64| {
        let marks = state.borrow_mut().reached(depth);
        for mark in marks {
            debug!("Tracking: scroll depth {mark}%");
            analytics.track(host, &AnalyticsEvent::new("scroll_depth").with("percent", mark));
        }
    });
    page.add_event_listener(EventTarget::Window, EventKind::Scroll, move |host, _| {
        let depth = {
            let window = host.window();
            scroll_depth(window.scroll_y(), window.viewport_height(), window.document_height())
        };
        report.call(host, depth);
    });
    tracker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DESKTOP_UA, body_element, page_with, recording_capabilities};
    use anyhow::Result;
    use core::time::Duration;
    use page_host::{EventValue, RecordingTag};

    #[test]
    fn depth_is_the_viewport_bottom_over_the_document() {
        assert!((scroll_depth(0.0, 800.0, 4000.0) - 20.0).abs() < 1e-9);
        assert!((scroll_depth(2200.0, 800.0, 4000.0) - 75.0).abs() < 1e-9);
        assert!((scroll_depth(9000.0, 800.0, 4000.0) - 100.0).abs() < 1e-9);
        assert!((scroll_depth(0.0, 800.0, 0.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn milestones_are_reported_once() {
        let mut tracker = ScrollDepthTracker::new(&[50, 25, 100, 75, 25]);
        assert_eq!(tracker.reached(10.0), Vec::<u32>::new());
        assert_eq!(tracker.reached(60.0), [25, 50]);
        assert_eq!(tracker.reached(55.0), Vec::<u32>::new());
        assert_eq!(tracker.reached(100.0), [75, 100]);
        assert!(tracker.remaining().is_empty());
    }

    #[test]
    fn tracked_clicks_carry_the_label() -> Result<()> {
        let tag = Rc::new(RecordingTag::default());
        let page = page_with(DESKTOP_UA, recording_capabilities(&tag))?;
        let cta = body_element(&page, "a", &[("href", "#pricing"), ("data-track", "cta_click")])?;
        page.document_mut().set_text_content(cta, "  Start free trial ");
        assert_eq!(install_click_tracking(&page, &TrackingConfig::default(), &Analytics::standard()), 1);
        page.click(cta);
        let calls = tag.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "cta_click");
        assert_eq!(calls[0].payload.get("label"), Some(&EventValue::from("Start free trial")));
        Ok(())
    }

    #[test]
    fn scroll_depth_waits_for_the_burst_to_settle() -> Result<()> {
        let tag = Rc::new(RecordingTag::default());
        let page = page_with(DESKTOP_UA, recording_capabilities(&tag))?;
        let tracker = install_scroll_depth(&page, &TrackingConfig::default(), &Analytics::standard());

        // 800px viewport over a 4000px document.
        page.scroll_to(300.0);
        page.scroll_to(1300.0);
        page.advance(Duration::from_millis(50));
        assert!(tag.calls().is_empty());
        page.advance(Duration::from_millis(100));
        assert_eq!(tag.event_names(), ["scroll_depth", "scroll_depth"]);

        page.scroll_to(200.0);
        page.advance(Duration::from_millis(150));
        assert_eq!(tag.calls().len(), 2);
        assert_eq!(tracker.borrow().remaining(), [75, 100]);

        page.scroll_to(3200.0);
        page.advance(Duration::from_millis(150));
        let percents: Vec<_> = tag
            .calls()
            .iter()
            .filter_map(|call| call.payload.get("percent").cloned())
            .collect();
        assert_eq!(
            percents,
            [25u32, 50, 75, 100].map(EventValue::from),
        );
        Ok(())
    }
}
