//! Scroll-reactive chrome: navbar restyling and the back-to-top control.
//!
//! Both subscribers are debounced independently and evaluated once at install
//! time, so a page that loads already scrolled shows the right state.

use crate::analytics::Analytics;
use crate::config::ScrollChromeConfig;
use crate::debounce::Debounced;
use core::time::Duration;
use log::debug;
use page_host::{EventKind, EventTarget, NodeKey, Page, ScrollRequest};

/// Installed scroll chrome. Either element may be missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrollChrome {
    navbar: Option<NodeKey>,
    back_to_top: Option<NodeKey>,
}

impl ScrollChrome {
    pub fn install(page: &Page, config: &ScrollChromeConfig, analytics: &Analytics) -> Self {
        let navbar = page.query_selector(&config.navbar_selector);
        let back_to_top = page.query_selector(&config.back_to_top_selector);

        if let Some(node) = navbar {
            bind_threshold_class(
                page,
                node,
                config.navbar_class.clone(),
                config.navbar_threshold,
                config.navbar_debounce(),
            );
        } else {
            debug!("ScrollChrome: no navbar");
        }

        if let Some(node) = back_to_top {
            bind_threshold_class(
                page,
                node,
                config.back_to_top_class.clone(),
                config.back_to_top_threshold,
                config.back_to_top_debounce(),
            );
            let analytics = analytics.clone();
            page.add_event_listener(EventTarget::Node(node), EventKind::Click, move |host, event| {
                event.prevent_default();
                host.scroll_window(ScrollRequest::smooth(0.0));
                analytics.track_name(host, "back_to_top");
            });
        } else {
            debug!("ScrollChrome: no back-to-top control");
        }

        Self { navbar, back_to_top }
    }

    pub const fn navbar(&self) -> Option<NodeKey> {
        self.navbar
    }

    pub const fn back_to_top(&self) -> Option<NodeKey> {
        self.back_to_top
    }
}

/// Keep `class` on `node` while the scroll offset exceeds `threshold`.
fn bind_threshold_class(page: &Page, node: NodeKey, class: String, threshold: f64, wait: Duration) {
    let initial = page.window().scroll_y();
    page.document_mut().set_class(node, &class, initial > threshold);

    let update = Debounced::new(wait, move |host: &Page, offset: f64| {
        host.document_mut().set_class(node, &class, offset > threshold);
    });
    page.add_event_listener(EventTarget::Window, EventKind::Scroll, move |host, _| {
        let offset = host.window().scroll_y();
        update.call(host, offset);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DESKTOP_UA, blank_page, body_element, page_with, recording_capabilities};
    use anyhow::Result;
    use page_host::{RecordingTag, ScrollBehavior};
    use std::rc::Rc;

    const SETTLE: Duration = Duration::from_millis(150);

    #[test]
    fn thresholds_follow_the_scroll_offset() -> Result<()> {
        let page = blank_page()?;
        let navbar = body_element(&page, "nav", &[("class", "navbar")])?;
        let button = body_element(&page, "button", &[("id", "back-to-top")])?;
        ScrollChrome::install(&page, &ScrollChromeConfig::default(), &Analytics::disabled());
        assert!(!page.document().has_class(navbar, "scrolled"));
        assert!(!page.document().has_class(button, "visible"));

        page.scroll_to(400.0);
        page.advance(SETTLE);
        assert!(page.document().has_class(navbar, "scrolled"));
        assert!(page.document().has_class(button, "visible"));

        page.scroll_to(0.0);
        page.advance(SETTLE);
        assert!(!page.document().has_class(navbar, "scrolled"));
        assert!(!page.document().has_class(button, "visible"));
        Ok(())
    }

    #[test]
    fn navbar_and_button_update_on_their_own_schedules() -> Result<()> {
        let page = blank_page()?;
        let navbar = body_element(&page, "nav", &[("class", "navbar")])?;
        let button = body_element(&page, "a", &[("id", "back-to-top"), ("href", "#")])?;
        ScrollChrome::install(&page, &ScrollChromeConfig::default(), &Analytics::disabled());
        page.scroll_to(350.0);
        page.advance(Duration::from_millis(50));
        assert!(page.document().has_class(navbar, "scrolled"), "50ms debounce elapsed");
        assert!(!page.document().has_class(button, "visible"), "100ms debounce pending");
        page.advance(Duration::from_millis(50));
        assert!(page.document().has_class(button, "visible"));
        Ok(())
    }

    #[test]
    fn initial_state_reflects_a_restored_scroll_position() -> Result<()> {
        let page = blank_page()?;
        let navbar = body_element(&page, "nav", &[("class", "navbar")])?;
        page.window_mut().set_scroll_y(120.0);
        let chrome = ScrollChrome::install(&page, &ScrollChromeConfig::default(), &Analytics::disabled());
        assert!(page.document().has_class(navbar, "scrolled"));
        assert_eq!(chrome.back_to_top(), None);
        Ok(())
    }

    #[test]
    fn back_to_top_scrolls_smoothly_and_tracks() -> Result<()> {
        let tag = Rc::new(RecordingTag::default());
        let page = page_with(DESKTOP_UA, recording_capabilities(&tag))?;
        let button = body_element(&page, "a", &[("id", "back-to-top"), ("href", "#")])?;
        ScrollChrome::install(&page, &ScrollChromeConfig::default(), &Analytics::standard());
        page.scroll_to(1500.0);
        let event = page.click(button);
        assert!(event.default_prevented());
        assert!(page.window().scroll_y().abs() < f64::EPSILON);
        let requests = page.window().scroll_requests().to_vec();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].behavior, ScrollBehavior::Smooth);
        assert_eq!(tag.event_names(), ["back_to_top"]);
        Ok(())
    }
}
