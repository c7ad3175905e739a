//! Mobile navigation menu and smooth in-page anchors.

use crate::config::NavigationConfig;
use log::debug;
use page_host::{EventKind, EventTarget, NodeKey, Page, ScrollRequest};
use std::rc::Rc;

/// The menu toggle and the panel it opens.
pub struct MenuController {
    toggle: NodeKey,
    panel: NodeKey,
    open_class: String,
}

impl MenuController {
    /// Wire the toggle, panel link dismissal and outside-click dismissal.
    /// Returns `None` when either the toggle or the panel is missing.
    pub fn install(page: &Page, config: &NavigationConfig) -> Option<Rc<Self>> {
        let toggle = page.query_selector(&config.toggle_selector);
        let panel = page.query_selector(&config.panel_selector);
        let (Some(toggle), Some(panel)) = (toggle, panel) else {
            debug!("Menu: toggle or panel missing");
            return None;
        };
        let menu = Rc::new(Self {
            toggle,
            panel,
            open_class: config.open_class.clone(),
        });
        menu.set_open(page, false);

        let on_toggle = Rc::clone(&menu);
        page.add_event_listener(EventTarget::Node(toggle), EventKind::Click, move |host, _| {
            on_toggle.toggle(host);
        });

        let links = page.document().query_selector_all_within(panel, "a");
        for link in links {
            let on_link = Rc::clone(&menu);
            page.add_event_listener(EventTarget::Node(link), EventKind::Click, move |host, _| {
                on_link.set_open(host, false);
            });
        }

        let on_outside = Rc::clone(&menu);
        page.add_event_listener(EventTarget::Document, EventKind::Click, move |host, event| {
            let inside = event.target_node().is_some_and(|target| {
                let document = host.document();
                document.contains(on_outside.panel, target) || document.contains(on_outside.toggle, target)
            });
            if !inside {
                on_outside.set_open(host, false);
            }
        });
        Some(menu)
    }

    pub fn is_open(&self, page: &Page) -> bool {
        page.document().has_class(self.panel, &self.open_class)
    }

    /// Flip the panel, returning the new state.
    pub fn toggle(&self, page: &Page) -> bool {
        let open = !self.is_open(page);
        self.set_open(page, open);
        open
    }

    pub fn set_open(&self, page: &Page, open: bool) {
        let mut document = page.document_mut();
        document.set_class(self.panel, &self.open_class, open);
        document.set_attribute(self.toggle, "aria-expanded", if open { "true" } else { "false" });
    }
}

/// Make in-page anchors scroll smoothly to their target, leaving room for the
/// fixed navbar. Bare `#` links and unknown targets keep their default action.
/// Returns the number of anchors wired.
pub fn install_smooth_anchors(page: &Page, config: &NavigationConfig) -> usize {
    let anchors = page.query_selector_all(&config.anchor_selector);
    let offset = config.anchor_offset;
    let mut wired = 0;
    for anchor in anchors {
        let has_fragment = page
            .document()
            .get_attribute(anchor, "href")
            .is_some_and(|href| href.len() > 1 && href.starts_with('#'));
        if !has_fragment {
            continue;
        }
        page.add_event_listener(EventTarget::Node(anchor), EventKind::Click, move |host, event| {
            let destination = {
                let document = host.document();
                document
                    .get_attribute(anchor, "href")
                    .and_then(|href| href.strip_prefix('#'))
                    .and_then(|id| document.get_element_by_id(id))
                    .and_then(|target| document.layout(target))
                    .map(|rect| (rect.top - offset).max(0.0))
            };
            if let Some(top) = destination {
                event.prevent_default();
                host.scroll_window(ScrollRequest::smooth(top));
            }
        });
        wired += 1;
    }
    debug!("Menu: {wired} in-page anchors");
    wired
}
