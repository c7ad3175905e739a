//! FAQ accordion: at most one item open at a time.

use crate::analytics::{Analytics, AnalyticsEvent};
use crate::config::AccordionConfig;
use log::debug;
use page_host::{EventKind, EventTarget, NodeKey, Page};
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct AccordionItem {
    item: NodeKey,
    toggle: NodeKey,
}

/// One accordion group and the elements it owns.
pub struct Accordion {
    items: Vec<AccordionItem>,
    open_class: String,
    analytics: Analytics,
}

impl Accordion {
    /// Wire every item that has a toggle. Any item marked open in the markup is
    /// closed first so the group starts all-closed.
    pub fn install(page: &Page, config: &AccordionConfig, analytics: &Analytics) -> Option<Rc<Self>> {
        let items: Vec<AccordionItem> = {
            let document = page.document();
            document
                .query_selector_all(&config.item_selector)
                .into_iter()
                .filter_map(|item| {
                    let toggle = document.query_selector_within(item, &config.toggle_selector)?;
                    Some(AccordionItem { item, toggle })
                })
                .collect()
        };
        if items.is_empty() {
            debug!("Accordion: no items match {:?}", config.item_selector);
            return None;
        }

        let accordion = Rc::new(Self {
            items,
            open_class: config.open_class.clone(),
            analytics: analytics.clone(),
        });
        accordion.apply(page, None);
        for (index, entry) in accordion.items.iter().enumerate() {
            let group = Rc::clone(&accordion);
            page.add_event_listener(EventTarget::Node(entry.toggle), EventKind::Click, move |host, _| {
                group.activate(host, index);
            });
        }
        Some(accordion)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Click handler for item `index`: close it when open, otherwise open it and
    /// close every other item in the same update.
    pub fn activate(&self, page: &Page, index: usize) {
        let Some(target) = self.items.get(index) else {
            return;
        };
        let was_open = page.document().has_class(target.item, &self.open_class);
        if was_open {
            self.apply(page, None);
            return;
        }
        self.apply(page, Some(index));
        let question = page.document().text_content(target.toggle).trim().to_owned();
        self.analytics
            .track(page, &AnalyticsEvent::new("faq_open").with("question", question));
    }

    /// Index of the open item, if any.
    pub fn open_index(&self, page: &Page) -> Option<usize> {
        let document = page.document();
        self.items
            .iter()
            .position(|entry| document.has_class(entry.item, &self.open_class))
    }

    fn apply(&self, page: &Page, open: Option<usize>) {
        let mut document = page.document_mut();
        for (index, entry) in self.items.iter().enumerate() {
            let is_open = open == Some(index);
            document.set_class(entry.item, &self.open_class, is_open);
            document.set_attribute(entry.toggle, "aria-expanded", if is_open { "true" } else { "false" });
        }
    }
}
