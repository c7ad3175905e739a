//! Copy-to-clipboard buttons.

use crate::analytics::{Analytics, AnalyticsEvent};
use crate::config::ClipboardConfig;
use core::cell::Cell;
use core::time::Duration;
use log::{debug, trace};
use page_host::{EventKind, EventTarget, NodeKey, Page, TimerId};
use std::rc::Rc;

struct CopyButton {
    node: NodeKey,
    label: String,
    reset: Cell<Option<TimerId>>,
}

impl CopyButton {
    /// Show the confirmation text, then put the original label back after `after`.
    /// A second copy during the window restarts it.
    fn confirm(self: &Rc<Self>, page: &Page, text: &str, after: Duration) {
        if let Some(previous) = self.reset.take() {
            page.clear_timer(previous);
        }
        page.document_mut().set_text_content(self.node, text);
        let button = Rc::clone(self);
        let timer = page.set_timeout(after, move |host| {
            button.reset.set(None);
            host.document_mut().set_text_content(button.node, &button.label);
        });
        self.reset.set(Some(timer));
    }
}

/// Wire every copy button. Buttons do nothing when the page has no clipboard
/// or the write is rejected. Returns the number of buttons wired.
pub fn install(page: &Page, config: &ClipboardConfig, analytics: &Analytics) -> usize {
    let buttons: Vec<Rc<CopyButton>> = {
        let document = page.document();
        document
            .query_selector_all(&config.selector)
            .into_iter()
            .map(|node| {
                Rc::new(CopyButton {
                    node,
                    label: document.text_content(node),
                    reset: Cell::new(None),
                })
            })
            .collect()
    };
    for button in &buttons {
        let button = Rc::clone(button);
        let attribute = config.attribute.clone();
        let feedback_text = config.feedback_text.clone();
        let reset_after = config.reset_after();
        let analytics = analytics.clone();
        page.add_event_listener(EventTarget::Node(button.node), EventKind::Click, move |host, _| {
            let Some(clipboard) = host.capabilities().clipboard() else {
                return;
            };
            let Some(value) = host
                .document()
                .get_attribute(button.node, &attribute)
                .map(str::to_owned)
            else {
                return;
            };
            if let Err(err) = clipboard.write_text(&value) {
                trace!("Clipboard: write rejected: {err:#}");
                return;
            }
            button.confirm(host, &feedback_text, reset_after);
            analytics.track(host, &AnalyticsEvent::new("copy").with("text", value));
        });
    }
    debug!("Clipboard: {} copy buttons", buttons.len());
    buttons.len()
}
