//! Viewport reveal engine.
//!
//! Elements matching the reveal selector get the reveal class the first time
//! they become sufficiently visible. Elements carrying a `data-count` target also
//! start a counter, and the attribute is stripped so the counter can never run
//! twice. Each element is unobserved right after its first trigger.

use crate::config::{CounterConfig, RevealConfig};
use crate::counter::{CounterStyle, CounterTask, animate_with};
use anyhow::{Context as _, Result};
use core::cell::RefCell;
use core::time::Duration;
use log::{debug, info};
use page_host::{NodeKey, ObserverId, ObserverOptions, Page, RootMargin};
use std::rc::Rc;

/// What happens to an element when it is revealed.
#[derive(Clone, Debug)]
pub struct RevealSettings {
    pub class: String,
    pub count_attribute: String,
    pub counter_duration: Duration,
    pub counter_style: CounterStyle,
}

impl RevealSettings {
    pub fn new(reveal: &RevealConfig, counter: &CounterConfig) -> Self {
        Self {
            class: reveal.class.clone(),
            count_attribute: reveal.count_attribute.clone(),
            counter_duration: reveal.counter_duration(),
            counter_style: CounterStyle::from(counter),
        }
    }
}

/// Reveal one element: add the class and start its counter, if it declares one.
pub fn reveal_element(page: &Page, node: NodeKey, settings: &RevealSettings) -> Option<CounterTask> {
    page.document_mut().add_class(node, &settings.class);
    let declared = page
        .document_mut()
        .remove_attribute(node, &settings.count_attribute)?;
    let Ok(target) = declared.trim().parse::<f64>() else {
        debug!("Reveal: ignoring non-numeric count {declared:?}");
        return None;
    };
    animate_with(
        page,
        node,
        0.0,
        target,
        settings.counter_duration,
        &settings.counter_style,
    )
}

/// Installed reveal behavior.
pub struct RevealEngine {
    observer: Option<ObserverId>,
    targets: Vec<NodeKey>,
    counters: Rc<RefCell<Vec<CounterTask>>>,
}

impl RevealEngine {
    /// Observe every reveal target, or reveal them all at once when the page
    /// cannot observe intersections. Returns `None` when there is nothing to reveal.
    ///
    /// # Errors
    /// Returns an error when the configured root margin cannot be parsed.
    pub fn install(page: &Page, reveal: &RevealConfig, counter: &CounterConfig) -> Result<Option<Self>> {
        let targets = page.query_selector_all(&reveal.selector);
        if targets.is_empty() {
            debug!("Reveal: no elements match {:?}", reveal.selector);
            return Ok(None);
        }
        let options = ObserverOptions {
            threshold: reveal.threshold,
            root_margin: RootMargin::parse(&reveal.root_margin).context("reveal root margin")?,
        };
        let settings = Rc::new(RevealSettings::new(reveal, counter));
        let counters = Rc::new(RefCell::new(Vec::new()));

        let observer = {
            let settings = Rc::clone(&settings);
            let counters = Rc::clone(&counters);
            page.create_intersection_observer(options, move |host, entries, observer| {
                for entry in entries.iter().filter(|entry| entry.is_intersecting) {
                    host.unobserve(observer, entry.target);
                    if let Some(task) = reveal_element(host, entry.target, &settings) {
                        counters.borrow_mut().push(task);
                    }
                }
            })
        };

        if let Some(id) = observer {
            for node in &targets {
                page.observe(id, *node);
            }
            debug!("Reveal: observing {} elements", targets.len());
        } else {
            info!("Reveal: intersection observer unavailable, revealing {} elements", targets.len());
            for node in &targets {
                if let Some(task) = reveal_element(page, *node, &settings) {
                    counters.borrow_mut().push(task);
                }
            }
        }
        Ok(Some(Self {
            observer,
            targets,
            counters,
        }))
    }

    pub const fn observer(&self) -> Option<ObserverId> {
        self.observer
    }

    pub fn targets(&self) -> &[NodeKey] {
        &self.targets
    }

    /// Elements still waiting for their first reveal.
    pub fn pending(&self, page: &Page) -> usize {
        self.observer.map_or(0, |id| page.observed_count(id))
    }

    /// Counters started so far, in start order.
    pub fn counters(&self) -> Vec<CounterTask> {
        self.counters.borrow().clone()
    }
}
