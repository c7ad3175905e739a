//! Deferred image loading.

use crate::config::LazyLoadConfig;
use anyhow::{Context as _, Result};
use log::{debug, info};
use page_host::{NodeKey, ObserverId, ObserverOptions, Page, RootMargin};
use std::rc::Rc;

#[derive(Clone, Debug)]
struct Promotion {
    source_attribute: String,
    loaded_class: String,
}

impl Promotion {
    /// Move the deferred source into `src`. Returns false when there was nothing to promote.
    fn apply(&self, page: &Page, image: NodeKey) -> bool {
        let mut document = page.document_mut();
        let Some(source) = document.remove_attribute(image, &self.source_attribute) else {
            return false;
        };
        document.set_attribute(image, "src", &source);
        document.add_class(image, &self.loaded_class);
        true
    }
}

/// Installed lazy loader.
pub struct LazyLoader {
    observer: Option<ObserverId>,
    images: Vec<NodeKey>,
}

impl LazyLoader {
    /// Observe deferred images, promoting each on its first intersection, or
    /// promote all of them immediately when intersection observation is unavailable.
    ///
    /// # Errors
    /// Returns an error when the configured root margin cannot be parsed.
    pub fn install(page: &Page, config: &LazyLoadConfig) -> Result<Option<Self>> {
        let images = page.query_selector_all(&config.selector);
        if images.is_empty() {
            debug!("LazyLoad: no deferred images");
            return Ok(None);
        }
        let options = ObserverOptions {
            threshold: 0.0,
            root_margin: RootMargin::parse(&config.root_margin).context("lazy-load root margin")?,
        };
        let promotion = Rc::new(Promotion {
            source_attribute: config.source_attribute.clone(),
            loaded_class: config.loaded_class.clone(),
        });

        let on_visible = Rc::clone(&promotion);
        let observer = page.create_intersection_observer(options, move |host, entries, observer| {
            for entry in entries.iter().filter(|entry| entry.is_intersecting) {
                host.unobserve(observer, entry.target);
                on_visible.apply(host, entry.target);
            }
        });

        if let Some(id) = observer {
            for image in &images {
                page.observe(id, *image);
            }
        } else {
            let mut promoted = 0;
            for image in &images {
                if promotion.apply(page, *image) {
                    promoted += 1;
                }
            }
            info!("LazyLoad: intersection observer unavailable, promoted {promoted} images");
        }
        Ok(Some(Self { observer, images }))
    }

    pub const fn observer(&self) -> Option<ObserverId> {
        self.observer
    }

    pub fn images(&self) -> &[NodeKey] {
        &self.images
    }

    /// Images still waiting to load.
    pub fn pending(&self, page: &Page) -> usize {
        self.observer.map_or(0, |id| page.observed_count(id))
    }
}
