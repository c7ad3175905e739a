//! Page lifecycle: initialize every behavior once the document is parsed.

use crate::accordion::Accordion;
use crate::analytics::{Analytics, AnalyticsEvent};
use crate::config::BehaviorConfig;
use crate::environment::{self, EnvironmentDescriptor};
use crate::lazy_load::LazyLoader;
use crate::navigation::{self, MenuController};
use crate::pulse::{self, PulseTask};
use crate::reveal::RevealEngine;
use crate::scroll_chrome::ScrollChrome;
use crate::structured_data;
use crate::tracking::{self, ScrollDepthTracker};
use crate::{clipboard, forms};
use anyhow::Result;
use core::cell::{Cell, RefCell};
use log::{info, warn};
use page_host::{EventKind, EventTarget, NodeKey, Page, ReadyState};
use std::rc::Rc;
use tracing::info_span;

/// Handles to everything the orchestrator installed.
#[derive(Default)]
pub struct Components {
    pub breadcrumbs: Option<NodeKey>,
    pub environment: EnvironmentDescriptor,
    pub rewritten_links: usize,
    pub menu: Option<Rc<MenuController>>,
    pub anchors: usize,
    pub scroll_chrome: Option<ScrollChrome>,
    pub reveal: Option<RevealEngine>,
    pub accordion: Option<Rc<Accordion>>,
    pub lazy_load: Option<LazyLoader>,
    pub forms: usize,
    pub copy_buttons: usize,
    pub tracked_clicks: usize,
    pub scroll_depth: Option<Rc<RefCell<ScrollDepthTracker>>>,
    pub pulse: Option<PulseTask>,
}

/// Owns the configuration and, once initialized, the installed components.
pub struct PageController {
    config: BehaviorConfig,
    analytics: Analytics,
    initialized: Cell<bool>,
    components: RefCell<Option<Components>>,
}

/// Boot with the standard analytics sinks.
pub fn boot(page: &Page, config: BehaviorConfig) -> Rc<PageController> {
    boot_with(page, config, Analytics::standard())
}

/// Boot using the configuration embedded in the document, falling back to
/// defaults when it is malformed.
pub fn boot_from_document(page: &Page) -> Rc<PageController> {
    let loaded = BehaviorConfig::from_document(&page.document());
    let config = loaded.unwrap_or_else(|err| {
        warn!("Page: {err:#}, using defaults");
        BehaviorConfig::default()
    });
    boot(page, config)
}

/// Initialize now, or on `DOMContentLoaded` when the document is still loading.
pub fn boot_with(page: &Page, config: BehaviorConfig, analytics: Analytics) -> Rc<PageController> {
    let controller = Rc::new(PageController {
        config,
        analytics,
        initialized: Cell::new(false),
        components: RefCell::new(None),
    });
    if page.ready_state() == ReadyState::Loading {
        let deferred = Rc::clone(&controller);
        page.add_event_listener_once(EventTarget::Document, EventKind::DomContentLoaded, move |host, _| {
            deferred.initialize(host);
        });
    } else {
        controller.initialize(page);
    }
    controller
}

impl PageController {
    pub const fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Run `inspect` against the installed components, if initialized.
    pub fn with_components<R>(&self, inspect: impl FnOnce(&Components) -> R) -> Option<R> {
        self.components.borrow().as_ref().map(inspect)
    }

    /// Install every behavior in order. Runs at most once; later calls return false.
    pub fn initialize(&self, page: &Page) -> bool {
        if self.initialized.replace(true) {
            return false;
        }
        let _span = info_span!("page.init").entered();
        let config = &self.config;
        let analytics = &self.analytics;

        let breadcrumbs = attempt("structured data", structured_data::inject_breadcrumbs(page));
        let (environment, rewritten_links) = environment::install(page, &config.environment, analytics);
        let menu = MenuController::install(page, &config.navigation);
        let anchors = navigation::install_smooth_anchors(page, &config.navigation);
        let scroll_chrome = ScrollChrome::install(page, &config.scroll, analytics);
        let reveal = attempt("reveal", RevealEngine::install(page, &config.reveal, &config.counter)).flatten();
        let accordion = Accordion::install(page, &config.accordion, analytics);
        let lazy_load = attempt("lazy load", LazyLoader::install(page, &config.lazy_load)).flatten();
        let forms = forms::install(page, &config.forms, analytics);
        let copy_buttons = clipboard::install(page, &config.clipboard, analytics);
        let tracked_clicks = tracking::install_click_tracking(page, &config.tracking, analytics);
        let scroll_depth = tracking::install_scroll_depth(page, &config.tracking, analytics);
        let pulse = pulse::start(page, &config.pulse);

        *self.components.borrow_mut() = Some(Components {
            breadcrumbs,
            environment,
            rewritten_links,
            menu,
            anchors,
            scroll_chrome: Some(scroll_chrome),
            reveal,
            accordion,
            lazy_load,
            forms,
            copy_buttons,
            tracked_clicks,
            scroll_depth: Some(scroll_depth),
            pulse,
        });

        let page_view = {
            let location = page.window().href().to_owned();
            let title = page.document().title();
            AnalyticsEvent::new("page_view")
                .with("page_location", location)
                .with("page_title", title)
        };
        analytics.track(page, &page_view);
        info!("Page: behaviors initialized");
        true
    }
}

/// Log a failed component and carry on with the rest.
fn attempt<T>(component: &str, result: Result<T>) -> Option<T> {
    result
        .map_err(|err| warn!("Page: {component} failed: {err:#}"))
        .ok()
}
