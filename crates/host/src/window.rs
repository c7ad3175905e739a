//! Window-level state: location, user agent, scroll position and the
//! side effects a page can cause (navigations, alerts, scroll requests).

use crate::console::Console;
use crate::dom::NodeKey;
use anyhow::{Context as _, Result};
use url::{Host, Url};

/// Default viewport height for a headless page, in CSS pixels.
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;
/// Default scrollable document height, in CSS pixels.
pub const DEFAULT_DOCUMENT_HEIGHT: f64 = 4000.0;

/// `ScrollToOptions.behavior`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
}

/// A script-initiated `window.scrollTo` call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollRequest {
    pub top: f64,
    pub behavior: ScrollBehavior,
}

impl ScrollRequest {
    pub const fn smooth(top: f64) -> Self {
        Self {
            top,
            behavior: ScrollBehavior::Smooth,
        }
    }
}

#[derive(Debug)]
pub struct Window {
    location: Url,
    user_agent: String,
    scroll_y: f64,
    viewport_height: f64,
    document_height: f64,
    navigations: Vec<String>,
    alerts: Vec<String>,
    scroll_requests: Vec<ScrollRequest>,
    form_submissions: Vec<NodeKey>,
    console: Console,
}

impl Window {
    pub fn new(location: Url, user_agent: &str) -> Self {
        Self {
            location,
            user_agent: user_agent.to_owned(),
            scroll_y: 0.0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            document_height: DEFAULT_DOCUMENT_HEIGHT,
            navigations: Vec::new(),
            alerts: Vec::new(),
            scroll_requests: Vec::new(),
            form_submissions: Vec::new(),
            console: Console::default(),
        }
    }

    /// Build a window from a location string.
    ///
    /// # Errors
    /// Returns an error when `location` is not an absolute URL.
    pub fn parse(location: &str, user_agent: &str) -> Result<Self> {
        let url = Url::parse(location).with_context(|| format!("invalid page location {location:?}"))?;
        Ok(Self::new(url, user_agent))
    }

    pub const fn location(&self) -> &Url {
        &self.location
    }

    pub fn href(&self) -> &str {
        self.location.as_str()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.location.host_str()
    }

    /// `location.origin`, e.g. `https://example.com`.
    pub fn origin(&self) -> String {
        self.location.origin().ascii_serialization()
    }

    /// True when the page is served from a loopback host (`localhost`, `127.0.0.1`, `::1`).
    pub fn is_loopback(&self) -> bool {
        match self.location.host() {
            Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(Host::Ipv4(addr)) => addr.is_loopback(),
            Some(Host::Ipv6(addr)) => addr.is_loopback(),
            None => false,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub const fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Largest reachable scroll offset.
    pub fn max_scroll_y(&self) -> f64 {
        (self.document_height - self.viewport_height).max(0.0)
    }

    /// Move the viewport, clamped to the scrollable range. Returns whether the offset changed.
    pub fn set_scroll_y(&mut self, top: f64) -> bool {
        let clamped = if top.is_finite() {
            top.clamp(0.0, self.max_scroll_y())
        } else {
            0.0
        };
        let changed = (clamped - self.scroll_y).abs() > f64::EPSILON;
        self.scroll_y = clamped;
        changed
    }

    pub const fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height.max(0.0);
    }

    pub const fn document_height(&self) -> f64 {
        self.document_height
    }

    pub fn set_document_height(&mut self, height: f64) {
        self.document_height = height.max(0.0);
    }

    /// Resolve `href` against the current location and record the navigation.
    pub fn record_navigation(&mut self, href: &str) -> String {
        let resolved = self
            .location
            .join(href)
            .map_or_else(|_| href.to_owned(), String::from);
        self.navigations.push(resolved.clone());
        resolved
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    pub fn last_navigation(&self) -> Option<&str> {
        self.navigations.last().map(String::as_str)
    }

    pub fn record_alert(&mut self, message: &str) {
        self.alerts.push(message.to_owned());
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn record_scroll_request(&mut self, request: ScrollRequest) {
        self.scroll_requests.push(request);
    }

    pub fn scroll_requests(&self) -> &[ScrollRequest] {
        &self.scroll_requests
    }

    pub fn record_form_submission(&mut self, form: NodeKey) {
        self.form_submissions.push(form);
    }

    pub fn form_submissions(&self) -> &[NodeKey] {
        &self.form_submissions
    }

    pub const fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }
}
