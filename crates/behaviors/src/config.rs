//! Configuration for the page behaviors.
//!
//! Every selector, class name, threshold and delay a behavior uses lives here.
//! Defaults match the stock landing page markup; a page can override any subset
//! by embedding a JSON object in `<script type="application/json" id="page-config">`.
//! Durations are stored in milliseconds and exposed as [`Duration`]s.

use anyhow::{Context as _, Result};
use core::time::Duration;
use log::debug;
use page_host::Document;
use serde::{Deserialize, Serialize};

/// Id of the optional embedded configuration script.
pub const CONFIG_SCRIPT_ID: &str = "page-config";

/// Root configuration object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub reveal: RevealConfig,
    pub counter: CounterConfig,
    pub scroll: ScrollChromeConfig,
    pub accordion: AccordionConfig,
    pub navigation: NavigationConfig,
    pub environment: EnvironmentConfig,
    pub lazy_load: LazyLoadConfig,
    pub forms: FormsConfig,
    pub clipboard: ClipboardConfig,
    pub tracking: TrackingConfig,
    pub pulse: PulseConfig,
}

impl BehaviorConfig {
    /// Parse a (possibly partial) JSON configuration; missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error when `json` is not valid JSON or a field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid behavior configuration")
    }

    /// Read the embedded `#page-config` JSON script, falling back to defaults when absent.
    ///
    /// # Errors
    /// Returns an error when the script exists but does not hold a valid configuration.
    pub fn from_document(document: &Document) -> Result<Self> {
        let Some(script) = document.get_element_by_id(CONFIG_SCRIPT_ID) else {
            return Ok(Self::default());
        };
        let is_json = document.tag_of(script) == Some("script")
            && document
                .get_attribute(script, "type")
                .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("application/json"));
        if !is_json {
            debug!("Config: #{CONFIG_SCRIPT_ID} is not a JSON script, using defaults");
            return Ok(Self::default());
        }
        Self::from_json(&document.text_content(script))
            .with_context(|| format!("reading #{CONFIG_SCRIPT_ID}"))
    }
}

/// Viewport reveal animations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Elements to observe.
    pub selector: String,
    /// Class added when an element is revealed.
    pub class: String,
    /// Fraction of the element that must be visible.
    pub threshold: f64,
    /// CSS `rootMargin` shorthand, pixels only.
    pub root_margin: String,
    /// Attribute holding a counter target.
    pub count_attribute: String,
    /// How long a revealed counter takes to reach its target.
    pub counter_duration_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: ".reveal, [data-count]".to_owned(),
            class: "visible".to_owned(),
            threshold: 0.1,
            root_margin: "0px 0px -50px 0px".to_owned(),
            count_attribute: "data-count".to_owned(),
            counter_duration_ms: 2000,
        }
    }
}

impl RevealConfig {
    pub const fn counter_duration(&self) -> Duration {
        Duration::from_millis(self.counter_duration_ms)
    }
}

/// Numeric counter animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub tick_ms: u64,
    /// Thousands separator used when displaying values.
    pub separator: String,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            separator: ",".to_owned(),
        }
    }
}

impl CounterConfig {
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Navbar restyling and the back-to-top control.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollChromeConfig {
    pub navbar_selector: String,
    pub navbar_class: String,
    /// Scroll offset above which the navbar is restyled.
    pub navbar_threshold: f64,
    pub navbar_debounce_ms: u64,
    pub back_to_top_selector: String,
    pub back_to_top_class: String,
    /// Scroll offset above which the back-to-top control is shown.
    pub back_to_top_threshold: f64,
    pub back_to_top_debounce_ms: u64,
}

impl Default for ScrollChromeConfig {
    fn default() -> Self {
        Self {
            navbar_selector: ".navbar".to_owned(),
            navbar_class: "scrolled".to_owned(),
            navbar_threshold: 50.0,
            navbar_debounce_ms: 50,
            back_to_top_selector: "#back-to-top".to_owned(),
            back_to_top_class: "visible".to_owned(),
            back_to_top_threshold: 300.0,
            back_to_top_debounce_ms: 100,
        }
    }
}

impl ScrollChromeConfig {
    pub const fn navbar_debounce(&self) -> Duration {
        Duration::from_millis(self.navbar_debounce_ms)
    }

    pub const fn back_to_top_debounce(&self) -> Duration {
        Duration::from_millis(self.back_to_top_debounce_ms)
    }
}

/// FAQ accordion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccordionConfig {
    pub item_selector: String,
    pub toggle_selector: String,
    pub open_class: String,
}

impl Default for AccordionConfig {
    fn default() -> Self {
        Self {
            item_selector: ".faq-item".to_owned(),
            toggle_selector: ".faq-question".to_owned(),
            open_class: "active".to_owned(),
        }
    }
}

/// Mobile menu and in-page anchors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub toggle_selector: String,
    pub panel_selector: String,
    pub open_class: String,
    pub anchor_selector: String,
    /// Height of the fixed navbar, subtracted from anchor scroll targets.
    pub anchor_offset: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            toggle_selector: ".menu-toggle".to_owned(),
            panel_selector: ".nav-links".to_owned(),
            open_class: "active".to_owned(),
            anchor_selector: "a[href^=\"#\"]".to_owned(),
            anchor_offset: 80.0,
        }
    }
}

/// In-app browser detection and deep-link rewriting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Case-insensitive user agent marker of the embedding app.
    pub user_agent_marker: String,
    pub link_selector: String,
    /// Hosts whose first path segment is a chat identifier.
    pub invite_hosts: Vec<String>,
    /// Deep link prefix; the identifier is appended.
    pub deep_link_prefix: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            user_agent_marker: "Telegram".to_owned(),
            link_selector: "a[href*=\"t.me/\"], a[href*=\"telegram.me/\"]".to_owned(),
            invite_hosts: vec!["t.me".to_owned(), "telegram.me".to_owned()],
            deep_link_prefix: "tg://resolve?domain=".to_owned(),
        }
    }
}

/// Deferred image loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyLoadConfig {
    pub selector: String,
    pub source_attribute: String,
    pub root_margin: String,
    pub loaded_class: String,
}

impl Default for LazyLoadConfig {
    fn default() -> Self {
        Self {
            selector: "img[data-src]".to_owned(),
            source_attribute: "data-src".to_owned(),
            root_margin: "0px 0px 200px 0px".to_owned(),
            loaded_class: "loaded".to_owned(),
        }
    }
}

/// Email form validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    pub form_selector: String,
    pub email_selector: String,
    pub invalid_email_message: String,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            form_selector: "form".to_owned(),
            email_selector: "input[type=\"email\"]".to_owned(),
            invalid_email_message: "Please enter a valid email address.".to_owned(),
        }
    }
}

/// Copy-to-clipboard buttons.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    pub selector: String,
    pub attribute: String,
    pub feedback_text: String,
    pub reset_ms: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            selector: "[data-copy]".to_owned(),
            attribute: "data-copy".to_owned(),
            feedback_text: "Copied!".to_owned(),
            reset_ms: 2000,
        }
    }
}

impl ClipboardConfig {
    pub const fn reset_after(&self) -> Duration {
        Duration::from_millis(self.reset_ms)
    }
}

/// Declarative click tracking and scroll depth milestones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub click_selector: String,
    pub click_attribute: String,
    pub scroll_debounce_ms: u64,
    /// Percentages reported once each, ascending.
    pub depth_marks: Vec<u32>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            click_selector: "[data-track]".to_owned(),
            click_attribute: "data-track".to_owned(),
            scroll_debounce_ms: 100,
            depth_marks: vec![25, 50, 75, 100],
        }
    }
}

impl TrackingConfig {
    pub const fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }
}

/// Attention pulse on call-to-action elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub selector: String,
    pub class: String,
    pub period_ms: u64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            selector: "[data-pulse]".to_owned(),
            class: "pulse".to_owned(),
            period_ms: 3000,
        }
    }
}

impl PulseConfig {
    pub const fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() -> Result<()> {
        let config = BehaviorConfig::from_json(
            r#"{"scroll": {"navbar_threshold": 120}, "pulse": {"period_ms": 500}}"#,
        )?;
        assert!((config.scroll.navbar_threshold - 120.0).abs() < f64::EPSILON);
        assert_eq!(config.scroll.back_to_top_debounce(), Duration::from_millis(100));
        assert_eq!(config.pulse.period(), Duration::from_millis(500));
        assert_eq!(config.reveal, RevealConfig::default());
        Ok(())
    }

    #[test]
    fn malformed_json_is_an_error() {
        let message = BehaviorConfig::from_json(r#"{"reveal": {"threshold": "high"}}"#)
            .err()
            .map(|err| format!("{err:#}"));
        assert!(
            message.is_some_and(|text| text.contains("invalid behavior configuration")),
            "a string threshold must be rejected"
        );
    }

    #[test]
    fn embedded_script_overrides_defaults() -> Result<()> {
        let mut doc = Document::new();
        let head = doc.head();
        let script = doc.append_element(
            head,
            "script",
            &[("type", "application/json"), ("id", CONFIG_SCRIPT_ID)],
        )?;
        doc.set_text_content(script, r#"{"clipboard": {"feedback_text": "Done"}}"#);
        let config = BehaviorConfig::from_document(&doc)?;
        assert_eq!(config.clipboard.feedback_text, "Done");
        assert_eq!(config.clipboard.reset_after(), Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn missing_script_means_defaults() -> Result<()> {
        assert_eq!(BehaviorConfig::from_document(&Document::new())?, BehaviorConfig::default());
        Ok(())
    }
}
