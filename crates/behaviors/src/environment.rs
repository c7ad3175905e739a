//! In-app browser detection and chat deep-link rewriting.
//!
//! Embedded browsers of chat apps cannot open invite links to their own app in
//! a useful way. When the user agent carries the app's marker, invite links are
//! rewritten to the native deep link instead.

use crate::analytics::{Analytics, AnalyticsEvent};
use crate::config::EnvironmentConfig;
use log::{debug, info};
use page_host::{EventKind, EventTarget, Page};
use url::Url;

/// Facts about the browsing environment, derived once from the user agent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct EnvironmentDescriptor {
    pub in_app_browser: bool,
}

impl EnvironmentDescriptor {
    /// Case-insensitive search for `marker` in `user_agent`.
    pub fn detect(user_agent: &str, marker: &str) -> Self {
        let in_app_browser =
            !marker.is_empty() && user_agent.to_lowercase().contains(&marker.to_lowercase());
        Self { in_app_browser }
    }
}

/// Extract the chat identifier from an invite URL: the first path segment of a
/// link to one of `hosts`, made of ASCII letters, digits and underscores.
pub fn invite_identifier(href: &str, hosts: &[String]) -> Option<String> {
    let url = Url::parse(href).ok()?;
    let host = url.host_str()?;
    if !hosts.iter().any(|known| known.eq_ignore_ascii_case(host)) {
        return None;
    }
    let segment = url.path_segments()?.next()?;
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    valid.then(|| segment.to_owned())
}

/// Detect the in-app browser and rewrite invite links. Returns the descriptor
/// and the number of rewritten links.
pub fn install(page: &Page, config: &EnvironmentConfig, analytics: &Analytics) -> (EnvironmentDescriptor, usize) {
    let descriptor = {
        let window = page.window();
        EnvironmentDescriptor::detect(window.user_agent(), &config.user_agent_marker)
    };
    if !descriptor.in_app_browser {
        return (descriptor, 0);
    }

    let links: Vec<_> = {
        let document = page.document();
        document
            .query_selector_all(&config.link_selector)
            .into_iter()
            .filter_map(|link| {
                let href = document.get_attribute(link, "href")?;
                let identifier = invite_identifier(href, &config.invite_hosts)?;
                Some((link, format!("{}{identifier}", config.deep_link_prefix)))
            })
            .collect()
    };
    let rewritten = links.len();
    for (link, deep_link) in links {
        debug!("Environment: {deep_link}");
        page.add_event_listener(EventTarget::Node(link), EventKind::Click, move |host, event| {
            event.prevent_default();
            host.navigate(&deep_link);
        });
    }
    info!("Environment: in-app browser detected, {rewritten} links rewritten");
    analytics.track(
        page,
        &AnalyticsEvent::new("in_app_browser_detected").with("rewritten_links", rewritten as f64),
    );
    (descriptor, rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blank_page, body_element, page_with, recording_capabilities};
    use anyhow::Result;
    use page_host::{Capabilities, RecordingTag};
    use std::rc::Rc;

    const IN_APP_UA: &str =
        "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 Chrome/126.0 Mobile Safari/537.36 telegram-android/11.2";

    fn hosts() -> Vec<String> {
        EnvironmentConfig::default().invite_hosts
    }

    #[test]
    fn marker_match_ignores_case() {
        assert!(EnvironmentDescriptor::detect(IN_APP_UA, "Telegram").in_app_browser);
        assert!(!EnvironmentDescriptor::detect("Mozilla/5.0 Firefox/128.0", "Telegram").in_app_browser);
        assert!(!EnvironmentDescriptor::detect(IN_APP_UA, "").in_app_browser);
    }

    #[test]
    fn identifiers_come_from_the_first_segment() {
        let hosts = hosts();
        assert_eq!(invite_identifier("https://t.me/examplebot", &hosts).as_deref(), Some("examplebot"));
        assert_eq!(invite_identifier("https://T.ME/Example_Bot/12?start=x", &hosts).as_deref(), Some("Example_Bot"));
        assert_eq!(invite_identifier("https://telegram.me/news", &hosts).as_deref(), Some("news"));
        assert_eq!(invite_identifier("https://t.me/+AbCdEf", &hosts), None);
        assert_eq!(invite_identifier("https://notreallyt.me/bot", &hosts), None);
        assert_eq!(invite_identifier("https://t.me/", &hosts), None);
        assert_eq!(invite_identifier("/relative/t.me/bot", &hosts), None);
    }

    #[test]
    fn in_app_clicks_open_the_deep_link() -> Result<()> {
        let tag = Rc::new(RecordingTag::default());
        let page = page_with(IN_APP_UA, recording_capabilities(&tag))?;
        let link = body_element(&page, "a", &[("href", "https://t.me/examplebot"), ("class", "cta")])?;
        let other = body_element(&page, "a", &[("href", "https://example.org/t.me/bot")])?;
        let (descriptor, rewritten) = install(&page, &EnvironmentConfig::default(), &Analytics::standard());
        assert!(descriptor.in_app_browser);
        assert_eq!(rewritten, 1);

        let event = page.click(link);
        assert!(event.default_prevented());
        assert_eq!(page.window().navigations(), ["tg://resolve?domain=examplebot"]);

        page.click(other);
        assert_eq!(page.window().last_navigation(), Some("https://example.org/t.me/bot"));
        assert_eq!(tag.event_names(), ["in_app_browser_detected"]);
        Ok(())
    }

    #[test]
    fn long_invite_host_is_rewritten_too() -> Result<()> {
        let page = page_with(IN_APP_UA, Capabilities::new())?;
        let link = body_element(&page, "a", &[("href", "https://telegram.me/examplebot")])?;
        let (_, rewritten) = install(&page, &EnvironmentConfig::default(), &Analytics::disabled());
        assert_eq!(rewritten, 1);
        let event = page.click(link);
        assert!(event.default_prevented());
        assert_eq!(page.window().navigations(), ["tg://resolve?domain=examplebot"]);
        Ok(())
    }

    #[test]
    fn regular_browsers_keep_web_links() -> Result<()> {
        let page = blank_page()?;
        let link = body_element(&page, "a", &[("href", "https://t.me/examplebot")])?;
        let (descriptor, rewritten) = install(&page, &EnvironmentConfig::default(), &Analytics::disabled());
        assert!(!descriptor.in_app_browser);
        assert_eq!(rewritten, 0);
        page.click(link);
        assert_eq!(page.window().last_navigation(), Some("https://t.me/examplebot"));
        Ok(())
    }
}
