//! Email form validation.

use crate::analytics::{Analytics, AnalyticsEvent};
use crate::config::FormsConfig;
use log::debug;
use page_host::{EventKind, EventTarget, Page};

/// Loose `local@domain.tld` check: exactly one `@`, no whitespace, a non-empty
/// local part and a dot strictly inside the domain.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .find('.')
        .is_some_and(|dot| dot > 0 && domain.rfind('.').is_some_and(|last| last + 1 < domain.len()))
}

/// Validate every form that has an email input on submit. Invalid input
/// blocks submission, prompts the user and focuses the field. Returns the
/// number of forms wired.
pub fn install(page: &Page, config: &FormsConfig, analytics: &Analytics) -> usize {
    let forms: Vec<_> = {
        let document = page.document();
        document
            .query_selector_all(&config.form_selector)
            .into_iter()
            .filter_map(|form| {
                let input = document.query_selector_within(form, &config.email_selector)?;
                Some((form, input))
            })
            .collect()
    };
    for (form, input) in &forms {
        let (form, input) = (*form, *input);
        let message = config.invalid_email_message.clone();
        let analytics = analytics.clone();
        page.add_event_listener(EventTarget::Node(form), EventKind::Submit, move |host, event| {
            let value = host
                .document()
                .get_attribute(input, "value")
                .unwrap_or_default()
                .trim()
                .to_owned();
            if !is_valid_email(&value) {
                event.prevent_default();
                host.alert(&message);
                host.focus(input);
                return;
            }
            let form_id = host.document().get_attribute(form, "id").map(str::to_owned);
            analytics.track(host, &AnalyticsEvent::new("form_submit").with("form_id", form_id));
        });
    }
    debug!("Forms: {} email forms", forms.len());
    forms.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DESKTOP_UA, body_element, element, page_with, recording_capabilities};
    use anyhow::Result;
    use page_host::{EventValue, NodeKey, RecordingTag};
    use std::rc::Rc;

    #[test]
    fn email_rules() {
        for valid in ["ana@example.com", "first.last+tag@mail.example.co", "a@b.io"] {
            assert!(is_valid_email(valid), "{valid} should pass");
        }
        for invalid in ["", "plain", "@example.com", "ana@", "ana@example", "ana@.com", "ana@example.", "a b@example.com", "a@b@example.com"] {
            assert!(!is_valid_email(invalid), "{invalid:?} should fail");
        }
    }

    fn signup(page: &Page, email: &str) -> Result<(NodeKey, NodeKey, NodeKey)> {
        let form = body_element(page, "form", &[("id", "waitlist")])?;
        let input = element(page, form, "input", &[("type", "email"), ("name", "email"), ("value", email)])?;
        let button = element(page, form, "button", &[("type", "submit")])?;
        Ok((form, input, button))
    }

    #[test]
    fn invalid_email_blocks_submission() -> Result<()> {
        let tag = Rc::new(RecordingTag::default());
        let page = page_with(DESKTOP_UA, recording_capabilities(&tag))?;
        let (_, input, button) = signup(&page, "not-an-email")?;
        assert_eq!(install(&page, &FormsConfig::default(), &Analytics::standard()), 1);
        page.click(button);
        assert!(page.window().form_submissions().is_empty());
        assert_eq!(page.window().alerts(), ["Please enter a valid email address."]);
        assert_eq!(page.document().active_element(), Some(input));
        assert!(tag.calls().is_empty());
        Ok(())
    }

    #[test]
    fn valid_email_submits_and_tracks() -> Result<()> {
        let tag = Rc::new(RecordingTag::default());
        let page = page_with(DESKTOP_UA, recording_capabilities(&tag))?;
        let (form, _, button) = signup(&page, " ana@example.com ")?;
        install(&page, &FormsConfig::default(), &Analytics::standard());
        page.click(button);
        assert_eq!(page.window().form_submissions(), [form]);
        assert!(page.window().alerts().is_empty());
        let calls = tag.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "form_submit");
        assert_eq!(calls[0].payload.get("form_id"), Some(&EventValue::from("waitlist")));
        Ok(())
    }
}
