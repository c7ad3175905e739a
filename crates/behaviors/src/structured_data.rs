//! JSON-LD breadcrumb metadata.

use anyhow::{Context as _, Result};
use log::debug;
use page_host::{NodeKey, Page};
use serde_json::{Value, json};

pub const LD_JSON_TYPE: &str = "application/ld+json";

/// A `BreadcrumbList` whose only entry is the site root.
pub fn breadcrumb_json(origin: &str) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": [{
            "@type": "ListItem",
            "position": 1,
            "name": "Home",
            "item": origin,
        }],
    })
}

/// Append the breadcrumb script to `<head>` and return it.
///
/// # Errors
/// Returns an error when the script cannot be serialized or attached.
pub fn inject_breadcrumbs(page: &Page) -> Result<NodeKey> {
    let origin = page.window().origin();
    let body = serde_json::to_string(&breadcrumb_json(&origin)).context("serialize breadcrumbs")?;
    let mut document = page.document_mut();
    let head = document.head();
    let script = document
        .append_element(head, "script", &[("type", LD_JSON_TYPE)])
        .context("attach breadcrumb script")?;
    document.set_text_content(script, &body);
    debug!("StructuredData: breadcrumb for {origin}");
    Ok(script)
}
