use anyhow::Result;
use page_host::{Capabilities, Document, NodeKey, Page, RecordingTag, TagFunction, Window};
use std::rc::Rc;

pub const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/128.0";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fresh page at `https://example.com/` with the given capabilities.
pub fn page_with(user_agent: &str, capabilities: Capabilities) -> Result<Page> {
    init_logging();
    let window = Window::parse("https://example.com/", user_agent)?;
    Ok(Page::new(Document::new(), window, capabilities))
}

pub fn blank_page() -> Result<Page> {
    page_with(DESKTOP_UA, Capabilities::new())
}

/// Append an element under `parent`.
pub fn element(page: &Page, parent: NodeKey, tag: &str, attrs: &[(&str, &str)]) -> Result<NodeKey> {
    page.document_mut().append_element(parent, tag, attrs)
}

/// Append an element under `<body>`.
pub fn body_element(page: &Page, tag: &str, attrs: &[(&str, &str)]) -> Result<NodeKey> {
    let body = page.document().body();
    element(page, body, tag, attrs)
}

/// Capabilities whose tag function records into `tag`.
pub fn recording_capabilities(tag: &Rc<RecordingTag>) -> Capabilities {
    let shared: Rc<dyn TagFunction> = Rc::<RecordingTag>::clone(tag);
    Capabilities::new().with_tag_function(shared)
}
