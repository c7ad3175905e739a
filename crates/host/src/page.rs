//! The `Page` handle: one loaded document plus the browser machinery around it.
//!
//! `Page` is a cheap clone over shared single-threaded state. Every host borrow is
//! released before a page callback (listener, timer, observer) runs, so callbacks
//! are free to call back into the page.

use crate::capabilities::Capabilities;
use crate::dom::{Document, NodeKey, ReadyState};
use crate::events::{Event, EventKind, EventRegistry, EventTarget, ListenerId};
use crate::observer::{IntersectionEntry, ObserverId, ObserverOptions, ObserverRegistry, Viewport};
use crate::timers::{TimerId, TimerQueue, TimerTask};
use crate::values::LogLevel;
use crate::window::{ScrollRequest, Window};
use core::cell::{Ref, RefCell, RefMut};
use core::ops::ControlFlow;
use core::time::Duration;
use log::{debug, info, trace, warn};
use std::rc::Rc;

struct PageState {
    document: RefCell<Document>,
    window: RefCell<Window>,
    listeners: RefCell<EventRegistry>,
    timers: RefCell<TimerQueue>,
    observers: RefCell<ObserverRegistry>,
    capabilities: Capabilities,
}

/// Shared handle to a page view.
#[derive(Clone)]
pub struct Page {
    state: Rc<PageState>,
}

impl Page {
    pub fn new(document: Document, window: Window, capabilities: Capabilities) -> Self {
        Self {
            state: Rc::new(PageState {
                document: RefCell::new(document),
                window: RefCell::new(window),
                listeners: RefCell::default(),
                timers: RefCell::default(),
                observers: RefCell::default(),
                capabilities,
            }),
        }
    }

    /// Borrow the document. Do not hold the guard across calls that dispatch events.
    pub fn document(&self) -> Ref<'_, Document> {
        self.state.document.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.state.document.borrow_mut()
    }

    pub fn window(&self) -> Ref<'_, Window> {
        self.state.window.borrow()
    }

    pub fn window_mut(&self) -> RefMut<'_, Window> {
        self.state.window.borrow_mut()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.state.capabilities
    }

    pub fn query_selector(&self, selector: &str) -> Option<NodeKey> {
        self.document().query_selector(selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeKey> {
        self.document().query_selector_all(selector)
    }

    // Events

    pub fn add_event_listener<F>(&self, target: EventTarget, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&Self, &mut Event) + 'static,
    {
        self.state
            .listeners
            .borrow_mut()
            .add(target, kind, false, Rc::new(callback))
    }

    /// Register a listener that is removed after its first invocation.
    pub fn add_event_listener_once<F>(
        &self,
        target: EventTarget,
        kind: EventKind,
        callback: F,
    ) -> ListenerId
    where
        F: Fn(&Self, &mut Event) + 'static,
    {
        self.state
            .listeners
            .borrow_mut()
            .add(target, kind, true, Rc::new(callback))
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.state.listeners.borrow_mut().remove(id)
    }

    /// Number of listeners on (target, kind).
    pub fn listener_count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.state.listeners.borrow().count_for(target, kind)
    }

    /// Dispatch an event along its bubbling path: the target element, its element
    /// ancestors, the document, then the window. Returns the event after dispatch.
    pub fn dispatch_event(&self, target: EventTarget, kind: EventKind) -> Event {
        let path = self.propagation_path(target);
        let mut event = Event::new(kind, target);
        trace!("dispatch {} through {} targets", kind.name(), path.len());
        for current in path {
            if event.propagation_stopped() {
                break;
            }
            event.set_current_target(current);
            let callbacks = self.state.listeners.borrow_mut().take_for(current, kind);
            for callback in callbacks {
                callback(self, &mut event);
            }
        }
        event
    }

    fn propagation_path(&self, target: EventTarget) -> Vec<EventTarget> {
        let mut path = Vec::new();
        if let EventTarget::Node(node) = target {
            let document = self.document();
            if !document.is_element(node) {
                path.push(target);
            }
            path.extend(document.element_path(node).into_iter().map(EventTarget::Node));
        }
        if target != EventTarget::Window {
            path.push(EventTarget::Document);
        }
        path.push(EventTarget::Window);
        path
    }

    /// Simulate a user click on `node`, then run the default action unless a
    /// listener prevented it: links navigate (or jump to their fragment) and
    /// submit buttons submit their form.
    pub fn click(&self, node: NodeKey) -> Event {
        let event = self.dispatch_event(EventTarget::Node(node), EventKind::Click);
        if !event.default_prevented() {
            self.run_click_default(node);
        }
        event
    }

    fn run_click_default(&self, node: NodeKey) {
        let (link, submit_form) = {
            let document = self.document();
            let link = document
                .closest(node, "a[href]")
                .and_then(|anchor| document.get_attribute(anchor, "href"))
                .map(str::to_owned);
            let submit_form = document
                .closest(node, "button, input[type=\"submit\"]")
                .filter(|control| {
                    document
                        .get_attribute(*control, "type")
                        .is_none_or(|kind| kind.eq_ignore_ascii_case("submit"))
                })
                .and_then(|control| document.closest(control, "form"));
            (link, submit_form)
        };
        if let Some(href) = link {
            if let Some(fragment) = href.strip_prefix('#') {
                self.jump_to_fragment(fragment);
            } else {
                self.navigate(&href);
            }
        } else if let Some(form) = submit_form {
            self.submit(form);
        }
    }

    /// An empty fragment jumps to the top of the page.
    fn jump_to_fragment(&self, fragment: &str) {
        if fragment.is_empty() {
            self.scroll_to(0.0);
            return;
        }
        let top = {
            let document = self.document();
            document
                .get_element_by_id(fragment)
                .and_then(|target| document.layout(target))
                .map(|rect| rect.top)
        };
        if let Some(top) = top {
            self.scroll_to(top);
        }
    }

    /// Submit `form`: dispatch `submit` and record the submission unless prevented.
    pub fn submit(&self, form: NodeKey) -> Event {
        let event = self.dispatch_event(EventTarget::Node(form), EventKind::Submit);
        if event.default_prevented() {
            debug!("form submission prevented");
        } else {
            self.window_mut().record_form_submission(form);
        }
        event
    }

    /// Navigate the top-level browsing context. Returns the resolved URL.
    pub fn navigate(&self, href: &str) -> String {
        let resolved = self.window_mut().record_navigation(href);
        info!("navigate to {resolved}");
        resolved
    }

    // Scrolling and viewport

    /// Move the viewport as a user scroll would. Dispatches `scroll` and renders a
    /// frame when the offset actually changed.
    pub fn scroll_to(&self, top: f64) -> bool {
        let changed = self.window_mut().set_scroll_y(top);
        if changed {
            self.dispatch_event(EventTarget::Window, EventKind::Scroll);
            self.render_frame();
        }
        changed
    }

    /// Script-initiated `window.scrollTo`. Smooth scrolling completes immediately.
    pub fn scroll_window(&self, request: ScrollRequest) -> bool {
        self.window_mut().record_scroll_request(request);
        self.scroll_to(request.top)
    }

    /// Change the viewport height and dispatch `resize`.
    pub fn resize(&self, viewport_height: f64) {
        self.window_mut().set_viewport_height(viewport_height);
        self.dispatch_event(EventTarget::Window, EventKind::Resize);
        self.render_frame();
    }

    // Timers

    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce(&Self) + 'static,
    {
        self.state
            .timers
            .borrow_mut()
            .schedule_once(delay, Box::new(callback))
    }

    /// Run `callback` every `period` until it returns `ControlFlow::Break` or the
    /// timer is cleared.
    pub fn set_interval<F>(&self, period: Duration, callback: F) -> TimerId
    where
        F: Fn(&Self) -> ControlFlow<()> + 'static,
    {
        self.state
            .timers
            .borrow_mut()
            .schedule_repeat(period, Rc::new(callback))
    }

    pub fn clear_timer(&self, id: TimerId) -> bool {
        self.state.timers.borrow_mut().cancel(id)
    }

    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.state.timers.borrow().is_active(id)
    }

    pub fn pending_timers(&self) -> usize {
        self.state.timers.borrow().pending()
    }

    /// Virtual time since the page was created.
    pub fn now(&self) -> Duration {
        self.state.timers.borrow().now()
    }

    /// Advance virtual time by `by`, firing every timer that comes due in order,
    /// then render a frame.
    pub fn advance(&self, by: Duration) {
        let limit = self.now().saturating_add(by);
        loop {
            let next = self.state.timers.borrow_mut().pop_due(limit);
            let Some(due) = next else {
                break;
            };
            match due.task {
                TimerTask::Once(callback) => callback(self),
                TimerTask::Repeat { period, callback } => {
                    let next_due = due.due.saturating_add(period);
                    self.state.timers.borrow_mut().reschedule(
                        due.id,
                        next_due,
                        period,
                        Rc::clone(&callback),
                    );
                    if callback(self).is_break() {
                        self.clear_timer(due.id);
                    }
                }
            }
        }
        self.state.timers.borrow_mut().set_now(limit);
        self.render_frame();
    }

    // Intersection observation

    /// Create an intersection observer, or `None` when the page has no support for it.
    pub fn create_intersection_observer<F>(
        &self,
        options: ObserverOptions,
        callback: F,
    ) -> Option<ObserverId>
    where
        F: Fn(&Self, &[IntersectionEntry], ObserverId) + 'static,
    {
        if !self.state.capabilities.intersection_observer() {
            return None;
        }
        Some(self.state.observers.borrow_mut().create(options, Rc::new(callback)))
    }

    /// Observe `node`. Its first entry is delivered on the next rendered frame.
    pub fn observe(&self, observer: ObserverId, node: NodeKey) -> bool {
        self.state.observers.borrow_mut().observe(observer, node)
    }

    pub fn unobserve(&self, observer: ObserverId, node: NodeKey) -> bool {
        self.state.observers.borrow_mut().unobserve(observer, node)
    }

    pub fn disconnect(&self, observer: ObserverId) -> bool {
        self.state.observers.borrow_mut().disconnect(observer)
    }

    pub fn is_observing(&self, observer: ObserverId, node: NodeKey) -> bool {
        self.state.observers.borrow().is_observing(observer, node)
    }

    pub fn observed_count(&self, observer: ObserverId) -> usize {
        self.state.observers.borrow().observed_count(observer)
    }

    /// Recompute intersections and deliver one batch per observer whose targets changed.
    pub fn render_frame(&self) {
        let viewport = {
            let window = self.window();
            Viewport {
                top: window.scroll_y(),
                height: window.viewport_height(),
            }
        };
        let batches = {
            let document = self.document();
            self.state
                .observers
                .borrow_mut()
                .collect_batches(&document, viewport)
        };
        for batch in batches {
            // An earlier callback in this frame may have unobserved targets.
            let entries: Vec<IntersectionEntry> = batch
                .entries
                .into_iter()
                .filter(|entry| self.is_observing(batch.observer, entry.target))
                .collect();
            if !entries.is_empty() {
                (batch.callback)(self, &entries, batch.observer);
            }
        }
    }

    // Lifecycle and user-facing side effects

    pub fn ready_state(&self) -> ReadyState {
        self.document().ready_state()
    }

    /// Finish parsing: move to `interactive`, fire `DOMContentLoaded` and render.
    pub fn finish_loading(&self) {
        if self.ready_state() != ReadyState::Loading {
            return;
        }
        self.document_mut().set_ready_state(ReadyState::Interactive);
        self.dispatch_event(EventTarget::Document, EventKind::DomContentLoaded);
        self.render_frame();
    }

    /// `window.alert`: recorded and logged, never blocks.
    pub fn alert(&self, message: &str) {
        warn!("alert: {message}");
        self.window_mut().record_alert(message);
    }

    pub fn console_log(&self, level: LogLevel, message: &str) {
        self.window_mut().console_mut().write(level, message);
    }

    pub fn focus(&self, node: NodeKey) {
        self.document_mut().set_active_element(Some(node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::LayoutRect;
    use crate::observer::RootMargin;
    use anyhow::{Result, anyhow};
    use core::cell::Cell;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn blank_page(capabilities: Capabilities) -> Result<Page> {
        init_logging();
        let window = Window::parse("https://example.com/", "Mozilla/5.0")?;
        Ok(Page::new(Document::new(), window, capabilities))
    }

    #[test]
    fn click_bubbles_from_node_to_window() -> Result<()> {
        let page = blank_page(Capabilities::new())?;
        let body = page.document().body();
        let button = page.document_mut().append_element(body, "button", &[("type", "button")])?;
        let order = Rc::new(RefCell::new(Vec::new()));
        for (label, target) in [
            ("window", EventTarget::Window),
            ("document", EventTarget::Document),
            ("body", EventTarget::Node(body)),
            ("button", EventTarget::Node(button)),
        ] {
            let log = Rc::clone(&order);
            page.add_event_listener(target, EventKind::Click, move |_, _| {
                log.borrow_mut().push(label);
            });
        }
        page.click(button);
        assert_eq!(*order.borrow(), ["button", "body", "document", "window"]);
        Ok(())
    }

    #[test]
    fn once_listener_fires_once() -> Result<()> {
        let page = blank_page(Capabilities::new())?;
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        page.add_event_listener_once(EventTarget::Document, EventKind::DomContentLoaded, move |_, _| {
            counter.set(counter.get() + 1);
        });
        page.finish_loading();
        page.finish_loading();
        page.dispatch_event(EventTarget::Document, EventKind::DomContentLoaded);
        assert_eq!(hits.get(), 1);
        assert_eq!(page.ready_state(), ReadyState::Interactive);
        Ok(())
    }

    #[test]
    fn prevented_link_click_does_not_navigate() -> Result<()> {
        let page = blank_page(Capabilities::new())?;
        let body = page.document().body();
        let link = page
            .document_mut()
            .append_element(body, "a", &[("href", "/pricing")])?;
        page.click(link);
        assert_eq!(page.window().last_navigation(), Some("https://example.com/pricing"));

        page.add_event_listener(EventTarget::Node(link), EventKind::Click, |_, event| {
            event.prevent_default();
        });
        let event = page.click(link);
        assert!(event.default_prevented());
        assert_eq!(page.window().navigations().len(), 1);
        Ok(())
    }

    #[test]
    fn fragment_link_scrolls_to_target() -> Result<()> {
        let page = blank_page(Capabilities::new())?;
        let body = page.document().body();
        let link = page.document_mut().append_element(body, "a", &[("href", "#faq")])?;
        let section = page.document_mut().append_element(body, "section", &[("id", "faq")])?;
        page.document_mut().set_layout(section, LayoutRect::new(1200.0, 400.0));
        page.click(link);
        assert!((page.window().scroll_y() - 1200.0).abs() < f64::EPSILON);
        assert!(page.window().navigations().is_empty());
        Ok(())
    }

    #[test]
    fn bare_hash_link_returns_to_top() -> Result<()> {
        let page = blank_page(Capabilities::new())?;
        let body = page.document().body();
        let link = page.document_mut().append_element(body, "a", &[("href", "#")])?;
        page.scroll_to(1500.0);
        let event = page.click(link);
        assert!(!event.default_prevented());
        assert!(page.window().scroll_y().abs() < f64::EPSILON);
        assert!(page.window().navigations().is_empty());
        Ok(())
    }

    #[test]
    fn submit_button_submits_enclosing_form() -> Result<()> {
        let page = blank_page(Capabilities::new())?;
        let body = page.document().body();
        let form = page.document_mut().append_element(body, "form", &[("id", "signup")])?;
        let button = page.document_mut().append_element(form, "button", &[])?;
        page.click(button);
        assert_eq!(page.window().form_submissions(), [form]);
        Ok(())
    }

    #[test]
    fn timers_fire_in_due_order_and_intervals_stop_on_break() -> Result<()> {
        let page = blank_page(Capabilities::new())?;
        let log = Rc::new(RefCell::new(Vec::new()));
        let late = Rc::clone(&log);
        page.set_timeout(Duration::from_millis(50), move |_| late.borrow_mut().push("timeout"));
        let ticks = Rc::clone(&log);
        let interval = page.set_interval(Duration::from_millis(20), move |_| {
            ticks.borrow_mut().push("tick");
            if ticks.borrow().len() >= 4 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        page.advance(Duration::from_millis(200));
        assert_eq!(*log.borrow(), ["tick", "tick", "timeout", "tick"]);
        assert!(!page.is_timer_active(interval));
        assert_eq!(page.now(), Duration::from_millis(200));
        Ok(())
    }

    #[test]
    fn callbacks_may_reenter_the_page() -> Result<()> {
        let page = blank_page(Capabilities::new())?;
        let body = page.document().body();
        let button = page.document_mut().append_element(body, "button", &[("type", "button")])?;
        page.add_event_listener(EventTarget::Node(button), EventKind::Click, |host, event| {
            let Some(node) = event.target_node() else {
                return;
            };
            host.document_mut().add_class(node, "clicked");
            host.set_timeout(Duration::from_millis(10), move |later| {
                later.document_mut().remove_class(node, "clicked");
            });
        });
        page.click(button);
        assert!(page.document().has_class(button, "clicked"));
        page.advance(Duration::from_millis(10));
        assert!(!page.document().has_class(button, "clicked"));
        Ok(())
    }

    #[test]
    fn observer_reports_changes_once_per_frame() -> Result<()> {
        let page = blank_page(Capabilities::new())?;
        let body = page.document().body();
        let card = page.document_mut().append_element(body, "div", &[("class", "reveal")])?;
        page.document_mut().set_layout(card, LayoutRect::new(1000.0, 200.0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let observer = page
            .create_intersection_observer(
                ObserverOptions {
                    threshold: 0.1,
                    root_margin: RootMargin::parse("0px 0px -50px 0px")?,
                },
                move |_, entries, _| {
                    sink.borrow_mut()
                        .extend(entries.iter().map(|entry| entry.is_intersecting));
                },
            )
            .ok_or_else(|| anyhow!("observer support is on"))?;
        page.observe(observer, card);
        page.render_frame();
        page.render_frame();
        page.scroll_to(600.0);
        page.scroll_to(650.0);
        assert_eq!(*seen.borrow(), [false, true]);
        Ok(())
    }

    #[test]
    fn observers_unavailable_without_capability() -> Result<()> {
        let page = blank_page(Capabilities::new().with_intersection_observer(false))?;
        let observer = page.create_intersection_observer(ObserverOptions::default(), |_, _, _| {});
        assert!(observer.is_none());
        Ok(())
    }
}
