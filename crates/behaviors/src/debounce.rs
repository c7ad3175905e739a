//! Trailing-edge debounce on the page's virtual clock.

use core::cell::Cell;
use core::time::Duration;
use page_host::{Page, TimerId};
use std::rc::Rc;

/// A callback wrapper that coalesces bursts of calls into one trailing call.
///
/// Every [`Debounced::call`] cancels the pending timer and schedules a new one
/// `wait` from now, so the wrapped callback only ever sees the arguments of the
/// last call of a burst. There is no leading edge and no maximum wait.
pub struct Debounced<A> {
    wait: Duration,
    pending: Rc<Cell<Option<TimerId>>>,
    callback: Rc<dyn Fn(&Page, A)>,
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            wait: self.wait,
            pending: Rc::clone(&self.pending),
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<A: 'static> Debounced<A> {
    pub fn new<F>(wait: Duration, callback: F) -> Self
    where
        F: Fn(&Page, A) + 'static,
    {
        Self {
            wait,
            pending: Rc::new(Cell::new(None)),
            callback: Rc::new(callback),
        }
    }

    pub const fn wait(&self) -> Duration {
        self.wait
    }

    /// Schedule the callback with `args`, replacing any pending call.
    pub fn call(&self, page: &Page, args: A) {
        if let Some(previous) = self.pending.take() {
            page.clear_timer(previous);
        }
        let pending = Rc::clone(&self.pending);
        let callback = Rc::clone(&self.callback);
        let timer = page.set_timeout(self.wait, move |host| {
            pending.set(None);
            callback(host, args);
        });
        self.pending.set(Some(timer));
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self, page: &Page) {
        if let Some(previous) = self.pending.take() {
            page.clear_timer(previous);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::blank_page;
    use anyhow::Result;
    use core::cell::RefCell;

    #[test]
    fn burst_delivers_last_arguments_once() -> Result<()> {
        let page = blank_page()?;
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let debounced = Debounced::new(Duration::from_millis(100), move |host: &Page, value: u32| {
            sink.borrow_mut().push((value, host.now()));
        });
        for value in 1..=5 {
            debounced.call(&page, value);
            page.advance(Duration::from_millis(30));
        }
        // Last call happened at t=120ms.
        assert!(debounced.is_pending());
        assert!(calls.borrow().is_empty(), "nothing fires inside the burst");
        page.advance(Duration::from_millis(69));
        assert!(calls.borrow().is_empty(), "still inside the quiet period");
        page.advance(Duration::from_millis(1));
        assert_eq!(*calls.borrow(), [(5, Duration::from_millis(220))]);
        assert!(!debounced.is_pending());
        page.advance(Duration::from_secs(1));
        assert_eq!(calls.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn clones_share_the_pending_timer() -> Result<()> {
        let page = blank_page()?;
        let calls = Rc::new(Cell::new(0));
        let sink = Rc::clone(&calls);
        let debounced = Debounced::new(Duration::from_millis(50), move |_: &Page, ()| {
            sink.set(sink.get() + 1);
        });
        let other = debounced.clone();
        debounced.call(&page, ());
        other.call(&page, ());
        assert_eq!(page.pending_timers(), 1);
        other.cancel(&page);
        assert!(!debounced.is_pending());
        page.advance(Duration::from_millis(100));
        assert_eq!(calls.get(), 0);
        Ok(())
    }
}
