use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::interest::Interest;
use crate::readiness::Readiness;
use crate::selector::SelectorShared;

/// The per-endpoint record held by a [`Selector`](crate::Selector): pairs an
/// endpoint with its interest, readiness, and caller-supplied user data.
///
/// A `Monitor` is returned by [`Selector::register`](crate::Selector::register)
/// as an `Rc<Monitor<T>>`; the selector's own endpoint map holds a clone of
/// the same `Rc`, so the monitor stays alive for as long as either the
/// caller or the map (i.e. until deregistration) still references it.
pub struct Monitor<T> {
    selector: Weak<SelectorShared<T>>,
    endpoint: Handle,
    user_data: T,
    interests: Cell<Interest>,
    readiness: Cell<Readiness>,
    closed: Cell<bool>,
}

impl<T> Monitor<T> {
    pub(crate) fn new(
        selector: Weak<SelectorShared<T>>,
        endpoint: Handle,
        interests: Interest,
        user_data: T,
    ) -> Monitor<T> {
        Monitor {
            selector,
            endpoint,
            user_data,
            interests: Cell::new(interests),
            readiness: Cell::new(Readiness::NIL),
            closed: Cell::new(false),
        }
    }

    /// The caller-supplied payload attached at registration time.
    pub fn user_data(&self) -> &T {
        &self.user_data
    }

    /// The endpoint handle this monitor was registered for.
    pub fn endpoint(&self) -> Handle {
        self.endpoint
    }

    /// The currently armed interest mask.
    pub fn interests(&self) -> Interest {
        self.interests.get()
    }

    /// Sets the armed interest mask to exactly `mask`.
    ///
    /// A no-op, successful, if `mask` already equals the current value.
    /// Fails with [`Error::MonitorClosed`] if the monitor has been closed.
    pub fn set_interests(&self, mask: Interest) -> Result<()> {
        if self.closed.get() {
            return Err(Error::MonitorClosed);
        }
        if self.interests.get() == mask {
            return Ok(());
        }
        self.interests.set(mask);
        self.push_interests()
    }

    /// Adds `mask` to the armed interest set.
    pub fn add_interest(&self, mask: Interest) -> Result<()> {
        if self.closed.get() {
            return Err(Error::MonitorClosed);
        }
        let current = self.interests.get();
        if current.contains(mask) {
            return Ok(());
        }
        self.interests.set(current.union(mask));
        self.push_interests()
    }

    /// Removes `mask` from the armed interest set.
    pub fn remove_interest(&self, mask: Interest) -> Result<()> {
        if self.closed.get() {
            return Err(Error::MonitorClosed);
        }
        if mask.is_nil() {
            return Ok(());
        }
        let current = self.interests.get();
        if current.intersection(mask).is_nil() {
            return Ok(());
        }
        self.interests.set(current.difference(mask));
        self.push_interests()
    }

    fn push_interests(&self) -> Result<()> {
        let selector = self.selector.upgrade().ok_or(Error::SelectorClosed)?;
        selector.push_interests(self.endpoint, self.interests.get())
    }

    /// `true` if the last [`select`](crate::Selector::select) observed this
    /// endpoint as readable.
    pub fn readable(&self) -> bool {
        self.readiness.get().is_readable()
    }

    /// `true` if the last [`select`](crate::Selector::select) observed this
    /// endpoint as writable.
    pub fn writable(&self) -> bool {
        self.readiness.get().is_writable()
    }

    /// `true` if the last [`select`](crate::Selector::select) observed an
    /// error (or hang-up) on this endpoint.
    pub fn exception(&self) -> bool {
        self.readiness.get().is_error()
    }

    /// `true` once [`close`](Monitor::close) has been called.
    pub fn closed(&self) -> bool {
        self.closed.get()
    }

    /// Marks the monitor closed. If `deregister` is set, also asks the
    /// owning selector to drop its registration with the backend.
    ///
    /// Closing twice fails with [`Error::MonitorClosed`].
    pub fn close(&self, deregister: bool) -> Result<()> {
        if self.closed.replace(true) {
            self.closed.set(true);
            return Err(Error::MonitorClosed);
        }
        if deregister {
            if let Some(selector) = self.selector.upgrade() {
                selector.deregister_from_monitor(self.endpoint);
            }
        }
        Ok(())
    }

    pub(crate) fn reset_readiness(&self) {
        self.readiness.set(Readiness::NIL);
    }

    pub(crate) fn mark_readiness(&self, bits: Readiness) {
        let mut current = self.readiness.get();
        current.insert(bits);
        self.readiness.set(current);
    }

    pub(crate) fn mark_closed_from_backend(&self) {
        self.closed.set(true);
    }
}

impl<T: fmt::Debug> fmt::Debug for Monitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("endpoint", &self.endpoint)
            .field("interests", &self.interests.get())
            .field("readiness", &self.readiness.get())
            .field("closed", &self.closed.get())
            .field("user_data", &self.user_data)
            .finish()
    }
}

/// Convenience alias for the shared-ownership handle a monitor is vended as.
pub type MonitorRef<T> = Rc<Monitor<T>>;
