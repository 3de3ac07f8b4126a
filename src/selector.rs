//! The composite facade: one backend, one endpoint map, one self-pipe,
//! one closed flag. Grounded on `nioselector_t` and its operations.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{debug, trace};

use crate::awakener::{Awakener, Waker};
use crate::backend::{Backend, PlatformBackend};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::interest::Interest;
use crate::map::EndpointMap;
use crate::monitor::Monitor;
use crate::readiness::Readiness;

/// Casts a raw handle into the same pointer-sized slot used for monitor
/// `user_data`, so the self-pipe's two ends can be recognized at
/// classification time without a dedicated map entry.
fn wakeup_sentinel(handle: Handle) -> *mut () {
    handle as usize as *mut ()
}

pub(crate) struct SelectorShared<T> {
    backend: PlatformBackend,
    awakener: Awakener,
    map: RefCell<EndpointMap<T>>,
    closed: Cell<bool>,
}

impl<T> SelectorShared<T> {
    pub(crate) fn push_interests(&self, endpoint: Handle, mask: Interest) -> Result<()> {
        if self.closed.get() {
            return Err(Error::SelectorClosed);
        }
        let map = self.map.borrow();
        let monitor = map.get(endpoint).ok_or(Error::NotRegistered)?;
        let user_data = Rc::as_ptr(monitor) as *mut ();
        self.backend
            .set_interest(endpoint, mask.is_readable(), mask.is_writable(), user_data)
    }

    pub(crate) fn deregister_from_monitor(&self, endpoint: Handle) {
        if let Some(monitor) = self.map.borrow_mut().erase(endpoint) {
            if let Err(e) = self.backend.deregister(endpoint) {
                debug!("deregistering endpoint {endpoint} during monitor close: {e}");
            }
            monitor.mark_closed_from_backend();
        }
    }
}

impl<T> Drop for SelectorShared<T> {
    fn drop(&mut self) {
        let _ = self.backend.deregister(self.awakener.read_handle());
        let _ = self.backend.deregister(self.awakener.write_handle());
        // the `backend`, `awakener`, and `map` fields are then dropped, in
        // that declaration order, releasing the epoll/kqueue/select fd, the
        // self-pipe sockets, and every remaining monitor `Rc` in turn.
    }
}

/// The public selector facade. Owns a backend, an endpoint map, and a
/// self-pipe; exposes register/deregister/select/wakeup/close.
///
/// `Selector<T>` is neither `Send` nor `Sync`: it holds an `Rc`, and every
/// method must be called from a single thread. The one way to reach across
/// threads is [`Selector::waker`]'s returned [`Waker`], a detached type that
/// owns nothing but a raw handle and is `Send + Sync` on its own.
pub struct Selector<T> {
    shared: Rc<SelectorShared<T>>,
}

impl<T> Selector<T> {
    /// Creates the backend, the self-pipe, and registers both self-pipe
    /// endpoints with the backend before any user registration is possible.
    pub fn new() -> Result<Selector<T>> {
        let backend = PlatformBackend::create()?;
        let awakener = Awakener::new()?;

        let read_handle = awakener.read_handle();
        let write_handle = awakener.write_handle();

        backend.register(read_handle, wakeup_sentinel(read_handle))?;
        if let Err(e) = backend.register(write_handle, wakeup_sentinel(write_handle)) {
            let _ = backend.deregister(read_handle);
            return Err(e);
        }
        if let Err(e) =
            backend.set_interest(read_handle, true, false, wakeup_sentinel(read_handle))
        {
            let _ = backend.deregister(read_handle);
            let _ = backend.deregister(write_handle);
            return Err(e);
        }
        // The write side stays armed with NIL interest: registered so the
        // backend never rejects it as unknown, never enabled for anything.

        debug!("selector created on {} backend", backend.backend_name());

        Ok(Selector {
            shared: Rc::new(SelectorShared {
                backend,
                awakener,
                map: RefCell::new(EndpointMap::new()),
                closed: Cell::new(false),
            }),
        })
    }

    /// The human-readable backend tag: `"epoll"`, `"kqueue"`, or `"select"`.
    pub fn backend_name(&self) -> &'static str {
        self.shared.backend.backend_name()
    }

    /// Registers `endpoint` with the given initial interest and user data.
    ///
    /// Fails with [`Error::SelectorClosed`] if the selector is closed, or
    /// [`Error::AlreadyRegistered`] if `endpoint` is already tracked.
    pub fn register(
        &self,
        endpoint: Handle,
        interest: Interest,
        user_data: T,
    ) -> Result<Rc<Monitor<T>>> {
        if self.shared.closed.get() {
            return Err(Error::SelectorClosed);
        }
        if self.shared.map.borrow().contains(endpoint) {
            return Err(Error::AlreadyRegistered);
        }

        let monitor = Rc::new(Monitor::new(
            Rc::downgrade(&self.shared),
            endpoint,
            interest,
            user_data,
        ));
        let user_ptr = Rc::as_ptr(&monitor) as *mut ();

        if let Err(e) = self.shared.backend.register(endpoint, user_ptr) {
            // monitor is simply dropped; nothing else has been touched yet.
            return Err(e);
        }
        if let Err(e) = self.shared.backend.set_interest(
            endpoint,
            interest.is_readable(),
            interest.is_writable(),
            user_ptr,
        ) {
            let _ = self.shared.backend.deregister(endpoint);
            return Err(e);
        }

        if let Err(e) = self.shared.map.borrow_mut().insert(endpoint, monitor.clone()) {
            let _ = self.shared.backend.deregister(endpoint);
            return Err(e);
        }
        Ok(monitor)
    }

    /// Erases `endpoint` from the map. If a monitor is recovered and was not
    /// already closed, also deregisters it from the backend and marks it
    /// closed.
    pub fn deregister(&self, endpoint: Handle) -> Option<Rc<Monitor<T>>> {
        let monitor = self.shared.map.borrow_mut().erase(endpoint)?;
        if !monitor.closed() {
            if let Err(e) = self.shared.backend.deregister(endpoint) {
                debug!("deregistering endpoint {endpoint}: {e}");
            }
            monitor.mark_closed_from_backend();
        }
        Some(monitor)
    }

    /// Blocks up to `timeout` (`None` = indefinite) waiting for readiness,
    /// appends every affected monitor to `out_monitors` (cleared first), and
    /// returns the count appended. The wakeup endpoint is never surfaced.
    pub fn select(
        &self,
        out_monitors: &mut Vec<Rc<Monitor<T>>>,
        capacity: usize,
        timeout: Option<Duration>,
    ) -> Result<usize> {
        if self.shared.closed.get() {
            return Err(Error::SelectorClosed);
        }

        out_monitors.clear();
        for (_, monitor) in self.shared.map.borrow().iter() {
            monitor.reset_readiness();
        }

        let mut events = Vec::with_capacity(capacity);
        self.shared.backend.wait(&mut events, capacity, timeout)?;
        trace!("select: {} raw event(s)", events.len());

        let read_sentinel = wakeup_sentinel(self.shared.awakener.read_handle());
        let write_sentinel = wakeup_sentinel(self.shared.awakener.write_handle());

        for event in events {
            if event.user_data == read_sentinel {
                if event.readable {
                    self.shared.awakener.drain()?;
                }
                continue;
            }
            if event.user_data == write_sentinel {
                continue;
            }
            if event.user_data.is_null() {
                continue;
            }

            let monitor_ptr = event.user_data as *const Monitor<T>;
            // SAFETY: `monitor_ptr` was obtained from `Rc::as_ptr` on a
            // monitor whose clone is still held by `self.shared.map` (the
            // backend never outlives a registration past `deregister`), so
            // the allocation is live and `increment_strong_count` followed
            // by `from_raw` yields a valid, independently-owned `Rc`.
            let monitor: Rc<Monitor<T>> = unsafe {
                Rc::increment_strong_count(monitor_ptr);
                Rc::from_raw(monitor_ptr)
            };

            if event.error {
                monitor.mark_readiness(Readiness::IO_ERROR);
            }
            if event.readable {
                monitor.mark_readiness(Readiness::READ);
            }
            if event.writable {
                monitor.mark_readiness(Readiness::WRITE);
            }
            out_monitors.push(monitor);
        }

        Ok(out_monitors.len())
    }

    /// A detached, `Send + Sync` handle that can interrupt a concurrent
    /// [`select`](Selector::select) call from another thread.
    pub fn waker(&self) -> Waker {
        self.shared.awakener.waker()
    }

    /// Marks the selector closed and shuts down both self-pipe endpoints.
    /// Idempotent only in the sense that a second call fails cleanly;
    /// subsequent mutations fail with [`Error::SelectorClosed`].
    pub fn close(&self) -> Result<()> {
        if self.shared.closed.replace(true) {
            return Err(Error::SelectorClosed);
        }
        self.shared.awakener.shutdown();
        Ok(())
    }

    /// `true` if `endpoint` is currently tracked.
    pub fn registered(&self, endpoint: Handle) -> bool {
        self.shared.map.borrow().contains(endpoint)
    }

    /// `true` if no user endpoints are tracked (the self-pipe never counts).
    pub fn empty(&self) -> bool {
        self.shared.map.borrow().is_empty()
    }

    /// `true` once [`close`](Selector::close) has been called.
    pub fn closed(&self) -> bool {
        self.shared.closed.get()
    }
}
