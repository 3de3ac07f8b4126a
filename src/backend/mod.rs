//! The pluggable readiness backend: one contract, three interchangeable OS
//! implementations. Exactly one is compiled into a given target via `cfg` —
//! see the module-selection block at the bottom of this file.

use std::time::Duration;

use crate::error::Result;
use crate::handle::Handle;

/// One readiness event reported by [`Backend::wait`].
///
/// Carries only the `user_data` round-trip, not the raw handle: the OS
/// primitives don't uniformly hand the handle back alongside the event (most
/// visibly `epoll_event`, whose `data` word holds either the pointer or the
/// fd, never both), so handle identity is recovered by the caller from
/// `user_data` — either by dereferencing it as a monitor pointer, or, for the
/// self-pipe endpoints (which carry no monitor), by comparing it against a
/// sentinel the selector stashed at registration time.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Event {
    pub(crate) user_data: *mut (),
    pub(crate) readable: bool,
    pub(crate) writable: bool,
    pub(crate) error: bool,
}

/// The contract every OS readiness primitive is normalized to.
///
/// `user_data` is an opaque pointer round-tripped by the backend: the
/// selector stashes the address of a monitor's heap allocation here so that
/// classifying a returned event never needs a second map lookup.
pub(crate) trait Backend: Sized {
    fn create() -> Result<Self>;

    fn backend_name(&self) -> &'static str;

    fn register(&self, handle: Handle, user_data: *mut ()) -> Result<()>;

    fn deregister(&self, handle: Handle) -> Result<()>;

    fn set_interest(
        &self,
        handle: Handle,
        read_on: bool,
        write_on: bool,
        user_data: *mut (),
    ) -> Result<()>;

    /// Blocks up to `timeout` (`None` = indefinite) and appends up to
    /// `events.capacity()` ready events to `events` (which is cleared first).
    fn wait(&self, events: &mut Vec<Event>, capacity: usize, timeout: Option<Duration>)
        -> Result<()>;
}

#[cfg(target_os = "linux")]
mod epoll;
#[cfg(target_os = "linux")]
pub(crate) use epoll::EpollBackend as PlatformBackend;

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
))]
mod kqueue;
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
))]
pub(crate) use kqueue::KqueueBackend as PlatformBackend;

#[cfg(not(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
mod select;
#[cfg(not(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
pub(crate) use select::SelectBackend as PlatformBackend;
