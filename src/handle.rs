//! The endpoint handle: an opaque, stable, non-negative integer identifier
//! issued by the host OS. The core never duplicates, closes, or re-issues it.

#[cfg(unix)]
pub use std::os::unix::io::RawFd as Handle;

#[cfg(windows)]
pub type Handle = std::os::windows::io::RawSocket;

/// Types that expose a stable OS handle the selector can register.
///
/// The core only ever reads this integer; it is never inspected, closed, or
/// duplicated on the caller's behalf.
pub trait AsHandle {
    fn as_handle(&self) -> Handle;
}

#[cfg(unix)]
impl<T: std::os::unix::io::AsRawFd> AsHandle for T {
    fn as_handle(&self) -> Handle {
        self.as_raw_fd()
    }
}

#[cfg(windows)]
impl<T: std::os::windows::io::AsRawSocket> AsHandle for T {
    fn as_handle(&self) -> Handle {
        self.as_raw_socket()
    }
}

/// Narrows a [`Handle`] to the `usize` used for hashing in the endpoint map.
#[inline]
pub(crate) fn hash_key(handle: Handle) -> usize {
    handle as usize
}
