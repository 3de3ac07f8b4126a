//! A cross-platform, non-blocking I/O readiness selector.
//!
//! Given a set of registered endpoints, each declaring interest in
//! readability and/or writability, [`Selector`] reports which endpoints have
//! become ready to perform non-blocking I/O, using the most efficient
//! mechanism the host operating system provides: `epoll` on Linux/Android,
//! `kqueue` on macOS/iOS/the BSD family, and a `select`-based fallback
//! everywhere else (including Windows).
//!
//! This crate is not an event loop: it does not schedule callbacks, own
//! timers, or drive application state. It is not a proactor: it reports
//! readiness, it does not perform I/O on the caller's behalf.
//!
//! # Example
//!
//! ```no_run
//! use readywatch::{Interest, Selector};
//! use readywatch::net::{TcpListener, TcpStream};
//! use std::os::unix::io::AsRawFd;
//!
//! let selector: Selector<()> = Selector::new().unwrap();
//!
//! let listener = TcpListener::bind("127.0.0.1:0").unwrap();
//! let monitor = selector
//!     .register(listener.as_raw_fd(), Interest::READ, ())
//!     .unwrap();
//!
//! let mut ready = Vec::new();
//! selector.select(&mut ready, 128, None).unwrap();
//! for m in &ready {
//!     if m.readable() {
//!         let (_stream, _addr) = listener.accept().unwrap();
//!     }
//! }
//! # let _ = monitor;
//! ```

#[macro_use]
mod macros;

mod awakener;
mod backend;
pub mod error;
mod handle;
mod interest;
mod map;
mod monitor;
pub mod net;
mod readiness;
mod selector;

pub use awakener::Waker;
pub use error::{Error, Result};
pub use handle::{AsHandle, Handle};
pub use interest::Interest;
pub use monitor::{Monitor, MonitorRef};
pub use readiness::Readiness;
pub use selector::Selector;
