//! Thin, non-blocking socket wrappers used to drive the selector core in
//! tests and applications. The core only ever needs `AsRawFd`/`AsRawSocket`;
//! everything here is a direct pass-through to `std::net` /
//! `std::os::unix::net` with non-blocking mode switched on at construction.

pub mod tcp;

#[cfg(unix)]
pub mod unix;

pub use tcp::{TcpListener, TcpStream};

#[cfg(unix)]
pub use unix::{UnixListener, UnixStream};
