//! The self-pipe: a connected pair of endpoints used to interrupt a blocking
//! [`wait`](crate::backend::Backend::wait) from another thread.

use std::io;

use crate::error::{Error, Result};
use crate::handle::Handle;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(windows)]
use std::net::{TcpListener, TcpStream};

pub(crate) struct Awakener {
    #[cfg(unix)]
    read: UnixStream,
    #[cfg(unix)]
    write: UnixStream,
    #[cfg(windows)]
    read: TcpStream,
    #[cfg(windows)]
    write: TcpStream,
}

impl Awakener {
    #[cfg(unix)]
    pub(crate) fn new() -> Result<Awakener> {
        let (read, write) = UnixStream::pair().map_err(Error::BackendRejection)?;
        read.set_nonblocking(true).map_err(Error::BackendRejection)?;
        write.set_nonblocking(true).map_err(Error::BackendRejection)?;
        Ok(Awakener { read, write })
    }

    #[cfg(windows)]
    pub(crate) fn new() -> Result<Awakener> {
        let listener =
            TcpListener::bind("127.0.0.1:0").map_err(Error::BackendRejection)?;
        let write = TcpStream::connect(listener.local_addr().map_err(Error::BackendRejection)?)
            .map_err(Error::BackendRejection)?;
        let (read, _) = listener.accept().map_err(Error::BackendRejection)?;
        read.set_nonblocking(true).map_err(Error::BackendRejection)?;
        write.set_nonblocking(true).map_err(Error::BackendRejection)?;
        Ok(Awakener { read, write })
    }

    pub(crate) fn read_handle(&self) -> Handle {
        use crate::handle::AsHandle;
        self.read.as_handle()
    }

    pub(crate) fn write_handle(&self) -> Handle {
        use crate::handle::AsHandle;
        self.write.as_handle()
    }

    /// Drains one pending wakeup byte, if any. Called from inside `select`'s
    /// classification loop once the wakeup read side is observed readable.
    pub(crate) fn drain(&self) -> Result<()> {
        use std::io::Read;
        let mut buf = [0u8; 1];
        match (&self.read).read(&mut buf) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(Error::BackendRejection(e)),
        }
    }

    /// A detached, thread-safe handle that can request a wakeup without
    /// holding a reference to the selector itself.
    pub(crate) fn waker(&self) -> Waker {
        Waker {
            handle: self.write_handle(),
        }
    }

    /// Shuts down both endpoints for read and write, per `Selector::close`.
    pub(crate) fn shutdown(&self) {
        #[cfg(unix)]
        {
            let _ = self.read.shutdown(std::net::Shutdown::Both);
            let _ = self.write.shutdown(std::net::Shutdown::Both);
        }
        #[cfg(windows)]
        {
            let _ = self.read.shutdown(std::net::Shutdown::Both);
            let _ = self.write.shutdown(std::net::Shutdown::Both);
        }
    }
}

/// The only type in this crate meant to cross threads without external
/// synchronization. Wraps the self-pipe's raw write handle and performs a
/// single-byte, best-effort, non-blocking write.
#[derive(Clone, Copy, Debug)]
pub struct Waker {
    handle: Handle,
}

// SAFETY: a single-byte write to a socket/pipe fd is safe to issue
// concurrently from any thread; the kernel serializes it.
unsafe impl Send for Waker {}
unsafe impl Sync for Waker {}

impl Waker {
    /// Writes a single byte to the waker write side. Best-effort: per the
    /// documented failure semantics, waking after the selector has been
    /// closed still returns success.
    pub fn wake(&self) -> Result<()> {
        // Best-effort: a full pipe or a selector that already closed its
        // read side both collapse to a harmless no-op here.
        let _ = write_one_byte(self.handle);
        Ok(())
    }
}

#[cfg(unix)]
fn write_one_byte(handle: Handle) -> io::Result<usize> {
    let byte = [1u8];
    let res = unsafe { libc::write(handle, byte.as_ptr() as *const libc::c_void, 1) };
    if res < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(res as usize)
    }
}

#[cfg(windows)]
fn write_one_byte(handle: Handle) -> io::Result<usize> {
    use windows_sys::Win32::Networking::WinSock;
    let byte = [1u8];
    let res = unsafe { WinSock::send(handle as usize, byte.as_ptr(), 1, 0) };
    if res < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(res as usize)
    }
}
