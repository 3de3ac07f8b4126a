use std::cmp;
use std::os::unix::io::RawFd;
use std::ptr;
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};
use crate::handle::Handle;

use super::{Backend, Event};

#[cfg(not(target_os = "netbsd"))]
type Count = libc::c_int;
#[cfg(target_os = "netbsd")]
type Count = libc::size_t;

#[cfg(any(target_os = "freebsd", target_os = "openbsd", target_os = "dragonfly"))]
type Filter = libc::c_short;
#[cfg(any(target_os = "macos", target_os = "ios"))]
type Filter = i16;
#[cfg(target_os = "netbsd")]
type Filter = u32;

#[cfg(not(target_os = "netbsd"))]
type UData = *mut libc::c_void;
#[cfg(target_os = "netbsd")]
type UData = libc::intptr_t;

macro_rules! kevent {
    ($id:expr, $filter:expr, $flags:expr, $data:expr) => {
        libc::kevent {
            ident: $id as libc::uintptr_t,
            filter: $filter as Filter,
            flags: $flags,
            fflags: 0,
            data: 0,
            udata: $data as UData,
        }
    };
}

pub(crate) struct KqueueBackend {
    kq: RawFd,
}

impl Backend for KqueueBackend {
    fn create() -> Result<KqueueBackend> {
        let kq = syscall!(kqueue()).map_err(Error::BackendRejection)?;
        syscall!(fcntl(kq, libc::F_SETFD, libc::FD_CLOEXEC)).map_err(Error::BackendRejection)?;
        debug!("kqueue fd {kq} created");
        Ok(KqueueBackend { kq })
    }

    fn backend_name(&self) -> &'static str {
        "kqueue"
    }

    fn register(&self, handle: Handle, user_data: *mut ()) -> Result<()> {
        let changes = [
            kevent!(handle, libc::EVFILT_READ, libc::EV_ADD | libc::EV_DISABLE, user_data),
            kevent!(handle, libc::EVFILT_WRITE, libc::EV_ADD | libc::EV_DISABLE, user_data),
        ];
        syscall!(kevent(
            self.kq,
            changes.as_ptr(),
            changes.len() as Count,
            ptr::null_mut(),
            0,
            ptr::null(),
        ))
        .map_err(Error::BackendRejection)?;
        Ok(())
    }

    fn deregister(&self, handle: Handle) -> Result<()> {
        let changes = [
            kevent!(handle, libc::EVFILT_READ, libc::EV_DELETE, 0usize),
            kevent!(handle, libc::EVFILT_WRITE, libc::EV_DELETE, 0usize),
        ];
        // ENOENT is expected if the handle already vanished from the kernel's
        // own tables (e.g. the socket was closed first); not an error here.
        let _ = syscall!(kevent(
            self.kq,
            changes.as_ptr(),
            changes.len() as Count,
            ptr::null_mut(),
            0,
            ptr::null(),
        ));
        Ok(())
    }

    fn set_interest(
        &self,
        handle: Handle,
        read_on: bool,
        write_on: bool,
        user_data: *mut (),
    ) -> Result<()> {
        let read_flag = if read_on { libc::EV_ENABLE } else { libc::EV_DISABLE };
        let write_flag = if write_on { libc::EV_ENABLE } else { libc::EV_DISABLE };
        let changes = [
            kevent!(handle, libc::EVFILT_READ, read_flag, user_data),
            kevent!(handle, libc::EVFILT_WRITE, write_flag, user_data),
        ];
        syscall!(kevent(
            self.kq,
            changes.as_ptr(),
            changes.len() as Count,
            ptr::null_mut(),
            0,
            ptr::null(),
        ))
        .map_err(Error::BackendRejection)?;
        Ok(())
    }

    fn wait(
        &self,
        events: &mut Vec<Event>,
        capacity: usize,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let ts = timeout.map(|to| libc::timespec {
            tv_sec: cmp::min(to.as_secs(), libc::time_t::MAX as u64) as libc::time_t,
            tv_nsec: libc::c_long::from(to.subsec_nanos() as i32),
        });
        let ts_ptr = ts.as_ref().map(|t| t as *const _).unwrap_or(ptr::null());

        let mut raw = vec![unsafe { std::mem::zeroed::<libc::kevent>() }; capacity];

        let n = syscall!(kevent(
            self.kq,
            ptr::null(),
            0,
            raw.as_mut_ptr(),
            capacity as Count,
            ts_ptr,
        ))
        .map_err(Error::WaitFailure)?;

        events.clear();
        for raw_event in &raw[..n as usize] {
            let error = (raw_event.flags & libc::EV_ERROR) != 0
                || (raw_event.flags & libc::EV_EOF != 0 && raw_event.fflags != 0);
            events.push(Event {
                user_data: raw_event.udata as *mut (),
                readable: raw_event.filter == libc::EVFILT_READ as Filter,
                writable: raw_event.filter == libc::EVFILT_WRITE as Filter,
                error,
            });
        }
        Ok(())
    }
}

impl Drop for KqueueBackend {
    fn drop(&mut self) {
        unsafe {
            let _ = libc::close(self.kq);
        }
    }
}
