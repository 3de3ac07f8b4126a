use std::cmp;
use std::os::unix::io::RawFd;
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};
use crate::handle::Handle;

use super::{Backend, Event};

pub(crate) struct EpollBackend {
    epfd: RawFd,
}

impl Backend for EpollBackend {
    fn create() -> Result<EpollBackend> {
        let epfd = syscall!(epoll_create1(libc::EPOLL_CLOEXEC)).map_err(Error::BackendRejection)?;
        debug!("epoll fd {epfd} created");
        Ok(EpollBackend { epfd })
    }

    fn backend_name(&self) -> &'static str {
        "epoll"
    }

    fn register(&self, handle: Handle, user_data: *mut ()) -> Result<()> {
        let mut info = libc::epoll_event {
            events: 0,
            u64: user_data as u64,
        };
        syscall!(epoll_ctl(self.epfd, libc::EPOLL_CTL_ADD, handle, &mut info))
            .map_err(Error::BackendRejection)?;
        Ok(())
    }

    fn deregister(&self, handle: Handle) -> Result<()> {
        let mut info = libc::epoll_event { events: 0, u64: 0 };
        match syscall!(epoll_ctl(self.epfd, libc::EPOLL_CTL_DEL, handle, &mut info)) {
            Ok(_) => Ok(()),
            Err(e) if e.raw_os_error() == Some(libc::ENOENT) => Ok(()),
            Err(e) => Err(Error::BackendRejection(e)),
        }
    }

    fn set_interest(
        &self,
        handle: Handle,
        read_on: bool,
        write_on: bool,
        user_data: *mut (),
    ) -> Result<()> {
        let mut events = 0u32;
        if read_on {
            events |= libc::EPOLLIN as u32;
        }
        if write_on {
            events |= libc::EPOLLOUT as u32;
        }
        let mut info = libc::epoll_event {
            events,
            u64: user_data as u64,
        };
        syscall!(epoll_ctl(self.epfd, libc::EPOLL_CTL_MOD, handle, &mut info))
            .map_err(Error::BackendRejection)?;
        Ok(())
    }

    fn wait(
        &self,
        events: &mut Vec<Event>,
        capacity: usize,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let timeout_ms = timeout
            .map(|to| cmp::min(to.as_millis(), libc::c_int::MAX as u128) as libc::c_int)
            .unwrap_or(-1);

        let mut raw: Vec<libc::epoll_event> = vec![
            libc::epoll_event { events: 0, u64: 0 };
            capacity
        ];

        let n = syscall!(epoll_wait(
            self.epfd,
            raw.as_mut_ptr(),
            capacity as i32,
            timeout_ms
        ))
        .map_err(Error::WaitFailure)?;

        events.clear();
        for raw_event in &raw[..n as usize] {
            let readable = raw_event.events & (libc::EPOLLIN as u32) != 0
                || raw_event.events & (libc::EPOLLHUP as u32) != 0;
            let writable = raw_event.events & (libc::EPOLLOUT as u32) != 0;
            let error = raw_event.events & (libc::EPOLLERR as u32) != 0;
            events.push(Event {
                user_data: raw_event.u64 as *mut (),
                readable,
                writable,
                error,
            });
        }
        Ok(())
    }
}

impl Drop for EpollBackend {
    fn drop(&mut self) {
        unsafe {
            let _ = libc::close(self.epfd);
        }
    }
}
