//! `select`-based fallback backend: Windows, and any Unix-like target without
//! epoll or kqueue. Keeps a dense vector of registered endpoints and rebuilds
//! the fd sets on every wait.

use std::cell::RefCell;
use std::io;
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};
use crate::handle::Handle;

use super::{Backend, Event};

/// At least 2048 entries, per the documented minimum capacity.
const MIN_CAPACITY: usize = 2048;

struct Entry {
    handle: Handle,
    read_on: bool,
    write_on: bool,
    user_data: *mut (),
}

pub(crate) struct SelectBackend {
    entries: RefCell<Vec<Entry>>,
}

impl Backend for SelectBackend {
    fn create() -> Result<SelectBackend> {
        debug!("select backend created");
        Ok(SelectBackend {
            entries: RefCell::new(Vec::with_capacity(MIN_CAPACITY)),
        })
    }

    fn backend_name(&self) -> &'static str {
        "select"
    }

    fn register(&self, handle: Handle, user_data: *mut ()) -> Result<()> {
        let mut entries = self.entries.borrow_mut();
        if entries.iter().any(|e| e.handle == handle) {
            return Err(Error::AlreadyRegistered);
        }
        entries.push(Entry {
            handle,
            read_on: false,
            write_on: false,
            user_data,
        });
        Ok(())
    }

    fn deregister(&self, handle: Handle) -> Result<()> {
        let mut entries = self.entries.borrow_mut();
        if let Some(idx) = entries.iter().position(|e| e.handle == handle) {
            entries.swap_remove(idx);
        }
        Ok(())
    }

    fn set_interest(
        &self,
        handle: Handle,
        read_on: bool,
        write_on: bool,
        user_data: *mut (),
    ) -> Result<()> {
        let mut entries = self.entries.borrow_mut();
        match entries.iter_mut().find(|e| e.handle == handle) {
            Some(entry) => {
                entry.read_on = read_on;
                entry.write_on = write_on;
                entry.user_data = user_data;
                Ok(())
            }
            None => Err(Error::NotRegistered),
        }
    }

    fn wait(
        &self,
        events: &mut Vec<Event>,
        capacity: usize,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let entries = self.entries.borrow();

        let mut read_set = fd_set::new();
        let mut write_set = fd_set::new();
        let mut except_set = fd_set::new();
        let mut max_handle: Handle = 0;

        for entry in entries.iter() {
            if entry.read_on {
                read_set.set(entry.handle);
            }
            if entry.write_on {
                write_set.set(entry.handle);
            }
            except_set.set(entry.handle);
            if entry.handle > max_handle {
                max_handle = entry.handle;
            }
        }

        let n = raw_select(max_handle, &mut read_set, &mut write_set, &mut except_set, timeout)?;

        events.clear();
        for entry in entries.iter() {
            if events.len() >= capacity {
                break;
            }
            let readable = entry.read_on && read_set.is_set(entry.handle);
            let writable = entry.write_on && write_set.is_set(entry.handle);
            let error = except_set.is_set(entry.handle);
            if readable || writable || error {
                events.push(Event {
                    user_data: entry.user_data,
                    readable,
                    writable,
                    error,
                });
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
mod raw {
    use super::*;

    pub(super) struct FdSet(libc::fd_set);

    impl FdSet {
        pub(super) fn new() -> FdSet {
            unsafe {
                let mut raw = std::mem::zeroed::<libc::fd_set>();
                libc::FD_ZERO(&mut raw);
                FdSet(raw)
            }
        }

        pub(super) fn set(&mut self, handle: Handle) {
            unsafe { libc::FD_SET(handle as libc::c_int, &mut self.0) }
        }

        pub(super) fn is_set(&self, handle: Handle) -> bool {
            unsafe { libc::FD_ISSET(handle as libc::c_int, &self.0) }
        }
    }

    pub(super) fn select(
        max_handle: Handle,
        read_set: &mut FdSet,
        write_set: &mut FdSet,
        except_set: &mut FdSet,
        timeout: Option<Duration>,
    ) -> Result<i32> {
        let mut tv = timeout.map(|d| libc::timeval {
            tv_sec: d.as_secs() as libc::time_t,
            tv_usec: d.subsec_micros() as libc::suseconds_t,
        });
        let tv_ptr = tv
            .as_mut()
            .map(|t| t as *mut libc::timeval)
            .unwrap_or(std::ptr::null_mut());

        let n = unsafe {
            libc::select(
                max_handle as libc::c_int + 1,
                &mut read_set.0,
                &mut write_set.0,
                &mut except_set.0,
                tv_ptr,
            )
        };
        if n < 0 {
            return Err(Error::WaitFailure(io::Error::last_os_error()));
        }
        Ok(n)
    }
}

#[cfg(windows)]
mod raw {
    use super::*;
    use windows_sys::Win32::Networking::WinSock;

    pub(super) struct FdSet(WinSock::FD_SET);

    impl FdSet {
        pub(super) fn new() -> FdSet {
            FdSet(WinSock::FD_SET {
                fd_count: 0,
                fd_array: [0; 64],
            })
        }

        pub(super) fn set(&mut self, handle: Handle) {
            let count = self.0.fd_count as usize;
            if count < self.0.fd_array.len() {
                self.0.fd_array[count] = handle as usize;
                self.0.fd_count += 1;
            }
        }

        pub(super) fn is_set(&self, handle: Handle) -> bool {
            let handle = handle as usize;
            self.0.fd_array[..self.0.fd_count as usize]
                .iter()
                .any(|&fd| fd == handle)
        }
    }

    pub(super) fn select(
        _max_handle: Handle,
        read_set: &mut FdSet,
        write_set: &mut FdSet,
        except_set: &mut FdSet,
        timeout: Option<Duration>,
    ) -> Result<i32> {
        let mut tv = timeout.map(|d| WinSock::TIMEVAL {
            tv_sec: d.as_secs() as i32,
            tv_usec: d.subsec_micros() as i32,
        });
        let tv_ptr = tv
            .as_mut()
            .map(|t| t as *mut WinSock::TIMEVAL)
            .unwrap_or(std::ptr::null_mut());

        let n = unsafe {
            WinSock::select(
                0,
                &mut read_set.0,
                &mut write_set.0,
                &mut except_set.0,
                tv_ptr,
            )
        };
        if n < 0 {
            return Err(Error::WaitFailure(io::Error::last_os_error()));
        }
        Ok(n)
    }
}

#[allow(non_camel_case_types)]
use raw::{select as raw_select, FdSet as fd_set};
