//! A Linux `eventfd`-backed counting semaphore.
//!
//! Created with `EFD_SEMAPHORE | EFD_NONBLOCK`: each `write_event` increments
//! the kernel counter by one, each `read_event` decrements it by one and
//! blocks (at the syscall level) only when non-blocking reads are not used.
//! We always operate it non-blocking and let callers poll the fd alongside
//! other readiness sources.

use std::os::fd::RawFd;

use tracing::error;

/// A counting semaphore backed by `eventfd(2)`, pollable like any other file
/// descriptor.
pub struct EventSignal {
    fd: RawFd,
}

impl EventSignal {
    /// Creates a new, zeroed event signal.
    pub fn new() -> std::io::Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_SEMAPHORE | libc::EFD_NONBLOCK) };
        if fd < 0 {
            let err = std::io::Error::last_os_error();
            error!("eventfd creation failed: {err}");
            return Err(err);
        }
        Ok(Self { fd })
    }

    /// The raw file descriptor, for use with `poll`/`select`.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Increments the counter by one, waking anyone blocked reading it.
    pub fn write_event(&self) -> std::io::Result<()> {
        let value: u64 = 1;
        let written = unsafe {
            libc::write(
                self.fd,
                &value as *const u64 as *const libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if written != std::mem::size_of::<u64>() as isize {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    /// Decrements the counter by one. Returns `Ok(false)` (not an error) if
    /// the counter was already zero, since the fd is non-blocking.
    pub fn read_event(&self) -> std::io::Result<bool> {
        let mut value: u64 = 0;
        let read = unsafe {
            libc::read(
                self.fd,
                &mut value as *mut u64 as *mut libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if read < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::WouldBlock {
                return Ok(false);
            }
            return Err(err);
        }
        Ok(read == std::mem::size_of::<u64>() as isize)
    }

    /// Drains the counter to zero.
    pub fn clear_events(&self) {
        while matches!(self.read_event(), Ok(true)) {}
    }
}

impl Drop for EventSignal {
    fn drop(&mut self) {
        if self.fd >= 0 {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

// An eventfd is just a counter guarded by the kernel; safe to share across
// threads the same way any `RawFd` used with syscalls is.
unsafe impl Send for EventSignal {}
unsafe impl Sync for EventSignal {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let sig = EventSignal::new().unwrap();
        sig.write_event().unwrap();
        assert!(sig.read_event().unwrap());
    }

    #[test]
    fn read_on_empty_counter_returns_false() {
        let sig = EventSignal::new().unwrap();
        assert!(!sig.read_event().unwrap());
    }

    #[test]
    fn clear_drains_multiple_writes() {
        let sig = EventSignal::new().unwrap();
        for _ in 0..5 {
            sig.write_event().unwrap();
        }
        sig.clear_events();
        assert!(!sig.read_event().unwrap());
    }
}
