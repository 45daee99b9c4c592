use std::ffi::CStr;

use libc::{__errno_location, c_int, strerror};

pub(crate) fn errno() -> c_int {
    unsafe { *__errno_location() }
}

pub(crate) fn errno_message(error_num: c_int) -> String {
    unsafe { CStr::from_ptr(strerror(error_num)) }
        .to_string_lossy()
        .into_owned()
}

/// Owned file descriptor, closed on drop.
pub(crate) struct Fd(c_int);

impl Fd {
    pub(crate) fn open(path: &CStr, flags: c_int, mode: libc::mode_t) -> Result<Fd, c_int> {
        match unsafe { libc::open(path.as_ptr(), flags, mode) } {
            -1 => Err(errno()),
            fd => Ok(Fd(fd)),
        }
    }

    /// Rebinds `target` to this descriptor. The descriptor itself stays
    /// open until the wrapper is dropped.
    pub(crate) fn dup_to(&self, target: c_int) -> Result<(), c_int> {
        match unsafe { libc::dup2(self.0, target) } {
            -1 => Err(errno()),
            _ => Ok(()),
        }
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        unsafe { libc::close(self.0) };
    }
}

/// Anonymous unidirectional pipe. Both ends close when the pipe is dropped,
/// so each process holds the ends open exactly as long as it owns the value.
pub(crate) struct Pipe {
    pub(crate) read: Fd,
    pub(crate) write: Fd,
}

impl Pipe {
    pub(crate) fn new() -> Result<Pipe, c_int> {
        let mut filedes: [c_int; 2] = [-1, -1];
        match unsafe { libc::pipe(filedes.as_mut_ptr()) } {
            -1 => Err(errno()),
            _ => Ok(Pipe {
                read: Fd(filedes[0]),
                write: Fd(filedes[1]),
            }),
        }
    }
}
