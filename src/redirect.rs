use std::error::Error;
use std::ffi::CString;
use std::fmt;

use libc::{
    c_int, mode_t, O_APPEND, O_CREAT, O_RDONLY, O_TRUNC, O_WRONLY, STDERR_FILENO, STDIN_FILENO,
    STDOUT_FILENO,
};

use crate::fd::{errno_message, Fd};

/// How a standard stream should be rebound to a file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Redirection {
    Input,
    OutputTruncate,
    OutputAppend,
    ErrorTruncate,
    CombinedTruncate,
}

#[derive(Debug, PartialEq)]
pub(crate) enum RedirectError {
    Open(c_int),
    Rebind(c_int),
    BadFilename,
}

impl fmt::Display for RedirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectError::Open(error_num) => {
                write!(f, "cannot open file: {}", errno_message(*error_num))
            }
            RedirectError::Rebind(error_num) => {
                write!(f, "cannot rebind stream: {}", errno_message(*error_num))
            }
            RedirectError::BadFilename => write!(f, "filename contains a nul byte"),
        }
    }
}

impl Error for RedirectError {}

const CREATE_MODE: mode_t = 0o644;

impl Redirection {
    fn open_flags(self) -> c_int {
        match self {
            Redirection::Input => O_RDONLY,
            Redirection::OutputAppend => O_WRONLY | O_CREAT | O_APPEND,
            Redirection::OutputTruncate
            | Redirection::ErrorTruncate
            | Redirection::CombinedTruncate => O_WRONLY | O_CREAT | O_TRUNC,
        }
    }

    fn targets(self) -> (c_int, Option<c_int>) {
        match self {
            Redirection::Input => (STDIN_FILENO, None),
            Redirection::OutputTruncate | Redirection::OutputAppend => (STDOUT_FILENO, None),
            Redirection::ErrorTruncate => (STDERR_FILENO, None),
            Redirection::CombinedTruncate => (STDOUT_FILENO, Some(STDERR_FILENO)),
        }
    }
}

/// Opens `filename` per the operator and rebinds the target stream(s) to it
/// in the current process, affecting everything executed afterwards,
/// including an exec'd program. The opened descriptor is released before
/// returning.
pub(crate) fn apply(filename: &str, op: Redirection) -> Result<(), RedirectError> {
    let path = CString::new(filename).map_err(|_| RedirectError::BadFilename)?;
    let fd = Fd::open(&path, op.open_flags(), CREATE_MODE).map_err(RedirectError::Open)?;

    let (first, second) = op.targets();
    fd.dup_to(first).map_err(RedirectError::Rebind)?;
    if let Some(target) = second {
        fd.dup_to(target).map_err(RedirectError::Rebind)?;
    }

    Ok(())
}
