use std::env;
use std::error::Error;
use std::ffi::CStr;
use std::fmt;

use libc::{c_char, c_int};

use crate::fd::{errno, errno_message};

#[derive(Debug, PartialEq)]
pub(crate) enum PromptError {
    Syscall(c_int),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self {
            PromptError::Syscall(error_num) => write!(
                f,
                "cannot determine prompt information: {}",
                errno_message(*error_num)
            ),
        }
    }
}

impl Error for PromptError {}

/// The user/host half of the prompt, resolved once at startup. A failed
/// lookup is the one unrecoverable startup error the interpreter has.
pub(crate) struct PromptInfo {
    user: String,
    host: String,
}

impl PromptInfo {
    pub(crate) fn lookup() -> Result<PromptInfo, PromptError> {
        Ok(PromptInfo {
            user: username()?,
            host: hostname()?,
        })
    }

    /// `PS1` wins when set; otherwise `user@host folder % ` with folder the
    /// last component of the working directory, recomputed each line.
    pub(crate) fn render(&self) -> String {
        if let Ok(ps1) = env::var("PS1") {
            return format!("{} % ", ps1);
        }

        let folder = env::current_dir()
            .ok()
            .and_then(|dir| dir.file_name().map(|name| name.to_string_lossy().into_owned()))
            .unwrap_or_else(|| String::from("/"));

        format!("{}@{} {} % ", self.user, self.host, folder)
    }
}

fn hostname() -> Result<String, PromptError> {
    let mut buf = [0 as c_char; 256];

    match unsafe { libc::gethostname(buf.as_mut_ptr(), buf.len()) } {
        -1 => Err(PromptError::Syscall(errno())),
        _ => Ok(unsafe { CStr::from_ptr(buf.as_ptr()) }
            .to_string_lossy()
            .into_owned()),
    }
}

// not exported by the libc crate on Linux
extern "C" {
    fn getlogin_r(name: *mut c_char, namesize: libc::size_t) -> c_int;
}

fn username() -> Result<String, PromptError> {
    let mut buf = [0 as c_char; 256];

    // getlogin_r reports its error number directly instead of via errno
    match unsafe { getlogin_r(buf.as_mut_ptr(), buf.len()) } {
        0 => Ok(unsafe { CStr::from_ptr(buf.as_ptr()) }
            .to_string_lossy()
            .into_owned()),
        error_num => Err(PromptError::Syscall(error_num)),
    }
}

#[cfg(test)]
mod tests {
    use super::PromptInfo;

    #[test]
    fn test_render() {
        let info = PromptInfo {
            user: String::from("user"),
            host: String::from("box"),
        };

        // both forms in one test; PS1 is process-global state
        std::env::set_var("PS1", "msh");
        assert_eq!(info.render(), "msh % ");

        std::env::remove_var("PS1");
        let rendered = info.render();
        assert!(rendered.starts_with("user@box "));
        assert!(rendered.ends_with(" % "));
    }
}
