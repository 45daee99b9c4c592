// https://github.com/vorner/signal-hook/blob/master/signal-hook-registry/src/lib.rs

use std::error::Error;
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr::null_mut;
use std::sync::atomic::{AtomicBool, Ordering};

use libc::{c_int, c_void, sigaction, sighandler_t, siginfo_t, sigset_t};

use crate::fd::{errno, errno_message};

#[derive(Debug, PartialEq)]
pub(crate) enum SigError {
    Syscall(c_int),
}

impl fmt::Display for SigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self {
            SigError::Syscall(error_num) => write!(f, "{}", errno_message(*error_num)),
        }
    }
}

impl Error for SigError {}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// SIGINT handler: note the interrupt and put the cursor back on a fresh
/// line. Only async-signal-safe calls are allowed in here, which rules out
/// flushing Rust's buffered stdout; the raw `write` is all we need.
pub(crate) extern "C" fn interrupt_handler(sig: c_int, _info: *mut siginfo_t, _gdata: *mut c_void) {
    if sig == libc::SIGINT {
        INTERRUPTED.store(true, Ordering::SeqCst);
        unsafe { libc::write(libc::STDOUT_FILENO, b"\n".as_ptr() as *const c_void, 1) };
    }
}

/// Consumes the pending interrupt, if any. Called at the top of each
/// read-eval iteration so a stale interrupt never outlives the line it
/// cancelled.
pub(crate) fn take_interrupt() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

/// SA_RESTART keeps `waitpid` from being torn out from under the parent
/// while a foreground child runs.
pub(crate) fn install_sighandler(
    signum: c_int,
    handler: extern "C" fn(c_int, *mut siginfo_t, *mut c_void),
) -> Result<(), SigError> {
    let sa: sigaction = sigaction {
        sa_flags: libc::SA_RESTART | libc::SA_SIGINFO,
        sa_sigaction: handler as sighandler_t,
        sa_mask: unsafe { MaybeUninit::<sigset_t>::zeroed().assume_init() },
        sa_restorer: None,
    };

    match unsafe { libc::sigaction(signum, &sa, null_mut()) } {
        -1 => Err(SigError::Syscall(errno())),
        _ => Ok(()),
    }
}

/// The interpreter must never die to SIGQUIT, so it is ignored outright
/// rather than handled.
pub(crate) fn ignore_signal(signum: c_int) -> Result<(), SigError> {
    let sa: sigaction = sigaction {
        sa_flags: 0,
        sa_sigaction: libc::SIG_IGN,
        sa_mask: unsafe { MaybeUninit::<sigset_t>::zeroed().assume_init() },
        sa_restorer: None,
    };

    match unsafe { libc::sigaction(signum, &sa, null_mut()) } {
        -1 => Err(SigError::Syscall(errno())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;
    use std::sync::Mutex;

    lazy_static! {
        static ref signal_lock: Mutex<()> = Mutex::new(());
    }

    #[test]
    fn test_install_sighandler() {
        let _guard = signal_lock.lock().unwrap();

        assert_eq!(
            super::install_sighandler(libc::SIGINT, super::interrupt_handler),
            Ok(())
        );
    }

    #[test]
    fn test_interrupt_sets_flag_once() {
        let _guard = signal_lock.lock().unwrap();

        super::install_sighandler(libc::SIGINT, super::interrupt_handler).unwrap();
        super::take_interrupt();

        unsafe { libc::raise(libc::SIGINT) };

        assert!(super::take_interrupt());
        assert!(!super::take_interrupt());
    }

    #[test]
    fn test_sigquit_is_ignored() {
        let _guard = signal_lock.lock().unwrap();

        super::ignore_signal(libc::SIGQUIT).unwrap();

        // would kill the test process under the default disposition
        unsafe { libc::raise(libc::SIGQUIT) };
    }
}
