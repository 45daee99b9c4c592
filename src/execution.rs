use std::error::Error;
use std::ffi::CString;
use std::fmt;
use std::ptr::{null, null_mut};

use libc::{c_char, c_int, pid_t, STDIN_FILENO, STDOUT_FILENO};

use crate::fd::{errno, errno_message, Pipe};
use crate::parser::{self, ParseError};

#[derive(Debug)]
pub(crate) enum ExecutionError {
    Syscall(c_int),
    Pipeline(ParseError),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::Syscall(error_num) => write!(f, "{}", errno_message(*error_num)),
            ExecutionError::Pipeline(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ExecutionError {}

/// Reaps one child, riding out interrupts delivered to the parent while it
/// blocks.
fn wait_child(pid: pid_t) {
    loop {
        match unsafe { libc::waitpid(pid, null_mut(), 0) } {
            -1 if errno() == libc::EINTR => continue,
            _ => break,
        }
    }
}

/// Replaces the current process image with `argv[0]`, resolved through
/// PATH. Only ever returns when the exec itself failed.
fn exec_program(argv: &[String]) -> ExecutionError {
    let args = match argv
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(args) => args,
        Err(_) => return ExecutionError::Syscall(libc::EINVAL),
    };

    let mut arg_ptrs: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
    arg_ptrs.push(null());

    unsafe { libc::execvp(arg_ptrs[0], arg_ptrs.as_ptr()) };
    ExecutionError::Syscall(errno())
}

/// Runs one possibly-redirected command as a foreground child and blocks
/// until it exits. Redirections are parsed and applied in the child, so a
/// failed parse never disturbs the interpreter's own streams.
pub(crate) fn run_command(tokens: Vec<String>) -> Result<(), ExecutionError> {
    match unsafe { libc::fork() } {
        -1 => Err(ExecutionError::Syscall(errno())),
        0 => match parser::parse(tokens) {
            Ok(argv) => {
                let err = exec_program(&argv);
                eprintln!("{}: {}", argv[0], err);
                unsafe { libc::_exit(127) }
            }
            Err(err) => {
                eprintln!("{}", err);
                unsafe { libc::_exit(1) }
            }
        },
        pid => {
            wait_child(pid);
            Ok(())
        }
    }
}

/// Runs `left | right`: one anonymous pipe, two children, each rebinding
/// its end and closing both before exec. The parent drops its copies of
/// both ends before waiting, otherwise the reader never sees end-of-stream.
pub(crate) fn run_pipeline(line: &str) -> Result<(), ExecutionError> {
    let (left, right) = parser::split_pipeline(line).map_err(ExecutionError::Pipeline)?;

    let pipe = Pipe::new().map_err(ExecutionError::Syscall)?;

    let first = match unsafe { libc::fork() } {
        -1 => return Err(ExecutionError::Syscall(errno())),
        0 => {
            if let Err(error_num) = pipe.write.dup_to(STDOUT_FILENO) {
                eprintln!("{}", errno_message(error_num));
                unsafe { libc::_exit(1) }
            }
            drop(pipe);
            let err = exec_program(&left);
            eprintln!("{}: {}", left[0], err);
            unsafe { libc::_exit(127) }
        }
        pid => pid,
    };

    let second = match unsafe { libc::fork() } {
        -1 => {
            // the half-built pipeline still has to be torn down
            let error_num = errno();
            drop(pipe);
            wait_child(first);
            return Err(ExecutionError::Syscall(error_num));
        }
        0 => {
            if let Err(error_num) = pipe.read.dup_to(STDIN_FILENO) {
                eprintln!("{}", errno_message(error_num));
                unsafe { libc::_exit(1) }
            }
            drop(pipe);
            let err = exec_program(&right);
            eprintln!("{}: {}", right[0], err);
            unsafe { libc::_exit(127) }
        }
        pid => pid,
    };

    drop(pipe);
    wait_child(first);
    wait_child(second);

    Ok(())
}
