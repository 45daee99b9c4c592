pub mod execution;
pub mod fd;
pub mod parser;
pub mod prompt;
pub mod redirect;
pub mod sig;

use std::env;
use std::error::Error;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::prompt::PromptInfo;

enum Control {
    Continue,
    Exit,
}

fn main() -> Result<(), Box<dyn Error>> {
    sig::install_sighandler(libc::SIGINT, sig::interrupt_handler)?;
    sig::ignore_signal(libc::SIGQUIT)?;

    let info = PromptInfo::lookup()?;
    let mut editor = DefaultEditor::new()?;

    loop {
        // drop any interrupt left over from the previous line
        sig::take_interrupt();

        match editor.readline(&info.render()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                if let Control::Exit = dispatch(line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    println!("\n[Process Completed]\nshell terminated...\n");
    Ok(())
}

/// One read-eval step: pipelines are split off the raw line, everything
/// else is tokenized, checked against the reserved names and handed to the
/// executor.
fn dispatch(line: &str) -> Control {
    if line.contains('|') {
        if let Err(err) = execution::run_pipeline(line) {
            eprintln!("{}", err);
        }
        return Control::Continue;
    }

    let tokens = match parser::tokenize(line, ' ') {
        Some(tokens) => tokens,
        None => return Control::Continue,
    };

    match tokens[0].as_str() {
        "exit" => Control::Exit,
        "cd" => {
            // `cd` alone goes up one level
            let target = tokens.get(1).map(String::as_str).unwrap_or("..");
            if let Err(err) = env::set_current_dir(target) {
                eprintln!("cd: {}: {}", target, err);
            }
            Control::Continue
        }
        _ => {
            if let Err(err) = execution::run_command(tokens) {
                eprintln!("{}", err);
            }
            Control::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch, Control};

    #[test]
    fn test_cd_builtin() {
        let before = std::env::current_dir().unwrap();
        let target = std::env::temp_dir().canonicalize().unwrap();

        assert!(matches!(
            dispatch(&format!("cd {}", target.display())),
            Control::Continue
        ));
        assert_eq!(std::env::current_dir().unwrap(), target);

        // no argument goes up one level
        dispatch("cd");
        assert_eq!(
            std::env::current_dir().unwrap(),
            target.parent().unwrap()
        );

        std::env::set_current_dir(before).unwrap();
    }

    #[test]
    fn test_exit_is_reserved() {
        assert!(matches!(dispatch("exit"), Control::Exit));
    }
}
