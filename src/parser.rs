// https://github.com/Geal/nom/blob/master/doc/choosing_a_combinator.md

use std::error::Error;
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_while, take_while1},
    character::complete::char,
    combinator::{rest, value},
    multi::separated_list0,
    sequence::{delimited, separated_pair},
    IResult,
};

use crate::redirect::{self, RedirectError, Redirection};

#[derive(Debug, PartialEq)]
pub(crate) enum ParseError {
    DanglingRedirection(String),
    EmptyCommand,
    MissingPipelineHalf,
    Redirect(RedirectError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::DanglingRedirection(op) => {
                write!(f, "missing filename after `{}`", op)
            }
            ParseError::EmptyCommand => write!(f, "no command left after redirections"),
            ParseError::MissingPipelineHalf => {
                write!(f, "both sides of `|` need a command")
            }
            ParseError::Redirect(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ParseError {}

/// Splits `line` on runs of `delim`, preserving token order. Returns `None`
/// when the line has no non-delimiter content; a command always has at
/// least a program name, so an empty sequence is never handed out.
pub(crate) fn tokenize(line: &str, delim: char) -> Option<Vec<String>> {
    let is_delim = move |c: char| c == delim;
    let result: IResult<&str, Vec<&str>> = delimited(
        take_while(is_delim),
        separated_list0(take_while1(is_delim), take_till1(is_delim)),
        take_while(is_delim),
    )(line);

    match result {
        Ok((_, tokens)) if !tokens.is_empty() => {
            Some(tokens.into_iter().map(str::to_owned).collect())
        }
        _ => None,
    }
}

/// Prefix match against the operator set. `>>` is tried before `>` so an
/// append never degrades to a truncate; the `alt` order is load-bearing.
pub(crate) fn classify(token: &str) -> Option<Redirection> {
    let result: IResult<&str, Redirection> = alt((
        value(Redirection::OutputAppend, tag(">>")),
        value(Redirection::ErrorTruncate, tag("2>")),
        value(Redirection::CombinedTruncate, tag("&>")),
        value(Redirection::OutputTruncate, tag(">")),
        value(Redirection::Input, tag("<")),
    ))(token);

    result.ok().map(|(_, op)| op)
}

/// First pass over the tokens: collect redirection directives and the
/// residual argument vector without touching the file system. An operator
/// with no following filename token fails the whole scan.
fn scan(tokens: Vec<String>) -> Result<(Vec<String>, Vec<(Redirection, String)>), ParseError> {
    let mut argv = Vec::with_capacity(tokens.len());
    let mut directives = Vec::new();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        match classify(&token) {
            Some(op) => match iter.next() {
                Some(filename) => directives.push((op, filename)),
                None => return Err(ParseError::DanglingRedirection(token)),
            },
            None => argv.push(token),
        }
    }

    Ok((argv, directives))
}

/// Strips redirection directives from `tokens`, applies each one to the
/// current process and returns the residual argument vector. Nothing is
/// opened until the whole token sequence has been validated.
pub(crate) fn parse(tokens: Vec<String>) -> Result<Vec<String>, ParseError> {
    let (argv, directives) = scan(tokens)?;

    if argv.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    for (op, filename) in &directives {
        redirect::apply(filename, *op).map_err(ParseError::Redirect)?;
    }

    Ok(argv)
}

/// Splits the raw line at the first `|` and tokenizes both halves. Both
/// must yield at least one token or the pipeline fails to construct.
pub(crate) fn split_pipeline(line: &str) -> Result<(Vec<String>, Vec<String>), ParseError> {
    let result: IResult<&str, (&str, &str)> =
        separated_pair(take_till1(|c| c == '|'), char('|'), rest)(line);

    match result {
        Ok((_, (left, right))) => {
            let left = tokenize(left, ' ').ok_or(ParseError::MissingPipelineHalf)?;
            let right = tokenize(right, ' ').ok_or(ParseError::MissingPipelineHalf)?;
            Ok((left, right))
        }
        Err(_) => Err(ParseError::MissingPipelineHalf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|word| word.to_string()).collect()
    }

    #[test]
    fn test_tokenize_words() {
        assert_eq!(
            tokenize("ls -l /tmp", ' '),
            Some(strings(&["ls", "-l", "/tmp"]))
        );
    }

    #[test]
    fn test_tokenize_collapses_delimiter_runs() {
        assert_eq!(
            tokenize("  echo   hello world ", ' '),
            Some(strings(&["echo", "hello", "world"]))
        );
    }

    #[test]
    fn test_tokenize_whitespace_only() {
        assert_eq!(tokenize("    ", ' '), None);
        assert_eq!(tokenize("", ' '), None);
    }

    #[test]
    fn test_classify_operators() {
        assert_eq!(classify("<"), Some(Redirection::Input));
        assert_eq!(classify(">"), Some(Redirection::OutputTruncate));
        assert_eq!(classify(">>"), Some(Redirection::OutputAppend));
        assert_eq!(classify("2>"), Some(Redirection::ErrorTruncate));
        assert_eq!(classify("&>"), Some(Redirection::CombinedTruncate));
        assert_eq!(classify("wc"), None);
        assert_eq!(classify("a>b"), None);
    }

    #[test]
    fn test_classify_append_is_not_truncate() {
        // `>>` degrading to `>` silently clobbers files
        assert_ne!(classify(">>"), Some(Redirection::OutputTruncate));
    }

    #[test]
    fn test_scan_identity_without_operators() {
        let tokens = strings(&["ls", "-l", "/tmp"]);
        let (argv, directives) = scan(tokens.clone()).unwrap();
        assert_eq!(argv, tokens);
        assert!(directives.is_empty());
    }

    #[test]
    fn test_scan_strips_directives_anywhere() {
        let (argv, directives) =
            scan(strings(&["sort", "<", "in.txt", "-r", ">", "out.txt"])).unwrap();
        assert_eq!(argv, strings(&["sort", "-r"]));
        assert_eq!(
            directives,
            vec![
                (Redirection::Input, "in.txt".to_string()),
                (Redirection::OutputTruncate, "out.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(
            scan(strings(&["cat", ">"])),
            Err(ParseError::DanglingRedirection(">".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_empty_residual() {
        // validated before any file is opened, so no stream is rebound here
        assert_eq!(
            parse(strings(&["<", "/etc/hostname"])),
            Err(ParseError::EmptyCommand)
        );
    }

    #[test]
    fn test_parse_identity_without_operators() {
        let tokens = strings(&["echo", "hello"]);
        assert_eq!(parse(tokens.clone()), Ok(tokens));
    }

    #[test]
    fn test_split_pipeline() {
        let (left, right) = split_pipeline("echo hello | wc -c").unwrap();
        assert_eq!(left, strings(&["echo", "hello"]));
        assert_eq!(right, strings(&["wc", "-c"]));
    }

    #[test]
    fn test_split_pipeline_missing_half() {
        assert_eq!(
            split_pipeline("| wc -c"),
            Err(ParseError::MissingPipelineHalf)
        );
        assert_eq!(
            split_pipeline("echo hello |"),
            Err(ParseError::MissingPipelineHalf)
        );
        assert_eq!(
            split_pipeline("echo hello |   "),
            Err(ParseError::MissingPipelineHalf)
        );
    }
}
