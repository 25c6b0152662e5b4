/// Error returned when an argument string cannot be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgSplitError {
    #[error("Unterminated {quote} quote in argument string '{input}'")]
    UnterminatedQuote { quote: &'static str, input: String },
    #[error("Trailing escape character in argument string '{input}'")]
    TrailingEscape { input: String },
}

/// Shell-style argument tokenization.
pub struct ArgUtil;

impl ArgUtil {
    /// Split `input` into an argument vector the way a POSIX shell would,
    /// without any expansion.
    ///
    /// Whitespace separates arguments. Single quotes preserve everything
    /// literally. Inside double quotes a backslash only escapes `"`, `\`,
    /// `$`, `` ` `` and newline. Outside quotes a backslash escapes any
    /// character. Adjacent quoted and unquoted pieces join into one
    /// argument, and `''` yields an empty argument.
    pub fn split(input: &str) -> Result<Vec<String>, ArgSplitError> {
        let mut args = Vec::new();
        let mut current = String::new();
        let mut in_token = false;
        let mut chars = input.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '\'' => {
                    in_token = true;
                    loop {
                        match chars.next() {
                            Some('\'') => break,
                            Some(c) => current.push(c),
                            None => {
                                return Err(ArgSplitError::UnterminatedQuote {
                                    quote: "single",
                                    input: input.to_string(),
                                })
                            }
                        }
                    }
                }
                '"' => {
                    in_token = true;
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some('\\') => match chars.peek() {
                                Some(&next) if matches!(next, '"' | '\\' | '$' | '`') => {
                                    current.push(next);
                                    chars.next();
                                }
                                Some('\n') => {
                                    chars.next();
                                }
                                _ => current.push('\\'),
                            },
                            Some(c) => current.push(c),
                            None => {
                                return Err(ArgSplitError::UnterminatedQuote {
                                    quote: "double",
                                    input: input.to_string(),
                                })
                            }
                        }
                    }
                }
                '\\' => match chars.next() {
                    // Escaped newline is a line continuation.
                    Some('\n') => {}
                    Some(c) => {
                        in_token = true;
                        current.push(c);
                    }
                    None => {
                        return Err(ArgSplitError::TrailingEscape {
                            input: input.to_string(),
                        })
                    }
                },
                c if c.is_whitespace() => {
                    if in_token {
                        args.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    in_token = true;
                    current.push(c);
                }
            }
        }

        if in_token {
            args.push(current);
        }

        Ok(args)
    }
}
