//! POSIX shell word splitting without a shell.
//!
//! Quotes and backslashes are honoured the way `sh` honours them, but nothing
//! is expanded and no metacharacter (`|`, `>`, `<`, `;`, `&`, `$`, ...) has
//! any special meaning: `a|b` is one word. Only space, tab and newline
//! separate words.

use derive_more::{Display, Error};

#[derive(Debug, Display, Error, PartialEq, Eq)]
/// A command line that can't be split into words.
pub enum SplitError {
    #[display("unterminated single quote")]
    UnterminatedSingleQuote,
    #[display("unterminated double quote")]
    UnterminatedDoubleQuote,
    #[display("trailing backslash")]
    TrailingBackslash,
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    /// Between words.
    Blank,
    Word,
    Single,
    Double,
}

/// Splits `line` into argv words.
pub fn split(line: &str) -> Result<Vec<String>, SplitError> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut state = State::Blank;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match state {
            State::Blank | State::Word => match c {
                ' ' | '\t' | '\n' => {
                    if state == State::Word {
                        words.push(std::mem::take(&mut word));
                        state = State::Blank;
                    }
                }
                '\'' => state = State::Single,
                '"' => state = State::Double,
                '\\' => match chars.next() {
                    // line continuation
                    Some('\n') => {}
                    Some(escaped) => {
                        word.push(escaped);
                        state = State::Word;
                    }
                    None => return Err(SplitError::TrailingBackslash),
                },
                c => {
                    word.push(c);
                    state = State::Word;
                }
            },
            State::Single => match c {
                '\'' => state = State::Word,
                c => word.push(c),
            },
            State::Double => match c {
                '"' => state = State::Word,
                '\\' => match chars.next() {
                    Some('\n') => {}
                    Some(escaped @ ('\\' | '"' | '$' | '`')) => word.push(escaped),
                    Some(other) => {
                        word.push('\\');
                        word.push(other);
                    }
                    None => return Err(SplitError::UnterminatedDoubleQuote),
                },
                c => word.push(c),
            },
        }
    }

    match state {
        State::Single => Err(SplitError::UnterminatedSingleQuote),
        State::Double => Err(SplitError::UnterminatedDoubleQuote),
        State::Word => {
            words.push(word);
            Ok(words)
        }
        State::Blank => Ok(words),
    }
}

/// Quotes `word` so that [split] returns it unchanged as a single word.
pub fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@,+%".contains(c));
    if plain {
        return word.to_string();
    }

    format!("'{}'", word.replace('\'', r"'\''"))
}
