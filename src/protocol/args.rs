// Typed argument extraction for command lines
//
// Arguments are whitespace-delimited tokens after the specifier. Arity is
// strict: a command that wants two numbers fails on one or on three.

use std::str::{FromStr, SplitWhitespace};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("missing argument {index}")]
    Missing { index: usize },

    #[error("invalid argument {index}: {token:?}")]
    Invalid { index: usize, token: String },

    #[error("unexpected extra argument {token:?}")]
    Unexpected { token: String },

    #[error("arguments are not valid UTF-8")]
    Encoding,
}

/// Cursor over the argument tail of a command line
pub struct Args<'a> {
    tokens: SplitWhitespace<'a>,
    index: usize,
}

impl<'a> Args<'a> {
    pub fn new(tail: &'a str) -> Self {
        Self {
            tokens: tail.split_whitespace(),
            index: 0,
        }
    }

    /// Build from raw line bytes; non-UTF-8 input can hold no valid numbers
    pub fn from_bytes(tail: &'a [u8]) -> Result<Self, ArgError> {
        std::str::from_utf8(tail)
            .map(Self::new)
            .map_err(|_| ArgError::Encoding)
    }

    /// Parse the next token as `T`
    pub fn parse_next<T: FromStr>(&mut self) -> Result<T, ArgError> {
        let index = self.index;
        self.index += 1;

        let token = self.tokens.next().ok_or(ArgError::Missing { index })?;
        token.parse().map_err(|_| ArgError::Invalid {
            index,
            token: token.to_string(),
        })
    }

    /// Fail if any tokens remain
    pub fn finish(mut self) -> Result<(), ArgError> {
        match self.tokens.next() {
            Some(token) => Err(ArgError::Unexpected {
                token: token.to_string(),
            }),
            None => Ok(()),
        }
    }
}
