//! Positional parameter access for message decoders

use std::str::FromStr;

use crate::error::DecodeError;
use crate::message::Message;

/// Typed, index-based view over a message's parameters
///
/// Callers check `covers` before reading a tier, so indexing past the end is
/// a decoder bug rather than malformed input.
pub(crate) struct Params<'a> {
    code: char,
    params: &'a [String],
}

impl<'a> Params<'a> {
    pub fn new(msg: &'a Message) -> Self {
        Self {
            code: msg.code,
            params: &msg.params,
        }
    }

    /// True when the message carries more than `count` parameters
    pub fn covers(&self, count: usize) -> bool {
        self.params.len() > count
    }

    pub fn text(&self, index: usize) -> String {
        self.params.get(index).cloned().unwrap_or_default()
    }

    pub fn parse<T: FromStr>(&self, index: usize) -> Result<T, DecodeError> {
        let raw = self.params.get(index).map(String::as_str).unwrap_or("");
        raw.trim().parse::<T>().map_err(|_| DecodeError::InvalidNumber {
            code: self.code,
            index,
            value: raw.to_string(),
        })
    }

    pub fn f32(&self, index: usize) -> Result<f32, DecodeError> {
        self.parse(index)
    }

    pub fn f64(&self, index: usize) -> Result<f64, DecodeError> {
        self.parse(index)
    }

    pub fn i32(&self, index: usize) -> Result<i32, DecodeError> {
        self.parse(index)
    }

    pub fn all(&self) -> &'a [String] {
        self.params
    }
}
