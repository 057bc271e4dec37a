//! Error model for the strict conversion path.
//!
//! Formatting itself never fails. Errors only come from the built-in
//! tokenizer when the caller asks for strict parsing.

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Processing phase where an error originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorPhase {
    /// Markup tokenization.
    Tokenize,
    /// Entity or text decoding.
    Decode,
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorPhase::Tokenize => "tokenize",
            ErrorPhase::Decode => "decode",
        })
    }
}

/// Structured conversion error with a stable code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertError {
    /// Processing phase where this error originated.
    pub phase: ErrorPhase,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
    /// Byte offset into the input, when known.
    pub token_offset: Option<usize>,
    /// Optional source context (tag name, entity).
    pub source: Option<Box<str>>,
}

impl ConvertError {
    pub const TOKENIZE_SYNTAX_ERROR: &'static str = "TOKENIZE_SYNTAX_ERROR";
    pub const TOKENIZE_DECODE_ERROR: &'static str = "TOKENIZE_DECODE_ERROR";

    pub fn new(phase: ErrorPhase, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            phase,
            code,
            message: message.into().into_boxed_str(),
            token_offset: None,
            source: None,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorPhase::Tokenize, Self::TOKENIZE_SYNTAX_ERROR, message)
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorPhase::Decode, Self::TOKENIZE_DECODE_ERROR, message)
    }

    pub fn with_token_offset(mut self, token_offset: usize) -> Self {
        self.token_offset = Some(token_offset);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into().into_boxed_str());
        self
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.phase, self.code, self.message)?;
        if let Some(source) = self.source.as_deref() {
            write!(f, " [source={}]", source)?;
        }
        if let Some(token_offset) = self.token_offset {
            write!(f, " [token_offset={}]", token_offset)?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConvertError {}
