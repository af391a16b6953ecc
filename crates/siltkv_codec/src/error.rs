//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// NaN has no position in the total order and cannot be encoded.
    #[error("NaN values cannot be encoded")]
    NaNForbidden,

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The leading flag byte does not name a known value kind.
    #[error("unknown value flag {flag:#04x}")]
    UnknownFlag {
        /// The offending flag byte.
        flag: u8,
    },

    /// Malformed encoded bytes.
    #[error("invalid encoding: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// Bytes were left over after decoding a single value.
    #[error("{count} trailing bytes after value")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Returns true if this error was raised while encoding.
    #[must_use]
    pub fn is_encode_error(&self) -> bool {
        matches!(self, Self::EncodingFailed { .. } | Self::NaNForbidden)
    }

    /// Returns true if this error was raised while decoding.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        !self.is_encode_error()
    }
}
