//! Error types for the decoder.

use thiserror::Error;


/// A bounds-checked read ran past the end of its buffer.
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
#[error("unexpected end of data at offset {offset} (wanted {wanted} bytes, {available} available)")]
pub struct UnexpectedEnd {
    pub offset: usize,
    pub wanted: usize,
    pub available: usize,
}

/// The only error [`decode`](crate::decode) can return.
///
/// Everything past the signature is decoded on a best-effort basis and
/// reported through [`Diagnostics`](crate::Diagnostics) instead.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum DecodeError {
    #[error("not a recognized container (expected signature 0x{expected:08X}, obtained 0x{obtained:08X})")]
    Signature { expected: u32, obtained: u32 },

    #[error("not a recognized container (only {length} bytes of data)")]
    TooShort { length: usize },
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum RtfDecodeError {
    #[error("header too short (expected {expected} bytes, obtained {obtained})")]
    HeaderTooShort { expected: usize, obtained: usize },

    #[error("unsupported compression 0x{compression_type:08X}")]
    UnsupportedCompression { compression_type: u32 },

    #[error("compressed stream is truncated: {0}")]
    Truncated(#[from] UnexpectedEnd),
}
