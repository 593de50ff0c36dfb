//! Decoder for TNEF (`winmail.dat`) attachments.
//!
//! [`decode`] takes the raw bytes of a TNEF stream and recovers the subject,
//! sender, plain-text, HTML and RTF bodies and the attachments it carries.
//! Malformed input is decoded as far as possible; only a buffer that is not
//! TNEF at all is rejected.

pub mod binread;
pub mod codepage;
pub mod error;
pub mod mime;
pub mod rtf;
pub mod tnef;


pub use crate::error::{DecodeError, RtfDecodeError, UnexpectedEnd};
pub use crate::tnef::{decode, Diagnostics, ParseResult, TNEF_SIGNATURE};
pub use crate::tnef::attachment::FinalAttachment;
