use encoding_rs::{Encoding, UTF_16LE};

use crate::error::UnexpectedEnd;


macro_rules! impl_read {
    ($func_name:ident, $type:ty, $byte_count:expr, $from_bytes_func_name:ident) => {
        pub fn $func_name(&mut self) -> Result<$type, UnexpectedEnd> {
            let mut buf = [0u8; $byte_count];
            buf.copy_from_slice(self.read_slice($byte_count)?);
            Ok(<$type>::$from_bytes_func_name(buf))
        }
    };
}
macro_rules! impl_read_le_be {
    ($le_func_name:ident, $be_func_name:ident, $type:ty, $byte_count:expr) => {
        impl_read!($le_func_name, $type, $byte_count, from_le_bytes);
        impl_read!($be_func_name, $type, $byte_count, from_be_bytes);
    };
}


/// Rounds `n` up to the next multiple of 4, or `None` if that does not fit
/// in a `usize`.
#[inline]
pub const fn pad4(n: usize) -> Option<usize> {
    n.checked_next_multiple_of(4)
}


/// A sequential reader over an in-memory buffer.
///
/// Reads never move the offset past the end of the buffer; a read that would
/// do so fails without consuming anything.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    offset: usize,
}
impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Borrows the next `count` bytes and advances past them.
    pub fn read_slice(&mut self, count: usize) -> Result<&'a [u8], UnexpectedEnd> {
        if count > self.remaining() {
            return Err(UnexpectedEnd {
                offset: self.offset,
                wanted: count,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    /// Copies the next `count` bytes and advances past them.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, UnexpectedEnd> {
        self.read_slice(count).map(|s| s.to_vec())
    }

    /// Advances by up to `count` bytes, stopping at the end of the buffer.
    ///
    /// Returns the number of bytes actually skipped.
    pub fn skip(&mut self, count: usize) -> usize {
        let skipped = count.min(self.remaining());
        self.offset += skipped;
        skipped
    }

    /// Skips the padding that follows a value of `value_length` bytes.
    pub fn skip_padding(&mut self, value_length: usize) -> usize {
        match pad4(value_length) {
            Some(padded) => self.skip(padded - value_length),
            None => self.skip(self.remaining()),
        }
    }

    impl_read!(read_u8, u8, 1, from_le_bytes);
    impl_read_le_be!(read_u16_le, read_u16_be, u16, 2);
    impl_read_le_be!(read_u32_le, read_u32_be, u32, 4);
    impl_read!(read_i16_le, i16, 2, from_le_bytes);
    impl_read!(read_i32_le, i32, 4, from_le_bytes);
}


/// Decodes a NUL-terminated 8-bit string in the given legacy encoding.
///
/// Everything from the first NUL byte onward is ignored.
pub fn decode_ansi(bytes: &[u8], encoding: &'static Encoding) -> String {
    let terminated = match bytes.iter().position(|&b| b == 0x00) {
        Some(nul) => &bytes[..nul],
        None => bytes,
    };
    let (cow_string, _bad_sequences) = encoding.decode_with_bom_removal(terminated);
    cow_string.into_owned()
}

/// Decodes a UTF-16LE string, dropping one trailing NUL character if present.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let unterminated = bytes.strip_suffix(&[0x00, 0x00]).unwrap_or(bytes);
    let (cow_string, _bad_sequences) = UTF_16LE.decode_without_bom_handling(unterminated);
    cow_string.into_owned()
}
