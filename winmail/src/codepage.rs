//! Resolution of legacy Windows codepages to text encodings.

use encoding_rs::{
    Encoding, BIG5, EUC_KR, GBK, SHIFT_JIS, UTF_8, WINDOWS_1250, WINDOWS_1251, WINDOWS_1252,
    WINDOWS_1253, WINDOWS_1254, WINDOWS_1255, WINDOWS_1256, WINDOWS_1257, WINDOWS_1258,
};


/// The encoding assumed for 8-bit strings until a codepage attribute says
/// otherwise, and for any codepage not in the table.
#[inline]
pub fn default_encoding() -> &'static Encoding {
    SHIFT_JIS
}

/// Looks up a codepage in the fixed table, returning `None` for codepages the
/// decoder does not know.
pub fn known_encoding(codepage: u32) -> Option<&'static Encoding> {
    let encoding = match codepage {
        932 => SHIFT_JIS,
        936 => GBK,
        949 => EUC_KR,
        950 => BIG5,
        1250 => WINDOWS_1250,
        1251 => WINDOWS_1251,
        1252 => WINDOWS_1252,
        1253 => WINDOWS_1253,
        1254 => WINDOWS_1254,
        1255 => WINDOWS_1255,
        1256 => WINDOWS_1256,
        1257 => WINDOWS_1257,
        1258 => WINDOWS_1258,
        65001 => UTF_8,
        _ => return None,
    };
    Some(encoding)
}

/// Resolves a codepage to an encoding; unknown codepages fall back to
/// [`default_encoding`].
pub fn encoding_for_codepage(codepage: u32) -> &'static Encoding {
    known_encoding(codepage).unwrap_or_else(default_encoding)
}
