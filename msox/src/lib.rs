mod prop_enums;
mod tnef_enums;


use std::fmt;

use from_to_repr::from_to_other;
use uuid::Uuid;

pub use crate::prop_enums::PropTag;
pub use crate::tnef_enums::{TnefAttributeId, TnefAttributeLevel};


/// The type of an Exchange property.
#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = u16, derive_compare = "as_int")]
pub enum PropType {
    Unspecified = 0x0000,
    Null = 0x0001,
    Integer16 = 0x0002,
    Integer32 = 0x0003,
    Floating32 = 0x0004,
    Floating64 = 0x0005,
    Currency = 0x0006,
    FloatingTime = 0x0007,
    ErrorCode = 0x000A,
    Boolean = 0x000B,
    Object = 0x000D,
    Integer64 = 0x0014,
    String8 = 0x001E,
    String = 0x001F,
    Time = 0x0040,
    Guid = 0x0048,
    Binary = 0x0102,
    MultipleInteger16 = 0x1002,
    MultipleInteger32 = 0x1003,
    MultipleString8 = 0x101E,
    MultipleString = 0x101F,
    MultipleTime = 0x1040,
    MultipleBinary = 0x1102,
    Other(u16),
}

/// A decoded property value.
///
/// Only the shapes that carry message metadata are represented; everything
/// else is skipped by the decoders and never reaches this type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum PropValue {
    Integer16(i16),
    Integer32(i32),
    Boolean(bool),
    String8(String),
    String(String),
    Binary(Vec<u8>),
}
impl PropValue {
    /// Returns the textual content of a `String8` or `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String8(s) | Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}

/// The identity of a named property (tag 0x8000 and above).
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NamedPropId {
    pub property_set: Uuid,
    pub name: PropName,
}
impl fmt::Display for NamedPropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            PropName::Number(n) => write!(f, "{{{}}}:0x{:08X}", self.property_set, n),
            PropName::String(s) => write!(f, "{{{}}}:{:?}", self.property_set, s),
        }
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum PropName {
    Number(u32),
    String(String),
}
