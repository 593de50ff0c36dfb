//! Decoding of MAPI property blocks (`attMsgProps` and `attAttachment`).
//!
//! A block is a 32-bit property count followed by that many properties, each
//! consisting of a 16-bit type, a 16-bit tag, an optional named-property
//! header and a value whose encoding depends on the type. Every value is
//! padded to a multiple of 4 bytes.
//!
//! Decoding never fails as a whole. Properties that carry no usable value are
//! listed in [`PropertyBlock::skipped`]; when the decoder can no longer trust
//! its position in the block it stops and says why in [`PropertyBlock::stop`].

use encoding_rs::Encoding;
use log::{debug, warn};
use msox::{NamedPropId, PropName, PropTag, PropType, PropValue};
use uuid::Uuid;

use crate::binread::{decode_ansi, decode_utf16le, pad4, ByteCursor};
use crate::error::UnexpectedEnd;


/// Properties with fewer bytes than this left in the block are not attempted.
const MIN_PROPERTY_LENGTH: usize = 5;


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Property {
    pub prop_type: PropType,
    pub tag: PropTag,
    pub name: Option<NamedPropId>,
    pub value: PropValue,
}

/// A property that was read (or stepped over) without producing a value.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SkippedProperty {
    /// Offset of the property within its block.
    pub offset: usize,
    pub prop_type: PropType,
    pub tag: PropTag,
    pub name: Option<NamedPropId>,
    pub reason: SkipReason,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SkipReason {
    /// A timestamp; read past but not needed.
    Discarded,

    /// A single-valued string or binary type declaring a value count other
    /// than 1.
    UnexpectedValueCount { count: u32 },

    /// A multi-valued string or binary type.
    MultiValued { count: u32 },

    /// A type whose encoding the decoder does not know.
    UnsupportedType,
}

/// Why a block was not decoded to the end of its declared property count.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum BlockStop {
    /// The block ended before the declared number of properties was read.
    OutOfData { decoded: u32, declared: u32 },

    /// A skipped property left the position of the next property uncertain.
    Ambiguous { offset: usize, prop_type: PropType, tag: PropTag },

    /// A read inside a property ran past the end of the block.
    Truncated(UnexpectedEnd),
}

/// The outcome of decoding one property block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PropertyBlock {
    pub properties: Vec<Property>,
    pub skipped: Vec<SkippedProperty>,
    pub stop: Option<BlockStop>,
}
impl PropertyBlock {
    /// Returns the first property with the given tag.
    pub fn get(&self, tag: PropTag) -> Option<&Property> {
        self.properties.iter().find(|p| p.tag == tag)
    }
}


enum Decoded {
    Value(Property),
    Skipped { skipped: SkippedProperty, exact: bool },
}


fn read_named_prop_id(cursor: &mut ByteCursor<'_>) -> Result<NamedPropId, UnexpectedEnd> {
    let mut guid_buf = [0u8; 16];
    guid_buf.copy_from_slice(cursor.read_slice(16)?);
    let property_set = Uuid::from_bytes_le(guid_buf);

    let kind = cursor.read_u32_le()?;
    let name = if kind == 0 {
        PropName::Number(cursor.read_u32_le()?)
    } else {
        let length_bytes = cursor.read_u32_le()?;
        let length = usize::try_from(length_bytes).unwrap_or(usize::MAX);
        let name_bytes = cursor.read_slice(length)?;
        cursor.skip_padding(length);
        PropName::String(decode_utf16le(name_bytes))
    };

    Ok(NamedPropId {
        property_set,
        name,
    })
}

/// Steps over `count` length-prefixed, padded values.
///
/// Returns `false` if the block ended before all of them were passed.
fn skip_values(cursor: &mut ByteCursor<'_>, count: u32) -> bool {
    for _ in 0..count {
        let byte_count = match cursor.read_u32_le() {
            Ok(bc) => usize::try_from(bc).unwrap_or(usize::MAX),
            Err(_) => return false,
        };
        let padded = match pad4(byte_count) {
            Some(p) => p,
            None => return false,
        };
        if cursor.skip(padded) != padded {
            return false;
        }
    }
    true
}

fn decode_property(cursor: &mut ByteCursor<'_>, encoding: &'static Encoding) -> Result<Decoded, UnexpectedEnd> {
    let offset = cursor.offset();

    let prop_type_u16 = cursor.read_u16_le()?;
    let prop_type = PropType::from_base_type(prop_type_u16);
    let prop_tag_u16 = cursor.read_u16_le()?;
    let tag = PropTag::from_base_type(prop_tag_u16);
    debug!("property at {}: type {:?}, tag {:?}", offset, prop_type, tag);

    let name = if prop_tag_u16 >= 0x8000 {
        let id = read_named_prop_id(cursor)?;
        debug!("named property {}", id);
        Some(id)
    } else {
        None
    };

    let skipped = |reason, name| SkippedProperty { offset, prop_type, tag, name, reason };

    let value = match prop_type {
        PropType::Integer16 => {
            let val = cursor.read_i16_le()?;
            cursor.skip_padding(2);
            PropValue::Integer16(val)
        },
        PropType::Integer32 => PropValue::Integer32(cursor.read_i32_le()?),
        PropType::Boolean => PropValue::Boolean(cursor.read_u32_le()? != 0),
        PropType::Time => {
            let exact = cursor.skip(8) == 8;
            return Ok(Decoded::Skipped { skipped: skipped(SkipReason::Discarded, name), exact });
        },
        PropType::String8|PropType::String|PropType::Binary => {
            let value_count = cursor.read_u32_le()?;
            if value_count != 1 {
                debug!("{} values for single-valued {:?}; skipping", value_count, prop_type);
                let exact = skip_values(cursor, value_count);
                let reason = SkipReason::UnexpectedValueCount { count: value_count };
                return Ok(Decoded::Skipped { skipped: skipped(reason, name), exact });
            }

            let byte_count_u32 = cursor.read_u32_le()?;
            let byte_count = usize::try_from(byte_count_u32).unwrap_or(usize::MAX);
            let bytes = cursor.read_slice(byte_count)?;

            // possible padding
            cursor.skip_padding(byte_count);

            match prop_type {
                PropType::String8 => PropValue::String8(decode_ansi(bytes, encoding)),
                PropType::String => PropValue::String(decode_utf16le(bytes)),
                _ => PropValue::Binary(bytes.to_vec()),
            }
        },
        PropType::MultipleString8|PropType::MultipleString|PropType::MultipleBinary => {
            let value_count = cursor.read_u32_le()?;
            let exact = skip_values(cursor, value_count);
            let reason = SkipReason::MultiValued { count: value_count };
            return Ok(Decoded::Skipped { skipped: skipped(reason, name), exact });
        },
        _ => {
            // the real length is unknown; this is a guess
            cursor.skip(4);
            return Ok(Decoded::Skipped { skipped: skipped(SkipReason::UnsupportedType, name), exact: false });
        },
    };

    Ok(Decoded::Value(Property {
        prop_type,
        tag,
        name,
        value,
    }))
}

/// Decodes a property block, keeping everything that could be decoded.
pub fn decode_properties(data: &[u8], encoding: &'static Encoding) -> PropertyBlock {
    let mut block = PropertyBlock::default();
    let mut cursor = ByteCursor::new(data);

    let declared = match cursor.read_u32_le() {
        Ok(pc) => pc,
        Err(e) => {
            warn!("property block too short for a property count: {}", e);
            block.stop = Some(BlockStop::Truncated(e));
            return block;
        },
    };
    debug!("prop count: {}", declared);

    for index in 0..declared {
        if cursor.remaining() < MIN_PROPERTY_LENGTH {
            debug!("property block ended after {} of {} properties", index, declared);
            block.stop = Some(BlockStop::OutOfData { decoded: index, declared });
            break;
        }

        match decode_property(&mut cursor, encoding) {
            Ok(Decoded::Value(property)) => {
                block.properties.push(property);
            },
            Ok(Decoded::Skipped { skipped, exact }) => {
                let stop = if exact {
                    None
                } else {
                    warn!(
                        "lost alignment after {:?} property {:?} at offset {}; abandoning block",
                        skipped.prop_type, skipped.tag, skipped.offset,
                    );
                    Some(BlockStop::Ambiguous { offset: skipped.offset, prop_type: skipped.prop_type, tag: skipped.tag })
                };
                block.skipped.push(skipped);
                if stop.is_some() {
                    block.stop = stop;
                    break;
                }
            },
            Err(e) => {
                warn!("property block truncated: {}", e);
                block.stop = Some(BlockStop::Truncated(e));
                break;
            },
        }
    }

    block
}


/// Message fields recovered from an `attMsgProps` block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MessageProps {
    pub subject: Option<String>,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub body: Option<String>,
    pub body_html: Option<String>,
    pub rtf_compressed: Option<Vec<u8>>,
}
impl MessageProps {
    pub fn from_block(block: &PropertyBlock) -> Self {
        let mut props = Self::default();
        for property in &block.properties {
            if property.name.is_some() {
                continue;
            }
            match property.tag {
                PropTag::TagSubject => set_text(&mut props.subject, &property.value),
                PropTag::TagSenderName|PropTag::TagSentRepresentingName => {
                    if props.sender_name.is_none() {
                        set_text(&mut props.sender_name, &property.value);
                    }
                },
                PropTag::TagSenderEmailAddress|PropTag::TagSentRepresentingEmailAddress => {
                    if props.sender_email.is_none() {
                        set_text(&mut props.sender_email, &property.value);
                    }
                },
                PropTag::TagBody => set_text(&mut props.body, &property.value),
                PropTag::TagBodyHtml => {
                    let html = match &property.value {
                        PropValue::Binary(bytes) => Some(String::from_utf8_lossy(bytes).trim_end_matches('\0').to_owned()),
                        other => other.as_str().map(|s| s.to_owned()),
                    };
                    if let Some(h) = html.filter(|h| !h.is_empty()) {
                        props.body_html = Some(h);
                    }
                },
                PropTag::TagRtfCompressed => {
                    if let PropValue::Binary(bytes) = &property.value {
                        props.rtf_compressed = Some(bytes.clone());
                    }
                },
                _ => {},
            }
        }
        props
    }

    /// Combines sender name and address as `Name <address>`, or returns
    /// whichever of the two is known.
    pub fn sender(&self) -> Option<String> {
        match (&self.sender_name, &self.sender_email) {
            (Some(name), Some(email)) => Some(format!("{} <{}>", name, email)),
            (Some(name), None) => Some(name.clone()),
            (None, Some(email)) => Some(email.clone()),
            (None, None) => None,
        }
    }
}

/// Attachment fields recovered from an `attAttachment` block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttachmentProps {
    pub filename: Option<String>,
    pub long_filename: Option<String>,
    pub display_name: Option<String>,
    pub mime_tag: Option<String>,
    pub extension: Option<String>,
    pub content_id: Option<String>,
    pub data: Option<Vec<u8>>,
}
impl AttachmentProps {
    pub fn from_block(block: &PropertyBlock) -> Self {
        let mut props = Self::default();
        for property in &block.properties {
            if property.name.is_some() {
                continue;
            }
            match property.tag {
                PropTag::TagAttachFilename => set_text(&mut props.filename, &property.value),
                PropTag::TagAttachLongFilename => set_text(&mut props.long_filename, &property.value),
                PropTag::TagDisplayName => set_text(&mut props.display_name, &property.value),
                PropTag::TagAttachMimeTag => set_text(&mut props.mime_tag, &property.value),
                PropTag::TagAttachExtension => set_text(&mut props.extension, &property.value),
                PropTag::TagAttachContentId => set_text(&mut props.content_id, &property.value),
                PropTag::TagAttachDataBinary => {
                    if let Some(bytes) = property.value.as_bytes().filter(|b| !b.is_empty()) {
                        props.data = Some(bytes.to_vec());
                    }
                },
                _ => {},
            }
        }
        props
    }
}

fn set_text(slot: &mut Option<String>, value: &PropValue) {
    if let Some(text) = value.as_str().filter(|t| !t.is_empty()) {
        *slot = Some(text.to_owned());
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    fn push_u16(buf: &mut Vec<u8>, value: u16) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    fn push_counted(buf: &mut Vec<u8>, bytes: &[u8]) {
        push_u32(buf, 1);
        push_u32(buf, bytes.len() as u32);
        buf.extend_from_slice(bytes);
        buf.resize(pad4(buf.len()).unwrap(), 0);
    }

    fn utf16(text: &str) -> Vec<u8> {
        let mut bytes: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        bytes.extend_from_slice(&[0, 0]);
        bytes
    }

    #[test]
    fn test_scalar_types() {
        let mut data = Vec::new();
        push_u32(&mut data, 5);
        push_u16(&mut data, 0x0002);
        push_u16(&mut data, 0x4000);
        push_u16(&mut data, 0xFFFE);
        push_u16(&mut data, 0xAAAA); // padding
        push_u16(&mut data, 0x0003);
        push_u16(&mut data, 0x0E07);
        push_u32(&mut data, 0x0000_0011);
        push_u16(&mut data, 0x000B);
        push_u16(&mut data, 0x4001);
        push_u32(&mut data, 1);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0037);
        push_counted(&mut data, b"Hello\0");
        push_u16(&mut data, 0x0102);
        push_u16(&mut data, 0x3701);
        push_counted(&mut data, &[1, 2, 3]);

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.stop, None);
        assert!(block.skipped.is_empty());
        let values: Vec<&PropValue> = block.properties.iter().map(|p| &p.value).collect();
        assert_eq!(values, vec![
            &PropValue::Integer16(-2),
            &PropValue::Integer32(0x11),
            &PropValue::Boolean(true),
            &PropValue::String8("Hello".to_owned()),
            &PropValue::Binary(vec![1, 2, 3]),
        ]);
        assert_eq!(block.properties[1].tag, PropTag::TagMessageFlags);
        assert_eq!(block.get(PropTag::TagSubject).map(|p| &p.value), Some(&PropValue::String8("Hello".to_owned())));
    }

    #[test]
    fn test_unicode_string() {
        let mut data = Vec::new();
        push_u32(&mut data, 1);
        push_u16(&mut data, 0x001F);
        push_u16(&mut data, 0x0037);
        push_counted(&mut data, &utf16("Gr\u{FC}\u{DF}e"));

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.properties.len(), 1);
        assert_eq!(block.properties[0].value, PropValue::String("Gr\u{FC}\u{DF}e".to_owned()));
    }

    #[test]
    fn test_time_is_discarded_and_decoding_continues() {
        let mut data = Vec::new();
        push_u32(&mut data, 2);
        push_u16(&mut data, 0x0040);
        push_u16(&mut data, 0x0039);
        data.extend_from_slice(&[0x11; 8]);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0037);
        push_counted(&mut data, b"after\0");

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.stop, None);
        assert_eq!(block.skipped.len(), 1);
        assert_eq!(block.skipped[0].reason, SkipReason::Discarded);
        assert_eq!(block.skipped[0].tag, PropTag::TagClientSubmitTime);
        assert_eq!(block.properties[0].value, PropValue::String8("after".to_owned()));
    }

    #[test]
    fn test_named_property_with_numeric_id() {
        let mut data = Vec::new();
        push_u32(&mut data, 1);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x8001);
        data.extend_from_slice(&[0xAB; 16]);
        push_u32(&mut data, 0);
        push_u32(&mut data, 0x8554);
        let value_offset = data.len();
        push_counted(&mut data, b"X\0");

        assert_eq!(value_offset, 4 + 4 + 24);
        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.stop, None);
        assert_eq!(block.properties.len(), 1);
        let property = &block.properties[0];
        assert_eq!(property.value, PropValue::String8("X".to_owned()));
        assert_eq!(property.name.as_ref().map(|n| &n.name), Some(&PropName::Number(0x8554)));
        assert_eq!(property.name.as_ref().map(|n| n.property_set), Some(Uuid::from_bytes_le([0xAB; 16])));
    }

    #[test]
    fn test_named_property_with_string_id() {
        let name = utf16("Keywords");
        let mut data = Vec::new();
        push_u32(&mut data, 1);
        push_u16(&mut data, 0x0003);
        push_u16(&mut data, 0x8002);
        data.extend_from_slice(&[0u8; 16]);
        push_u32(&mut data, 1);
        push_u32(&mut data, name.len() as u32);
        data.extend_from_slice(&name);
        data.resize(pad4(data.len()).unwrap(), 0);
        push_u32(&mut data, 42);

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.stop, None);
        assert_eq!(block.properties[0].value, PropValue::Integer32(42));
        assert_eq!(
            block.properties[0].name.as_ref().map(|n| &n.name),
            Some(&PropName::String("Keywords".to_owned())),
        );
    }

    #[test]
    fn test_named_property_is_not_routed() {
        let mut data = Vec::new();
        push_u32(&mut data, 1);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x8037);
        data.extend_from_slice(&[0u8; 16]);
        push_u32(&mut data, 0);
        push_u32(&mut data, 0x0037);
        push_counted(&mut data, b"named\0");

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.properties.len(), 1);
        assert_eq!(MessageProps::from_block(&block).subject, None);
    }

    #[test]
    fn test_value_count_zero_is_skipped_exactly() {
        let mut data = Vec::new();
        push_u32(&mut data, 2);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0037);
        push_u32(&mut data, 0);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0C1A);
        push_counted(&mut data, b"Sender\0");

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.stop, None);
        assert_eq!(block.skipped.len(), 1);
        assert_eq!(block.skipped[0].reason, SkipReason::UnexpectedValueCount { count: 0 });
        let props = MessageProps::from_block(&block);
        assert_eq!(props.subject, None);
        assert_eq!(props.sender_name.as_deref(), Some("Sender"));
    }

    #[test]
    fn test_value_count_two_is_skipped_exactly() {
        let mut data = Vec::new();
        push_u32(&mut data, 2);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0037);
        push_u32(&mut data, 2);
        push_u32(&mut data, 3);
        data.extend_from_slice(b"ab\0\0");
        push_u32(&mut data, 5);
        data.extend_from_slice(b"cdef\0\0\0\0");
        push_u16(&mut data, 0x0003);
        push_u16(&mut data, 0x0E07);
        push_u32(&mut data, 7);

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.stop, None);
        assert_eq!(block.skipped[0].reason, SkipReason::UnexpectedValueCount { count: 2 });
        assert_eq!(block.properties.len(), 1);
        assert_eq!(block.properties[0].value, PropValue::Integer32(7));
        assert_eq!(MessageProps::from_block(&block).subject, None);
    }

    #[test]
    fn test_value_count_overrunning_block_stops_decoding() {
        let mut data = Vec::new();
        push_u32(&mut data, 2);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0037);
        push_u32(&mut data, 3);
        push_u32(&mut data, 100);
        data.extend_from_slice(&[0u8; 12]);

        let block = decode_properties(&data, WINDOWS_1252);
        assert!(block.properties.is_empty());
        assert_eq!(block.skipped.len(), 1);
        assert_eq!(
            block.stop,
            Some(BlockStop::Ambiguous { offset: 4, prop_type: PropType::String8, tag: PropTag::TagSubject }),
        );
    }

    #[test]
    fn test_maximum_value_length_stops_decoding() {
        let mut data = Vec::new();
        push_u32(&mut data, 2);
        push_u16(&mut data, 0x101E);
        push_u16(&mut data, 0x3A52);
        push_u32(&mut data, 1);
        push_u32(&mut data, u32::MAX);
        data.extend_from_slice(b"abcd");
        push_u16(&mut data, 0x0003);
        push_u16(&mut data, 0x0E07);
        push_u32(&mut data, 1);

        let block = decode_properties(&data, WINDOWS_1252);
        assert!(block.properties.is_empty());
        assert_eq!(block.skipped[0].reason, SkipReason::MultiValued { count: 1 });
        assert!(matches!(block.stop, Some(BlockStop::Ambiguous { offset: 4, .. })));
    }

    #[test]
    fn test_multi_valued_strings_are_skipped() {
        let mut data = Vec::new();
        push_u32(&mut data, 2);
        push_u16(&mut data, 0x101F);
        push_u16(&mut data, 0x3A4E);
        push_u32(&mut data, 1);
        push_u32(&mut data, 4);
        data.extend_from_slice(&utf16("a"));
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0037);
        push_counted(&mut data, b"ok\0");

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.stop, None);
        assert_eq!(block.skipped[0].reason, SkipReason::MultiValued { count: 1 });
        assert_eq!(MessageProps::from_block(&block).subject.as_deref(), Some("ok"));
    }

    #[test]
    fn test_unknown_type_stops_block() {
        let mut data = Vec::new();
        push_u32(&mut data, 3);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0037);
        push_counted(&mut data, b"kept\0");
        push_u16(&mut data, 0x0014);
        push_u16(&mut data, 0x0E08);
        data.extend_from_slice(&[0u8; 8]);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0C1A);
        push_counted(&mut data, b"lost\0");

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.properties.len(), 1);
        assert_eq!(block.skipped[0].reason, SkipReason::UnsupportedType);
        assert!(matches!(block.stop, Some(BlockStop::Ambiguous { prop_type: PropType::Integer64, .. })));
        let props = MessageProps::from_block(&block);
        assert_eq!(props.subject.as_deref(), Some("kept"));
        assert_eq!(props.sender_name, None);
    }

    #[test]
    fn test_truncated_value_keeps_earlier_properties() {
        let mut data = Vec::new();
        push_u32(&mut data, 2);
        push_u16(&mut data, 0x0003);
        push_u16(&mut data, 0x0E07);
        push_u32(&mut data, 1);
        push_u16(&mut data, 0x0102);
        push_u16(&mut data, 0x3701);
        push_u32(&mut data, 1);
        push_u32(&mut data, 64);
        data.extend_from_slice(&[0u8; 8]);

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.properties.len(), 1);
        assert!(matches!(block.stop, Some(BlockStop::Truncated(_))));
    }

    #[test]
    fn test_declared_count_larger_than_block() {
        let mut data = Vec::new();
        push_u32(&mut data, 10);
        push_u16(&mut data, 0x0003);
        push_u16(&mut data, 0x0E07);
        push_u32(&mut data, 1);
        data.extend_from_slice(&[0u8; 4]);

        let block = decode_properties(&data, WINDOWS_1252);
        assert_eq!(block.properties.len(), 1);
        assert_eq!(block.stop, Some(BlockStop::OutOfData { decoded: 1, declared: 10 }));
    }

    #[test]
    fn test_empty_block() {
        let block = decode_properties(&[], WINDOWS_1252);
        assert!(block.properties.is_empty());
        assert!(matches!(block.stop, Some(BlockStop::Truncated(_))));

        let block = decode_properties(&[0, 0, 0, 0], WINDOWS_1252);
        assert_eq!(block, PropertyBlock::default());
    }

    #[test]
    fn test_sender_first_non_empty_wins() {
        let mut data = Vec::new();
        push_u32(&mut data, 4);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0C1A);
        push_counted(&mut data, b"\0");
        push_u16(&mut data, 0x001F);
        push_u16(&mut data, 0x0042);
        push_counted(&mut data, &utf16("Alice"));
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0C1A);
        push_counted(&mut data, b"Bob\0");
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0065);
        push_counted(&mut data, b"alice@example.com\0");

        let props = MessageProps::from_block(&decode_properties(&data, WINDOWS_1252));
        assert_eq!(props.sender_name.as_deref(), Some("Alice"));
        assert_eq!(props.sender().as_deref(), Some("Alice <alice@example.com>"));
    }

    #[test]
    fn test_sender_email_first_non_empty_wins() {
        let mut data = Vec::new();
        push_u32(&mut data, 4);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0C1A);
        push_counted(&mut data, b"Alice\0");
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0C1F);
        push_counted(&mut data, b"\0");
        push_u16(&mut data, 0x001F);
        push_u16(&mut data, 0x0065);
        push_counted(&mut data, &utf16("alice@example.com"));
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x0C1F);
        push_counted(&mut data, b"other@example.com\0");

        let props = MessageProps::from_block(&decode_properties(&data, WINDOWS_1252));
        assert_eq!(props.sender_email.as_deref(), Some("alice@example.com"));
        assert_eq!(props.sender().as_deref(), Some("Alice <alice@example.com>"));
    }

    #[test]
    fn test_sender_combinations() {
        let mut props = MessageProps::default();
        assert_eq!(props.sender(), None);
        props.sender_email = Some("a@b.c".to_owned());
        assert_eq!(props.sender().as_deref(), Some("a@b.c"));
        props.sender_name = Some("A".to_owned());
        props.sender_email = None;
        assert_eq!(props.sender().as_deref(), Some("A"));
    }

    #[test]
    fn test_html_body_from_binary_and_string() {
        let mut data = Vec::new();
        push_u32(&mut data, 1);
        push_u16(&mut data, 0x0102);
        push_u16(&mut data, 0x1013);
        push_counted(&mut data, "<p>caf\u{E9}</p>\0".as_bytes());
        let props = MessageProps::from_block(&decode_properties(&data, WINDOWS_1252));
        assert_eq!(props.body_html.as_deref(), Some("<p>caf\u{E9}</p>"));

        let mut data = Vec::new();
        push_u32(&mut data, 1);
        push_u16(&mut data, 0x001F);
        push_u16(&mut data, 0x1013);
        push_counted(&mut data, &utf16("<b>x</b>"));
        let props = MessageProps::from_block(&decode_properties(&data, WINDOWS_1252));
        assert_eq!(props.body_html.as_deref(), Some("<b>x</b>"));
    }

    #[test]
    fn test_attachment_routing() {
        let mut data = Vec::new();
        push_u32(&mut data, 5);
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x3704);
        push_counted(&mut data, b"REPORT~1.PDF\0");
        push_u16(&mut data, 0x001F);
        push_u16(&mut data, 0x3707);
        push_counted(&mut data, &utf16("report.pdf"));
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x370E);
        push_counted(&mut data, b"application/x-pdf\0");
        push_u16(&mut data, 0x001E);
        push_u16(&mut data, 0x3703);
        push_counted(&mut data, b".pdf\0");
        push_u16(&mut data, 0x0102);
        push_u16(&mut data, 0x3701);
        push_counted(&mut data, b"%PDF-");

        let props = AttachmentProps::from_block(&decode_properties(&data, WINDOWS_1252));
        assert_eq!(props, AttachmentProps {
            filename: Some("REPORT~1.PDF".to_owned()),
            long_filename: Some("report.pdf".to_owned()),
            display_name: None,
            mime_tag: Some("application/x-pdf".to_owned()),
            extension: Some(".pdf".to_owned()),
            content_id: None,
            data: Some(b"%PDF-".to_vec()),
        });
    }
}
