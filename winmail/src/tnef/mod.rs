pub mod attachment;
pub mod props;


use encoding_rs::Encoding;
use log::{debug, warn};
use msox::{TnefAttributeId, TnefAttributeLevel};
use serde::Serialize;

use crate::binread::{decode_ansi, ByteCursor};
use crate::codepage::{default_encoding, encoding_for_codepage, known_encoding};
use crate::error::{DecodeError, UnexpectedEnd};
use crate::rtf::decode_compressed_rtf;
use crate::tnef::attachment::{AttachmentAssembler, AttachmentEvent, FinalAttachment, Transition};
use crate::tnef::props::{decode_properties, AttachmentProps, BlockStop, MessageProps, PropertyBlock, SkippedProperty};


pub const TNEF_SIGNATURE: u32 = 0x223E9F78;

/// level (1) + attribute word (4) + length (4)
const ATTRIBUTE_HEADER_LENGTH: usize = 9;

/// `attFrom` carries a fixed-size header before the sender's display name.
const FROM_HEADER_LENGTH: usize = 8;


/// One record of the attribute stream.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TnefAttribute<'a> {
    /// Offset of the record within the stream.
    pub offset: usize,
    pub level: TnefAttributeLevel,
    pub id: TnefAttributeId,
    /// The upper half of the attribute word; only traced.
    pub data_type: u16,
    pub data: &'a [u8],
    pub checksum: Option<u16>,
}
impl<'a> TnefAttribute<'a> {
    /// The 16-bit wrapping sum of the payload bytes.
    pub fn calculate_checksum(&self) -> u16 {
        self.data
            .iter()
            .fold(0u16, |sum, &b| sum.wrapping_add(b.into()))
    }
}

/// Everything recovered from a TNEF stream.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub subject: String,
    pub from: String,
    pub body: String,
    pub body_html: String,
    /// Decompressed RTF body, if the message carried one.
    #[serde(skip)]
    pub body_rtf: Option<Vec<u8>>,
    pub attachments: Vec<FinalAttachment>,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

/// Damage the decoder worked around.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Diagnostics {
    /// The codepage announced by `attOemCodepage`, if any.
    pub codepage: Option<u32>,

    /// Offset of an attribute whose declared length ran past the end of the
    /// stream; nothing from that point onward was decoded.
    pub truncated_at: Option<usize>,

    pub checksum_mismatches: Vec<ChecksumMismatch>,
    pub skipped_properties: Vec<AttributeNote<SkippedProperty>>,
    pub stopped_blocks: Vec<AttributeNote<BlockStop>>,

    /// Attributes that could not be used where they appeared.
    pub ignored_attributes: Vec<IgnoredAttribute>,

    pub rtf_error: Option<String>,
}
impl Diagnostics {
    /// Whether the stream decoded without any workaround.
    pub fn is_clean(&self) -> bool {
        self.truncated_at.is_none()
            && self.checksum_mismatches.is_empty()
            && self.skipped_properties.is_empty()
            && self.stopped_blocks.is_empty()
            && self.ignored_attributes.is_empty()
            && self.rtf_error.is_none()
    }
}

/// A note tied to the attribute it was found in.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct AttributeNote<T> {
    pub attribute_offset: usize,
    pub level: TnefAttributeLevel,
    pub note: T,
}
impl<T> AttributeNote<T> {
    fn new(attribute: &TnefAttribute<'_>, note: T) -> Self {
        Self {
            attribute_offset: attribute.offset,
            level: attribute.level,
            note,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ChecksumMismatch {
    pub attribute_offset: usize,
    pub id: TnefAttributeId,
    pub obtained: u16,
    pub calculated: u16,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct IgnoredAttribute {
    pub attribute_offset: usize,
    pub level: TnefAttributeLevel,
    pub id: TnefAttributeId,
}


/// A text field that remembers whether it came from a MAPI property, so that
/// legacy attributes cannot overwrite MAPI values.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct MessageField {
    value: String,
    from_mapi: bool,
}
impl MessageField {
    fn set_legacy(&mut self, value: String) {
        if !self.from_mapi {
            self.value = value;
        }
    }

    fn set_mapi(&mut self, value: Option<String>) {
        if let Some(v) = value {
            self.value = v;
            self.from_mapi = true;
        }
    }
}


/// The state of one decode.
struct Decoder {
    encoding: &'static Encoding,
    subject: MessageField,
    from: MessageField,
    body: MessageField,
    body_html: MessageField,
    body_rtf: Option<Vec<u8>>,
    attachments: AttachmentAssembler,
    diagnostics: Diagnostics,
}
impl Decoder {
    fn new() -> Self {
        Self {
            encoding: default_encoding(),
            subject: MessageField::default(),
            from: MessageField::default(),
            body: MessageField::default(),
            body_html: MessageField::default(),
            body_rtf: None,
            attachments: AttachmentAssembler::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    fn ignore(&mut self, attribute: &TnefAttribute<'_>) {
        self.diagnostics.ignored_attributes.push(IgnoredAttribute {
            attribute_offset: attribute.offset,
            level: attribute.level,
            id: attribute.id,
        });
    }

    fn decode_block(&mut self, attribute: &TnefAttribute<'_>) -> PropertyBlock {
        let mut block = decode_properties(attribute.data, self.encoding);
        self.diagnostics.skipped_properties.extend(
            block.skipped
                .drain(..)
                .map(|skipped| AttributeNote::new(attribute, skipped))
        );
        if let Some(stop) = block.stop.take() {
            self.diagnostics.stopped_blocks.push(AttributeNote::new(attribute, stop));
        }
        block
    }

    fn message_attribute(&mut self, attribute: &TnefAttribute<'_>) {
        match attribute.id {
            TnefAttributeId::OemCodepage => {
                let codepage = match ByteCursor::new(attribute.data).read_u32_le() {
                    Ok(cp) => cp,
                    Err(e) => {
                        warn!("attOemCodepage too short: {}", e);
                        self.ignore(attribute);
                        return;
                    },
                };
                if known_encoding(codepage).is_none() {
                    debug!("unknown codepage {}; using {}", codepage, default_encoding().name());
                }
                self.encoding = encoding_for_codepage(codepage);
                self.diagnostics.codepage = Some(codepage);
                debug!("codepage {} -> {}", codepage, self.encoding.name());
            },
            TnefAttributeId::Subject => {
                self.subject.set_legacy(decode_ansi(attribute.data, self.encoding));
            },
            TnefAttributeId::From => {
                let name = attribute.data.get(FROM_HEADER_LENGTH..).unwrap_or_default();
                self.from.set_legacy(decode_ansi(name, self.encoding));
            },
            TnefAttributeId::Body => {
                self.body.set_legacy(decode_ansi(attribute.data, self.encoding));
            },
            TnefAttributeId::MsgProps => {
                let block = self.decode_block(attribute);
                let props = MessageProps::from_block(&block);
                self.from.set_mapi(props.sender());
                self.subject.set_mapi(props.subject);
                self.body.set_mapi(props.body);
                self.body_html.set_mapi(props.body_html);
                if let Some(compressed) = props.rtf_compressed {
                    match decode_compressed_rtf(&compressed) {
                        Ok(raw) => self.body_rtf = Some(raw),
                        Err(e) => {
                            warn!("failed to decompress RTF body: {}", e);
                            self.diagnostics.rtf_error = Some(e.to_string());
                        },
                    }
                }
            },
            other => {
                debug!("message attribute {:?} not used", other);
            },
        }
    }

    fn attachment_attribute(&mut self, attribute: &TnefAttribute<'_>) {
        let event = match attribute.id {
            TnefAttributeId::AttachRendData => AttachmentEvent::RendData,
            TnefAttributeId::AttachTitle => AttachmentEvent::Title(decode_ansi(attribute.data, self.encoding)),
            TnefAttributeId::AttachData => AttachmentEvent::Data(attribute.data.to_vec()),
            TnefAttributeId::MsgProps|TnefAttributeId::Attachment => {
                let block = self.decode_block(attribute);
                AttachmentEvent::Props(AttachmentProps::from_block(&block))
            },
            other => AttachmentEvent::Other(other),
        };
        if self.attachments.handle(event) == Transition::Orphaned {
            self.ignore(attribute);
        }
    }

    fn handle(&mut self, attribute: &TnefAttribute<'_>) {
        debug!(
            "attribute {:?}.{:?} at {} (type 0x{:04X}, {} bytes)",
            attribute.level, attribute.id, attribute.offset, attribute.data_type, attribute.data.len(),
        );

        if let Some(obtained) = attribute.checksum {
            let calculated = attribute.calculate_checksum();
            if obtained != calculated {
                warn!(
                    "checksum mismatch in attribute {:?} at {}: calculated 0x{:04X}, obtained 0x{:04X}",
                    attribute.id, attribute.offset, calculated, obtained,
                );
                self.diagnostics.checksum_mismatches.push(ChecksumMismatch {
                    attribute_offset: attribute.offset,
                    id: attribute.id,
                    obtained,
                    calculated,
                });
            }
        }

        match attribute.level {
            TnefAttributeLevel::Message => self.message_attribute(attribute),
            TnefAttributeLevel::Attachment => self.attachment_attribute(attribute),
            TnefAttributeLevel::Other(level) => {
                warn!("attribute {:?} has unknown level {}", attribute.id, level);
                self.ignore(attribute);
            },
        }
    }

    fn finish(self) -> ParseResult {
        ParseResult {
            subject: self.subject.value,
            from: self.from.value,
            body: self.body.value,
            body_html: self.body_html.value,
            body_rtf: self.body_rtf,
            attachments: self.attachments.finish(),
            diagnostics: self.diagnostics,
        }
    }
}


fn read_attribute<'a>(cursor: &mut ByteCursor<'a>) -> Result<TnefAttribute<'a>, UnexpectedEnd> {
    let offset = cursor.offset();
    let level = TnefAttributeLevel::from_base_type(cursor.read_u8()?);

    let attribute_word = cursor.read_u32_le()?;
    let id = TnefAttributeId::from_base_type((attribute_word & 0xFFFF) as u16);
    let data_type = (attribute_word >> 16) as u16;

    let length = usize::try_from(cursor.read_u32_le()?).unwrap_or(usize::MAX);
    let data = cursor.read_slice(length)?;

    let checksum = if cursor.remaining() >= 2 {
        Some(cursor.read_u16_le()?)
    } else {
        None
    };

    Ok(TnefAttribute {
        offset,
        level,
        id,
        data_type,
        data,
        checksum,
    })
}

/// Decodes a TNEF stream.
///
/// Only a missing or wrong signature is an error; any other damage is worked
/// around and reported in [`ParseResult::diagnostics`].
pub fn decode(data: &[u8]) -> Result<ParseResult, DecodeError> {
    let mut cursor = ByteCursor::new(data);

    // read signature
    let signature = cursor.read_u32_le()
        .map_err(|_| DecodeError::TooShort { length: data.len() })?;
    if signature != TNEF_SIGNATURE {
        return Err(DecodeError::Signature { expected: TNEF_SIGNATURE, obtained: signature });
    }

    let mut decoder = Decoder::new();

    // the legacy key is not needed
    match cursor.read_u16_le() {
        Ok(legacy_key) => debug!("legacy key: 0x{:04X}", legacy_key),
        Err(e) => {
            warn!("stream ends before the legacy key: {}", e);
            decoder.diagnostics.truncated_at = Some(cursor.offset());
            return Ok(decoder.finish());
        },
    }

    while cursor.remaining() >= ATTRIBUTE_HEADER_LENGTH {
        let offset = cursor.offset();
        match read_attribute(&mut cursor) {
            Ok(attribute) => decoder.handle(&attribute),
            Err(e) => {
                warn!("attribute at {} is truncated: {}", offset, e);
                decoder.diagnostics.truncated_at = Some(offset);
                break;
            },
        }
    }
    if cursor.remaining() > 0 && decoder.diagnostics.truncated_at.is_none() {
        debug!("{} trailing bytes after the last attribute", cursor.remaining());
    }

    Ok(decoder.finish())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_attribute_splits_attribute_word() {
        let data = [
            0x02, // level
            0x0F, 0x80, 0x06, 0x00, // attAttachData, atpByte
            0x03, 0x00, 0x00, 0x00, // length
            b'a', b'b', b'c',
            0x26, 0x01, // checksum
            0xFF,
        ];
        let mut cursor = ByteCursor::new(&data);
        let attribute = read_attribute(&mut cursor).unwrap();
        assert_eq!(attribute.offset, 0);
        assert_eq!(attribute.level, TnefAttributeLevel::Attachment);
        assert_eq!(attribute.id, TnefAttributeId::AttachData);
        assert_eq!(attribute.data_type, 0x0006);
        assert_eq!(attribute.data, b"abc");
        assert_eq!(attribute.checksum, Some(0x0126));
        assert_eq!(attribute.calculate_checksum(), 0x0126);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_read_attribute_without_checksum() {
        let data = [0x01, 0x04, 0x80, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, b'x', 0x00];
        let mut cursor = ByteCursor::new(&data);
        let attribute = read_attribute(&mut cursor).unwrap();
        assert_eq!(attribute.id, TnefAttributeId::Subject);
        assert_eq!(attribute.data_type, 0x0001);
        assert_eq!(attribute.checksum, None);
    }
}
