//! Decompression of `PR_RTF_COMPRESSED` bodies (MS-OXRTFCP).

use log::debug;

use crate::binread::ByteCursor;
use crate::error::RtfDecodeError;


const HEADER_LENGTH: usize = 16;
const COMPRESSION_UNCOMPRESSED: u32 = 0x414C454D; // "MELA"
const COMPRESSION_LZFU: u32 = 0x75465A4C; // "LZFu"
const DICTIONARY_CAPACITY: usize = 4096;
const INIT_DICTIONARY: [u8; 207] = *b"{\\rtf1\\ansi\\mac\\deff0\\deftab720{\\fonttbl;}{\\f0\\fnil \\froman \\fswiss \\fmodern \\fscript \\fdecor MS Sans SerifSymbolArialTimes New RomanCourier{\\colortbl\\red0\\green0\\blue0\r\n\\par \\pard\\plain\\f0\\fs20\\b\\i\\u\\tab\\tx";


#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
struct CompressedRtfDict {
    data: Box<[u8]>,
    write_pos: usize,
}
impl CompressedRtfDict {
    fn new() -> Self {
        let mut data = vec![0u8; DICTIONARY_CAPACITY].into_boxed_slice();
        data[0..INIT_DICTIONARY.len()].copy_from_slice(&INIT_DICTIONARY);

        Self {
            data,
            write_pos: INIT_DICTIONARY.len(),
        }
    }

    fn write(&mut self, value: u8) {
        self.data[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % DICTIONARY_CAPACITY;
    }

    fn is_end_marker(&self, offset: usize) -> bool {
        offset == self.write_pos
    }

    /// Copies `length` bytes starting at `offset` to `out`, feeding them back
    /// into the dictionary as it goes. Source and destination may overlap.
    fn copy_reference(&mut self, offset: usize, length: usize, out: &mut Vec<u8>) {
        let mut read_pos = offset;
        for _ in 0..length {
            let b = self.data[read_pos];
            read_pos = (read_pos + 1) % DICTIONARY_CAPACITY;
            out.push(b);
            self.write(b);
        }
    }
}


/// Decompresses a compressed RTF stream, returning the raw RTF bytes.
pub fn decode_compressed_rtf(compressed: &[u8]) -> Result<Vec<u8>, RtfDecodeError> {
    if compressed.len() < HEADER_LENGTH {
        return Err(RtfDecodeError::HeaderTooShort { expected: HEADER_LENGTH, obtained: compressed.len() });
    }

    let mut header = ByteCursor::new(&compressed[..HEADER_LENGTH]);
    let compressed_size = header.read_u32_le()?;
    let raw_size = header.read_u32_le()?;
    let compression_type = header.read_u32_le()?;
    let _crc = header.read_u32_le()?;
    debug!("compressed RTF: {} bytes compressed, {} bytes raw, type 0x{:08X}", compressed_size, raw_size, compression_type);

    // the size field counts everything after itself
    let end = usize::try_from(compressed_size)
        .ok()
        .and_then(|s| s.checked_add(4))
        .map_or(compressed.len(), |e| e.clamp(HEADER_LENGTH, compressed.len()));
    let body = &compressed[HEADER_LENGTH..end];

    if compression_type == COMPRESSION_UNCOMPRESSED {
        return Ok(body.to_vec());
    }
    if compression_type != COMPRESSION_LZFU {
        return Err(RtfDecodeError::UnsupportedCompression { compression_type });
    }

    let raw_size = usize::try_from(raw_size).unwrap_or(usize::MAX);
    let mut cursor = ByteCursor::new(body);
    let mut dict = CompressedRtfDict::new();
    let mut ret = Vec::with_capacity(raw_size.min(body.len() * 8));
    'control: while cursor.remaining() > 0 {
        let control = cursor.read_u8()?;
        for bit_index in 0..8 {
            if cursor.remaining() == 0 {
                // stream ended without an end marker
                break 'control;
            }

            if control & (1 << bit_index) == 0 {
                let literal = cursor.read_u8()?;
                ret.push(literal);
                dict.write(literal);
            } else {
                // dictionary reference; yes, big endian
                let dict_ref = cursor.read_u16_be()?;
                let offset = usize::from(dict_ref >> 4);
                let length = usize::from(dict_ref & 0b1111) + 2;

                if dict.is_end_marker(offset) {
                    break 'control;
                }
                dict.copy_reference(offset, length, &mut ret);
            }
        }
    }

    ret.truncate(raw_size);
    Ok(ret)
}
