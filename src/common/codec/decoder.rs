use encoding_rs::{Encoding, SHIFT_JIS, UTF_8, WINDOWS_1252};
use log::trace;

use super::Mode;
use crate::common::{
    bit_utils::BitStream,
    error::{QRError, QRResult},
    metadata::Version,
};

// Decoder
//------------------------------------------------------------------------------

// Decodes segments until a terminator or until fewer bits than a mode indicator
// remain
pub fn decode(encoded: &mut BitStream, ver: Version) -> QRResult<String> {
    let mut res = String::with_capacity(encoded.len() >> 3);
    let mut charset = None;
    while encoded.remaining() >= ver.mode_bits() {
        let mode = encoded.take_bits(ver.mode_bits()).ok_or(QRError::CorruptDataSegment)?;
        match Mode::from_bits(mode)? {
            Mode::Terminator => break,
            Mode::Eci => {
                let designator = take_eci_designator(encoded)?;
                trace!("ECI designator {designator}");
                charset = Some(designator);
            }
            mode => {
                let char_cnt = encoded
                    .take_bits(ver.char_cnt_bits(mode))
                    .ok_or(QRError::CorruptDataSegment)? as usize;
                write_segment(encoded, mode, char_cnt, charset, &mut res)?;
            }
        }
    }
    Ok(res)
}


// Segment readers
//------------------------------------------------------------------------------

fn write_segment(
    inp: &mut BitStream,
    mode: Mode,
    char_cnt: usize,
    charset: Option<u32>,
    out: &mut String,
) -> QRResult<()> {
    match mode {
        Mode::Numeric => write_chunks(inp, Mode::Numeric, char_cnt, 3, out),
        Mode::Alphanumeric => write_chunks(inp, Mode::Alphanumeric, char_cnt, 2, out),
        Mode::Byte => write_byte(inp, char_cnt, charset, out),
        Mode::Kanji => write_kanji(inp, char_cnt, out),
        Mode::Eci | Mode::Terminator => Err(QRError::CorruptDataSegment),
    }
}

fn write_chunks(
    inp: &mut BitStream,
    mode: Mode,
    mut char_cnt: usize,
    chunk_sz: usize,
    out: &mut String,
) -> QRResult<()> {
    while char_cnt > 0 {
        let n = char_cnt.min(chunk_sz);
        let bits = inp.take_bits(mode.encoded_len(n)).ok_or(QRError::CorruptDataSegment)?;
        // Both charsets are ascii
        out.extend(mode.decode_chunk(bits, n)?.into_iter().map(char::from));
        char_cnt -= n;
    }
    Ok(())
}

fn write_byte(
    inp: &mut BitStream,
    char_cnt: usize,
    charset: Option<u32>,
    out: &mut String,
) -> QRResult<()> {
    let bytes = (0..char_cnt)
        .map(|_| inp.take_bits(8).map(|b| b as u8))
        .collect::<Option<Vec<_>>>()
        .ok_or(QRError::CorruptDataSegment)?;

    match charset.and_then(eci_encoding) {
        Some(enc) => out.push_str(&decode_with(enc, &bytes)?),
        // Without an ECI header try UTF-8 first, then Shift JIS
        None => match std::str::from_utf8(&bytes) {
            Ok(s) => out.push_str(s),
            Err(_) => out.push_str(&decode_with(SHIFT_JIS, &bytes)?),
        },
    }
    Ok(())
}

fn write_kanji(inp: &mut BitStream, char_cnt: usize, out: &mut String) -> QRResult<()> {
    let mut sjis = Vec::with_capacity(char_cnt * 2);
    for _ in 0..char_cnt {
        let bits = inp.take_bits(13).ok_or(QRError::CorruptDataSegment)?;
        sjis.extend(Mode::Kanji.decode_chunk(bits, 1)?);
    }
    out.push_str(&decode_with(SHIFT_JIS, &sjis)?);
    Ok(())
}

fn decode_with(enc: &'static Encoding, bytes: &[u8]) -> QRResult<String> {
    let (s, _, has_err) = enc.decode(bytes);
    if has_err {
        return Err(QRError::InvalidCharacterEncoding);
    }
    Ok(s.into_owned())
}

// ECI designators are 1, 2 or 3 bytes long, signalled by the leading bits
fn take_eci_designator(inp: &mut BitStream) -> QRResult<u32> {
    let first = inp.take_bits(8).ok_or(QRError::CorruptDataSegment)? as u32;
    let (extra, value) = match first {
        b if b & 0x80 == 0 => (0, b),
        b if b & 0xc0 == 0x80 => (1, b & 0x3f),
        b if b & 0xe0 == 0xc0 => (2, b & 0x1f),
        _ => return Err(QRError::CorruptDataSegment),
    };
    let mut value = value;
    for _ in 0..extra {
        value = (value << 8) | inp.take_bits(8).ok_or(QRError::CorruptDataSegment)? as u32;
    }
    Ok(value)
}

fn eci_encoding(designator: u32) -> Option<&'static Encoding> {
    match designator {
        1 | 3 => Some(WINDOWS_1252),
        20 => Some(SHIFT_JIS),
        26 => Some(UTF_8),
        _ => None,
    }
}

#[cfg(test)]
mod segment_reader_tests {
    use test_case::test_case;

    use super::{take_eci_designator, write_chunks};
    use crate::common::{bit_utils::BitStream, codec::Mode};

    #[test_case(&[0b0000_0011], 3)]
    #[test_case(&[0b1000_0001, 0b0000_0000], 256)]
    #[test_case(&[0b1100_0001, 0x00, 0x00], 65536)]
    fn test_take_eci_designator(data: &[u8], exp: u32) {
        let mut bs = BitStream::from(data);
        assert_eq!(take_eci_designator(&mut bs).unwrap(), exp);
    }

    #[test]
    fn test_write_numeric_chunks() {
        // 012 | 345 | 67
        let mut bs = BitStream::from(&[0b00000011, 0b00010101, 0b10011000, 0b01100000]);
        let mut out = String::new();
        write_chunks(&mut bs, Mode::Numeric, 8, 3, &mut out).unwrap();
        assert_eq!(out, "01234567");
    }

    #[test]
    fn test_write_alphanumeric_chunks() {
        let mut bs = BitStream::from(&[0b00111001, 0b11011100, 0b11100100, 0b00100000]);
        let mut out = String::new();
        write_chunks(&mut bs, Mode::Alphanumeric, 5, 2, &mut out).unwrap();
        assert_eq!(out, "AC-42");
    }
}
