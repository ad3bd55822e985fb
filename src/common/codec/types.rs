use std::cmp::Ordering;

use crate::common::error::{QRError, QRResult};

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
    Kanji = 0b1000,
    Eci = 0b0111,
    Terminator = 0b0000,
}

// Modes are ordered by how many characters they accept. Numeric is a subset of
// alphanumeric, which is a subset of byte
impl PartialOrd for Mode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl Mode {
    fn rank(&self) -> u8 {
        match self {
            Self::Terminator => 0,
            Self::Eci => 1,
            Self::Numeric => 2,
            Self::Alphanumeric => 3,
            Self::Kanji => 4,
            Self::Byte => 5,
        }
    }

    pub fn from_bits(bits: u16) -> QRResult<Self> {
        match bits {
            0b0000 => Ok(Self::Terminator),
            0b0001 => Ok(Self::Numeric),
            0b0010 => Ok(Self::Alphanumeric),
            0b0100 => Ok(Self::Byte),
            0b0111 => Ok(Self::Eci),
            0b1000 => Ok(Self::Kanji),
            b => Err(QRError::InvalidMode(b as u8)),
        }
    }

    // Whether the byte can be encoded in this mode. Kanji is never chosen by
    // the encoder
    pub fn contains(&self, byte: u8) -> bool {
        match self {
            Self::Numeric => byte.is_ascii_digit(),
            Self::Alphanumeric => alphanumeric_value(byte).is_some(),
            Self::Byte => true,
            Self::Kanji | Self::Eci | Self::Terminator => false,
        }
    }

    // Bit length of `len` characters
    pub fn encoded_len(&self, len: usize) -> usize {
        match *self {
            Self::Numeric => (len * 10).div_ceil(3),
            Self::Alphanumeric => (len * 11).div_ceil(2),
            Self::Byte => len * 8,
            Self::Kanji => len * 13,
            Self::Eci | Self::Terminator => 0,
        }
    }

    // Packs up to 3 digits, 2 alphanumeric chars or 1 byte into a single value
    pub fn encode_chunk(&self, data: &[u8]) -> u16 {
        let len = data.len();
        match self {
            Self::Numeric => {
                debug_assert!(len <= 3, "Chunk too long for numeric mode: {len}");
                data.iter().fold(0, |n, &b| n * 10 + (b - b'0') as u16)
            }
            Self::Alphanumeric => {
                debug_assert!(len <= 2, "Chunk too long for alphanumeric mode: {len}");
                data.iter().fold(0, |n, &b| n * 45 + alphanumeric_value(b).unwrap_or(0) as u16)
            }
            _ => {
                debug_assert!(len == 1, "Chunk too long for byte mode: {len}");
                data[0] as u16
            }
        }
    }

    // Unpacks `char_cnt` characters from a chunk. Fails on values that cannot be
    // produced by the encoder
    pub fn decode_chunk(&self, mut data: u16, char_cnt: usize) -> QRResult<Vec<u8>> {
        let (radix, limit) = match self {
            Self::Numeric => (10, [0, 10, 100, 1000][char_cnt]),
            Self::Alphanumeric => (45, [0, 45, 2025][char_cnt]),
            Self::Byte => return Ok(vec![data as u8]),
            Self::Kanji => return Ok(decode_kanji(data).to_vec()),
            Self::Eci | Self::Terminator => return Err(QRError::CorruptDataSegment),
        };
        if data >= limit {
            return Err(QRError::CorruptDataSegment);
        }

        let mut res = vec![0; char_cnt];
        for c in res.iter_mut().rev() {
            let digit = (data % radix) as usize;
            *c = if radix == 10 { b'0' + digit as u8 } else { ALPHANUMERIC_CHARSET[digit] };
            data /= radix;
        }
        Ok(res)
    }
}

fn alphanumeric_value(byte: u8) -> Option<u8> {
    ALPHANUMERIC_CHARSET.iter().position(|&c| c == byte).map(|p| p as u8)
}

// 13 bit kanji value to a Shift JIS double byte
fn decode_kanji(data: u16) -> [u8; 2] {
    let val = ((data / 0xc0) << 8) | (data % 0xc0);
    let sjis = if val + 0x8140 <= 0x9ffc { val + 0x8140 } else { val + 0xc140 };
    [(sjis >> 8) as u8, sjis as u8]
}

#[cfg(test)]
mod mode_tests {
    use test_case::test_case;

    use super::Mode::{self, *};
    use crate::common::error::QRError;

    #[test]
    fn test_comparison() {
        assert!(Numeric < Alphanumeric);
        assert!(Numeric < Byte);
        assert!(Alphanumeric < Byte);
        assert_eq!(Byte.max(Numeric), Byte);
    }

    #[test_case(0b0001, Numeric)]
    #[test_case(0b0010, Alphanumeric)]
    #[test_case(0b0100, Byte)]
    #[test_case(0b1000, Kanji)]
    #[test_case(0b0111, Eci)]
    #[test_case(0b0000, Terminator)]
    fn test_from_bits(bits: u16, mode: Mode) {
        assert_eq!(Mode::from_bits(bits), Ok(mode));
        assert_eq!(mode as u16, bits);
    }

    #[test]
    fn test_from_bits_invalid() {
        assert_eq!(Mode::from_bits(0b0011), Err(QRError::InvalidMode(0b0011)));
    }

    #[test]
    fn test_contains() {
        assert!(Numeric.contains(b'0'));
        assert!(!Numeric.contains(b'A'));
        assert!(Alphanumeric.contains(b'Z'));
        assert!(Alphanumeric.contains(b':'));
        assert!(Alphanumeric.contains(b' '));
        assert!(!Alphanumeric.contains(b'a'));
        assert!(!Alphanumeric.contains(b'@'));
        assert!(Byte.contains(0xff));
        assert!(!Kanji.contains(b'A'));
    }

    #[test_case(Numeric, b"012", 0b0000001100)]
    #[test_case(Numeric, b"345", 0b0101011001)]
    #[test_case(Numeric, b"67", 0b1000011)]
    #[test_case(Numeric, b"8", 0b1000)]
    #[test_case(Alphanumeric, b"AC", 0b00111001110)]
    #[test_case(Alphanumeric, b"-4", 0b11100111001)]
    #[test_case(Alphanumeric, b"2", 0b000010)]
    #[test_case(Byte, b"a", 0x61)]
    fn test_encode_chunk(mode: Mode, chunk: &[u8], exp: u16) {
        assert_eq!(mode.encode_chunk(chunk), exp);
        assert_eq!(mode.decode_chunk(exp, chunk.len()).unwrap(), chunk);
    }

    #[test]
    fn test_decode_chunk_out_of_range() {
        assert_eq!(Numeric.decode_chunk(1000, 3), Err(QRError::CorruptDataSegment));
        assert_eq!(Numeric.decode_chunk(10, 1), Err(QRError::CorruptDataSegment));
        assert_eq!(Alphanumeric.decode_chunk(2025, 2), Err(QRError::CorruptDataSegment));
    }

    #[test]
    fn test_decode_kanji_chunk() {
        // 0x935F and 0xE4AA in Shift JIS
        assert_eq!(Kanji.decode_chunk(0x0d9f, 1).unwrap(), [0x93, 0x5f]);
        assert_eq!(Kanji.decode_chunk(0x1aaa, 1).unwrap(), [0xe4, 0xaa]);
    }

    #[test]
    fn test_encoded_len() {
        assert_eq!(Numeric.encoded_len(3), 10);
        assert_eq!(Numeric.encoded_len(2), 7);
        assert_eq!(Numeric.encoded_len(1), 4);
        assert_eq!(Alphanumeric.encoded_len(2), 11);
        assert_eq!(Alphanumeric.encoded_len(1), 6);
        assert_eq!(Byte.encoded_len(1), 8);
        assert_eq!(Kanji.encoded_len(2), 26);
    }
}

// Segment
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub mode: Mode,
    pub mode_bits: usize, // Bit len of mode
    pub len_bits: usize,  // Bit len of char count
    pub data: &'a [u8],   // Reference to raw data
}

impl<'a> Segment<'a> {
    pub fn new(mode: Mode, mode_bits: usize, len_bits: usize, data: &'a [u8]) -> Self {
        Self { mode, mode_bits, len_bits, data }
    }

    pub fn bit_len(&self) -> usize {
        self.mode_bits + self.len_bits + self.mode.encoded_len(self.data.len())
    }
}


// Global constants
//------------------------------------------------------------------------------

pub static PADDING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];

pub static MODES: [Mode; 3] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte];

pub static ALPHANUMERIC_CHARSET: [u8; 45] = *b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";
