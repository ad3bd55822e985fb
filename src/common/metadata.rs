use std::ops::{Deref, Not};

use image::{Luma, Rgb};

use super::{
    codec::Mode,
    error::{QRError, QRResult},
    mask::MaskPattern,
};

// Metadata
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    ver: Version,
    ecl: ECLevel,
    mask: Option<MaskPattern>,
}

impl Metadata {
    pub fn new(ver: Version, ecl: ECLevel, mask: Option<MaskPattern>) -> Self {
        Self { ver, ecl, mask }
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }
}

// Version
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(usize);

impl Deref for Version {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Version {
    pub fn new(ver: usize) -> QRResult<Self> {
        if !(1..=40).contains(&ver) {
            return Err(QRError::InvalidVersion(ver));
        }
        Ok(Self(ver))
    }

    pub(crate) const fn new_unchecked(ver: usize) -> Self {
        debug_assert!(ver >= 1 && ver <= 40, "Version out of range");
        Self(ver)
    }

    pub fn from_width(width: usize) -> QRResult<Self> {
        if width < 21 || (width - 17) % 4 != 0 {
            return Err(QRError::InvalidVersion(0));
        }
        Self::new((width - 17) / 4)
    }

    pub fn width(&self) -> usize {
        17 + 4 * self.0
    }

    pub fn alignment_pattern(&self) -> &'static [u8] {
        let count = if self.0 == 1 { 0 } else { self.0 / 7 + 2 };
        &ALIGNMENT_PATTERN_POSITIONS[self.0][..count]
    }

    pub fn mode_bits(&self) -> usize {
        4
    }

    pub fn char_cnt_bits(&self, mode: Mode) -> usize {
        let range = match self.0 {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        match mode {
            Mode::Numeric => [10, 12, 14][range],
            Mode::Alphanumeric => [9, 11, 13][range],
            Mode::Byte => [8, 16, 16][range],
            Mode::Kanji => [8, 10, 12][range],
            Mode::Eci | Mode::Terminator => 0,
        }
    }

    // Modules left for codewords after all function patterns and infos are drawn
    pub fn raw_data_modules(&self) -> usize {
        raw_data_modules(self.0)
    }

    pub fn total_codewords(&self) -> usize {
        self.raw_data_modules() >> 3
    }

    pub fn remainder_bits(&self) -> usize {
        self.raw_data_modules() & 7
    }

    pub fn ecc_per_block(&self, ecl: ECLevel) -> usize {
        ECC_PER_BLOCK[ecl as usize][self.0] as usize
    }

    pub fn block_count(&self, ecl: ECLevel) -> usize {
        BLOCK_COUNT[ecl as usize][self.0] as usize
    }

    // (Short block size, short block count, long block size, long block count)
    pub fn data_codewords_per_block(&self, ecl: ECLevel) -> (usize, usize, usize, usize) {
        let total = self.total_codewords();
        let blocks = self.block_count(ecl);
        let ecc = self.ecc_per_block(ecl);

        let long_count = total % blocks;
        let short_count = blocks - long_count;
        let short_size = total / blocks - ecc;
        let long_size = if long_count > 0 { short_size + 1 } else { 0 };

        (short_size, short_count, long_size, long_count)
    }

    pub fn data_codewords(&self, ecl: ECLevel) -> usize {
        self.total_codewords() - self.ecc_per_block(ecl) * self.block_count(ecl)
    }

    pub fn data_bit_capacity(&self, ecl: ECLevel) -> usize {
        self.data_codewords(ecl) << 3
    }

    pub fn info(&self) -> u32 {
        debug_assert!(self.0 >= 7, "Version info is only present from version 7: {}", self.0);
        VERSION_INFOS[self.0]
    }
}

#[cfg(test)]
mod version_tests {
    use test_case::test_case;

    use super::{ECLevel, Mode, Version};
    use crate::common::error::QRError;

    #[test]
    fn test_new() {
        assert_eq!(*Version::new(1).unwrap(), 1);
        assert_eq!(*Version::new(40).unwrap(), 40);
        assert_eq!(Version::new(0), Err(QRError::InvalidVersion(0)));
        assert_eq!(Version::new(41), Err(QRError::InvalidVersion(41)));
    }

    #[test_case(21, Some(1))]
    #[test_case(25, Some(2))]
    #[test_case(177, Some(40))]
    #[test_case(22, None)]
    #[test_case(17, None)]
    #[test_case(181, None)]
    fn test_from_width(width: usize, exp: Option<usize>) {
        assert_eq!(Version::from_width(width).ok().map(|v| *v), exp);
    }

    #[test_case(1, ECLevel::L, 19)]
    #[test_case(1, ECLevel::M, 16)]
    #[test_case(1, ECLevel::Q, 13)]
    #[test_case(1, ECLevel::H, 9)]
    #[test_case(5, ECLevel::Q, 62)]
    #[test_case(10, ECLevel::L, 274)]
    #[test_case(10, ECLevel::H, 122)]
    #[test_case(40, ECLevel::L, 2956)]
    #[test_case(40, ECLevel::M, 2334)]
    #[test_case(40, ECLevel::Q, 1666)]
    #[test_case(40, ECLevel::H, 1276)]
    fn test_data_codewords(ver: usize, ecl: ECLevel, exp: usize) {
        assert_eq!(Version::new(ver).unwrap().data_codewords(ecl), exp);
    }

    #[test_case(1, 26)]
    #[test_case(2, 44)]
    #[test_case(7, 196)]
    #[test_case(14, 581)]
    #[test_case(40, 3706)]
    fn test_total_codewords(ver: usize, exp: usize) {
        assert_eq!(Version::new(ver).unwrap().total_codewords(), exp);
    }

    #[test_case(1, 0)]
    #[test_case(2, 7)]
    #[test_case(14, 3)]
    #[test_case(21, 4)]
    #[test_case(28, 3)]
    #[test_case(40, 0)]
    fn test_remainder_bits(ver: usize, exp: usize) {
        assert_eq!(Version::new(ver).unwrap().remainder_bits(), exp);
    }

    #[test]
    fn test_data_codewords_per_block() {
        let ver = Version::new(5).unwrap();
        assert_eq!(ver.data_codewords_per_block(ECLevel::Q), (15, 2, 16, 2));
        let ver = Version::new(1).unwrap();
        assert_eq!(ver.data_codewords_per_block(ECLevel::M), (16, 1, 0, 0));
        let ver = Version::new(40).unwrap();
        assert_eq!(ver.data_codewords_per_block(ECLevel::H), (15, 20, 16, 61));
    }

    #[test]
    fn test_blocks_cover_all_codewords() {
        for v in 1..=40 {
            let ver = Version::new(v).unwrap();
            for ecl in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
                let (s1, c1, s2, c2) = ver.data_codewords_per_block(ecl);
                let ecc = ver.ecc_per_block(ecl);
                assert_eq!(s1 * c1 + s2 * c2, ver.data_codewords(ecl), "Version {v} {ecl:?}");
                assert_eq!((s1 + ecc) * c1 + (s2 + ecc) * c2, ver.total_codewords());
            }
        }
    }

    #[test_case(1, &[])]
    #[test_case(2, &[6, 18])]
    #[test_case(7, &[6, 22, 38])]
    #[test_case(15, &[6, 26, 48, 70])]
    #[test_case(32, &[6, 34, 60, 86, 112, 138])]
    #[test_case(36, &[6, 24, 50, 76, 102, 128, 154])]
    #[test_case(40, &[6, 30, 58, 86, 114, 142, 170])]
    fn test_alignment_pattern(ver: usize, exp: &[u8]) {
        assert_eq!(Version::new(ver).unwrap().alignment_pattern(), exp);
    }

    #[test]
    fn test_char_cnt_bits() {
        let v9 = Version::new(9).unwrap();
        let v10 = Version::new(10).unwrap();
        let v27 = Version::new(27).unwrap();
        assert_eq!(v9.char_cnt_bits(Mode::Numeric), 10);
        assert_eq!(v10.char_cnt_bits(Mode::Alphanumeric), 11);
        assert_eq!(v27.char_cnt_bits(Mode::Byte), 16);
        assert_eq!(v27.char_cnt_bits(Mode::Kanji), 12);
    }

    #[test_case(7, 0x07C94)]
    #[test_case(8, 0x085BC)]
    #[test_case(21, 0x15683)]
    #[test_case(40, 0x28C69)]
    fn test_version_info(ver: usize, exp: u32) {
        assert_eq!(Version::new(ver).unwrap().info(), exp);
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    pub(crate) fn format_bits(&self) -> u32 {
        match self {
            Self::L => 0b01,
            Self::M => 0b00,
            Self::Q => 0b11,
            Self::H => 0b10,
        }
    }

    pub(crate) fn from_format_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b01 => Self::L,
            0b00 => Self::M,
            0b11 => Self::Q,
            _ => Self::H,
        }
    }

    pub(crate) fn format_info(&self, mask: MaskPattern) -> u32 {
        FORMAT_INFOS[(self.format_bits() << 3 | *mask as u32) as usize]
    }
}

#[cfg(test)]
mod ec_level_tests {
    use test_case::test_case;

    use super::{ECLevel, FORMAT_INFOS};
    use crate::common::mask::MaskPattern;

    #[test_case(ECLevel::L, 0, 0b111011111000100)]
    #[test_case(ECLevel::L, 7, 0b110100101110110)]
    #[test_case(ECLevel::M, 0, 0b101010000010010)]
    #[test_case(ECLevel::M, 5, 0b100000011001110)]
    #[test_case(ECLevel::Q, 2, 0b011111100110001)]
    #[test_case(ECLevel::H, 0, 0b001011010001001)]
    #[test_case(ECLevel::H, 7, 0b000100000111011)]
    fn test_format_info(ecl: ECLevel, mask: u8, exp: u32) {
        assert_eq!(ecl.format_info(MaskPattern::new(mask).unwrap()), exp);
    }

    #[test]
    fn test_format_bits_round_trip() {
        for ecl in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
            assert_eq!(ECLevel::from_format_bits(ecl.format_bits()), ecl);
        }
    }

    #[test]
    fn test_format_infos_distance() {
        for (i, a) in FORMAT_INFOS.iter().enumerate() {
            for b in FORMAT_INFOS.iter().skip(i + 1) {
                assert!((a ^ b).count_ones() >= 7, "Codewords too close: {a:015b}, {b:015b}");
            }
        }
    }
}

// Color
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Dark,
    Light,
}

impl Not for Color {
    type Output = Self;
    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl From<bool> for Color {
    fn from(is_dark: bool) -> Self {
        if is_dark {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

impl From<Color> for Luma<u8> {
    fn from(color: Color) -> Self {
        match color {
            Color::Dark => Luma([0]),
            Color::Light => Luma([255]),
        }
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        match color {
            Color::Dark => Rgb([0, 0, 0]),
            Color::Light => Rgb([255, 255, 255]),
        }
    }
}

// Global constants
//------------------------------------------------------------------------------

const fn raw_data_modules(ver: usize) -> usize {
    let mut res = (16 * ver + 128) * ver + 64;
    if ver >= 2 {
        let align_count = ver / 7 + 2;
        res -= (25 * align_count - 10) * align_count - 55;
        if ver >= 7 {
            res -= 36;
        }
    }
    res
}

// Masked format info codewords, indexed by (ec level bits << 3 | mask)
pub static FORMAT_INFOS: [u32; 32] = build_format_infos();

const fn build_format_infos() -> [u32; 32] {
    let mut res = [0u32; 32];
    let mut i = 0;
    while i < 32 {
        let data = i as u32;
        let mut rem = data;
        let mut j = 0;
        while j < 10 {
            rem = (rem << 1) ^ ((rem >> 9) * FORMAT_GENERATOR);
            j += 1;
        }
        res[i] = ((data << 10) | rem) ^ FORMAT_MASK;
        i += 1;
    }
    res
}

pub static VERSION_INFOS: [u32; 41] = build_version_infos();

const fn build_version_infos() -> [u32; 41] {
    let mut res = [0u32; 41];
    let mut v = 7;
    while v <= 40 {
        let data = v as u32;
        let mut rem = data;
        let mut j = 0;
        while j < 12 {
            rem = (rem << 1) ^ ((rem >> 11) * VERSION_GENERATOR);
            j += 1;
        }
        res[v] = (data << 12) | rem;
        v += 1;
    }
    res
}

static ALIGNMENT_PATTERN_POSITIONS: [[u8; 7]; 41] = build_alignment_positions();

const fn build_alignment_positions() -> [[u8; 7]; 41] {
    let mut res = [[0u8; 7]; 41];
    let mut v = 2;
    while v <= 40 {
        let count = v / 7 + 2;
        let step = if v == 32 { 26 } else { (v * 4 + count * 2 + 1) / (count * 2 - 2) * 2 };
        res[v][0] = 6;
        let mut i = 1;
        while i < count {
            res[v][count - i] = (17 + 4 * v - 7 - (i - 1) * step) as u8;
            i += 1;
        }
        v += 1;
    }
    res
}

pub const FORMAT_GENERATOR: u32 = 0x537;

pub const FORMAT_MASK: u32 = 0x5412;

pub const VERSION_GENERATOR: u32 = 0x1F25;

pub const FORMAT_ERROR_CAPACITY: u32 = 3;

pub const VERSION_ERROR_CAPACITY: u32 = 3;

#[rustfmt::skip]
static ECC_PER_BLOCK: [[u8; 41]; 4] = [
    [0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
    [0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28],
    [0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
    [0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30],
];

#[rustfmt::skip]
static BLOCK_COUNT: [[u8; 41]; 4] = [
    [0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25],
    [0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21, 23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49],
    [0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68],
    [0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81],
];
