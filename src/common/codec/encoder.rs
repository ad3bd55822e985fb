use std::mem::swap;

use log::debug;

use super::{Mode, Segment, MODES};
use crate::common::{
    bit_utils::BitStream,
    error::{QRError, QRResult},
    metadata::{ECLevel, Version},
};
use writer::{pad_remaining_capacity, push_segment, push_terminator};

// Encoder
//------------------------------------------------------------------------------

// Encodes data into the smallest version that fits it at the given EC level
pub fn encode(data: &[u8], ecl: ECLevel) -> QRResult<(BitStream, Version)> {
    let (ver, segs) = find_optimal_version_and_segments(data, ecl)?;
    debug!("Encoding {} bytes in {} segments into version {}", data.len(), segs.len(), *ver);
    Ok((write_segments(segs, ver, ecl), ver))
}

pub fn encode_with_version(data: &[u8], ver: Version, ecl: ECLevel) -> QRResult<BitStream> {
    let bcap = ver.data_bit_capacity(ecl);
    let segs = compute_optimal_segments(data, ver);
    let sz: usize = segs.iter().map(|s| s.bit_len()).sum();
    if sz > bcap {
        return Err(QRError::CapacityExceeded);
    }
    debug!("Encoding {} bytes in {} segments into version {}", data.len(), segs.len(), *ver);
    Ok(write_segments(segs, ver, ecl))
}

fn write_segments(segs: Vec<Segment<'_>>, ver: Version, ecl: ECLevel) -> BitStream {
    let mut bs = BitStream::new(ver.data_bit_capacity(ecl));
    for seg in segs {
        push_segment(seg, &mut bs);
    }
    push_terminator(&mut bs);
    pad_remaining_capacity(&mut bs);
    bs
}

// Char count bit widths change at versions 10 and 27, so segments are recomputed
// only when entering those ranges
fn find_optimal_version_and_segments(
    data: &[u8],
    ecl: ECLevel,
) -> QRResult<(Version, Vec<Segment<'_>>)> {
    let mut segs = vec![];
    let mut sz = 0;
    for v in 1..=40 {
        let ver = Version::new_unchecked(v);
        if v == 1 || v == 10 || v == 27 {
            segs = compute_optimal_segments(data, ver);
            sz = segs.iter().map(|s| s.bit_len()).sum();
        }
        if sz <= ver.data_bit_capacity(ecl) {
            return Ok((ver, segs));
        }
    }
    Err(QRError::CapacityExceeded)
}

// Dynamic programming over modes. Costs are in sixths of a bit so that numeric
// (10/3 bits) and alphanumeric (11/2 bits) chars stay integral
fn compute_optimal_segments(data: &[u8], ver: Version) -> Vec<Segment<'_>> {
    if data.is_empty() {
        return vec![Segment::new(Mode::Byte, ver.mode_bits(), ver.char_cnt_bits(Mode::Byte), data)];
    }

    let header_cost = |m: Mode| (ver.mode_bits() + ver.char_cnt_bits(m)) * 6;

    let len = data.len();
    let mut prev_cost = MODES.map(header_cost);
    let mut cur_cost = [usize::MAX; 3];
    let mut min_path = vec![[usize::MAX; 3]; len];
    for (i, &b) in data.iter().enumerate() {
        for (j, &to_mode) in MODES.iter().enumerate() {
            if !to_mode.contains(b) {
                continue;
            }
            let char_cost = match to_mode {
                Mode::Numeric => 20,
                Mode::Alphanumeric => 33,
                _ => 48,
            };
            for (k, &from_mode) in MODES.iter().enumerate() {
                if prev_cost[k] == usize::MAX {
                    continue;
                }
                let mut cost = if to_mode != from_mode {
                    prev_cost[k].div_ceil(6) * 6 + header_cost(to_mode)
                } else {
                    prev_cost[k]
                };
                cost += char_cost;
                if cost < cur_cost[j] {
                    cur_cost[j] = cost;
                    min_path[i][j] = k;
                }
            }
        }
        swap(&mut prev_cost, &mut cur_cost);
        cur_cost.fill(usize::MAX);
    }

    let char_modes = trace_optimal_modes(&min_path, prev_cost);
    build_segments(ver, &char_modes, data)
}

// Backtracks min_path from the cheapest final mode
fn trace_optimal_modes(min_path: &[[usize; 3]], last_cost: [usize; 3]) -> Vec<Mode> {
    let mut mi = (0..3).min_by_key(|&i| last_cost[i]).unwrap_or(2);
    let mut res = vec![Mode::Byte; min_path.len()];
    for (i, m) in res.iter_mut().enumerate().rev() {
        *m = MODES[mi];
        mi = min_path[i][mi];
    }
    res
}

// Merges runs of chars sharing a mode into segments
fn build_segments<'a>(ver: Version, char_modes: &[Mode], data: &'a [u8]) -> Vec<Segment<'a>> {
    let mut segs = vec![];
    let mut start = 0;
    for (i, w) in char_modes.windows(2).enumerate() {
        if w[0] != w[1] {
            let mode = w[0];
            segs.push(Segment::new(
                mode,
                ver.mode_bits(),
                ver.char_cnt_bits(mode),
                &data[start..=i],
            ));
            start = i + 1;
        }
    }
    let mode = char_modes[start];
    segs.push(Segment::new(mode, ver.mode_bits(), ver.char_cnt_bits(mode), &data[start..]));
    segs
}

#[cfg(test)]
mod encoder_tests {
    use test_case::test_case;

    use super::{
        build_segments, compute_optimal_segments, encode, encode_with_version,
        find_optimal_version_and_segments, Mode, Segment,
    };
    use crate::common::{
        error::QRError,
        metadata::{ECLevel, Version},
    };

    #[test]
    fn test_build_segments() {
        let data = "aaaaa11111AAA";
        let ver = Version::new(1).unwrap();
        let mut char_modes = vec![Mode::Alphanumeric; 5];
        char_modes.extend([Mode::Numeric; 5]);
        char_modes.extend([Mode::Byte; 3]);
        let segs = build_segments(ver, &char_modes, data.as_bytes());
        let exp = [(Mode::Alphanumeric, 0..5), (Mode::Numeric, 5..10), (Mode::Byte, 10..13)]
            .map(|(m, r)| Segment::new(m, 4, ver.char_cnt_bits(m), data[r].as_bytes()));
        assert_eq!(segs, exp);
    }

    #[test_case("1111111", 1, vec![(Mode::Numeric, 0, None)])]
    #[test_case("AAAAA", 1, vec![(Mode::Alphanumeric, 0, None)])]
    #[test_case("aaaaa", 1, vec![(Mode::Byte, 0, None)])]
    #[test_case("1111111AAAA", 1, vec![(Mode::Numeric, 0, Some(7)), (Mode::Alphanumeric, 7, None)])]
    #[test_case("111111AAAA", 1, vec![(Mode::Alphanumeric, 0, None)])]
    #[test_case("aaa11111a", 1, vec![(Mode::Byte, 0, None)])]
    #[test_case("aaa111111a", 1, vec![(Mode::Byte, 0, Some(3)), (Mode::Numeric, 3, Some(9)), (Mode::Byte, 9, None)])]
    #[test_case("aaa1111A", 1, vec![(Mode::Byte, 0, None)])]
    #[test_case("aaa1111AA", 1, vec![(Mode::Byte, 0, Some(3)), (Mode::Alphanumeric, 3, None)])]
    #[test_case("aaa1111111AA", 1, vec![(Mode::Byte, 0, Some(3)), (Mode::Numeric, 3, Some(10)), (Mode::Alphanumeric, 10, None)])]
    #[test_case("HELLO WORLD", 1, vec![(Mode::Alphanumeric, 0, None)])]
    fn test_compute_optimal_segments(
        data: &str,
        ver: usize,
        chunks: Vec<(Mode, usize, Option<usize>)>,
    ) {
        let ver = Version::new(ver).unwrap();
        let segs = compute_optimal_segments(data.as_bytes(), ver);
        assert_eq!(segs.len(), chunks.len());
        for (seg, &(mode, start, end)) in segs.iter().zip(chunks.iter()) {
            let end = end.unwrap_or(data.len());
            let exp = Segment::new(mode, 4, ver.char_cnt_bits(mode), data[start..end].as_bytes());
            assert_eq!(*seg, exp);
        }
    }

    #[test]
    fn test_compute_optimal_segments_alternating() {
        let data = "A11111111111111".repeat(23);
        let ver = Version::new(9).unwrap();
        let segs = compute_optimal_segments(data.as_bytes(), ver);
        assert_eq!(segs.len(), 46);
        for (i, c) in data.as_bytes().chunks(15).enumerate() {
            assert_eq!(segs[i * 2].mode, Mode::Alphanumeric);
            assert_eq!(segs[i * 2].data, &c[..1]);
            assert_eq!(segs[i * 2 + 1].mode, Mode::Numeric);
            assert_eq!(segs[i * 2 + 1].data, &c[1..]);
        }
    }

    #[test]
    fn test_compute_optimal_segments_empty() {
        let segs = compute_optimal_segments(b"", Version::new(1).unwrap());
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].mode, Mode::Byte);
        assert_eq!(segs[0].bit_len(), 12);
    }

    #[test_case("aaaaa11111AAA".to_string(), 1, ECLevel::L)]
    #[test_case("A11111111111111".repeat(2), 2, ECLevel::L)]
    #[test_case("A11111111111111".repeat(4), 3, ECLevel::L)]
    #[test_case("aAAAAAAAAAAA".repeat(5), 4, ECLevel::L)]
    #[test_case("aAAAAAAAAAAA".repeat(21), 10, ECLevel::L)]
    #[test_case("a".repeat(2953), 40, ECLevel::L)]
    #[test_case("a".repeat(1273), 40, ECLevel::H)]
    #[test_case("1".repeat(7089), 40, ECLevel::L)]
    fn test_find_optimal_ver_and_segments(data: String, exp_ver: usize, ecl: ECLevel) {
        let (ver, _) = find_optimal_version_and_segments(data.as_bytes(), ecl).unwrap();
        assert_eq!(*ver, exp_ver);
    }

    #[test_case("a".repeat(2954), ECLevel::L)]
    #[test_case("a".repeat(1274), ECLevel::H)]
    #[test_case("1".repeat(7090), ECLevel::L)]
    fn test_find_optimal_ver_and_segments_overflow(data: String, ecl: ECLevel) {
        let res = find_optimal_version_and_segments(data.as_bytes(), ecl);
        assert_eq!(res.unwrap_err(), QRError::CapacityExceeded);
    }

    #[test]
    fn test_encode_hello_world() {
        let (bs, ver) = encode(b"HELLO WORLD", ECLevel::M).unwrap();
        assert_eq!(*ver, 1);
        assert_eq!(bs.data(), b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11");
    }

    #[test]
    fn test_encode_empty() {
        let (bs, ver) = encode(b"", ECLevel::L).unwrap();
        assert_eq!(*ver, 1);
        assert_eq!(bs.len(), 19 * 8);
        assert_eq!(&bs.data()[..4], [0b0100_0000, 0b0000_0000, 0xec, 0x11]);
    }

    #[test]
    fn test_encode_with_version() {
        let ver = Version::new(9).unwrap();
        let bs = encode_with_version("!".repeat(230).as_bytes(), ver, ECLevel::L).unwrap();
        assert_eq!(bs.len(), ver.data_bit_capacity(ECLevel::L));
        let res = encode_with_version("!".repeat(231).as_bytes(), ver, ECLevel::L);
        assert_eq!(res, Err(QRError::CapacityExceeded));
    }
}

// Writer for encoded data
//------------------------------------------------------------------------------

mod writer {
    use crate::common::{
        bit_utils::BitStream,
        codec::{Mode, Segment, PADDING_CODEWORDS},
    };

    pub fn push_segment(seg: Segment, out: &mut BitStream) {
        push_header(&seg, out);
        match seg.mode {
            Mode::Numeric => push_chunks(seg.data, Mode::Numeric, 3, out),
            Mode::Alphanumeric => push_chunks(seg.data, Mode::Alphanumeric, 2, out),
            _ => push_chunks(seg.data, Mode::Byte, 1, out),
        }
    }

    pub(super) fn push_header(seg: &Segment, out: &mut BitStream) {
        out.push_bits(seg.mode as u8, seg.mode_bits);
        let char_cnt = seg.data.len();
        debug_assert!(
            char_cnt < (1 << seg.len_bits),
            "Char count exceeds bit length: Char count {char_cnt}, Char count bits {}",
            seg.len_bits
        );
        out.push_bits(char_cnt as u16, seg.len_bits);
    }

    pub(super) fn push_chunks(data: &[u8], mode: Mode, chunk_sz: usize, out: &mut BitStream) {
        for chunk in data.chunks(chunk_sz) {
            out.push_bits(mode.encode_chunk(chunk), mode.encoded_len(chunk.len()));
        }
    }

    pub fn push_terminator(out: &mut BitStream) {
        let term_len = 4.min(out.capacity() - out.len());
        out.push_bits(0u8, term_len);
    }

    pub fn pad_remaining_capacity(out: &mut BitStream) {
        let offset = out.len() & 7;
        if offset > 0 {
            out.push_bits(0u8, 8 - offset);
        }

        let remaining = (out.capacity() - out.len()) >> 3;
        for &pc in PADDING_CODEWORDS.iter().cycle().take(remaining) {
            out.push_bits(pc, 8);
        }
    }

    #[cfg(test)]
    mod writer_tests {
        use test_case::test_case;

        use super::{pad_remaining_capacity, push_chunks, push_header, push_terminator};
        use crate::common::{
            bit_utils::BitStream,
            codec::{Mode, Segment, PADDING_CODEWORDS},
            metadata::{ECLevel, Version},
        };

        #[test_case(1, Mode::Numeric, 1023, &[0b00011111, 0b11111100])]
        #[test_case(1, Mode::Alphanumeric, 511, &[0b00101111, 0b11111000])]
        #[test_case(1, Mode::Byte, 255, &[0b01001111, 0b11110000])]
        #[test_case(10, Mode::Numeric, 4095, &[0b00011111, 0b11111111])]
        #[test_case(10, Mode::Alphanumeric, 2047, &[0b00101111, 0b11111110])]
        #[test_case(10, Mode::Byte, 65535, &[0b01001111, 0b11111111, 0b11110000])]
        #[test_case(27, Mode::Numeric, 16383, &[0b00011111, 0b11111111, 0b11000000])]
        #[test_case(27, Mode::Alphanumeric, 8191, &[0b00101111, 0b11111111, 0b10000000])]
        fn test_push_header(ver: usize, mode: Mode, char_cnt: usize, exp: &[u8]) {
            let ver = Version::new(ver).unwrap();
            let dummy = vec![0; char_cnt];
            let mut bs = BitStream::new(ver.data_bit_capacity(ECLevel::L));
            let seg = Segment::new(mode, ver.mode_bits(), ver.char_cnt_bits(mode), &dummy);
            push_header(&seg, &mut bs);
            assert_eq!(bs.data(), exp);
        }

        #[test_case(Mode::Numeric, 3, "01234567", &[0b00000011, 0b00010101, 0b10011000, 0b01100000])]
        #[test_case(Mode::Numeric, 3, "8", &[0b10000000])]
        #[test_case(Mode::Alphanumeric, 2, "AC-42", &[0b00111001, 0b11011100, 0b11100100, 0b00100000])]
        #[test_case(Mode::Byte, 1, "a", &[0b01100001])]
        fn test_push_chunks(mode: Mode, chunk_sz: usize, data: &str, exp: &[u8]) {
            let mut bs = BitStream::new(152);
            push_chunks(data.as_bytes(), mode, chunk_sz, &mut bs);
            assert_eq!(bs.data(), exp);
        }

        #[test]
        fn test_push_terminator() {
            let mut bs = BitStream::new(152);
            bs.push_bits(1u8, 1);
            push_terminator(&mut bs);
            assert_eq!(bs.len(), 5);
            for _ in 0..18 {
                bs.push_bits(0xffu8, 8);
            }
            bs.push_bits(0b11u8, 2);
            push_terminator(&mut bs);
            assert_eq!(bs.len(), 152);
        }

        #[test]
        fn test_pad_remaining_capacity() {
            let mut bs = BitStream::new(152);
            bs.push_bits(1u8, 1);
            pad_remaining_capacity(&mut bs);
            let mut exp = vec![0b10000000];
            exp.extend(PADDING_CODEWORDS.iter().cycle().take(18));
            assert_eq!(bs.data(), exp);
        }
    }
}
