use log::debug;

use crate::{
    builder::{Module, FORMAT_INFO_COORDS_MAIN, FORMAT_INFO_COORDS_SIDE, QR, VERSION_INFO_BIT_LEN},
    common::{
        bit_utils::BitStream,
        codec::decode,
        ec::{rectify_info, Block},
        error::{QRError, QRResult},
        grid::Grid,
        iter::EncRegionIter,
        mask::MaskPattern,
        metadata::{
            ECLevel, Metadata, Version, FORMAT_ERROR_CAPACITY, FORMAT_INFOS, VERSION_ERROR_CAPACITY,
            VERSION_INFOS,
        },
    },
};

// QR type for reader
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DeQR<'a> {
    grid: &'a Grid,
    ver: Version,
}

impl<'a> DeQR<'a> {
    pub fn from_grid(grid: &'a Grid) -> QRResult<Self> {
        let ver = grid.version()?;
        Ok(Self { grid, ver })
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    // Negative coordinates wrap around from the bottom or right edge
    fn get(&self, r: i16, c: i16) -> bool {
        let w = self.grid.side() as i16;
        debug_assert!(-w <= r && r < w, "Row out of bounds: {r}");
        debug_assert!(-w <= c && c < w, "Column out of bounds: {c}");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        self.grid.get(r as usize, c as usize)
    }

    // Reads modules into a number, first coordinate as the most significant bit
    fn get_number(&self, coords: &[(i16, i16)]) -> u32 {
        coords.iter().fold(0, |n, &(r, c)| (n << 1) | self.get(r, c) as u32)
    }
}

// Format & version info
//------------------------------------------------------------------------------

impl DeQR<'_> {
    // The copy around the top left finder wins when both are readable
    pub fn read_format_info(&self) -> QRResult<(ECLevel, MaskPattern)> {
        let main = self.get_number(&FORMAT_INFO_COORDS_MAIN);
        let info = rectify_info(main, &FORMAT_INFOS, FORMAT_ERROR_CAPACITY)
            .or_else(|| {
                let side = self.get_number(&FORMAT_INFO_COORDS_SIDE);
                rectify_info(side, &FORMAT_INFOS, FORMAT_ERROR_CAPACITY)
            })
            .ok_or(QRError::FormatInfoCorrupt)?;

        // Table index is the 2 level bits followed by the 3 mask bits
        let idx = FORMAT_INFOS.iter().position(|&f| f == info).ok_or(QRError::FormatInfoCorrupt)?;
        let ecl = ECLevel::from_format_bits((idx >> 3) as u32);
        let mask = MaskPattern::new_unchecked((idx & 0b111) as u8);
        Ok((ecl, mask))
    }

    // Reads the block above the bottom left finder, then the one left of the top
    // right finder
    pub fn read_version_info(&self) -> QRResult<Version> {
        let w = self.grid.side() as i16;
        let (mut bl, mut tr) = (0, 0);
        for i in (0..VERSION_INFO_BIT_LEN).rev() {
            let (a, b) = ((i / 3) as i16, w - 11 + (i % 3) as i16);
            bl = (bl << 1) | self.get(b, a) as u32;
            tr = (tr << 1) | self.get(a, b) as u32;
        }

        let valid = &VERSION_INFOS[7..];
        let info = rectify_info(bl, valid, VERSION_ERROR_CAPACITY)
            .or_else(|| rectify_info(tr, valid, VERSION_ERROR_CAPACITY))
            .ok_or(QRError::VersionInfoCorrupt)?;
        let v = valid.iter().position(|&n| n == info).ok_or(QRError::VersionInfoCorrupt)?;
        Version::new(v + 7)
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl DeQR<'_> {
    // Reads codewords along the placement path, skipping everything a template
    // symbol of the same version draws, and removing the mask on the fly
    pub fn extract_payload(&self, mask: MaskPattern) -> Vec<u8> {
        let template = QR::template(self.ver);
        let mask_fn = mask.mask_function();
        let total_codewords = self.ver.total_codewords();

        let mut codewords = Vec::with_capacity(total_codewords);
        let mut coords = EncRegionIter::new(self.ver);
        for _ in 0..total_codewords {
            let mut codeword = 0u8;
            for _ in 0..8 {
                for (r, c) in coords.by_ref() {
                    if template.get(r, c) == Module::Empty {
                        let bit = self.get(r, c) ^ mask_fn(r, c);
                        codeword = (codeword << 1) | bit as u8;
                        break;
                    }
                }
            }
            codewords.push(codeword);
        }
        codewords
    }

    pub fn decode(&self) -> QRResult<(Metadata, String)> {
        let (ecl, mask) = self.read_format_info()?;
        debug!("Read format info: Version {}, Ec level {ecl:?}, Mask {}", *self.ver, *mask);

        let codewords = self.extract_payload(mask);
        let data = rectify_payload(&codewords, self.ver, ecl)?;

        let mut enc = BitStream::from(&data);
        let msg = decode(&mut enc, self.ver)?;
        Ok((Metadata::new(self.ver, ecl, Some(mask)), msg))
    }
}

// Splits interleaved codewords into blocks and corrects each. Fails when any
// block can't be corrected, after attempting all of them
pub fn rectify_payload(codewords: &[u8], ver: Version, ecl: ECLevel) -> QRResult<Vec<u8>> {
    let mut blocks = deinterleave(codewords, ver, ecl);
    let total = blocks.len();

    let mut data = Vec::with_capacity(ver.data_codewords(ecl));
    let mut failed = 0;
    for blk in blocks.iter_mut() {
        match blk.rectify() {
            Ok(d) => data.extend_from_slice(d),
            Err(_) => failed += 1,
        }
    }

    if failed > 0 {
        debug!("{failed} of {total} blocks uncorrectable");
        return Err(QRError::SymbolUnrecoverable { failed, total });
    }
    Ok(data)
}

fn deinterleave(data: &[u8], ver: Version, ecl: ECLevel) -> Vec<Block> {
    // b1s = block1_size, b1c = block1_count
    let (b1s, b1c, b2s, b2c) = ver.data_codewords_per_block(ecl);
    let ec_len = ver.ecc_per_block(ecl);

    let total_blks = b1c + b2c;
    let spl = b1s * total_blks;
    let data_sz = b1s * b1c + b2s * b2c;
    debug_assert!(data.len() == data_sz + ec_len * total_blks, "Codeword count mismatch");

    let mut dilvd = vec![Vec::with_capacity(b1s.max(b2s) + ec_len); total_blks];

    // Deinterleaving data
    data[..spl]
        .chunks(total_blks)
        .for_each(|ch| ch.iter().enumerate().for_each(|(i, v)| dilvd[i].push(*v)));
    if b2c > 0 {
        data[spl..data_sz]
            .chunks(b2c)
            .for_each(|ch| ch.iter().enumerate().for_each(|(i, v)| dilvd[b1c + i].push(*v)));
    }

    // Deinterleaving ecc
    data[data_sz..]
        .chunks(total_blks)
        .for_each(|ch| ch.iter().enumerate().for_each(|(i, v)| dilvd[i].push(*v)));

    dilvd.iter().map(|b| Block::with_encoded(b, b.len() - ec_len)).collect()
}

#[cfg(test)]
mod deqr_payload_tests {
    use super::{deinterleave, rectify_payload, DeQR};
    use crate::{
        builder::QRBuilder,
        common::{
            ec::{ecc, interleave, Block},
            error::QRError,
            metadata::{ECLevel, Version},
        },
    };

    #[test]
    fn test_deinterleave() {
        let ver = Version::new(5).unwrap();
        let ecl = ECLevel::Q;
        let data = (0..62).collect::<Vec<u8>>();

        let (data_blocks, ecc_blocks) = ecc(&data, ver, ecl);
        let mut payload = interleave(&data_blocks);
        payload.extend(interleave(&ecc_blocks));

        let blocks = deinterleave(&payload, ver, ecl);
        assert_eq!(blocks.len(), 4);
        for (blk, raw) in blocks.iter().zip(data_blocks.iter()) {
            assert_eq!(*blk, Block::new(raw, raw.len() + 18));
        }
    }

    #[test]
    fn test_decode() {
        let data = "Hello, world! 🌎";
        let qr = QRBuilder::new(data.as_bytes()).ec_level(ECLevel::M).build().unwrap();
        let grid = qr.to_grid();
        let (meta, msg) = DeQR::from_grid(&grid).unwrap().decode().unwrap();
        assert_eq!(msg, data);
        assert_eq!(meta, qr.metadata());
    }

    #[test]
    fn test_decode_large() {
        let data = "0123456789".repeat(50) + &"ABCDEFGH".repeat(25) + &"qrkit ".repeat(30);
        let qr = QRBuilder::new(data.as_bytes()).ec_level(ECLevel::Q).build().unwrap();
        assert!(*qr.version() >= 15);
        let grid = qr.to_grid();
        let (_, msg) = DeQR::from_grid(&grid).unwrap().decode().unwrap();
        assert_eq!(msg, data);
    }

    #[test]
    fn test_error_correction_capacity() {
        // Version 5-H holds 2 blocks of 11 and 2 blocks of 12 data codewords, each
        // with 22 error correction codewords
        let data = b"error correction capacity";
        let ver = Version::new(5).unwrap();
        let qr = QRBuilder::new(data).version(ver).ec_level(ECLevel::H).build().unwrap();
        let grid = qr.to_grid();
        let deqr = DeQR::from_grid(&grid).unwrap();
        let (ecl, mask) = deqr.read_format_info().unwrap();
        let codewords = deqr.extract_payload(mask);
        let clean = rectify_payload(&codewords, ver, ecl).unwrap();

        // First 11 codewords of every block
        let mut corrupted = codewords.clone();
        corrupted[..44].iter_mut().for_each(|c| *c ^= 0x5a);
        assert_eq!(rectify_payload(&corrupted, ver, ecl).unwrap(), clean);

        // Every data codeword and a few error correction codewords of each block
        let mut corrupted = codewords.clone();
        corrupted[..60].iter_mut().for_each(|c| *c ^= 0x5a);
        match rectify_payload(&corrupted, ver, ecl) {
            Err(QRError::SymbolUnrecoverable { failed, total }) => {
                assert!(failed >= 1);
                assert_eq!(total, 4);
            }
            res => panic!("Expected unrecoverable symbol, got {res:?}"),
        }
    }
}
