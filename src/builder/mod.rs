mod qr;

pub(crate) use qr::{Module, FORMAT_INFO_COORDS_MAIN, FORMAT_INFO_COORDS_SIDE, VERSION_INFO_BIT_LEN};
pub use qr::{QR, QUIET_ZONE};

use log::debug;

use crate::common::{
    bit_utils::BitStream,
    codec::{encode, encode_with_version},
    ec::{ecc, interleave},
    error::QRResult,
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
};

#[derive(Debug, Clone)]
pub struct QRBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, version: None, ec_level: ECLevel::M, mask: None }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn unset_mask(&mut self) -> &mut Self {
        self.mask = None;
        self
    }

    pub fn metadata(&self) -> String {
        let ver = self.version.map_or("None".to_string(), |v| (*v).to_string());
        let mask = self.mask.map_or("None".to_string(), |m| (*m).to_string());
        format!("{{ Version: {ver}, Ec level: {:?}, Mask: {mask} }}", self.ec_level)
    }
}


impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        debug!("Generating QR {}", self.metadata());

        // Encode data optimally
        let (encoded, ver) = match self.version {
            Some(v) => (encode_with_version(self.data, v, self.ec_level)?, v),
            None => encode(self.data, self.ec_level)?,
        };
        debug!("Encoded {} bytes into version {}", self.data.len(), *ver);

        // Interleave data & error correction codewords
        let (data_blocks, ecc_blocks) = ecc(encoded.data(), ver, self.ec_level);
        let mut payload = interleave(&data_blocks);
        payload.extend(interleave(&ecc_blocks));
        debug_assert!(
            payload.len() == ver.total_codewords(),
            "Payload len {} doesn't match total codewords {}",
            payload.len(),
            ver.total_codewords()
        );

        let mut qr = QR::new(ver, self.ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(BitStream::from(&payload));

        match self.mask {
            Some(m) => {
                debug!("Applying mask {}", *m);
                qr.apply_mask(m);
            }
            None => {
                apply_best_mask(&mut qr);
            }
        }

        Ok(qr)
    }
}

#[cfg(test)]
mod builder_tests {
    use test_case::test_case;

    use super::QRBuilder;
    use crate::common::{
        error::QRError,
        mask::MaskPattern,
        metadata::{ECLevel, Version},
    };

    #[test]
    fn test_hello_world() {
        let qr = QRBuilder::new(b"HELLO WORLD").ec_level(ECLevel::M).build().unwrap();
        assert_eq!(*qr.version(), 1);
        assert_eq!(qr.width(), 21);
        assert!(qr.mask().is_some());
    }

    #[test]
    fn test_empty_payload() {
        let qr = QRBuilder::new(b"").ec_level(ECLevel::L).build().unwrap();
        assert_eq!(*qr.version(), 1);
    }

    #[test_case(ECLevel::L, 2)]
    #[test_case(ECLevel::M, 2)]
    #[test_case(ECLevel::Q, 2)]
    #[test_case(ECLevel::H, 3)]
    fn test_version_by_level(ecl: ECLevel, exp: usize) {
        // 20 bytes in byte mode
        let qr = QRBuilder::new(b"hello world, hello!!").ec_level(ecl).build().unwrap();
        assert_eq!(*qr.version(), exp);
    }

    #[test]
    fn test_explicit_version_and_mask() {
        let mask = MaskPattern::new(5).unwrap();
        let qr = QRBuilder::new(b"https://example.com")
            .version(Version::new(5).unwrap())
            .ec_level(ECLevel::Q)
            .mask(mask)
            .build()
            .unwrap();
        assert_eq!(qr.width(), 37);
        assert_eq!(qr.metadata().mask(), Some(mask));
        assert_eq!(qr.metadata().ec_level(), ECLevel::Q);
    }

    #[test]
    fn test_capacity_exceeded() {
        let data = [b'a'; 18];
        let res = QRBuilder::new(&data).version(Version::new(1).unwrap()).ec_level(ECLevel::L).build();
        assert_eq!(res.err(), Some(QRError::CapacityExceeded));
        let data = vec![b'a'; 2954];
        assert_eq!(QRBuilder::new(&data).ec_level(ECLevel::L).build().err(), Some(QRError::CapacityExceeded));
    }

    #[test]
    fn test_mask_determinism() {
        let a = QRBuilder::new(b"determinism").build().unwrap();
        let b = QRBuilder::new(b"determinism").build().unwrap();
        assert_eq!(a.mask(), b.mask());
        assert_eq!(a.to_grid(), b.to_grid());
    }
}
