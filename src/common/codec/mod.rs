pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::*;
pub use encoder::*;
pub use types::*;

#[cfg(test)]
mod codec_proptests {
    use proptest::prelude::*;

    use super::{decode, encode_with_version};
    use crate::common::metadata::{ECLevel, Version};

    fn ec_level_strategy() -> BoxedStrategy<ECLevel> {
        prop_oneof![Just(ECLevel::L), Just(ECLevel::M), Just(ECLevel::Q), Just(ECLevel::H)].boxed()
    }

    // Printable ascii mixes all three modes. Each char costs at most 8 bits, so
    // capacity minus the longest header bounds the length
    fn codec_strategy() -> impl Strategy<Value = (Version, ECLevel, String)> {
        (1usize..=40, ec_level_strategy()).prop_flat_map(|(v, ecl)| {
            let ver = Version::new(v).unwrap_or(Version::new_unchecked(1));
            let max_len = (ver.data_bit_capacity(ecl) - 20) / 8;
            "[ -~]*".prop_map(move |s: String| (ver, ecl, s.chars().take(max_len / 4).collect()))
        })
    }

    proptest! {
        #[test]
        fn proptest_codec(params in codec_strategy()) {
            let (ver, ecl, data) = params;
            let mut encoded = encode_with_version(data.as_bytes(), ver, ecl).unwrap();
            let decoded = decode(&mut encoded, ver).unwrap();
            prop_assert_eq!(data, decoded);
        }
    }
}
