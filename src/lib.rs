//! # qrkit
//!
//! A QR Code (model 2) encoder and decoder with Reed-Solomon error correction.
//!
//! ## Features
//!
//! - **Encoding**: Optimal segmentation into numeric, alphanumeric, byte and kanji segments,
//!   smallest fitting version, automatic or fixed mask
//! - **Rendering**: Grayscale and colored raster images, SVG and terminal strings
//! - **Decoding**: Binarization, finder detection, perspective correction and error
//!   correction for camera frames, luma or RGBA buffers, or already sampled module grids
//!
//! ## Quick Start
//!
//! ### Encoding
//!
//! ```rust
//! use qrkit::ECLevel;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Smallest version that fits, with the lowest penalty mask
//! let qr = qrkit::encode(b"Hello, World!", ECLevel::M)?;
//! assert_eq!(qr.width(), 21);
//!
//! let img = qr.to_image(4); // 4 pixels per module
//! # let _ = img;
//! # Ok(())
//! # }
//! ```
//!
//! ### Full Configuration
//!
//! ```rust
//! use qrkit::{ECLevel, MaskPattern, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QRBuilder::new(b"Hello, World!")
//!     .version(Version::new(3)?)     // If not provided, finds smallest version to fit data
//!     .ec_level(ECLevel::Q)          // If not provided, defaults to ECLevel::M
//!     .mask(MaskPattern::new(2)?)    // If not provided, finds best mask based on penalty score
//!     .build()?;
//!
//! let svg = qr.to_svg("#000", "#fff");
//! # let _ = svg;
//! # Ok(())
//! # }
//! ```
//!
//! ### Decoding
//!
//! ```rust
//! use qrkit::{ECLevel, Inversion, QRReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = qrkit::encode(b"Hello, World!", ECLevel::L)?.to_image(4);
//!
//! let (meta, msg) = QRReader::new()
//!     .inversion(Inversion::AttemptBoth) // Also look for light symbols on dark backgrounds
//!     .read(&img)?;
//! assert_eq!(msg, "Hello, World!");
//! assert_eq!(meta.ec_level(), ECLevel::L);
//! # Ok(())
//! # }
//! ```
//!
//! ## Symbol Components
//!
//! ### Versions
//! Versions 1-40, with sizes from 21x21 to 177x177 modules
//!
//! ### Error Correction Levels
//! - **L (Low)**: ~7% error correction
//! - **M (Medium)**: ~15% error correction
//! - **Q (Quartile)**: ~25% error correction
//! - **H (High)**: ~30% error correction

#![allow(clippy::items_after_test_module)]

pub mod builder;
pub(crate) mod common;
pub mod reader;

use image::DynamicImage;

pub use builder::{QRBuilder, QR};
pub use common::{
    error::{QRError, QRResult},
    grid::Grid,
    mask::MaskPattern,
    metadata::{Color, ECLevel, Metadata, Version},
};
pub use reader::{Inversion, QRReader};

// Encodes a payload into the smallest symbol that fits at the given level
pub fn encode(payload: &[u8], ecl: ECLevel) -> QRResult<QR> {
    QRBuilder::new(payload).ec_level(ecl).build()
}

// Decodes the first readable symbol in an image of any color type
pub fn decode(img: &DynamicImage) -> QRResult<(Metadata, String)> {
    QRReader::new().read(&img.to_luma8())
}

#[cfg(test)]
mod lib_tests {
    use image::DynamicImage;

    use super::{decode, encode, ECLevel, QRError};

    #[test]
    fn test_encode_decode() {
        let qr = encode(b"top level", ECLevel::H).unwrap();
        let img = DynamicImage::ImageLuma8(qr.to_image(3)).to_rgb8();
        let (meta, msg) = decode(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(msg, "top level");
        assert_eq!(meta, qr.metadata());
    }

    #[test]
    fn test_hello_world() {
        let qr = encode(b"HELLO WORLD", ECLevel::M).unwrap();
        assert_eq!(*qr.version(), 1);
        assert_eq!(qr.width(), 21);
    }

    #[test]
    fn test_decode_blank() {
        let img = DynamicImage::new_luma8(120, 120);
        assert_eq!(decode(&img), Err(QRError::NoSymbolFound));
    }
}
