use thiserror::Error;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    // QR builder
    #[error("Payload exceeds the data capacity of the symbol")]
    CapacityExceeded,
    #[error("Invalid version: {0}")]
    InvalidVersion(usize),
    #[error("Invalid masking pattern: {0}")]
    InvalidMaskingPattern(u8),

    // QR reader
    #[error("No symbol found")]
    NoSymbolFound,
    #[error("Format info is corrupt beyond correction")]
    FormatInfoCorrupt,
    #[error("Version info is corrupt beyond correction")]
    VersionInfoCorrupt,
    #[error("Too many errors to correct the block")]
    UncorrectableBlock,
    #[error("Symbol unrecoverable: {failed} of {total} blocks uncorrectable")]
    SymbolUnrecoverable { failed: usize, total: usize },
    #[error("Cannot compute homography")]
    SingularMatrix,
    #[error("Projected point is at infinity")]
    PointAtInfinity,
    #[error("Invalid mode indicator: {0:#06b}")]
    InvalidMode(u8),
    #[error("Corrupt data segment")]
    CorruptDataSegment,
    #[error("Invalid character encoding")]
    InvalidCharacterEncoding,
    #[error("Image buffer of {len} bytes doesn't match {width}x{height} with {channels} channels")]
    InvalidImageBuffer { width: u32, height: u32, channels: usize, len: usize },
    #[error("Grid of {len} modules doesn't match side {side}")]
    InvalidGridSize { side: usize, len: usize },
}

pub type QRResult<T> = Result<T, QRError>;

#[cfg(test)]
mod error_tests {
    use super::QRError;

    #[test]
    fn test_display() {
        assert_eq!(QRError::InvalidVersion(41).to_string(), "Invalid version: 41");
        assert_eq!(QRError::InvalidMode(0b0011).to_string(), "Invalid mode indicator: 0b0011");
        let err = QRError::SymbolUnrecoverable { failed: 2, total: 5 };
        assert_eq!(err.to_string(), "Symbol unrecoverable: 2 of 5 blocks uncorrectable");
        let err = QRError::InvalidGridSize { side: 21, len: 440 };
        assert_eq!(err.to_string(), "Grid of 440 modules doesn't match side 21");
    }
}
