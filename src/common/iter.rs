use super::metadata::Version;

// Iterator over the encoding region of a symbol
//------------------------------------------------------------------------------

// Walks column pairs from the right edge, alternating upward and downward, and
// skipping the vertical timing column. Yields every coordinate on the path as
// (row, col), function modules included; callers skip what isn't data
pub struct EncRegionIter {
    // Right column of the current pair
    right: i16,
    // Step within the current column pair
    step: i16,
    width: i16,
}

impl EncRegionIter {
    pub fn new(ver: Version) -> Self {
        let w = ver.width() as i16;
        Self { right: w - 1, step: 0, width: w }
    }
}

impl Iterator for EncRegionIter {
    type Item = (i16, i16);
    fn next(&mut self) -> Option<Self::Item> {
        if self.right < 1 {
            return None;
        }

        let vert = self.step >> 1;
        let c = self.right - (self.step & 1);
        let upward = (self.right + 1) & 2 == 0;
        let r = if upward { self.width - 1 - vert } else { vert };

        self.step += 1;
        if self.step == self.width * 2 {
            self.step = 0;
            self.right -= 2;
            if self.right == 6 {
                self.right = 5;
            }
        }
        Some((r, c))
    }
}

#[cfg(test)]
mod iter_tests {
    use super::EncRegionIter;
    use crate::common::metadata::Version;

    #[test]
    fn test_enc_region_start() {
        let coords = EncRegionIter::new(Version::new(1).unwrap()).take(6).collect::<Vec<_>>();
        assert_eq!(coords, [(20, 20), (20, 19), (19, 20), (19, 19), (18, 20), (18, 19)]);
    }

    #[test]
    fn test_enc_region_turns_downward() {
        let coords = EncRegionIter::new(Version::new(1).unwrap()).skip(42).take(2).collect::<Vec<_>>();
        assert_eq!(coords, [(0, 18), (0, 17)]);
    }

    #[test]
    fn test_enc_region_skips_timing_column() {
        for v in [1, 7, 40] {
            let ver = Version::new(v).unwrap();
            let w = ver.width();
            let coords = EncRegionIter::new(ver).collect::<Vec<_>>();
            assert_eq!(coords.len(), (w - 1) * w);
            assert!(coords.iter().all(|&(_, c)| c != 6));
            assert_eq!(coords.last(), Some(&(w as i16 - 1, 0)));
        }
    }
}
