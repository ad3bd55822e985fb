use geometry::Axis;

use super::binarize::BinaryImage;
use crate::common::metadata::Color;

pub mod geometry;
pub mod homography;

// Run lengths along a line through a seed pixel. Used by the finder locator to
// verify the 1:1:3:1:1 pattern and by the alignment locator for 1:1:1
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CrossCheck {
    // Centre of the middle run along the axis
    pub centre: f64,
    // Summed length of all runs
    pub len: u32,
    pub runs: Vec<u32>,
}

// Counts `pattern.len()` alternating runs centred on the run containing `seed`.
// Fails when the line leaves the image or a run grows beyond `max_run` before
// every run is closed by a color change, or when the runs don't fit the pattern
pub fn cross_check<A: Axis>(
    img: &BinaryImage,
    seed: (i32, i32),
    pattern: &[f64],
    max_run: u32,
) -> Option<CrossCheck> {
    let px = img.get(seed.0, seed.1)?;
    let pat_len = pattern.len();
    let mid = pat_len / 2;

    let mut run_len = vec![0; pat_len];
    run_len[mid] = 1;

    // Count backwards
    let mut pos = seed;
    let mut flips = mid;
    let mut initial = px;
    let mut mid_start = A::along(&seed);
    loop {
        A::shift(&mut pos, -1);
        let color = img.get(pos.0, pos.1)?;
        if initial != color {
            if flips == 0 {
                break;
            }
            initial = color;
            flips -= 1;
        }
        if flips == mid {
            mid_start = A::along(&pos);
        }
        run_len[flips] += 1;
        if run_len[flips] > max_run {
            return None;
        }
    }

    // Count forwards
    let mut pos = seed;
    let mut flips = mid;
    let mut initial = px;
    let mut mid_end = A::along(&seed);
    loop {
        A::shift(&mut pos, 1);
        let color = img.get(pos.0, pos.1)?;
        if initial != color {
            if flips == pat_len - 1 {
                break;
            }
            initial = color;
            flips += 1;
        }
        if flips == mid {
            mid_end = A::along(&pos);
        }
        run_len[flips] += 1;
        if run_len[flips] > max_run {
            return None;
        }
    }

    if !verify_runs(&run_len, pattern, None) {
        return None;
    }

    let centre = (mid_start + mid_end + 1) as f64 / 2.0;
    let len = run_len.iter().sum();
    Some(CrossCheck { centre, len, runs: run_len })
}

// Checks run lengths against a ratio. Each run may deviate by 3/4 of a unit,
// where the unit is given or derived from the total length
pub fn verify_runs(runs: &[u32], pattern: &[f64], unit: Option<f64>) -> bool {
    debug_assert!(runs.len() == pattern.len(), "Run count doesn't match pattern");

    let avg = unit.unwrap_or_else(|| runs.iter().sum::<u32>() as f64 / pattern.iter().sum::<f64>());
    let tol = avg * 3.0 / 4.0;

    runs.iter().zip(pattern).all(|(&r, &p)| {
        let rl = r as f64;
        rl >= p * avg - tol && rl <= p * avg + tol
    })
}

// Whether the seed pixel is dark
pub fn is_dark(img: &BinaryImage, x: i32, y: i32) -> bool {
    img.get(x, y) == Some(Color::Dark)
}
