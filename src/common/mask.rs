use std::ops::Deref;

use log::debug;

use super::{
    error::{QRError, QRResult},
    grid::Grid,
};
use crate::builder::QR;

// Mask pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> QRResult<Self> {
        Self::try_from(pattern)
    }

    pub(crate) const fn new_unchecked(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid masking pattern");
        Self(pattern)
    }
}

impl TryFrom<u8> for MaskPattern {
    type Error = QRError;
    fn try_from(pattern: u8) -> Result<Self, Self::Error> {
        if pattern > 7 {
            return Err(QRError::InvalidMaskingPattern(pattern));
        }
        Ok(Self(pattern))
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Mask functions take (row, col) and return true for modules to flip
mod mask_functions {
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        let p = r as i32 * c as i32;
        (p & 1) + (p % 3) == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        let p = r as i32 * c as i32;
        ((p & 1) + (p % 3)) & 1 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        let p = r as i32 * c as i32;
        (((r + c) as i32 & 1) + (p % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_function(self) -> fn(i16, i16) -> bool {
        match self.0 {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            _ => mask_functions::meadow,
        }
    }
}


// Mask selection
//------------------------------------------------------------------------------

// Tries all 8 patterns and keeps the one with the lowest penalty, ties going to
// the lowest index
pub fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let mut best = (u32::MAX, MaskPattern(0));
    for m in 0..8 {
        let mask = MaskPattern(m);
        let mut candidate = qr.clone();
        candidate.apply_mask(mask);
        let pen = compute_total_penalty(&candidate.to_grid());
        if pen < best.0 {
            best = (pen, mask);
        }
    }
    debug!("Selected mask {} with penalty {}", *best.1, best.0);
    qr.apply_mask(best.1);
    best.1
}

pub fn compute_total_penalty(grid: &Grid) -> u32 {
    compute_run_penalty(grid)
        + compute_block_penalty(grid)
        + compute_finder_pattern_penalty(grid, true)
        + compute_finder_pattern_penalty(grid, false)
        + compute_balance_penalty(grid)
}

// N1: 3 for each run of 5 same colored modules, plus 1 for every extra module
fn compute_run_penalty(grid: &Grid) -> u32 {
    let w = grid.side();
    let mut pen = 0;
    for i in 0..w {
        let (mut row_run, mut col_run) = (0, 0);
        for j in 0..w {
            row_run = if j > 0 && grid.get(i, j) == grid.get(i, j - 1) { row_run + 1 } else { 1 };
            col_run = if j > 0 && grid.get(j, i) == grid.get(j - 1, i) { col_run + 1 } else { 1 };
            for run in [row_run, col_run] {
                match run {
                    5 => pen += 3,
                    6.. => pen += 1,
                    _ => (),
                }
            }
        }
    }
    pen
}

// N2: 3 for each 2x2 block of one color, overlapping blocks included
fn compute_block_penalty(grid: &Grid) -> u32 {
    let w = grid.side();
    let mut pen = 0;
    for r in 0..w.saturating_sub(1) {
        for c in 0..w - 1 {
            let clr = grid.get(r, c);
            if clr == grid.get(r + 1, c) && clr == grid.get(r, c + 1) && clr == grid.get(r + 1, c + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}

// N3: 40 for each dark-light-dark-dark-dark-light-dark pattern with 4 light
// modules before or after it. Modules beyond the edge count as light
fn compute_finder_pattern_penalty(grid: &Grid, is_hor: bool) -> u32 {
    const PATTERN: [bool; 7] = [true, false, true, true, true, false, true];

    let w = grid.side() as isize;
    let mut pen = 0;
    for i in 0..w {
        let get = |j: isize| {
            if j < 0 || j >= w {
                return false;
            }
            let (i, j) = (i as usize, j as usize);
            if is_hor {
                grid.get(i, j)
            } else {
                grid.get(j, i)
            }
        };
        for j in 0..w - 6 {
            if (0..7).any(|k| get(j + k) != PATTERN[k as usize]) {
                continue;
            }
            if (j - 4..j).all(|k| !get(k)) || (j + 7..j + 11).all(|k| !get(k)) {
                pen += 40;
            }
        }
    }
    pen
}

// N4: 10 for every 5% the dark ratio deviates from 50%
fn compute_balance_penalty(grid: &Grid) -> u32 {
    let dark = grid.count_dark_modules() as i64;
    let total = (grid.side() * grid.side()) as i64;
    if total == 0 {
        return 0;
    }
    let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
    (k.max(0) * 10) as u32
}
