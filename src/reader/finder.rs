use log::trace;

use super::{
    binarize::BinaryImage,
    utils::{
        cross_check,
        geometry::{Point, X, Y},
    },
};
use crate::common::metadata::Color;

const FINDER_PATTERN: [f64; 5] = [1.0, 1.0, 3.0, 1.0, 1.0];

// Finder line
//------------------------------------------------------------------------------

// **   ******   **  <- Finder line
// ^    ^        ^
// left |        right
//      stone
#[derive(Debug, Clone, Copy, PartialEq)]
struct DatumLine {
    left: u32,
    // Centre of the stone run
    stone: f64,
    right: u32,
    y: u32,
}

// Line scanner to detect finder line
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct LineScanner {
    buffer: [u32; 6],    // Run length of each transition
    prev: Option<Color>, // Last observed color
    flips: u32,          // Count of color changes
    pos: u32,            // Current position
    y: u32,
}

impl LineScanner {
    fn new() -> Self {
        Self { buffer: [0; 6], prev: None, flips: 0, pos: 0, y: 0 }
    }

    fn reset(&mut self, y: u32) {
        *self = Self::new();
        self.y = y;
    }

    fn advance(&mut self, color: Color) -> Option<DatumLine> {
        self.pos += 1;

        if self.prev == Some(color) {
            self.buffer[5] += 1;
            return None;
        }

        self.buffer.rotate_left(1);
        self.buffer[5] = 1;
        self.prev = Some(color);
        self.flips += 1;

        // The five runs before a light run must read dark, light, dark, light, dark
        if color != Color::Light || !self.is_finder_line() {
            return None;
        }

        let x = self.pos - 1;
        let stone_start = x - self.buffer[2..5].iter().sum::<u32>();
        Some(DatumLine {
            left: x - self.buffer[..5].iter().sum::<u32>(),
            stone: stone_start as f64 + self.buffer[2] as f64 / 2.0,
            right: x - self.buffer[4],
            y: self.y,
        })
    }

    // Validates whether last 5 run lengths are in the 1:1:3:1:1 ratio
    fn is_finder_line(&self) -> bool {
        // The run in progress is counted in flips
        self.flips >= 6 && super::utils::verify_runs(&self.buffer[..5], &FINDER_PATTERN, None)
    }
}


// Locate finders
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Finder {
    pub centre: Point,
    pub module_sz: f64,
    // Number of scan lines that confirmed this finder
    pub count: u32,
}

impl Finder {
    fn about_equals(&self, other: &Finder) -> bool {
        let tol = self.module_sz.max(1.0);
        self.centre.dist(&other.centre) <= tol * 1.5
            && (self.module_sz - other.module_sz).abs() <= tol
    }

    fn merge(&mut self, other: &Finder) {
        let (n, m) = (self.count as f64, other.count as f64);
        let total = n + m;
        self.centre = (self.centre * n + other.centre * m) * (1.0 / total);
        self.module_sz = (self.module_sz * n + other.module_sz * m) / total;
        self.count += other.count;
    }
}

// Returns candidate finders sorted by the number of confirming scan lines
pub fn locate_finders(img: &BinaryImage) -> Vec<Finder> {
    let mut finders: Vec<Finder> = Vec::with_capacity(16);
    let mut scanner = LineScanner::new();

    for y in 0..img.h {
        scanner.reset(y);
        for x in 0..img.w {
            let color = img.get(x as i32, y as i32).unwrap_or(Color::Light);
            if let Some(datum) = scanner.advance(color) {
                if let Some(f) = verify_finder(img, &datum) {
                    add_finder(&mut finders, f);
                }
            }
        }

        // Handles the edge case where the symbol touches the right edge of the image
        if let Some(datum) = scanner.advance(Color::Light) {
            if let Some(f) = verify_finder(img, &datum) {
                add_finder(&mut finders, f);
            }
        }
    }

    finders.sort_by(|a, b| b.count.cmp(&a.count));
    trace!("Located {} finder candidates", finders.len());
    finders
}

fn add_finder(finders: &mut Vec<Finder>, f: Finder) {
    match finders.iter_mut().find(|g| g.about_equals(&f)) {
        Some(g) => g.merge(&f),
        None => finders.push(f),
    }
}

// Cross checks the 1:1:3:1:1 pattern vertically through the stone, then
// horizontally and vertically again through the refined centre
fn verify_finder(img: &BinaryImage, datum: &DatumLine) -> Option<Finder> {
    let hlen = datum.right - datum.left;
    let max_run = hlen * 2;
    let sx = datum.stone.floor() as i32;

    let ver = cross_check::<Y>(img, (sx, datum.y as i32), &FINDER_PATTERN, max_run)?;
    let hor = cross_check::<X>(img, (sx, ver.centre.floor() as i32), &FINDER_PATTERN, max_run)?;
    let ver = cross_check::<Y>(
        img,
        (hor.centre.floor() as i32, ver.centre.floor() as i32),
        &FINDER_PATTERN,
        max_run,
    )?;

    // Vertical and horizontal extents should be similar
    let (h, v) = (hor.len as f64, ver.len as f64);
    if 5.0 * (h - v).abs() >= 2.0 * h {
        return None;
    }

    let centre = Point::new(hor.centre, ver.centre);
    Some(Finder { centre, module_sz: (h + v) / 14.0, count: 1 })
}


// Groups finders in 3, which form potential symbols
//------------------------------------------------------------------------------

// Strongest candidates considered when forming triples
const MAX_CLUSTERS: usize = 12;

#[derive(Debug, Clone)]
pub struct FinderGroup {
    pub finders: [Finder; 3], // [TL, TR, BL]
    // Lower is better
    pub score: f64,
}

impl FinderGroup {
    pub fn module_sz(&self) -> f64 {
        self.finders.iter().map(|f| f.module_sz).sum::<f64>() / 3.0
    }
}

// The finder opposite the longest side is top left. Legs from it must be of
// similar length and roughly perpendicular. The sign of their cross product
// tells top right from bottom left, which makes grouping rotation invariant
pub fn group_finders(finders: &[Finder], max_groups: usize) -> Vec<FinderGroup> {
    let finders = &finders[..finders.len().min(MAX_CLUSTERS)];
    let n = finders.len();
    let mut groups = Vec::new();

    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                if let Some(g) = try_group(finders[i], finders[j], finders[k]) {
                    groups.push(g);
                }
            }
        }
    }

    groups.sort_by(|a, b| a.score.total_cmp(&b.score));
    groups.truncate(max_groups);
    for g in groups.iter() {
        trace!(
            "Finder group TL {:?}, TR {:?}, BL {:?}, score {:.3}",
            g.finders[0].centre,
            g.finders[1].centre,
            g.finders[2].centre,
            g.score
        );
    }
    groups
}

fn try_group(f0: Finder, f1: Finder, f2: Finder) -> Option<FinderGroup> {
    let sizes = [f0.module_sz, f1.module_sz, f2.module_sz];
    let max_sz = sizes.iter().copied().fold(f64::MIN, f64::max);
    let min_sz = sizes.iter().copied().fold(f64::MAX, f64::min);
    if max_sz > min_sz * 1.5 {
        return None;
    }

    // Top left is opposite the longest side
    let d01 = f0.centre.dist(&f1.centre);
    let d12 = f1.centre.dist(&f2.centre);
    let d02 = f0.centre.dist(&f2.centre);
    let (tl, mut tr, mut bl) = if d12 >= d01 && d12 >= d02 {
        (f0, f1, f2)
    } else if d02 >= d01 {
        (f1, f0, f2)
    } else {
        (f2, f0, f1)
    };

    let a = tr.centre - tl.centre;
    let b = bl.centre - tl.centre;
    let (la, lb) = (a.norm(), b.norm());
    if la < f64::EPSILON || lb < f64::EPSILON {
        return None;
    }

    let leg_ratio = la.max(lb) / la.min(lb);
    let cos = (a.dot(&b) / (la * lb)).abs();
    if leg_ratio > 1.5 || cos > 0.5 {
        return None;
    }

    // Legs span the symbol less 7 modules
    let msz = (max_sz + min_sz) / 2.0;
    let dim = (la + lb) / 2.0 / msz + 7.0;
    if !(15.0..=190.0).contains(&dim) {
        return None;
    }

    if a.cross(&b) < 0.0 {
        std::mem::swap(&mut tr, &mut bl);
    }

    let score = cos + (leg_ratio - 1.0) + (max_sz / min_sz - 1.0);
    Some(FinderGroup { finders: [tl, tr, bl], score })
}
