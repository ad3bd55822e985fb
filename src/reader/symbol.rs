use log::{debug, trace};

use super::{
    binarize::BinaryImage,
    finder::FinderGroup,
    utils::{
        cross_check,
        geometry::{Point, X, Y},
        homography::Homography,
        is_dark, verify_runs,
    },
};
use crate::{
    builder::{Module, QR},
    common::{
        error::QRResult,
        grid::Grid,
        metadata::{Color, Version},
    },
};

const ALIGNMENT_PATTERN: [f64; 3] = [1.0, 1.0, 1.0];

// Locates symbol based on 3 finder centres and an alignment pattern when the
// version has one
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SymbolLocation {
    pub ver: Version,
    pub module_sz: f64,
    h: Homography,
}

impl SymbolLocation {
    // Estimates the grid size from finder distances, then snaps it to 4k + 17
    pub fn locate(img: &BinaryImage, group: &FinderGroup) -> QRResult<Self> {
        let [tl, tr, bl] = group.finders.map(|f| f.centre);
        let fallback = group.module_sz();
        let msz_h = module_size_between(img, tl, tr).unwrap_or(fallback);
        let msz_v = module_size_between(img, tl, bl).unwrap_or(fallback);

        let dim = ((tr.dist(&tl) / msz_h + bl.dist(&tl) / msz_v) / 2.0).round() + 7.0;
        let k = ((dim - 17.0) / 4.0).round().clamp(1.0, 40.0) as usize;
        let ver = Version::new(k)?;
        debug!("Estimated grid size {dim}, snapped to version {}", *ver);

        Self::with_version(img, group, ver, (msz_h + msz_v) / 2.0)
    }

    pub fn with_version(
        img: &BinaryImage,
        group: &FinderGroup,
        ver: Version,
        module_sz: f64,
    ) -> QRResult<Self> {
        let [tl, tr, bl] = group.finders.map(|f| f.centre);
        let w = ver.width() as f64;

        // Module steps along the top and left edges
        let u = (tr - tl) * (1.0 / (w - 7.0));
        let v = (bl - tl) * (1.0 / (w - 7.0));

        let mut br = (Point::new(w - 3.5, w - 3.5), tr + bl - tl);
        if *ver >= 2 {
            let pred = tl + (u + v) * (w - 10.0);
            match locate_alignment(img, pred, u, v, module_sz) {
                Some(ap) => {
                    trace!("Alignment pattern at {ap:?}, predicted {pred:?}");
                    br = (Point::new(w - 6.5, w - 6.5), ap);
                }
                None => trace!("No alignment pattern near {pred:?}, using parallelogram corner"),
            }
        }

        let src = [Point::new(3.5, 3.5), Point::new(w - 3.5, 3.5), br.0, Point::new(3.5, w - 3.5)];
        let dst = [tl, tr, br.1, bl];
        let h = Homography::compute(src, dst)?;
        Ok(Self { ver, module_sz, h })
    }

    // Samples the centre of every module. Modules mapped outside the image are light
    pub fn sample(&self, img: &BinaryImage) -> Grid {
        let w = self.ver.width();
        let mut grid = Grid::new(w);
        for r in 0..w {
            for c in 0..w {
                if self.sample_module(img, r, c) == Color::Dark {
                    grid.set(r, c, true);
                }
            }
        }
        grid
    }

    fn sample_module(&self, img: &BinaryImage, r: usize, c: usize) -> Color {
        self.h
            .map(c as f64 + 0.5, r as f64 + 0.5)
            .ok()
            .and_then(|pt| img.get_at_point(&pt))
            .unwrap_or(Color::Light)
    }
}

// Module size from the finder edges along the line joining two finder centres.
// Centre to outer edge spans 3.5 modules on each finder
fn module_size_between(img: &BinaryImage, a: Point, b: Point) -> Option<f64> {
    let d1 = edge_distance(img, a, b)?;
    let d2 = edge_distance(img, b, a)?;
    Some((d1 + d2) / 7.0)
}

// Walks from a finder centre towards `to` across the stone, the light ring and
// the dark ring, returning the distance where the dark ring ends
fn edge_distance(img: &BinaryImage, from: Point, to: Point) -> Option<f64> {
    let len = from.dist(&to);
    if len < 1.0 {
        return None;
    }
    let dir = (to - from) * (1.0 / len);

    const STEP: f64 = 0.5;
    let expected = [Color::Dark, Color::Light, Color::Dark, Color::Light];
    let mut state = 0;
    let mut d = 0.0;
    while d < len / 2.0 {
        let color = img.get_at_point(&(from + dir * d))?;
        if color != expected[state] {
            state += 1;
            if color != expected[state] {
                return None;
            }
            // Edge lies within the last step
            if state == 3 {
                return Some(d - STEP / 2.0);
            }
        }
        d += STEP;
    }
    None
}

// Searches growing squares around the predicted centre for a 1:1:1 pattern in
// both directions, whose surrounding rings match the alignment pattern. The
// candidate closest to the prediction wins
fn locate_alignment(img: &BinaryImage, pred: Point, u: Point, v: Point, msz: f64) -> Option<Point> {
    let step = ((msz / 2.0).floor() as i32).max(1);
    let max_run = (msz * 2.0).ceil() as u32;
    let (px, py) = pred.pixel();

    for radius in [4.0, 8.0, 16.0] {
        let r = (radius * msz).ceil() as i32;
        let mut best: Option<(f64, Point)> = None;

        for y in (py - r..=py + r).step_by(step as usize) {
            for x in (px - r..=px + r).step_by(step as usize) {
                if !is_dark(img, x, y) {
                    continue;
                }
                let Some(c) = verify_alignment(img, (x, y), max_run, msz) else {
                    continue;
                };
                if !ring_test(img, c, u, v) {
                    continue;
                }
                let d = c.dist(&pred);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, c));
                }
            }
        }

        if let Some((_, c)) = best {
            return Some(c);
        }
    }
    None
}

fn verify_alignment(img: &BinaryImage, seed: (i32, i32), max_run: u32, msz: f64) -> Option<Point> {
    let hor = cross_check::<X>(img, seed, &ALIGNMENT_PATTERN, max_run)?;
    if !verify_runs(&hor.runs, &ALIGNMENT_PATTERN, Some(msz)) {
        return None;
    }
    let ver = cross_check::<Y>(img, (hor.centre.floor() as i32, seed.1), &ALIGNMENT_PATTERN, max_run)?;
    if !verify_runs(&ver.runs, &ALIGNMENT_PATTERN, Some(msz)) {
        return None;
    }
    Some(Point::new(hor.centre, ver.centre))
}

// Outer ring dark, inner ring light, each for at least 3/4 of its modules
fn ring_test(img: &BinaryImage, c: Point, u: Point, v: Point) -> bool {
    let (mut outer, mut inner) = (0, 0);
    for j in -2i32..=2 {
        for i in -2i32..=2 {
            let pt = c + u * i as f64 + v * j as f64;
            let color = img.get_at_point(&pt).unwrap_or(Color::Light);
            match i.abs().max(j.abs()) {
                2 if color == Color::Dark => outer += 1,
                1 if color == Color::Light => inner += 1,
                _ => {}
            }
        }
    }
    outer * 4 >= 16 * 3 && inner * 4 >= 8 * 3
}


// Refines the homography by nudging each coefficient and keeping changes that
// improve how well the function patterns line up with the image
//------------------------------------------------------------------------------

const REFINE_PASSES: usize = 5;

impl SymbolLocation {
    pub fn refine(&mut self, img: &BinaryImage) {
        let template = func_modules(self.ver);
        let mut best = self.fitness(img, &template);
        let initial = best;

        let mut steps = self.h.0.map(|x| x * 0.02);
        for _ in 0..REFINE_PASSES {
            for i in 0..16 {
                let j = i >> 1;
                let old = self.h[j];
                self.h[j] = if i & 1 == 0 { old - steps[j] } else { old + steps[j] };

                let test = self.fitness(img, &template);
                if test > best {
                    best = test;
                } else {
                    self.h[j] = old;
                }
            }
            steps = steps.map(|x| x * 0.5);
        }
        debug!("Refined homography, fitness {initial} -> {best} of {}", template.len());
    }

    // +1 for every function module sampled in its expected color, -1 otherwise
    fn fitness(&self, img: &BinaryImage, template: &[(usize, usize, Color)]) -> i32 {
        template
            .iter()
            .map(|&(r, c, exp)| if self.sample_module(img, r, c) == exp { 1 } else { -1 })
            .sum()
    }
}

fn func_modules(ver: Version) -> Vec<(usize, usize, Color)> {
    let template = QR::template(ver);
    let w = ver.width();
    let mut res = Vec::with_capacity(w * w / 4);
    for r in 0..w {
        for c in 0..w {
            if let Module::Func(color) = template.get(r as i16, c as i16) {
                res.push((r, c, color));
            }
        }
    }
    res
}
