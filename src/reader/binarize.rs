use image::GrayImage;
use imageproc::contrast::otsu_level;
use log::trace;

use super::utils::geometry::Point;
use crate::common::metadata::Color;

// Adaptive binarization
// Steps:
// 1. Divides image into blocks of 8x8 pixels. The last fractional block in each
//    row and column is read from the last 8 pixels, so it overlaps its neighbour
// 2. Calculates average of each block. Blocks with little contrast take the
//    level of their top and left neighbours instead
// 3. Calculates the threshold for each block by averaging 5x5 blocks around it
// 4. Marks a pixel dark if its value is less than or equal to the threshold, so
//    a threshold of 0 still yields dark pixels
// Images under 5 blocks wide or high use a global Otsu threshold
//------------------------------------------------------------------------------

const BLOCK_SIZE: u32 = 8;
const BLOCK_SIZE_POW: u32 = 3;
const MIN_DYNAMIC_RANGE: u8 = 24;
const MIN_BLOCKS: u32 = 5;

#[derive(Debug, Clone)]
pub struct BinaryImage {
    pub w: u32,
    pub h: u32,
    buffer: Vec<Color>,
}

impl BinaryImage {
    pub fn binarize(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let (wsteps, hsteps) = (w.div_ceil(BLOCK_SIZE), h.div_ceil(BLOCK_SIZE));

        if wsteps < MIN_BLOCKS || hsteps < MIN_BLOCKS {
            let level = otsu_level(img);
            trace!("Image {w}x{h} too small for block thresholds, using global level {level}");
            let buffer = img.pixels().map(|p| Color::from(p[0] <= level)).collect();
            return Self { w, h, buffer };
        }

        let avg = block_averages(img, wsteps as usize, hsteps as usize);
        let thresh = block_thresholds(&avg, wsteps as usize, hsteps as usize);

        let mut buffer = Vec::with_capacity((w * h) as usize);
        for (x, y, p) in img.enumerate_pixels() {
            let idx = (y >> BLOCK_SIZE_POW) * wsteps + (x >> BLOCK_SIZE_POW);
            buffer.push(Color::from(p[0] <= thresh[idx as usize]));
        }
        debug_assert!(buffer.len() == (w * h) as usize);

        Self { w, h, buffer }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return None;
        }
        Some(self.buffer[(y as u32 * self.w + x as u32) as usize])
    }

    pub fn get_at_point(&self, pt: &Point) -> Option<Color> {
        let (x, y) = pt.pixel();
        self.get(x, y)
    }

    // For light symbols printed on dark backgrounds
    pub fn invert(&mut self) {
        self.buffer.iter_mut().for_each(|c| *c = !*c);
    }
}

fn block_averages(img: &GrayImage, wsteps: usize, hsteps: usize) -> Vec<usize> {
    let (w, h) = img.dimensions();
    let mut avg = vec![0usize; wsteps * hsteps];

    for by in 0..hsteps {
        let y0 = ((by as u32) << BLOCK_SIZE_POW).min(h - BLOCK_SIZE);
        for bx in 0..wsteps {
            let x0 = ((bx as u32) << BLOCK_SIZE_POW).min(w - BLOCK_SIZE);

            let (mut sum, mut mn, mut mx) = (0usize, u8::MAX, u8::MIN);
            for y in y0..y0 + BLOCK_SIZE {
                for x in x0..x0 + BLOCK_SIZE {
                    let p = img.get_pixel(x, y)[0];
                    sum += p as usize;
                    mn = mn.min(p);
                    mx = mx.max(p);
                }
            }

            let i = by * wsteps + bx;
            if mx - mn > MIN_DYNAMIC_RANGE {
                // Convert 8x8 sum to average
                avg[i] = sum >> (2 * BLOCK_SIZE_POW);
                continue;
            }

            // Flat block, assumed light unless the neighbourhood says otherwise
            avg[i] = mn as usize / 2;
            if bx > 0 && by > 0 {
                let ng_avg = (2 * avg[i - 1] + avg[i - wsteps] + avg[i - wsteps - 1]) / 4;
                if (mn as usize) < ng_avg {
                    avg[i] = ng_avg;
                }
            }
        }
    }
    avg
}

fn block_thresholds(avg: &[usize], wsteps: usize, hsteps: usize) -> Vec<u8> {
    let (maxx, maxy) = (wsteps - 3, hsteps - 3);
    let mut res = vec![0u8; wsteps * hsteps];

    for y in 0..hsteps {
        let cy = y.clamp(2, maxy);
        for x in 0..wsteps {
            let cx = x.clamp(2, maxx);
            let mut sum = 0usize;
            for ny in cy - 2..=cy + 2 {
                let ni = ny * wsteps + cx;
                sum += avg[ni - 2..=ni + 2].iter().sum::<usize>();
            }
            res[y * wsteps + x] = (sum / 25) as u8;
        }
    }
    res
}
