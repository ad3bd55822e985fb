mod binarize;
mod deqr;
mod finder;
mod symbol;
mod utils;

use image::{DynamicImage, GrayImage, RgbaImage};
use log::{debug, trace, warn};

use crate::common::{
    error::{QRError, QRResult},
    grid::Grid,
    metadata::Metadata,
};
use binarize::BinaryImage;
use deqr::DeQR;
use finder::{group_finders, locate_finders, FinderGroup};
use symbol::SymbolLocation;

// Reader configuration
//------------------------------------------------------------------------------

// Which polarities of the image to scan. Inverted scans find light symbols
// printed on dark backgrounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inversion {
    #[default]
    DontInvert,
    OnlyInvert,
    AttemptBoth,
}

const DEFAULT_MAX_CANDIDATES: usize = 6;

#[derive(Debug, Clone)]
pub struct QRReader {
    inversion: Inversion,
    // Finder triples attempted per polarity
    max_candidates: usize,
}

impl Default for QRReader {
    fn default() -> Self {
        Self { inversion: Inversion::default(), max_candidates: DEFAULT_MAX_CANDIDATES }
    }
}

impl QRReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inversion(&mut self, inversion: Inversion) -> &mut Self {
        self.inversion = inversion;
        self
    }

    pub fn max_candidates(&mut self, max_candidates: usize) -> &mut Self {
        self.max_candidates = max_candidates;
        self
    }
}

// Reader
// Steps:
// 1. Binarizes the frame, inverting it if asked to
// 2. Locates finder candidates and groups them into triples
// 3. Locates each triple's symbol and samples its modules into a grid
// 4. Decodes the grid, refining the location once if decoding fails
// The first triple that decodes wins. Otherwise the error of the best ranked
// triple whose grid looked like a symbol is returned, and NoSymbolFound if none did
//------------------------------------------------------------------------------

impl QRReader {
    pub fn read(&self, img: &GrayImage) -> QRResult<(Metadata, String)> {
        let bin = BinaryImage::binarize(img);
        debug!("Binarized {}x{} frame", bin.w, bin.h);

        match self.inversion {
            Inversion::DontInvert => self.read_binary(&bin),
            Inversion::OnlyInvert => {
                let mut inv = bin;
                inv.invert();
                self.read_binary(&inv)
            }
            Inversion::AttemptBoth => self.read_binary(&bin).or_else(|err| {
                trace!("Retrying with inverted frame after: {err}");
                let mut inv = bin.clone();
                inv.invert();
                self.read_binary(&inv).map_err(|inv_err| match err {
                    QRError::NoSymbolFound => inv_err,
                    _ => err,
                })
            }),
        }
    }

    // Row major 8 bit luma samples
    pub fn read_luma(&self, width: u32, height: u32, buf: &[u8]) -> QRResult<(Metadata, String)> {
        check_buffer(width, height, 1, buf)?;
        let img = GrayImage::from_raw(width, height, buf.to_vec())
            .ok_or(QRError::InvalidImageBuffer { width, height, channels: 1, len: buf.len() })?;
        self.read(&img)
    }

    // Row major RGBA samples, as delivered by a canvas
    pub fn read_rgba(&self, width: u32, height: u32, buf: &[u8]) -> QRResult<(Metadata, String)> {
        check_buffer(width, height, 4, buf)?;
        let img = RgbaImage::from_raw(width, height, buf.to_vec())
            .ok_or(QRError::InvalidImageBuffer { width, height, channels: 4, len: buf.len() })?;
        self.read(&DynamicImage::ImageRgba8(img).to_luma8())
    }

    // Decodes an already sampled module grid
    pub fn read_grid(&self, grid: &Grid) -> QRResult<(Metadata, String)> {
        DeQR::from_grid(grid)?.decode()
    }

    fn read_binary(&self, img: &BinaryImage) -> QRResult<(Metadata, String)> {
        let finders = locate_finders(img);
        let groups = group_finders(&finders, self.max_candidates);
        if groups.is_empty() {
            trace!("No finder triple among {} candidates", finders.len());
            return Err(QRError::NoSymbolFound);
        }

        let mut first_err = None;
        for (i, group) in groups.iter().enumerate() {
            match read_group(img, group) {
                Ok(res) => {
                    debug!("Decoded finder group {i}: {:?}", res.0);
                    return Ok(res);
                }
                Err(err) => {
                    trace!("Finder group {i} failed: {err}");
                    if first_err.is_none() && !is_spurious(&err) {
                        first_err = Some(err);
                    }
                }
            }
        }
        Err(first_err.unwrap_or(QRError::NoSymbolFound))
    }
}

// Failures that say nothing about a symbol being present
fn is_spurious(err: &QRError) -> bool {
    matches!(err, QRError::NoSymbolFound | QRError::SingularMatrix | QRError::PointAtInfinity)
}

const MIN_STRUCTURE_FIT: f64 = 0.75;

// Share of separator and timing modules sampled in their expected color. Damaged
// symbols keep most of this structure, triples found in clutter don't
fn structure_fit(grid: &Grid) -> f64 {
    let w = grid.side();
    let mut expected = Vec::with_capacity(48 + 2 * w);
    for i in 0..8 {
        for (r, c) in [(7, i), (i, 7), (7, w - 1 - i), (i, w - 8), (w - 8, i), (w - 1 - i, 7)] {
            expected.push((r, c, false));
        }
    }
    for i in 8..w - 8 {
        expected.push((6, i, i % 2 == 0));
        expected.push((i, 6, i % 2 == 0));
    }
    let hits = expected.iter().filter(|&&(r, c, dark)| grid.get(r, c) == dark).count();
    hits as f64 / expected.len() as f64
}

fn check_buffer(width: u32, height: u32, channels: usize, buf: &[u8]) -> QRResult<()> {
    if width as usize * height as usize * channels != buf.len() {
        return Err(QRError::InvalidImageBuffer { width, height, channels, len: buf.len() });
    }
    Ok(())
}

fn read_group(img: &BinaryImage, group: &FinderGroup) -> QRResult<(Metadata, String)> {
    let mut loc = SymbolLocation::locate(img, group)?;
    let mut grid = loc.sample(img);

    // Version info overrides a mis-estimated grid size
    if *loc.ver >= 7 {
        match DeQR::from_grid(&grid)?.read_version_info() {
            Ok(ver) if ver != loc.ver => {
                warn!("Version info reads {}, grid size suggested {}", *ver, *loc.ver);
                loc = SymbolLocation::with_version(img, group, ver, loc.module_sz)?;
                grid = loc.sample(img);
            }
            Ok(_) => {}
            Err(err) => trace!("Keeping estimated version {}: {err}", *loc.ver),
        }
    }

    match DeQR::from_grid(&grid)?.decode() {
        Ok(res) => return Ok(res),
        Err(err) => debug!("Decoding sampled grid failed: {err}, refining"),
    }
    loc.refine(img);
    let grid = loc.sample(img);

    DeQR::from_grid(&grid)?.decode().map_err(|err| {
        let fit = structure_fit(&grid);
        if fit < MIN_STRUCTURE_FIT {
            trace!("Discarding {err}, structure fit {fit:.2} is too low for a symbol");
            QRError::NoSymbolFound
        } else {
            err
        }
    })
}
