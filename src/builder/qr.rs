use std::ops::Deref;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

use crate::common::{
    bit_utils::BitStream,
    grid::Grid,
    iter::EncRegionIter,
    mask::MaskPattern,
    metadata::{Color, ECLevel, Metadata, Version},
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Module {
    Empty,
    Func(Color),
    Version(Color),
    Format(Color),
    Data(Color),
}

impl Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Self::Target {
        match self {
            Module::Empty => &Color::Light,
            Module::Func(c) | Module::Version(c) | Module::Format(c) | Module::Data(c) => c,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QR {
    grid: Vec<Module>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mask: Option<MaskPattern>,
}

// QR type for builder
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn new(ver: Version, ecl: ECLevel) -> Self {
        let w = ver.width();
        Self { grid: vec![Module::Empty; w * w], w, ver, ecl, mask: None }
    }

    // Every module except data drawn, so empty modules are exactly the data modules
    pub(crate) fn template(ver: Version) -> Self {
        let mut qr = Self::new(ver, ECLevel::L);
        qr.draw_all_function_patterns();
        qr.reserve_format_area();
        qr.draw_version_info();
        qr
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::new(self.ver, self.ecl, self.mask)
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|m| ***m == Color::Dark).count()
    }

    pub fn to_grid(&self) -> Grid {
        let mut grid = Grid::new(self.w);
        let w = self.w as i16;
        for r in 0..w {
            for c in 0..w {
                grid.set(r as usize, c as usize, *self.get(r, c) == Color::Dark);
            }
        }
        grid
    }

    #[cfg(test)]
    pub(crate) fn to_debug_str(&self) -> String {
        let w = self.w as i16;
        let mut res = String::with_capacity((w * (w + 1) + 1) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.get(i, j) {
                    Module::Empty => '.',
                    Module::Func(Color::Dark) => 'f',
                    Module::Func(Color::Light) => 'F',
                    Module::Version(Color::Dark) => 'v',
                    Module::Version(Color::Light) => 'V',
                    Module::Format(Color::Dark) => 'm',
                    Module::Format(Color::Light) => 'M',
                    Module::Data(Color::Dark) => 'd',
                    Module::Data(Color::Light) => 'D',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }

    // Negative coordinates wrap around from the bottom or right edge
    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.w as i16;
        debug_assert!(-w <= r && r < w, "Row out of bounds: {r}");
        debug_assert!(-w <= c && c < w, "Column out of bounds: {c}");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r * w + c) as _
    }

    pub(crate) fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub(crate) fn set(&mut self, r: i16, c: i16, module: Module) {
        let index = self.coord_to_index(r, c);
        self.grid[index] = module;
    }
}


// Function patterns
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_patterns();
        self.draw_alignment_patterns();
    }

    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(3, -4);
        self.draw_finder_pattern_at(-4, 3);
    }

    // Draws the finder and its separator, clipped to the symbol edge
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_top, dr_bottom): (i16, i16) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_left, dc_right): (i16, i16) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_top..=dr_bottom {
            for j in dc_left..=dc_right {
                let clr = match i.abs().max(j.abs()) {
                    4 | 2 => Color::Light,
                    _ => Color::Dark,
                };
                self.set(r + i, c + j, Module::Func(clr));
            }
        }
    }

    // Alternating modules on row and column 6 between the finder separators
    fn draw_timing_patterns(&mut self) {
        let w = self.w as i16;
        for i in 8..w - 8 {
            let clr = if i & 1 == 0 { Color::Dark } else { Color::Light };
            self.set(6, i, Module::Func(clr));
            self.set(i, 6, Module::Func(clr));
        }
    }

    fn draw_alignment_patterns(&mut self) {
        let w = self.w as i16;
        let poses = self.ver.alignment_pattern();
        for &r in poses {
            for &c in poses {
                let (r, c) = (r as i16, c as i16);
                // Skip the three positions overlapping finder patterns
                if (r == 6 && (c == 6 || c == w - 7)) || (r == w - 7 && c == 6) {
                    continue;
                }
                for i in -2i16..=2 {
                    for j in -2i16..=2 {
                        let clr =
                            if i.abs().max(j.abs()) == 1 { Color::Light } else { Color::Dark };
                        self.set(r + i, c + j, Module::Func(clr));
                    }
                }
            }
        }
    }
}


// Format & version info
//------------------------------------------------------------------------------

impl QR {
    fn reserve_format_area(&mut self) {
        self.draw_format_info(0x7fff);
    }

    pub(crate) fn draw_format_info(&mut self, format_info: u32) {
        for coords in [&FORMAT_INFO_COORDS_MAIN, &FORMAT_INFO_COORDS_SIDE] {
            for (i, &(r, c)) in coords.iter().enumerate() {
                let bit = (format_info >> (FORMAT_INFO_BIT_LEN - 1 - i)) & 1;
                self.set(r, c, Module::Format(Color::from(bit == 1)));
            }
        }
        self.set(-8, 8, Module::Format(Color::Dark));
    }

    // Two 6x3 blocks, above the bottom left finder and left of the top right one
    fn draw_version_info(&mut self) {
        if *self.ver < 7 {
            return;
        }
        let info = self.ver.info();
        let w = self.w as i16;
        for i in 0..VERSION_INFO_BIT_LEN {
            let module = Module::Version(Color::from((info >> i) & 1 == 1));
            let (a, b) = ((i / 3) as i16, w - 11 + (i % 3) as i16);
            self.set(a, b, module);
            self.set(b, a, module);
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_encoding_region(&mut self, payload: BitStream) {
        self.reserve_format_area();
        self.draw_version_info();

        let mut coords = EncRegionIter::new(self.ver);
        for bit in payload {
            for (r, c) in coords.by_ref() {
                if self.get(r, c) == Module::Empty {
                    self.set(r, c, Module::Data(Color::from(bit)));
                    break;
                }
            }
        }

        // Remainder bits
        for (r, c) in coords {
            if self.get(r, c) == Module::Empty {
                self.set(r, c, Module::Data(Color::Light));
            }
        }

        debug_assert!(!self.grid.contains(&Module::Empty), "Empty module left after drawing");
    }

    // Flips data modules where the pattern applies and writes the matching format info
    pub(crate) fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask = Some(pattern);
        let mask_fn = pattern.mask_function();
        let w = self.w as i16;
        for r in 0..w {
            for c in 0..w {
                if let Module::Data(clr) = self.get(r, c) {
                    if mask_fn(r, c) {
                        self.set(r, c, Module::Data(!clr));
                    }
                }
            }
        }
        self.draw_format_info(self.ecl.format_info(pattern));
    }
}


// Render
//------------------------------------------------------------------------------

impl QR {
    pub fn to_image(&self, module_sz: u32) -> GrayImage {
        self.render(module_sz, Luma([0]), Luma([255]))
    }

    pub fn to_colored_image(&self, module_sz: u32, dark: Rgb<u8>, light: Rgb<u8>) -> RgbImage {
        self.render(module_sz, dark, light)
    }

    fn render<P: image::Pixel>(
        &self,
        module_sz: u32,
        dark: P,
        light: P,
    ) -> ImageBuffer<P, Vec<P::Subpixel>> {
        let module_sz = module_sz.max(1);
        let side = (self.w as u32 + 2 * QUIET_ZONE) * module_sz;
        let w = self.w as i64;
        ImageBuffer::from_fn(side, side, |x, y| {
            let r = (y / module_sz) as i64 - QUIET_ZONE as i64;
            let c = (x / module_sz) as i64 - QUIET_ZONE as i64;
            if (0..w).contains(&r) && (0..w).contains(&c) && *self.get(r as i16, c as i16) == Color::Dark
            {
                dark
            } else {
                light
            }
        })
    }

    // One unit square per module, dark ones drawn over a light background
    pub fn to_svg(&self, dark: &str, light: &str) -> String {
        let side = self.w + 2 * QUIET_ZONE as usize;
        let mut svg = String::with_capacity(self.w * self.w * 40);
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {side} {side}\" shape-rendering=\"crispEdges\">"
        ));
        svg.push_str(&format!("<rect width=\"{side}\" height=\"{side}\" fill=\"{light}\"/>"));
        svg.push_str(&format!("<g fill=\"{dark}\">"));
        let w = self.w as i16;
        for r in 0..w {
            for c in 0..w {
                if *self.get(r, c) == Color::Dark {
                    let (x, y) = (c as u32 + QUIET_ZONE, r as u32 + QUIET_ZONE);
                    svg.push_str(&format!("<rect x=\"{x}\" y=\"{y}\" width=\"1\" height=\"1\"/>"));
                }
            }
        }
        svg.push_str("</g></svg>");
        svg
    }

    // Light modules are drawn solid so the symbol scans off a dark terminal
    pub fn to_str(&self) -> String {
        let side = self.w as i16 + 2 * QUIET_ZONE as i16;
        let w = self.w as i16;
        let q = QUIET_ZONE as i16;
        let mut res = String::with_capacity((side * (side * 2 + 1)) as usize * 3);
        for i in 0..side {
            for j in 0..side {
                let (r, c) = (i - q, j - q);
                let is_dark = (0..w).contains(&r) && (0..w).contains(&c) && *self.get(r, c) == Color::Dark;
                res.push_str(if is_dark { "  " } else { "██" });
            }
            res.push('\n');
        }
        res
    }
}

#[cfg(test)]
mod render_tests {
    use image::Rgb;

    use crate::builder::QRBuilder;
    use crate::common::metadata::ECLevel;

    #[test]
    fn test_to_image() {
        let qr = QRBuilder::new(b"render").ec_level(ECLevel::L).build().unwrap();
        let img = qr.to_image(3);
        assert_eq!(img.dimensions(), (29 * 3, 29 * 3));
        // Quiet zone, then the top left corner of the finder
        assert_eq!(img.get_pixel(11, 11).0, [255]);
        assert_eq!(img.get_pixel(12, 12).0, [0]);
        assert_eq!(img.get_pixel(14, 14).0, [0]);
    }

    #[test]
    fn test_to_colored_image() {
        let qr = QRBuilder::new(b"render").ec_level(ECLevel::L).build().unwrap();
        let (dark, light) = (Rgb([10, 20, 30]), Rgb([250, 240, 230]));
        let img = qr.to_colored_image(2, dark, light);
        assert_eq!(*img.get_pixel(0, 0), light);
        assert_eq!(*img.get_pixel(8, 8), dark);
    }

    #[test]
    fn test_to_svg() {
        let qr = QRBuilder::new(b"render").ec_level(ECLevel::L).build().unwrap();
        let svg = qr.to_svg("#000", "#fff");
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 29 29\""));
        assert!(svg.contains("<rect width=\"29\" height=\"29\" fill=\"#fff\"/>"));
        assert!(svg.contains("<rect x=\"4\" y=\"4\" width=\"1\" height=\"1\"/>"));
        let rects = svg.matches("width=\"1\"").count();
        assert_eq!(rects, qr.count_dark_modules());
        assert!(svg.ends_with("</g></svg>"));
    }

    #[test]
    fn test_to_str() {
        let qr = QRBuilder::new(b"render").ec_level(ECLevel::L).build().unwrap();
        let s = qr.to_str();
        assert_eq!(s.lines().count(), 29);
        let row = s.lines().nth(4).unwrap_or_default();
        assert!(row.starts_with("████████        "));
    }
}

// Global constants
//------------------------------------------------------------------------------

pub const QUIET_ZONE: u32 = 4;

pub const FORMAT_INFO_BIT_LEN: usize = 15;

pub const VERSION_INFO_BIT_LEN: usize = 18;

// Most significant bit first
pub static FORMAT_INFO_COORDS_MAIN: [(i16, i16); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

pub static FORMAT_INFO_COORDS_SIDE: [(i16, i16); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];
