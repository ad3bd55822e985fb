use std::fmt;

use super::{
    error::{QRError, QRResult},
    metadata::{Color, Version},
};

// Plain module grid, row major with true for dark
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    side: usize,
    modules: Vec<bool>,
}

impl Grid {
    pub fn new(side: usize) -> Self {
        Self { side, modules: vec![false; side * side] }
    }

    // Fails unless the side is that of a valid version and the module count matches
    pub fn from_modules(side: usize, modules: Vec<bool>) -> QRResult<Self> {
        Version::from_width(side)?;
        if modules.len() != side * side {
            return Err(QRError::InvalidGridSize { side, len: modules.len() });
        }
        Ok(Self { side, modules })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn modules(&self) -> &[bool] {
        &self.modules
    }

    pub fn version(&self) -> QRResult<Version> {
        Version::from_width(self.side)
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> bool {
        self.modules[r * self.side + c]
    }

    #[inline]
    pub fn color(&self, r: usize, c: usize) -> Color {
        Color::from(self.get(r, c))
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, is_dark: bool) {
        self.modules[r * self.side + c] = is_dark;
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.modules.chunks_exact(self.side.max(1))
    }

    pub fn count_dark_modules(&self) -> usize {
        self.modules.iter().filter(|&&m| m).count()
    }

    pub fn invert(&mut self) {
        self.modules.iter_mut().for_each(|m| *m = !*m);
    }
}

// Two characters per module keep the output roughly square in a terminal
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for &m in row {
                f.write_str(if m { "██" } else { "  " })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
