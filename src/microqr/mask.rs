use std::ops::Deref;

use crate::common::{
    error::{SymbolError, SymbolResult},
    grid::Grid,
};

// Mask pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> SymbolResult<Self> {
        match pattern {
            0..=3 => Ok(Self(pattern)),
            _ => Err(SymbolError::InvalidMaskingPattern),
        }
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

mod mask_functions {
    pub fn horizontal_lines(r: usize, _: usize) -> bool {
        r & 1 == 0
    }

    pub fn large_checkerboard(r: usize, c: usize) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn diamonds(r: usize, c: usize) -> bool {
        (((r * c) & 1) + ((r * c) % 3)) & 1 == 0
    }

    pub fn meadow(r: usize, c: usize) -> bool {
        (((r + c) & 1) + ((r * c) % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_function(self) -> fn(usize, usize) -> bool {
        match self.0 {
            0b00 => mask_functions::horizontal_lines,
            0b01 => mask_functions::large_checkerboard,
            0b10 => mask_functions::diamonds,
            _ => mask_functions::meadow,
        }
    }
}

/// Micro QR evaluation: dark modules along the right and bottom edges,
/// timing modules excluded. Higher is better.
pub fn compute_score(grid: &Grid) -> u32 {
    let w = grid.width();
    let sum1 = (1..w).filter(|&r| grid.get(r, w - 1)).count() as u32;
    let sum2 = (1..w).filter(|&c| grid.get(w - 1, c)).count() as u32;
    if sum1 <= sum2 {
        sum1 * 16 + sum2
    } else {
        sum2 * 16 + sum1
    }
}
