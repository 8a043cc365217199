use std::sync::OnceLock;

use super::version::Version;
use crate::common::grid::{Cell, PlacementMap};

// Iterator for placing data in encoding region
//------------------------------------------------------------------------------

/// Walks two-module columns from the bottom right corner in a zigzag,
/// skipping the vertical timing column
pub struct EncRegionIter {
    r: i16,
    c: i16,
    width: i16,
}

impl EncRegionIter {
    pub const VERT_TIMING_COL: i16 = 0;

    pub const fn new(version: Version) -> Self {
        let w = version.width() as i16;
        Self { r: w - 1, c: w - 1, width: w }
    }
}

impl Iterator for EncRegionIter {
    type Item = (usize, usize);
    fn next(&mut self) -> Option<Self::Item> {
        if self.c <= Self::VERT_TIMING_COL {
            return None;
        }
        let res = (self.r as usize, self.c as usize);
        let col_type = (self.width - self.c) % 4;
        match col_type {
            2 if self.r > 0 => {
                self.r -= 1;
                self.c += 1;
            }
            0 if self.r < self.width - 1 => {
                self.r += 1;
                self.c += 1;
            }
            0 | 2 if self.c == Self::VERT_TIMING_COL + 1 => {
                self.c -= 2;
            }
            _ => {
                self.c -= 1;
            }
        }
        Some(res)
    }
}

// Placement map
//------------------------------------------------------------------------------

pub const FORMAT_INFO_BITS: usize = 15;

pub fn placement_map(ver: Version) -> &'static PlacementMap {
    static MAPS: OnceLock<Vec<PlacementMap>> = OnceLock::new();
    let maps = MAPS.get_or_init(|| Version::ALL.iter().map(|&v| build_map(v)).collect());
    &maps[ver.number() as usize - 1]
}

fn build_map(ver: Version) -> PlacementMap {
    let w = ver.width();
    let mut cells: Vec<Option<Cell>> = vec![None; w * w];
    let mut set = |r: usize, c: usize, cell: Cell| cells[r * w + c] = Some(cell);

    // Finder pattern and separator
    for r in 0..8usize {
        for c in 0..8usize {
            let d = std::cmp::max(r.abs_diff(3), c.abs_diff(3));
            set(r, c, Cell::Fixed(d != 2 && d != 4));
        }
    }

    // Timing patterns
    for i in 8..w {
        set(0, i, Cell::Fixed(i & 1 == 0));
        set(i, 0, Cell::Fixed(i & 1 == 0));
    }

    // Format information, most significant bit first
    for i in 0..8 {
        set(8, i + 1, Cell::Descriptor(i as u32));
    }
    for i in 8..FORMAT_INFO_BITS {
        set(15 - i, 8, Cell::Descriptor(i as u32));
    }

    let mut idx = 0;
    for (r, c) in EncRegionIter::new(ver) {
        if cells[r * w + c].is_none() {
            cells[r * w + c] = Some(Cell::Payload(idx));
            idx += 1;
        }
    }

    let mut map = PlacementMap::new(w, w);
    for (i, cell) in cells.into_iter().enumerate() {
        map.set(i / w, i % w, cell.unwrap_or(Cell::Fixed(false)));
    }
    map
}

/// Payload length in bits: data capacity plus 8 bits per EC codeword
pub fn payload_bits(ver: Version) -> usize {
    let half = if ver.has_half_codeword() { 4 } else { 0 };
    ver.total_codewords() * 8 - half
}
