use std::sync::OnceLock;

use super::layout::AztecSize;
use crate::common::grid::{Cell, PlacementMap};

// Placement map
//------------------------------------------------------------------------------

// Compact 1 to 4 followed by full 1 to 32
static MAPS: [OnceLock<PlacementMap>; 36] = [const { OnceLock::new() }; 36];

pub fn placement_map(size: AztecSize) -> &'static PlacementMap {
    let index = match size {
        AztecSize::Compact(l) => l as usize - 1,
        AztecSize::Full(l) => l as usize + 3,
    };
    MAPS[index].get_or_init(|| build_map(size))
}

// Maps positions of the grid-free layout onto the matrix, stepping over
// reference grid lines
fn alignment_map(size: AztecSize) -> Vec<usize> {
    let base = size.base_matrix_size();
    if size.is_compact() {
        return (0..base).collect();
    }

    let mut res = vec![0; base];
    let orig_center = base / 2;
    let center = size.matrix_size() / 2;
    for i in 0..orig_center {
        let new_offset = i + i / 15;
        res[orig_center - i - 1] = center - new_offset - 1;
        res[orig_center + i] = center + new_offset + 1;
    }
    res
}

struct MapBuilder {
    w: usize,
    cells: Vec<Option<Cell>>,
    dark: Vec<bool>,
}

impl MapBuilder {
    fn put(&mut self, r: usize, c: usize, cell: Cell) {
        debug_assert!(self.cells[r * self.w + c].is_none(), "Cell assigned twice: Row {r}, Col {c}");

        self.cells[r * self.w + c] = Some(cell);
    }

    fn set_dark(&mut self, r: usize, c: usize) {
        self.dark[r * self.w + c] = true;
    }
}

fn build_map(size: AztecSize) -> PlacementMap {
    let m = size.matrix_size();
    let mut mb = MapBuilder { w: m, cells: vec![None; m * m], dark: vec![false; m * m] };

    draw_layers(&mut mb, size);
    draw_mode_message(&mut mb, size);
    draw_finder(&mut mb, size);

    let mut map = PlacementMap::new(m, m);
    for (i, cell) in mb.cells.iter().enumerate() {
        let cell = cell.unwrap_or(Cell::Fixed(mb.dark[i]));
        map.set(i / m, i % m, cell);
    }
    map
}

// Data layers spiral inwards, each layer two modules thick and filled side by
// side starting at the top left corner
fn draw_layers(mb: &mut MapBuilder, size: AztecSize) {
    let layers = size.layers();
    let b1 = size.base_matrix_size() - 1;
    let am = alignment_map(size);
    let extra = if size.is_compact() { 9 } else { 12 };

    let mut row_offset = 0;
    for i in 0..layers {
        let row_size = (layers - i) * 4 + extra;
        let i2 = i * 2;
        for j in 0..row_size {
            let col_offset = j * 2;
            for k in 0..2 {
                let idx = (row_offset + col_offset + k) as u32;
                let rs = row_size as u32;
                mb.put(am[i2 + j], am[i2 + k], Cell::Payload(idx));
                mb.put(am[b1 - i2 - k], am[i2 + j], Cell::Payload(idx + rs * 2));
                mb.put(am[b1 - i2 - j], am[b1 - i2 - k], Cell::Payload(idx + rs * 4));
                mb.put(am[i2 + k], am[b1 - i2 - j], Cell::Payload(idx + rs * 6));
            }
        }
        row_offset += row_size * 8;
    }
}

fn draw_mode_message(mb: &mut MapBuilder, size: AztecSize) {
    let center = size.matrix_size() / 2;
    if size.is_compact() {
        for i in 0..7 {
            let offset = center - 3 + i;
            let i = i as u32;
            mb.put(center - 5, offset, Cell::Descriptor(i));
            mb.put(offset, center + 5, Cell::Descriptor(i + 7));
            mb.put(center + 5, offset, Cell::Descriptor(20 - i));
            mb.put(offset, center - 5, Cell::Descriptor(27 - i));
        }
    } else {
        for i in 0..10 {
            let offset = center - 5 + i + i / 5;
            let i = i as u32;
            mb.put(center - 7, offset, Cell::Descriptor(i));
            mb.put(offset, center + 7, Cell::Descriptor(i + 10));
            mb.put(center + 7, offset, Cell::Descriptor(29 - i));
            mb.put(offset, center - 7, Cell::Descriptor(39 - i));
        }
    }
}

// Bullseye, orientation marks and for full symbols the reference grid
fn draw_finder(mb: &mut MapBuilder, size: AztecSize) {
    let m = size.matrix_size();
    let center = m / 2;
    let radius = if size.is_compact() { 5 } else { 7 };

    for i in (0..radius).step_by(2) {
        for j in center - i..=center + i {
            mb.set_dark(center - i, j);
            mb.set_dark(center + i, j);
            mb.set_dark(j, center - i);
            mb.set_dark(j, center + i);
        }
    }

    let (lo, hi) = (center - radius, center + radius);
    mb.set_dark(lo, lo);
    mb.set_dark(lo, lo + 1);
    mb.set_dark(lo + 1, lo);
    mb.set_dark(lo, hi);
    mb.set_dark(lo + 1, hi);
    mb.set_dark(hi - 1, hi);

    if size.is_compact() {
        return;
    }
    let half = size.base_matrix_size() / 2;
    for j in (0..half.saturating_sub(1)).step_by(15).map(|i| i / 15 * 16) {
        for k in ((center & 1)..m).step_by(2) {
            mb.set_dark(k, center - j);
            mb.set_dark(k, center + j);
            mb.set_dark(center - j, k);
            mb.set_dark(center + j, k);
        }
    }
}
