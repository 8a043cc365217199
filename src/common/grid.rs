use image::{GrayImage, Luma};

use super::{
    bit_utils::BitStream,
    error::{SymbolError, SymbolResult},
};

// Module grid
//------------------------------------------------------------------------------

/// Final module matrix of a symbol. `true` is a dark module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    w: usize,
    h: usize,
    modules: Vec<bool>,
}

impl Grid {
    pub fn new(w: usize, h: usize) -> Self {
        Self { w, h, modules: vec![false; w * h] }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn modules(&self) -> &[bool] {
        &self.modules
    }

    pub fn get(&self, r: usize, c: usize) -> bool {
        debug_assert!(r < self.h && c < self.w, "Out of grid bounds: Row {r}, Col {c}");

        self.modules[r * self.w + c]
    }

    pub fn set(&mut self, r: usize, c: usize, dark: bool) {
        debug_assert!(r < self.h && c < self.w, "Out of grid bounds: Row {r}, Col {c}");

        self.modules[r * self.w + c] = dark;
    }

    pub fn toggle(&mut self, r: usize, c: usize) {
        let dark = self.get(r, c);
        self.set(r, c, !dark);
    }

    pub fn count_dark_modules(&self) -> usize {
        self.modules.iter().filter(|&&m| m).count()
    }

    pub fn to_debug_str(&self) -> String {
        let mut res = String::with_capacity(self.h * (self.w + 1) + 1);
        res.push('\n');
        for r in 0..self.h {
            for c in 0..self.w {
                res.push(if self.get(r, c) { '#' } else { '.' });
            }
            res.push('\n');
        }
        res
    }
}

// Renderer
//------------------------------------------------------------------------------

impl Grid {
    /// Rasterizes the grid with square modules and a light quiet zone of
    /// `quiet_zone` modules on every side.
    pub fn render(&self, module_sz: u32, quiet_zone: u32) -> GrayImage {
        let qz_sz = quiet_zone * module_sz;
        let w = self.w as u32 * module_sz;
        let h = self.h as u32 * module_sz;

        let mut canvas = GrayImage::from_pixel(w + 2 * qz_sz, h + 2 * qz_sz, Luma([255]));
        for i in 0..h {
            for j in 0..w {
                let r = (i / module_sz) as usize;
                let c = (j / module_sz) as usize;
                if self.get(r, c) {
                    canvas.put_pixel(j + qz_sz, i + qz_sz, Luma([0]));
                }
            }
        }

        canvas
    }

    pub fn to_str(&self, module_sz: usize) -> String {
        let mut canvas = String::new();
        for i in 0..self.h * module_sz {
            for j in 0..self.w * module_sz {
                let dark = self.get(i / module_sz, j / module_sz);
                canvas.push(if dark { ' ' } else { '█' });
            }
            canvas.push('\n');
        }
        canvas
    }
}

// Placement map
//------------------------------------------------------------------------------

/// Content of one cell of a placement map
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Cell {
    Fixed(bool),
    Payload(u32),
    Descriptor(u32),
}

/// Static per-size table that tells where every bit of a symbol goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementMap {
    w: usize,
    h: usize,
    cells: Vec<Cell>,
}

impl PlacementMap {
    pub fn new(w: usize, h: usize) -> Self {
        Self { w, h, cells: vec![Cell::Fixed(false); w * h] }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn get(&self, r: usize, c: usize) -> Cell {
        self.cells[r * self.w + c]
    }

    pub fn set(&mut self, r: usize, c: usize, cell: Cell) {
        debug_assert!(r < self.h && c < self.w, "Out of map bounds: Row {r}, Col {c}");

        self.cells[r * self.w + c] = cell;
    }

    pub fn payload_cells(&self) -> usize {
        self.cells.iter().filter(|c| matches!(c, Cell::Payload(_))).count()
    }

    pub fn descriptor_cells(&self) -> usize {
        self.cells.iter().filter(|c| matches!(c, Cell::Descriptor(_))).count()
    }

    /// Verifies that payload indices cover `0..payload_len` and descriptor
    /// indices cover `0..descriptor_len`, each exactly once.
    pub fn check_coverage(&self, payload_len: usize, descriptor_len: usize) -> SymbolResult<()> {
        let mut payload_seen = vec![false; payload_len];
        let mut descriptor_seen = vec![false; descriptor_len];

        for cell in self.cells.iter() {
            let (seen, i) = match *cell {
                Cell::Fixed(_) => continue,
                Cell::Payload(i) => (&mut payload_seen, i as usize),
                Cell::Descriptor(i) => (&mut descriptor_seen, i as usize),
            };
            match seen.get_mut(i) {
                Some(s) if !*s => *s = true,
                Some(_) => return Err(SymbolError::Internal("Placement index used twice")),
                None => return Err(SymbolError::Internal("Placement index out of range")),
            }
        }

        if payload_seen.iter().chain(descriptor_seen.iter()).all(|&s| s) {
            Ok(())
        } else {
            Err(SymbolError::Internal("Placement map leaves bits unplaced"))
        }
    }

    /// Populates a grid from the payload and descriptor streams
    pub fn place(&self, payload: &BitStream, descriptor: &BitStream) -> SymbolResult<Grid> {
        let mut grid = Grid::new(self.w, self.h);
        for (i, cell) in self.cells.iter().enumerate() {
            let dark = match *cell {
                Cell::Fixed(b) => b,
                Cell::Payload(p) if (p as usize) < payload.len() => payload.get(p as usize),
                Cell::Descriptor(d) if (d as usize) < descriptor.len() => {
                    descriptor.get(d as usize)
                }
                _ => return Err(SymbolError::Internal("Placement index out of range")),
            };
            grid.modules[i] = dark;
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod grid_tests {

    use super::{Cell, Grid, PlacementMap};
    use crate::common::{bit_utils::BitStream, error::SymbolError};

    fn small_map() -> PlacementMap {
        let mut map = PlacementMap::new(3, 2);
        map.set(0, 0, Cell::Fixed(true));
        map.set(0, 1, Cell::Payload(1));
        map.set(0, 2, Cell::Payload(0));
        map.set(1, 0, Cell::Descriptor(0));
        map.set(1, 1, Cell::Payload(2));
        map
    }

    #[test]
    fn test_coverage() {
        let map = small_map();
        assert_eq!(map.payload_cells(), 3);
        assert_eq!(map.descriptor_cells(), 1);
        assert!(map.check_coverage(3, 1).is_ok());
        assert!(matches!(map.check_coverage(4, 1), Err(SymbolError::Internal(_))));
        assert!(matches!(map.check_coverage(2, 1), Err(SymbolError::Internal(_))));
    }

    #[test]
    fn test_duplicate_index() {
        let mut map = small_map();
        map.set(1, 2, Cell::Payload(0));
        assert!(matches!(map.check_coverage(3, 1), Err(SymbolError::Internal(_))));
    }

    #[test]
    fn test_place() {
        let map = small_map();
        let mut payload = BitStream::new(3);
        payload.push_bits(0b011u8, 3);
        let mut desc = BitStream::new(1);
        desc.push(true);
        let grid = map.place(&payload, &desc).unwrap();
        assert_eq!(grid.to_debug_str(), "\n##.\n##.\n");
        assert_eq!(grid.count_dark_modules(), 4);
    }

    #[test]
    fn test_place_short_payload() {
        let map = small_map();
        let payload = BitStream::new(0);
        let desc = BitStream::new(0);
        assert!(map.place(&payload, &desc).is_err());
    }

    #[test]
    fn test_render() {
        let mut grid = Grid::new(2, 1);
        grid.set(0, 1, true);
        let img = grid.render(2, 1);
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(img.get_pixel(2, 2).0, [255]);
        assert_eq!(img.get_pixel(4, 2).0, [0]);
        assert_eq!(img.get_pixel(5, 3).0, [0]);
        assert_eq!(img.get_pixel(6, 2).0, [255]);
    }
}
