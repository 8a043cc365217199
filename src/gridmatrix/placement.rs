use std::sync::OnceLock;

use super::layout::Version;
use crate::common::grid::{Cell, PlacementMap};

// Placement map
//------------------------------------------------------------------------------

static MAPS: [OnceLock<PlacementMap>; 13] = [const { OnceLock::new() }; 13];

pub fn placement_map(ver: Version) -> &'static PlacementMap {
    MAPS[*ver as usize - 1].get_or_init(|| build_map(ver))
}

/// Position of a macromodule in the codeword order, counted in rings
/// spiralling out from the center. Each ring starts right of its top left
/// corner, runs clockwise and ends on that corner.
pub fn spiral_index(r: usize, c: usize, modules: usize) -> usize {
    let center = (modules / 2) as isize;
    let (dr, dc) = (r as isize - center, c as isize - center);
    let k = dr.abs().max(dc.abs());
    if k == 0 {
        return 0;
    }

    let base = (2 * k - 1) * (2 * k - 1);
    let offset = if dr == -k && dc > -k {
        dc + k - 1
    } else if dc == k && dr > -k {
        2 * k + dr + k - 1
    } else if dr == k && dc < k {
        4 * k + k - 1 - dc
    } else {
        6 * k + k - 1 - dr
    };
    (base + offset) as usize
}

fn build_map(ver: Version) -> PlacementMap {
    let n = ver.modules();
    let mut map = PlacementMap::new(ver.width(), ver.width());

    for my in 0..n {
        for mx in 0..n {
            let (top, left) = (my * 6, mx * 6);

            // Frames alternate dark and light like a checkerboard
            let dark = (mx + my) % 2 == 0;
            for i in 0..6 {
                map.set(top, left + i, Cell::Fixed(dark));
                map.set(top + 5, left + i, Cell::Fixed(dark));
                map.set(top + i, left, Cell::Fixed(dark));
                map.set(top + i, left + 5, Cell::Fixed(dark));
            }

            // Inner 4 x 4 holds the layer id then the second and first
            // codeword of the macromodule
            let id = 2 * (my * n + mx) as u32;
            let m = spiral_index(my, mx, n) as u32;
            let order = (0..7).map(|t| (2 * m + 1) * 7 + t).chain((0..7).map(|t| 2 * m * 7 + t));
            let mut cells = (0..16).map(|i| (top + 1 + i / 4, left + 1 + i % 4));
            for (d, (r, c)) in cells.by_ref().take(2).enumerate() {
                map.set(r, c, Cell::Descriptor(id + d as u32));
            }
            for ((r, c), idx) in cells.zip(order) {
                map.set(r, c, Cell::Payload(idx));
            }
        }
    }
    map
}
