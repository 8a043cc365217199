use std::fmt::{Display, Formatter};
use std::ops::Deref;

use crate::common::{
    bit_utils::BitStream,
    ec::{blockify, interleave, GaloisField, ReedSolomon},
    error::{SymbolError, SymbolResult},
};

// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct Version(u8);

impl Deref for Version {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Version {
    pub fn new(v: u8) -> SymbolResult<Self> {
        match v {
            1..=13 => Ok(Self(v)),
            _ => Err(SymbolError::InvalidVersion),
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=13).map(Self)
    }

    /// Macromodules per side
    pub fn modules(self) -> usize {
        self.0 as usize * 2 + 1
    }

    pub fn width(self) -> usize {
        self.modules() * 6
    }

    /// Two codewords per macromodule
    pub fn total_codewords(self) -> usize {
        self.modules() * self.modules() * 2
    }

    /// Recommended level: 5 for version 1, 4 for versions 2 and 3, 3 above
    pub fn default_ec_level(self) -> ECLevel {
        match self.0 {
            1 => ECLevel(5),
            2 | 3 => ECLevel(4),
            _ => ECLevel(3),
        }
    }

    // Version 1 has no level 1 layout
    pub fn supports(self, ecl: ECLevel) -> bool {
        EC_PER_BLOCK[self.index()][ecl.index()].1 > 0
    }

    pub fn block_count(self) -> usize {
        let (_, b1, b2) = BLOCK_SIZES[self.index()];
        b1 + b2
    }

    pub fn ec_codewords(self, ecl: ECLevel) -> usize {
        self.block_layout(ecl).iter().map(|&(_, e)| e).sum()
    }

    /// Zero when the level is not available for this version
    pub fn data_codewords(self, ecl: ECLevel) -> usize {
        if !self.supports(ecl) {
            return 0;
        }
        self.total_codewords() - self.ec_codewords(ecl)
    }

    // Per block (data, ec) lengths, larger blocks first
    pub fn block_layout(self, ecl: ECLevel) -> Vec<(usize, usize)> {
        let (n1, b1, b2) = BLOCK_SIZES[self.index()];
        let (e1, b3, e2) = EC_PER_BLOCK[self.index()][ecl.index()];
        (0..b1 + b2)
            .map(|i| {
                let len = if i < b1 { n1 } else { n1 - 1 };
                let ec = if i < b3 { e1 } else { e2 };
                (len - ec, ec)
            })
            .collect()
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Version {}", self.0)
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct ECLevel(u8);

impl Deref for ECLevel {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ECLevel {
    pub fn new(level: u8) -> SymbolResult<Self> {
        match level {
            1..=5 => Ok(Self(level)),
            _ => Err(SymbolError::InvalidECLevel),
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=5).map(Self)
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }

    // Two bit id shown in every macromodule of a layer
    pub fn layer_id(self, layer: usize) -> u8 {
        match self.0 {
            1 => 3 - (layer % 4) as u8,
            l => ((layer + 5 - l as usize) % 4) as u8,
        }
    }
}

impl Display for ECLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

// Codewords
//------------------------------------------------------------------------------

/// Smallest version holding `bits` and the level it is encoded at.
///
/// Without an explicit level each version is tried at its recommended level.
/// A forced version without a level steps down from the recommended level
/// until the data fits.
pub fn select_version(
    bits: usize,
    ecl: Option<ECLevel>,
    forced: Option<Version>,
) -> SymbolResult<(Version, ECLevel)> {
    if let (Some(v), Some(l)) = (forced, ecl) {
        if !v.supports(l) {
            return Err(SymbolError::InvalidECLevel);
        }
    }
    let words = bits.div_ceil(7);
    candidates(ecl, forced)
        .find(|&(v, l)| words <= v.data_codewords(l))
        .ok_or(SymbolError::DataTooLong)
}

/// Most data words any candidate version and level can hold
pub fn max_data_codewords(ecl: Option<ECLevel>, forced: Option<Version>) -> usize {
    candidates(ecl, forced).map(|(v, l)| v.data_codewords(l)).max().unwrap_or(0)
}

// Version and level pairs in the order they are tried
fn candidates(
    ecl: Option<ECLevel>,
    forced: Option<Version>,
) -> impl Iterator<Item = (Version, ECLevel)> {
    let versions = match forced {
        Some(v) => *v..=*v,
        None => 1..=13,
    };
    versions.map(Version).flat_map(move |v| {
        let levels = match (ecl, forced) {
            (Some(l), _) => *l..=*l,
            (None, Some(_)) => 1..=*v.default_ec_level(),
            (None, None) => *v.default_ec_level()..=*v.default_ec_level(),
        };
        levels.rev().map(ECLevel).map(move |l| (v, l))
    })
}

/// Pads data words to capacity with alternating 0x00 and 0x7E
pub fn pad_codewords(data: &mut Vec<u16>, capacity: usize) {
    let start = data.len();
    data.extend((start..capacity).map(|i| if i == start || i % 2 == 0 { 0x00 } else { 0x7E }));
}

/// Splits data into blocks, appends error correction to each and
/// interleaves the blocks. Returns the payload and all EC words.
pub fn add_ecc(data: &[u16], ver: Version, ecl: ECLevel) -> SymbolResult<(BitStream, Vec<u16>)> {
    let layout = ver.block_layout(ecl);
    let data_sizes = layout.iter().map(|&(d, _)| d).collect::<Vec<_>>();
    if data.len() != data_sizes.iter().sum::<usize>() {
        return Err(SymbolError::Internal("Data words don't fill the block layout"));
    }

    let gf = GaloisField::new(GF_POLY)?;
    let mut blocks = Vec::with_capacity(layout.len());
    let mut all_ecc = Vec::new();
    for (block, &(_, ec_len)) in blockify(data, &data_sizes).into_iter().zip(layout.iter()) {
        let ecc = ReedSolomon::new(&gf, ec_len, 1)?.encode(block)?;
        all_ecc.extend_from_slice(&ecc);
        blocks.push([block, ecc.as_slice()].concat());
    }

    let words = interleave(&blocks);
    let mut bs = BitStream::new(ver.total_codewords() * 7);
    words.iter().for_each(|&w| bs.push_bits(w, 7));
    Ok((bs, all_ecc))
}

/// Layer ids of every macromodule in row major order, two bits each
pub fn layer_id_bits(ver: Version, ecl: ECLevel) -> BitStream {
    let n = ver.modules();
    let center = n / 2;
    let mut bs = BitStream::new(n * n * 2);
    for r in 0..n {
        for c in 0..n {
            let layer = r.abs_diff(center).max(c.abs_diff(center));
            bs.push_bits(ecl.layer_id(layer), 2);
        }
    }
    bs
}

// Global constants
//------------------------------------------------------------------------------

const GF_POLY: u16 = 0x89;

// Block sizes per version as (length of the larger blocks, larger blocks,
// smaller blocks). Smaller blocks hold one codeword less.
#[rustfmt::skip]
static BLOCK_SIZES: [(usize, usize, usize); 13] = [
    (18, 1, 0), (50, 1, 0), (98, 1, 0), (81, 2, 0), (121, 2, 0), (113, 2, 1), (113, 2, 2),
    (116, 3, 2), (121, 2, 4), (126, 7, 0), (118, 5, 4), (125, 10, 0), (122, 6, 6),
];

// EC words per block for levels 1 to 5 as (e1, blocks using e1, e2).
// The remaining blocks use e2.
#[rustfmt::skip]
static EC_PER_BLOCK: [[(usize, usize, usize); 5]; 13] = [
    [(0, 0, 0), (3, 1, 0), (5, 1, 0), (7, 1, 0), (9, 1, 0)],
    [(5, 1, 0), (10, 1, 0), (15, 1, 0), (20, 1, 0), (25, 1, 0)],
    [(9, 1, 0), (19, 1, 0), (29, 1, 0), (39, 1, 0), (49, 1, 0)],
    [(8, 2, 0), (16, 2, 0), (24, 2, 0), (32, 2, 0), (41, 1, 40)],
    [(12, 2, 0), (24, 2, 0), (36, 2, 0), (48, 2, 0), (61, 1, 60)],
    [(11, 3, 0), (23, 1, 22), (34, 2, 33), (45, 3, 0), (57, 1, 56)],
    [(12, 1, 11), (23, 2, 22), (34, 3, 33), (45, 4, 0), (57, 1, 56)],
    [(12, 2, 11), (23, 5, 0), (35, 3, 34), (47, 1, 46), (58, 4, 57)],
    [(12, 6, 0), (24, 6, 0), (36, 6, 0), (48, 6, 0), (61, 1, 60)],
    [(13, 4, 12), (26, 1, 25), (38, 5, 37), (51, 2, 50), (63, 7, 0)],
    [(12, 6, 11), (24, 4, 23), (36, 2, 35), (47, 9, 0), (59, 7, 58)],
    [(13, 5, 12), (25, 10, 0), (38, 5, 37), (50, 10, 0), (63, 5, 62)],
    [(13, 1, 12), (25, 3, 24), (37, 5, 36), (49, 7, 48), (61, 9, 60)],
];

#[cfg(test)]
mod layout_tests {

    use test_case::test_case;

    use super::{
        add_ecc, layer_id_bits, max_data_codewords, pad_codewords, select_version, ECLevel,
        Version,
    };
    use crate::common::error::SymbolError;

    #[test_case(1, 18, 18, 1)]
    #[test_case(3, 42, 98, 1)]
    #[test_case(6, 78, 338, 3)]
    #[test_case(11, 138, 1058, 9)]
    #[test_case(13, 162, 1458, 12)]
    fn test_geometry(v: u8, width: usize, total: usize, blocks: usize) {
        let ver = Version::new(v).unwrap();
        assert_eq!(ver.width(), width);
        assert_eq!(ver.total_codewords(), total);
        assert_eq!(ver.block_count(), blocks);
    }

    #[test]
    fn test_block_layout_sums() {
        for ver in Version::all() {
            for ecl in ECLevel::all().filter(|&l| ver.supports(l)) {
                let layout = ver.block_layout(ecl);
                let data: usize = layout.iter().map(|b| b.0).sum();
                let ec: usize = layout.iter().map(|b| b.1).sum();
                assert_eq!(data, ver.data_codewords(ecl));
                assert_eq!(data + ec, ver.total_codewords());
                assert!(layout.iter().all(|&(d, e)| d > 0 && e >= 3 && d + e <= 127));
            }
        }
    }

    #[test]
    fn test_data_codewords() {
        #[rustfmt::skip]
        let exp: [[usize; 5]; 13] = [
            [0, 15, 13, 11, 9], [45, 40, 35, 30, 25], [89, 79, 69, 59, 49],
            [146, 130, 114, 98, 81], [218, 194, 170, 146, 121], [305, 271, 237, 203, 169],
            [405, 360, 315, 270, 225], [521, 463, 405, 347, 289], [650, 578, 506, 434, 361],
            [794, 706, 618, 530, 441], [953, 847, 741, 635, 529], [1125, 1000, 875, 750, 625],
            [1313, 1167, 1021, 875, 729],
        ];
        for (ver, row) in Version::all().zip(exp) {
            let data = ECLevel::all().map(|l| ver.data_codewords(l)).collect::<Vec<_>>();
            assert_eq!(data, row, "{ver}");
        }
        assert!(!Version::new(1).unwrap().supports(ECLevel::new(1).unwrap()));
    }

    #[test_case(6, 2, vec![(90, 23), (91, 22), (90, 22)])]
    #[test_case(6, 3, vec![(79, 34), (79, 34), (79, 33)])]
    #[test_case(4, 5, vec![(40, 41), (41, 40)])]
    fn test_block_layout(v: u8, l: u8, exp: Vec<(usize, usize)>) {
        let layout = Version::new(v).unwrap().block_layout(ECLevel::new(l).unwrap());
        assert_eq!(layout, exp);
    }

    #[test]
    fn test_layer_ids() {
        let ecl1 = ECLevel::new(1).unwrap();
        assert_eq!((0..5).map(|l| ecl1.layer_id(l)).collect::<Vec<_>>(), vec![3, 2, 1, 0, 3]);
        let ecl3 = ECLevel::new(3).unwrap();
        assert_eq!((0..4).map(|l| ecl3.layer_id(l)).collect::<Vec<_>>(), vec![2, 3, 0, 1]);

        let bits = layer_id_bits(Version::new(1).unwrap(), ecl3);
        assert_eq!(bits.len(), 18);
        // Center macromodule of the 3 x 3 grid is layer 0
        assert_eq!(bits.read(8, 2), 2);
        assert_eq!(bits.read(0, 2), 3);
    }

    #[test]
    fn test_select_version() {
        let v = |n| Version::new(n).unwrap();
        let l = |n| ECLevel::new(n).unwrap();
        // Version 1 holds 9 data words at its default level 5
        assert_eq!(select_version(63, None, None).unwrap(), (v(1), l(5)));
        assert_eq!(select_version(64, None, None).unwrap(), (v(2), l(4)));
        assert_eq!(select_version(64, None, Some(v(1))).unwrap(), (v(1), l(4)));
        assert_eq!(select_version(7, Some(l(1)), None).unwrap(), (v(2), l(1)));
        assert_eq!(select_version(7, Some(l(1)), Some(v(1))), Err(SymbolError::InvalidECLevel));
        assert_eq!(select_version(106, None, Some(v(1))), Err(SymbolError::DataTooLong));
        assert_eq!(select_version(20000, None, None), Err(SymbolError::DataTooLong));
    }

    #[test]
    fn test_max_data_codewords() {
        let v1 = Version::new(1).unwrap();
        assert_eq!(max_data_codewords(None, Some(v1)), 15);
        assert_eq!(max_data_codewords(None, None), 1021);
        assert_eq!(max_data_codewords(Some(ECLevel::new(1).unwrap()), None), 1313);
    }

    #[test]
    fn test_padding() {
        let mut data = vec![5, 6, 7];
        pad_codewords(&mut data, 7);
        assert_eq!(data, vec![5, 6, 7, 0x00, 0x00, 0x7E, 0x00]);
    }

    #[test]
    fn test_add_ecc() {
        let ver = Version::new(1).unwrap();
        let ecl = ECLevel::new(2).unwrap();
        let data = vec![0; ver.data_codewords(ecl)];
        let (payload, ecc) = add_ecc(&data, ver, ecl).unwrap();
        assert_eq!(payload.len(), 18 * 7);
        assert_eq!(ecc, vec![0; 3]);
        let err = add_ecc(&data[1..], ver, ecl).unwrap_err();
        assert_eq!(err, SymbolError::Internal("Data words don't fill the block layout"));
    }
}
