mod codec;
mod mask;
mod placement;
mod version;

pub use mask::MaskPattern;
pub use version::{ECLevel, Version};

use log::debug;

use crate::common::{
    bit_utils::BitStream,
    ec::{GaloisField, ReedSolomon},
    error::{SymbolError, SymbolResult},
    grid::{Cell, Grid, PlacementMap},
    metadata::{EncodeInfo, Symbol, SymbolInfo, Symbology},
};
use codec::{data_codewords, encode};
use mask::compute_score;
use placement::{payload_bits, placement_map, FORMAT_INFO_BITS};

// Micro QR builder
//------------------------------------------------------------------------------

pub struct MicroQRBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
}

impl<'a> MicroQRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, version: None, ec_level: ECLevel::L, mask: None }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn unset_mask(&mut self) -> &mut Self {
        self.mask = None;
        self
    }

    pub fn metadata(&self) -> String {
        match self.version {
            Some(v) => format!("{{ Version: {v}, Ec level: {} }}", self.ec_level),
            None => format!("{{ Version: None, Ec level: {} }}", self.ec_level),
        }
    }
}

impl MicroQRBuilder<'_> {
    pub fn build(&self) -> SymbolResult<Symbol> {
        debug!("Generating Micro QR {}", self.metadata());

        if let Some(v) = self.version {
            if !v.supports_ec_level(self.ec_level) {
                return Err(SymbolError::InvalidECLevel);
            }
        }

        let (encoded_data, version) = encode(self.data, self.version, self.ec_level)?;
        let mut trace = EncodeInfo::new();
        trace.push(format!("Version {version}-{}", self.ec_level));

        // Compute error correction codewords
        let data_words = data_codewords(&encoded_data);
        let ec_len = version.ecc_per_block(self.ec_level)?;
        let gf = GaloisField::new(GF_POLY)?;
        let ecc = ReedSolomon::new(&gf, ec_len, 0)?.encode(&data_words)?;
        trace.push_codewords("Data codewords", &data_words);
        trace.push_codewords("EC codewords", &ecc);

        let mut payload = BitStream::new(payload_bits(version));
        payload.extend(&encoded_data);
        ecc.iter().for_each(|&w| payload.push_bits(w, 8));

        let map = placement_map(version);
        map.check_coverage(payload.len(), FORMAT_INFO_BITS)?;

        let symbol_number = version.symbol_number(self.ec_level)?;
        let (mask, grid) = match self.mask {
            Some(m) => (m, draw_masked(map, &payload, symbol_number, m)?),
            None => apply_best_mask(map, &payload, symbol_number)?,
        };
        debug!("Applied mask {}", *mask);
        trace.push(format!("Mask {}", *mask));

        let info = SymbolInfo {
            symbology: Symbology::MicroQR,
            size: version.to_string(),
            ec_level: self.ec_level.to_string(),
            data_codewords: data_words.len(),
            ec_codewords: ecc.len(),
            codeword_bits: 8,
            trace,
        };
        Ok(Symbol::new(grid, info))
    }
}

fn draw_masked(
    map: &PlacementMap,
    payload: &BitStream,
    symbol_number: u8,
    mask: MaskPattern,
) -> SymbolResult<Grid> {
    let mut format = BitStream::new(FORMAT_INFO_BITS);
    format.push_bits(format_info(symbol_number, mask), FORMAT_INFO_BITS);

    let mut grid = map.place(payload, &format)?;
    let mask_fn = mask.mask_function();
    for r in 0..map.height() {
        for c in 0..map.width() {
            if matches!(map.get(r, c), Cell::Payload(_)) && mask_fn(r, c) {
                grid.toggle(r, c);
            }
        }
    }
    Ok(grid)
}

fn apply_best_mask(
    map: &PlacementMap,
    payload: &BitStream,
    symbol_number: u8,
) -> SymbolResult<(MaskPattern, Grid)> {
    let mut best: Option<(u32, MaskPattern, Grid)> = None;
    for m in 0..4 {
        let mask = MaskPattern::new(m)?;
        let grid = draw_masked(map, payload, symbol_number, mask)?;
        let score = compute_score(&grid);
        if best.as_ref().map_or(true, |b| score > b.0) {
            best = Some((score, mask, grid));
        }
    }
    best.map(|(_, m, g)| (m, g)).ok_or(SymbolError::Internal("No mask evaluated"))
}

/// BCH(15,5) protected format information, masked with 0x4445
pub fn format_info(symbol_number: u8, mask: MaskPattern) -> u16 {
    let data = ((symbol_number as u16) << 2) | *mask as u16;
    let mut rem = data << 10;
    for i in (10..15).rev() {
        if (rem >> i) & 1 == 1 {
            rem ^= FORMAT_GEN_POLY << (i - 10);
        }
    }
    ((data << 10) | rem) ^ FORMAT_MASK
}

// Global constants
//------------------------------------------------------------------------------

const GF_POLY: u16 = 0x11D;

const FORMAT_GEN_POLY: u16 = 0x537;

const FORMAT_MASK: u16 = 0x4445;

#[cfg(test)]
mod microqr_tests {

    use test_case::test_case;

    use super::{format_info, ECLevel, MaskPattern, MicroQRBuilder, Version};
    use crate::common::error::SymbolError;

    #[test_case(0, 0, 0x4445)]
    #[test_case(0, 1, 0x4172)]
    #[test_case(0, 2, 0x4E2B)]
    #[test_case(0, 3, 0x4B1C)]
    #[test_case(1, 0, 0x55AE)]
    fn test_format_info(symbol_number: u8, mask: u8, exp: u16) {
        assert_eq!(format_info(symbol_number, MaskPattern::new(mask).unwrap()), exp);
    }

    #[test]
    fn test_metadata() {
        let mut builder = MicroQRBuilder::new(b"12345");
        builder.version(Version::new(2).unwrap()).ec_level(ECLevel::M);
        assert_eq!(builder.metadata(), "{ Version: M2, Ec level: M }");
        builder.unset_version();
        assert_eq!(builder.metadata(), "{ Version: None, Ec level: M }");
    }

    #[test_case("12345", "M1", 11)]
    #[test_case("123456", "M2", 13)]
    #[test_case("HELLO WORLD", "M3", 15)]
    #[test_case("hello, world", "M4", 17)]
    fn test_build(data: &str, size: &str, width: usize) {
        let symbol = MicroQRBuilder::new(data.as_bytes()).build().unwrap();
        assert_eq!(symbol.info().size, size);
        assert_eq!(symbol.width(), width);
        assert_eq!(symbol.height(), width);
        assert_eq!(symbol.info().total_codewords(), match width {
            11 => 5,
            13 => 10,
            15 => 17,
            _ => 24,
        });
    }

    #[test]
    fn test_forced_mask() {
        let mask = MaskPattern::new(2).unwrap();
        let symbol = MicroQRBuilder::new(b"01234567").mask(mask).build().unwrap();
        let grid = symbol.grid();
        // Format bits for M2-L with mask 2, most significant bit at row 8 col 1
        let format = format_info(1, mask);
        for i in 0..8 {
            assert_eq!(grid.get(8, i + 1), (format >> (14 - i)) & 1 == 1);
        }
        for i in 8..15 {
            assert_eq!(grid.get(15 - i, 8), (format >> (14 - i)) & 1 == 1);
        }
    }

    #[test]
    fn test_invalid_ec_level_for_version() {
        let res = MicroQRBuilder::new(b"1").version(Version::new(1).unwrap()).ec_level(ECLevel::M).build();
        assert_eq!(res, Err(SymbolError::InvalidECLevel));
        let res = MicroQRBuilder::new(b"1").ec_level(ECLevel::Q).build();
        assert!(res.is_ok());
        assert_eq!(res.unwrap().info().size, "M4");
    }

    #[test]
    fn test_empty() {
        assert_eq!(MicroQRBuilder::new(b"").build(), Err(SymbolError::EmptyData));
    }
}
