use std::fmt::{Display, Formatter};

use super::codec::Mode;
use crate::common::error::{SymbolError, SymbolResult};

// Version
//------------------------------------------------------------------------------

/// Micro QR version M1 to M4
#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct Version(u8);

impl Version {
    pub const ALL: [Version; 4] = [Version(1), Version(2), Version(3), Version(4)];

    pub fn new(v: u8) -> SymbolResult<Self> {
        match v {
            1..=4 => Ok(Self(v)),
            _ => Err(SymbolError::InvalidVersion),
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub const fn width(self) -> usize {
        self.0 as usize * 2 + 9
    }

    pub fn mode_bits(self) -> usize {
        self.0 as usize - 1
    }

    /// Bit length of the character count indicator. `None` when the mode is
    /// unavailable in this version.
    pub fn char_cnt_bits(self, mode: Mode) -> Option<usize> {
        let v = self.0 as usize;
        match mode {
            Mode::Numeric => Some(v + 2),
            Mode::Alphanumeric if v >= 2 => Some(v + 1),
            Mode::Byte if v >= 3 => Some(v + 1),
            Mode::Kanji if v >= 3 => Some(v),
            _ => None,
        }
    }

    pub fn supports(self, mode: Mode) -> bool {
        self.char_cnt_bits(mode).is_some()
    }

    pub fn terminator_bits(self) -> usize {
        self.0 as usize * 2 + 1
    }

    pub fn total_codewords(self) -> usize {
        TOTAL_CODEWORDS[self.0 as usize - 1]
    }

    /// M1 and M3 end their data with a 4-bit codeword
    pub fn has_half_codeword(self) -> bool {
        self.0 == 1 || self.0 == 3
    }

    pub fn supports_ec_level(self, ecl: ECLevel) -> bool {
        self.ec_table_entry(ecl).is_some()
    }

    fn ec_table_entry(self, ecl: ECLevel) -> Option<(usize, usize, u8)> {
        match (self.0, ecl) {
            (1, ECLevel::L) => Some((20, 2, 0)),
            (2, ECLevel::L) => Some((40, 5, 1)),
            (2, ECLevel::M) => Some((32, 6, 2)),
            (3, ECLevel::L) => Some((84, 6, 3)),
            (3, ECLevel::M) => Some((68, 8, 4)),
            (4, ECLevel::L) => Some((128, 8, 5)),
            (4, ECLevel::M) => Some((112, 10, 6)),
            (4, ECLevel::Q) => Some((80, 14, 7)),
            _ => None,
        }
    }

    pub fn data_bit_capacity(self, ecl: ECLevel) -> SymbolResult<usize> {
        self.ec_table_entry(ecl).map(|e| e.0).ok_or(SymbolError::InvalidECLevel)
    }

    pub fn data_codewords(self, ecl: ECLevel) -> SymbolResult<usize> {
        Ok(self.data_bit_capacity(ecl)?.div_ceil(8))
    }

    pub fn ecc_per_block(self, ecl: ECLevel) -> SymbolResult<usize> {
        self.ec_table_entry(ecl).map(|e| e.1).ok_or(SymbolError::InvalidECLevel)
    }

    /// Symbol number carried in the format information
    pub fn symbol_number(self, ecl: ECLevel) -> SymbolResult<u8> {
        self.ec_table_entry(ecl).map(|e| e.2).ok_or(SymbolError::InvalidECLevel)
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "M{}", self.0)
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
}

impl Display for ECLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
        };
        f.write_str(s)
    }
}

// Global constants
//------------------------------------------------------------------------------

static TOTAL_CODEWORDS: [usize; 4] = [5, 10, 17, 24];

pub static PADDING_CODEWORDS: [u8; 2] = [0b11101100, 0b00010001];

#[cfg(test)]
mod version_tests {

    use test_case::test_case;

    use super::{ECLevel, Version};
    use crate::microqr::codec::Mode;

    #[test_case(1, ECLevel::L, 3)]
    #[test_case(2, ECLevel::L, 5)]
    #[test_case(2, ECLevel::M, 4)]
    #[test_case(3, ECLevel::L, 11)]
    #[test_case(3, ECLevel::M, 9)]
    #[test_case(4, ECLevel::L, 16)]
    #[test_case(4, ECLevel::M, 14)]
    #[test_case(4, ECLevel::Q, 10)]
    fn test_codeword_totals(v: u8, ecl: ECLevel, data_cw: usize) {
        let ver = Version::new(v).unwrap();
        assert_eq!(ver.data_codewords(ecl).unwrap(), data_cw);
        assert_eq!(data_cw + ver.ecc_per_block(ecl).unwrap(), ver.total_codewords());
    }

    #[test]
    fn test_unsupported_ec_level() {
        assert!(Version::new(1).unwrap().data_bit_capacity(ECLevel::M).is_err());
        assert!(!Version::new(3).unwrap().supports_ec_level(ECLevel::Q));
        assert!(Version::new(5).is_err());
    }

    #[test]
    fn test_char_cnt_bits() {
        let m1 = Version::new(1).unwrap();
        let m4 = Version::new(4).unwrap();
        assert_eq!(m1.char_cnt_bits(Mode::Numeric), Some(3));
        assert_eq!(m1.char_cnt_bits(Mode::Alphanumeric), None);
        assert_eq!(m4.char_cnt_bits(Mode::Numeric), Some(6));
        assert_eq!(m4.char_cnt_bits(Mode::Alphanumeric), Some(5));
        assert_eq!(m4.char_cnt_bits(Mode::Byte), Some(5));
        assert_eq!(m4.char_cnt_bits(Mode::Kanji), Some(4));
    }
}
