use std::fmt::{Display, Formatter};

use log::debug;

use crate::common::{
    bit_utils::BitStream,
    ec::{GaloisField, ReedSolomon},
    error::{SymbolError, SymbolResult},
};

// Symbol size
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum AztecSize {
    Compact(u8),
    Full(u8),
}

impl AztecSize {
    pub fn compact(layers: u8) -> SymbolResult<Self> {
        match layers {
            1..=4 => Ok(Self::Compact(layers)),
            _ => Err(SymbolError::InvalidVersion),
        }
    }

    pub fn full(layers: u8) -> SymbolResult<Self> {
        match layers {
            1..=32 => Ok(Self::Full(layers)),
            _ => Err(SymbolError::InvalidVersion),
        }
    }

    pub fn layers(self) -> usize {
        match self {
            Self::Compact(l) | Self::Full(l) => l as usize,
        }
    }

    pub fn is_compact(self) -> bool {
        matches!(self, Self::Compact(_))
    }

    pub fn total_bits(self) -> usize {
        let l = self.layers();
        let base = if self.is_compact() { 88 } else { 112 };
        (base + 16 * l) * l
    }

    pub fn word_size(self) -> usize {
        match self.layers() {
            1..=2 => 6,
            3..=8 => 8,
            9..=22 => 10,
            _ => 12,
        }
    }

    pub fn total_words(self) -> usize {
        self.total_bits() / self.word_size()
    }

    /// Side of the matrix without reference grid lines
    pub fn base_matrix_size(self) -> usize {
        let base = if self.is_compact() { 11 } else { 14 };
        base + self.layers() * 4
    }

    pub fn matrix_size(self) -> usize {
        let base = self.base_matrix_size();
        match self {
            Self::Compact(_) => base,
            Self::Full(_) => base + 1 + 2 * ((base / 2 - 1) / 15),
        }
    }

    pub fn mode_message_bits(self) -> usize {
        if self.is_compact() {
            28
        } else {
            40
        }
    }

    /// Largest data word count the mode message can express
    pub fn max_data_words(self, reader_init: bool) -> usize {
        match (self.is_compact(), reader_init) {
            (true, false) => 64,
            (true, true) => 32,
            (false, false) => 2048,
            (false, true) => 1024,
        }
    }

    pub fn supports_reader_init(self) -> bool {
        match self {
            Self::Compact(l) => l == 1,
            Self::Full(l) => l <= 22,
        }
    }

    pub fn field_poly(self) -> u16 {
        match self.word_size() {
            6 => 0x43,
            8 => 0x12D,
            10 => 0x409,
            _ => 0x1069,
        }
    }

    // Compact 1 to 4 then full 4 to 32. Full 1 to 3 never beat a compact
    // symbol of the same side.
    fn search_order(reader_init: bool) -> Vec<AztecSize> {
        let compact = (1..=4).map(Self::Compact);
        let full = (1..=32).map(Self::Full);
        match reader_init {
            false => compact.chain(full.skip(3)).collect(),
            true => compact.chain(full).filter(|s| s.supports_reader_init()).collect(),
        }
    }
}

impl Display for AztecSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compact(l) => write!(f, "Compact {l}"),
            Self::Full(l) => write!(f, "Full {l}"),
        }
    }
}

// Error correction level
//------------------------------------------------------------------------------

/// Minimum share of the symbol given to error correction, plus 3 codewords
#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub enum ECLevel {
    P10,
    P23,
    P36,
    P50,
}

impl ECLevel {
    pub fn percent(self) -> usize {
        match self {
            Self::P10 => 10,
            Self::P23 => 23,
            Self::P36 => 36,
            Self::P50 => 50,
        }
    }

    pub fn min_ec_words(self, total_words: usize) -> usize {
        total_words * self.percent() / 100 + 3
    }

    pub fn data_capacity_words(self, size: AztecSize) -> usize {
        let total = size.total_words();
        total.saturating_sub(self.min_ec_words(total))
    }
}

impl Display for ECLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

// Bit stuffing
//------------------------------------------------------------------------------

/// Splits bits into words of `word_size`, breaking up words whose leading
/// `word_size - 1` bits are all equal by forcing the last bit to the
/// complement and carrying the displaced bit into the next word. The final
/// word is padded with ones.
pub fn stuff_bits(bits: &BitStream, word_size: usize) -> Vec<u16> {
    let n = bits.len();
    let mask = (1u16 << word_size) - 2;
    let mut res = Vec::with_capacity(n / word_size + 1);

    let mut i = 0;
    while i < n {
        let mut word = 0u16;
        for j in 0..word_size {
            if i + j >= n || bits.get(i + j) {
                word |= 1 << (word_size - 1 - j);
            }
        }

        if word & mask == mask {
            res.push(word & mask);
            i += word_size - 1;
        } else if word & mask == 0 {
            res.push(word | 1);
            i += word_size - 1;
        } else {
            res.push(word);
            i += word_size;
        }
    }
    res
}

// Size selection
//------------------------------------------------------------------------------

/// Picks the smallest size, or checks the forced one, whose data capacity
/// holds the stuffed words. Stuffing is redone per word size since it may
/// lengthen the stream.
pub fn select_size(
    bits: &BitStream,
    ecl: ECLevel,
    forced: Option<AztecSize>,
    reader_init: bool,
) -> SymbolResult<(AztecSize, Vec<u16>)> {
    let candidates = match forced {
        Some(size) => {
            if reader_init && !size.supports_reader_init() {
                return Err(SymbolError::ConflictingOptions(
                    "reader initialisation needs compact 1 or full up to 22 layers",
                ));
            }
            vec![size]
        }
        None => AztecSize::search_order(reader_init),
    };

    let mut stuffed: Option<(usize, Vec<u16>)> = None;
    for size in candidates {
        let w = size.word_size();
        if stuffed.as_ref().map_or(true, |s| s.0 != w) {
            stuffed = Some((w, stuff_bits(bits, w)));
        }
        let Some((_, words)) = stuffed.as_ref() else {
            continue;
        };

        let capacity = ecl.data_capacity_words(size).min(size.max_data_words(reader_init));
        debug!("Trying {size}: {} words against capacity {capacity}", words.len());
        if words.len() <= capacity {
            return Ok((size, words.clone()));
        }
    }
    Err(SymbolError::DataTooLong)
}

// Message construction
//------------------------------------------------------------------------------

/// Leading zero pad, data words, then error correction words filling the
/// rest of the symbol
pub fn message_bits(size: AztecSize, data_words: &[u16]) -> SymbolResult<(BitStream, Vec<u16>)> {
    let w = size.word_size();
    let total_words = size.total_words();
    let ec_len = total_words - data_words.len();

    let gf = GaloisField::new(size.field_poly())?;
    let ecc = ReedSolomon::new(&gf, ec_len, 1)?.encode(data_words)?;

    let total_bits = size.total_bits();
    let mut bs = BitStream::new(total_bits);
    bs.push_bits(0u8, total_bits % w);
    data_words.iter().chain(ecc.iter()).for_each(|&word| bs.push_bits(word, w));
    Ok((bs, ecc))
}

/// Layer count and data word count protected by GF(16) Reed-Solomon
pub fn mode_message(
    size: AztecSize,
    data_words: usize,
    reader_init: bool,
) -> SymbolResult<BitStream> {
    let (layer_bits, count_bits) = if size.is_compact() { (2, 6) } else { (5, 11) };
    let mut count = (data_words as u16 - 1) & ((1 << count_bits) - 1);
    if reader_init {
        count |= 1 << (count_bits - 1);
    }
    let value = ((size.layers() as u16 - 1) << count_bits) | count;

    let data_len = (layer_bits + count_bits) / 4;
    let words = (0..data_len)
        .map(|i| (value >> (4 * (data_len - 1 - i))) & 0xF)
        .collect::<Vec<_>>();

    let gf = GaloisField::new(MODE_MESSAGE_POLY)?;
    let total = size.mode_message_bits() / 4;
    let ecc = ReedSolomon::new(&gf, total - data_len, 1)?.encode(&words)?;

    let mut bs = BitStream::new(size.mode_message_bits());
    words.iter().chain(ecc.iter()).for_each(|&w| bs.push_bits(w, 4));
    Ok(bs)
}

const MODE_MESSAGE_POLY: u16 = 0x13;

#[cfg(test)]
mod layout_tests {

    use test_case::test_case;

    use super::{message_bits, mode_message, select_size, stuff_bits, AztecSize, ECLevel};
    use crate::common::{bit_utils::BitStream, error::SymbolError};

    fn stream(s: &str) -> BitStream {
        let bits = s.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>();
        let mut bs = BitStream::new(bits.len());
        bits.iter().for_each(|&c| bs.push(c == 'X'));
        bs
    }

    fn pattern(bs: &BitStream) -> String {
        (0..bs.len()).map(|i| if bs.get(i) { 'X' } else { '.' }).collect()
    }

    #[test_case(AztecSize::Compact(1), 104, 6, 15)]
    #[test_case(AztecSize::Compact(4), 608, 8, 27)]
    #[test_case(AztecSize::Full(1), 128, 6, 19)]
    #[test_case(AztecSize::Full(4), 704, 8, 31)]
    #[test_case(AztecSize::Full(5), 960, 8, 37)]
    #[test_case(AztecSize::Full(22), 10208, 10, 109)]
    #[test_case(AztecSize::Full(32), 19968, 12, 151)]
    fn test_geometry(size: AztecSize, bits: usize, word: usize, side: usize) {
        assert_eq!(size.total_bits(), bits);
        assert_eq!(size.word_size(), word);
        assert_eq!(size.matrix_size(), side);
    }

    #[test]
    fn test_compact_1_capacity() {
        assert_eq!(ECLevel::P23.data_capacity_words(AztecSize::Compact(1)) * 6, 66);
    }

    #[test_case(5, ".X.X. X.X.X .X.X.", vec![0b01010, 0b10101, 0b01010])]
    #[test_case(5, ".X.X. ..... .X.X", vec![0b01010, 0b00001, 0b00101])]
    #[test_case(6, "XXXXXX", vec![0b111110, 0b111110])]
    fn test_stuff_bits(w: usize, inp: &str, exp: Vec<u16>) {
        assert_eq!(stuff_bits(&stream(inp), w), exp);
    }

    #[test_case(true, 2, 29, ".X .XXX.. ...X XX.. ..X .XX. .XX.X")]
    #[test_case(true, 4, 64, "XX XXXXXX .X.. ...X ..XX .X.. XX..")]
    #[test_case(false, 21, 660, "X.X.. .X.X..X..XX .XXX ..X.. .XXX. .X... ..XXX")]
    #[test_case(false, 32, 4096, "XXXXX XXXXXXXXXXX X.X. ..... XXX.X ..X.. X.XXX")]
    fn test_mode_message(compact: bool, layers: u8, words: usize, exp: &str) {
        let size = if compact { AztecSize::Compact(layers) } else { AztecSize::Full(layers) };
        let bs = mode_message(size, words, false).unwrap();
        assert_eq!(pattern(&bs), exp.replace(' ', ""));
    }

    #[test]
    fn test_select_size_boundary() {
        // D/L then 15 digits is 65 bits and stuffs into 11 words
        let mut bs = BitStream::new(65);
        bs.push_bits(30u8, 5);
        "123456789012345".bytes().for_each(|b| bs.push_bits(b - b'0' + 2, 4));
        let (size, words) = select_size(&bs, ECLevel::P23, None, false).unwrap();
        assert_eq!(size, AztecSize::Compact(1));
        assert_eq!(words, vec![60, 26, 10, 51, 49, 13, 22, 17, 40, 43, 15]);
    }

    #[test]
    fn test_select_size_forced() {
        let mut bs = BitStream::new(69);
        bs.push_bits(30u8, 5);
        "1234567890123456".bytes().for_each(|b| bs.push_bits(b - b'0' + 2, 4));
        let forced = Some(AztecSize::Compact(1));
        assert_eq!(select_size(&bs, ECLevel::P23, forced, false), Err(SymbolError::DataTooLong));
        let (size, _) = select_size(&bs, ECLevel::P23, None, false).unwrap();
        assert_eq!(size, AztecSize::Compact(2));
        let forced = Some(AztecSize::Full(23));
        assert!(matches!(
            select_size(&bs, ECLevel::P23, forced, true),
            Err(SymbolError::ConflictingOptions(_))
        ));
    }

    #[test]
    fn test_message_bits() {
        let data = vec![60, 26, 10, 51, 49, 13, 22, 17, 40, 43, 15];
        let (bs, ecc) = message_bits(AztecSize::Compact(1), &data).unwrap();
        assert_eq!(bs.len(), 104);
        assert_eq!(ecc.len(), 6);
        // 2 pad bits then the first word
        assert_eq!(bs.read(0, 2), 0);
        assert_eq!(bs.read(2, 6), 60);
        assert_eq!(bs.read(2 + 11 * 6, 6), ecc[0]);
    }
}
