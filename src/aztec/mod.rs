mod codec;
mod layout;
mod placement;

pub use layout::{AztecSize, ECLevel};

use log::debug;

use crate::common::{
    codec::{bytes, parse_gs1},
    error::{SymbolError, SymbolResult},
    metadata::{EncodeInfo, Symbol, SymbolInfo, Symbology},
};
use layout::{message_bits, mode_message, select_size};
use placement::placement_map;

// Aztec builder
//------------------------------------------------------------------------------

pub struct AztecBuilder<'a> {
    data: &'a [u8],
    ec_level: ECLevel,
    size: Option<AztecSize>,
    gs1: bool,
    reader_init: bool,
}

impl<'a> AztecBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, ec_level: ECLevel::P23, size: None, gs1: false, reader_init: false }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    pub fn size(&mut self, size: AztecSize) -> &mut Self {
        self.size = Some(size);
        self
    }

    pub fn unset_size(&mut self) -> &mut Self {
        self.size = None;
        self
    }

    /// Data is read as bracketed GS1 element strings
    pub fn gs1(&mut self, gs1: bool) -> &mut Self {
        self.gs1 = gs1;
        self
    }

    pub fn reader_init(&mut self, reader_init: bool) -> &mut Self {
        self.reader_init = reader_init;
        self
    }

    pub fn metadata(&self) -> String {
        let size = self.size.map_or("None".to_owned(), |s| s.to_string());
        format!(
            "{{ Size: {size}, Ec level: {}, GS1: {}, Reader init: {} }}",
            self.ec_level, self.gs1, self.reader_init
        )
    }
}

impl AztecBuilder<'_> {
    pub fn build(&self) -> SymbolResult<Symbol> {
        debug!("Generating Aztec {}", self.metadata());

        if self.gs1 && self.reader_init {
            return Err(SymbolError::ConflictingOptions("GS1 and reader initialisation"));
        }

        let codes = if self.gs1 {
            let text = std::str::from_utf8(self.data)
                .map_err(|_| SymbolError::InvalidGs1("data is not text".to_owned()))?;
            parse_gs1(text)?
        } else {
            bytes(self.data)
        };

        debug!("Encoding {} characters", codes.len());
        let bits = codec::encode(&codes, self.gs1)?;
        let mut trace = EncodeInfo::new();
        trace.push(format!("Bit stream length {}", bits.len()));

        let (size, data_words) = select_size(&bits, self.ec_level, self.size, self.reader_init)?;
        debug!("Selected {size} with {} data words", data_words.len());
        trace.push(format!("Size {size}, {} bit words", size.word_size()));
        trace.push_codewords("Data codewords", &data_words);

        let (payload, ecc) = message_bits(size, &data_words)?;
        trace.push_codewords("EC codewords", &ecc);
        let descriptor = mode_message(size, data_words.len(), self.reader_init)?;

        let map = placement_map(size);
        map.check_coverage(payload.len(), descriptor.len())?;
        let grid = map.place(&payload, &descriptor)?;

        let info = SymbolInfo {
            symbology: Symbology::Aztec,
            size: size.to_string(),
            ec_level: self.ec_level.to_string(),
            data_codewords: data_words.len(),
            ec_codewords: ecc.len(),
            codeword_bits: size.word_size(),
            trace,
        };
        Ok(Symbol::new(grid, info))
    }
}

#[cfg(test)]
mod aztec_tests {

    use proptest::prelude::*;
    use test_case::test_case;

    use super::{AztecBuilder, AztecSize, ECLevel};
    use crate::common::error::SymbolError;

    #[test_case("123456789012345", "Compact 1", 15)]
    #[test_case("1234567890123456", "Compact 2", 19)]
    #[test_case("Hello, World!", "Compact 2", 19)]
    fn test_size_selection(data: &str, size: &str, width: usize) {
        let symbol = AztecBuilder::new(data.as_bytes()).build().unwrap();
        assert_eq!(symbol.info().size, size);
        assert_eq!(symbol.width(), width);
    }

    #[test]
    fn test_codeword_totals() {
        let symbol = AztecBuilder::new(b"AZTEC CODE").build().unwrap();
        let info = symbol.info();
        let size = match info.size.as_str() {
            "Compact 1" => AztecSize::Compact(1),
            "Compact 2" => AztecSize::Compact(2),
            s => panic!("Unexpected size {s}"),
        };
        assert_eq!(info.total_codewords(), size.total_words());
        assert_eq!(info.codeword_bits, 6);
    }

    #[test]
    fn test_forced_size_matches_auto() {
        let data = b"Forced and automatic sizes agree";
        let auto = AztecBuilder::new(data).build().unwrap();
        let size = match auto.width() {
            15 => AztecSize::Compact(1),
            19 => AztecSize::Compact(2),
            23 => AztecSize::Compact(3),
            27 => AztecSize::Compact(4),
            w => panic!("Unexpected width {w}"),
        };
        let forced = AztecBuilder::new(data).size(size).build().unwrap();
        assert_eq!(auto, forced);
    }

    #[test]
    fn test_forced_size_too_small() {
        let res = AztecBuilder::new(&[b'A'; 200]).size(AztecSize::Compact(1)).build();
        assert_eq!(res, Err(SymbolError::DataTooLong));
    }

    #[test]
    fn test_gs1_reader_init_conflict() {
        let res = AztecBuilder::new(b"[01]12345678901231").gs1(true).reader_init(true).build();
        assert!(matches!(res, Err(SymbolError::ConflictingOptions(_))));
    }

    #[test]
    fn test_gs1() {
        let symbol = AztecBuilder::new(b"[01]12345678901231[10]ABC").gs1(true).build().unwrap();
        assert!(symbol.info().data_codewords > 0);
        let res = AztecBuilder::new(b"01]123").gs1(true).build();
        assert!(matches!(res, Err(SymbolError::InvalidGs1(_))));
    }

    #[test]
    fn test_reader_init() {
        let symbol = AztecBuilder::new(b"INIT").reader_init(true).build().unwrap();
        assert_eq!(symbol.info().size, "Compact 1");
        let res = AztecBuilder::new(b"INIT").reader_init(true).size(AztecSize::Compact(2)).build();
        assert!(matches!(res, Err(SymbolError::ConflictingOptions(_))));
    }

    #[test]
    fn test_empty() {
        assert_eq!(AztecBuilder::new(b"").build(), Err(SymbolError::EmptyData));
    }

    #[test]
    fn test_metadata() {
        let mut builder = AztecBuilder::new(b"A");
        builder.size(AztecSize::Full(3)).ec_level(ECLevel::P50);
        assert_eq!(
            builder.metadata(),
            "{ Size: Full 3, Ec level: 50%, GS1: false, Reader init: false }"
        );
    }

    fn stuffed_words(trace: &[String]) -> Vec<u32> {
        let line = trace.iter().find_map(|l| l.strip_prefix("Data codewords: ")).unwrap();
        line.split(' ').map(|w| w.parse().unwrap()).collect()
    }

    fn layers_rank(size: &str) -> usize {
        let (kind, layers) = size.split_once(' ').unwrap();
        let layers: usize = layers.parse().unwrap();
        // Full 4 onwards are larger than every compact symbol
        if kind == "Compact" { layers } else { layers + 4 }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn proptest_ec_level_monotonic(data in proptest::collection::vec(any::<u8>(), 1..120)) {
            let mut prev = 0;
            for ecl in [ECLevel::P10, ECLevel::P23, ECLevel::P36, ECLevel::P50] {
                let symbol = AztecBuilder::new(&data).ec_level(ecl).build().unwrap();
                let rank = layers_rank(&symbol.info().size);
                prop_assert!(rank >= prev);
                prev = rank;
            }
        }

        #[test]
        fn proptest_stuffed_words_never_uniform(
            data in proptest::collection::vec(prop_oneof![Just(0u8), Just(0xFF), any::<u8>()], 1..150),
            ecl in prop_oneof![Just(ECLevel::P10), Just(ECLevel::P23), Just(ECLevel::P50)],
        ) {
            let symbol = AztecBuilder::new(&data).ec_level(ecl).build().unwrap();
            let info = symbol.info();
            let w = info.codeword_bits;
            let words = stuffed_words(info.trace.lines());
            prop_assert_eq!(words.len(), info.data_codewords);
            prop_assert!(words.iter().all(|&word| word != 0 && word != (1 << w) - 1));
        }
    }
}
