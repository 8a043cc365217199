mod codec;
mod placement;

pub use codec::Primary;

use std::fmt::{Display, Formatter};

use log::debug;

use crate::common::{
    bit_utils::BitStream,
    ec::{interleave, GaloisField, ReedSolomon},
    error::{SymbolError, SymbolResult},
    metadata::{EncodeInfo, Symbol, SymbolInfo, Symbology},
};
use codec::{encode_text, pad_text};
use placement::{placement_map, TOTAL_BITS};

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    StructuredNumeric = 2,
    StructuredAlphanumeric = 3,
    Standard = 4,
    EnhancedEc = 5,
    ReaderProgramming = 6,
}

impl Mode {
    pub fn new(mode: u8) -> SymbolResult<Self> {
        match mode {
            2 => Ok(Self::StructuredNumeric),
            3 => Ok(Self::StructuredAlphanumeric),
            4 => Ok(Self::Standard),
            5 => Ok(Self::EnhancedEc),
            6 => Ok(Self::ReaderProgramming),
            _ => Err(SymbolError::InvalidMode),
        }
    }

    pub fn is_structured(self) -> bool {
        matches!(self, Self::StructuredNumeric | Self::StructuredAlphanumeric)
    }

    // Secondary message data and error correction codewords
    fn secondary_layout(self) -> (usize, usize) {
        match self {
            Self::EnhancedEc => (68, 56),
            _ => (84, 40),
        }
    }

    // Characters of the text message the symbol holds
    fn text_capacity(self) -> usize {
        let (data, _) = self.secondary_layout();
        if self.is_structured() {
            data
        } else {
            data + PRIMARY_TEXT
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mode {}", *self as u8)
    }
}

// MaxiCode builder
//------------------------------------------------------------------------------

pub struct MaxiCodeBuilder<'a> {
    data: &'a [u8],
    mode: Option<Mode>,
    primary: Option<Primary>,
}

impl<'a> MaxiCodeBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, mode: None, primary: None }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    pub fn unset_mode(&mut self) -> &mut Self {
        self.mode = None;
        self
    }

    pub fn primary(&mut self, primary: Primary) -> &mut Self {
        self.primary = Some(primary);
        self
    }

    pub fn metadata(&self) -> String {
        let mode = self.mode.map_or("None".to_owned(), |m| m.to_string());
        match &self.primary {
            Some(p) => format!(
                "{{ {mode}, Postcode: {}, Country: {}, Service: {} }}",
                p.postcode, p.country, p.service
            ),
            None => format!("{{ {mode} }}"),
        }
    }

    // A primary message implies mode 2 or 3 depending on the postcode
    fn resolve_mode(&self) -> SymbolResult<Mode> {
        let mode = match (self.mode, &self.primary) {
            (Some(m), _) => m,
            (None, Some(p)) if p.is_numeric() => Mode::StructuredNumeric,
            (None, Some(_)) => Mode::StructuredAlphanumeric,
            (None, None) => Mode::Standard,
        };
        match (mode.is_structured(), self.primary.is_some()) {
            (true, false) => Err(SymbolError::InvalidPrimary("missing primary message".to_owned())),
            (false, true) => Err(SymbolError::ConflictingOptions("primary message outside modes 2 and 3")),
            _ => Ok(mode),
        }
    }

    pub fn build(&self) -> SymbolResult<Symbol> {
        debug!("Generating MaxiCode {}", self.metadata());

        let mode = self.resolve_mode()?;
        let mut trace = EncodeInfo::new();
        trace.push(mode.to_string());

        let words = self.codewords(mode, &mut trace)?;
        let mut payload = BitStream::new(TOTAL_BITS);
        words.iter().for_each(|&w| payload.push_bits(w, 6));

        let map = placement_map();
        let descriptor = BitStream::new(0);
        map.check_coverage(payload.len(), descriptor.len())?;
        let grid = map.place(&payload, &descriptor)?;

        let (data_len, ec_len) = mode.secondary_layout();
        let info = SymbolInfo {
            symbology: Symbology::MaxiCode,
            size: mode.to_string(),
            ec_level: (if mode == Mode::EnhancedEc { "EEC" } else { "SEC" }).to_owned(),
            data_codewords: PRIMARY_DATA + data_len,
            ec_codewords: PRIMARY_EC + ec_len,
            codeword_bits: 6,
            trace,
        };
        Ok(Symbol::new(grid, info))
    }

    // Primary data and EC, secondary data, then secondary EC interleaved
    // from its even and odd halves
    fn codewords(&self, mode: Mode, trace: &mut EncodeInfo) -> SymbolResult<Vec<u16>> {
        if self.data.is_empty() && !mode.is_structured() {
            return Err(SymbolError::EmptyData);
        }

        let (mut text, end_set) = encode_text(self.data)?;
        let capacity = mode.text_capacity();
        debug!("MaxiCode text: {} of {capacity} characters", text.len());
        if text.len() > capacity {
            return Err(SymbolError::DataTooLong);
        }
        pad_text(&mut text, end_set, capacity);

        let (primary, secondary) = match (mode, &self.primary) {
            (Mode::StructuredNumeric, Some(p)) => (p.mode2_codewords()?.to_vec(), text),
            (Mode::StructuredAlphanumeric, Some(p)) => (p.mode3_codewords()?.to_vec(), text),
            _ => {
                let mut primary = vec![mode as u8];
                primary.extend_from_slice(&text[..PRIMARY_TEXT]);
                (primary, text[PRIMARY_TEXT..].to_vec())
            }
        };
        let primary = primary.into_iter().map(u16::from).collect::<Vec<_>>();
        let secondary = secondary.into_iter().map(u16::from).collect::<Vec<_>>();
        trace.push_codewords("Primary codewords", &primary);

        let gf = GaloisField::new(GF_POLY)?;
        let primary_ecc = ReedSolomon::new(&gf, PRIMARY_EC, 1)?.encode(&primary)?;

        let (_, ec_len) = mode.secondary_layout();
        let rs = ReedSolomon::new(&gf, ec_len / 2, 1)?;
        let even = secondary.iter().step_by(2).copied().collect::<Vec<_>>();
        let odd = secondary.iter().skip(1).step_by(2).copied().collect::<Vec<_>>();
        let secondary_ecc = interleave(&[rs.encode(&even)?, rs.encode(&odd)?]);
        trace.push_codewords("Secondary codewords", &secondary);

        let mut words = Vec::with_capacity(TOTAL_BITS / 6);
        words.extend(primary);
        words.extend(primary_ecc);
        words.extend(secondary);
        words.extend(secondary_ecc);
        Ok(words)
    }
}

// Global constants
//------------------------------------------------------------------------------

const GF_POLY: u16 = 0x43;

const PRIMARY_DATA: usize = 10;

const PRIMARY_EC: usize = 10;

// Text characters carried in the primary message of modes 4 to 6
const PRIMARY_TEXT: usize = 9;

#[cfg(test)]
mod maxicode_tests {

    use test_case::test_case;

    use super::{MaxiCodeBuilder, Mode, Primary};
    use crate::common::{
        ec::{GaloisField, ReedSolomon},
        error::SymbolError,
        metadata::EncodeInfo,
    };

    #[test]
    fn test_mode2_codewords() {
        let mut builder = MaxiCodeBuilder::new(b"Hello");
        builder.primary(Primary::new("551", 840, 1));
        let words = builder.codewords(Mode::StructuredNumeric, &mut EncodeInfo::new()).unwrap();
        assert_eq!(words.len(), 144);
        assert_eq!(words[..10], [50, 9, 2, 0, 0, 48, 0, 18, 7, 0]);

        let gf = GaloisField::new(0x43).unwrap();
        let even = words[20..104].iter().step_by(2).copied().collect::<Vec<_>>();
        let ecc = ReedSolomon::new(&gf, 20, 1).unwrap().encode(&even).unwrap();
        let placed = words[104..].iter().step_by(2).copied().collect::<Vec<_>>();
        assert_eq!(placed, ecc);
    }

    #[test]
    fn test_mode4_primary_carries_text() {
        let builder = MaxiCodeBuilder::new(b"ABCDEFGHIJK");
        let words = builder.codewords(Mode::Standard, &mut EncodeInfo::new()).unwrap();
        assert_eq!(words[..10], [4, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(words[20..23], [10, 11, 33]);
    }

    #[test_case(None, Some(Primary::new("551", 840, 1)), "Mode 2")]
    #[test_case(None, Some(Primary::new("B1050", 826, 1)), "Mode 3")]
    #[test_case(None, None, "Mode 4")]
    #[test_case(Some(Mode::EnhancedEc), None, "Mode 5")]
    fn test_mode_selection(mode: Option<Mode>, primary: Option<Primary>, exp: &str) {
        let mut builder = MaxiCodeBuilder::new(b"MaxiCode");
        if let Some(m) = mode {
            builder.mode(m);
        }
        if let Some(p) = primary {
            builder.primary(p);
        }
        let symbol = builder.build().unwrap();
        assert_eq!(symbol.info().size, exp);
        assert_eq!((symbol.width(), symbol.height()), (30, 33));
        assert_eq!(symbol.info().total_codewords(), 144);
    }

    #[test_case(Mode::Standard, 93)]
    #[test_case(Mode::EnhancedEc, 77)]
    fn test_capacity(mode: Mode, capacity: usize) {
        let data = vec![b'A'; capacity];
        assert!(MaxiCodeBuilder::new(&data).mode(mode).build().is_ok());
        let data = vec![b'A'; capacity + 1];
        let res = MaxiCodeBuilder::new(&data).mode(mode).build();
        assert_eq!(res, Err(SymbolError::DataTooLong));
    }

    #[test]
    fn test_option_conflicts() {
        let res = MaxiCodeBuilder::new(b"A").mode(Mode::StructuredNumeric).build();
        assert!(matches!(res, Err(SymbolError::InvalidPrimary(_))));
        let res = MaxiCodeBuilder::new(b"A")
            .mode(Mode::Standard)
            .primary(Primary::new("551", 840, 1))
            .build();
        assert!(matches!(res, Err(SymbolError::ConflictingOptions(_))));
        assert_eq!(Mode::new(7), Err(SymbolError::InvalidMode));
        assert_eq!(MaxiCodeBuilder::new(b"").build(), Err(SymbolError::EmptyData));
    }

    #[test]
    fn test_metadata() {
        let mut builder = MaxiCodeBuilder::new(b"A");
        assert_eq!(builder.metadata(), "{ None }");
        builder.mode(Mode::StructuredNumeric).primary(Primary::new("551", 840, 1));
        assert_eq!(builder.metadata(), "{ Mode 2, Postcode: 551, Country: 840, Service: 1 }");
    }
}
