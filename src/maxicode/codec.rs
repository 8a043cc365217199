use log::trace;

use crate::common::error::{SymbolError, SymbolResult};

// Code set
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CodeSet {
    A,
    B,
    C,
    D,
    E,
}

static CODE_SETS: [CodeSet; 5] = [CodeSet::A, CodeSet::B, CodeSet::C, CodeSet::D, CodeSet::E];

// Latin-1 symbols scattered over the upper sets
static SET_C_LATIN: [u8; 11] = [0xAA, 0xAC, 0xB1, 0xB2, 0xB3, 0xB5, 0xB9, 0xBA, 0xBC, 0xBD, 0xBE];
static SET_D_LATIN: [u8; 10] = [0xA1, 0xA8, 0xAB, 0xAF, 0xB0, 0xB4, 0xB7, 0xB8, 0xBB, 0xBF];
static SET_E_LATIN: [u8; 11] = [0xA0, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA9, 0xAD, 0xAE, 0xB6];

pub const NUMERIC_SHIFT: u8 = 31;
pub const PAD: u8 = 33;
const TWO_SHIFT_A: u8 = 56;
const THREE_SHIFT_A: u8 = 57;
const LATCH_A_FROM_UPPER: u8 = 58;
const SHIFT_AB: u8 = 59;
const LATCH_AB: u8 = 63;

// Digits packed into one numeric shift
const COMPRESSED_DIGITS: usize = 9;

impl CodeSet {
    /// Character value of byte `b` in this set
    pub fn value(self, b: u8) -> Option<u8> {
        let pos = |table: &[u8], b: u8| table.iter().position(|&t| t == b).map(|p| p as u8);
        match self {
            Self::A => match b {
                13 => Some(0),
                b'A'..=b'Z' => Some(b - b'A' + 1),
                28..=30 | b' ' | b'"'..=b':' => Some(b),
                _ => None,
            },
            Self::B => match b {
                b'`' => Some(0),
                b'a'..=b'z' => Some(b - b'`'),
                28..=30 => Some(b),
                b'{' => Some(32),
                b'}' => Some(34),
                b'~' => Some(35),
                0x7F => Some(36),
                b';'..=b'?' => Some(b - b';' + 37),
                b'['..=b'_' => Some(b - b'[' + 42),
                b' ' => Some(47),
                b',' => Some(48),
                b'.' => Some(49),
                b'/' => Some(50),
                b':' => Some(51),
                b'@' => Some(52),
                b'!' => Some(53),
                b'|' => Some(54),
                _ => None,
            },
            Self::C => match b {
                0xC0..=0xDA => Some(b - 0xC0),
                0xDB..=0xDF => Some(b - 0xDB + 32),
                0x80..=0x89 => Some(b - 0x80 + 48),
                28..=30 => Some(b),
                b' ' => Some(59),
                _ => pos(&SET_C_LATIN, b).map(|p| p + 37),
            },
            Self::D => match b {
                0xE0..=0xFA => Some(b - 0xE0),
                0xFB..=0xFF => Some(b - 0xFB + 32),
                0x8A..=0x94 => Some(b - 0x8A + 47),
                28..=30 => Some(b),
                b' ' => Some(59),
                _ => pos(&SET_D_LATIN, b).map(|p| p + 37),
            },
            Self::E => match b {
                0..=26 => Some(b),
                0x1B => Some(28),
                0x1F => Some(29),
                28..=30 => Some(b + 4),
                0x95..=0x9F => Some(b - 0x95 + 46),
                b' ' => Some(59),
                _ => pos(&SET_E_LATIN, b).map(|p| p + 35),
            },
        }
    }

    fn is_upper(self) -> bool {
        matches!(self, Self::C | Self::D | Self::E)
    }

    // Shift into C, D or E. Repeated inside the set it locks in.
    fn shift_code(self) -> u8 {
        match self {
            Self::C => 60,
            Self::D => 61,
            _ => 62,
        }
    }
}

// Tokens
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Token {
    Char(CodeSet, u8),
    Digits(u32),
}

// Picks one set per byte. A byte valid in several sets stays in the set of
// its predecessor, else takes the set of the next unambiguous byte.
fn resolve_sets(data: &[u8]) -> SymbolResult<Vec<CodeSet>> {
    let cands = data
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            let c = CODE_SETS.iter().copied().filter(|s| s.value(b).is_some()).collect::<Vec<_>>();
            match c.is_empty() {
                true => Err(SymbolError::InvalidChar(i)),
                false => Ok(c),
            }
        })
        .collect::<SymbolResult<Vec<_>>>()?;

    let mut sets: Vec<CodeSet> = Vec::with_capacity(data.len());
    for (i, c) in cands.iter().enumerate() {
        let prev = sets.last().copied().filter(|p| c.contains(p));
        let next = || {
            cands[i + 1..].iter().find(|n| n.len() == 1).map(|n| n[0]).filter(|s| c.contains(s))
        };
        sets.push(prev.or_else(next).unwrap_or(c[0]));
    }
    Ok(sets)
}

fn tokenize(data: &[u8]) -> SymbolResult<Vec<Token>> {
    let sets = resolve_sets(data)?;
    let mut res = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let run = data[i..].iter().take(COMPRESSED_DIGITS).take_while(|b| b.is_ascii_digit()).count();
        if run == COMPRESSED_DIGITS {
            let value = data[i..i + run].iter().fold(0u32, |acc, &d| acc * 10 + (d - b'0') as u32);
            res.push(Token::Digits(value));
            i += run;
            continue;
        }
        let value = sets[i].value(data[i]).ok_or(SymbolError::Internal("Unresolved code set"))?;
        res.push(Token::Char(sets[i], value));
        i += 1;
    }
    Ok(res)
}

// Encoder
//------------------------------------------------------------------------------

/// Encodes bytes into 6 bit characters. Returns the characters and the code
/// set in effect at the end.
pub fn encode_text(data: &[u8]) -> SymbolResult<(Vec<u8>, CodeSet)> {
    let tokens = tokenize(data)?;
    let run_of = |i: usize, set: CodeSet| {
        tokens[i..].iter().take_while(|t| matches!(t, Token::Char(s, _) if *s == set)).count()
    };
    let value_at = |i: usize| match tokens[i] {
        Token::Char(_, v) => v,
        Token::Digits(_) => 0,
    };

    let mut out = Vec::with_capacity(tokens.len() * 2);
    let mut current = CodeSet::A;
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            Token::Digits(v) => {
                if current.is_upper() {
                    out.push(LATCH_A_FROM_UPPER);
                    current = CodeSet::A;
                }
                out.push(NUMERIC_SHIFT);
                out.extend((0..5).rev().map(|k| ((v >> (6 * k)) & 0x3F) as u8));
                i += 1;
            }
            Token::Char(set, v) if set == current => {
                out.push(v);
                i += 1;
            }
            Token::Char(CodeSet::A, _) if current == CodeSet::B => {
                let run = run_of(i, CodeSet::A);
                let shift = match run {
                    1 => SHIFT_AB,
                    2 => TWO_SHIFT_A,
                    3 => THREE_SHIFT_A,
                    _ => {
                        out.push(LATCH_AB);
                        current = CodeSet::A;
                        continue;
                    }
                };
                out.push(shift);
                out.extend((i..i + run).map(value_at));
                i += run;
            }
            Token::Char(CodeSet::A, _) => {
                out.push(LATCH_A_FROM_UPPER);
                current = CodeSet::A;
            }
            Token::Char(CodeSet::B, v) => {
                if current == CodeSet::A && run_of(i, CodeSet::B) == 1 {
                    out.push(SHIFT_AB);
                    out.push(v);
                    i += 1;
                } else {
                    out.push(LATCH_AB);
                    current = CodeSet::B;
                }
            }
            Token::Char(set, v) => {
                out.push(set.shift_code());
                if run_of(i, set) >= 4 {
                    out.push(set.shift_code());
                    current = set;
                } else {
                    out.push(v);
                    i += 1;
                }
            }
        }
    }
    trace!("MaxiCode text of {} bytes took {} characters", data.len(), out.len());
    Ok((out, current))
}

/// Fills the message up to `capacity` with pad characters, leaving the upper
/// sets first since they have no pad
pub fn pad_text(text: &mut Vec<u8>, end_set: CodeSet, capacity: usize) {
    if text.len() < capacity && end_set.is_upper() {
        text.push(LATCH_A_FROM_UPPER);
    }
    text.resize(capacity.max(text.len()), PAD);
}

// Structured primary message
//------------------------------------------------------------------------------

/// Postal code, ISO 3166 country and service class carried by modes 2 and 3
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Primary {
    pub postcode: String,
    pub country: u16,
    pub service: u16,
}

impl Primary {
    pub fn new(postcode: &str, country: u16, service: u16) -> Self {
        Self { postcode: postcode.to_owned(), country, service }
    }

    pub fn is_numeric(&self) -> bool {
        !self.postcode.is_empty() && self.postcode.bytes().all(|b| b.is_ascii_digit())
    }

    fn check_codes(&self) -> SymbolResult<()> {
        if self.country > 999 {
            return Err(SymbolError::InvalidPrimary(format!("country {}", self.country)));
        }
        if self.service > 999 {
            return Err(SymbolError::InvalidPrimary(format!("service {}", self.service)));
        }
        Ok(())
    }

    /// Mode 2: numeric postal code of up to 9 digits
    pub fn mode2_codewords(&self) -> SymbolResult<[u8; 10]> {
        self.check_codes()?;
        let len = self.postcode.len();
        if !self.is_numeric() || len > 9 {
            return Err(SymbolError::InvalidPrimary(format!("postcode {:?}", self.postcode)));
        }
        let num = self.postcode.bytes().fold(0u32, |acc, d| acc * 10 + (d - b'0') as u32);
        let (len, country, service) = (len as u32, self.country as u32, self.service as u32);

        let cw = [
            ((num & 0x03) << 4) | 2,
            (num & 0xFC) >> 2,
            (num & 0x3F00) >> 8,
            (num & 0xFC000) >> 14,
            (num & 0x3F00000) >> 20,
            ((num & 0x3C000000) >> 26) | ((len & 0x3) << 4),
            ((len & 0x3C) >> 2) | ((country & 0x3) << 4),
            (country & 0xFC) >> 2,
            ((country & 0x300) >> 8) | ((service & 0xF) << 2),
            (service & 0x3F0) >> 4,
        ];
        Ok(cw.map(|w| w as u8))
    }

    /// Mode 3: alphanumeric postal code of up to 6 code set A characters
    pub fn mode3_codewords(&self) -> SymbolResult<[u8; 10]> {
        self.check_codes()?;
        let upper = self.postcode.to_ascii_uppercase();
        if upper.is_empty() || upper.len() > 6 {
            return Err(SymbolError::InvalidPrimary(format!("postcode {:?}", self.postcode)));
        }
        let mut pc = [0u32; 6];
        for (i, b) in format!("{upper:<6}").bytes().enumerate() {
            let v = CodeSet::A
                .value(b)
                .filter(|_| b != 13 && !(28..=30).contains(&b))
                .ok_or_else(|| SymbolError::InvalidPrimary(format!("postcode {:?}", self.postcode)))?;
            pc[i] = v as u32;
        }
        let (country, service) = (self.country as u32, self.service as u32);

        let cw = [
            ((pc[5] & 0x03) << 4) | 3,
            ((pc[4] & 0x03) << 4) | ((pc[5] & 0x3C) >> 2),
            ((pc[3] & 0x03) << 4) | ((pc[4] & 0x3C) >> 2),
            ((pc[2] & 0x03) << 4) | ((pc[3] & 0x3C) >> 2),
            ((pc[1] & 0x03) << 4) | ((pc[2] & 0x3C) >> 2),
            ((pc[0] & 0x03) << 4) | ((pc[1] & 0x3C) >> 2),
            ((pc[0] & 0x3C) >> 2) | ((country & 0x3) << 4),
            (country & 0xFC) >> 2,
            ((country & 0x300) >> 8) | ((service & 0xF) << 2),
            (service & 0x3F0) >> 4,
        ];
        Ok(cw.map(|w| w as u8))
    }
}

#[cfg(test)]
mod codec_tests {

    use test_case::test_case;

    use super::{encode_text, pad_text, CodeSet, Primary, CODE_SETS, PAD};
    use crate::common::error::SymbolError;

    #[test]
    fn test_every_byte_has_a_set() {
        for b in 0..=255u8 {
            assert!(CODE_SETS.iter().any(|s| s.value(b).is_some()), "Byte {b:#04x}");
        }
    }

    #[test]
    fn test_set_values_unique() {
        for set in CODE_SETS {
            let mut seen = [false; 64];
            for b in 0..=255u8 {
                if let Some(v) = set.value(b) {
                    assert!(v < 64 && !seen[v as usize], "{set:?} value {v}");
                    seen[v as usize] = true;
                }
            }
        }
    }

    #[test_case(b"ABC", vec![1, 2, 3])]
    #[test_case(b"A b", vec![1, 32, 59, 2])]
    #[test_case(b"abc", vec![63, 1, 2, 3])]
    #[test_case(b"abcD1", vec![63, 1, 2, 3, 56, 4, 49])]
    #[test_case(b"abcdEFGHI", vec![63, 1, 2, 3, 4, 63, 5, 6, 7, 8, 9])]
    #[test_case(b"A\xe9B", vec![1, 61, 9, 2])]
    #[test_case(b"\xe0\xe1\xe2\xe3A", vec![61, 61, 0, 1, 2, 3, 58, 1])]
    fn test_encode_text(data: &[u8], exp: Vec<u8>) {
        assert_eq!(encode_text(data).unwrap().0, exp);
    }

    #[test]
    fn test_numeric_compression() {
        let (text, _) = encode_text(b"A1234567890").unwrap();
        // 123456789 = 0b000111_010110_111100_110100_010101
        assert_eq!(text, vec![1, 31, 7, 22, 60, 52, 21, 48]);
    }

    #[test]
    fn test_pad_after_upper_set() {
        let (mut text, end) = encode_text(b"\xe0\xe1\xe2\xe3").unwrap();
        assert_eq!(end, CodeSet::D);
        pad_text(&mut text, end, 10);
        assert_eq!(text, vec![61, 61, 0, 1, 2, 3, 58, PAD, PAD, PAD]);
    }

    #[test]
    fn test_mode2_primary() {
        let primary = Primary::new("551", 840, 1);
        assert_eq!(primary.mode2_codewords().unwrap(), [50, 9, 2, 0, 0, 48, 0, 18, 7, 0]);
    }

    #[test]
    fn test_mode3_primary() {
        let cw = Primary::new("b1050", 826, 1).mode3_codewords().unwrap();
        assert_eq!(cw[0] & 0x0F, 3);
        assert_eq!(cw[7..], [14, 7, 0]);
    }

    #[test_case("12A", 840, 1)]
    #[test_case("1234567890", 840, 1)]
    #[test_case("551", 1000, 1)]
    #[test_case("551", 840, 1000)]
    fn test_invalid_mode2_primary(postcode: &str, country: u16, service: u16) {
        let res = Primary::new(postcode, country, service).mode2_codewords();
        assert!(matches!(res, Err(SymbolError::InvalidPrimary(_))));
    }

    #[test]
    fn test_invalid_mode3_primary() {
        let res = Primary::new("AB~CD", 826, 1).mode3_codewords();
        assert!(matches!(res, Err(SymbolError::InvalidPrimary(_))));
        let res = Primary::new("ABCDEFG", 826, 1).mode3_codewords();
        assert!(matches!(res, Err(SymbolError::InvalidPrimary(_))));
    }
}
