use super::charset::FNC1;
use crate::common::error::{SymbolError, SymbolResult};

// GS1 element strings
//------------------------------------------------------------------------------

// AIs whose leading two digits imply a predefined length and so need no
// separator after their data
const PREDEFINED_LENGTH_PREFIXES: [u8; 21] =
    [0, 1, 2, 3, 4, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 23, 31, 32, 33, 34, 35];

/// Parses bracketed element strings such as `[01]09501101530003[10]AB1` into
/// codes. FNC1 separates a variable-length field from the next AI. The lead-in
/// FNC1 is left to the symbology.
pub fn parse_gs1(text: &str) -> SymbolResult<Vec<i32>> {
    if text.is_empty() {
        return Err(SymbolError::EmptyData);
    }

    let bytes = text.as_bytes();
    let mut res = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    let mut needs_separator = false;

    while pos < bytes.len() {
        if bytes[pos] != b'[' {
            return Err(SymbolError::InvalidGs1(format!("Expected '[' at position {pos}")));
        }
        let close = bytes[pos..]
            .iter()
            .position(|&b| b == b']')
            .map(|p| p + pos)
            .ok_or_else(|| SymbolError::InvalidGs1("Unclosed AI bracket".to_string()))?;

        let ai = &bytes[pos + 1..close];
        if !(2..=4).contains(&ai.len()) || !ai.iter().all(u8::is_ascii_digit) {
            return Err(SymbolError::InvalidGs1(format!("Invalid AI at position {pos}")));
        }

        let data_start = close + 1;
        let data_end =
            bytes[data_start..].iter().position(|&b| b == b'[').map_or(bytes.len(), |p| p + data_start);
        let data = &bytes[data_start..data_end];
        if data.is_empty() {
            return Err(SymbolError::InvalidGs1(format!("Empty data for AI at position {pos}")));
        }
        if let Some(b) = data.iter().find(|&&b| !(0x21..=0x7E).contains(&b) || b == b']') {
            return Err(SymbolError::InvalidGs1(format!("Invalid character {:#04x}", b)));
        }

        if needs_separator {
            res.push(FNC1);
        }
        res.extend(ai.iter().chain(data.iter()).map(|&b| b as i32));

        let prefix = (ai[0] - b'0') * 10 + (ai[1] - b'0');
        needs_separator = !PREDEFINED_LENGTH_PREFIXES.contains(&prefix);
        pos = data_end;
    }

    Ok(res)
}

#[cfg(test)]
mod gs1_tests {

    use test_case::test_case;

    use super::parse_gs1;
    use crate::common::{codec::charset::FNC1, error::SymbolError};

    fn codes(s: &str) -> Vec<i32> {
        s.bytes().map(|b| b as i32).collect()
    }

    #[test]
    fn test_fixed_then_variable() {
        let res = parse_gs1("[01]09501101530003[10]AB1").unwrap();
        assert_eq!(res, codes("010950110153000310AB1"));
    }

    #[test]
    fn test_variable_then_fixed() {
        let res = parse_gs1("[10]AB1[01]09501101530003").unwrap();
        let mut exp = codes("10AB1");
        exp.push(FNC1);
        exp.extend(codes("0109501101530003"));
        assert_eq!(res, exp);
    }

    #[test_case("01]123"; "missing open bracket")]
    #[test_case("[01123"; "unclosed bracket")]
    #[test_case("[1]123"; "short ai")]
    #[test_case("[0A]123"; "non numeric ai")]
    #[test_case("[01][10]1"; "empty data")]
    #[test_case("[10]A B"; "space in data")]
    fn test_invalid(inp: &str) {
        assert!(matches!(parse_gs1(inp), Err(SymbolError::InvalidGs1(_))));
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse_gs1(""), Err(SymbolError::EmptyData));
    }
}
