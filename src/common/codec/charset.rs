use encoding_rs::{Encoding, GBK, SHIFT_JIS};
use log::trace;

use crate::common::error::{SymbolError, SymbolResult};

/// Sentinel code standing for the FNC1 function character in code sequences
pub const FNC1: i32 = -1;

// Character set conversion
//------------------------------------------------------------------------------

/// Converts text to ISO-8859-1 codes, one per character
pub fn latin1(text: &str) -> SymbolResult<Vec<i32>> {
    text.chars()
        .map(|c| match c as u32 {
            v @ 0..=0xFF => Ok(v as i32),
            _ => Err(SymbolError::UnsupportedCharacters),
        })
        .collect()
}

/// Widens raw bytes to codes
pub fn bytes(data: &[u8]) -> Vec<i32> {
    data.iter().map(|&b| b as i32).collect()
}

/// Converts text to GB2312 codes. ASCII stays single byte, every other
/// character becomes one `(lead << 8) | trail` code.
pub fn gb2312(text: &str) -> SymbolResult<Vec<i32>> {
    let encoded = encode_strict(GBK, text)?;
    let mut res = Vec::with_capacity(text.len());
    let mut iter = encoded.iter().copied();
    while let Some(b) = iter.next() {
        if b < 0x80 {
            res.push(b as i32);
            continue;
        }
        let trail = iter.next().ok_or(SymbolError::UnsupportedCharacters)?;
        // GBK extension areas fall outside GB2312
        if !(0xA1..=0xF7).contains(&b) || !(0xA1..=0xFE).contains(&trail) {
            return Err(SymbolError::UnsupportedCharacters);
        }
        res.push(((b as i32) << 8) | trail as i32);
    }
    Ok(res)
}

/// Converts text to Shift JIS bytes
pub fn shift_jis(text: &str) -> SymbolResult<Vec<u8>> {
    encode_strict(SHIFT_JIS, text)
}

fn encode_strict(encoding: &'static Encoding, text: &str) -> SymbolResult<Vec<u8>> {
    let (encoded, _, had_errors) = encoding.encode(text);
    if had_errors {
        trace!("Text not representable in {}: {text:?}", encoding.name());
        return Err(SymbolError::UnsupportedCharacters);
    }
    Ok(encoded.into_owned())
}
