use log::{debug, trace};

use super::version::{ECLevel, Version, PADDING_CODEWORDS};
use crate::common::{
    bit_utils::BitStream,
    error::{SymbolError, SymbolResult},
};

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Numeric = 0,
    Alphanumeric = 1,
    Byte = 2,
    Kanji = 3,
}

pub static MODES: [Mode; 4] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte, Mode::Kanji];

impl Mode {
    /// Number of input bytes one character of this mode consumes at `pos`,
    /// or `None` if the byte(s) at `pos` cannot be encoded in this mode
    pub fn char_len(self, data: &[u8], pos: usize) -> Option<usize> {
        let b = data[pos];
        match self {
            Self::Numeric if b.is_ascii_digit() => Some(1),
            Self::Alphanumeric if alphanumeric_digit(b).is_some() => Some(1),
            Self::Byte => Some(1),
            Self::Kanji if pos + 1 < data.len() && is_kanji(b, data[pos + 1]) => Some(2),
            _ => None,
        }
    }

    // Encoded size of one character scaled by 6 so that numeric and
    // alphanumeric fractions stay integral
    fn scaled_char_bits(self) -> usize {
        match self {
            Self::Numeric => 20,
            Self::Alphanumeric => 33,
            Self::Byte => 48,
            Self::Kanji => 78,
        }
    }

    pub fn encoded_len(self, len: usize) -> usize {
        match self {
            Self::Numeric => (len * 10).div_ceil(3),
            Self::Alphanumeric => (len * 11).div_ceil(2),
            Self::Byte => len * 8,
            Self::Kanji => (len / 2) * 13,
        }
    }

    // Character count as carried in the count indicator
    fn char_count(self, len: usize) -> usize {
        match self {
            Self::Kanji => len / 2,
            _ => len,
        }
    }
}

fn alphanumeric_digit(b: u8) -> Option<u16> {
    let d = match b {
        b'0'..=b'9' => b - b'0',
        b'A'..=b'Z' => b - b'A' + 10,
        b' ' => 36,
        b'$' => 37,
        b'%' => 38,
        b'*' => 39,
        b'+' => 40,
        b'-' => 41,
        b'.' => 42,
        b'/' => 43,
        b':' => 44,
        _ => return None,
    };
    Some(d as u16)
}

fn is_kanji(b1: u8, b2: u8) -> bool {
    let sjw = ((b1 as u16) << 8) | b2 as u16;
    let in_range = matches!(sjw, 0x8140..=0x9FFC | 0xE040..=0xEBBF);
    in_range && (0x40..=0xFC).contains(&b2) && b2 != 0x7F
}

fn kanji_value(b1: u8, b2: u8) -> u16 {
    let sjw = ((b1 as u16) << 8) | b2 as u16;
    let v = if sjw <= 0x9FFC { sjw - 0x8140 } else { sjw - 0xC140 };
    (v >> 8) * 0xC0 + (v & 0xFF)
}

// Segment
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Segment<'a> {
    pub mode: Mode,
    pub data: &'a [u8],
}

impl<'a> Segment<'a> {
    pub fn new(mode: Mode, data: &'a [u8]) -> Self {
        Self { mode, data }
    }

    pub fn bit_len(&self, ver: Version) -> usize {
        let len_bits = ver.char_cnt_bits(self.mode).unwrap_or(0);
        ver.mode_bits() + len_bits + self.mode.encoded_len(self.data.len())
    }
}

// Encoder
//------------------------------------------------------------------------------

/// Encodes data into the padded data bit stream of the smallest fitting
/// version, or of `version` when one is given
pub fn encode(
    data: &[u8],
    version: Option<Version>,
    ecl: ECLevel,
) -> SymbolResult<(BitStream, Version)> {
    if data.is_empty() {
        return Err(SymbolError::EmptyData);
    }

    let (ver, segs) = match version {
        Some(ver) => {
            let cap = ver.data_bit_capacity(ecl)?;
            let segs = compute_optimal_segments(data, ver)?;
            let sz: usize = segs.iter().map(|s| s.bit_len(ver)).sum();
            if sz > cap {
                return Err(SymbolError::DataTooLong);
            }
            (ver, segs)
        }
        None => find_optimal_version_and_segments(data, ecl)?,
    };

    let cap = ver.data_bit_capacity(ecl)?;
    let mut bs = BitStream::new(cap);
    for seg in segs {
        trace!("Segment {:?} of {} bytes", seg.mode, seg.data.len());
        push_segment(seg, ver, &mut bs);
    }
    push_terminator(ver, &mut bs);
    pad_remaining_capacity(&mut bs);

    debug!("Micro QR data stream: {} bits in {ver}-{ecl}", bs.len());
    Ok((bs, ver))
}

fn find_optimal_version_and_segments(
    data: &[u8],
    ecl: ECLevel,
) -> SymbolResult<(Version, Vec<Segment>)> {
    for ver in Version::ALL {
        if !ver.supports_ec_level(ecl) {
            continue;
        }
        let Ok(segs) = compute_optimal_segments(data, ver) else {
            continue;
        };
        let sz: usize = segs.iter().map(|s| s.bit_len(ver)).sum();
        if sz <= ver.data_bit_capacity(ecl)? {
            return Ok((ver, segs));
        }
    }
    Err(SymbolError::DataTooLong)
}

// Dynamic programming over prefix lengths. Cost of a prefix is its bit size
// scaled by 6 with the segment still open.
pub(super) fn compute_optimal_segments(data: &[u8], ver: Version) -> SymbolResult<Vec<Segment>> {
    debug_assert!(!data.is_empty(), "Empty data");

    let len = data.len();
    let header = |m: Mode| (ver.mode_bits() + ver.char_cnt_bits(m).unwrap_or(0)) * 6;

    let mut cost = vec![[usize::MAX; 4]; len + 1];
    // Mode index the path came from, or None at the start of data
    let mut min_path = vec![[None; 4]; len + 1];

    for i in 0..len {
        if i > 0 && cost[i].iter().all(|&c| c == usize::MAX) {
            continue;
        }
        for (j, &to_mode) in MODES.iter().enumerate() {
            if !ver.supports(to_mode) {
                continue;
            }
            let Some(step) = to_mode.char_len(data, i) else {
                continue;
            };
            let ni = i + step;
            let char_bits = to_mode.scaled_char_bits();

            if i == 0 {
                let c = header(to_mode) + char_bits;
                if c < cost[ni][j] {
                    cost[ni][j] = c;
                    min_path[ni][j] = None;
                }
                continue;
            }

            let row = cost[i];
            for (k, &prev) in row.iter().enumerate() {
                if prev == usize::MAX {
                    continue;
                }
                let mut c = if k == j { prev } else { prev.div_ceil(6) * 6 + header(to_mode) };
                c += char_bits;
                if c < cost[ni][j] {
                    cost[ni][j] = c;
                    min_path[ni][j] = Some(k);
                }
            }
        }
    }

    let Some(last) = (0..4).filter(|&j| cost[len][j] != usize::MAX).min_by_key(|&j| cost[len][j])
    else {
        let pos = (0..len)
            .find(|&i| !MODES.iter().any(|&m| ver.supports(m) && m.char_len(data, i).is_some()))
            .unwrap_or(0);
        return Err(SymbolError::InvalidChar(pos));
    };

    let char_modes = trace_optimal_modes(&min_path, last, len);
    Ok(build_segments(ver, char_modes, data))
}

// Backtrack min_path and identify the mode of every character start
fn trace_optimal_modes(min_path: &[[Option<usize>; 4]], last: usize, len: usize) -> Vec<(usize, Mode)> {
    let mut res = Vec::with_capacity(len);
    let mut pos = len;
    let mut mode_index = Some(last);
    while let Some(mi) = mode_index {
        if pos == 0 {
            break;
        }
        let mode = MODES[mi];
        let step = if mode == Mode::Kanji { 2 } else { 1 };
        pos -= step;
        res.push((pos, mode));
        mode_index = min_path[pos + step][mi];
    }
    res.reverse();
    res
}

// Merge per-character modes into segments, splitting runs the count
// indicator cannot express
fn build_segments(ver: Version, char_modes: Vec<(usize, Mode)>, data: &[u8]) -> Vec<Segment> {
    let mut segs: Vec<Segment> = vec![];
    let mut iter = char_modes.into_iter().peekable();
    while let Some((start, mode)) = iter.next() {
        let max_chars = (1usize << ver.char_cnt_bits(mode).unwrap_or(0)) - 1;
        let mut chars = 1;
        let mut end = data.len();
        while let Some(&(next, m)) = iter.peek() {
            if m != mode || chars == max_chars {
                end = next;
                break;
            }
            chars += 1;
            iter.next();
        }
        segs.push(Segment::new(mode, &data[start..end]));
    }
    segs
}

// Writer for encoded data
//------------------------------------------------------------------------------

fn push_segment(seg: Segment, ver: Version, out: &mut BitStream) {
    push_header(&seg, ver, out);
    match seg.mode {
        Mode::Numeric => push_numeric_data(seg.data, out),
        Mode::Alphanumeric => push_alphanumeric_data(seg.data, out),
        Mode::Byte => push_byte_data(seg.data, out),
        Mode::Kanji => push_kanji_data(seg.data, out),
    }
}

fn push_header(seg: &Segment, ver: Version, out: &mut BitStream) {
    out.push_bits(seg.mode as u8, ver.mode_bits());
    let len_bits = ver.char_cnt_bits(seg.mode).unwrap_or(0);
    let char_cnt = seg.mode.char_count(seg.data.len());
    debug_assert!(
        char_cnt < (1 << len_bits),
        "Char count exceeds bit length: Char count {char_cnt}, Char count bits {len_bits}"
    );
    out.push_bits(char_cnt as u16, len_bits);
}

fn push_numeric_data(data: &[u8], out: &mut BitStream) {
    for chunk in data.chunks(3) {
        let len = (chunk.len() * 10).div_ceil(3);
        let val = chunk.iter().fold(0u16, |n, b| n * 10 + (b - b'0') as u16);
        out.push_bits(val, len);
    }
}

fn push_alphanumeric_data(data: &[u8], out: &mut BitStream) {
    for chunk in data.chunks(2) {
        let len = (chunk.len() * 11).div_ceil(2);
        let val = chunk.iter().fold(0u16, |n, &b| n * 45 + alphanumeric_digit(b).unwrap_or(0));
        out.push_bits(val, len);
    }
}

fn push_byte_data(data: &[u8], out: &mut BitStream) {
    for &b in data {
        out.push_bits(b, 8);
    }
}

fn push_kanji_data(data: &[u8], out: &mut BitStream) {
    for pair in data.chunks_exact(2) {
        out.push_bits(kanji_value(pair[0], pair[1]), 13);
    }
}

// Terminator is truncated when the remaining capacity is shorter
fn push_terminator(ver: Version, out: &mut BitStream) {
    let term_len = std::cmp::min(ver.terminator_bits(), out.remaining());
    out.push_bits(0, term_len);
}

fn pad_remaining_capacity(out: &mut BitStream) {
    let offset = out.len() & 7;
    if offset > 0 {
        let padding_bits_len = std::cmp::min(8 - offset, out.remaining());
        out.push_bits(0, padding_bits_len);
    }

    let remain_byte_capacity = out.remaining() >> 3;
    PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity).for_each(|pc| {
        out.push_bits(pc, 8);
    });

    // Final 4-bit codeword of M1 and M3
    let rem = out.remaining();
    out.push_bits(0, rem);
}

/// Splits the data stream into codewords for error correction. The 4-bit
/// final codeword of M1 and M3 occupies the high nibble.
pub fn data_codewords(bs: &BitStream) -> Vec<u16> {
    let len = bs.len();
    let mut res = (0..len / 8).map(|i| bs.read(i * 8, 8)).collect::<Vec<_>>();
    if len % 8 != 0 {
        res.push(bs.read(len - 4, 4) << 4);
    }
    res
}
