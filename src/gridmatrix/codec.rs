use log::{debug, trace};

use crate::common::{
    bit_utils::BitStream,
    error::{SymbolError, SymbolResult},
};

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Chinese = 0,
    Numeric = 1,
    Lower = 2,
    Upper = 3,
    Mixed = 4,
    Byte = 5,
}

pub static MODES: [Mode; 6] =
    [Mode::Chinese, Mode::Numeric, Mode::Lower, Mode::Upper, Mode::Mixed, Mode::Byte];

// Switch codes as (value, width) indexed by (from, to)
static SWITCH: [[(u16, usize); 6]; 6] = [
    [(0, 0), (8161, 13), (8162, 13), (8163, 13), (8164, 13), (8165, 13)],
    [(1019, 10), (0, 0), (1020, 10), (1021, 10), (1022, 10), (1023, 10)],
    [(28, 5), (29, 5), (0, 0), (30, 5), (124, 7), (126, 7)],
    [(28, 5), (29, 5), (30, 5), (0, 0), (124, 7), (126, 7)],
    [(1009, 10), (1010, 10), (1011, 10), (1012, 10), (0, 0), (1015, 10)],
    [(1, 4), (2, 4), (3, 4), (4, 4), (5, 4), (6, 4)],
];

// End of data code per mode
static END: [(u16, usize); 6] = [(8160, 13), (1018, 10), (27, 5), (27, 5), (1008, 10), (0, 4)];

// Punctuation reachable through the shift code, following the 32 control
// characters
static SHIFT_SET: &[u8; 32] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

const LETTER_SHIFT: (u16, usize) = (125, 7);
const MIXED_SHIFT: (u16, usize) = (1014, 10);

// Chinese glyphs past the GB2312 range
const CHINESE_CRLF: u16 = 7776;
const CHINESE_BYTE: u16 = 7777;
const CHINESE_DIGITS: u16 = 8033;

pub const MAX_BYTE_RUN: usize = 512;

impl Mode {
    fn index(self) -> usize {
        self as usize
    }

    // Written at the start of data
    fn indicator(self) -> u16 {
        self as u16 + 1
    }

    /// Number of codes one character of this mode consumes at `pos`, or
    /// `None` if the code at `pos` cannot be encoded in this mode
    pub fn char_len(self, codes: &[i32], pos: usize) -> Option<usize> {
        let c = codes[pos];
        match self {
            Self::Chinese if chinese_pair(codes, pos).is_some() => Some(2),
            Self::Chinese if chinese_glyph(c).is_some() => Some(1),
            Self::Numeric if is_digit(c) => Some(1),
            Self::Lower if lower_value(c).is_some() || shift_value(c).is_some() => Some(1),
            Self::Upper if upper_value(c).is_some() || shift_value(c).is_some() => Some(1),
            Self::Mixed if mixed_value(c).is_some() || shift_value(c).is_some() => Some(1),
            Self::Byte if (0..=0xFFFF).contains(&c) => Some(1),
            _ => None,
        }
    }

    // Encoded size of the character at `pos` scaled by 3 so numeric digits
    // stay integral
    fn scaled_char_bits(self, codes: &[i32], pos: usize) -> usize {
        let c = codes[pos];
        let bits = match self {
            Self::Chinese => 13,
            Self::Numeric => return 10,
            Self::Lower if lower_value(c).is_some() => 5,
            Self::Upper if upper_value(c).is_some() => 5,
            Self::Lower | Self::Upper => LETTER_SHIFT.1 + 6,
            Self::Mixed if mixed_value(c).is_some() => 6,
            Self::Mixed => MIXED_SHIFT.1 + 6,
            Self::Byte if c > 0xFF => 16,
            Self::Byte => 8,
        };
        bits * 3
    }

    // Bits written after the switch code when the mode is entered
    fn header_bits(self) -> usize {
        match self {
            Self::Numeric => 2,
            Self::Byte => 9,
            _ => 0,
        }
    }
}

fn switch(from: Option<Mode>, to: Mode) -> (u16, usize) {
    match from {
        None => (to.indicator(), 4),
        Some(f) => SWITCH[f.index()][to.index()],
    }
}

fn is_digit(c: i32) -> bool {
    (0x30..=0x39).contains(&c)
}

fn lower_value(c: i32) -> Option<u16> {
    match u8::try_from(c).ok()? {
        b @ b'a'..=b'z' => Some((b - b'a') as u16),
        b' ' => Some(26),
        _ => None,
    }
}

fn upper_value(c: i32) -> Option<u16> {
    match u8::try_from(c).ok()? {
        b @ b'A'..=b'Z' => Some((b - b'A') as u16),
        b' ' => Some(26),
        _ => None,
    }
}

fn mixed_value(c: i32) -> Option<u16> {
    match u8::try_from(c).ok()? {
        b @ b'0'..=b'9' => Some((b - b'0') as u16),
        b @ b'A'..=b'Z' => Some((b - b'A') as u16 + 10),
        b @ b'a'..=b'z' => Some((b - b'a') as u16 + 36),
        b' ' => Some(62),
        _ => None,
    }
}

fn shift_value(c: i32) -> Option<u16> {
    let b = u8::try_from(c).ok()?;
    if b < 0x20 {
        return Some(b as u16);
    }
    SHIFT_SET.iter().position(|&s| s == b).map(|p| p as u16 + 32)
}

/// Glyph number of a GB2312 `(lead << 8) | trail` code
pub fn chinese_value(code: i32) -> Option<u16> {
    let (c1, c2) = (code >> 8, code & 0xFF);
    if !(0xA1..=0xFE).contains(&c2) {
        return None;
    }
    let row = match c1 {
        0xA1..=0xA9 => c1 - 0xA1,
        0xB0..=0xF7 => c1 - 0xB0 + 9,
        _ => return None,
    };
    Some((row * 0x60 + c2 - 0xA0) as u16)
}

// GB2312 characters and single bytes
fn chinese_glyph(code: i32) -> Option<u16> {
    match code {
        0..=0xFF => Some(CHINESE_BYTE + code as u16),
        _ => chinese_value(code),
    }
}

// CR LF and digit pairs share one Chinese glyph
fn chinese_pair(codes: &[i32], pos: usize) -> Option<u16> {
    let (&a, &b) = (codes.get(pos)?, codes.get(pos + 1)?);
    if a == 13 && b == 10 {
        return Some(CHINESE_CRLF);
    }
    if is_digit(a) && is_digit(b) {
        return Some(CHINESE_DIGITS + ((a - 0x30) * 10 + b - 0x30) as u16);
    }
    None
}

// Segment
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Segment {
    pub mode: Mode,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(mode: Mode, start: usize, end: usize) -> Self {
        Self { mode, start, end }
    }

    /// Encoded size excluding the switch code into this segment
    pub fn bit_len(&self, codes: &[i32]) -> usize {
        let data = &codes[self.start..self.end];
        match self.mode {
            Mode::Numeric => 2 + data.len().div_ceil(3) * 10,
            Mode::Byte => {
                let bytes = byte_len(data);
                let blocks = bytes.div_ceil(MAX_BYTE_RUN);
                bytes * 8 + blocks * 9 + (blocks - 1) * 4
            }
            Mode::Chinese => {
                let mut bits = 0;
                let mut i = self.start;
                while i < self.end {
                    i += if chinese_pair(codes, i).is_some() && i + 1 < self.end { 2 } else { 1 };
                    bits += 13;
                }
                bits
            }
            mode => (self.start..self.end).map(|i| mode.scaled_char_bits(codes, i) / 3).sum(),
        }
    }
}

fn byte_len(data: &[i32]) -> usize {
    data.iter().map(|&c| if c > 0xFF { 2 } else { 1 }).sum()
}

/// Merges neighbouring segments of the same mode
pub fn combine(segs: &[Segment]) -> Vec<Segment> {
    let mut res: Vec<Segment> = Vec::with_capacity(segs.len());
    for &seg in segs {
        match res.last_mut() {
            Some(last) if last.mode == seg.mode && last.end == seg.start => last.end = seg.end,
            _ => res.push(seg),
        }
    }
    res
}

// Encoder
//------------------------------------------------------------------------------

/// Encodes codes into a data bit stream padded to whole 7 bit codewords
pub fn encode(codes: &[i32], max_bits: usize) -> SymbolResult<BitStream> {
    if codes.is_empty() {
        return Err(SymbolError::EmptyData);
    }

    let segs = compute_optimal_segments(codes)?;
    let bits = stream_len(&segs, codes);
    debug!("Grid Matrix data stream: {} segments, {bits} bits", segs.len());
    let padded = bits.div_ceil(7) * 7;
    if padded > max_bits {
        return Err(SymbolError::DataTooLong);
    }

    let mut bs = BitStream::new(padded);
    let mut prev = None;
    for seg in segs.iter() {
        trace!("Segment {:?} over codes {}..{}", seg.mode, seg.start, seg.end);
        let (value, width) = switch(prev, seg.mode);
        bs.push_bits(value, width);
        push_segment(seg, codes, &mut bs);
        prev = Some(seg.mode);
    }
    if let Some(last) = prev {
        let (value, width) = END[last.index()];
        bs.push_bits(value, width);
    }
    bs.push_bits(0u8, padded - bs.len());
    Ok(bs)
}

/// Total bits of the segments including switch and end codes
pub fn stream_len(segs: &[Segment], codes: &[i32]) -> usize {
    let mut prev = None;
    let mut bits = 0;
    for seg in segs {
        bits += switch(prev, seg.mode).1 + seg.bit_len(codes);
        prev = Some(seg.mode);
    }
    bits + prev.map_or(0, |m| END[m.index()].1)
}

fn push_segment(seg: &Segment, codes: &[i32], out: &mut BitStream) {
    let data = &codes[seg.start..seg.end];
    match seg.mode {
        Mode::Numeric => {
            let pad = (3 - data.len() % 3) % 3;
            out.push_bits(pad as u8, 2);
            for group in data.chunks(3) {
                let value = (0..3).fold(0u16, |acc, i| {
                    acc * 10 + group.get(i).map_or(0, |&d| (d - 0x30) as u16)
                });
                out.push_bits(value, 10);
            }
        }
        Mode::Byte => {
            let bytes = data
                .iter()
                .flat_map(|&c| if c > 0xFF { vec![(c >> 8) as u8, c as u8] } else { vec![c as u8] })
                .collect::<Vec<_>>();
            for (i, block) in bytes.chunks(MAX_BYTE_RUN).enumerate() {
                if i > 0 {
                    out.push_bits(Mode::Byte.indicator(), 4);
                }
                out.push_bits(block.len() - 1, 9);
                block.iter().for_each(|&b| out.push_bits(b, 8));
            }
        }
        Mode::Chinese => {
            let mut i = seg.start;
            while i < seg.end {
                match chinese_pair(codes, i).filter(|_| i + 1 < seg.end) {
                    Some(v) => {
                        out.push_bits(v, 13);
                        i += 2;
                    }
                    None => {
                        out.push_bits(chinese_glyph(codes[i]).unwrap_or_default(), 13);
                        i += 1;
                    }
                }
            }
        }
        Mode::Lower | Mode::Upper => {
            let value = if seg.mode == Mode::Lower { lower_value } else { upper_value };
            for &c in data {
                match value(c) {
                    Some(v) => out.push_bits(v, 5),
                    None => push_shifted(c, LETTER_SHIFT, out),
                }
            }
        }
        Mode::Mixed => {
            for &c in data {
                match mixed_value(c) {
                    Some(v) => out.push_bits(v, 6),
                    None => push_shifted(c, MIXED_SHIFT, out),
                }
            }
        }
    }
}

fn push_shifted(c: i32, shift: (u16, usize), out: &mut BitStream) {
    out.push_bits(shift.0, shift.1);
    out.push_bits(shift_value(c).unwrap_or_default(), 6);
}

// Dynamic programming over prefix lengths. Cost of a prefix is its bit size
// scaled by 3 with the segment still open.
pub(super) fn compute_optimal_segments(codes: &[i32]) -> SymbolResult<Vec<Segment>> {
    debug_assert!(!codes.is_empty(), "Empty data");

    let len = codes.len();
    let entry = |from: Option<Mode>, to: Mode| (switch(from, to).1 + to.header_bits()) * 3;

    let mut cost = vec![[usize::MAX; 6]; len + 1];
    // Start of the character and the mode index the path came from
    let mut min_path: Vec<[Option<(usize, Option<usize>)>; 6]> = vec![[None; 6]; len + 1];

    for i in 0..len {
        if i > 0 && cost[i].iter().all(|&c| c == usize::MAX) {
            continue;
        }
        for (j, &to_mode) in MODES.iter().enumerate() {
            let Some(step) = to_mode.char_len(codes, i) else {
                continue;
            };
            let ni = i + step;
            let char_bits = to_mode.scaled_char_bits(codes, i);

            if i == 0 {
                let c = entry(None, to_mode) + char_bits;
                if c < cost[ni][j] {
                    cost[ni][j] = c;
                    min_path[ni][j] = Some((i, None));
                }
                continue;
            }

            let row = cost[i];
            for (k, &prev) in row.iter().enumerate() {
                if prev == usize::MAX {
                    continue;
                }
                let mut c =
                    if k == j { prev } else { prev.div_ceil(3) * 3 + entry(Some(MODES[k]), to_mode) };
                c += char_bits;
                if c < cost[ni][j] {
                    cost[ni][j] = c;
                    min_path[ni][j] = Some((i, Some(k)));
                }
            }
        }
    }

    let Some(last) = (0..6)
        .filter(|&j| cost[len][j] != usize::MAX)
        .min_by_key(|&j| cost[len][j].div_ceil(3) * 3 + END[j].1 * 3)
    else {
        let pos = (0..len)
            .find(|&i| !MODES.iter().any(|&m| m.char_len(codes, i).is_some()))
            .unwrap_or(0);
        return Err(SymbolError::InvalidChar(pos));
    };

    let char_modes = trace_optimal_modes(&min_path, last, len);
    let singles = char_modes
        .iter()
        .enumerate()
        .map(|(i, &(start, mode))| {
            let end = char_modes.get(i + 1).map_or(len, |&(s, _)| s);
            Segment::new(mode, start, end)
        })
        .collect::<Vec<_>>();
    Ok(combine(&singles))
}

// Backtrack min_path and identify the mode of every character start
fn trace_optimal_modes(
    min_path: &[[Option<(usize, Option<usize>)>; 6]],
    last: usize,
    len: usize,
) -> Vec<(usize, Mode)> {
    let mut res = Vec::with_capacity(len);
    let mut pos = len;
    let mut mode_index = last;
    while let Some((start, from)) = min_path[pos][mode_index] {
        res.push((start, MODES[mode_index]));
        match from {
            Some(k) => {
                pos = start;
                mode_index = k;
            }
            None => break,
        }
    }
    res.reverse();
    res
}
