use log::{debug, trace};

use crate::common::{
    bit_utils::BitStream,
    codec::FNC1,
    error::{SymbolError, SymbolResult},
};

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Upper = 0,
    Lower = 1,
    Mixed = 2,
    Punct = 3,
    Digit = 4,
}

static MODES: [Mode; 5] = [Mode::Upper, Mode::Lower, Mode::Mixed, Mode::Punct, Mode::Digit];

// (code, bit width) sequences that latch from one mode to another
static LATCH_TABLE: [[&[(u16, usize)]; 5]; 5] = [
    // Upper
    [&[], &[(28, 5)], &[(29, 5)], &[(29, 5), (30, 5)], &[(30, 5)]],
    // Lower
    [&[(30, 5), (14, 4)], &[], &[(29, 5)], &[(29, 5), (30, 5)], &[(30, 5)]],
    // Mixed
    [&[(29, 5)], &[(28, 5)], &[], &[(30, 5)], &[(29, 5), (30, 5)]],
    // Punct
    [&[(31, 5)], &[(31, 5), (28, 5)], &[(31, 5), (29, 5)], &[], &[(31, 5), (30, 5)]],
    // Digit
    [&[(14, 4)], &[(14, 4), (28, 5)], &[(14, 4), (29, 5)], &[(14, 4), (29, 5), (30, 5)], &[]],
];

static PUNCT_CHARS: &[u8] = b"!\"#$%&'()*+,-./:;<=>?[]{}";

static MIXED_CHARS: &[u8] = b"@\\^_`|~";

static PUNCT_PAIRS: [(&[u8; 2], u16); 4] = [(b"\r\n", 2), (b". ", 3), (b", ", 4), (b": ", 5)];

impl Mode {
    pub fn width(self) -> usize {
        match self {
            Self::Digit => 4,
            _ => 5,
        }
    }

    /// Code of `c` in this mode's alphabet
    pub fn value(self, c: i32) -> Option<u16> {
        let c = u8::try_from(c).ok()?;
        let v = match self {
            Self::Upper => match c {
                b' ' => 1,
                b'A'..=b'Z' => c - b'A' + 2,
                _ => return None,
            },
            Self::Lower => match c {
                b' ' => 1,
                b'a'..=b'z' => c - b'a' + 2,
                _ => return None,
            },
            Self::Mixed => match c {
                b' ' => 1,
                0x01..=0x0D => c + 1,
                0x1B..=0x1F => c - 0x1B + 15,
                0x7F => 27,
                _ => MIXED_CHARS.iter().position(|&m| m == c)? as u8 + 20,
            },
            Self::Punct => match c {
                b'\r' => 1,
                _ => PUNCT_CHARS.iter().position(|&p| p == c)? as u8 + 6,
            },
            Self::Digit => match c {
                b' ' => 1,
                b'0'..=b'9' => c - b'0' + 2,
                b',' => 12,
                b'.' => 13,
                _ => return None,
            },
        };
        Some(v as u16)
    }

    fn latch_bits(self, to: Mode) -> usize {
        LATCH_TABLE[self as usize][to as usize].iter().map(|&(_, w)| w).sum()
    }

    // Shift to `to` for one character: (code, width)
    fn shift(self, to: Mode) -> Option<(u16, usize)> {
        match (self, to) {
            (Self::Lower, Self::Upper) => Some((28, 5)),
            (Self::Digit, Self::Upper) => Some((15, 4)),
            (Self::Upper | Self::Lower | Self::Mixed, Self::Punct) => Some((0, 5)),
            (Self::Digit, Self::Punct) => Some((0, 4)),
            _ => None,
        }
    }

    // Codes leading into a binary run and the mode in force after it
    fn binary_shift(self) -> (&'static [(u16, usize)], Mode) {
        match self {
            Self::Upper | Self::Lower | Self::Mixed => (&[(31, 5)], self),
            Self::Punct => (&[(31, 5), (31, 5)], Self::Upper),
            Self::Digit => (&[(14, 4), (31, 5)], Self::Upper),
        }
    }
}

fn punct_pair(codes: &[i32], pos: usize) -> Option<u16> {
    let pair = codes.get(pos..pos + 2)?;
    PUNCT_PAIRS
        .iter()
        .find(|(p, _)| p[0] as i32 == pair[0] && p[1] as i32 == pair[1])
        .map(|&(_, v)| v)
}

fn binary_header_bits(len: usize) -> usize {
    if len <= 31 {
        5
    } else {
        16
    }
}

// Encoding step
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Action {
    // Character(s) after latching into the mode
    Latch(Mode, u16),
    // Character(s) through a one-shot shift into the mode
    Shift(Mode, u16),
    // Binary run of the given byte count
    Binary(usize),
    Fnc1,
}

#[derive(Debug, Clone, Copy)]
struct Step {
    from_pos: usize,
    from_mode: Mode,
    action: Action,
}

/// Longest byte run a single binary shift can carry
pub const MAX_BINARY_RUN: usize = 2047 + 31;

/// Bits available in the largest symbol
pub const MAX_BITS: usize = (112 + 16 * 32) * 32;

// Encoder
//------------------------------------------------------------------------------

/// Encodes codes into the shortest Aztec bit stream. Codes are bytes or the
/// FNC1 sentinel, which is only accepted with `gs1`.
pub fn encode(codes: &[i32], gs1: bool) -> SymbolResult<BitStream> {
    if codes.is_empty() {
        return Err(SymbolError::EmptyData);
    }
    if let Some(pos) = codes.iter().position(|&c| !(0..=255).contains(&c) && !(gs1 && c == FNC1)) {
        return Err(SymbolError::InvalidChar(pos));
    }

    // Every character needs at least 2.5 bits
    if codes.len() * 5 / 2 > MAX_BITS {
        return Err(SymbolError::DataTooLong);
    }

    let steps = compute_optimal_steps(codes)?;

    let lead_in = if gs1 { 13 } else { 0 };
    let bits = lead_in + steps.iter().map(step_bits).sum::<usize>();
    debug!("Aztec high level encoding: {} codes in {bits} bits", codes.len());
    if bits > MAX_BITS {
        return Err(SymbolError::DataTooLong);
    }

    let mut bs = BitStream::new(bits);
    if gs1 {
        // P/S FLG(0)
        bs.push_bits(0u8, 5);
        bs.push_bits(0u8, 5);
        bs.push_bits(0u8, 3);
    }
    for step in steps.iter() {
        trace!("{:?} -> {:?} at {}", step.from_mode, step.action, step.from_pos);
        push_step(step, codes, &mut bs);
    }
    Ok(bs)
}

// Dynamic programming over input positions and latched modes. A binary run
// is a single transition spanning all of its bytes.
fn compute_optimal_steps(codes: &[i32]) -> SymbolResult<Vec<Step>> {
    let len = codes.len();
    let mut cost = vec![[usize::MAX; 5]; len + 1];
    let mut back: Vec<[Option<Step>; 5]> = vec![[None; 5]; len + 1];
    cost[0][Mode::Upper as usize] = 0;

    let relax = |cost: &mut Vec<[usize; 5]>,
                 back: &mut Vec<[Option<Step>; 5]>,
                 to_pos: usize,
                 to_mode: Mode,
                 c: usize,
                 step: Step| {
        if c < cost[to_pos][to_mode as usize] {
            cost[to_pos][to_mode as usize] = c;
            back[to_pos][to_mode as usize] = Some(step);
        }
    };

    for i in 0..len {
        for from in MODES {
            let prev = cost[i][from as usize];
            if prev == usize::MAX {
                continue;
            }
            let c = codes[i];

            if c == FNC1 {
                let shift = if from == Mode::Punct { 0 } else { from.width() };
                let step = Step { from_pos: i, from_mode: from, action: Action::Fnc1 };
                relax(&mut cost, &mut back, i + 1, from, prev + shift + 8, step);
                continue;
            }

            // Single characters, latched or shifted
            for to in MODES {
                let Some(v) = to.value(c) else {
                    continue;
                };
                let latched = prev + from.latch_bits(to) + to.width();
                let step = Step { from_pos: i, from_mode: from, action: Action::Latch(to, v) };
                relax(&mut cost, &mut back, i + 1, to, latched, step);

                if let Some((_, w)) = from.shift(to) {
                    let step = Step { from_pos: i, from_mode: from, action: Action::Shift(to, v) };
                    relax(&mut cost, &mut back, i + 1, from, prev + w + to.width(), step);
                }
            }

            // Two character punctuation
            if let Some(v) = punct_pair(codes, i) {
                let latched = prev + from.latch_bits(Mode::Punct) + 5;
                let step =
                    Step { from_pos: i, from_mode: from, action: Action::Latch(Mode::Punct, v) };
                relax(&mut cost, &mut back, i + 2, Mode::Punct, latched, step);
                if let Some((_, w)) = from.shift(Mode::Punct) {
                    let step =
                        Step { from_pos: i, from_mode: from, action: Action::Shift(Mode::Punct, v) };
                    relax(&mut cost, &mut back, i + 2, from, prev + w + 5, step);
                }
            }

            // Binary runs
            let (lead, after) = from.binary_shift();
            let lead_bits: usize = lead.iter().map(|&(_, w)| w).sum();
            for n in 1..=MAX_BINARY_RUN.min(len - i) {
                if codes[i + n - 1] == FNC1 {
                    break;
                }
                let c = prev + lead_bits + binary_header_bits(n) + 8 * n;
                let step = Step { from_pos: i, from_mode: from, action: Action::Binary(n) };
                relax(&mut cost, &mut back, i + n, after, c, step);
            }
        }
    }

    let last = MODES
        .iter()
        .copied()
        .filter(|&m| cost[len][m as usize] != usize::MAX)
        .min_by_key(|&m| cost[len][m as usize])
        .ok_or(SymbolError::Internal("No encoding path covers the input"))?;

    let mut steps = vec![];
    let (mut pos, mut mode) = (len, last);
    while pos > 0 {
        let step = back[pos][mode as usize]
            .ok_or(SymbolError::Internal("Broken encoding path"))?;
        pos = step.from_pos;
        mode = step.from_mode;
        steps.push(step);
    }
    steps.reverse();
    Ok(steps)
}

fn step_bits(step: &Step) -> usize {
    let from = step.from_mode;
    match step.action {
        Action::Latch(to, _) => from.latch_bits(to) + to.width(),
        Action::Shift(to, _) => from.shift(to).map_or(0, |(_, w)| w) + to.width(),
        Action::Binary(n) => {
            let (lead, _) = from.binary_shift();
            lead.iter().map(|&(_, w)| w).sum::<usize>() + binary_header_bits(n) + 8 * n
        }
        Action::Fnc1 => (if from == Mode::Punct { 0 } else { from.width() }) + 8,
    }
}

fn push_step(step: &Step, codes: &[i32], out: &mut BitStream) {
    let from = step.from_mode;
    match step.action {
        Action::Latch(to, v) => {
            LATCH_TABLE[from as usize][to as usize].iter().for_each(|&(c, w)| out.push_bits(c, w));
            out.push_bits(v, to.width());
        }
        Action::Shift(to, v) => {
            if let Some((c, w)) = from.shift(to) {
                out.push_bits(c, w);
            }
            out.push_bits(v, to.width());
        }
        Action::Binary(n) => {
            let (lead, _) = from.binary_shift();
            lead.iter().for_each(|&(c, w)| out.push_bits(c, w));
            if n <= 31 {
                out.push_bits(n as u16, 5);
            } else {
                out.push_bits(0u8, 5);
                out.push_bits((n - 31) as u16, 11);
            }
            codes[step.from_pos..step.from_pos + n]
                .iter()
                .for_each(|&b| out.push_bits(b as u16, 8));
        }
        Action::Fnc1 => {
            if from != Mode::Punct {
                out.push_bits(0u8, from.width());
            }
            // FLG(0)
            out.push_bits(0u8, 5);
            out.push_bits(0u8, 3);
        }
    }
}

#[cfg(test)]
mod codec_tests {

    use test_case::test_case;

    use super::{encode, Mode};
    use crate::common::{codec::FNC1, error::SymbolError};

    fn codes(s: &str) -> Vec<i32> {
        s.bytes().map(|b| b as i32).collect()
    }

    fn bit_string(s: &str, gs1: bool) -> String {
        let bs = encode(&codes(s), gs1).unwrap();
        (0..bs.len()).map(|i| if bs.get(i) { '1' } else { '0' }).collect()
    }

    #[test_case(Mode::Upper, b'A' as i32, Some(2))]
    #[test_case(Mode::Lower, b'z' as i32, Some(27))]
    #[test_case(Mode::Mixed, b'@' as i32, Some(20))]
    #[test_case(Mode::Mixed, 0x7F, Some(27))]
    #[test_case(Mode::Mixed, 0x0D, Some(14))]
    #[test_case(Mode::Punct, b'}' as i32, Some(30))]
    #[test_case(Mode::Punct, b'!' as i32, Some(6))]
    #[test_case(Mode::Digit, b'.' as i32, Some(13))]
    #[test_case(Mode::Digit, b'a' as i32, None)]
    #[test_case(Mode::Upper, FNC1, None)]
    fn test_value(mode: Mode, c: i32, exp: Option<u16>) {
        assert_eq!(mode.value(c), exp);
    }

    #[test]
    fn test_upper_only() {
        // A = 2, B = 3
        assert_eq!(bit_string("AB", false), "0001000011");
    }

    #[test]
    fn test_digits() {
        // D/L then 1, 2, 3
        assert_eq!(bit_string("123", false), "11110".to_owned() + "0011" + "0100" + "0101");
    }

    #[test]
    fn test_lower_with_upper_shift() {
        // L/L a U/S B c
        assert_eq!(
            bit_string("aBc", false),
            "11100".to_owned() + "00010" + "11100" + "00011" + "00100"
        );
    }

    #[test]
    fn test_punct_pair() {
        // A P/S ". " B
        assert_eq!(bit_string("A. B", false), "00010".to_owned() + "00000" + "00011" + "00011");
    }

    #[test]
    fn test_binary_shift() {
        // B/S, length 1, byte 0x80
        assert_eq!(bit_string("\u{0}", false).len(), 5 + 5 + 8);
        let bs = encode(&[0x80, 0x81], false).unwrap();
        assert_eq!(bs.len(), 5 + 5 + 16);
        assert_eq!(bs.read(0, 5), 31);
        assert_eq!(bs.read(5, 5), 2);
        assert_eq!(bs.read(10, 8), 0x80);
    }

    #[test]
    fn test_long_binary_run() {
        let data = vec![0x80; 100];
        let bs = encode(&data, false).unwrap();
        assert_eq!(bs.len(), 5 + 16 + 800);
        assert_eq!(bs.read(5, 5), 0);
        assert_eq!(bs.read(10, 11), 69);
    }

    #[test]
    fn test_gs1_fnc1() {
        let mut data = codes("10A");
        data.push(FNC1);
        data.extend(codes("1"));
        let bs = encode(&data, true).unwrap();
        // Lead in P/S FLG(0) is 13 zero bits
        assert_eq!(bs.read(0, 13), 0);
    }

    #[test]
    fn test_invalid() {
        assert_eq!(encode(&[], false).map(|b| b.len()), Err(SymbolError::EmptyData));
        assert_eq!(encode(&[65, 300], false).map(|b| b.len()), Err(SymbolError::InvalidChar(1)));
        assert_eq!(encode(&[FNC1], false).map(|b| b.len()), Err(SymbolError::InvalidChar(0)));
    }
}
