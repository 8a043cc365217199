use crate::common::error::{SymbolError, SymbolResult};

// Galois field
//------------------------------------------------------------------------------

/// Arithmetic over GF(2^m) defined by a primitive polynomial. Elements are
/// stored as `u16`, which covers every field up to GF(4096).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaloisField {
    poly: u16,
    size: usize,
    exp: Vec<u16>,
    log: Vec<u16>,
}

impl GaloisField {
    pub fn new(poly: u16) -> SymbolResult<Self> {
        if poly < 2 {
            return Err(SymbolError::Internal("Field polynomial must have degree of at least 1"));
        }

        let degree = 15 - poly.leading_zeros() as usize;
        let size = 1usize << degree;
        let order = size - 1;

        let mut exp = vec![0u16; order * 2];
        let mut log = vec![0u16; size];
        let mut seen = vec![false; size];

        let mut x = 1usize;
        for i in 0..order {
            if seen[x] {
                return Err(SymbolError::Internal("Field polynomial is not primitive"));
            }
            seen[x] = true;
            exp[i] = x as u16;
            log[x] = i as u16;
            x <<= 1;
            if x & size != 0 {
                x ^= poly as usize;
            }
        }
        if x != 1 {
            return Err(SymbolError::Internal("Field polynomial is not primitive"));
        }

        // Doubled exp table avoids a modulo in `mul`
        for i in order..order * 2 {
            exp[i] = exp[i - order];
        }

        Ok(Self { poly, size, exp, log })
    }

    pub fn poly(&self) -> u16 {
        self.poly
    }

    /// Number of elements in the field
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn order(&self) -> usize {
        self.size - 1
    }

    pub fn exp(&self, i: usize) -> u16 {
        self.exp[i % self.order()]
    }

    pub fn log(&self, a: u16) -> usize {
        debug_assert!(a != 0, "Log of zero is undefined");
        self.log[a as usize] as usize
    }

    pub fn mul(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
    }

    pub fn contains(&self, a: u16) -> bool {
        (a as usize) < self.size
    }
}
