use log::trace;

use super::galois::GaloisField;
use crate::common::error::{SymbolError, SymbolResult};

// Reed-Solomon encoder
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReedSolomon {
    gf: GaloisField,
    // Generator polynomial coefficients below the monic leading term, highest
    // degree first
    gen_poly: Vec<u16>,
}

impl ReedSolomon {
    /// Builds the generator (x - a^first_root)(x - a^(first_root+1))... with
    /// `ec_len` factors.
    pub fn new(gf: &GaloisField, ec_len: usize, first_root: usize) -> SymbolResult<Self> {
        if ec_len == 0 || ec_len >= gf.order() {
            return Err(SymbolError::Internal("Invalid error correction length for field"));
        }

        let mut poly = vec![1u16];
        for i in 0..ec_len {
            let root = gf.exp(first_root + i);
            let mut next = poly.clone();
            next.push(0);
            for (j, &c) in poly.iter().enumerate() {
                next[j + 1] ^= gf.mul(c, root);
            }
            poly = next;
        }
        poly.remove(0);

        trace!("Generator polynomial for poly {:#x}, len {ec_len}: {poly:?}", gf.poly());

        Ok(Self { gf: gf.clone(), gen_poly: poly })
    }

    pub fn ec_len(&self) -> usize {
        self.gen_poly.len()
    }

    /// Performs polynomial long division of the data polynomial by the
    /// generator polynomial. The remainder coefficients are the error
    /// correction codewords, highest degree first.
    pub fn encode(&self, data: &[u16]) -> SymbolResult<Vec<u16>> {
        let len = data.len();
        let ec_len = self.ec_len();

        if len + ec_len > self.gf.order() {
            return Err(SymbolError::Internal("Block exceeds field length"));
        }
        if let Some(&w) = data.iter().find(|&&w| !self.gf.contains(w)) {
            trace!("Codeword {w} outside field of size {}", self.gf.size());
            return Err(SymbolError::Internal("Codeword outside field"));
        }

        let mut res = data.to_vec();
        res.resize(len + ec_len, 0);

        for i in 0..len {
            let lead_coeff = res[i];
            if lead_coeff == 0 {
                continue;
            }

            for (u, &v) in res[i + 1..].iter_mut().zip(self.gen_poly.iter()) {
                *u ^= self.gf.mul(v, lead_coeff);
            }
        }

        Ok(res.split_off(len))
    }
}

#[cfg(test)]
mod encoder_tests {

    use proptest::prelude::*;
    use test_case::test_case;

    use super::ReedSolomon;
    use crate::common::{ec::galois::GaloisField, error::SymbolError};

    fn ecc(poly: u16, first_root: usize, data: &[u16], ec_len: usize) -> Vec<u16> {
        let gf = GaloisField::new(poly).unwrap();
        ReedSolomon::new(&gf, ec_len, first_root).unwrap().encode(data).unwrap()
    }

    fn widen(bytes: &[u8]) -> Vec<u16> {
        bytes.iter().map(|&b| b as u16).collect()
    }

    #[test]
    fn test_poly_mod_qr() {
        let data = widen(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11");
        let res = ecc(0x11D, 0, &data, 10);
        assert_eq!(res, widen(b"\xc4#'w\xeb\xd7\xe7\xe2]\x17"));
    }

    #[test_case(0x43, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 10, &[2, 38, 27, 3, 55, 19, 63, 6, 58, 50]; "gf64")]
    #[test_case(0x12D, &[0x10, 0x20, 0x30, 0x40, 0x50], 6, &[182, 227, 213, 205, 142, 191]; "gf256")]
    #[test_case(0x13, &[0, 5], 5, &[1, 7, 13, 10, 5]; "gf16")]
    #[test_case(0x89, &[1, 2, 3, 4, 5, 6, 7, 8], 5, &[7, 71, 94, 43, 61]; "gf128")]
    #[test_case(0x409, &[100, 200, 300, 400], 4, &[183, 369, 130, 399]; "gf1024")]
    #[test_case(0x1069, &[1000, 2000, 3000], 3, &[3876, 2504, 991]; "gf4096")]
    fn test_poly_mod_first_root_one(poly: u16, data: &[u16], ec_len: usize, exp: &[u16]) {
        assert_eq!(ecc(poly, 1, data, ec_len), exp);
    }

    #[test]
    fn test_zero_data() {
        assert_eq!(ecc(0x43, 1, &[0; 8], 5), vec![0; 5]);
    }

    #[test]
    fn test_codeword_outside_field() {
        let gf = GaloisField::new(0x43).unwrap();
        let rs = ReedSolomon::new(&gf, 4, 1).unwrap();
        assert!(matches!(rs.encode(&[64]), Err(SymbolError::Internal(_))));
    }

    #[test]
    fn test_block_too_long() {
        let gf = GaloisField::new(0x13).unwrap();
        let rs = ReedSolomon::new(&gf, 5, 1).unwrap();
        assert!(rs.encode(&[1; 11]).is_err());
        assert!(rs.encode(&[1; 10]).is_ok());
    }

    proptest! {
        // Every codeword of data followed by ecc evaluates to zero at each root
        #[test]
        fn proptest_roots(data in prop::collection::vec(0u16..256, 1..40), ec_len in 2usize..20) {
            let gf = GaloisField::new(0x12D).unwrap();
            let rs = ReedSolomon::new(&gf, ec_len, 1).unwrap();
            let mut cw = data.clone();
            cw.extend(rs.encode(&data).unwrap());
            for r in 0..ec_len {
                let root = gf.exp(1 + r);
                let eval = cw.iter().fold(0u16, |acc, &c| gf.mul(acc, root) ^ c);
                prop_assert_eq!(eval, 0);
            }
        }
    }
}
