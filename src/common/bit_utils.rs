use std::fmt::Display;

use num_traits::PrimInt;

// Bit stream
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BitStream {
    data: [u8; MAX_PAYLOAD_SIZE],
    // Bit length
    len: usize,
    // Max bit capacity
    capacity: usize,
}

impl BitStream {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(
            capacity <= MAX_PAYLOAD_BITS,
            "Capacity exceeds payload limit: Capacity {capacity}, Limit {MAX_PAYLOAD_BITS}"
        );
        Self { data: [0; MAX_PAYLOAD_SIZE], len: 0, capacity }
    }

    pub fn from(inp: &[u8]) -> Self {
        let len = inp.len();
        let bit_len = len << 3;
        let mut data = [0; MAX_PAYLOAD_SIZE];
        data[..len].copy_from_slice(inp);
        Self { data, len: bit_len, capacity: bit_len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..(self.len + 7) >> 3]
    }

    pub fn get(&self, pos: usize) -> bool {
        debug_assert!(pos < self.len, "Out of bitstream bounds: Len {}, Pos {}", self.len, pos);

        (self.data[pos >> 3] << (pos & 7)) & 0b10000000 != 0
    }

    // Reads `width` bits starting at `pos` as a big-endian integer
    pub fn read(&self, pos: usize, width: usize) -> u16 {
        debug_assert!(width <= 16, "Cannot read more than 16 bits: Width {width}");

        (pos..pos + width).fold(0, |acc, i| (acc << 1) | self.get(i) as u16)
    }

    // Splits the stream into big-endian codewords of `width` bits each
    pub fn words(&self, width: usize) -> Vec<u16> {
        debug_assert!(
            self.len % width == 0,
            "Bit length is not a multiple of the codeword width: Len {}, Width {width}",
            self.len
        );

        (0..self.len / width).map(|i| self.read(i * width, width)).collect()
    }
}

// Push bits for bit stream
//------------------------------------------------------------------------------

impl BitStream {
    pub fn push_bits<T>(&mut self, bits: T, size: usize)
    where
        T: PrimInt + Display,
    {
        let max_bits = std::mem::size_of::<T>() * 8;
        debug_assert!(
            size >= max_bits - bits.leading_zeros() as usize,
            "Bit count shouldn't exceed bit length: Length {size}, Bits {bits}"
        );
        debug_assert!(size <= 16, "Bits from only u8 and u16 can be pushed: Size {size}");
        debug_assert!(
            self.len + size <= self.capacity,
            "Insufficient capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + size
        );

        let bits = bits.to_u32().unwrap_or_default();
        for i in (0..size).rev() {
            self.push((bits >> i) & 1 == 1);
        }
    }

    pub fn push(&mut self, bit: bool) {
        debug_assert!(
            self.len < self.capacity,
            "Insufficient capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + 1
        );

        let offset = self.len & 7;
        let pos = self.len >> 3;
        if offset == 0 {
            self.data[pos] = 0;
        }
        if bit {
            self.data[pos] |= 0b10000000 >> offset;
        }

        self.len += 1;
    }

    pub fn extend(&mut self, other: &BitStream) {
        debug_assert!(
            self.len + other.len <= self.capacity,
            "Extension shouldn't overflow capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + other.len
        );

        for i in 0..other.len {
            self.push(other.get(i));
        }
    }

    pub fn put(&mut self, pos: usize, bit: bool) {
        debug_assert!(pos < self.len, "Out of bitstream bounds: Len {}, Pos {}", self.len, pos);

        let offset = pos & 7;
        let index = pos >> 3;

        self.data[index] &= !(0b10000000 >> offset);
        if bit {
            self.data[index] |= 0b10000000 >> offset;
        }
    }
}

// Global constants
//------------------------------------------------------------------------------

pub const MAX_PAYLOAD_SIZE: usize = 2560;

pub const MAX_PAYLOAD_BITS: usize = MAX_PAYLOAD_SIZE << 3;


#[cfg(test)]
mod bit_stream_read_tests {

    use super::BitStream;

    #[test]
    fn test_read_and_words() {
        let data = [0b11010010, 0b00110100, 0b10001101];
        let bs = BitStream::from(&data);
        assert_eq!(bs.read(0, 0), 0);
        assert_eq!(bs.read(2, 6), 0b010010);
        assert_eq!(bs.read(8, 9), 0b001101001);
        assert_eq!(bs.words(6), vec![0b110100, 0b100011, 0b010010, 0b001101]);
        assert_eq!(bs.words(12), vec![0b110100100011, 0b010010001101]);
    }
}
