use std::fmt::Display;

use num_traits::PrimInt;

// Bit stream
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    data: Vec<u8>,
    // Bit length
    len: usize,
    // Max bit capacity
    capacity: usize,
    // Pointer to take bits
    cursor: usize,
}

impl BitStream {
    pub fn new(capacity: usize) -> Self {
        Self { data: vec![0; (capacity + 7) >> 3], len: 0, capacity, cursor: 0 }
    }

    pub fn from(inp: &[u8]) -> Self {
        let bit_len = inp.len() << 3;
        Self { data: inp.to_vec(), len: bit_len, capacity: bit_len, cursor: 0 }
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

    // Bits left to take
    pub fn remaining(&self) -> usize {
        self.len - self.cursor
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..(self.len + 7) >> 3]
    }
}

// Push bits for bit stream
//------------------------------------------------------------------------------

impl BitStream {
    // Pushes the lowest `size` bits of `bits`, most significant first
    pub fn push_bits<T>(&mut self, bits: T, size: usize)
    where
        T: PrimInt + Display,
    {
        let max_bits = std::mem::size_of::<T>() * 8;
        debug_assert!(size <= 32, "Cannot push more than 32 bits at once: Size {size}");
        debug_assert!(
            size >= max_bits - bits.leading_zeros() as usize,
            "Bit count shouldn't exceed bit length: Length {size}, Bits {bits}"
        );
        debug_assert!(
            self.len + size <= self.capacity,
            "Insufficient capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + size
        );

        let bits = bits.to_u32().unwrap_or(0);
        let mut rem = size;
        while rem > 0 {
            let offset = self.len & 7;
            let pos = self.len >> 3;
            let n = rem.min(8 - offset);
            let chunk = ((bits >> (rem - n)) & ((1 << n) - 1)) as u8;
            self.data[pos] |= chunk << (8 - offset - n);
            self.len += n;
            rem -= n;
        }
    }

    pub fn push(&mut self, bit: bool) {
        debug_assert!(
            self.len < self.capacity,
            "Insufficient capacity: Capacity {}, Size {}",
            self.capacity,
            self.len + 1
        );

        if bit {
            let offset = self.len & 7;
            let pos = self.len >> 3;
            self.data[pos] |= 0b10000000 >> offset;
        }

        self.len += 1;
    }
}


// Take bits for bit stream
//------------------------------------------------------------------------------

impl BitStream {
    pub fn take_bits(&mut self, n: usize) -> Option<u16> {
        debug_assert!(n <= 16, "Cannot take more than 16 bits: N {n}");

        if self.cursor + n > self.len {
            return None;
        }

        let mut res = 0u16;
        let mut rem = n;
        while rem > 0 {
            let offset = self.cursor & 7;
            let pos = self.cursor >> 3;
            let k = rem.min(8 - offset);
            let chunk = (self.data[pos] >> (8 - offset - k)) & (((1u16 << k) - 1) as u8);
            res = (res << k) | chunk as u16;
            self.cursor += k;
            rem -= k;
        }
        Some(res)
    }

    pub fn take(&mut self) -> Option<bool> {
        if self.cursor == self.len {
            return None;
        }

        let offset = self.cursor & 7;
        let pos = self.cursor >> 3;
        let bit = (self.data[pos] << offset) >> 7;

        self.cursor += 1;

        Some(bit != 0)
    }
}

#[cfg(test)]
mod bit_stream_take_tests {

    use super::BitStream;

    #[test]
    fn test_take_bits() {
        let data = [
            0b11010010, 0b00110100, 0b10001101, 0b00100011, 0b01001000, 0b11010010, 0b00110100,
            0b10001101, 0b00100011, 0b01001000, 0b11010010, 0b00110100, 0b10001100,
        ];
        let mut bs = BitStream::from(&data);
        assert_eq!(bs.take_bits(0), Some(0));
        assert_eq!(bs.take_bits(4), Some(0b1101));
        assert_eq!(bs.take_bits(4), Some(0b0010));
        assert_eq!(bs.take_bits(8), Some(0b00110100));
        assert_eq!(bs.take_bits(9), Some(0b100011010));
        assert_eq!(bs.take_bits(7), Some(0b0100011));
        assert_eq!(bs.take_bits(16), Some(0b01001000_11010010));
        assert_eq!(bs.take_bits(1), Some(0b0));
        assert_eq!(bs.take_bits(11), Some(0b01101001000));
        assert_eq!(bs.take_bits(14), Some(0b11010010001101));
        assert_eq!(bs.take_bits(16), Some(0b0010001101001000));
        assert_eq!(bs.take_bits(4), Some(0b1101));
        assert_eq!(bs.take_bits(4), Some(0b0010));
        assert_eq!(bs.remaining(), 6);
    }

    #[test]
    fn test_take_bits_exact_end() {
        let mut bs = BitStream::from(&[0b1010_1010]);
        assert_eq!(bs.take_bits(8), Some(0b1010_1010));
        assert_eq!(bs.take_bits(1), None);
    }

    #[test]
    fn test_take_bits_over_capacity() {
        let mut bs = BitStream::from(&[]);
        assert_eq!(bs.take_bits(5), None);
    }

    #[test]
    fn test_iterator() {
        let bits = BitStream::from(&[0b1000_0001]).collect::<Vec<_>>();
        assert_eq!(bits, [true, false, false, false, false, false, false, true]);
    }
}

// Iterator for bit stream
//------------------------------------------------------------------------------

impl Iterator for BitStream {
    type Item = bool;
    fn next(&mut self) -> Option<Self::Item> {
        self.take()
    }
}
