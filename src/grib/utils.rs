use crate::grib::{DecodeError, FormatError};

/// Sign-and-magnitude interpretation of an unsigned field: the top bit is the
/// sign, the remaining bits are the magnitude.
pub(crate) trait GribInt<I> {
    fn as_grib_int(&self) -> I;
}

macro_rules! add_impl_for_ints {
    ($(($ty_src:ty, $ty_dst:ty),)*) => ($(
        impl GribInt<$ty_dst> for $ty_src {
            fn as_grib_int(&self) -> $ty_dst {
                if self.leading_zeros() == 0 {
                    let abs = (self << 1 >> 1) as $ty_dst;
                    -abs
                } else {
                    *self as $ty_dst
                }
            }
        }
    )*);
}

add_impl_for_ints! {
    (u8, i8),
    (u16, i16),
    (u32, i32),
    (u64, i64),
}

/// MSB-first bit cursor over the bytes of a single section.
///
/// A reader never outlives the slice it was built over; every Section 7
/// decode creates its own.
pub struct BitReader<'a> {
    slice: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(slice: &'a [u8]) -> Self {
        Self { slice, pos: 0 }
    }

    pub fn remaining_bits(&self) -> usize {
        self.slice.len() * 8 - self.pos
    }

    /// Skip to the start of the next octet, unless already there.
    pub fn align_to_byte(&mut self) {
        self.pos = (self.pos + 7) / 8 * 8;
    }

    /// Plain big-endian concatenation of `bits` bits.
    pub fn read_unsigned(&mut self, bits: usize) -> Result<u64, DecodeError> {
        if bits > 64 {
            return Err(DecodeError::CorruptData(format!("bit width {} exceeds 64", bits)));
        }
        if bits > self.remaining_bits() {
            return Err(DecodeError::UnexpectedEnd);
        }

        let mut value: u64 = 0;
        let mut left = bits;
        while left > 0 {
            let byte = self.slice[self.pos / 8];
            let available = 8 - self.pos % 8;
            let take = available.min(left);
            let chunk = (byte >> (available - take)) & ((1u16 << take) - 1) as u8;
            value = (value << take) | u64::from(chunk);
            self.pos += take;
            left -= take;
        }

        Ok(value)
    }

    /// Sign-and-magnitude integer: first bit is the sign (1 = negative), the
    /// remaining `bits - 1` bits the magnitude. Not two's complement.
    pub fn read_signed(&mut self, bits: usize) -> Result<i64, DecodeError> {
        if bits == 0 {
            return Ok(0);
        }
        if bits > 64 {
            return Err(DecodeError::CorruptData(format!("bit width {} exceeds 64", bits)));
        }
        if bits > self.remaining_bits() {
            return Err(DecodeError::UnexpectedEnd);
        }

        let negative = self.read_unsigned(1)? == 1;
        let magnitude = self.read_unsigned(bits - 1)? as i64;

        Ok(if negative { -magnitude } else { magnitude })
    }

    /// `count` consecutive unsigned values of width `bits`. A zero width
    /// yields zeros without consuming input.
    pub fn read_unsigned_block(&mut self, bits: usize, count: usize) -> Result<Vec<u64>, DecodeError> {
        if bits == 0 {
            return Ok(vec![0; count]);
        }

        match bits.checked_mul(count) {
            Some(total) if total <= self.remaining_bits() => {}
            _ => return Err(DecodeError::UnexpectedEnd),
        }

        (0..count).map(|_| self.read_unsigned(bits)).collect()
    }
}

/// Bounded big-endian cursor over one section's content. Reads never cross
/// the declared section boundary.
pub(crate) struct Buffer<'a> {
    bytes: &'a [u8],
    pos: usize,
    section: u8,
}

impl<'a> Buffer<'a> {
    pub(crate) fn new(bytes: &'a [u8], section: u8) -> Self {
        Self {
            bytes,
            pos: 0,
            section,
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn read<T: EndianRead>(&mut self) -> Result<T, FormatError> {
        let bytes = self.take(T::SIZE)?;
        Ok(T::from_be_slice(bytes))
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if len > self.remaining() {
            return Err(FormatError::SectionLengthMismatch {
                section: self.section,
                declared: self.bytes.len(),
                consumed: self.pos + len,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        slice
    }

    /// Every declared octet must have been consumed.
    pub(crate) fn finish(self) -> Result<(), FormatError> {
        if self.pos != self.bytes.len() {
            return Err(FormatError::SectionLengthMismatch {
                section: self.section,
                declared: self.bytes.len(),
                consumed: self.pos,
            });
        }
        Ok(())
    }
}

pub(crate) trait EndianRead: Sized {
    const SIZE: usize;

    fn from_be_slice(bytes: &[u8]) -> Self;
}

macro_rules! endian_impl {
    ($($ty:ty),*) => ($(
        impl EndianRead for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn from_be_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                <$ty>::from_be_bytes(buf)
            }
        }
    )*);
}

endian_impl! { u8, u16, u32, u64, f32 }
