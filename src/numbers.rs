//! Signed big numbers with a fixed capacity.
//!
//! A [`BigNumber`] is a sign, plus a little-endian vector of [`Digit`]s (limbs).
//! The vector's length is the number's *room*, fixed at creation; the number
//! of significant digits is its *size*. The size is always the true significant
//! length (at least one digit, zero being a single zero digit), so two equal
//! values compare equal regardless of their room.
//!
//! Only what RSA and Montgomery arithmetic need is implemented, the arithmetic
//! itself lives in [`crate::arithmetic`].

use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::{Digit, Error, Result};
use crate::digit::{digits_for_bits, DIGIT_BITS};

mod trait_implementations;

const DIGIT_BYTES: usize = DIGIT_BITS / 8;

/// Sign of a [`BigNumber`]. Zero is always positive.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub fn flip(self) -> Self {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }
}

/// Signed integer with a fixed room of [`Digit`]s.
///
/// Invariants:
/// - `digits.len()` is the room, it never changes after construction
/// - `1 <= size <= room`, and `digits[size..]` are zero
/// - `size` is the significant length, zero has `size == 1`
/// - zero has positive sign
#[derive(Clone)]
pub struct BigNumber {
    pub(crate) sign: Sign,
    pub(crate) digits: Vec<Digit>,
    pub(crate) size: usize,
}

/// Number of significant digits of a little-endian slice, at least one.
pub(crate) fn significant_len(digits: &[Digit]) -> usize {
    digits.iter()
        .rposition(|&digit| digit != 0)
        .map(|i| i + 1)
        .unwrap_or(1)
}

/// Bit length of a little-endian slice (zero has bit length zero).
pub(crate) fn bit_len(digits: &[Digit]) -> usize {
    match digits.iter().rposition(|&digit| digit != 0) {
        Some(i) => i * DIGIT_BITS + (DIGIT_BITS - digits[i].leading_zeros() as usize),
        None => 0,
    }
}

/// Bit `i` of a little-endian slice, zero beyond its end.
#[inline]
pub(crate) fn bit(digits: &[Digit], i: usize) -> Digit {
    match digits.get(i / DIGIT_BITS) {
        Some(digit) => (digit >> (i % DIGIT_BITS)) & 1,
        None => 0,
    }
}

// c'tors and such
impl BigNumber {
    /// Zero, with room for `room` digits.
    ///
    /// Fails with `BadArgument` if `room` is zero.
    pub fn new(room: usize) -> Result<Self> {
        if room == 0 {
            return Err(Error::BadArgument);
        }
        Ok(Self::zero_with_room(room))
    }

    /// Zero, with room for a `bits`-bit number.
    pub fn with_bits(bits: usize) -> Result<Self> {
        Self::new(digits_for_bits(bits))
    }

    pub(crate) fn zero_with_room(room: usize) -> Self {
        let room = room.max(1);
        let mut digits = Vec::with_capacity(room);
        digits.resize(room, 0);
        Self { sign: Sign::Positive, digits, size: 1 }
    }

    pub fn zero() -> Self {
        Self::zero_with_room(1)
    }

    pub fn one() -> Self {
        Self::from_digit(1)
    }

    pub fn from_digit(digit: Digit) -> Self {
        let mut number = Self::zero_with_room(1);
        number.digits[0] = digit;
        number
    }

    /// Positive number from little-endian digits, room is the slice length.
    pub fn from_digits(digits: &[Digit]) -> Self {
        let mut number = Self::zero_with_room(digits.len());
        number.digits[..digits.len()].copy_from_slice(digits);
        number.normalize();
        number
    }

    /// Positive number from big-endian bytes, room is just enough for the bytes.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let room = (bytes.len() + DIGIT_BYTES - 1) / DIGIT_BYTES;
        let mut number = Self::zero_with_room(room);
        number.fill_be_bytes(bytes);
        number
    }

    /// Replace value, keeping room.
    ///
    /// Fails with `SizeError` if the significant digits exceed the room,
    /// in which case `self` is unchanged.
    /// An empty slice sets zero.
    pub fn set_digits(&mut self, sign: Sign, digits: &[Digit]) -> Result<()> {
        let size = significant_len(digits).min(digits.len());
        if size > self.room() {
            return Err(Error::SizeError);
        }
        self.digits.iter_mut().for_each(|digit| *digit = 0);
        self.digits[..size].copy_from_slice(&digits[..size]);
        self.sign = sign;
        self.normalize();
        Ok(())
    }

    /// Replace value by the positive number with these big-endian bytes, keeping room.
    pub fn set_be_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let leading_zeros = bytes.iter().take_while(|&&byte| byte == 0).count();
        let bytes = &bytes[leading_zeros..];
        if (bytes.len() + DIGIT_BYTES - 1) / DIGIT_BYTES > self.room() {
            return Err(Error::SizeError);
        }
        self.digits.iter_mut().for_each(|digit| *digit = 0);
        self.fill_be_bytes(bytes);
        Ok(())
    }

    /// Copy of this value with at least `room` digits of room.
    pub fn resized(&self, room: usize) -> Result<Self> {
        let mut resized = Self::zero_with_room(room.max(self.size));
        resized.set_digits(self.sign, self.digits())?;
        Ok(resized)
    }

    fn fill_be_bytes(&mut self, bytes: &[u8]) {
        for (i, chunk) in bytes.rchunks(DIGIT_BYTES).enumerate() {
            let mut digit: Digit = 0;
            for &byte in chunk {
                digit = (digit << 8) | byte as Digit;
            }
            self.digits[i] = digit;
        }
        self.sign = Sign::Positive;
        self.normalize();
    }

    /// Recompute the size after writing into the digits.
    pub(crate) fn normalize(&mut self) {
        self.size = significant_len(&self.digits);
        if self.size == 1 && self.digits[0] == 0 {
            self.sign = Sign::Positive;
        }
    }
}

/// ## Octet-string codec
impl BigNumber {
    /// Minimal big-endian encoding of the magnitude (empty for zero).
    pub fn to_be_bytes(&self) -> Vec<u8> {
        let len = self.byte_len();
        let mut bytes = Vec::with_capacity(len);
        bytes.resize(len, 0);
        // cannot fail, the buffer has exactly the right length
        let _ = self.write_be_bytes(&mut bytes);
        bytes
    }

    /// Fixed-length big-endian encoding of the magnitude, left-padded with zeros.
    ///
    /// Fails with `SizeError` if the value does not fit.
    pub fn write_be_bytes(&self, out: &mut [u8]) -> Result<()> {
        if self.byte_len() > out.len() {
            return Err(Error::SizeError);
        }
        for (i, byte) in out.iter_mut().rev().enumerate() {
            *byte = self.digits
                .get(i / DIGIT_BYTES)
                .map(|digit| (digit >> (8 * (i % DIGIT_BYTES))) as u8)
                .unwrap_or(0);
        }
        Ok(())
    }

    pub fn byte_len(&self) -> usize {
        (self.bit_len() + 7) / 8
    }
}

/// ## Accessors
impl BigNumber {
    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// Number of significant digits.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Capacity in digits.
    pub fn room(&self) -> usize {
        self.digits.len()
    }

    /// The significant digits, little-endian.
    pub fn digits(&self) -> &[Digit] {
        &self.digits[..self.size]
    }

    /// All digits up to the room, little-endian.
    pub fn padded_digits(&self) -> &[Digit] {
        &self.digits
    }

    pub fn bit_len(&self) -> usize {
        bit_len(self.digits())
    }

    /// Bit `i` of the magnitude.
    pub fn bit(&self, i: usize) -> bool {
        bit(&self.digits, i) == 1
    }

    pub fn is_zero(&self) -> bool {
        self.size == 1 && self.digits[0] == 0
    }

    pub fn is_one(&self) -> bool {
        self.size == 1 && self.digits[0] == 1 && self.sign == Sign::Positive
    }

    pub fn is_odd(&self) -> bool {
        self.digits[0] & 1 == 1
    }

    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Negative
    }

    pub fn is_positive(&self) -> bool {
        self.sign == Sign::Positive && !self.is_zero()
    }

    /// Compare absolute values.
    pub fn cmp_magnitude(&self, other: &Self) -> Ordering {
        cmp_digits(self.digits(), other.digits())
    }

    /// Same value, opposite sign (zero stays positive).
    pub fn negated(&self) -> Self {
        let mut negated = self.clone();
        negated.sign = negated.sign.flip();
        negated.normalize();
        negated
    }

    pub fn abs(&self) -> Self {
        let mut abs = self.clone();
        abs.sign = Sign::Positive;
        abs
    }
}

/// Compare little-endian digit slices of possibly different lengths by value.
pub(crate) fn cmp_digits(a: &[Digit], b: &[Digit]) -> Ordering {
    let (a, b) = (&a[..significant_len(a)], &b[..significant_len(b)]);
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        not_equal => return not_equal,
    }
    for (x, y) in a.iter().rev().zip(b.iter().rev()) {
        match x.cmp(y) {
            Ordering::Equal => (),
            not_equal => return not_equal,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn size() {
        let x = BigNumber::from_digits(&[0, 1, 0, 2, 0, 0]);
        assert_eq!(x.size(), 4);
        assert_eq!(x.room(), 6);

        let x = BigNumber::from_digits(&[0, 0, 0]);
        assert_eq!(x.size(), 1);
        assert!(x.is_zero());
    }

    #[test]
    fn zero_room_is_rejected() {
        assert_eq!(BigNumber::new(0).err(), Some(Error::BadArgument));
    }

    #[test]
    fn set_digits_respects_room() {
        let mut x = BigNumber::new(2).unwrap();
        x.set_digits(Sign::Positive, &[1, 2, 0, 0]).unwrap();
        assert_eq!(x.digits(), &[1, 2]);

        assert_eq!(x.set_digits(Sign::Positive, &[1, 2, 3]), Err(Error::SizeError));
        // unchanged on failure
        assert_eq!(x.digits(), &[1, 2]);
    }

    #[test]
    fn set_digits_from_empty_slice() {
        let mut x = BigNumber::from_digits(&[5, 6]);
        x.set_digits(Sign::Negative, &[]).unwrap();
        assert!(x.is_zero());
        assert_eq!(x.sign(), Sign::Positive);
        assert_eq!(x.room(), 2);
    }

    #[test]
    fn negative_zero_is_positive() {
        let mut x = BigNumber::new(1).unwrap();
        x.set_digits(Sign::Negative, &[0]).unwrap();
        assert_eq!(x.sign(), Sign::Positive);
        assert_eq!(BigNumber::zero().negated().sign(), Sign::Positive);
    }

    #[test]
    fn bytes() {
        let bytes = hex!("0102030405060708090a0b0c0d0e0f10ff");
        let x = BigNumber::from_be_bytes(&bytes);
        assert_eq!(x.bit_len(), 17 * 8 - 7);
        assert_eq!(x.to_be_bytes(), bytes.to_vec());

        let mut padded = [0xAAu8; 20];
        x.write_be_bytes(&mut padded).unwrap();
        assert_eq!(&padded[..3], &[0, 0, 0]);
        assert_eq!(&padded[3..], &bytes[..]);

        let mut short = [0u8; 16];
        assert_eq!(x.write_be_bytes(&mut short), Err(Error::SizeError));

        // leading zeros are not part of the value
        let y = BigNumber::from_be_bytes(&hex!("000000ff"));
        assert_eq!(y, BigNumber::from_digit(0xff));
        assert!(BigNumber::from_be_bytes(&[]).is_zero());
        assert!(BigNumber::zero().to_be_bytes().is_empty());

        let mut small = BigNumber::new(1).unwrap();
        assert_eq!(small.set_be_bytes(&bytes), Err(Error::SizeError));
        small.set_be_bytes(&hex!("00000000000000000000000000000000000042")).unwrap();
        assert_eq!(small, BigNumber::from_digit(0x42));
    }

    #[test]
    fn bits() {
        let x = BigNumber::from_digits(&[0b1010, 1]);
        assert_eq!(x.bit_len(), DIGIT_BITS + 1);
        assert!(!x.bit(0));
        assert!(x.bit(1));
        assert!(x.bit(DIGIT_BITS));
        assert!(!x.bit(10 * DIGIT_BITS));
        assert_eq!(BigNumber::zero().bit_len(), 0);
    }

    #[test]
    fn magnitude_ordering() {
        let small = BigNumber::from_digits(&[Digit::MAX, 0, 0]);
        let large = BigNumber::from_digits(&[0, 1]);
        assert_eq!(small.cmp_magnitude(&large), Ordering::Less);
        assert_eq!(large.negated().cmp_magnitude(&large), Ordering::Equal);
    }
}
