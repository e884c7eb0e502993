use core::{cmp::Ordering, fmt, ops::Neg};

use zeroize::Zeroize;

use super::{BigNumber, Sign};
use crate::Digit;
use crate::digit::DIGIT_BITS;

/// Equality of values; the room plays no role.
impl PartialEq for BigNumber {
    fn eq(&self, other: &Self) -> bool {
        self.sign == other.sign && self.digits() == other.digits()
    }
}

impl Eq for BigNumber {}

// Since we store little-endian, comparison needs to start at the last
// digit, instead of at the first as the derived / default implementation would.
impl Ord for BigNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.sign, other.sign) {
            (Sign::Positive, Sign::Negative) => Ordering::Greater,
            (Sign::Negative, Sign::Positive) => Ordering::Less,
            (Sign::Positive, Sign::Positive) => self.cmp_magnitude(other),
            (Sign::Negative, Sign::Negative) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for BigNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Digit> for BigNumber {
    fn from(digit: Digit) -> Self {
        Self::from_digit(digit)
    }
}

impl Default for BigNumber {
    fn default() -> Self {
        Self::zero()
    }
}

impl Neg for &BigNumber {
    type Output = BigNumber;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

/// Hexadecimal, most significant digit first.
impl fmt::Debug for BigNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BigNumber(")?;
        if self.is_negative() {
            f.write_str("-")?;
        }
        let digits = self.digits();
        write!(f, "0x{:X}", digits[digits.len() - 1])?;
        for digit in digits.iter().rev().skip(1) {
            write!(f, "{:0width$X}", digit, width = DIGIT_BITS / 4)?;
        }
        f.write_str(")")
    }
}

/// Wipes every digit up to the room; the value becomes zero.
impl Zeroize for BigNumber {
    fn zeroize(&mut self) {
        self.digits.as_mut_slice().zeroize();
        self.sign = Sign::Positive;
        self.size = 1;
    }
}
