use core::ops::Add;

use alloc::vec;

use crate::{BigNumber, Digit, DoubleDigit};

//
// from num-bigint
//

// Add with carry:
#[inline]
pub fn adc(a: Digit, b: Digit, acc: &mut DoubleDigit) -> Digit {
    *acc += a as DoubleDigit;
    *acc += b as DoubleDigit;
    let lo = *acc as Digit;
    *acc >>= Digit::BITS;
    lo
}

/// Two argument addition of raw slices:
/// a += b
///
/// The caller _must_ ensure that a is big enough to store the result - typically this means
/// resizing a to max(a.len(), b.len()) + 1, to fit a possible carry.
///
/// Runs over all of `a`, the returned carry is 0 or 1.
pub(crate) fn add_assign_carry(a: &mut [Digit], b: &[Digit]) -> Digit {
    debug_assert!(a.len() >= b.len());

    let mut carry = 0;
    let (a_lo, a_hi) = a.split_at_mut(b.len());

    for (a, b) in a_lo.iter_mut().zip(b) {
        *a = adc(*a, *b, &mut carry);
    }

    for a in a_hi {
        *a = adc(*a, 0, &mut carry);
    }

    carry as Digit
}

/// r = a + b for equal-length slices, returns the carry.
pub(crate) fn add_into(r: &mut [Digit], a: &[Digit], b: &[Digit]) -> Digit {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(r.len(), a.len());

    let mut carry = 0;
    for ((r, a), b) in r.iter_mut().zip(a).zip(b) {
        *r = adc(*a, *b, &mut carry);
    }
    carry as Digit
}

/// |a| + |b|
pub(crate) fn add_magnitudes(a: &[Digit], b: &[Digit]) -> BigNumber {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut sum = vec![0; long.len() + 1];
    sum[..long.len()].copy_from_slice(long);
    add_assign_carry(&mut sum, short);
    super::from_vec(sum)
}

impl BigNumber {
    /// Signed sum, with just enough room.
    pub fn add(&self, summand: &Self) -> Self {
        if self.sign == summand.sign {
            let mut sum = add_magnitudes(self.digits(), summand.digits());
            sum.sign = self.sign;
            sum.normalize();
            sum
        } else {
            // a + (-b) = a - b
            self.sub(&summand.negated())
        }
    }

    /// Sum with a single digit.
    pub fn add_digit(&self, digit: Digit) -> Self {
        self.add(&BigNumber::from_digit(digit))
    }
}

impl Add for &BigNumber {
    type Output = BigNumber;

    fn add(self, summand: Self) -> Self::Output {
        BigNumber::add(self, summand)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const M: Digit = Digit::MAX;

    #[test]
    fn carry_propagates_through_all_digits() {
        let mut a = [M, M, M, 0];
        let carry = add_assign_carry(&mut a, &[1]);
        assert_eq!(carry, 0);
        assert_eq!(a, [0, 0, 0, 1]);

        let mut a = [M, M];
        assert_eq!(add_assign_carry(&mut a, &[1, 0]), 1);
        assert_eq!(a, [0, 0]);
    }

    #[test]
    fn signed_sums() {
        let a = BigNumber::from_digits(&[M, M]);
        let b = BigNumber::from_digit(1);
        assert_eq!(&a + &b, BigNumber::from_digits(&[0, 0, 1]));

        // mixed signs
        assert_eq!(&a + &b.negated(), BigNumber::from_digits(&[M - 1, M]));
        assert_eq!(&a.negated() + &b, BigNumber::from_digits(&[M - 1, M]).negated());
        assert!((&a + &a.negated()).is_zero());
    }
}
