use core::{cmp::Ordering, ops::Sub};

use alloc::vec::Vec;

use crate::{BigNumber, Digit, SignedDoubleDigit};

/// Subtract with borrow:
#[inline]
pub fn sbb(a: Digit, b: Digit, acc: &mut SignedDoubleDigit) -> Digit {
    *acc += a as SignedDoubleDigit;
    *acc -= b as SignedDoubleDigit;
    let lo = *acc as Digit;
    *acc >>= Digit::BITS;
    lo
}

/// a -= b, over all of `a`, returns the borrow (0 or 1).
pub(crate) fn sub_assign_borrow(a: &mut [Digit], b: &[Digit]) -> Digit {
    debug_assert!(a.len() >= b.len());
    let mut borrow = 0;

    let (a_lo, a_hi) = a.split_at_mut(b.len());

    for (a, b) in a_lo.iter_mut().zip(b) {
        *a = sbb(*a, *b, &mut borrow);
    }

    for a in a_hi {
        *a = sbb(*a, 0, &mut borrow);
    }

    (borrow & 1) as Digit
}

/// r = a - b for equal-length slices, returns the borrow (0 or 1).
pub(crate) fn sub_into(r: &mut [Digit], a: &[Digit], b: &[Digit]) -> Digit {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(r.len(), a.len());

    let mut borrow = 0;
    for ((r, a), b) in r.iter_mut().zip(a).zip(b) {
        *r = sbb(*a, *b, &mut borrow);
    }
    (borrow & 1) as Digit
}

/// |a| - |b|, requires |a| >= |b|.
pub(crate) fn sub_magnitudes(a: &[Digit], b: &[Digit]) -> BigNumber {
    let mut difference: Vec<Digit> = a.to_vec();
    let len = crate::numbers::significant_len(b);
    let borrow = sub_assign_borrow(&mut difference, &b[..len]);
    debug_assert_eq!(borrow, 0);
    super::from_vec(difference)
}

impl BigNumber {
    /// Signed difference, with just enough room.
    pub fn sub(&self, subtrahend: &Self) -> Self {
        if self.sign != subtrahend.sign {
            // a - (-b) = a + b
            return self.add(&subtrahend.negated());
        }

        let mut difference = match self.cmp_magnitude(subtrahend) {
            Ordering::Less => {
                let mut difference = sub_magnitudes(subtrahend.digits(), self.digits());
                difference.sign = self.sign.flip();
                difference
            }
            _ => {
                let mut difference = sub_magnitudes(self.digits(), subtrahend.digits());
                difference.sign = self.sign;
                difference
            }
        };
        difference.normalize();
        difference
    }

    /// Difference with a single digit.
    pub fn sub_digit(&self, digit: Digit) -> Self {
        self.sub(&BigNumber::from_digit(digit))
    }
}

impl Sub for &BigNumber {
    type Output = BigNumber;

    fn sub(self, subtrahend: Self) -> Self::Output {
        BigNumber::sub(self, subtrahend)
    }
}
