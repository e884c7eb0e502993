use core::ops::Mul;

use alloc::vec;

use crate::{BigNumber, Digit, DoubleDigit, Sign};
use super::add::adc;

/// acc += b * c for equal-length `acc` and `b`, returns the carry digit.
#[inline]
pub(crate) fn mac_digit(acc: &mut [Digit], b: &[Digit], c: Digit) -> Digit {
    debug_assert_eq!(acc.len(), b.len());

    let mut carry: DoubleDigit = 0;
    for (a, &b) in acc.iter_mut().zip(b) {
        // (B - 1) + (B - 1)^2 + (B - 1) = B^2 - 1 fits
        let t = (*a as DoubleDigit) + (b as DoubleDigit) * (c as DoubleDigit) + carry;
        *a = t as Digit;
        carry = t >> Digit::BITS;
    }
    carry as Digit
}

/// Schoolbook multiplication, `r[..a.len() + b.len()] = a * b`.
///
/// Operation count depends only on the lengths.
pub(crate) fn mul_into(r: &mut [Digit], a: &[Digit], b: &[Digit]) {
    let len = a.len() + b.len();
    debug_assert!(r.len() >= len);
    r[..len].iter_mut().for_each(|digit| *digit = 0);

    for (i, &a) in a.iter().enumerate() {
        let carry = mac_digit(&mut r[i..i + b.len()], b, a);
        r[i + b.len()] = carry;
    }
}

/// Squaring, `r[..2 * a.len()] = a * a`.
///
/// Off-diagonal products are computed once and doubled, then the
/// diagonal is added.
pub(crate) fn sqr_into(r: &mut [Digit], a: &[Digit]) {
    let n = a.len();
    debug_assert!(r.len() >= 2 * n);
    r[..2 * n].iter_mut().for_each(|digit| *digit = 0);

    for i in 0..n {
        let carry = mac_digit(&mut r[2 * i + 1..i + n], &a[i + 1..], a[i]);
        r[i + n] = carry;
    }

    // double
    let mut top = 0;
    for digit in r[..2 * n].iter_mut() {
        let new_top = *digit >> (Digit::BITS - 1);
        *digit = (*digit << 1) | top;
        top = new_top;
    }
    debug_assert_eq!(top, 0);

    // diagonal
    let mut carry: DoubleDigit = 0;
    for (i, &a) in a.iter().enumerate() {
        let square = (a as DoubleDigit) * (a as DoubleDigit);
        r[2 * i] = adc(r[2 * i], square as Digit, &mut carry);
        r[2 * i + 1] = adc(r[2 * i + 1], (square >> Digit::BITS) as Digit, &mut carry);
    }
    debug_assert_eq!(carry, 0);
}

impl BigNumber {
    /// Signed product, room is `self.size() + factor.size()`.
    pub fn mul(&self, factor: &Self) -> Self {
        let (a, b) = (self.digits(), factor.digits());
        let mut product = vec![0; a.len() + b.len()];
        mul_into(&mut product, a, b);

        let mut product = super::from_vec(product);
        product.sign = if self.sign == factor.sign { Sign::Positive } else { Sign::Negative };
        product.normalize();
        product
    }

    pub fn mul_digit(&self, digit: Digit) -> Self {
        self.mul(&BigNumber::from_digit(digit))
    }
}

impl Mul for &BigNumber {
    type Output = BigNumber;

    fn mul(self, factor: Self) -> Self::Output {
        BigNumber::mul(self, factor)
    }
}
