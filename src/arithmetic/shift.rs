use core::ops::{Shl, Shr};

use alloc::vec;

use crate::{BigNumber, Digit};
use crate::digit::DIGIT_BITS;

/// `r = a << bits` for `bits < Digit::BITS`, over `a.len()` digits; returns the digit shifted out.
pub(crate) fn shl_bits_into(r: &mut [Digit], a: &[Digit], bits: u32) -> Digit {
    debug_assert!(bits < Digit::BITS);
    debug_assert!(r.len() >= a.len());
    if bits == 0 {
        r[..a.len()].copy_from_slice(a);
        return 0;
    }

    let mut carry = 0;
    for (r, &a) in r.iter_mut().zip(a) {
        *r = (a << bits) | carry;
        carry = a >> (Digit::BITS - bits);
    }
    carry
}

/// `a >>= bits` in place, for `bits < Digit::BITS`.
pub(crate) fn shr_bits_assign(a: &mut [Digit], bits: u32) {
    debug_assert!(bits < Digit::BITS);
    if bits == 0 {
        return;
    }

    let mut borrow = 0;
    for digit in a.iter_mut().rev() {
        let new_borrow = *digit << (Digit::BITS - bits);
        *digit = (*digit >> bits) | borrow;
        borrow = new_borrow;
    }
}

impl BigNumber {
    /// Compared to the slice functions, this is a growing shift.
    ///
    /// Note that "left" means "higher number".
    pub fn shl_bits(&self, bits: usize) -> Self {
        let n_digits = bits / DIGIT_BITS;
        let n_bits = (bits % DIGIT_BITS) as u32;

        let a = self.digits();
        let mut shifted = vec![0; a.len() + n_digits + 1];
        let carry = shl_bits_into(&mut shifted[n_digits..], a, n_bits);
        shifted[n_digits + a.len()] = carry;

        let mut shifted = super::from_vec(shifted);
        shifted.sign = self.sign;
        shifted.normalize();
        shifted
    }

    /// Shift of the magnitude; note that "right" means "lower number".
    pub fn shr_bits(&self, bits: usize) -> Self {
        let n_digits = bits / DIGIT_BITS;
        let a = self.digits();
        if n_digits >= a.len() {
            return BigNumber::zero();
        }

        let mut shifted = a[n_digits..].to_vec();
        shr_bits_assign(&mut shifted, (bits % DIGIT_BITS) as u32);

        let mut shifted = super::from_vec(shifted);
        shifted.sign = self.sign;
        shifted.normalize();
        shifted
    }
}

impl Shl<usize> for &BigNumber {
    type Output = BigNumber;

    fn shl(self, bits: usize) -> Self::Output {
        self.shl_bits(bits)
    }
}

impl Shr<usize> for &BigNumber {
    type Output = BigNumber;

    fn shr(self, bits: usize) -> Self::Output {
        self.shr_bits(bits)
    }
}
