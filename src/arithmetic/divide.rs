use core::cmp::Ordering;

use alloc::{vec, vec::Vec};

use crate::{BigNumber, Digit, DoubleDigit, Error, Result, Sign, SignedDoubleDigit};
use crate::numbers::{cmp_digits, significant_len};
use super::{add::adc, shift::{shl_bits_into, shr_bits_assign}, subtract::sbb};

/// Divide a two digit numerator by a one digit divisor, returns quotient and remainder:
///
/// Note: the caller must ensure that both the quotient and remainder will fit into a single digit.
/// This is _not_ true for an arbitrary numerator/denominator.
///
/// (This function also matches what the x86 divide instruction does).
///
/// REMARK: This is Knuth's operation c0), "memorizing the multiplication table in reverse."
#[inline]
pub fn div_digits(hi: Digit, lo: Digit, divisor: Digit) -> (Digit, Digit) {
    debug_assert!(hi < divisor);

    let x = ((hi as DoubleDigit) << Digit::BITS) + lo as DoubleDigit;
    let divisor = divisor as DoubleDigit;

    let q = x / divisor;
    let r = x % divisor;

    (q as Digit, r as Digit)
}

/// Divides `number` in-place by `divisor`, returning the remainder.
pub(crate) fn div_rem_assign_digit(number: &mut [Digit], divisor: Digit) -> Digit {
    let mut remainder = 0;

    // run down the digits, dividing each by the divisor, while carrying along the remainder
    for digit in number.iter_mut().rev() {
        let (quotient, r) = div_digits(remainder, *digit, divisor);
        *digit = quotient;
        remainder = r;
    }

    remainder
}

/// Remainder of `number` modulo a single digit.
pub(crate) fn rem_digit(number: &[Digit], divisor: Digit) -> Digit {
    number.iter().rev().fold(0, |remainder, &digit| div_digits(remainder, digit, divisor).1)
}

/// "Multi-precision division of u by v".
///
/// Meaning: Return unique values `(q, r)` with `u = q*v + r`, and `0 <= r < v`.
///
/// Knuth, TAOCP vol 2 section 4.3.1, algorithm D(ivision). The divisor is
/// normalized so its leading digit has the top bit set; this shift has no
/// influence on `q`, and is reverted for `r` at the end.
///
/// `v` must be non-zero.
pub(crate) fn div_rem_digits(u: &[Digit], v: &[Digit]) -> (Vec<Digit>, Vec<Digit>) {
    let u = &u[..significant_len(u)];
    let v = &v[..significant_len(v)];
    debug_assert!(v[v.len() - 1] != 0);

    // Required or the q_len calculation below can underflow:
    match cmp_digits(u, v) {
        Ordering::Less => return (vec![0], u.to_vec()),
        Ordering::Equal => return (vec![1], vec![0]),
        Ordering::Greater => {}
    }

    if v.len() == 1 {
        let mut q = u.to_vec();
        let r = div_rem_assign_digit(&mut q, v[0]);
        return (q, vec![r]);
    }

    let n = v.len();
    let m = u.len() - n;
    let shift = v[n - 1].leading_zeros();

    let mut vn = vec![0; n];
    shl_bits_into(&mut vn, v, shift);
    let mut un = vec![0; u.len() + 1];
    let top = shl_bits_into(&mut un, u, shift);
    un[u.len()] = top;

    let mut q = vec![0; m + 1];
    let v_top = vn[n - 1] as DoubleDigit;
    let v_next = vn[n - 2] as DoubleDigit;

    for j in (0..=m).rev() {
        // estimate the quotient digit from the top two digits of the remainder
        let numerator = ((un[j + n] as DoubleDigit) << Digit::BITS) | un[j + n - 1] as DoubleDigit;
        let mut qhat = numerator / v_top;
        let mut rhat = numerator % v_top;

        while qhat > Digit::MAX as DoubleDigit
            || qhat * v_next > ((rhat << Digit::BITS) | un[j + n - 2] as DoubleDigit)
        {
            qhat -= 1;
            rhat += v_top;
            if rhat > Digit::MAX as DoubleDigit {
                break;
            }
        }

        // multiply and subtract
        let mut borrow: SignedDoubleDigit = 0;
        let mut carry: DoubleDigit = 0;
        for i in 0..n {
            let product = qhat * vn[i] as DoubleDigit + carry;
            carry = product >> Digit::BITS;
            un[i + j] = sbb(un[i + j], product as Digit, &mut borrow);
        }
        un[j + n] = sbb(un[j + n], carry as Digit, &mut borrow);

        // qhat was one too large (rare): add back
        if borrow != 0 {
            qhat -= 1;
            let mut carry: DoubleDigit = 0;
            for i in 0..n {
                un[i + j] = adc(un[i + j], vn[i], &mut carry);
            }
            un[j + n] = un[j + n].wrapping_add(carry as Digit);
        }

        q[j] = qhat as Digit;
    }

    let mut r = un;
    r.truncate(n);
    shr_bits_assign(&mut r, shift);
    (q, r)
}

impl BigNumber {
    /// Truncating division, `self = q * divisor + r` with `|r| < |divisor|`
    /// and `r` carrying the sign of `self`.
    ///
    /// Fails with `BadArgument` for a zero divisor.
    pub fn div_rem(&self, divisor: &Self) -> Result<(Self, Self)> {
        if divisor.is_zero() {
            return Err(Error::BadArgument);
        }
        let (q, r) = div_rem_digits(self.digits(), divisor.digits());

        let mut q = super::from_vec(q);
        q.sign = if self.sign == divisor.sign { Sign::Positive } else { Sign::Negative };
        q.normalize();

        let mut r = super::from_vec(r);
        r.sign = self.sign;
        r.normalize();

        Ok((q, r))
    }

    /// The canonical representative in `[0, modulus)`, for positive modulus.
    ///
    /// Fails with `BadArgument` for a zero or negative modulus.
    pub fn modulo(&self, modulus: &Self) -> Result<Self> {
        if !modulus.is_positive() {
            return Err(Error::BadArgument);
        }
        let (_, r) = self.div_rem(modulus)?;
        if r.is_negative() {
            Ok(modulus.sub(&r.negated()))
        } else {
            Ok(r)
        }
    }

    /// Remainder of the magnitude modulo a non-zero digit.
    pub fn rem_digit(&self, divisor: Digit) -> Result<Digit> {
        if divisor == 0 {
            return Err(Error::BadArgument);
        }
        Ok(rem_digit(self.digits(), divisor))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arithmetic::multiply::test::{MUL_TRIPLES, M, N1, N2};

    pub const DIV_REM_QUADRUPLES: &[(&[Digit], &[Digit], &[Digit], &[Digit])] = &[
        (&[1], &[2], &[], &[1]),
        (&[3], &[2], &[1], &[1]),
        (&[1, 1], &[2], &[M / 2 + 1], &[1]),
        (&[1, 1, 1], &[2], &[M / 2 + 1, M / 2 + 1], &[1]),
        (&[0, 1], &[N1], &[1], &[1]),
        (&[N1, N1], &[N2], &[2, 1], &[3]),
    ];

    #[test]
    fn test_div_rem() {
        for &(a, b, c) in MUL_TRIPLES {
            let a = BigNumber::from_digits(a);
            let b = BigNumber::from_digits(b);
            let c = BigNumber::from_digits(c);

            if !a.is_zero() {
                assert_eq!(c.div_rem(&a).unwrap(), (b.clone(), BigNumber::zero()));
            }
            if !b.is_zero() {
                assert_eq!(c.div_rem(&b).unwrap(), (a.clone(), BigNumber::zero()));
            }
        }

        for &(a, b, c, d) in DIV_REM_QUADRUPLES {
            let a = BigNumber::from_digits(a);
            let b = BigNumber::from_digits(b);
            let c = BigNumber::from_digits(c);
            let d = BigNumber::from_digits(d);

            assert_eq!(a.div_rem(&b).unwrap(), (c, d));
        }
    }

    #[test]
    fn knuth_add_back() {
        // operands for which the first quotient estimate is too large
        let u = BigNumber::from_digits(&[0, 0, M / 2 + 1, M / 2]);
        let v = BigNumber::from_digits(&[1, 0, M / 2 + 1]);
        let (q, r) = u.div_rem(&v).unwrap();
        assert!(r < v);
        assert_eq!(&(&q * &v) + &r, u);
    }

    #[test]
    fn multi_digit_division_matches_oracle() {
        use num_bigint::BigUint;
        let u = hex_literal::hex!(
            "c0ffee00deadbeef0123456789abcdeffedcba98765432100f1e2d3c4b5a6978
             8796a5b4c3d2e1f0ffffffffffffffff0000000000000001");
        let v = hex_literal::hex!("8000000000000001ffffffff00000000deadbeef");

        let (q, r) = BigNumber::from_be_bytes(&u).div_rem(&BigNumber::from_be_bytes(&v)).unwrap();
        let (u, v) = (BigUint::from_bytes_be(&u), BigUint::from_bytes_be(&v));
        assert_eq!(q.to_be_bytes(), (&u / &v).to_bytes_be());
        assert_eq!(r.to_be_bytes(), (&u % &v).to_bytes_be());
    }

    #[test]
    fn modulo_is_non_negative() {
        let seven = BigNumber::from_digit(7);
        let x = BigNumber::from_digit(10).negated();
        assert_eq!(x.modulo(&seven).unwrap(), BigNumber::from_digit(4));
        assert_eq!(BigNumber::from_digit(14).negated().modulo(&seven).unwrap(), BigNumber::zero());
        assert_eq!(x.modulo(&BigNumber::zero()), Err(Error::BadArgument));
        assert_eq!(x.modulo(&seven.negated()), Err(Error::BadArgument));
    }

    #[test]
    fn remainder_by_digit() {
        let x = BigNumber::from_digits(&[5, 1]);
        // 2^w + 5 mod 3 = (1 + 5) mod 3 for w even
        assert_eq!(x.rem_digit(3).unwrap(), 0);
        assert_eq!(x.rem_digit(0), Err(Error::BadArgument));
    }
}
