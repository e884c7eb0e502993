//! Greatest common divisors and modular inverses.
//!
//! These run on key generation and validation inputs only, and are
//! not constant time.

use crate::{BigNumber, Error, Result};

impl BigNumber {
    /// Greatest common divisor of the magnitudes, by Euclid's algorithm.
    ///
    /// Fails with `BadArgument` if both are zero.
    pub fn gcd(&self, other: &Self) -> Result<Self> {
        if self.is_zero() && other.is_zero() {
            return Err(Error::BadArgument);
        }

        let mut a = self.abs();
        let mut b = other.abs();
        if a < b {
            core::mem::swap(&mut a, &mut b);
        }

        while !b.is_zero() {
            let (_, remainder) = a.div_rem(&b)?;
            a = b;
            b = remainder;
        }
        Ok(a)
    }

    /// Least common multiple of the magnitudes.
    pub fn lcm(&self, other: &Self) -> Result<Self> {
        let gcd = self.gcd(other)?;
        let (quotient, _) = self.abs().div_rem(&gcd)?;
        Ok(quotient.mul(&other.abs()))
    }

    /// $x^{-1}\text{ mod }m$, in $[0, m)$, by the extended Euclidean algorithm.
    ///
    /// Fails with `BadArgument` if the modulus is smaller than two, or the
    /// inverse does not exist.
    pub fn mod_inverse(&self, modulus: &Self) -> Result<Self> {
        if !modulus.is_positive() || modulus.is_one() {
            return Err(Error::BadArgument);
        }

        // invariant: old_r = old_s * self (mod modulus), r = s * self (mod modulus)
        let mut old_r = self.modulo(modulus)?;
        let mut r = modulus.clone();
        let mut old_s = BigNumber::one();
        let mut s = BigNumber::zero();

        while !r.is_zero() {
            let (quotient, remainder) = old_r.div_rem(&r)?;
            old_r = r;
            r = remainder;

            let new_s = old_s.sub(&quotient.mul(&s));
            old_s = s;
            s = new_s;
        }

        if !old_r.is_one() {
            return Err(Error::BadArgument);
        }
        old_s.modulo(modulus)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gcd() {
        let a = BigNumber::from_digit(48);
        let b = BigNumber::from_digit(18);
        assert_eq!(a.gcd(&b).unwrap(), BigNumber::from_digit(6));
        assert_eq!(b.gcd(&a).unwrap(), BigNumber::from_digit(6));
        assert_eq!(a.negated().gcd(&b).unwrap(), BigNumber::from_digit(6));
        assert_eq!(a.gcd(&BigNumber::zero()).unwrap(), a);
        assert_eq!(BigNumber::zero().gcd(&BigNumber::zero()), Err(Error::BadArgument));
    }

    #[test]
    fn lcm() {
        let a = BigNumber::from_digit(4);
        let b = BigNumber::from_digit(6);
        assert_eq!(a.lcm(&b).unwrap(), BigNumber::from_digit(12));
    }

    #[test]
    fn mod_inverse() {
        let three = BigNumber::from_digit(3);
        let eleven = BigNumber::from_digit(11);
        // 3 * 4 = 12 = 1 mod 11
        assert_eq!(three.mod_inverse(&eleven).unwrap(), BigNumber::from_digit(4));
        // negative inputs are reduced first: -3 = 8, 8 * 7 = 56 = 1 mod 11
        assert_eq!(three.negated().mod_inverse(&eleven).unwrap(), BigNumber::from_digit(7));

        let six = BigNumber::from_digit(6);
        let nine = BigNumber::from_digit(9);
        assert_eq!(six.mod_inverse(&nine), Err(Error::BadArgument));
        assert_eq!(six.mod_inverse(&BigNumber::one()), Err(Error::BadArgument));
    }

    #[test]
    fn f4_inverse_modulo_p_minus_one() {
        use num_bigint::BigUint;
        let p_minus_one = BigNumber::from_be_bytes(&crate::fixtures::P256).sub_digit(1);
        let e = BigNumber::from_digit(crate::F4::DIGIT);
        let d = e.mod_inverse(&p_minus_one).unwrap();

        let product = BigUint::from_bytes_be(&d.to_be_bytes()) * crate::F4::DIGIT;
        let modulus = BigUint::from_bytes_be(&p_minus_one.to_be_bytes());
        assert_eq!(product % modulus, BigUint::from(1u32));
    }
}
