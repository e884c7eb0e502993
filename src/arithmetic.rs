//! Arithmetic on little-endian digit slices, and on [`BigNumber`]s built from them.
//!
//! The slice functions are the building blocks of the Montgomery kernels:
//! they loop over the full lengths they are handed, without early exits.
//! The [`BigNumber`] operations (signed addition, subtraction, multiplication,
//! division with remainder, gcd, inverses) are used for setup work on public
//! or freshly generated values: key setup, key generation, key validation.

use crate::BigNumber;

pub(crate) mod add;
pub(crate) mod subtract;
pub(crate) mod multiply;
pub(crate) mod divide;
pub(crate) mod shift;
pub(crate) mod montgomery;
pub(crate) mod gcd;

/// Build a positive number from a scratch digit vector.
pub(crate) fn from_vec(digits: alloc::vec::Vec<crate::Digit>) -> BigNumber {
    let mut number = BigNumber {
        sign: crate::Sign::Positive,
        digits,
        size: 1,
    };
    if number.digits.is_empty() {
        number.digits.push(0);
    }
    number.normalize();
    number
}
