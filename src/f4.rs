//! All things $F4$

use crate::{BigNumber, Digit};

/// The fourth Fermat prime, $2^{16} + 1$, the customary public exponent $e$.
///
/// An example recommendation to use it is RFC 4871: <https://www.ietf.org/rfc/rfc4871.txt>.
/// Any odd $e \ge 3$ is accepted by key generation; this is the default.
pub struct F4;

impl F4 {
    pub const DIGIT: Digit = 0x1_0001;
    pub const BITS: usize = 17;

    pub fn exponent() -> BigNumber {
        BigNumber::from_digit(Self::DIGIT)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fermat() {
        let e = F4::exponent();
        assert_eq!(e.bit_len(), F4::BITS);
        assert_eq!(e, BigNumber::one().shl_bits(16).add_digit(1));
        assert!(crate::prime::is_small_prime(F4::DIGIT));
    }
}
