//! Digit-level helpers for Montgomery arithmetic.

use crate::Digit;

/// Inverse of odd number modulo power of two: $e^{-1}\text{ mod }2^{w}$
///
/// This has $\mathcal{O}(\log n)$ loops in `Digit::BITS`:
/// 5 iterations for u32, 6 iterations for u64.
///
/// Source: Fig. 1 from
/// [GCD-Free Algorithms for Computing Modular Inverses (2003)][joy-paillier]
///
/// Note that this source is highly confusing! What they mean to say
/// is to iterate $y \leftarrow y(2 - ey)$ in $\mathbb{Z}/2^{|f|}$,
/// where the output is an inverse of $e$ modulo $2^{2i}$.
///
/// In other words, the $\text{mod }2^i$ is a typo, and should be $\text{mod }2^{|f|}$.
///
/// Cf. [Crypto StackExchange][cse].
///
/// [joy-paillier]: https://api.semanticscholar.org/CorpusID:17736455
/// [cse]: https://crypto.stackexchange.com/a/47496
pub(crate) fn e_inverse_digit_joye_paillier(e: Digit) -> Digit {
    debug_assert_ne!(e & 1, 0);

    // log_2(32) = 5, log_2(64) = 6.
    #[allow(non_snake_case)]
    let T = Digit::BITS.trailing_zeros();
    let mut y: Digit = 1;
    let two: Digit = 2;

    for _ in 1..=T {
        y = y.wrapping_mul(two.wrapping_sub(e.wrapping_mul(y)));
    }
    y
}

/// $n_0' = -m_0^{-1}\text{ (mod }2^{w}\text{)}$, for the lowest digit $m_0$ of an odd modulus.
pub(crate) fn digit_minus_inverse(m0: Digit) -> Digit {
    e_inverse_digit_joye_paillier(m0).wrapping_neg()
}
