//! Montgomery multiplication, squaring and reduction kernels.
//!
//! All kernels take `m` (the modulus digits, length `n`), `n0 = -m^{-1} mod 2^w`
//! and a work area of at least `2n + 2` digits. Inputs are reduced (`< m`),
//! outputs are reduced. Operation count and memory access depend only on `n`:
//! the final subtraction is done by masking, see [`crate::ct::reduce_once`].
//!
//! Two families are implemented:
//!
//! - CIOS, "coarsely integrated operand scanning": interleaves multiplication
//!   and reduction row by row, needs only `n + 2` digits of work.
//! - SOS, "separated operand scanning": full product (or dedicated square,
//!   which saves about half the digit products), then a separate reduction.
//!
//! Reference: [Analyzing and comparing Montgomery multiplication algorithms (1996)][koc].
//!
//! [koc]: https://api.semanticscholar.org/CorpusID:2311143

use crate::{Digit, DoubleDigit};
use crate::arithmetic::multiply::{mac_digit, mul_into, sqr_into};
use crate::ct;

/// `acc = acc * b * R^{-1} mod m`
pub(crate) type MulFn = fn(acc: &mut [Digit], b: &[Digit], m: &[Digit], n0: Digit, work: &mut [Digit]);
/// `acc = acc^2 * R^{-1} mod m`
pub(crate) type SqrFn = fn(acc: &mut [Digit], m: &[Digit], n0: Digit, work: &mut [Digit]);
/// `r = t * R^{-1} mod m`, for `t < m * R` of length `2n`; `t` is clobbered.
pub(crate) type ReduceFn = fn(r: &mut [Digit], t: &mut [Digit], m: &[Digit], n0: Digit);

/// Which kernel family an engine runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KernelKind {
    Cios,
    Sos,
}

/// What the target offers, as far as kernel choice is concerned.
///
/// This is a `no_std` crate, so features are known at compile time only.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CpuFeatures {
    /// Fast full-width multiplication with flag-free carry chains
    /// (`bmi2` on x86_64, always on aarch64).
    pub wide_multiply: bool,
}

impl CpuFeatures {
    pub fn detect() -> Self {
        Self {
            wide_multiply: cfg!(any(
                all(target_arch = "x86_64", target_feature = "bmi2"),
                target_arch = "aarch64",
            )),
        }
    }
}

/// From this many digits on, a separate squaring pays off when the target
/// multiplies fast.
pub const SOS_THRESHOLD: usize = 8;

/// The kernel set of one engine; chosen once, when the engine is created.
#[derive(Clone, Copy)]
pub struct Kernels {
    pub kind: KernelKind,
    pub(crate) mul: MulFn,
    pub(crate) sqr: SqrFn,
    pub(crate) reduce: ReduceFn,
}

impl core::fmt::Debug for Kernels {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Kernels").field("kind", &self.kind).finish()
    }
}

impl Kernels {
    pub const CIOS: Kernels = Kernels { kind: KernelKind::Cios, mul: mul_cios, sqr: sqr_cios, reduce: redc };
    pub const SOS: Kernels = Kernels { kind: KernelKind::Sos, mul: mul_sos, sqr: sqr_sos, reduce: redc };

    pub fn select(limbs: usize, features: CpuFeatures) -> Self {
        if features.wide_multiply && limbs >= SOS_THRESHOLD {
            Self::SOS
        } else {
            Self::CIOS
        }
    }
}

/// Montgomery reduction, HAC 14.32, with a running carry `hi` beyond the top digit.
pub(crate) fn redc(r: &mut [Digit], t: &mut [Digit], m: &[Digit], n0: Digit) {
    let n = m.len();
    debug_assert!(t.len() >= 2 * n);

    let mut hi: Digit = 0;
    for i in 0..n {
        let u = t[i].wrapping_mul(n0);
        let carry = mac_digit(&mut t[i..i + n], m, u);
        let s = t[i + n] as DoubleDigit + carry as DoubleDigit + hi as DoubleDigit;
        t[i + n] = s as Digit;
        hi = (s >> Digit::BITS) as Digit;
    }

    ct::reduce_once(r, &mut t[n..2 * n], hi, m);
}

fn mul_cios(acc: &mut [Digit], b: &[Digit], m: &[Digit], n0: Digit, work: &mut [Digit]) {
    let n = m.len();
    let t = &mut work[..n + 2];
    t.iter_mut().for_each(|digit| *digit = 0);

    for i in 0..n {
        // t += acc[i] * b
        let carry = mac_digit(&mut t[..n], b, acc[i]);
        let (sum, overflow) = t[n].overflowing_add(carry);
        t[n] = sum;
        t[n + 1] = overflow as Digit;

        // t = (t + u * m) / B
        let u = t[0].wrapping_mul(n0);
        let s = t[0] as DoubleDigit + (u as DoubleDigit) * (m[0] as DoubleDigit);
        let mut carry = s >> Digit::BITS;
        for j in 1..n {
            let s = t[j] as DoubleDigit + (u as DoubleDigit) * (m[j] as DoubleDigit) + carry;
            t[j - 1] = s as Digit;
            carry = s >> Digit::BITS;
        }
        let s = t[n] as DoubleDigit + carry;
        t[n - 1] = s as Digit;
        t[n] = t[n + 1] + (s >> Digit::BITS) as Digit;
    }

    let carry = t[n];
    ct::reduce_once(acc, &mut t[..n], carry, m);
}

fn sqr_cios(acc: &mut [Digit], m: &[Digit], n0: Digit, work: &mut [Digit]) {
    let n = m.len();
    let (work, copy) = work.split_at_mut(n + 2);
    let copy = &mut copy[..n];
    copy.copy_from_slice(acc);
    mul_cios(acc, copy, m, n0, work);
}

fn mul_sos(acc: &mut [Digit], b: &[Digit], m: &[Digit], n0: Digit, work: &mut [Digit]) {
    let n = m.len();
    let t = &mut work[..2 * n];
    mul_into(t, acc, b);
    redc(acc, t, m, n0);
}

fn sqr_sos(acc: &mut [Digit], m: &[Digit], n0: Digit, work: &mut [Digit]) {
    let n = m.len();
    let t = &mut work[..2 * n];
    sqr_into(t, acc);
    redc(acc, t, m, n0);
}
