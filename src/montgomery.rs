//! Montgomery engine: per-modulus constants plus a fixed kernel set.
//!
//! Montgomery representation of $[x]_{m} := x\text{ }(\text{mod }m)$ is
//! $[x \cdot R]_m$, where $R = 2^{wn}$, $w$ the digit size and $n$ the number
//! of digits of the modulus.
//!
//! The "trick" is that reduction of excess summands after multiplication can
//! be calculated by a simple right shift instead of an actual modular division.
//!
//! This needs to be balanced by the overhead of entering and leaving the
//! representation, which is negligible when calculating powers with large
//! exponents.
//!
//! An engine is allocated for a maximal modulus size ([`MontEngine::new`]),
//! then initialized with a concrete odd modulus ([`MontEngine::init`]), which
//! computes $n_0' = -m_0^{-1} \text{ mod } 2^w$, $R \text{ mod } m$ and
//! $R^2 \text{ mod } m$ once. The kernel set is chosen at allocation and never
//! changes afterwards; re-initializing with another modulus recomputes the
//! constants only.
//!
//! The slice methods (`*_assign`, `*_into`) are what exponentiation runs on:
//! they take a caller-supplied work area of [`MontEngine::work_len`] digits
//! and do not allocate. The [`BigNumber`] methods check their arguments and
//! allocate, for setup and tests.

use alloc::vec::Vec;
use core::cmp::Ordering;

use zeroize::Zeroize;

use crate::{BigNumber, Digit, Error, Result};
use crate::arithmetic::montgomery::digit_minus_inverse;
use crate::digit::{digits_for_bits, DIGIT_BITS};
use crate::numbers::cmp_digits;

pub mod kernels;
pub use kernels::{CpuFeatures, KernelKind, Kernels};

/// Reusable Montgomery context for one modulus at a time.
#[derive(Clone)]
pub struct MontEngine {
    max_bits: usize,
    /// Digits of the current modulus, 0 while uninitialized.
    limbs: usize,
    bits: usize,
    modulus: Vec<Digit>,
    n0: Digit,
    r: Vec<Digit>,
    r2: Vec<Digit>,
    kernels: Kernels,
}

impl MontEngine {
    /// Allocate an engine for moduli of up to `max_bits` bits.
    ///
    /// Fails with `BadArgument` if `max_bits` is zero.
    pub fn new(max_bits: usize) -> Result<Self> {
        let kernels = Kernels::select(digits_for_bits(max_bits), CpuFeatures::detect());
        Self::with_kernels(max_bits, kernels)
    }

    /// Allocate with an explicit kernel set.
    pub fn with_kernels(max_bits: usize, kernels: Kernels) -> Result<Self> {
        if max_bits == 0 {
            return Err(Error::BadArgument);
        }
        let room = digits_for_bits(max_bits);
        log::debug!("montgomery engine for {} bits uses {:?} kernels", max_bits, kernels.kind);

        let mut zeros = Vec::with_capacity(room);
        zeros.resize(room, 0);
        Ok(Self {
            max_bits,
            limbs: 0,
            bits: 0,
            modulus: zeros.clone(),
            n0: 0,
            r: zeros.clone(),
            r2: zeros,
            kernels,
        })
    }

    /// Digits of work area needed by an engine allocated for `max_bits`.
    pub fn scratch_len(max_bits: usize) -> usize {
        2 * digits_for_bits(max_bits) + 2
    }

    /// Set the modulus, computing all derived constants.
    ///
    /// Fails with
    /// - `BadArgument` for a zero or negative modulus,
    /// - `BadModulus` for an even modulus, or the modulus one,
    /// - `OutOfRange` for a modulus wider than the engine's maximum.
    ///
    /// On failure, the engine is unchanged.
    pub fn init(&mut self, modulus: &BigNumber) -> Result<()> {
        if !modulus.is_positive() {
            return Err(Error::BadArgument);
        }
        if !modulus.is_odd() || modulus.is_one() {
            return Err(Error::BadModulus);
        }
        if modulus.bit_len() > self.max_bits {
            return Err(Error::OutOfRange);
        }

        let n = modulus.size();
        // R = 2^(wn) mod m, and its square
        let r = BigNumber::one().shl_bits(n * DIGIT_BITS).modulo(modulus)?;
        let r2 = BigNumber::one().shl_bits(2 * n * DIGIT_BITS).modulo(modulus)?;

        self.zeroize();
        self.modulus[..n].copy_from_slice(modulus.digits());
        self.r[..r.size()].copy_from_slice(r.digits());
        self.r2[..r2.size()].copy_from_slice(r2.digits());
        self.n0 = digit_minus_inverse(modulus.digits()[0]);
        self.limbs = n;
        self.bits = modulus.bit_len();
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.limbs != 0
    }

    pub(crate) fn check_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::ContextMismatch)
        }
    }

    pub fn max_bits(&self) -> usize {
        self.max_bits
    }

    /// Bit length of the modulus.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Digit length of the modulus, the length of every operand.
    pub fn limbs(&self) -> usize {
        self.limbs
    }

    pub fn kernel_kind(&self) -> KernelKind {
        self.kernels.kind
    }

    pub fn modulus(&self) -> &[Digit] {
        &self.modulus[..self.limbs]
    }

    pub fn modulus_number(&self) -> BigNumber {
        BigNumber::from_digits(self.modulus())
    }

    /// $R \text{ mod } m$, the Montgomery representation of one.
    pub fn r(&self) -> &[Digit] {
        &self.r[..self.limbs]
    }

    pub(crate) fn r2(&self) -> &[Digit] {
        &self.r2[..self.limbs]
    }

    /// Digits of work area the slice methods need for the current modulus.
    pub fn work_len(&self) -> usize {
        2 * self.limbs + 2
    }
}

/// ## Slice interface
///
/// Every operand is exactly [`MontEngine::limbs`] long and reduced.
impl MontEngine {
    /// `acc = acc * b * R^{-1} mod m`
    #[inline]
    pub fn mul_assign(&self, acc: &mut [Digit], b: &[Digit], work: &mut [Digit]) {
        debug_assert_eq!(acc.len(), self.limbs);
        debug_assert_eq!(b.len(), self.limbs);
        (self.kernels.mul)(acc, b, self.modulus(), self.n0, work);
    }

    /// `acc = acc^2 * R^{-1} mod m`
    #[inline]
    pub fn sqr_assign(&self, acc: &mut [Digit], work: &mut [Digit]) {
        debug_assert_eq!(acc.len(), self.limbs);
        (self.kernels.sqr)(acc, self.modulus(), self.n0, work);
    }

    /// `r = t * R^{-1} mod m` for a `2n`-digit `t < m * R`; `t` is clobbered.
    #[inline]
    pub fn reduce_into(&self, r: &mut [Digit], t: &mut [Digit]) {
        debug_assert_eq!(r.len(), self.limbs);
        (self.kernels.reduce)(r, t, self.modulus(), self.n0);
    }

    /// `r = x * R mod m`, for `x < m` of at most `n` digits.
    pub fn encode_into(&self, r: &mut [Digit], x: &[Digit], work: &mut [Digit]) {
        debug_assert!(x.len() <= self.limbs);
        r.iter_mut().for_each(|digit| *digit = 0);
        r[..x.len()].copy_from_slice(x);
        (self.kernels.mul)(r, self.r2(), self.modulus(), self.n0, work);
    }

    /// `r = x * R^{-1} mod m`, for reduced `x`.
    pub fn decode_into(&self, r: &mut [Digit], x: &[Digit], work: &mut [Digit]) {
        let n = self.limbs;
        let t = &mut work[..2 * n];
        t.iter_mut().for_each(|digit| *digit = 0);
        t[..x.len()].copy_from_slice(x);
        (self.kernels.reduce)(r, t, self.modulus(), self.n0);
    }

    /// `r = t mod m`, for any `t < m * R` of at most `2n` digits, in constant time:
    /// a reduction followed by a multiplication with $R^2$.
    pub fn modulo_into(&self, r: &mut [Digit], t: &[Digit], work: &mut [Digit]) {
        let n = self.limbs;
        debug_assert!(t.len() <= 2 * n);
        {
            let wide = &mut work[..2 * n];
            wide.iter_mut().for_each(|digit| *digit = 0);
            wide[..t.len()].copy_from_slice(t);
            (self.kernels.reduce)(r, wide, self.modulus(), self.n0);
        }
        (self.kernels.mul)(r, self.r2(), self.modulus(), self.n0, work);
    }

    /// `r = t mod m`, for `t` of any length, in time depending on the lengths only.
    ///
    /// Horner's rule in base $R$: with $a < m$ and an `n`-digit chunk $t_i$,
    /// $a \cdot R + t_i < m \cdot R$, so each step is one [`MontEngine::modulo_into`].
    pub fn modulo_wide_into(&self, r: &mut [Digit], t: &[Digit], work: &mut [Digit]) {
        let n = self.limbs;
        debug_assert_eq!(r.len(), n);
        r.iter_mut().for_each(|digit| *digit = 0);
        for chunk in t.chunks(n).rev() {
            {
                let wide = &mut work[..2 * n];
                wide.iter_mut().for_each(|digit| *digit = 0);
                wide[..chunk.len()].copy_from_slice(chunk);
                wide[n..].copy_from_slice(r);
                (self.kernels.reduce)(r, wide, self.modulus(), self.n0);
            }
            (self.kernels.mul)(r, self.r2(), self.modulus(), self.n0, work);
        }
    }
}

/// ## Number interface
///
/// Checked and allocating; results are normalized, positive numbers.
impl MontEngine {
    pub(crate) fn operand(&self, x: &BigNumber) -> Result<Vec<Digit>> {
        self.check_initialized()?;
        if x.is_negative() || cmp_digits(x.digits(), self.modulus()) != Ordering::Less {
            return Err(Error::OutOfRange);
        }
        let mut digits = x.digits().to_vec();
        digits.resize(self.limbs, 0);
        Ok(digits)
    }

    fn work(&self) -> Vec<Digit> {
        let mut work = Vec::with_capacity(self.work_len());
        work.resize(self.work_len(), 0);
        work
    }

    /// $x \cdot R \text{ mod } m$
    pub fn encode(&self, x: &BigNumber) -> Result<BigNumber> {
        let x = self.operand(x)?;
        let mut r = x.clone();
        self.encode_into(&mut r, &x, &mut self.work());
        Ok(crate::arithmetic::from_vec(r))
    }

    /// $x \cdot R^{-1} \text{ mod } m$
    pub fn decode(&self, x: &BigNumber) -> Result<BigNumber> {
        let x = self.operand(x)?;
        let mut r = x.clone();
        self.decode_into(&mut r, &x, &mut self.work());
        Ok(crate::arithmetic::from_vec(r))
    }

    /// $a \cdot b \cdot R^{-1} \text{ mod } m$
    pub fn mul(&self, a: &BigNumber, b: &BigNumber) -> Result<BigNumber> {
        let mut acc = self.operand(a)?;
        let b = self.operand(b)?;
        self.mul_assign(&mut acc, &b, &mut self.work());
        Ok(crate::arithmetic::from_vec(acc))
    }

    /// $a^2 \cdot R^{-1} \text{ mod } m$
    pub fn sqr(&self, a: &BigNumber) -> Result<BigNumber> {
        let mut acc = self.operand(a)?;
        self.sqr_assign(&mut acc, &mut self.work());
        Ok(crate::arithmetic::from_vec(acc))
    }

    /// One Montgomery reduction of a product of two reduced operands.
    ///
    /// Fails with `OutOfRange` unless `0 <= t < m * R` and `t` has at most `2n` digits.
    pub fn reduce(&self, t: &BigNumber) -> Result<BigNumber> {
        self.check_initialized()?;
        let n = self.limbs;
        let bound = self.modulus_number().shl_bits(n * DIGIT_BITS);
        if t.is_negative() || t.size() > 2 * n || t.cmp_magnitude(&bound) != Ordering::Less {
            return Err(Error::OutOfRange);
        }
        let mut wide = t.digits().to_vec();
        wide.resize(2 * n, 0);
        let mut r = Vec::with_capacity(n);
        r.resize(n, 0);
        self.reduce_into(&mut r, &mut wide);
        Ok(crate::arithmetic::from_vec(r))
    }
}

impl Zeroize for MontEngine {
    fn zeroize(&mut self) {
        self.modulus.as_mut_slice().zeroize();
        self.r.as_mut_slice().zeroize();
        self.r2.as_mut_slice().zeroize();
        self.n0.zeroize();
        self.limbs = 0;
        self.bits = 0;
    }
}

impl core::fmt::Debug for MontEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MontEngine")
            .field("max_bits", &self.max_bits)
            .field("bits", &self.bits)
            .field("kernels", &self.kernels.kind)
            .finish()
    }
}
