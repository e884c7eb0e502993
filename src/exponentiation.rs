//! Modular exponentiation on top of a [`MontEngine`].
//!
//! Three methods are offered:
//!
//! - [`Method::Binary`]: left-to-right square-and-multiply, branching on
//!   the exponent bits. Only for public exponents, so it takes a [`PublicExponent`].
//! - [`Method::Sscm`]: every bit costs one square, one masked select of
//!   either one or the base, and one multiply.
//! - [`Method::Window`]: fixed window of `w` bits, with the `2^w` powers of the
//!   base in a scrambled table that is read obliviously.
//!
//! The constant-time methods take a [`SecretExponent`] and a public bound
//! `exp_bits` on its bit length: they always scan `exp_bits` bits, so the
//! operation count and memory access pattern depend on that bound only.
//!
//! The `*_mont` functions work on digit slices and leave their result in
//! the Montgomery domain (`E = 0` gives $R \text{ mod } M$, `X = 0` gives zero).
//! The `exp_*` functions take and return ordinary [`BigNumber`]s.

use alloc::vec;

use ref_cast::RefCast;
use zeroize::Zeroize;

use crate::{BigNumber, Digit, Error, MontEngine, Result};
use crate::ct;
use crate::digit::digits_for_bits;
use crate::numbers::bit;
use crate::scratch::{self, Arena};

mod table;
pub use table::{max_cache_safe_width, CACHE_LINE_BYTES};
use table::Table;

/// An exponent that may be processed in variable time.
#[derive(RefCast)]
#[repr(transparent)]
pub struct PublicExponent(BigNumber);

/// An exponent whose bits must not influence timing or memory access.
#[derive(RefCast)]
#[repr(transparent)]
pub struct SecretExponent(BigNumber);

impl PublicExponent {
    pub fn new(e: &BigNumber) -> &Self {
        Self::ref_cast(e)
    }

    pub fn bit_len(&self) -> usize {
        self.0.bit_len()
    }
}

impl SecretExponent {
    pub fn new(e: &BigNumber) -> &Self {
        Self::ref_cast(e)
    }

    /// All digits up to the room: which of them are significant is secret.
    fn digits(&self) -> &[Digit] {
        self.0.padded_digits()
    }
}

/// Exponentiation method, see the module documentation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Binary,
    Sscm,
    Window,
}

impl Default for Method {
    fn default() -> Self {
        Method::Window
    }
}

/// Window size for exponents of `exp_bits` bits, capped by [`max_cache_safe_width`].
pub fn window_size(exp_bits: usize) -> usize {
    let width = match exp_bits {
        bits if bits > 4096 => 6,
        bits if bits > 2666 => 5,
        bits if bits > 717 => 4,
        bits if bits > 178 => 3,
        bits if bits > 41 => 2,
        _ => 1,
    };
    width.min(max_cache_safe_width())
}

/// Digits of scratch an exponentiation with this method needs.
pub fn scratch_len(modulus_bits: usize, exp_bits: usize, method: Method) -> usize {
    let n = digits_for_bits(modulus_bits);
    let work = 2 * n + 2;
    match method {
        // acc, base
        Method::Binary => work + 2 * n,
        // acc, base, selected operand
        Method::Sscm => work + 3 * n,
        // acc, selected entry, table
        Method::Window => work + 2 * n + (n << window_size(exp_bits)),
    }
}

/// Digits of scratch a dual window exponentiation needs.
pub fn dual_scratch_len(modulus_bits: usize, exp_bits: usize) -> usize {
    2 * scratch_len(modulus_bits, exp_bits, Method::Window)
}

/// Common checks, returns the result slice trimmed to the modulus length.
fn prepare<'r>(
    engine: &MontEngine,
    r: &'r mut [Digit],
    x: &[Digit],
    scratch: &[Digit],
    required: usize,
) -> Result<&'r mut [Digit]> {
    engine.check_initialized()?;
    let n = engine.limbs();
    if r.len() < n {
        return Err(Error::SizeError);
    }
    if x.len() > n {
        return Err(Error::OutOfRange);
    }
    scratch::check(scratch, required)?;
    Ok(&mut r[..n])
}

/// $r = \bar{x}^e$ in the Montgomery domain, branching on the bits of `e`.
///
/// `x` is reduced and not encoded.
pub fn binary_mont(
    engine: &MontEngine,
    r: &mut [Digit],
    x: &[Digit],
    e: &PublicExponent,
    scratch: &mut [Digit],
) -> Result<()> {
    let required = scratch_len(engine.bits(), e.bit_len(), Method::Binary);
    let r = prepare(engine, r, x, scratch, required)?;
    let n = engine.limbs();

    let e_bits = e.bit_len();
    if e_bits == 0 {
        r.copy_from_slice(engine.r());
        return Ok(());
    }
    if bool::from(ct::is_zero(x)) {
        r.iter_mut().for_each(|digit| *digit = 0);
        return Ok(());
    }

    let mut arena = Arena::new(scratch);
    let base = arena.alloc(n)?;
    let work = arena.rest();

    engine.encode_into(base, x, work);
    r.copy_from_slice(base);
    for i in (0..e_bits - 1).rev() {
        engine.sqr_assign(r, work);
        if e.0.bit(i) {
            engine.mul_assign(r, base, work);
        }
    }
    Ok(())
}

/// $r = \bar{x}^e$ in the Montgomery domain, one square and one multiply per bit.
pub fn sscm_mont(
    engine: &MontEngine,
    r: &mut [Digit],
    x: &[Digit],
    e: &SecretExponent,
    exp_bits: usize,
    scratch: &mut [Digit],
) -> Result<()> {
    let required = scratch_len(engine.bits(), exp_bits, Method::Sscm);
    let r = prepare(engine, r, x, scratch, required)?;
    if e.0.bit_len() > exp_bits {
        return Err(Error::BadArgument);
    }
    let n = engine.limbs();

    let mut arena = Arena::new(scratch);
    let base = arena.alloc(n)?;
    let operand = arena.alloc(n)?;
    let work = arena.rest();

    engine.encode_into(base, x, work);
    r.copy_from_slice(engine.r());
    for i in (0..exp_bits).rev() {
        engine.sqr_assign(r, work);
        let set = ct::lowest_bit(bit(e.digits(), i));
        ct::select(operand, engine.r(), base, set);
        engine.mul_assign(r, operand, work);
    }
    Ok(())
}

/// The state of one window exponentiation, so that two can run in lockstep.
struct WindowLadder<'a> {
    table: Table<'a>,
    acc: &'a mut [Digit],
    entry: &'a mut [Digit],
    work: &'a mut [Digit],
    width: usize,
}

impl<'a> WindowLadder<'a> {
    fn new(engine: &MontEngine, width: usize, scratch: &'a mut [Digit]) -> Result<Self> {
        let n = engine.limbs();
        let mut arena = Arena::new(scratch);
        let slots = arena.alloc(n << width)?;
        let acc = arena.alloc(n)?;
        let entry = arena.alloc(n)?;
        let work = arena.rest();
        Ok(Self { table: Table::new(slots, n, width), acc, entry, work, width })
    }

    /// T[0] = R, T[1] = x̄, T[j] = T[j - 1]·x̄.
    fn precompute(&mut self, engine: &MontEngine, x: &[Digit]) {
        // acc holds the base, entry the running power
        engine.encode_into(self.acc, x, self.work);
        self.table.scatter(0, engine.r());
        self.table.scatter(1, self.acc);
        self.entry.copy_from_slice(self.acc);
        for j in 2..self.table.entries() {
            engine.mul_assign(self.entry, self.acc, self.work);
            self.table.scatter(j, self.entry);
        }
        self.acc.copy_from_slice(engine.r());
    }

    /// Process window `k`, bits `k·w .. (k + 1)·w` of the exponent.
    fn step(&mut self, engine: &MontEngine, e: &SecretExponent, k: usize) {
        for _ in 0..self.width {
            engine.sqr_assign(self.acc, self.work);
        }
        let index = (0..self.width).fold(0usize, |index, i| {
            index | ((bit(e.digits(), k * self.width + i) as usize) << i)
        });
        self.table.gather(self.entry, index);
        engine.mul_assign(self.acc, self.entry, self.work);
    }
}

/// $r = \bar{x}^e$ in the Montgomery domain, by fixed windows over a scrambled table.
pub fn window_mont(
    engine: &MontEngine,
    r: &mut [Digit],
    x: &[Digit],
    e: &SecretExponent,
    exp_bits: usize,
    scratch: &mut [Digit],
) -> Result<()> {
    let required = scratch_len(engine.bits(), exp_bits, Method::Window);
    let r = prepare(engine, r, x, scratch, required)?;
    if e.0.bit_len() > exp_bits {
        return Err(Error::BadArgument);
    }

    let width = window_size(exp_bits);
    log::trace!("window exponentiation, {} bits, width {}", exp_bits, width);

    let mut ladder = WindowLadder::new(engine, width, scratch)?;
    ladder.precompute(engine, x);
    for k in (0..(exp_bits + width - 1) / width).rev() {
        ladder.step(engine, e, k);
    }
    r.copy_from_slice(ladder.acc);
    Ok(())
}

/// Two window exponentiations, modulo moduli of equal digit length, in lockstep:
/// $r_i = \bar{x}_i^{e_i}$ in the Montgomery domain of `engines[i]`.
///
/// Both scan `exp_bits` bits, so neither finishes before the other.
/// Fails with `ContextMismatch` if the engines differ in digit length.
pub fn window_dual_mont(
    engines: [&MontEngine; 2],
    results: [&mut [Digit]; 2],
    bases: [&[Digit]; 2],
    exponents: [&SecretExponent; 2],
    exp_bits: usize,
    scratch: &mut [Digit],
) -> Result<()> {
    let [p, q] = engines;
    p.check_initialized()?;
    q.check_initialized()?;
    if p.limbs() != q.limbs() {
        return Err(Error::ContextMismatch);
    }
    let half = scratch_len(p.bits().max(q.bits()), exp_bits, Method::Window);
    scratch::check(scratch, 2 * half)?;
    let (scratch_p, scratch_q) = scratch.split_at_mut(half);

    let [rp, rq] = results;
    let rp = prepare(p, rp, bases[0], scratch_p, half)?;
    let rq = prepare(q, rq, bases[1], scratch_q, half)?;
    if exponents.iter().any(|e| e.0.bit_len() > exp_bits) {
        return Err(Error::BadArgument);
    }

    let width = window_size(exp_bits);
    log::trace!("dual window exponentiation, {} bits, width {}", exp_bits, width);

    let mut ladder_p = WindowLadder::new(p, width, scratch_p)?;
    let mut ladder_q = WindowLadder::new(q, width, scratch_q)?;
    ladder_p.precompute(p, bases[0]);
    ladder_q.precompute(q, bases[1]);
    for k in (0..(exp_bits + width - 1) / width).rev() {
        ladder_p.step(p, exponents[0], k);
        ladder_q.step(q, exponents[1], k);
    }
    rp.copy_from_slice(ladder_p.acc);
    rq.copy_from_slice(ladder_q.acc);
    Ok(())
}

/// Run `f` on fresh scratch and a result buffer, decode and wipe.
fn with_scratch(
    engine: &MontEngine,
    x: &BigNumber,
    scratch_len: usize,
    f: impl FnOnce(&mut [Digit], &[Digit], &mut [Digit]) -> Result<()>,
) -> Result<BigNumber> {
    let x = engine.operand(x)?;
    let n = engine.limbs();
    let mut scratch = vec![0; scratch_len.max(engine.work_len())];
    let mut mont = vec![0; n];

    let result = f(&mut mont, &x, &mut scratch);
    let mut r = vec![0; n];
    if result.is_ok() {
        engine.decode_into(&mut r, &mont, &mut scratch);
    }
    scratch.zeroize();
    mont.zeroize();
    result.map(|_| crate::arithmetic::from_vec(r))
}

/// $x^e \text{ mod } M$ by [`binary_mont`], for $0 \le x < M$.
pub fn exp_binary(engine: &MontEngine, x: &BigNumber, e: &PublicExponent) -> Result<BigNumber> {
    let len = scratch_len(engine.bits(), e.bit_len(), Method::Binary);
    with_scratch(engine, x, len, |r, x, scratch| binary_mont(engine, r, x, e, scratch))
}

/// $x^e \text{ mod } M$ by [`sscm_mont`], for $0 \le x < M$.
pub fn exp_sscm(engine: &MontEngine, x: &BigNumber, e: &SecretExponent, exp_bits: usize) -> Result<BigNumber> {
    let len = scratch_len(engine.bits(), exp_bits, Method::Sscm);
    with_scratch(engine, x, len, |r, x, scratch| sscm_mont(engine, r, x, e, exp_bits, scratch))
}

/// $x^e \text{ mod } M$ by [`window_mont`], for $0 \le x < M$.
pub fn exp_window(engine: &MontEngine, x: &BigNumber, e: &SecretExponent, exp_bits: usize) -> Result<BigNumber> {
    let len = scratch_len(engine.bits(), exp_bits, Method::Window);
    with_scratch(engine, x, len, |r, x, scratch| window_mont(engine, r, x, e, exp_bits, scratch))
}

/// $x^e \text{ mod } M$ with a constant-time `method`; `Binary` is refused
/// with `BadArgument`.
pub fn exp_secret(
    engine: &MontEngine,
    x: &BigNumber,
    e: &SecretExponent,
    exp_bits: usize,
    method: Method,
) -> Result<BigNumber> {
    match method {
        Method::Binary => Err(Error::BadArgument),
        Method::Sscm => exp_sscm(engine, x, e, exp_bits),
        Method::Window => exp_window(engine, x, e, exp_bits),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::montgomery::{KernelKind, Kernels};
    use num_bigint::BigUint;
    use rand::{rngs::StdRng, RngCore, SeedableRng};
    use std::cell::Cell;

    fn oracle(x: &BigNumber) -> BigUint {
        BigUint::from_bytes_be(&x.to_be_bytes())
    }

    fn engine(modulus: &BigNumber) -> MontEngine {
        let mut engine = MontEngine::new(modulus.bit_len()).unwrap();
        engine.init(modulus).unwrap();
        engine
    }

    fn random_below(rng: &mut StdRng, m: &BigNumber) -> BigNumber {
        let mut bytes = vec![0u8; m.byte_len() + 8];
        rng.fill_bytes(&mut bytes);
        BigNumber::from_be_bytes(&bytes).modulo(m).unwrap()
    }

    #[test]
    fn window_sizes() {
        assert_eq!(window_size(0), 1);
        assert_eq!(window_size(41), 1);
        assert_eq!(window_size(42), 2);
        assert_eq!(window_size(179), 3.min(max_cache_safe_width()));
        assert_eq!(window_size(1024), 4.min(max_cache_safe_width()));
        assert_eq!(window_size(8192), max_cache_safe_width());
    }

    #[test]
    fn methods_agree_with_oracle() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let m = BigNumber::from_be_bytes(&crate::fixtures::P256).mul(&BigNumber::from_be_bytes(&crate::fixtures::Q256));
        let engine = engine(&m);

        for _ in 0..8 {
            let x = random_below(&mut rng, &m);
            let e = random_below(&mut rng, &m);
            let expected = oracle(&x).modpow(&oracle(&e), &oracle(&m));

            let binary = exp_binary(&engine, &x, PublicExponent::new(&e)).unwrap();
            let sscm = exp_sscm(&engine, &x, SecretExponent::new(&e), m.bit_len()).unwrap();
            let window = exp_window(&engine, &x, SecretExponent::new(&e), m.bit_len()).unwrap();

            assert_eq!(oracle(&binary), expected);
            assert_eq!(sscm, binary);
            assert_eq!(window, binary);
        }
    }

    #[test]
    fn small_values() {
        let m = BigNumber::from_digit(97);
        let engine = engine(&m);
        for x in 0..97 {
            for e in [0, 1, 2, 3, 5, 17, 96, 1000].iter() {
                let x = BigNumber::from_digit(x);
                let e = BigNumber::from_digit(*e);
                let expected = oracle(&x).modpow(&oracle(&e), &BigUint::from(97u32));
                for method in [Method::Sscm, Method::Window].iter() {
                    let r = exp_secret(&engine, &x, SecretExponent::new(&e), 10, *method).unwrap();
                    assert_eq!(oracle(&r), expected);
                }
                assert_eq!(oracle(&exp_binary(&engine, &x, PublicExponent::new(&e)).unwrap()), expected);
            }
        }
    }

    #[test]
    fn edge_cases_in_montgomery_domain() {
        let m = BigNumber::from_be_bytes(&crate::fixtures::P256);
        let engine = engine(&m);
        let n = engine.limbs();
        let x = BigNumber::from_be_bytes(&crate::fixtures::Q256).modulo(&m).unwrap();
        let zero = BigNumber::zero();
        let mut r = vec![0; n];
        let mut scratch = vec![0; scratch_len(256, 256, Method::Window)];

        // E = 0 gives the encoding of one
        binary_mont(&engine, &mut r, x.digits(), PublicExponent::new(&zero), &mut scratch).unwrap();
        assert_eq!(r, engine.r());
        sscm_mont(&engine, &mut r, x.digits(), SecretExponent::new(&zero), 256, &mut scratch).unwrap();
        assert_eq!(r, engine.r());
        window_mont(&engine, &mut r, x.digits(), SecretExponent::new(&zero), 256, &mut scratch).unwrap();
        assert_eq!(r, engine.r());

        // X = 0 gives zero
        let e = BigNumber::from_digit(65537);
        binary_mont(&engine, &mut r, zero.digits(), PublicExponent::new(&e), &mut scratch).unwrap();
        assert!(r.iter().all(|&digit| digit == 0));
        sscm_mont(&engine, &mut r, zero.digits(), SecretExponent::new(&e), 256, &mut scratch).unwrap();
        assert!(r.iter().all(|&digit| digit == 0));
        window_mont(&engine, &mut r, zero.digits(), SecretExponent::new(&e), 256, &mut scratch).unwrap();
        assert!(r.iter().all(|&digit| digit == 0));
    }

    #[test]
    fn argument_checks() {
        let m = BigNumber::from_be_bytes(&crate::fixtures::P256);
        let engine = engine(&m);
        let e = BigNumber::from_digit(65537);

        assert_eq!(exp_binary(&engine, &m, PublicExponent::new(&e)), Err(Error::OutOfRange));
        assert_eq!(exp_binary(&engine, &m.negated(), PublicExponent::new(&e)), Err(Error::OutOfRange));
        assert_eq!(exp_sscm(&engine, &BigNumber::one(), SecretExponent::new(&e), 16), Err(Error::BadArgument));
        assert_eq!(
            exp_secret(&engine, &BigNumber::one(), SecretExponent::new(&e), 17, Method::Binary),
            Err(Error::BadArgument),
        );

        let mut r = vec![0; engine.limbs()];
        let mut short = vec![0; scratch_len(256, 17, Method::Window) - 1];
        assert_eq!(
            window_mont(&engine, &mut r, &[2], SecretExponent::new(&e), 17, &mut short),
            Err(Error::SizeError),
        );
        let mut scratch = vec![0; scratch_len(256, 17, Method::Window)];
        assert_eq!(
            window_mont(&engine, &mut r[..1], &[2], SecretExponent::new(&e), 17, &mut scratch),
            Err(Error::SizeError),
        );

        let unset = MontEngine::new(256).unwrap();
        assert_eq!(exp_binary(&unset, &BigNumber::one(), PublicExponent::new(&e)), Err(Error::ContextMismatch));
    }

    #[test]
    fn dual_matches_single() {
        let mut rng = StdRng::seed_from_u64(2);
        let p = BigNumber::from_be_bytes(&crate::fixtures::P256);
        let q = BigNumber::from_be_bytes(&crate::fixtures::Q256);
        let (engine_p, engine_q) = (engine(&p), engine(&q));
        let (xp, xq) = (random_below(&mut rng, &p), random_below(&mut rng, &q));
        let (ep, eq) = (random_below(&mut rng, &p), random_below(&mut rng, &q).shr_bits(40));

        let n = engine_p.limbs();
        let (mut rp, mut rq) = (vec![0; n], vec![0; n]);
        let mut scratch = vec![0; dual_scratch_len(256, 256)];
        let (xp_digits, xq_digits) = (xp.resized(n).unwrap(), xq.resized(n).unwrap());
        window_dual_mont(
            [&engine_p, &engine_q],
            [&mut rp, &mut rq],
            [xp_digits.padded_digits(), xq_digits.padded_digits()],
            [SecretExponent::new(&ep), SecretExponent::new(&eq)],
            256,
            &mut scratch,
        ).unwrap();

        let rp = engine_p.decode(&BigNumber::from_digits(&rp)).unwrap();
        let rq = engine_q.decode(&BigNumber::from_digits(&rq)).unwrap();
        assert_eq!(rp, exp_window(&engine_p, &xp, SecretExponent::new(&ep), 256).unwrap());
        assert_eq!(rq, exp_window(&engine_q, &xq, SecretExponent::new(&eq), 256).unwrap());

        let small = engine(&BigNumber::from_digit(97));
        let mut r97 = vec![0; 1];
        assert_eq!(
            window_dual_mont(
                [&engine_p, &small],
                [&mut rp.padded_digits().to_vec(), &mut r97],
                [&[1], &[1]],
                [SecretExponent::new(&ep), SecretExponent::new(&eq)],
                256,
                &mut scratch,
            ),
            Err(Error::ContextMismatch),
        );
    }

    thread_local! {
        static MULTIPLICATIONS: Cell<usize> = Cell::new(0);
        static SQUARINGS: Cell<usize> = Cell::new(0);
    }

    fn counting_mul(acc: &mut [Digit], b: &[Digit], m: &[Digit], n0: Digit, work: &mut [Digit]) {
        MULTIPLICATIONS.with(|count| count.set(count.get() + 1));
        (Kernels::CIOS.mul)(acc, b, m, n0, work)
    }

    fn counting_sqr(acc: &mut [Digit], m: &[Digit], n0: Digit, work: &mut [Digit]) {
        SQUARINGS.with(|count| count.set(count.get() + 1));
        (Kernels::CIOS.sqr)(acc, m, n0, work)
    }

    const COUNTING: Kernels = Kernels {
        kind: KernelKind::Cios,
        mul: counting_mul,
        sqr: counting_sqr,
        reduce: crate::montgomery::kernels::redc,
    };

    /// Multiplications, squarings and secret-dependent selections made by `f`.
    fn count(f: impl FnOnce()) -> (usize, usize, usize) {
        MULTIPLICATIONS.with(|count| count.set(0));
        SQUARINGS.with(|count| count.set(0));
        ct::SELECTIONS.with(|count| count.set(0));
        f();
        (
            MULTIPLICATIONS.with(Cell::get),
            SQUARINGS.with(Cell::get),
            ct::SELECTIONS.with(Cell::get),
        )
    }

    #[test]
    fn operation_counts_do_not_depend_on_exponent() {
        let m = BigNumber::from_be_bytes(&crate::fixtures::P256);
        let mut engine = MontEngine::with_kernels(256, COUNTING).unwrap();
        engine.init(&m).unwrap();
        let x = BigNumber::from_be_bytes(&crate::fixtures::Q256).modulo(&m).unwrap();

        let sparse = BigNumber::one().shl_bits(255);
        let dense = BigNumber::one().shl_bits(256).sub_digit(1);
        let mut rng = StdRng::seed_from_u64(3);
        let random = random_below(&mut rng, &m);

        for method in [Method::Sscm, Method::Window].iter() {
            let counts: Vec<_> = [&sparse, &dense, &random, &BigNumber::one()]
                .iter()
                .map(|e| count(|| {
                    exp_secret(&engine, &x, SecretExponent::new(e), 256, *method).unwrap();
                }))
                .collect();
            assert!(counts.windows(2).all(|pair| pair[0] == pair[1]), "{:?}: {:?}", method, counts);

            // one selection per bit, or one table lookup per window
            let selections = match method {
                Method::Sscm => 256,
                _ => (256 + window_size(256) - 1) / window_size(256),
            };
            assert_eq!(counts[0].2, selections, "{:?}", method);
        }

        // whereas the binary method does depend on it
        let sparse_count = count(|| { exp_binary(&engine, &x, PublicExponent::new(&sparse)).unwrap(); });
        let dense_count = count(|| { exp_binary(&engine, &x, PublicExponent::new(&dense)).unwrap(); });
        assert_ne!(sparse_count, dense_count);
        assert_eq!(sparse_count.2, 0);
    }
}
