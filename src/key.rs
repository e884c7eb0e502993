//! RSA keys.
//!
//! Keys are allocated for maximal sizes first (`new`), then populated once
//! (`set`). Operations on a key that was never set fail with
//! `IncompleteContext`; a failing `set` leaves the key as it was.
//!
//! There are two kinds of private keys, following [RFC 8017][rfc8017]:
//! - [`PrivateKeyType1`] holds the pair $(n, d)$,
//! - [`PrivateKeyType2`] holds the quintuple $(p, q, d_P, d_Q, q^{-1})$,
//!   which allows decryption via the Chinese remainder theorem.
//!
//! Private keys wipe their material when dropped.
//!
//! [rfc8017]: https://tools.ietf.org/html/rfc8017#section-3.2

use alloc::vec::Vec;

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::{BigNumber, Digit, Error, MontEngine, Result, Sign};
use crate::digit::digits_for_bits;
use crate::exponentiation::Method;
use crate::keygen::KeyPair;

/// Positive and at most `max_bits` long.
fn check_exponent(e: &BigNumber, max_bits: usize) -> Result<()> {
    if !e.is_positive() {
        return Err(Error::OutOfRange);
    }
    if e.bit_len() > max_bits {
        return Err(Error::SizeError);
    }
    Ok(())
}

/// Positive and smaller than `bound`.
fn check_below(x: &BigNumber, bound: &BigNumber) -> Result<()> {
    if !x.is_positive() || x >= bound {
        return Err(Error::OutOfRange);
    }
    Ok(())
}

/// Zeroize the old engine before replacing it.
fn replace_engine(old: &mut MontEngine, new: MontEngine) {
    old.zeroize();
    *old = new;
}

/// RSA public key $(n, e)$.
#[derive(Clone, Debug)]
pub struct PublicKey {
    engine: MontEngine,
    e: BigNumber,
    max_exp_bits: usize,
    is_set: bool,
}

impl PublicKey {
    /// Allocate a key for moduli of up to `max_modulus_bits` and public
    /// exponents of up to `max_exp_bits` bits.
    pub fn new(max_modulus_bits: usize, max_exp_bits: usize) -> Result<Self> {
        if max_modulus_bits == 0 || max_exp_bits == 0 {
            return Err(Error::BadArgument);
        }
        Ok(Self {
            engine: MontEngine::new(max_modulus_bits)?,
            e: BigNumber::with_bits(max_exp_bits)?,
            max_exp_bits,
            is_set: false,
        })
    }

    /// Set modulus and public exponent.
    pub fn set(&mut self, n: &BigNumber, e: &BigNumber) -> Result<()> {
        check_exponent(e, self.max_exp_bits)?;
        let mut engine = self.engine.clone();
        engine.init(n)?;

        self.engine = engine;
        self.e.set_digits(Sign::Positive, e.digits())?;
        self.is_set = true;
        Ok(())
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }

    pub(crate) fn check_set(&self) -> Result<()> {
        if self.is_set { Ok(()) } else { Err(Error::IncompleteContext) }
    }

    pub fn max_modulus_bits(&self) -> usize {
        self.engine.max_bits()
    }

    pub fn max_exp_bits(&self) -> usize {
        self.max_exp_bits
    }

    /// Bit length of the modulus.
    pub fn bits(&self) -> Result<usize> {
        self.check_set()?;
        Ok(self.engine.bits())
    }

    pub fn modulus(&self) -> Result<BigNumber> {
        self.check_set()?;
        Ok(self.engine.modulus_number())
    }

    pub fn exponent(&self) -> Result<&BigNumber> {
        self.check_set()?;
        Ok(&self.e)
    }

    pub(crate) fn engine(&self) -> &MontEngine {
        &self.engine
    }

    pub(crate) fn e(&self) -> &BigNumber {
        &self.e
    }
}

/// RSA private key $(n, d)$.
#[derive(Clone)]
pub struct PrivateKeyType1 {
    engine: MontEngine,
    d: BigNumber,
    max_exp_bits: usize,
    method: Method,
    is_set: bool,
}

impl PrivateKeyType1 {
    /// Allocate a key for moduli of up to `max_modulus_bits` and private
    /// exponents of up to `max_exp_bits` bits.
    pub fn new(max_modulus_bits: usize, max_exp_bits: usize) -> Result<Self> {
        if max_modulus_bits == 0 || max_exp_bits == 0 {
            return Err(Error::BadArgument);
        }
        Ok(Self {
            engine: MontEngine::new(max_modulus_bits)?,
            d: BigNumber::with_bits(max_exp_bits)?,
            max_exp_bits,
            method: Method::default(),
            is_set: false,
        })
    }

    /// Set modulus and private exponent; `d` must not be longer than `n`.
    pub fn set(&mut self, n: &BigNumber, d: &BigNumber) -> Result<()> {
        check_exponent(d, self.max_exp_bits)?;
        if d.bit_len() > n.bit_len() {
            return Err(Error::OutOfRange);
        }
        let mut engine = self.engine.clone();
        engine.init(n)?;

        replace_engine(&mut self.engine, engine);
        self.d.set_digits(Sign::Positive, d.digits())?;
        self.is_set = true;
        Ok(())
    }

    /// Choose the constant-time exponentiation method; `Binary` is refused
    /// with `BadArgument`.
    pub fn set_method(&mut self, method: Method) -> Result<()> {
        if method == Method::Binary {
            return Err(Error::BadArgument);
        }
        self.method = method;
        Ok(())
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }

    pub(crate) fn check_set(&self) -> Result<()> {
        if self.is_set { Ok(()) } else { Err(Error::IncompleteContext) }
    }

    pub fn max_modulus_bits(&self) -> usize {
        self.engine.max_bits()
    }

    pub fn bits(&self) -> Result<usize> {
        self.check_set()?;
        Ok(self.engine.bits())
    }

    pub fn modulus(&self) -> Result<BigNumber> {
        self.check_set()?;
        Ok(self.engine.modulus_number())
    }

    pub fn exponent(&self) -> Result<&BigNumber> {
        self.check_set()?;
        Ok(&self.d)
    }

    pub(crate) fn engine(&self) -> &MontEngine {
        &self.engine
    }

    pub(crate) fn d(&self) -> &BigNumber {
        &self.d
    }
}

impl Zeroize for PrivateKeyType1 {
    fn zeroize(&mut self) {
        self.engine.zeroize();
        self.d.zeroize();
        self.is_set = false;
    }
}

impl Drop for PrivateKeyType1 {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// RSA private key $(p, q, d_P, d_Q, q^{-1})$, for decryption via CRT.
#[derive(Clone)]
pub struct PrivateKeyType2 {
    engine_p: MontEngine,
    engine_q: MontEngine,
    /// Modulus $n = pq$.
    engine_n: MontEngine,
    p: BigNumber,
    q: BigNumber,
    dp: BigNumber,
    dq: BigNumber,
    q_inv: BigNumber,
    /// $q^{-1} R \text{ mod } p$, so that one Montgomery multiplication applies $q^{-1}$.
    q_inv_mont: Vec<Digit>,
    is_set: bool,
}

impl PrivateKeyType2 {
    /// Allocate a key for factors $p$, $q$ of up to `p_bits`, `q_bits` bits.
    pub fn new(p_bits: usize, q_bits: usize) -> Result<Self> {
        if p_bits == 0 || q_bits == 0 {
            return Err(Error::BadArgument);
        }
        let mut q_inv_mont = Vec::with_capacity(digits_for_bits(p_bits));
        q_inv_mont.resize(digits_for_bits(p_bits), 0);
        Ok(Self {
            engine_p: MontEngine::new(p_bits)?,
            engine_q: MontEngine::new(q_bits)?,
            engine_n: MontEngine::new(p_bits + q_bits)?,
            p: BigNumber::with_bits(p_bits)?,
            q: BigNumber::with_bits(q_bits)?,
            dp: BigNumber::with_bits(p_bits)?,
            dq: BigNumber::with_bits(q_bits)?,
            q_inv: BigNumber::with_bits(p_bits)?,
            q_inv_mont,
            is_set: false,
        })
    }

    /// Set the CRT components.
    ///
    /// $p$ and $q$ must be odd and fit the allocation; $0 < d_P < p$,
    /// $0 < d_Q < q$ and $0 < q^{-1} < p$, else `OutOfRange`.
    pub fn set(
        &mut self,
        p: &BigNumber,
        q: &BigNumber,
        dp: &BigNumber,
        dq: &BigNumber,
        q_inv: &BigNumber,
    ) -> Result<()> {
        let mut engine_p = self.engine_p.clone();
        engine_p.init(p)?;
        let mut engine_q = self.engine_q.clone();
        engine_q.init(q)?;
        check_below(dp, p)?;
        check_below(dq, q)?;
        check_below(q_inv, p)?;
        let mut engine_n = self.engine_n.clone();
        engine_n.init(&p.mul(q))?;
        let q_inv_mont = engine_p.encode(q_inv)?;

        replace_engine(&mut self.engine_p, engine_p);
        replace_engine(&mut self.engine_q, engine_q);
        replace_engine(&mut self.engine_n, engine_n);
        self.p.set_digits(Sign::Positive, p.digits())?;
        self.q.set_digits(Sign::Positive, q.digits())?;
        self.dp.set_digits(Sign::Positive, dp.digits())?;
        self.dq.set_digits(Sign::Positive, dq.digits())?;
        self.q_inv.set_digits(Sign::Positive, q_inv.digits())?;
        // zeroizing a Vec also truncates it
        self.q_inv_mont.zeroize();
        self.q_inv_mont.resize(digits_for_bits(self.engine_p.max_bits()), 0);
        self.q_inv_mont[..q_inv_mont.size()].copy_from_slice(q_inv_mont.digits());
        self.is_set = true;
        Ok(())
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }

    pub(crate) fn check_set(&self) -> Result<()> {
        if self.is_set { Ok(()) } else { Err(Error::IncompleteContext) }
    }

    /// The factor sizes this key was allocated for.
    pub fn max_factor_bits(&self) -> (usize, usize) {
        (self.engine_p.max_bits(), self.engine_q.max_bits())
    }

    pub fn bits(&self) -> Result<usize> {
        self.check_set()?;
        Ok(self.engine_n.bits())
    }

    pub fn modulus(&self) -> Result<BigNumber> {
        self.check_set()?;
        Ok(self.engine_n.modulus_number())
    }

    pub fn p(&self) -> Result<&BigNumber> {
        self.check_set()?;
        Ok(&self.p)
    }

    pub fn q(&self) -> Result<&BigNumber> {
        self.check_set()?;
        Ok(&self.q)
    }

    pub fn dp(&self) -> Result<&BigNumber> {
        self.check_set()?;
        Ok(&self.dp)
    }

    pub fn dq(&self) -> Result<&BigNumber> {
        self.check_set()?;
        Ok(&self.dq)
    }

    pub fn q_inv(&self) -> Result<&BigNumber> {
        self.check_set()?;
        Ok(&self.q_inv)
    }

    pub(crate) fn engines(&self) -> (&MontEngine, &MontEngine, &MontEngine) {
        (&self.engine_p, &self.engine_q, &self.engine_n)
    }

    pub(crate) fn exponents(&self) -> (&BigNumber, &BigNumber) {
        (&self.dp, &self.dq)
    }

    pub(crate) fn q_inv_mont(&self) -> &[Digit] {
        &self.q_inv_mont[..self.engine_p.limbs()]
    }
}

impl Zeroize for PrivateKeyType2 {
    fn zeroize(&mut self) {
        self.engine_p.zeroize();
        self.engine_q.zeroize();
        self.engine_n.zeroize();
        self.p.zeroize();
        self.q.zeroize();
        self.dp.zeroize();
        self.dq.zeroize();
        self.q_inv.zeroize();
        self.q_inv_mont.zeroize();
        self.is_set = false;
    }
}

impl Drop for PrivateKeyType2 {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// The RSA cryptosystem at a standard modulus size. Sealed trait to avoid experiments.
pub trait Rsa: sealed::Rsa {
    /// Modulus bits.
    const BITS: usize;
    /// Modulus digits.
    const DIGITS: usize = digits_for_bits(Self::BITS);

    fn public_key() -> Result<PublicKey> {
        PublicKey::new(Self::BITS, Self::BITS)
    }

    fn private_key_type1() -> Result<PrivateKeyType1> {
        PrivateKeyType1::new(Self::BITS, Self::BITS)
    }

    fn private_key_type2() -> Result<PrivateKeyType2> {
        PrivateKeyType2::new(Self::BITS / 2, Self::BITS / 2)
    }

    /// Generate a key pair with public exponent `e` and two factors of equal size.
    fn generate<R: CryptoRng + RngCore>(e: &BigNumber, rng: &mut R) -> Result<KeyPair> {
        crate::keygen::generate_keys(Self::BITS / 2, Self::BITS / 2, e, rng)
    }
}

/// cf. https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod sealed {
    pub trait Rsa {}
    impl Rsa for super::Rsa1k {}
    impl Rsa for super::Rsa2k {}
    impl Rsa for super::Rsa3k {}
    impl Rsa for super::Rsa4k {}
}

/// The RSA cryptosystem with 1024 bit size keys.
pub struct Rsa1k;
impl Rsa for Rsa1k {
    const BITS: usize = 1024;
}

/// The RSA cryptosystem with 2048 bit size keys.
///
/// Corresponds roughly to 112-bit security.
pub struct Rsa2k;
impl Rsa for Rsa2k {
    const BITS: usize = 2048;
}

/// The RSA cryptosystem with 3072 bit size keys.
///
/// Corresponds roughly to 128-bit security.
pub struct Rsa3k;
impl Rsa for Rsa3k {
    const BITS: usize = 3072;
}

/// The RSA cryptosystem with 4096 bit size keys.
pub struct Rsa4k;
impl Rsa for Rsa4k {
    const BITS: usize = 4096;
}
