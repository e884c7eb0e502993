//! Key generation, and consistency checks of given keys.
//!
//! Factors are searched independently, each bounded to `5·bits` candidates.
//! The private exponent is $d = e^{-1} \text{ mod } \lambda(n)$ with
//! $\lambda(n) = \text{lcm}(p - 1, q - 1)$, the smallest valid one;
//! $d_P$, $d_Q$ are its reductions modulo $p - 1$, $q - 1$.

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::{BigNumber, Error, PrivateKeyType1, PrivateKeyType2, PublicKey, Result};
use crate::prime::{is_probably_prime, mr_rounds, random_candidate};

/// Attempts at a pair of factors whose product has the right length.
const PAIR_ATTEMPTS: usize = 16;

/// Factors of at least this size must differ in their top 100 bits.
const DISTANCE_CHECK_BITS: usize = 512;
const DISTANCE_SLACK_BITS: usize = 100;

/// Keys from one generation: the public key, and the private key in both forms.
pub struct KeyPair {
    pub public: PublicKey,
    pub type1: PrivateKeyType1,
    pub type2: PrivateKeyType2,
}

/// Outcome of [`validate_keys`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Validity {
    Valid,
    /// Some relation between the key components does not hold.
    Invalid,
    /// A factor failed the Miller-Rabin test.
    Composite,
}

/// $e$ must be odd and at least 3.
fn check_public_exponent(e: &BigNumber) -> Result<()> {
    if !e.is_positive() {
        return Err(Error::OutOfRange);
    }
    if !e.is_odd() || e.bit_len() < 2 {
        return Err(Error::BadArgument);
    }
    Ok(())
}

/// A probable prime $p$ of exactly `bits` bits with $\gcd(e, p - 1) = 1$.
fn search_factor<R>(bits: usize, e: &BigNumber, rng: &mut R) -> Result<Zeroizing<BigNumber>>
where
    R: CryptoRng + RngCore,
{
    let rounds = mr_rounds(bits);
    for attempt in 1..=5 * bits {
        let candidate = Zeroizing::new(random_candidate(bits, rng)?);
        if !candidate.sub_digit(1).gcd(e)?.is_one() {
            continue;
        }
        if is_probably_prime(&candidate, rounds, rng)? {
            log::debug!("{}-bit factor found after {} candidates", bits, attempt);
            return Ok(candidate);
        }
    }
    log::debug!("no {}-bit factor within {} candidates", bits, 5 * bits);
    Err(Error::InsufficientEntropy)
}

/// Are $p$ and $q$ far enough apart?
fn distant(p: &BigNumber, q: &BigNumber, p_bits: usize, q_bits: usize) -> bool {
    if p_bits.min(q_bits) < DISTANCE_CHECK_BITS {
        return true;
    }
    p.sub(q).abs().bit_len() >= p_bits.max(q_bits) - DISTANCE_SLACK_BITS
}

/// Generate a key pair with factors of `p_bits` and `q_bits` bits and
/// public exponent `e`, which must be odd and at least 3.
///
/// The modulus has exactly `p_bits + q_bits` bits.
pub fn generate_keys<R>(p_bits: usize, q_bits: usize, e: &BigNumber, rng: &mut R) -> Result<KeyPair>
where
    R: CryptoRng + RngCore,
{
    check_public_exponent(e)?;
    if p_bits < 2 || q_bits < 2 {
        return Err(Error::BadArgument);
    }
    let bits = p_bits + q_bits;
    if e.bit_len() > bits {
        return Err(Error::OutOfRange);
    }

    for pair in 1..=PAIR_ATTEMPTS {
        let p = search_factor(p_bits, e, rng)?;
        let q = search_factor(q_bits, e, rng)?;
        if *p == *q || !distant(&p, &q, p_bits, q_bits) {
            log::debug!("factors too close, attempt {}", pair);
            continue;
        }
        let n = p.mul(&q);
        if n.bit_len() != bits {
            log::debug!("modulus of {} bits, attempt {}", n.bit_len(), pair);
            continue;
        }

        let p1 = Zeroizing::new(p.sub_digit(1));
        let q1 = Zeroizing::new(q.sub_digit(1));
        let lambda = Zeroizing::new(p1.lcm(&q1)?);
        let d = Zeroizing::new(e.mod_inverse(&lambda)?);
        let dp = Zeroizing::new(d.modulo(&p1)?);
        let dq = Zeroizing::new(d.modulo(&q1)?);
        let q_inv = Zeroizing::new(q.mod_inverse(&p)?);

        let mut public = PublicKey::new(bits, e.bit_len())?;
        public.set(&n, e)?;
        let mut type1 = PrivateKeyType1::new(bits, bits)?;
        type1.set(&n, &d)?;
        let mut type2 = PrivateKeyType2::new(p_bits, q_bits)?;
        type2.set(&p, &q, &dp, &dq, &q_inv)?;

        log::debug!("generated {}-bit key after {} attempts", bits, pair);
        return Ok(KeyPair { public, type1, type2 });
    }
    Err(Error::InsufficientEntropy)
}

/// Check that the keys belong together and are well-formed.
///
/// `rounds` Miller-Rabin rounds per factor, 0 for the default of [`mr_rounds`].
/// The type 1 exponent is accepted if $e d \equiv 1 \text{ mod } \lambda(n)$,
/// which includes exponents derived modulo $\varphi(n)$.
///
/// Fails with `IncompleteContext` if a key is not set.
pub fn validate_keys<R>(
    public: &PublicKey,
    type2: &PrivateKeyType2,
    type1: Option<&PrivateKeyType1>,
    rounds: usize,
    rng: &mut R,
) -> Result<Validity>
where
    R: CryptoRng + RngCore,
{
    let n = public.modulus()?;
    let e = public.exponent()?;
    let (p, q) = (type2.p()?, type2.q()?);
    let type1 = match type1 {
        Some(key) => Some((key.modulus()?, key.exponent()?)),
        None => None,
    };

    let invalid = |reason: &str| {
        log::debug!("invalid key: {}", reason);
        Ok(Validity::Invalid)
    };

    if !e.is_odd() || e.bit_len() < 2 || *e >= n {
        return invalid("public exponent");
    }
    if p.mul(q) != n {
        return invalid("modulus is not p·q");
    }
    if let Some((n1, _)) = &type1 {
        if *n1 != n {
            return invalid("moduli differ");
        }
    }

    for factor in &[p, q] {
        if !is_probably_prime(factor, rounds, rng)? {
            log::debug!("composite factor");
            return Ok(Validity::Composite);
        }
    }

    let p1 = Zeroizing::new(p.sub_digit(1));
    let q1 = Zeroizing::new(q.sub_digit(1));
    if !e.gcd(&p1)?.is_one() || !e.gcd(&q1)?.is_one() {
        return invalid("public exponent not coprime to p - 1, q - 1");
    }
    if !Zeroizing::new(e.mul(type2.dp()?).modulo(&p1)?).is_one() {
        return invalid("dP");
    }
    if !Zeroizing::new(e.mul(type2.dq()?).modulo(&q1)?).is_one() {
        return invalid("dQ");
    }
    if !Zeroizing::new(type2.q_inv()?.mul(q).modulo(p)?).is_one() {
        return invalid("qInv");
    }
    if let Some((_, d)) = type1 {
        let lambda = Zeroizing::new(p1.lcm(&q1)?);
        if !Zeroizing::new(e.mul(d).modulo(&lambda)?).is_one() {
            return invalid("d");
        }
    }
    Ok(Validity::Valid)
}
