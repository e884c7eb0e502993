//! The RSA primitives of [RFC 8017][rfc8017], section 5.
//!
//! Every operation comes in two flavours:
//! - `*_into` writes into a caller-supplied number (with room for at least as
//!   many digits as the modulus has) and works in caller-supplied scratch of at
//!   least `scratch_len` digits, for the sizes the key was allocated for;
//! - the plain variant allocates both, and wipes the scratch afterwards.
//!
//! Inputs must lie in $[0, n)$. The public operation branches on the bits of
//! the public exponent; private operations use the key's constant-time
//! exponentiation method, and the type 2 key recombines via the Chinese
//! remainder theorem without branching on secret values.
//!
//! [rfc8017]: https://tools.ietf.org/html/rfc8017#section-5.1

use alloc::vec;
use core::cmp::Ordering;

use zeroize::Zeroizing;

use crate::{BigNumber, Digit, Error, MontEngine, Result, Sign};
use crate::{PrivateKeyType1, PrivateKeyType2, PublicKey};
use crate::arithmetic::add::{add_assign_carry, add_into};
use crate::arithmetic::multiply::mul_into;
use crate::arithmetic::subtract::sub_into;
use crate::ct;
use crate::digit::digits_for_bits;
use crate::exponentiation::{self, Method, PublicExponent, SecretExponent};
use crate::numbers::cmp_digits;
use crate::scratch::{self, Arena};

pub trait PublicRsa {
    /// Length of the modulus in bytes.
    fn modulus_len(&self) -> Result<usize>;

    // or "public operation"
    // or "public permutation"
    fn rsa_primitive(&self, x: &BigNumber) -> Result<BigNumber>;
}

pub trait PrivateRsa {
    /// Length of the modulus in bytes.
    fn modulus_len(&self) -> Result<usize>;

    // or "private operation"
    // or "private permutation"
    fn rsa_primitive(&self, x: &BigNumber) -> Result<BigNumber>;
}

fn check_output(engine: &MontEngine, out: &BigNumber) -> Result<()> {
    if out.room() < engine.limbs() {
        return Err(Error::SizeError);
    }
    Ok(())
}

fn check_input(engine: &MontEngine, x: &BigNumber) -> Result<()> {
    if x.is_negative() || cmp_digits(x.digits(), engine.modulus()) != Ordering::Less {
        return Err(Error::OutOfRange);
    }
    Ok(())
}

/// Zeroed scratch and an output number for keys allocated for `max_bits`.
fn allocate(max_bits: usize, scratch_len: usize) -> Result<(BigNumber, Zeroizing<vec::Vec<Digit>>)> {
    Ok((BigNumber::with_bits(max_bits)?, Zeroizing::new(vec![0; scratch_len])))
}

impl PublicKey {
    /// Digits of scratch the public operation needs, for a key allocated with these maxima.
    pub fn scratch_len(max_modulus_bits: usize, max_exp_bits: usize) -> usize {
        2 * digits_for_bits(max_modulus_bits)
            + exponentiation::scratch_len(max_modulus_bits, max_exp_bits, Method::Binary)
    }

    fn required_scratch(&self) -> usize {
        Self::scratch_len(self.max_modulus_bits(), self.max_exp_bits())
    }

    /// RSAEP: $c = m^e \text{ mod } n$.
    pub fn encrypt_into(&self, plaintext: &BigNumber, ciphertext: &mut BigNumber, scratch: &mut [Digit]) -> Result<()> {
        self.check_set()?;
        let engine = self.engine();
        check_output(engine, ciphertext)?;
        check_input(engine, plaintext)?;
        scratch::check(scratch, self.required_scratch())?;

        let n = engine.limbs();
        let mut arena = Arena::new(scratch);
        let x = arena.alloc(n)?;
        let y = arena.alloc(n)?;
        let work = arena.rest();
        x[..plaintext.size()].copy_from_slice(plaintext.digits());

        exponentiation::binary_mont(engine, y, x, PublicExponent::new(self.e()), work)?;
        engine.decode_into(x, y, work);
        ciphertext.set_digits(Sign::Positive, x)
    }

    pub fn encrypt(&self, plaintext: &BigNumber) -> Result<BigNumber> {
        self.check_set()?;
        let (mut ciphertext, mut scratch) = allocate(self.max_modulus_bits(), self.required_scratch())?;
        self.encrypt_into(plaintext, &mut ciphertext, &mut scratch[..])?;
        Ok(ciphertext)
    }

    /// RSAVP1, the same operation as [`PublicKey::encrypt_into`].
    pub fn verify_into(&self, signature: &BigNumber, message: &mut BigNumber, scratch: &mut [Digit]) -> Result<()> {
        self.encrypt_into(signature, message, scratch)
    }

    pub fn verify(&self, signature: &BigNumber) -> Result<BigNumber> {
        self.encrypt(signature)
    }
}

impl PublicRsa for PublicKey {
    fn modulus_len(&self) -> Result<usize> {
        Ok((self.bits()? + 7) / 8)
    }

    fn rsa_primitive(&self, x: &BigNumber) -> Result<BigNumber> {
        self.encrypt(x)
    }
}

impl PrivateKeyType1 {
    /// Digits of scratch the private operation needs, for a key allocated
    /// for `max_modulus_bits` and using `method`.
    pub fn scratch_len(max_modulus_bits: usize, method: Method) -> usize {
        2 * digits_for_bits(max_modulus_bits)
            + exponentiation::scratch_len(max_modulus_bits, max_modulus_bits, method)
    }

    fn required_scratch(&self) -> usize {
        Self::scratch_len(self.max_modulus_bits(), self.method())
    }

    /// RSADP: $m = c^d \text{ mod } n$.
    ///
    /// The exponentiation scans as many bits as the modulus has.
    pub fn decrypt_into(&self, ciphertext: &BigNumber, plaintext: &mut BigNumber, scratch: &mut [Digit]) -> Result<()> {
        self.check_set()?;
        let engine = self.engine();
        check_output(engine, plaintext)?;
        check_input(engine, ciphertext)?;
        scratch::check(scratch, self.required_scratch())?;

        let n = engine.limbs();
        let mut arena = Arena::new(scratch);
        let x = arena.alloc(n)?;
        let y = arena.alloc(n)?;
        let work = arena.rest();
        x[..ciphertext.size()].copy_from_slice(ciphertext.digits());

        let d = SecretExponent::new(self.d());
        let exp_bits = engine.bits();
        match self.method() {
            Method::Window => exponentiation::window_mont(engine, y, x, d, exp_bits, work)?,
            Method::Sscm => exponentiation::sscm_mont(engine, y, x, d, exp_bits, work)?,
            Method::Binary => return Err(Error::BadArgument),
        }
        engine.decode_into(x, y, work);
        plaintext.set_digits(Sign::Positive, x)
    }

    pub fn decrypt(&self, ciphertext: &BigNumber) -> Result<BigNumber> {
        self.check_set()?;
        let (mut plaintext, mut scratch) = allocate(self.max_modulus_bits(), self.required_scratch())?;
        self.decrypt_into(ciphertext, &mut plaintext, &mut scratch[..])?;
        Ok(plaintext)
    }

    /// RSASP1, the same operation as [`PrivateKeyType1::decrypt_into`].
    pub fn sign_into(&self, message: &BigNumber, signature: &mut BigNumber, scratch: &mut [Digit]) -> Result<()> {
        self.decrypt_into(message, signature, scratch)
    }

    pub fn sign(&self, message: &BigNumber) -> Result<BigNumber> {
        self.decrypt(message)
    }
}

impl PrivateRsa for PrivateKeyType1 {
    fn modulus_len(&self) -> Result<usize> {
        Ok((self.bits()? + 7) / 8)
    }

    fn rsa_primitive(&self, x: &BigNumber) -> Result<BigNumber> {
        self.decrypt(x)
    }
}

impl PrivateKeyType2 {
    /// Digits of scratch the CRT operation needs, for a key allocated for
    /// factors of `p_bits` and `q_bits` bits.
    pub fn scratch_len(p_bits: usize, q_bits: usize) -> usize {
        let (np, nq) = (digits_for_bits(p_bits), digits_for_bits(q_bits));
        let bits = p_bits.max(q_bits);
        // c_p, x_p, m_p, t, u, h; c_q, x_q, m_q; y; work
        6 * np + 3 * nq + (np + nq) + MontEngine::scratch_len(bits)
            + exponentiation::dual_scratch_len(bits, bits)
    }

    fn required_scratch(&self) -> usize {
        let (p_bits, q_bits) = self.max_factor_bits();
        Self::scratch_len(p_bits, q_bits)
    }

    /// RSADP via CRT:
    ///
    /// - $m_p = c^{d_P} \text{ mod } p$, $m_q = c^{d_Q} \text{ mod } q$,
    /// - $h = (m_p - m_q) \cdot q^{-1} \text{ mod } p$,
    /// - $m = m_q + h \cdot q$.
    ///
    /// When $p$ and $q$ have the same number of digits, both exponentiations
    /// run in lockstep; otherwise one after the other. Either way, inputs are
    /// reduced by Montgomery steps whose count depends on digit lengths only.
    pub fn decrypt_into(&self, ciphertext: &BigNumber, plaintext: &mut BigNumber, scratch: &mut [Digit]) -> Result<()> {
        self.check_set()?;
        let (ep, eq, en) = self.engines();
        check_output(en, plaintext)?;
        check_input(en, ciphertext)?;
        scratch::check(scratch, self.required_scratch())?;

        let (np, nq) = (ep.limbs(), eq.limbs());
        let mut arena = Arena::new(scratch);
        let cp = arena.alloc(np)?;
        let cq = arena.alloc(nq)?;
        let xp = arena.alloc(np)?;
        let xq = arena.alloc(nq)?;
        let mp = arena.alloc(np)?;
        let mq = arena.alloc(nq)?;
        let t = arena.alloc(np)?;
        let u = arena.alloc(np)?;
        let h = arena.alloc(np)?;
        let y = arena.alloc(np + nq)?;
        let work = arena.alloc(2 * np.max(nq) + 2)?;
        let rest = arena.rest();

        let (dp, dq) = self.exponents();
        let (dp, dq) = (SecretExponent::new(dp), SecretExponent::new(dq));
        if np == nq {
            // c < pq < p·R_p, and likewise for q
            ep.modulo_into(cp, ciphertext.digits(), &mut work[..ep.work_len()]);
            eq.modulo_into(cq, ciphertext.digits(), &mut work[..eq.work_len()]);
            let exp_bits = ep.bits().max(eq.bits());
            exponentiation::window_dual_mont([ep, eq], [&mut *xp, &mut *xq], [&*cp, &*cq], [dp, dq], exp_bits, rest)?;
        } else {
            ep.modulo_wide_into(cp, ciphertext.padded_digits(), work);
            eq.modulo_wide_into(cq, ciphertext.padded_digits(), work);
            exponentiation::window_mont(ep, xp, cp, dp, ep.bits(), rest)?;
            exponentiation::window_mont(eq, xq, cq, dq, eq.bits(), rest)?;
        }
        ep.decode_into(mp, xp, work);
        eq.decode_into(mq, xq, work);

        // t = m_q mod p
        if nq <= np {
            ep.modulo_into(t, mq, work);
        } else {
            ep.modulo_wide_into(t, mq, work);
        }

        // h = m_p - t mod p, adding p back on borrow
        let borrow = sub_into(h, mp, t);
        add_into(u, h, ep.modulus());
        ct::conditional_assign(h, u, ct::lowest_bit(borrow));

        // h · q^{-1}: the key stores q^{-1}·R mod p
        ep.mul_assign(h, self.q_inv_mont(), work);

        // y = m_q + h·q < pq, no carry
        mul_into(y, h, eq.modulus());
        add_assign_carry(y, mq);
        plaintext.set_digits(Sign::Positive, y)
    }

    pub fn decrypt(&self, ciphertext: &BigNumber) -> Result<BigNumber> {
        self.check_set()?;
        let (p_bits, q_bits) = self.max_factor_bits();
        let (mut plaintext, mut scratch) = allocate(p_bits + q_bits, self.required_scratch())?;
        self.decrypt_into(ciphertext, &mut plaintext, &mut scratch[..])?;
        Ok(plaintext)
    }

    /// RSASP1, the same operation as [`PrivateKeyType2::decrypt_into`].
    pub fn sign_into(&self, message: &BigNumber, signature: &mut BigNumber, scratch: &mut [Digit]) -> Result<()> {
        self.decrypt_into(message, signature, scratch)
    }

    pub fn sign(&self, message: &BigNumber) -> Result<BigNumber> {
        self.decrypt(message)
    }
}

impl PrivateRsa for PrivateKeyType2 {
    fn modulus_len(&self) -> Result<usize> {
        Ok((self.bits()? + 7) / 8)
    }

    fn rsa_primitive(&self, x: &BigNumber) -> Result<BigNumber> {
        self.decrypt(x)
    }
}
