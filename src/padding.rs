//! Padding for RSA.
//!
//! Main reference is RFC 8017 (PKCS #1 v2.2).
//!
//! For encipherment, RSAES-OAEP is recommended.
//! This acronym means: RSA Encryption Scheme, with Optimal Asymmetric Encryption Padding.
//! The mask generating function is MGF1 over the same hash as the label hash.
//!
//! PKCS #1 v1.5 padding is of historical (and practical...) interest.
//! It is used both for encipherment and signatures; signatures embed the
//! DER-encoded `DigestInfo` of the message hash.
//!
//! Paddings only see the RSA primitive through [`PublicRsa`] and
//! [`PrivateRsa`], so they work with either type of private key.

use alloc::vec::Vec;
use core::marker::PhantomData;

use digest::{Digest, generic_array::typenum::Unsigned};
use rand_core::{CryptoRng, RngCore};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroizing;

use crate::BigNumber;
use crate::primitive::{PrivateRsa, PublicRsa};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// message too long to fit in number with required padding (encipherment case)
    MessageTooLong,
    /// RFC returns a different error for signature padding.
    /// This is because the message is hashed before signing, so it's a logic error
    /// to pick a modulus that's too small for the digest.
    EncodingError,
    DecodingError,
    /// signature does not match the message
    Inconsistent,
    Rsa(crate::Error),
}

impl From<crate::Error> for Error {
    fn from(error: crate::Error) -> Self {
        Error::Rsa(error)
    }
}

impl From<rand_core::Error> for Error {
    fn from(error: rand_core::Error) -> Self {
        Error::Rsa(error.into())
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::MessageTooLong => f.write_str("message too long"),
            Error::EncodingError => f.write_str("encoding error"),
            Error::DecodingError => f.write_str("decryption error"),
            Error::Inconsistent => f.write_str("invalid signature"),
            Error::Rsa(error) => write!(f, "{}", error),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// Mask Generating Function 1
pub fn xor_mgf1<H: Digest>(hasher: &mut H, seed: &[u8], data: &mut [u8]) {
    hasher.reset();
    let mut c: u32 = 0;
    let h_len = H::OutputSize::to_usize();
    // "If either iterator returns None, next from the zipped iterator will return None"
    // So in the inner zipped loop, if the chunk is undersized, all is good
    for chunk in data.chunks_mut(h_len) {
        hasher.update(seed);
        hasher.update(c.to_be_bytes().as_ref());
        for (byte_to_mask, masking_byte) in chunk.iter_mut().zip(hasher.finalize_reset().iter()) {
            *byte_to_mask ^= *masking_byte;
        }
        c += 1;
    }
}

/// Encoding of a message into `k` bytes, `k` the modulus length.
pub trait EncryptionPadding {
    fn pad<R: CryptoRng + RngCore>(&self, msg: &[u8], k: usize, rng: &mut R) -> Result<Zeroizing<Vec<u8>>>;
    fn unpad(&self, encoded: &[u8]) -> Result<Vec<u8>>;
}

pub trait SignaturePadding {
    fn pad(&self, msg: &[u8], k: usize) -> Result<Vec<u8>>;
    fn verify(&self, msg: &[u8], encoded: &[u8]) -> Result<()>;
}

fn zeroed(len: usize) -> Zeroizing<Vec<u8>> {
    let mut buffer = Vec::with_capacity(len);
    buffer.resize(len, 0);
    Zeroizing::new(buffer)
}

/// `k`-byte big-endian encoding of a primitive's result.
fn octets(x: &BigNumber, k: usize) -> Result<Zeroizing<Vec<u8>>> {
    let mut bytes = zeroed(k);
    x.write_be_bytes(&mut bytes)?;
    Ok(bytes)
}

/// Pad, then apply the public operation.
pub fn encrypt<K, P, R>(key: &K, padding: &P, msg: &[u8], rng: &mut R) -> Result<Vec<u8>>
where
    K: PublicRsa,
    P: EncryptionPadding,
    R: CryptoRng + RngCore,
{
    let k = key.modulus_len()?;
    let encoded = padding.pad(msg, k, rng)?;
    let c = key.rsa_primitive(&BigNumber::from_be_bytes(&encoded))?;
    Ok(octets(&c, k)?.to_vec())
}

/// Apply the private operation, then unpad.
pub fn decrypt<K: PrivateRsa, P: EncryptionPadding>(key: &K, padding: &P, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let k = key.modulus_len()?;
    if ciphertext.len() != k {
        return Err(Error::DecodingError);
    }
    let m = match key.rsa_primitive(&BigNumber::from_be_bytes(ciphertext)) {
        Ok(m) => Zeroizing::new(m),
        Err(crate::Error::OutOfRange) => return Err(Error::DecodingError),
        Err(error) => return Err(error.into()),
    };
    padding.unpad(&octets(&m, k)?)
}

/// Pad, then apply the private operation.
pub fn sign<K: PrivateRsa, P: SignaturePadding>(key: &K, padding: &P, msg: &[u8]) -> Result<Vec<u8>> {
    let k = key.modulus_len()?;
    let encoded = padding.pad(msg, k)?;
    let s = key.rsa_primitive(&BigNumber::from_be_bytes(&encoded))?;
    Ok(octets(&s, k)?.to_vec())
}

/// Apply the public operation, then check the padding against the message.
pub fn verify<K: PublicRsa, P: SignaturePadding>(key: &K, padding: &P, msg: &[u8], signature: &[u8]) -> Result<()> {
    let k = key.modulus_len()?;
    if signature.len() != k {
        return Err(Error::Inconsistent);
    }
    let m = match key.rsa_primitive(&BigNumber::from_be_bytes(signature)) {
        Ok(m) => m,
        Err(crate::Error::OutOfRange) => return Err(Error::Inconsistent),
        Err(error) => return Err(error.into()),
    };
    padding.verify(msg, &octets(&m, k)?)
}

/// ## Optimal Asymmetric Encryption Padding
///
/// data block DB = lHash || PS || 01 || M,
/// where padding string PS is k - msg.len() - 2*h_len - 2 zeros
///
/// then encoded message EM = 00 || masked seed || masked DB,
/// where first the random seed (of length hash::output) masks the DB,
/// and then the DB masks the seed
pub struct Oaep<'l, H: Digest> {
    label: &'l [u8],
    __: PhantomData<H>,
}

impl<H: Digest> Oaep<'static, H> {
    /// OAEP with the empty label.
    pub fn new() -> Self {
        Self { label: &[], __: PhantomData }
    }
}

impl<H: Digest> Default for Oaep<'static, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'l, H: Digest> Oaep<'l, H> {
    pub fn with_label(label: &'l [u8]) -> Self {
        Self { label, __: PhantomData }
    }
}

impl<'l, H: Digest> EncryptionPadding for Oaep<'l, H> {
    fn pad<R: CryptoRng + RngCore>(&self, msg: &[u8], k: usize, rng: &mut R) -> Result<Zeroizing<Vec<u8>>> {
        // 2. check message not too long
        let h_len = H::OutputSize::to_usize();
        if k < 2 * h_len + 2 || msg.len() > k - 2 * h_len - 2 {
            return Err(Error::MessageTooLong);
        }

        // 3. construct datablock
        let mut encoded = zeroed(k);
        let (seed, data_block) = encoded[1..].split_at_mut(h_len);

        let mut hasher = H::new();
        hasher.update(self.label);
        data_block[..h_len].copy_from_slice(&hasher.finalize_reset());
        let ps_len = k - msg.len() - 2 * h_len - 2;
        data_block[h_len + ps_len] = 0x1;
        data_block[h_len + ps_len + 1..].copy_from_slice(msg);

        // 4.
        rng.try_fill_bytes(seed)?;

        // 5. + 6. calculate maskedDB
        xor_mgf1(&mut hasher, seed, data_block);

        // 7. + 8. calculate maskedSeed
        xor_mgf1(&mut hasher, data_block, seed);

        Ok(encoded)
    }

    fn unpad(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let k = encoded.len();
        let h_len = H::OutputSize::to_usize();

        // 1.
        if k < 2 * h_len + 2 {
            return Err(Error::DecodingError);
        }

        // 3.
        let mut unmasked = zeroed(k);
        unmasked.copy_from_slice(encoded);
        let (y, rest) = unmasked.split_at_mut(1);
        // still masked at this point
        let (seed, data_block) = rest.split_at_mut(h_len);

        let mut hasher = H::new();
        xor_mgf1(&mut hasher, data_block, seed);
        xor_mgf1(&mut hasher, seed, data_block);

        hasher.update(self.label);
        let l_hash = hasher.finalize_reset();

        // every check runs, only their conjunction is branched on
        let mut good = y[0].ct_eq(&0) & data_block[..h_len].ct_eq(&l_hash[..]);
        let mut looking = Choice::from(1);
        let mut separator: u32 = 0;
        for (i, byte) in data_block[h_len..].iter().enumerate() {
            let is_one = byte.ct_eq(&1);
            let is_zero = byte.ct_eq(&0);
            good &= !(looking & !is_one & !is_zero);
            separator.conditional_assign(&(i as u32), looking & is_one);
            looking &= !is_one;
        }
        good &= !looking;

        if !bool::from(good) {
            return Err(Error::DecodingError);
        }
        Ok(data_block[h_len + separator as usize + 1..].to_vec())
    }
}

///  ## PKCS #1 v1.5 padding for encipherment
///
///  Defined in RFC 2313 (= PKCS #1 v1.5), see also
///  RFC 2437 (v2.0) and RFC 8017 (v2.2)
///
///  EM = 00 || 02 || PS || 00 || M
///
///  "encoded message", where the padding string PS is at least 8 bytes,
///  all non-zeros, and fills out the block.
pub struct Pkcs1V1_5;

/// Draws per padding byte before giving up on the random number generator.
const NONZERO_ATTEMPTS: usize = 64;

fn nonzero_byte<R: CryptoRng + RngCore>(rng: &mut R) -> Result<u8> {
    let mut trial = [0u8; 1];
    for _ in 0..NONZERO_ATTEMPTS {
        rng.try_fill_bytes(&mut trial)?;
        if trial[0] != 0 {
            return Ok(trial[0]);
        }
    }
    Err(Error::Rsa(crate::Error::InsufficientEntropy))
}

impl EncryptionPadding for Pkcs1V1_5 {
    fn pad<R: CryptoRng + RngCore>(&self, msg: &[u8], k: usize, rng: &mut R) -> Result<Zeroizing<Vec<u8>>> {
        if msg.len() + 11 > k {
            return Err(Error::MessageTooLong);
        }

        let mut encoded = zeroed(k);
        encoded[1] = 0x02;
        let padding_string_len = k - msg.len() - 3;
        for byte in encoded[2..][..padding_string_len].iter_mut() {
            *byte = nonzero_byte(rng)?;
        }
        encoded[k - msg.len()..].copy_from_slice(msg);
        Ok(encoded)
    }

    fn unpad(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        if encoded.len() < 11 || encoded[0] != 0 || encoded[1] != 2 {
            return Err(Error::DecodingError);
        }
        let separator = encoded[2..].iter()
            .position(|&byte| byte == 0)
            .ok_or(Error::DecodingError)?;
        if separator < 8 {
            return Err(Error::DecodingError);
        }
        Ok(encoded[2 + separator + 1..].to_vec())
    }
}

/// Hash functions with a DER-encoded `AlgorithmIdentifier` for PKCS #1 v1.5 signatures.
pub trait DigestInfo: Digest {
    /// `DigestInfo` up to the hash value itself, RFC 8017 section 9.2 note 1.
    const PREFIX: &'static [u8];
}

#[cfg(feature = "sha1-sig")]
impl DigestInfo for sha1::Sha1 {
    const PREFIX: &'static [u8] = &hex_literal::hex!("3021300906052b0e03021a05000414");
}

#[cfg(feature = "sha2-sig")]
impl DigestInfo for sha2::Sha256 {
    const PREFIX: &'static [u8] = &hex_literal::hex!("3031300d060960864801650304020105000420");
}

#[cfg(feature = "sha2-sig")]
impl DigestInfo for sha2::Sha384 {
    const PREFIX: &'static [u8] = &hex_literal::hex!("3041300d060960864801650304020205000430");
}

#[cfg(feature = "sha2-sig")]
impl DigestInfo for sha2::Sha512 {
    const PREFIX: &'static [u8] = &hex_literal::hex!("3051300d060960864801650304020305000440");
}

///  ## PKCS #1 v1.5 padding for signatures
///
///  EM = 00 || 01 || PS || 00 || T
///
///  where T is the `DigestInfo` of the message hash, and PS is at least
///  8 bytes of 0xFF. There is no randomness; verification re-encodes
///  the message and compares.
pub struct Pkcs1V1_5Signature<H: DigestInfo> {
    __: PhantomData<H>,
}

impl<H: DigestInfo> Pkcs1V1_5Signature<H> {
    pub fn new() -> Self {
        Self { __: PhantomData }
    }
}

impl<H: DigestInfo> Default for Pkcs1V1_5Signature<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: DigestInfo> SignaturePadding for Pkcs1V1_5Signature<H> {
    fn pad(&self, msg: &[u8], k: usize) -> Result<Vec<u8>> {
        let t_len = H::PREFIX.len() + H::OutputSize::to_usize();
        if k < t_len + 11 {
            return Err(Error::EncodingError);
        }

        let mut encoded = Vec::with_capacity(k);
        encoded.resize(k, 0xFF);
        encoded[0] = 0x00;
        encoded[1] = 0x01;
        encoded[k - t_len - 1] = 0x00;
        encoded[k - t_len..][..H::PREFIX.len()].copy_from_slice(H::PREFIX);
        encoded[k - H::OutputSize::to_usize()..].copy_from_slice(&H::digest(msg));
        Ok(encoded)
    }

    fn verify(&self, msg: &[u8], encoded: &[u8]) -> Result<()> {
        let expected = self.pad(msg, encoded.len()).map_err(|_| Error::Inconsistent)?;
        if bool::from(expected.as_slice().ct_eq(encoded)) {
            Ok(())
        } else {
            Err(Error::Inconsistent)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fixtures::*;
    use rand::{rngs::StdRng, SeedableRng};
    use sha2::Sha256;

    #[test]
    fn mgf1_is_an_involution() {
        let mut data = *b"some data that is longer than one sha-256 output block";
        let mut hasher = Sha256::new();
        xor_mgf1(&mut hasher, b"seed", &mut data);
        assert_ne!(&data[..], &b"some data that is longer than one sha-256 output block"[..]);
        xor_mgf1(&mut hasher, b"seed", &mut data);
        assert_eq!(&data[..], &b"some data that is longer than one sha-256 output block"[..]);
    }

    #[test]
    fn oaep_round_trip() {
        let (p, q) = pq512();
        let (public, type1, type2) = keys(&p, &q);
        let mut rng = StdRng::seed_from_u64(0x0AE9);

        let oaep = Oaep::<Sha256>::new();
        let ciphertext = encrypt(&public, &oaep, b"yamnord", &mut rng).unwrap();
        assert_eq!(ciphertext.len(), 128);
        assert_eq!(decrypt(&type1, &oaep, &ciphertext).unwrap(), b"yamnord");
        assert_eq!(decrypt(&type2, &oaep, &ciphertext).unwrap(), b"yamnord");

        // randomized
        let again = encrypt(&public, &oaep, b"yamnord", &mut rng).unwrap();
        assert_ne!(again, ciphertext);

        // empty message, and the longest one that fits
        let ciphertext = encrypt(&public, &oaep, b"", &mut rng).unwrap();
        assert!(decrypt(&type2, &oaep, &ciphertext).unwrap().is_empty());
        let longest = [0x5A; 128 - 2 * 32 - 2];
        let ciphertext = encrypt(&public, &oaep, &longest, &mut rng).unwrap();
        assert_eq!(decrypt(&type2, &oaep, &ciphertext).unwrap(), &longest[..]);
        assert_eq!(encrypt(&public, &oaep, &[0x5A; 128 - 2 * 32 - 1], &mut rng), Err(Error::MessageTooLong));
    }

    #[test]
    fn oaep_label_must_match() {
        let (p, q) = pq512();
        let (public, _, type2) = keys(&p, &q);
        let mut rng = StdRng::seed_from_u64(0x1ABE1);

        let labelled = Oaep::<Sha256>::with_label(b"label");
        let ciphertext = encrypt(&public, &labelled, b"yamnord", &mut rng).unwrap();
        assert_eq!(decrypt(&type2, &labelled, &ciphertext).unwrap(), b"yamnord");
        assert_eq!(decrypt(&type2, &Oaep::<Sha256>::new(), &ciphertext), Err(Error::DecodingError));
    }

    #[test]
    fn oaep_tampering() {
        let (p, q) = pq512();
        let (public, _, type2) = keys(&p, &q);
        let mut rng = StdRng::seed_from_u64(7);
        let oaep = Oaep::<Sha256>::new();

        let mut ciphertext = encrypt(&public, &oaep, b"yamnord", &mut rng).unwrap();
        ciphertext[64] ^= 1;
        assert_eq!(decrypt(&type2, &oaep, &ciphertext), Err(Error::DecodingError));
        assert_eq!(decrypt(&type2, &oaep, &ciphertext[1..]), Err(Error::DecodingError));
    }

    #[test]
    fn pkcs1_v1_5_round_trip() {
        let (p, q) = pq512();
        let (public, type1, _) = keys(&p, &q);
        let mut rng = StdRng::seed_from_u64(15);

        let ciphertext = encrypt(&public, &Pkcs1V1_5, b"hello, world!", &mut rng).unwrap();
        assert_eq!(decrypt(&type1, &Pkcs1V1_5, &ciphertext).unwrap(), b"hello, world!");
        assert_eq!(encrypt(&public, &Pkcs1V1_5, &[1; 118], &mut rng), Err(Error::MessageTooLong));
    }

    #[test]
    fn pkcs1_v1_5_encoding() {
        let mut rng = CountingRng(0);
        let encoded = Pkcs1V1_5.pad(b"abc", 16, &mut rng).unwrap();
        assert_eq!(&encoded[..2], &[0x00, 0x02]);
        assert!(encoded[2..12].iter().all(|&byte| byte != 0));
        assert_eq!(&encoded[12..], b"\0abc");
        assert_eq!(Pkcs1V1_5.unpad(&encoded).unwrap(), b"abc");

        // padding string shorter than 8 bytes
        let mut short = [0xAA; 16];
        short[0] = 0;
        short[1] = 2;
        short[9] = 0;
        assert_eq!(Pkcs1V1_5.unpad(&short), Err(Error::DecodingError));
    }

    #[test]
    fn broken_rng() {
        let (p, q) = pq512();
        let (public, _, _) = keys(&p, &q);
        assert_eq!(
            encrypt(&public, &Oaep::<Sha256>::new(), b"yamnord", &mut BrokenRng),
            Err(Error::Rsa(crate::Error::InternalError)),
        );
        assert_eq!(
            encrypt(&public, &Pkcs1V1_5, b"yamnord", &mut BrokenRng),
            Err(Error::Rsa(crate::Error::InternalError)),
        );
    }

    #[test]
    fn rng_of_zeros_is_given_up_on() {
        let (p, q) = pq512();
        let (public, _, _) = keys(&p, &q);
        assert_eq!(
            encrypt(&public, &Pkcs1V1_5, b"yamnord", &mut ZeroRng),
            Err(Error::Rsa(crate::Error::InsufficientEntropy)),
        );
    }

    #[test]
    #[cfg(feature = "sha2-sig")]
    fn known_signature() {
        let (p, q) = pq512();
        let (public, type1, type2) = keys(&p, &q);
        let padding = Pkcs1V1_5Signature::<Sha256>::new();

        let signature = sign(&type2, &padding, b"yamnord").unwrap();
        assert_eq!(signature, &YAMNORD_SIGNED_SHA256[..]);
        assert_eq!(sign(&type1, &padding, b"yamnord").unwrap(), signature);
        verify(&public, &padding, b"yamnord", &signature).unwrap();

        assert_eq!(verify(&public, &padding, b"yamnorD", &signature), Err(Error::Inconsistent));
        let mut forged = signature.clone();
        forged[0] ^= 0x80;
        assert_eq!(verify(&public, &padding, b"yamnord", &forged), Err(Error::Inconsistent));
    }

    #[test]
    #[cfg(feature = "sha2-sig")]
    fn digest_too_long_for_modulus() {
        let (p, q) = pq256();
        let (_, _, type2) = keys(&p, &q);
        // 512-bit modulus: 64 bytes < 19 + 64 + 11
        assert_eq!(
            sign(&type2, &Pkcs1V1_5Signature::<sha2::Sha512>::new(), b"yamnord"),
            Err(Error::EncodingError),
        );
    }

    #[test]
    #[cfg(feature = "sha1-sig")]
    fn sha1_signature() {
        let (p, q) = pq256();
        let (public, _, type2) = keys(&p, &q);
        let padding = Pkcs1V1_5Signature::<sha1::Sha1>::new();
        let signature = sign(&type2, &padding, b"legacy").unwrap();
        verify(&public, &padding, b"legacy", &signature).unwrap();
    }
}
