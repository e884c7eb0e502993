//! Test vectors and deterministic randomness.
//!
//! Every prime pair has `P > Q`, both with their two top bits set (so the
//! product has full length), and `gcd(65537, P - 1) = gcd(65537, Q - 1) = 1`.

use hex_literal::hex;
use rand_core::{impls, CryptoRng, Error, RngCore};

use crate::{BigNumber, PrivateKeyType1, PrivateKeyType2, PublicKey, F4};

pub const P256: [u8; 32] = hex!(
    "e97451960dd1519c0f754c75f48aa701999ddfb849071a5a87bdc5753f312743"
);

pub const Q256: [u8; 32] = hex!(
    "e3356714c3a2453625c06752c25316a9eb41c4ff504d65af8271925f8e540a7f"
);

pub const P512: [u8; 64] = hex!(
    "c85be535bf4450b03cace88614a7232f89933175b0db707f857f6f3ac3b313907d3c81ec199e9a665ecda800d02b23cc115b25ac5da091dc00228aa57abee229"
);

pub const Q512: [u8; 64] = hex!(
    "c667edfe993253713a5e006670b729f4681a33beda4638421318ab42f72842c858d92132f9b099a2482dfbbee874005c4ed95485eba568e120e01003fd2fedcb"
);

pub const P1024: [u8; 128] = hex!(
    "d87360fd63c9c991bad08bbeb296436b54a3ac55973ae445ac4df8066df5e6e5c6ade97232a25d6f4e365888ca52153372a9d45f27989dcef9473980cb1ce3c69227f51368d22a804738225082b5aa672026e0455a0a5b3ab95ffa9a5c2cc26aee2fc97b79fdb36bff79cac12f4eb7cd5b6b0a12327e64f0457768ba0690ece3"
);

pub const Q1024: [u8; 128] = hex!(
    "c1dfb57ce7a7cf74d43529639940604be93f56325d331ee2c1d8543fb431b79d3cf7b7164028df330e895c112a85d1494bcf7e9bdd71f0261b325b1b47d2a5bd623ad02503e1ea3611a36ed1711355a1dfb1810d52d72feb8bc9de92068b77c535ee11143dd4e3d7457d55c4ac9c7ee1f4509f7a0d78f58c8ebfadd8c243b057"
);

/// Factors of different digit lengths.
pub const P320: [u8; 40] = hex!("fd265fbfbff8319287cbc7d831cf0df85e144b77841617bef8634cd96bf819fc9b7418889607b9a7");
pub const Q192: [u8; 24] = hex!("e8e9e03aa86af2c3d8f94eae9f05fe8b400ecb018cb62173");

/// `b"yamnord"^65537 mod P512·Q512`
pub const YAMNORD_ENCRYPTED: [u8; 128] = hex!(
    "148de66dff9f34d67801a4d24c7a3a26edb92d9767c6fbd628967de3a1effe2086c250a19fda89603c013056ca678e987c36e1d7bda7f94c7513ea093ed25658356bd0dc4c5ed0a7bc709301ad5ee69064259ed614313eeac58e80158a4d11a629bc3caad41def67665da2e8cee3c154f3a5ca516fe32a7f5378ceb4fc677cf9"
);

/// RSASSA-PKCS1-v1_5 signature with SHA-256 of `b"yamnord"`, key P512·Q512.
pub const YAMNORD_SIGNED_SHA256: [u8; 128] = hex!(
    "2b3ca9988445d359fb3755f69dba4ef1fcedac087171d655d3262518e44b1d3cf6f76e5b789c47ea234a979136cef5ff4a9b9f297602ab7e24df7dfda00b68b24ef37c80e622d9e98b9bb950b1083cf3e171463731a37a28c36d312fa80ca0188ab5f1e62b1ca6bf6066be0679f7feb5d55c8b72e7ddc6a8f7cc6653f0808b85"
);

pub fn number(bytes: &[u8]) -> BigNumber {
    BigNumber::from_be_bytes(bytes)
}

/// Prime pair of a 512-bit modulus.
pub fn pq256() -> (BigNumber, BigNumber) {
    (number(&P256), number(&Q256))
}

/// Prime pair of a 1024-bit modulus.
pub fn pq512() -> (BigNumber, BigNumber) {
    (number(&P512), number(&Q512))
}

/// Prime pair of a 2048-bit modulus.
pub fn pq1024() -> (BigNumber, BigNumber) {
    (number(&P1024), number(&Q1024))
}

/// Prime pair of unequal digit lengths.
pub fn pq_unequal() -> (BigNumber, BigNumber) {
    (number(&P320), number(&Q192))
}

/// Not random at all: emits 0, 1, 2, ... as little-endian `u64`s.
pub struct CountingRng(pub u64);

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for CountingRng {}

/// Fails every request.
pub struct BrokenRng;

impl RngCore for BrokenRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {}

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), Error> {
        Err(Error::from(core::num::NonZeroU32::new(Error::CUSTOM_START).unwrap()))
    }
}

impl CryptoRng for BrokenRng {}

/// Never fails, never yields anything but zeros.
pub struct ZeroRng;

impl RngCore for ZeroRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.iter_mut().for_each(|byte| *byte = 0);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for ZeroRng {}

/// $(d, d_P, d_Q, q^{-1})$ for factors `p`, `q` and exponent $F4$.
pub fn crt_components(p: &BigNumber, q: &BigNumber) -> (BigNumber, BigNumber, BigNumber, BigNumber) {
    let e = F4::exponent();
    let (p1, q1) = (p.sub_digit(1), q.sub_digit(1));
    let d = e.mod_inverse(&p1.lcm(&q1).unwrap()).unwrap();
    let dp = d.modulo(&p1).unwrap();
    let dq = d.modulo(&q1).unwrap();
    let q_inv = q.mod_inverse(p).unwrap();
    (d, dp, dq, q_inv)
}

/// All three keys for factors `p`, `q` and exponent $F4$.
pub fn keys(p: &BigNumber, q: &BigNumber) -> (PublicKey, PrivateKeyType1, PrivateKeyType2) {
    let n = p.mul(q);
    let (d, dp, dq, q_inv) = crt_components(p, q);

    let mut public = PublicKey::new(n.bit_len(), F4::BITS).unwrap();
    public.set(&n, &F4::exponent()).unwrap();
    let mut type1 = PrivateKeyType1::new(n.bit_len(), n.bit_len()).unwrap();
    type1.set(&n, &d).unwrap();
    let mut type2 = PrivateKeyType2::new(p.bit_len(), q.bit_len()).unwrap();
    type2.set(p, q, &dp, &dq, &q_inv).unwrap();
    (public, type1, type2)
}
