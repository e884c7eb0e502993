#![cfg_attr(not(test), no_std)]
//! Constant-time RSA on Montgomery arithmetic, `no_std` with `alloc`.
//!
//! Layers, bottom up:
//! - [`BigNumber`]: signed big numbers with a fixed room of [`Digit`]s,
//! - [`MontEngine`]: per-modulus Montgomery constants, with multiplication,
//!   squaring and reduction kernels selected once per engine,
//! - [`exponentiation`]: binary (public exponents), square-and-multiply-always
//!   and fixed-window over a scrambled table (secret exponents),
//! - keys ([`PublicKey`], [`PrivateKeyType1`], [`PrivateKeyType2`]) and the
//!   RSA primitives, the latter working in caller-supplied scratch,
//! - [`keygen`] with Miller-Rabin, and [`padding`] (OAEP, PKCS #1 v1.5).
//!
//! Random numbers come from any [`rand_core::CryptoRng`]. Nothing here installs
//! a logger; events are emitted through [`log`].

extern crate alloc;

mod digit;
pub use digit::{Digit, Digits};
pub(crate) use digit::{DoubleDigit, SignedDoubleDigit};

mod error;
pub use error::{Error, Result};

mod numbers;
pub use numbers::{BigNumber, Sign};

mod arithmetic;
mod ct;
mod scratch;

pub mod montgomery;
pub use montgomery::{CpuFeatures, KernelKind, Kernels, MontEngine};

pub mod exponentiation;
pub use exponentiation::{Method, PublicExponent, SecretExponent};

mod key;
pub use key::{PrivateKeyType1, PrivateKeyType2, PublicKey, Rsa, Rsa1k, Rsa2k, Rsa3k, Rsa4k};

mod primitive;
pub use primitive::{PrivateRsa, PublicRsa};

pub mod padding;
pub mod prime;

pub mod keygen;
pub use keygen::{generate_keys, validate_keys, KeyPair, Validity};

mod f4;
pub use f4::F4;

#[cfg(test)]
mod fixtures;
