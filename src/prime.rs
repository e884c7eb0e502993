//! Prime candidates, small-prime sieve and the Miller–Rabin test.
//!
//! Candidates are secret (they become key factors), so the witness
//! exponentiation runs on the constant-time window path. The sieve and
//! the final comparisons only ever reject candidates, which are discarded.

use alloc::vec;
use core::cmp::Ordering;

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::{BigNumber, Digit, Error, MontEngine, Result};
use crate::arithmetic::subtract::sub_into;
use crate::exponentiation::{self, Method, SecretExponent};

/// Attempts at drawing one witness in `[2, n - 2]` before giving up.
pub const WITNESS_RESAMPLING: usize = 64;

/// The odd primes below 2048.
pub const SMALL_PRIMES: [u16; 308] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59,
    61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137,
    139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227,
    229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313,
    317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509,
    521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617,
    619, 631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701, 709, 719, 727,
    733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811, 821, 823, 827, 829,
    839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919, 929, 937, 941, 947,
    953, 967, 971, 977, 983, 991, 997, 1009, 1013, 1019, 1021, 1031, 1033, 1039, 1049, 1051,
    1061, 1063, 1069, 1087, 1091, 1093, 1097, 1103, 1109, 1117, 1123, 1129, 1151, 1153, 1163, 1171,
    1181, 1187, 1193, 1201, 1213, 1217, 1223, 1229, 1231, 1237, 1249, 1259, 1277, 1279, 1283, 1289,
    1291, 1297, 1301, 1303, 1307, 1319, 1321, 1327, 1361, 1367, 1373, 1381, 1399, 1409, 1423, 1427,
    1429, 1433, 1439, 1447, 1451, 1453, 1459, 1471, 1481, 1483, 1487, 1489, 1493, 1499, 1511, 1523,
    1531, 1543, 1549, 1553, 1559, 1567, 1571, 1579, 1583, 1597, 1601, 1607, 1609, 1613, 1619, 1621,
    1627, 1637, 1657, 1663, 1667, 1669, 1693, 1697, 1699, 1709, 1721, 1723, 1733, 1741, 1747, 1753,
    1759, 1777, 1783, 1787, 1789, 1801, 1811, 1823, 1831, 1847, 1861, 1867, 1871, 1873, 1877, 1879,
    1889, 1901, 1907, 1913, 1931, 1933, 1949, 1951, 1973, 1979, 1987, 1993, 1997, 1999, 2003, 2011,
    2017, 2027, 2029, 2039,
];

/// Miller–Rabin rounds bounding the error probability by $2^{-80}$ for random
/// candidates of `bits` bits.
pub fn mr_rounds(bits: usize) -> usize {
    match bits {
        bits if bits >= 1300 => 2,
        bits if bits >= 850 => 3,
        bits if bits >= 650 => 4,
        bits if bits >= 550 => 5,
        bits if bits >= 450 => 6,
        bits if bits >= 400 => 7,
        bits if bits >= 350 => 8,
        bits if bits >= 300 => 9,
        bits if bits >= 250 => 12,
        bits if bits >= 200 => 15,
        bits if bits >= 150 => 18,
        _ => 27,
    }
}

/// Exact primality of a digit below $2048^2$, by trial division.
pub fn is_small_prime(n: Digit) -> bool {
    debug_assert!((n as u64) < 2048 * 2048);
    match n {
        0 | 1 => false,
        2 => true,
        n if n & 1 == 0 => false,
        n => SMALL_PRIMES.iter()
            .map(|&p| p as Digit)
            .take_while(|&p| p * p <= n)
            .all(|p| n % p != 0),
    }
}

/// Does `n` survive division by every small prime?
///
/// Meant for `n` above the table, a small prime itself fails.
pub fn sieve(n: &BigNumber) -> Result<bool> {
    for &p in SMALL_PRIMES.iter() {
        if n.rem_digit(p as Digit)? == 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// A uniformly random number of at most `bits` bits.
pub(crate) fn random_bits<R>(bits: usize, rng: &mut R) -> Result<BigNumber>
where
    R: CryptoRng + RngCore,
{
    let mut bytes = vec![0u8; (bits + 7) / 8];
    rng.try_fill_bytes(&mut bytes)?;
    if let Some(top) = bytes.first_mut() {
        *top &= 0xff >> (8 * ((bits + 7) / 8) - bits);
    }
    let number = BigNumber::from_be_bytes(&bytes);
    bytes.zeroize();
    Ok(number)
}

/// A random odd number of exactly `bits` bits.
///
/// Fails with `BadArgument` for fewer than two bits.
pub fn random_candidate<R>(bits: usize, rng: &mut R) -> Result<BigNumber>
where
    R: CryptoRng + RngCore,
{
    if bits < 2 {
        return Err(Error::BadArgument);
    }
    let mut bytes = vec![0u8; (bits + 7) / 8];
    rng.try_fill_bytes(&mut bytes)?;
    let excess = 8 * bytes.len() - bits;
    bytes[0] &= 0xff >> excess;
    bytes[0] |= 0x80 >> excess;
    let last = bytes.len() - 1;
    bytes[last] |= 1;

    let candidate = BigNumber::from_be_bytes(&bytes);
    bytes.zeroize();
    Ok(candidate)
}

/// A uniform witness in `[2, n - 2]`, by rejection sampling.
fn random_witness<R>(n: &BigNumber, rng: &mut R) -> Result<BigNumber>
where
    R: CryptoRng + RngCore,
{
    let upper = n.sub_digit(2);
    for _ in 0..WITNESS_RESAMPLING {
        let witness = random_bits(n.bit_len(), rng)?;
        if witness.cmp_magnitude(&BigNumber::from_digit(2)) != Ordering::Less && witness <= upper {
            return Ok(witness);
        }
    }
    log::debug!("witness resampling exhausted");
    Err(Error::InsufficientEntropy)
}

/// Miller–Rabin with `rounds` random witnesses (`0` selects [`mr_rounds`]).
///
/// Returns `Ok(false)` as soon as a witness proves `n` composite.
/// Fails with `BadArgument` for negative `n`, with `InsufficientEntropy` if no
/// witness could be drawn, and with `InternalError` if the generator fails.
pub fn is_probably_prime<R>(n: &BigNumber, rounds: usize, rng: &mut R) -> Result<bool>
where
    R: CryptoRng + RngCore,
{
    if n.is_negative() {
        return Err(Error::BadArgument);
    }
    if n.size() == 1 && (n.digits()[0] as u64) < 2048 * 2048 {
        return Ok(is_small_prime(n.digits()[0]));
    }
    if !n.is_odd() || !sieve(n)? {
        return Ok(false);
    }

    let bits = n.bit_len();
    let rounds = if rounds == 0 { mr_rounds(bits) } else { rounds };

    // n - 1 = 2^s d, d odd
    let n_minus_one = n.sub_digit(1);
    let s = (0..bits).find(|&i| n_minus_one.bit(i)).unwrap_or(0);
    let d = n_minus_one.shr_bits(s);

    let mut engine = MontEngine::new(bits)?;
    engine.init(n)?;
    let limbs = engine.limbs();
    let mut minus_one = vec![0; limbs];
    sub_into(&mut minus_one, engine.modulus(), engine.r());

    let mut x = vec![0; limbs];
    let mut scratch = vec![0; exponentiation::scratch_len(bits, bits, Method::Window)];
    let result = (|| -> Result<bool> {
        for _ in 0..rounds {
            let witness = random_witness(n, rng)?;
            exponentiation::window_mont(&engine, &mut x, witness.digits(), SecretExponent::new(&d), bits, &mut scratch)?;
            if x[..] == engine.r()[..] || x == minus_one {
                continue;
            }

            let mut passed = false;
            for _ in 1..s {
                engine.sqr_assign(&mut x, &mut scratch);
                if x == minus_one {
                    passed = true;
                    break;
                }
                if x[..] == engine.r()[..] {
                    break;
                }
            }
            if !passed {
                return Ok(false);
            }
        }
        Ok(true)
    })();

    scratch.zeroize();
    x.zeroize();
    engine.zeroize();
    result
}
