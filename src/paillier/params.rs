use crypto_bigint::{U1024, U2048, U4096, U512, U8192};
use rand_core::CryptoRngCore;

use crate::uint::{HasWide, UintLike};

/// Integer widths and prime sizes for one Paillier instantiation.
///
/// The same modulus sizes are reused for the Ring-Pedersen commitment
/// parameters generated alongside the Paillier keys during refresh.
pub trait PaillierParams: Clone + Copy + core::fmt::Debug + PartialEq + Eq + Send + Sync + 'static {
    /// The bit size of each of the two prime factors of the modulus.
    const PRIME_BITS: u32;

    /// The byte size of one prime factor.
    const PRIME_BYTES: usize = (Self::PRIME_BITS as usize) / 8;

    /// The byte size of the modulus `N`.
    const MODULUS_BYTES: usize = (Self::PRIME_BITS as usize) / 4;

    /// An integer the size of a prime factor.
    type HalfUint: UintLike + HasWide<Wide = Self::Uint>;
    /// An integer the size of the modulus, the plaintext space.
    type Uint: UintLike + HasWide<Wide = Self::WideUint>;
    /// An integer the size of `N²`, the ciphertext space.
    type WideUint: UintLike + HasWide<Wide = Self::ExtraWideUint>;
    /// Scratch width for multiplication of ciphertext-sized values.
    type ExtraWideUint: UintLike;

    /// Samples a safe prime of `PRIME_BITS` bits.
    fn generate_safe_prime(rng: &mut impl CryptoRngCore) -> Self::HalfUint;

    /// A probabilistic primality check, used by verifiers
    /// to reject prime or prime-power moduli.
    fn is_prime(candidate: &Self::Uint) -> bool;
}

/// 2048-bit Paillier modulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaillierProduction;

impl PaillierParams for PaillierProduction {
    const PRIME_BITS: u32 = 1024;
    type HalfUint = U1024;
    type Uint = U2048;
    type WideUint = U4096;
    type ExtraWideUint = U8192;

    fn generate_safe_prime(rng: &mut impl CryptoRngCore) -> Self::HalfUint {
        crypto_primes::generate_safe_prime_with_rng(rng, Self::PRIME_BITS)
    }

    fn is_prime(candidate: &Self::Uint) -> bool {
        crypto_primes::is_prime_with_rng(&mut rand_core::OsRng, candidate)
    }
}

/// 1024-bit Paillier modulus. Not secure; this makes prime generation
/// fast enough for protocol tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaillierTest;

impl PaillierParams for PaillierTest {
    const PRIME_BITS: u32 = 512;
    type HalfUint = U512;
    type Uint = U1024;
    type WideUint = U2048;
    type ExtraWideUint = U4096;

    fn generate_safe_prime(rng: &mut impl CryptoRngCore) -> Self::HalfUint {
        crypto_primes::generate_safe_prime_with_rng(rng, Self::PRIME_BITS)
    }

    fn is_prime(candidate: &Self::Uint) -> bool {
        crypto_primes::is_prime_with_rng(&mut rand_core::OsRng, candidate)
    }
}
