//! Fixed-width big-integer arithmetic over the `crypto-bigint` backend.
//!
//! Every modular operation takes the modulus explicitly; moduli are odd
//! throughout the protocol (RSA moduli, their squares, the curve order),
//! which lets Montgomery forms back all multiplication and exponentiation.

pub(crate) mod signed;

use crypto_bigint::modular::{MontyForm, MontyParams};
use crypto_bigint::subtle::CtOption;
use crypto_bigint::{
    Encoding, Integer, NonZero, Odd, Random, RandomBits, RandomMod, U1024, U2048, U4096, U512,
    U8192,
};
use rand_core::CryptoRngCore;
use zeroize::Zeroize;

pub(crate) use signed::Signed;

use crate::tools::hashing::{Chain, Hashable};

pub trait UintLike:
    Clone
    + Copy
    + core::fmt::Debug
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + Send
    + Sync
    + 'static
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Zeroize
    + Hashable
{
    const BITS: u32;
    const BYTES: usize;

    fn zero() -> Self;
    fn one() -> Self;
    fn from_u64(value: u64) -> Self;

    /// Big-endian decoding; `bytes` may be shorter than `Self::BYTES`
    /// and is then left-padded with zeros.
    fn from_be_slice_padded(bytes: &[u8]) -> Self;
    fn to_be_bytes_vec(&self) -> Vec<u8>;

    fn is_zero(&self) -> bool;
    fn is_even(&self) -> bool;
    fn is_odd(&self) -> bool {
        !self.is_even()
    }
    /// The minimal number of bits needed to represent the value.
    fn bits(&self) -> u32;
    fn lowest_u64(&self) -> u64;

    fn wrapping_add(&self, rhs: &Self) -> Self;
    fn wrapping_sub(&self, rhs: &Self) -> Self;
    fn wrapping_mul(&self, rhs: &Self) -> Self;
    fn wrapping_shl(&self, shift: u32) -> Self;
    fn wrapping_shr(&self, shift: u32) -> Self;

    fn add_mod(&self, rhs: &Self, modulus: &Self) -> Self;
    fn sub_mod(&self, rhs: &Self, modulus: &Self) -> Self;
    fn neg_mod(&self, modulus: &Self) -> Self;
    /// Modular multiplication; `modulus` must be odd.
    fn mul_mod(&self, rhs: &Self, modulus: &Self) -> Self;
    /// Modular exponentiation; `modulus` must be odd.
    fn pow_mod(&self, exp: &Self, modulus: &Self) -> Self;
    fn inv_mod(&self, modulus: &Self) -> Option<Self>;
    fn rem(&self, modulus: &Self) -> Self;
    fn div_rem(&self, divisor: &Self) -> (Self, Self);

    fn random(rng: &mut impl CryptoRngCore) -> Self;
    fn random_below(rng: &mut impl CryptoRngCore, bound: &Self) -> Self;
    fn random_bits(rng: &mut impl CryptoRngCore, bits: u32) -> Self;

    /// Euclidean greatest common divisor.
    fn gcd(&self, other: &Self) -> Self {
        let mut a = *self;
        let mut b = *other;
        while !b.is_zero() {
            let r = a.rem(&b);
            a = b;
            b = r;
        }
        a
    }

    /// The Jacobi symbol `(self / n)` for odd `n`.
    fn jacobi(&self, n: &Self) -> i8 {
        debug_assert!(n.is_odd());
        let mut a = self.rem(n);
        let mut n = *n;
        let mut t = 1i8;
        while !a.is_zero() {
            while a.is_even() {
                a = a.wrapping_shr(1);
                let r = n.lowest_u64() & 7;
                if r == 3 || r == 5 {
                    t = -t;
                }
            }
            core::mem::swap(&mut a, &mut n);
            if (a.lowest_u64() & 3) == 3 && (n.lowest_u64() & 3) == 3 {
                t = -t;
            }
            a = a.rem(&n);
        }
        if n == Self::one() {
            t
        } else {
            0
        }
    }
}

/// A uint with a double-width counterpart, for operations whose intermediate
/// values exceed the base width (multiplication mod N², wide ZKP responses).
pub trait HasWide: UintLike {
    type Wide: UintLike;

    fn into_wide(&self) -> Self::Wide;
    fn mul_wide(&self, rhs: &Self) -> Self::Wide;
    /// Succeeds iff the value fits in the base width.
    fn try_from_wide(wide: &Self::Wide) -> Option<Self>;
    fn from_wide_reduced(wide: &Self::Wide, modulus: &Self) -> Self;
}

macro_rules! impl_uint {
    ($uint:ident, $limbs:expr) => {
        impl UintLike for $uint {
            const BITS: u32 = $uint::BITS;
            const BYTES: usize = ($uint::BITS as usize) / 8;

            fn zero() -> Self {
                Self::ZERO
            }
            fn one() -> Self {
                Self::ONE
            }
            fn from_u64(value: u64) -> Self {
                Self::from(value)
            }

            fn from_be_slice_padded(bytes: &[u8]) -> Self {
                debug_assert!(bytes.len() <= Self::BYTES);
                let mut padded = [0u8; ($uint::BITS as usize) / 8];
                padded[(($uint::BITS as usize) / 8 - bytes.len())..].copy_from_slice(bytes);
                Self::from_be_slice(&padded)
            }
            fn to_be_bytes_vec(&self) -> Vec<u8> {
                Encoding::to_be_bytes(self).as_ref().to_vec()
            }

            fn is_zero(&self) -> bool {
                self == &Self::ZERO
            }
            fn is_even(&self) -> bool {
                bool::from(Integer::is_even(self))
            }
            fn bits(&self) -> u32 {
                $uint::bits(self)
            }
            fn lowest_u64(&self) -> u64 {
                self.as_words()[0] as u64
            }

            fn wrapping_add(&self, rhs: &Self) -> Self {
                $uint::wrapping_add(self, rhs)
            }
            fn wrapping_sub(&self, rhs: &Self) -> Self {
                $uint::wrapping_sub(self, rhs)
            }
            fn wrapping_mul(&self, rhs: &Self) -> Self {
                $uint::wrapping_mul(self, rhs)
            }
            fn wrapping_shl(&self, shift: u32) -> Self {
                $uint::wrapping_shl(self, shift)
            }
            fn wrapping_shr(&self, shift: u32) -> Self {
                $uint::wrapping_shr(self, shift)
            }

            fn add_mod(&self, rhs: &Self, modulus: &Self) -> Self {
                $uint::add_mod(self, rhs, modulus)
            }
            fn sub_mod(&self, rhs: &Self, modulus: &Self) -> Self {
                $uint::sub_mod(self, rhs, modulus)
            }
            fn neg_mod(&self, modulus: &Self) -> Self {
                $uint::neg_mod(self, modulus)
            }
            fn mul_mod(&self, rhs: &Self, modulus: &Self) -> Self {
                let params = monty_params::<$limbs>(modulus);
                (MontyForm::new(self, params) * MontyForm::new(rhs, params)).retrieve()
            }
            fn pow_mod(&self, exp: &Self, modulus: &Self) -> Self {
                let params = monty_params::<$limbs>(modulus);
                MontyForm::new(self, params).pow(exp).retrieve()
            }
            fn inv_mod(&self, modulus: &Self) -> Option<Self> {
                let result: CtOption<Self> = $uint::inv_mod(self, modulus).into();
                result.into()
            }
            fn rem(&self, modulus: &Self) -> Self {
                $uint::rem(
                    self,
                    &NonZero::new(*modulus).expect("modulus is non-zero"),
                )
            }
            fn div_rem(&self, divisor: &Self) -> (Self, Self) {
                $uint::div_rem(
                    self,
                    &NonZero::new(*divisor).expect("divisor is non-zero"),
                )
            }

            fn random(rng: &mut impl CryptoRngCore) -> Self {
                <Self as Random>::random(rng)
            }
            fn random_below(rng: &mut impl CryptoRngCore, bound: &Self) -> Self {
                <Self as RandomMod>::random_mod(
                    rng,
                    &NonZero::new(*bound).expect("bound is non-zero"),
                )
            }
            fn random_bits(rng: &mut impl CryptoRngCore, bits: u32) -> Self {
                <Self as RandomBits>::random_bits(rng, bits)
            }
        }

        impl Hashable for $uint {
            fn chain<C: Chain>(&self, digest: C) -> C {
                digest.chain_constant_sized_bytes(&Encoding::to_be_bytes(self))
            }
        }
    };
}

fn monty_params<const LIMBS: usize>(
    modulus: &crypto_bigint::Uint<LIMBS>,
) -> MontyParams<LIMBS> {
    MontyParams::new_vartime(Odd::new(*modulus).expect("modulus is odd"))
}

impl_uint!(U512, { U512::LIMBS });
impl_uint!(U1024, { U1024::LIMBS });
impl_uint!(U2048, { U2048::LIMBS });
impl_uint!(U4096, { U4096::LIMBS });
impl_uint!(U8192, { U8192::LIMBS });

macro_rules! impl_has_wide {
    ($uint:ident, $wide:ident) => {
        impl HasWide for $uint {
            type Wide = $wide;

            fn into_wide(&self) -> Self::Wide {
                Self::Wide::from_be_slice_padded(&self.to_be_bytes_vec())
            }
            fn mul_wide(&self, rhs: &Self) -> Self::Wide {
                // The product of two base-width values always fits.
                self.into_wide().wrapping_mul(&rhs.into_wide())
            }
            fn try_from_wide(wide: &Self::Wide) -> Option<Self> {
                let bytes = wide.to_be_bytes_vec();
                let (high, low) = bytes.split_at(bytes.len() - Self::BYTES);
                if high.iter().any(|b| *b != 0) {
                    return None;
                }
                Some(Self::from_be_slice_padded(low))
            }
            fn from_wide_reduced(wide: &Self::Wide, modulus: &Self) -> Self {
                let reduced = UintLike::rem(wide, &modulus.into_wide());
                Self::try_from_wide(&reduced).expect("value is reduced")
            }
        }
    };
}

impl_has_wide!(U512, U1024);
impl_has_wide!(U1024, U2048);
impl_has_wide!(U2048, U4096);
impl_has_wide!(U4096, U8192);

/// `base^exp mod modulus` with a signed exponent: a negative exponent
/// inverts the result. `None` if the inverse does not exist.
pub(crate) fn pow_mod_signed<T: UintLike>(
    base: &T,
    exp: &Signed<T>,
    modulus: &T,
) -> Option<T> {
    let result = base.pow_mod(exp.abs(), modulus);
    if exp.is_negative() {
        result.inv_mod(modulus)
    } else {
        Some(result)
    }
}

/// Same as [`pow_mod_signed`], but the exponent is double-width.
/// The operation is lifted into the wide ring and reduced back.
pub(crate) fn pow_mod_wide_signed<T: HasWide>(
    base: &T,
    exp: &Signed<T::Wide>,
    modulus: &T,
) -> Option<T> {
    let wide_modulus = modulus.into_wide();
    let result = base
        .into_wide()
        .pow_mod(exp.abs(), &wide_modulus);
    let result = if exp.is_negative() {
        result.inv_mod(&wide_modulus)?
    } else {
        result
    };
    T::try_from_wide(&UintLike::rem(&result, &wide_modulus))
}

/// Uniform sampling from `[0, modulus)`, rejecting values
/// sharing a factor with the modulus.
pub(crate) fn random_coprime<T: UintLike>(rng: &mut impl CryptoRngCore, modulus: &T) -> T {
    loop {
        let value = T::random_below(rng, modulus);
        if !value.is_zero() && value.gcd(modulus) == T::one() {
            return value;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::{HasWide, Signed, UintLike, U1024, U512};

    #[test]
    fn pow_and_inv_roundtrip() {
        let modulus = U512::from_be_slice_padded(&[0xa7]); // 167, prime
        let base = U512::from_u64(5);
        let exp = U512::from_u64(166);
        // Fermat: 5^(p-1) = 1 mod p
        assert_eq!(base.pow_mod(&exp, &modulus), U512::one());
        let inv = base.inv_mod(&modulus).unwrap();
        assert_eq!(UintLike::mul_mod(&base, &inv, &modulus), U512::one());
    }

    #[test]
    fn gcd_and_jacobi() {
        let a = U512::from_u64(12);
        let b = U512::from_u64(18);
        assert_eq!(a.gcd(&b), U512::from_u64(6));

        // (2 / 15) = 1, (7 / 15) = -1
        assert_eq!(U512::from_u64(2).jacobi(&U512::from_u64(15)), 1);
        assert_eq!(U512::from_u64(7).jacobi(&U512::from_u64(15)), -1);
    }

    #[test]
    fn widening_roundtrip() {
        let a: U512 = UintLike::random(&mut OsRng);
        let wide: U1024 = a.into_wide();
        assert_eq!(U512::try_from_wide(&wide), Some(a));

        let b: U512 = UintLike::random(&mut OsRng);
        let modulus = U512::from_u64(0xffff_fffb);
        let product = a.mul_wide(&b);
        assert_eq!(
            U512::from_wide_reduced(&product, &modulus),
            a.rem(&modulus).mul_mod(&b.rem(&modulus), &modulus),
        );
    }

    #[test]
    fn signed_exponent() {
        let modulus = U512::from_u64(167);
        let base = U512::from_u64(5);
        let exp = Signed::from_unsigned(U512::from_u64(3)).neg();
        let result = super::pow_mod_signed(&base, &exp, &modulus).unwrap();
        let cube = base.pow_mod(&U512::from_u64(3), &modulus);
        assert_eq!(result.mul_mod(&cube, &modulus), U512::one());
    }
}
