//! Sign-magnitude integers for values that leave a modular ring:
//! MtA offsets, centered Paillier plaintexts, and range-proof responses.

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::UintLike;

/// A signed value with magnitude bounded by the callers' protocol ranges.
///
/// Zero is always non-negative, so equality is structural.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct Signed<T> {
    abs: T,
    negative: bool,
}

impl<T: UintLike> Signed<T> {
    pub fn zero() -> Self {
        Self {
            abs: T::zero(),
            negative: false,
        }
    }

    pub fn from_unsigned(abs: T) -> Self {
        Self {
            abs,
            negative: false,
        }
    }

    fn new(abs: T, negative: bool) -> Self {
        Self {
            negative: negative && !abs.is_zero(),
            abs,
        }
    }

    pub fn abs(&self) -> &T {
        &self.abs
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn neg(&self) -> Self {
        Self::new(self.abs, !self.negative)
    }

    pub fn add(&self, rhs: &Self) -> Self {
        if self.negative == rhs.negative {
            Self::new(self.abs.wrapping_add(&rhs.abs), self.negative)
        } else if self.abs >= rhs.abs {
            Self::new(self.abs.wrapping_sub(&rhs.abs), self.negative)
        } else {
            Self::new(rhs.abs.wrapping_sub(&self.abs), rhs.negative)
        }
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.neg())
    }

    /// Multiplication by an unsigned factor. The caller is responsible
    /// for the product fitting the width.
    pub fn mul_by_unsigned(&self, factor: &T) -> Self {
        Self::new(self.abs.wrapping_mul(factor), self.negative)
    }

    /// Whether the magnitude is at most `2^bits`.
    pub fn in_range_bits(&self, bits: u32) -> bool {
        if bits + 1 >= T::BITS {
            return true;
        }
        self.abs <= T::one().wrapping_shl(bits)
    }

    /// The representative in `[0, modulus)`. The magnitude must be
    /// below the modulus.
    pub fn to_mod(&self, modulus: &T) -> T {
        debug_assert!(&self.abs < modulus);
        if self.negative {
            self.abs.neg_mod(modulus)
        } else {
            self.abs
        }
    }

    /// The centered representative of `value mod modulus`
    /// in `(-modulus/2, modulus/2]`.
    pub fn from_centered(value: &T, modulus: &T) -> Self {
        let half = modulus.wrapping_shr(1);
        if value <= &half {
            Self::from_unsigned(*value)
        } else {
            Self::new(modulus.wrapping_sub(value), true)
        }
    }

    /// Uniform sampling from `±2^bits`: a draw below `2^(bits+1)`
    /// shifted down by `2^bits`.
    pub fn random_in_range_bits(rng: &mut impl CryptoRngCore, bits: u32) -> Self {
        debug_assert!(bits + 1 < T::BITS);
        let bound = T::one().wrapping_shl(bits);
        Self::random_in_symmetric_range(rng, &bound)
    }

    /// Uniform sampling from `±bound`.
    pub fn random_in_symmetric_range(rng: &mut impl CryptoRngCore, bound: &T) -> Self {
        debug_assert!(bound.bits() < T::BITS);
        let double = bound.wrapping_shl(1);
        let draw = T::random_below(rng, &double);
        if draw >= *bound {
            Self::from_unsigned(draw.wrapping_sub(bound))
        } else {
            Self::new(bound.wrapping_sub(&draw), true)
        }
    }
}

#[cfg(test)]
mod tests {
    use crypto_bigint::U512;
    use rand_core::OsRng;

    use super::Signed;
    use crate::uint::UintLike;

    fn s(value: i64) -> Signed<U512> {
        let signed = Signed::from_unsigned(U512::from_u64(value.unsigned_abs()));
        if value < 0 {
            signed.neg()
        } else {
            signed
        }
    }

    #[test]
    fn arithmetic() {
        assert_eq!(s(3).add(&s(-5)), s(-2));
        assert_eq!(s(-3).add(&s(5)), s(2));
        assert_eq!(s(-3).sub(&s(-3)), s(0));
        assert_eq!(s(-3).neg(), s(3));
        assert_eq!(s(-4).mul_by_unsigned(&U512::from_u64(3)), s(-12));
        // No negative zero.
        assert_eq!(s(0).neg(), s(0));
    }

    #[test]
    fn centering() {
        let modulus = U512::from_u64(101);
        assert_eq!(
            Signed::from_centered(&U512::from_u64(7), &modulus),
            s(7)
        );
        assert_eq!(
            Signed::from_centered(&U512::from_u64(100), &modulus),
            s(-1)
        );
        // The two representations agree mod the modulus.
        let centered = Signed::<U512>::from_centered(&U512::from_u64(77), &modulus);
        assert_eq!(centered.to_mod(&modulus), U512::from_u64(77));
    }

    #[test]
    fn sampling_stays_in_range() {
        for _ in 0..100 {
            let value = Signed::<U512>::random_in_range_bits(&mut OsRng, 64);
            assert!(value.in_range_bits(64));
        }
    }
}
