use core::iter::Sum;
use core::ops::{Add, Mul, Neg, Sub};

use k256::elliptic_curve::group::ff::PrimeField;
use k256::elliptic_curve::{
    bigint::U256, // Note that this type is different from typenum::U256
    ops::Reduce,
    point::AffineCoordinates,
    scalar::IsHigh,
    sec1::{FromSec1Point, ToSec1Point},
    subtle::CtOption,
    Field,
};
use k256::FieldBytes;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::tools::hashing::{Chain, Hashable};
use crate::tools::serde_bytes;
use crate::uint::{Signed, UintLike};

pub(crate) type BackendScalar = k256::Scalar;
pub(crate) type BackendPoint = k256::ProjectivePoint;

/// Adapts a `rand_core` 0.6 (`CryptoRngCore`) generator to the `rand_core` 0.10
/// (`Rng`) trait expected by this version of `k256`/`ff`. Both majors are
/// present in the dependency graph; this bridges the single call site where
/// our RNG crosses into the backend's API, without changing any random bytes.
struct RngBridge<'a, R: ?Sized>(&'a mut R);

impl<'a, R: CryptoRngCore + ?Sized> k256::elliptic_curve::rand_core::TryRng for RngBridge<'a, R> {
    type Error = core::convert::Infallible;

    fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
        Ok(self.0.next_u32())
    }
    fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
        Ok(self.0.next_u64())
    }
    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), Self::Error> {
        self.0.fill_bytes(dst);
        Ok(())
    }
}

/// The order of secp256k1, big-endian.
pub(crate) const ORDER_BE_BYTES: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36,
    0x41, 0x41,
];

/// The curve order as a protocol-level uint.
pub(crate) fn order_as_uint<T: UintLike>() -> T {
    T::from_be_slice_padded(&ORDER_BE_BYTES)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Scalar(BackendScalar);

impl Scalar {
    pub const ZERO: Self = Self(BackendScalar::ZERO);
    pub const ONE: Self = Self(BackendScalar::ONE);

    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        Self(BackendScalar::random(&mut RngBridge(rng)))
    }

    pub fn mul_by_generator(&self) -> Point {
        &Point::GENERATOR * self
    }

    pub fn invert(&self) -> CtOption<Self> {
        self.0.invert().map(Self)
    }

    pub fn is_high(&self) -> bool {
        self.0.is_high().into()
    }

    pub fn to_be_bytes(self) -> k256::FieldBytes {
        self.0.to_bytes()
    }

    pub(crate) fn try_from_be_bytes(bytes: &[u8]) -> Result<Self, String> {
        let arr = FieldBytes::try_from(bytes)
            .map_err(|_| "Invalid length of a curve scalar".to_string())?;

        BackendScalar::from_repr_vartime(arr)
            .map(Self)
            .ok_or_else(|| "Invalid curve scalar value".into())
    }

    /// Reduces 32 bytes (e.g. a message prehash) into a scalar
    /// mod the curve order.
    pub fn from_reduced_bytes(bytes: &[u8; 32]) -> Self {
        let arr = FieldBytes::from(*bytes);
        Self(<BackendScalar as Reduce<U256>>::reduce(&U256::from_be_slice(&arr)))
    }

    /// The scalar as a protocol-level uint (no reduction needed,
    /// scalars are smaller than any protocol modulus).
    pub(crate) fn to_uint<T: UintLike>(&self) -> T {
        T::from_be_slice_padded(&self.to_be_bytes())
    }

    /// Reduces a uint mod the curve order.
    pub(crate) fn from_uint<T: UintLike>(value: &T) -> Self {
        let reduced = value.rem(&order_as_uint::<T>());
        let bytes = reduced.to_be_bytes_vec();
        Self::try_from_be_bytes(&bytes[bytes.len() - 32..]).expect("value is reduced")
    }

    /// Reduces a signed uint mod the curve order.
    pub(crate) fn from_signed<T: UintLike>(value: &Signed<T>) -> Self {
        let reduced = Self::from_uint(value.abs());
        if value.is_negative() {
            -reduced
        } else {
            reduced
        }
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self(BackendScalar::from(value))
    }
}

impl TryFrom<&[u8]> for Scalar {
    type Error = String;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_be_bytes(bytes)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_bytes::as_base64::serialize(&self.to_be_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_bytes::as_base64::deserialize(deserializer)
    }
}

impl Hashable for Scalar {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain_constant_sized_bytes(&self.to_be_bytes())
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point(BackendPoint);

impl Point {
    pub const GENERATOR: Self = Self(BackendPoint::GENERATOR);
    pub const IDENTITY: Self = Self(BackendPoint::IDENTITY);

    pub fn is_identity(&self) -> bool {
        self.0 == BackendPoint::IDENTITY
    }

    /// The affine x-coordinate, reduced mod the curve order.
    pub fn x_coordinate(&self) -> Scalar {
        let affine = self.0.to_affine();
        Scalar(<BackendScalar as Reduce<U256>>::reduce(&U256::from_be_slice(&affine.x())))
    }

    pub(crate) fn to_backend(self) -> BackendPoint {
        self.0
    }

    /// The point as a backend verifying key, for interoperability checks.
    pub fn to_verifying_key(&self) -> Option<k256::ecdsa::VerifyingKey> {
        k256::ecdsa::VerifyingKey::from_affine(self.0.to_affine()).ok()
    }

    /// Compressed SEC1 encoding.
    pub fn to_compressed_bytes(self) -> Box<[u8]> {
        self.0
            .to_affine()
            .to_sec1_point(true)
            .as_bytes()
            .into()
    }

    pub(crate) fn try_from_compressed_bytes(bytes: &[u8]) -> Result<Self, String> {
        let encoded = k256::Sec1Point::from_bytes(bytes)
            .map_err(|err| format!("Invalid point encoding: {err}"))?;
        let point: Option<BackendPoint> = BackendPoint::from_sec1_point(&encoded).into();
        point
            .map(Self)
            .ok_or_else(|| "Point is not on the curve".into())
    }
}

impl TryFrom<&[u8]> for Point {
    type Error = String;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from_compressed_bytes(bytes)
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_bytes::as_base64::serialize(&self.to_compressed_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_bytes::as_base64::deserialize(deserializer)
    }
}

impl Hashable for Point {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain_constant_sized_bytes(&self.to_compressed_bytes())
    }
}

impl Add<Scalar> for Scalar {
    type Output = Scalar;
    fn add(self, rhs: Scalar) -> Scalar {
        Scalar(self.0.add(&rhs.0))
    }
}

impl Sub<Scalar> for Scalar {
    type Output = Scalar;
    fn sub(self, rhs: Scalar) -> Scalar {
        Scalar(self.0.sub(&rhs.0))
    }
}

impl Mul<Scalar> for Scalar {
    type Output = Scalar;
    fn mul(self, rhs: Scalar) -> Scalar {
        Scalar(self.0.mul(&rhs.0))
    }
}

impl Neg for Scalar {
    type Output = Scalar;
    fn neg(self) -> Scalar {
        Scalar(self.0.neg())
    }
}

impl Sum for Scalar {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Add<Point> for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point(self.0.add(&rhs.0))
    }
}

impl Mul<&Scalar> for &Point {
    type Output = Point;
    fn mul(self, rhs: &Scalar) -> Point {
        Point(self.0.mul(&rhs.0))
    }
}

impl Sum for Point {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::IDENTITY, |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::{order_as_uint, Point, Scalar};
    use crypto_bigint::U512;

    #[test]
    fn order_constant_matches_backend() {
        // order - 1 is a valid scalar, and adding one wraps to zero.
        let mut bytes = super::ORDER_BE_BYTES;
        bytes[31] -= 1;
        let almost_order = Scalar::try_from_be_bytes(&bytes).unwrap();
        assert_eq!(almost_order + Scalar::ONE, Scalar::ZERO);
        // And the order itself is not.
        assert!(Scalar::try_from_be_bytes(&super::ORDER_BE_BYTES).is_err());
    }

    #[test]
    fn uint_roundtrip() {
        let x = Scalar::from(12345u64);
        let as_uint: U512 = x.to_uint();
        assert_eq!(Scalar::from_uint(&as_uint), x);

        // Reduction wraps mod the order.
        let order: U512 = order_as_uint();
        use crate::uint::UintLike;
        let beyond = order.wrapping_add(&U512::from_u64(7));
        assert_eq!(Scalar::from_uint(&beyond), Scalar::from(7u64));
    }

    #[test]
    fn point_encoding_roundtrip() {
        let point = Scalar::from(3u64).mul_by_generator();
        let bytes = point.to_compressed_bytes();
        assert_eq!(bytes.len(), 33);
        assert_eq!(Point::try_from_compressed_bytes(&bytes).unwrap(), point);
    }
}
