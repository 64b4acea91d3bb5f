use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::keys::PublicKeyPaillier;
use super::params::PaillierParams;
use crate::tools::hashing::{Chain, Hashable};
use crate::uint::{pow_mod_signed, HasWide, Signed, UintLike};

/// A Paillier ciphertext, an element of `Z^*_{N²}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Ciphertext<P: PaillierParams>(P::WideUint);

impl<P: PaillierParams> Ciphertext<P> {
    pub(crate) fn inner(&self) -> &P::WideUint {
        &self.0
    }

    pub(crate) fn from_inner(value: P::WideUint) -> Self {
        Self(value)
    }

    /// `Enc(m, r) = (1 + N)^m r^N mod N²`, using the identity
    /// `(1 + N)^m = 1 + m N mod N²`.
    pub fn new_with_randomizer(
        pk: &PublicKeyPaillier<P>,
        plaintext: &P::Uint,
        randomizer: &P::Uint,
    ) -> Self {
        let modulus_squared = pk.modulus_squared();
        let plaintext_factor = plaintext
            .mul_wide(pk.modulus())
            .wrapping_add(&P::WideUint::one());
        let randomizer_factor = randomizer
            .into_wide()
            .pow_mod(&pk.modulus().into_wide(), modulus_squared);
        Self(plaintext_factor.mul_mod(&randomizer_factor, modulus_squared))
    }

    /// Encrypts a signed plaintext via its representative mod `N`.
    pub fn new_with_randomizer_signed(
        pk: &PublicKeyPaillier<P>,
        plaintext: &Signed<P::Uint>,
        randomizer: &P::Uint,
    ) -> Self {
        Self::new_with_randomizer(pk, &plaintext.to_mod(pk.modulus()), randomizer)
    }

    /// The homomorphic action of an unsigned factor: `Enc(a m) = C^a`.
    pub fn homomorphic_mul(&self, pk: &PublicKeyPaillier<P>, factor: &P::Uint) -> Self {
        Self(
            self.0
                .pow_mod(&factor.into_wide(), pk.modulus_squared()),
        )
    }

    /// The homomorphic action of a signed factor; `None` if the ciphertext
    /// is not invertible mod `N²` (possible only for malformed inputs).
    pub fn homomorphic_mul_signed(
        &self,
        pk: &PublicKeyPaillier<P>,
        factor: &Signed<P::Uint>,
    ) -> Option<Self> {
        let exp = Signed::from_unsigned(factor.abs().into_wide());
        let exp = if factor.is_negative() { exp.neg() } else { exp };
        pow_mod_signed(&self.0, &exp, pk.modulus_squared()).map(Self)
    }

    /// Homomorphic addition of plaintexts: `Enc(m1 + m2) = C1 C2`.
    pub fn homomorphic_add(&self, pk: &PublicKeyPaillier<P>, rhs: &Self) -> Self {
        Self(self.0.mul_mod(&rhs.0, pk.modulus_squared()))
    }
}

impl<P: PaillierParams> Serialize for Ciphertext<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, P: PaillierParams> Deserialize<'de> for Ciphertext<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        P::WideUint::deserialize(deserializer).map(Self)
    }
}

impl<P: PaillierParams> Hashable for Ciphertext<P> {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::super::keys::SecretKeyPaillier;
    use super::super::params::{PaillierParams, PaillierTest};
    use super::Ciphertext;
    use crate::uint::{Signed, UintLike};

    type Uint = <PaillierTest as PaillierParams>::Uint;

    #[test]
    fn homomorphic_affine_operation() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();

        let m = Uint::from_u64(1000);
        let a = Uint::from_u64(17);
        let b = Signed::from_unsigned(Uint::from_u64(23)).neg();

        let c_m = Ciphertext::new_with_randomizer(pk, &m, &pk.random_randomizer(&mut OsRng));
        let c_b =
            Ciphertext::new_with_randomizer_signed(pk, &b, &pk.random_randomizer(&mut OsRng));

        // Enc(a m + b) = Enc(m)^a * Enc(b)
        let combined = c_m.homomorphic_mul(pk, &a).homomorphic_add(pk, &c_b);
        assert_eq!(
            sk.decrypt(&combined),
            Uint::from_u64(1000 * 17 - 23),
        );
    }

    #[test]
    fn signed_factor_matches_unsigned() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();

        let m = Signed::from_unsigned(Uint::from_u64(5)).neg();
        let a = Signed::from_unsigned(Uint::from_u64(7)).neg();
        let c = Ciphertext::new_with_randomizer_signed(pk, &m, &pk.random_randomizer(&mut OsRng));
        let c_am = c.homomorphic_mul_signed(pk, &a).unwrap();
        // (-5) * (-7) = 35
        assert_eq!(sk.decrypt(&c_am), Uint::from_u64(35));
    }
}
