use rand_core::CryptoRngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use super::encryption::Ciphertext;
use super::params::PaillierParams;
use crate::tools::hashing::{Chain, Hashable};
use crate::uint::{random_coprime, HasWide, Signed, UintLike};

/// A Paillier decryption key: two safe primes with cached derived values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SecretKeyPaillier<P: PaillierParams> {
    p: P::HalfUint,
    q: P::HalfUint,
    totient: P::Uint,
    /// `φ(N)^{-1} mod N`, used by decryption.
    totient_inv: P::Uint,
    public_key: PublicKeyPaillier<P>,
}

impl<P: PaillierParams> SecretKeyPaillier<P> {
    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        let p = P::generate_safe_prime(rng);
        let q = P::generate_safe_prime(rng);
        Self::from_primes(p, q)
    }

    fn from_primes(p: P::HalfUint, q: P::HalfUint) -> Self {
        let modulus = p.mul_wide(&q);
        let one = P::HalfUint::one();
        let totient = p.wrapping_sub(&one).mul_wide(&q.wrapping_sub(&one));
        let totient_inv = totient
            .inv_mod(&modulus)
            .expect("φ(N) is coprime to N for distinct odd primes");
        Self {
            p,
            q,
            totient,
            totient_inv,
            public_key: PublicKeyPaillier::new(modulus),
        }
    }

    pub fn public_key(&self) -> &PublicKeyPaillier<P> {
        &self.public_key
    }

    pub fn primes(&self) -> (&P::HalfUint, &P::HalfUint) {
        (&self.p, &self.q)
    }

    pub fn totient(&self) -> &P::Uint {
        &self.totient
    }

    /// Decrypts to the plaintext representative in `[0, N)`:
    /// `L(c^φ mod N²) · φ^{-1} mod N`, with `L(u) = (u - 1)/N`.
    pub fn decrypt(&self, ciphertext: &Ciphertext<P>) -> P::Uint {
        let modulus_squared = self.public_key.modulus_squared();
        let modulus_wide = self.public_key.modulus().into_wide();
        let totient_wide = self.totient.into_wide();

        let residue = ciphertext.inner().pow_mod(&totient_wide, modulus_squared);
        let (l, _remainder) = residue
            .wrapping_sub(&P::WideUint::one())
            .div_rem(&modulus_wide);
        let l = P::Uint::try_from_wide(&l).expect("L(u) is smaller than N");
        l.mul_mod(&self.totient_inv, self.public_key.modulus())
    }

    /// Decrypts and centers the plaintext to `(-N/2, N/2]`.
    pub fn decrypt_signed(&self, ciphertext: &Ciphertext<P>) -> Signed<P::Uint> {
        Signed::from_centered(&self.decrypt(ciphertext), self.public_key.modulus())
    }
}

impl<P: PaillierParams> Zeroize for SecretKeyPaillier<P> {
    fn zeroize(&mut self) {
        self.p.zeroize();
        self.q.zeroize();
        self.totient.zeroize();
        self.totient_inv.zeroize();
    }
}

impl<P: PaillierParams> Drop for SecretKeyPaillier<P> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<P: PaillierParams> Serialize for SecretKeyPaillier<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.p, &self.q).serialize(serializer)
    }
}

impl<'de, P: PaillierParams> Deserialize<'de> for SecretKeyPaillier<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (p, q) = <(P::HalfUint, P::HalfUint)>::deserialize(deserializer)?;
        Ok(Self::from_primes(p, q))
    }
}

/// A Paillier encryption key: the modulus `N`, with `N²` cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PublicKeyPaillier<P: PaillierParams> {
    modulus: P::Uint,
    modulus_squared: P::WideUint,
}

impl<P: PaillierParams> PublicKeyPaillier<P> {
    pub fn new(modulus: P::Uint) -> Self {
        Self {
            modulus_squared: modulus.mul_wide(&modulus),
            modulus,
        }
    }

    pub fn modulus(&self) -> &P::Uint {
        &self.modulus
    }

    pub fn modulus_squared(&self) -> &P::WideUint {
        &self.modulus_squared
    }

    /// Samples encryption randomness from `Z^*_N`.
    pub fn random_randomizer(&self, rng: &mut impl CryptoRngCore) -> P::Uint {
        random_coprime(rng, &self.modulus)
    }
}

impl<P: PaillierParams> Serialize for PublicKeyPaillier<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.modulus.serialize(serializer)
    }
}

impl<'de, P: PaillierParams> Deserialize<'de> for PublicKeyPaillier<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        P::Uint::deserialize(deserializer).map(Self::new)
    }
}

impl<P: PaillierParams> Hashable for PublicKeyPaillier<P> {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain(&self.modulus)
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::super::params::PaillierTest;
    use super::{Ciphertext, SecretKeyPaillier};
    use crate::uint::{Signed, UintLike};

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();

        let plaintext = <PaillierTest as crate::paillier::PaillierParams>::Uint::from_u64(
            0xdead_beef_0123_4567,
        );
        let randomizer = pk.random_randomizer(&mut OsRng);
        let ciphertext = Ciphertext::new_with_randomizer(pk, &plaintext, &randomizer);
        assert_eq!(sk.decrypt(&ciphertext), plaintext);
    }

    #[test]
    fn decrypt_signed_centers_negatives() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let pk = sk.public_key();

        let value = Signed::from_unsigned(
            <PaillierTest as crate::paillier::PaillierParams>::Uint::from_u64(12345),
        )
        .neg();
        let randomizer = pk.random_randomizer(&mut OsRng);
        let ciphertext = Ciphertext::new_with_randomizer_signed(pk, &value, &randomizer);
        assert_eq!(sk.decrypt_signed(&ciphertext), value);
    }
}
