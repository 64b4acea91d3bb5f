use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::params::PaillierParams;
use crate::tools::hashing::{Chain, Hashable};
use crate::uint::{
    pow_mod_signed, pow_mod_wide_signed, random_coprime, HasWide, Signed, UintLike,
};

/// Public Ring-Pedersen commitment parameters `(N, s, t)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct RPParams<P: PaillierParams> {
    pub(crate) modulus: P::Uint,
    pub(crate) s: P::Uint,
    pub(crate) t: P::Uint,
}

/// The discrete-log trapdoor of [`RPParams`]: `s = t^λ mod N`.
#[derive(Clone, Debug)]
pub(crate) struct RPSecret<P: PaillierParams> {
    lambda: P::Uint,
    totient: P::Uint,
}

impl<P: PaillierParams> RPSecret<P> {
    pub fn lambda(&self) -> &P::Uint {
        &self.lambda
    }

    pub fn totient(&self) -> &P::Uint {
        &self.totient
    }
}

impl<P: PaillierParams> Zeroize for RPSecret<P> {
    fn zeroize(&mut self) {
        self.lambda.zeroize();
        self.totient.zeroize();
    }
}

impl<P: PaillierParams> Drop for RPSecret<P> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<P: PaillierParams> RPParams<P> {
    /// Fresh parameters over a safe-prime modulus:
    /// `t = τ²` for random `τ ∈ Z^*_N`, `s = t^λ` for random `λ < φ(N)/4`.
    pub fn random(rng: &mut impl CryptoRngCore) -> (RPSecret<P>, Self) {
        let p = P::generate_safe_prime(rng);
        let q = P::generate_safe_prime(rng);
        let modulus = p.mul_wide(&q);
        let one = P::HalfUint::one();
        let totient = p.wrapping_sub(&one).mul_wide(&q.wrapping_sub(&one));

        let tau = random_coprime(rng, &modulus);
        let t = tau.mul_mod(&tau, &modulus);
        let lambda = P::Uint::random_below(rng, &totient.wrapping_shr(2));
        let s = t.pow_mod(&lambda, &modulus);

        (RPSecret { lambda, totient }, Self { modulus, s, t })
    }

    /// `Commit(x, r) = s^x t^r mod N` with a base-width secret
    /// and a double-width randomizer.
    ///
    /// `None` when an inversion required by a negative exponent fails,
    /// which cannot happen for honestly generated parameters.
    pub fn commit(
        &self,
        secret: &Signed<P::Uint>,
        randomizer: &Signed<P::WideUint>,
    ) -> Option<P::Uint> {
        let s_term = pow_mod_signed(&self.s, secret, &self.modulus)?;
        let t_term = pow_mod_wide_signed(&self.t, randomizer, &self.modulus)?;
        Some(s_term.mul_mod(&t_term, &self.modulus))
    }

    /// `base^exp mod N` for proof verification.
    pub fn pow_signed(&self, base: &P::Uint, exp: &Signed<P::Uint>) -> Option<P::Uint> {
        pow_mod_signed(base, exp, &self.modulus)
    }

    pub fn mul(&self, lhs: &P::Uint, rhs: &P::Uint) -> P::Uint {
        lhs.mul_mod(rhs, &self.modulus)
    }
}

impl<P: PaillierParams> Hashable for RPParams<P> {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain(&self.modulus).chain(&self.s).chain(&self.t)
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::super::params::{PaillierParams, PaillierTest};
    use super::RPParams;
    use crate::uint::{Signed, UintLike};

    type Uint = <PaillierTest as PaillierParams>::Uint;
    type WideUint = <PaillierTest as PaillierParams>::WideUint;

    #[test]
    fn commitment_is_homomorphic() {
        let (_secret, params) = RPParams::<PaillierTest>::random(&mut OsRng);

        let x1 = Signed::from_unsigned(Uint::from_u64(10));
        let r1 = Signed::from_unsigned(WideUint::from_u64(100)).neg();
        let x2 = Signed::from_unsigned(Uint::from_u64(3)).neg();
        let r2 = Signed::from_unsigned(WideUint::from_u64(17));

        let c1 = params.commit(&x1, &r1).unwrap();
        let c2 = params.commit(&x2, &r2).unwrap();
        let combined = params.mul(&c1, &c2);

        let expected = params.commit(&x1.add(&x2), &r1.add(&r2)).unwrap();
        assert_eq!(combined, expected);
    }

    #[test]
    fn trapdoor_links_bases() {
        let (secret, params) = RPParams::<PaillierTest>::random(&mut OsRng);
        assert_eq!(
            params.t.pow_mod(secret.lambda(), &params.modulus),
            params.s
        );
    }
}
