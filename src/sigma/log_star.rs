//! Group-element-vs-Paillier range proof (ψ_log): a ciphertext under the
//! prover's key and a group element `X = base^x` share the same exponent
//! `x`, of magnitude at most `2^(8 ℓ)`.
//!
//! Instantiated twice per pre-signing: with the curve generator as the
//! base (ψ_logG, for Γ_i against G) and with the combined Γ as the base
//! (ψ_logK, for Δ_i against K).

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::{challenge_from_hash, mask_bound, PailUint, PailWide};
use crate::curve::{Point, Scalar};
use crate::paillier::{Ciphertext, PublicKeyPaillier, RPParams};
use crate::protocols::common::SchemeParams;
use crate::tools::hashing::{Chain, Hash, Hashable};
use crate::uint::{HasWide, Signed, UintLike};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct LogStarProof<S: SchemeParams> {
    cap_s: PailUint<S>,
    cap_a: Ciphertext<S::Paillier>,
    cap_y: Point,
    cap_d: PailUint<S>,
    challenge: PailUint<S>,
    z1: Signed<PailUint<S>>,
    z2: PailUint<S>,
    z3: Signed<PailWide<S>>,
}

impl<S: SchemeParams> LogStarProof<S> {
    #[allow(clippy::too_many_arguments)]
    fn challenge(
        pk: &PublicKeyPaillier<S::Paillier>,
        ciphertext: &Ciphertext<S::Paillier>,
        base: &Point,
        power: &Point,
        rp: &RPParams<S::Paillier>,
        cap_s: &PailUint<S>,
        cap_a: &Ciphertext<S::Paillier>,
        cap_y: &Point,
        cap_d: &PailUint<S>,
        aux: &impl Hashable,
    ) -> PailUint<S> {
        challenge_from_hash(
            &Hash::new_with_dst(b"GroupVsPaillierInRange")
                .chain(aux)
                .chain(pk)
                .chain(ciphertext)
                .chain(base)
                .chain(power)
                .chain(rp)
                .chain(cap_s)
                .chain(cap_a)
                .chain(cap_y)
                .chain(cap_d)
                .finalize(),
        )
    }

    /// Proves that `ciphertext = Enc_pk(x, randomizer)` and
    /// `power = base^x` for `|x| ≤ 2^(8 I_RANGE_BYTES)`.
    pub fn random(
        rng: &mut impl CryptoRngCore,
        secret: &Signed<PailUint<S>>,
        randomizer: &PailUint<S>,
        pk: &PublicKeyPaillier<S::Paillier>,
        base: &Point,
        rp: &RPParams<S::Paillier>,
        aux: &impl Hashable,
    ) -> Self {
        let ciphertext = Ciphertext::new_with_randomizer_signed(pk, secret, randomizer);
        let power = base * &Scalar::from_signed(secret);

        let alpha = Signed::random_in_range_bits(
            rng,
            (8 * (S::I_RANGE_BYTES + S::EPS_BYTES)) as u32,
        );
        let mu = Signed::random_in_symmetric_range(
            rng,
            &mask_bound::<S>(&rp.modulus, S::I_RANGE_BYTES),
        );
        let gamma = Signed::random_in_symmetric_range(
            rng,
            &mask_bound::<S>(&rp.modulus, S::I_RANGE_BYTES + S::EPS_BYTES),
        );
        let r = pk.random_randomizer(rng);

        let cap_s = rp.commit(secret, &mu).expect("honest parameters");
        let cap_a = Ciphertext::new_with_randomizer_signed(pk, &alpha, &r);
        let cap_y = base * &Scalar::from_signed(&alpha);
        let cap_d = rp.commit(&alpha, &gamma).expect("honest parameters");

        let challenge = Self::challenge(
            pk, &ciphertext, base, &power, rp, &cap_s, &cap_a, &cap_y, &cap_d, aux,
        );

        let z1 = alpha.add(&secret.mul_by_unsigned(&challenge));
        let z2 = r.mul_mod(
            &randomizer.pow_mod(&challenge, pk.modulus()),
            pk.modulus(),
        );
        let z3 = gamma.add(&mu.mul_by_unsigned(&challenge.into_wide()));

        Self {
            cap_s,
            cap_a,
            cap_y,
            cap_d,
            challenge,
            z1,
            z2,
            z3,
        }
    }

    pub fn verify(
        &self,
        pk: &PublicKeyPaillier<S::Paillier>,
        ciphertext: &Ciphertext<S::Paillier>,
        base: &Point,
        power: &Point,
        rp: &RPParams<S::Paillier>,
        aux: &impl Hashable,
    ) -> bool {
        let challenge = Self::challenge(
            pk,
            ciphertext,
            base,
            power,
            rp,
            &self.cap_s,
            &self.cap_a,
            &self.cap_y,
            &self.cap_d,
            aux,
        );
        if challenge != self.challenge {
            return false;
        }

        if !self
            .z1
            .in_range_bits((8 * (S::I_RANGE_BYTES + S::EPS_BYTES)) as u32)
        {
            return false;
        }

        // Enc(z1, z2) == A C^e mod N²
        let lhs = Ciphertext::new_with_randomizer_signed(pk, &self.z1, &self.z2);
        let rhs = self
            .cap_a
            .homomorphic_add(pk, &ciphertext.homomorphic_mul(pk, &challenge));
        if lhs != rhs {
            return false;
        }

        // base^z1 == Y X^e
        let challenge_scalar = Scalar::from_uint(&challenge);
        let lhs = base * &Scalar::from_signed(&self.z1);
        let rhs = self.cap_y + power * &challenge_scalar;
        if lhs != rhs {
            return false;
        }

        // s^z1 t^z3 == D S^e mod N̂
        let lhs = match rp.commit(&self.z1, &self.z3) {
            Some(commitment) => commitment,
            None => return false,
        };
        let rhs = rp.mul(
            &self.cap_d,
            &self.cap_s.pow_mod(&challenge, &rp.modulus),
        );
        lhs == rhs
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::LogStarProof;
    use crate::curve::{Point, Scalar};
    use crate::paillier::{Ciphertext, RPParams, SecretKeyPaillier};
    use crate::protocols::common::{SchemeParams, TestParams};
    use crate::uint::Signed;

    #[test]
    fn prove_and_verify() {
        let sk = SecretKeyPaillier::<<TestParams as SchemeParams>::Paillier>::random(&mut OsRng);
        let pk = sk.public_key();
        let (_rp_secret, rp) = RPParams::random(&mut OsRng);

        let x = Scalar::random(&mut OsRng);
        let secret = Signed::from_unsigned(x.to_uint());
        let randomizer = pk.random_randomizer(&mut OsRng);
        let ciphertext = Ciphertext::new_with_randomizer_signed(pk, &secret, &randomizer);
        let power = x.mul_by_generator();
        let aux: &[u8] = b"presigning round 2";

        let proof = LogStarProof::<TestParams>::random(
            &mut OsRng,
            &secret,
            &randomizer,
            pk,
            &Point::GENERATOR,
            &rp,
            &aux,
        );
        assert!(proof.verify(pk, &ciphertext, &Point::GENERATOR, &power, &rp, &aux));

        // A different power is rejected.
        let other_power = Scalar::random(&mut OsRng).mul_by_generator();
        assert!(!proof.verify(pk, &ciphertext, &Point::GENERATOR, &other_power, &rp, &aux));

        // A different base is rejected.
        let other_base = Scalar::random(&mut OsRng).mul_by_generator();
        assert!(!proof.verify(pk, &ciphertext, &other_base, &power, &rp, &aux));
    }
}
