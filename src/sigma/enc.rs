//! Encryption-in-range proof (ψ_enc): a Paillier ciphertext under the
//! prover's key encrypts a plaintext of magnitude at most `2^(8 ℓ)`.

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::{challenge_from_hash, mask_bound, PailUint, PailWide};
use crate::paillier::{Ciphertext, PublicKeyPaillier, RPParams};
use crate::protocols::common::SchemeParams;
use crate::tools::hashing::{Chain, Hash, Hashable};
use crate::uint::{HasWide, Signed, UintLike};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct EncProof<S: SchemeParams> {
    cap_s: PailUint<S>,
    cap_a: Ciphertext<S::Paillier>,
    cap_c: PailUint<S>,
    challenge: PailUint<S>,
    z1: Signed<PailUint<S>>,
    z2: PailUint<S>,
    z3: Signed<PailWide<S>>,
}

impl<S: SchemeParams> EncProof<S> {
    fn challenge(
        pk: &PublicKeyPaillier<S::Paillier>,
        ciphertext: &Ciphertext<S::Paillier>,
        rp: &RPParams<S::Paillier>,
        cap_s: &PailUint<S>,
        cap_a: &Ciphertext<S::Paillier>,
        cap_c: &PailUint<S>,
        aux: &impl Hashable,
    ) -> PailUint<S> {
        challenge_from_hash(
            &Hash::new_with_dst(b"EncryptionInRange")
                .chain(aux)
                .chain(pk)
                .chain(ciphertext)
                .chain(rp)
                .chain(cap_s)
                .chain(cap_a)
                .chain(cap_c)
                .finalize(),
        )
    }

    /// Proves that `Enc_pk(secret, randomizer)` encrypts a value
    /// in `±2^(8 I_RANGE_BYTES)`, under the verifier's
    /// Ring-Pedersen parameters `rp`.
    pub fn random(
        rng: &mut impl CryptoRngCore,
        secret: &Signed<PailUint<S>>,
        randomizer: &PailUint<S>,
        pk: &PublicKeyPaillier<S::Paillier>,
        rp: &RPParams<S::Paillier>,
        aux: &impl Hashable,
    ) -> Self {
        let ciphertext = Ciphertext::new_with_randomizer_signed(pk, secret, randomizer);

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
        let cap_c = rp.commit(&alpha, &gamma).expect("honest parameters");

        let challenge = Self::challenge(pk, &ciphertext, rp, &cap_s, &cap_a, &cap_c, aux);

        // z1 = α + e k, z2 = r ρ^e mod N, z3 = γ + e μ
        let z1 = alpha.add(&secret.mul_by_unsigned(&challenge));
        let z2 = r.mul_mod(
            &randomizer.pow_mod(&challenge, pk.modulus()),
            pk.modulus(),
        );
        let z3 = gamma.add(&mu.mul_by_unsigned(&challenge.into_wide()));

        Self {
            cap_s,
            cap_a,
            cap_c,
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
        rp: &RPParams<S::Paillier>,
        aux: &impl Hashable,
    ) -> bool {
        let challenge =
            Self::challenge(pk, ciphertext, rp, &self.cap_s, &self.cap_a, &self.cap_c, aux);
        if challenge != self.challenge {
            return false;
        }

        if !self
            .z1
            .in_range_bits((8 * (S::I_RANGE_BYTES + S::EPS_BYTES)) as u32)
        {
            return false;
        }

        // Enc(z1, z2) == A K^e mod N²
        let lhs = Ciphertext::new_with_randomizer_signed(pk, &self.z1, &self.z2);
        let rhs = self
            .cap_a
            .homomorphic_add(pk, &ciphertext.homomorphic_mul(pk, &challenge));
        if lhs != rhs {
            return false;
        }

        // s^z1 t^z3 == C S^e mod N̂
        let lhs = match rp.commit(&self.z1, &self.z3) {
            Some(commitment) => commitment,
            None => return false,
        };
        let rhs = rp.mul(
            &self.cap_c,
            &self.cap_s.pow_mod(&challenge, &rp.modulus),
        );
        lhs == rhs
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::EncProof;
    use crate::curve::Scalar;
    use crate::paillier::{Ciphertext, RPParams, SecretKeyPaillier};
    use crate::protocols::common::TestParams;
    use crate::uint::Signed;

    #[test]
    fn prove_and_verify() {
        let sk = SecretKeyPaillier::<<TestParams as crate::protocols::common::SchemeParams>::Paillier>::random(&mut OsRng);
        let pk = sk.public_key();
        let (_rp_secret, rp) = RPParams::random(&mut OsRng);

        let secret = Signed::from_unsigned(Scalar::random(&mut OsRng).to_uint());
        let randomizer = pk.random_randomizer(&mut OsRng);
        let ciphertext = Ciphertext::new_with_randomizer_signed(pk, &secret, &randomizer);
        let aux: &[u8] = b"presigning round 1";

        let proof =
            EncProof::<TestParams>::random(&mut OsRng, &secret, &randomizer, pk, &rp, &aux);
        assert!(proof.verify(pk, &ciphertext, &rp, &aux));

        // Mismatched aux is rejected.
        let other_aux: &[u8] = b"rebound";
        assert!(!proof.verify(pk, &ciphertext, &rp, &other_aux));

        // A different ciphertext is rejected.
        let other = Ciphertext::new_with_randomizer_signed(
            pk,
            &secret,
            &pk.random_randomizer(&mut OsRng),
        );
        assert!(!proof.verify(pk, &other, &rp, &aux));
    }
}
