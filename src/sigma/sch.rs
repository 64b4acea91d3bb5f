//! Schnorr proof of knowledge of a discrete logarithm (ψ_sch).
//!
//! The commitment is produced ahead of time (it is part of the hash
//! commitments in key generation and refresh round 1), the proof itself
//! is completed later with the session-bound aux.

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::curve::{Point, Scalar};
use crate::tools::hashing::{Chain, Hash, Hashable};

/// The ephemeral value `τ` of the first Schnorr move.
#[derive(Clone, Debug, Zeroize)]
pub(crate) struct SchSecret(Scalar);

impl SchSecret {
    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        Self(Scalar::random(rng))
    }
}

/// The first move `A = g^τ`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SchCommitment(Point);

impl SchCommitment {
    pub fn new(secret: &SchSecret) -> Self {
        Self(secret.0.mul_by_generator())
    }
}

impl Hashable for SchCommitment {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SchProof {
    challenge: Scalar,
    proof: Scalar,
}

impl SchProof {
    fn challenge(commitment: &SchCommitment, public: &Point, aux: &impl Hashable) -> Scalar {
        let output = Hash::new_with_dst(b"SchnorrProof")
            .chain(aux)
            .chain(public)
            .chain(commitment)
            .finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&output.as_bytes()[..32]);
        Scalar::from_reduced_bytes(&bytes)
    }

    pub fn new(
        proof_secret: &SchSecret,
        secret: &Scalar,
        commitment: &SchCommitment,
        public: &Point,
        aux: &impl Hashable,
    ) -> Self {
        let challenge = Self::challenge(commitment, public, aux);
        let proof = proof_secret.0 + challenge * *secret;
        Self { challenge, proof }
    }

    pub fn verify(&self, commitment: &SchCommitment, public: &Point, aux: &impl Hashable) -> bool {
        let challenge = Self::challenge(commitment, public, aux);
        // g^z == A X^e, with the challenge recomputed from the received data.
        challenge == self.challenge
            && self.proof.mul_by_generator() == commitment.0 + public * &challenge
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::{SchCommitment, SchProof, SchSecret};
    use crate::curve::Scalar;

    #[test]
    fn prove_and_verify() {
        let secret = Scalar::random(&mut OsRng);
        let public = secret.mul_by_generator();
        let proof_secret = SchSecret::random(&mut OsRng);
        let commitment = SchCommitment::new(&proof_secret);
        let aux: &[u8] = b"keygen round 3";

        let proof = SchProof::new(&proof_secret, &secret, &commitment, &public, &aux);
        assert!(proof.verify(&commitment, &public, &aux));

        // A different aux must be rejected.
        let other_aux: &[u8] = b"some other round";
        assert!(!proof.verify(&commitment, &public, &other_aux));

        // A different statement must be rejected.
        let other_public = Scalar::random(&mut OsRng).mul_by_generator();
        assert!(!proof.verify(&commitment, &other_public, &aux));
    }
}
