//! Ring-Pedersen parameter proof (ψ_rped): `s` lies in the subgroup
//! generated by `t`, and the prover knows `λ` with `s = t^λ mod N`.
//!
//! An `m`-iteration bit-challenge protocol; soundness error `2^-m`.

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use crate::paillier::{PaillierParams, RPParams, RPSecret};
use crate::tools::hashing::{Chain, Hash, HashOutput, Hashable};
use crate::uint::UintLike;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct PrmProof<P: PaillierParams> {
    commitments: Vec<P::Uint>,
    responses: Vec<P::Uint>,
}

fn challenge_bits<P: PaillierParams>(
    params: &RPParams<P>,
    commitments: &[P::Uint],
    aux: &impl Hashable,
) -> HashOutput {
    Hash::new_with_dst(b"RingPedersenParams")
        .chain(aux)
        .chain(params)
        .chain(&commitments.to_vec())
        .finalize()
}

fn bit_at(output: &HashOutput, index: usize) -> bool {
    (output.as_bytes()[index / 8] >> (index % 8)) & 1 == 1
}

impl<P: PaillierParams> PrmProof<P> {
    pub fn random(
        rng: &mut impl CryptoRngCore,
        secret: &RPSecret<P>,
        params: &RPParams<P>,
        iterations: usize,
        aux: &impl Hashable,
    ) -> Self {
        debug_assert!(iterations <= 8 * crate::tools::hashing::KAPPA_RANDOM_ORACLE_BYTES);
        let totient = secret.totient();

        let secrets: Vec<P::Uint> = (0..iterations)
            .map(|_| P::Uint::random_below(rng, totient))
            .collect();
        let commitments: Vec<P::Uint> = secrets
            .iter()
            .map(|a| params.t.pow_mod(a, &params.modulus))
            .collect();

        let challenge = challenge_bits(params, &commitments, aux);
        let responses = secrets
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if bit_at(&challenge, i) {
                    a.add_mod(secret.lambda(), totient)
                } else {
                    *a
                }
            })
            .collect();

        Self {
            commitments,
            responses,
        }
    }

    pub fn verify(&self, params: &RPParams<P>, iterations: usize, aux: &impl Hashable) -> bool {
        if self.commitments.len() != iterations || self.responses.len() != iterations {
            return false;
        }

        let challenge = challenge_bits(params, &self.commitments, aux);
        (0..iterations).all(|i| {
            // t^z == A s^e mod N
            let lhs = params.t.pow_mod(&self.responses[i], &params.modulus);
            let rhs = if bit_at(&challenge, i) {
                params.mul(&self.commitments[i], &params.s)
            } else {
                self.commitments[i]
            };
            lhs == rhs
        })
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::PrmProof;
    use crate::paillier::{PaillierTest, RPParams};

    const ITERATIONS: usize = 13;

    #[test]
    fn prove_and_verify() {
        let (secret, params) = RPParams::<PaillierTest>::random(&mut OsRng);
        let aux: &[u8] = b"refresh round 3";

        let proof = PrmProof::random(&mut OsRng, &secret, &params, ITERATIONS, &aux);
        assert!(proof.verify(&params, ITERATIONS, &aux));

        let other_aux: &[u8] = b"rebound";
        assert!(!proof.verify(&params, ITERATIONS, &other_aux));

        // Parameters where s is not a power of t (with overwhelming
        // probability) must be rejected.
        let (_other_secret, other_params) = RPParams::<PaillierTest>::random(&mut OsRng);
        assert!(!proof.verify(&other_params, ITERATIONS, &aux));
    }
}
