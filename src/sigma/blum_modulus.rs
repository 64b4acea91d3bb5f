//! Paillier-Blum modulus proof (ψ_mod): the modulus is a product of two
//! primes congruent to 3 mod 4, with both factors known to the prover.
//!
//! For each challenge `y` the prover exhibits an `N`-th root `z` of `y`
//! and a fourth root `x` of `(-1)^a w^b y` for flags `(a, b)` of its
//! choice, where `w` has Jacobi symbol -1. Soundness error is `2^-m`
//! for `m` iterations.

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::expand_from_hash;
use crate::paillier::{PaillierParams, PublicKeyPaillier, SecretKeyPaillier};
use crate::tools::hashing::{Chain, Hash, HashOutput, Hashable};
use crate::uint::{HasWide, UintLike};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
struct ModProofElement<P: PaillierParams> {
    x: P::Uint,
    a: bool,
    b: bool,
    z: P::Uint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct ModProof<P: PaillierParams> {
    w: P::Uint,
    elements: Vec<ModProofElement<P>>,
}

/// The challenge seed the per-iteration values are expanded from.
fn challenge_seed<P: PaillierParams>(
    pk: &PublicKeyPaillier<P>,
    w: &P::Uint,
    aux: &impl Hashable,
) -> HashOutput {
    Hash::new_with_dst(b"PaillierBlumModulus")
        .chain(aux)
        .chain(pk)
        .chain(w)
        .finalize()
}

/// Legendre test: whether `value` is a quadratic residue mod the prime `p`.
fn is_qr<P: PaillierParams>(value: &P::Uint, p: &P::HalfUint) -> bool {
    let reduced =
        P::HalfUint::try_from_wide(&value.rem(&p.into_wide())).expect("reduced below p");
    let exp = p.wrapping_shr(1); // (p - 1) / 2 for odd p
    reduced.pow_mod(&exp, p) == P::HalfUint::one()
}

/// A fourth root mod a prime `p = 3 mod 4`, valid when `value` is a
/// fourth power residue: `value^(((p+1)/4)^2 mod (p-1)) mod p`.
fn fourth_root_mod_prime<P: PaillierParams>(value: &P::Uint, p: &P::HalfUint) -> P::HalfUint {
    let reduced =
        P::HalfUint::try_from_wide(&value.rem(&p.into_wide())).expect("reduced below p");
    let quarter = p.wrapping_add(&P::HalfUint::one()).wrapping_shr(2);
    let p_minus_one = p.wrapping_sub(&P::HalfUint::one());
    let exp = P::HalfUint::try_from_wide(
        &quarter.mul_wide(&quarter).rem(&p_minus_one.into_wide()),
    )
    .expect("reduced below p - 1");
    reduced.pow_mod(&exp, p)
}

/// Garner recombination of per-prime residues into a residue mod `p q`.
fn crt_combine<P: PaillierParams>(
    x_p: &P::HalfUint,
    x_q: &P::HalfUint,
    p: &P::HalfUint,
    q: &P::HalfUint,
) -> P::Uint {
    let q_inv = q.rem(p).inv_mod(p).expect("p and q are distinct primes");
    let diff = x_p.sub_mod(&x_q.rem(p), p);
    let h = diff.mul_mod(&q_inv, p);
    q.mul_wide(&h).wrapping_add(&x_q.into_wide())
}

impl<P: PaillierParams> ModProof<P> {
    pub fn random(
        rng: &mut impl CryptoRngCore,
        sk: &SecretKeyPaillier<P>,
        iterations: usize,
        aux: &impl Hashable,
    ) -> Self {
        let pk = sk.public_key();
        let modulus = pk.modulus();
        let (p, q) = sk.primes();

        let mut w = P::Uint::random_below(rng, modulus);
        while w.jacobi(modulus) != -1 {
            w = P::Uint::random_below(rng, modulus);
        }

        let n_inv_mod_totient = modulus
            .inv_mod(sk.totient())
            .expect("N is invertible mod φ(N)");

        let seed = challenge_seed(pk, &w, aux);
        let elements = (0..iterations)
            .map(|i| {
                let y = expand_from_hash(&seed, i as u64, modulus);
                let z = y.pow_mod(&n_inv_mod_totient, modulus);

                // Exactly one of (-1)^a w^b y is a quadratic residue mod N.
                let (a, b, y_prime) = [(false, false), (false, true), (true, false), (true, true)]
                    .into_iter()
                    .map(|(a, b)| {
                        let mut candidate = y;
                        if b {
                            candidate = candidate.mul_mod(&w, modulus);
                        }
                        if a {
                            candidate = candidate.neg_mod(modulus);
                        }
                        (a, b, candidate)
                    })
                    .find(|(_a, _b, candidate)| {
                        is_qr::<P>(candidate, p) && is_qr::<P>(candidate, q)
                    })
                    .expect("one of the four candidates is a quadratic residue");

                let x_p = fourth_root_mod_prime::<P>(&y_prime, p);
                let x_q = fourth_root_mod_prime::<P>(&y_prime, q);
                let x = crt_combine::<P>(&x_p, &x_q, p, q);

                ModProofElement { x, a, b, z }
            })
            .collect();

        Self { w, elements }
    }

    pub fn verify(
        &self,
        pk: &PublicKeyPaillier<P>,
        iterations: usize,
        aux: &impl Hashable,
    ) -> bool {
        let modulus = pk.modulus();

        if self.elements.len() != iterations {
            return false;
        }
        if modulus.is_even() || P::is_prime(modulus) {
            return false;
        }
        if self.w >= *modulus || self.w.jacobi(modulus) != -1 {
            return false;
        }

        let seed = challenge_seed(pk, &self.w, aux);
        let four = P::Uint::from_u64(4);
        self.elements.iter().enumerate().all(|(i, element)| {
            let y = expand_from_hash(&seed, i as u64, modulus);

            // z^N == y mod N
            if element.z.pow_mod(modulus, modulus) != y {
                return false;
            }

            // x^4 == (-1)^a w^b y mod N
            let mut y_prime = y;
            if element.b {
                y_prime = y_prime.mul_mod(&self.w, modulus);
            }
            if element.a {
                y_prime = y_prime.neg_mod(modulus);
            }
            element.x.pow_mod(&four, modulus) == y_prime
        })
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::ModProof;
    use crate::paillier::{PaillierTest, SecretKeyPaillier};

    const ITERATIONS: usize = 13;

    #[test]
    fn prove_and_verify() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let aux: &[u8] = b"refresh round 3";

        let proof = ModProof::random(&mut OsRng, &sk, ITERATIONS, &aux);
        assert!(proof.verify(sk.public_key(), ITERATIONS, &aux));

        let other_aux: &[u8] = b"rebound to another prover";
        assert!(!proof.verify(sk.public_key(), ITERATIONS, &other_aux));

        // A proof for a different modulus must be rejected.
        let other_sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        assert!(!proof.verify(other_sk.public_key(), ITERATIONS, &aux));
    }

    #[test]
    fn truncated_proof_is_rejected() {
        let sk = SecretKeyPaillier::<PaillierTest>::random(&mut OsRng);
        let aux: &[u8] = b"refresh round 3";
        let mut proof = ModProof::random(&mut OsRng, &sk, ITERATIONS, &aux);
        proof.elements.pop();
        assert!(!proof.verify(sk.public_key(), ITERATIONS, &aux));
    }
}
