//! Affine-operation-in-range proof with Paillier commitments (ψ_affp):
//! `D = C^x · Enc_pk0(y, ρ)` for `x, y` committed under the prover's own
//! Paillier key as `X = Enc_pk1(x, ρ_x)`, `Y = Enc_pk1(y, ρ_y)`,
//! with `|x| ≤ 2^(8 ℓ)` and `|y| ≤ 2^(8 ℓ')`.
//!
//! In pre-signing the prover's `X` is its round-1 ciphertext `G`, so the
//! MtA operation is bound to the already-broadcast γ.

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::{challenge_from_hash, mask_bound, PailUint, PailWide};
use crate::paillier::{Ciphertext, PublicKeyPaillier, RPParams};
use crate::protocols::common::SchemeParams;
use crate::tools::hashing::{Chain, Hash, Hashable};
use crate::uint::{HasWide, Signed, UintLike};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct AffPProof<S: SchemeParams> {
    cap_a: Ciphertext<S::Paillier>,
    cap_b_x: Ciphertext<S::Paillier>,
    cap_b_y: Ciphertext<S::Paillier>,
    cap_e: PailUint<S>,
    cap_s: PailUint<S>,
    cap_f: PailUint<S>,
    cap_t: PailUint<S>,
    challenge: PailUint<S>,
    z1: Signed<PailUint<S>>,
    z2: Signed<PailUint<S>>,
    z3: Signed<PailWide<S>>,
    z4: Signed<PailWide<S>>,
    w: PailUint<S>,
    w_x: PailUint<S>,
    w_y: PailUint<S>,
}

pub(crate) struct AffPStatement<'a, S: SchemeParams> {
    /// The verifier's key, under which `C` and `D` live.
    pub pk0: &'a PublicKeyPaillier<S::Paillier>,
    /// The prover's key, under which `X` and `Y` live.
    pub pk1: &'a PublicKeyPaillier<S::Paillier>,
    pub cap_c: &'a Ciphertext<S::Paillier>,
    pub cap_d: &'a Ciphertext<S::Paillier>,
    pub cap_x: &'a Ciphertext<S::Paillier>,
    pub cap_y: &'a Ciphertext<S::Paillier>,
    /// The verifier's Ring-Pedersen parameters.
    pub rp: &'a RPParams<S::Paillier>,
}

impl<S: SchemeParams> AffPProof<S> {
    fn challenge(statement: &AffPStatement<'_, S>, proof_part: impl Hashable) -> PailUint<S> {
        challenge_from_hash(
            &Hash::new_with_dst(b"AffineOpPaillierInRange")
                .chain(statement.pk0)
                .chain(statement.pk1)
                .chain(statement.cap_c)
                .chain(statement.cap_d)
                .chain(statement.cap_x)
                .chain(statement.cap_y)
                .chain(statement.rp)
                .chain(&proof_part)
                .finalize(),
        )
    }

    /// Proves the affine operation for secrets `x, y` with randomizers
    /// `rho` (the `Enc_pk0(y, ·)` inside `D`), `rho_x` (inside `X`) and
    /// `rho_y` (inside `Y`). `D`, `X` and `Y` are recomputed from the
    /// secrets, so the proof binds exactly the values on the wire.
    #[allow(clippy::too_many_arguments)]
    pub fn random(
        rng: &mut impl CryptoRngCore,
        x: &Signed<PailUint<S>>,
        y: &Signed<PailUint<S>>,
        rho: &PailUint<S>,
        rho_x: &PailUint<S>,
        rho_y: &PailUint<S>,
        pk0: &PublicKeyPaillier<S::Paillier>,
        pk1: &PublicKeyPaillier<S::Paillier>,
        cap_c: &Ciphertext<S::Paillier>,
        rp: &RPParams<S::Paillier>,
        aux: &impl Hashable,
    ) -> Self {
        let cap_d = cap_c
            .homomorphic_mul_signed(pk0, x)
            .expect("peer ciphertext is invertible")
            .homomorphic_add(pk0, &Ciphertext::new_with_randomizer_signed(pk0, y, rho));
        let cap_x = Ciphertext::new_with_randomizer_signed(pk1, x, rho_x);
        let cap_y = Ciphertext::new_with_randomizer_signed(pk1, y, rho_y);

        let x_bits = (8 * (S::I_RANGE_BYTES + S::EPS_BYTES)) as u32;
        let y_bits = (8 * (S::J_RANGE_BYTES + S::EPS_BYTES)) as u32;

        let alpha = Signed::random_in_range_bits(rng, x_bits);
        let beta = Signed::random_in_range_bits(rng, y_bits);
        let r = pk0.random_randomizer(rng);
        let r_x = pk1.random_randomizer(rng);
        let r_y = pk1.random_randomizer(rng);
        let gamma = Signed::random_in_symmetric_range(
            rng,
            &mask_bound::<S>(&rp.modulus, S::I_RANGE_BYTES + S::EPS_BYTES),
        );
        let m = Signed::random_in_symmetric_range(
            rng,
            &mask_bound::<S>(&rp.modulus, S::I_RANGE_BYTES),
        );
        let delta = Signed::random_in_symmetric_range(
            rng,
            &mask_bound::<S>(&rp.modulus, S::I_RANGE_BYTES + S::EPS_BYTES),
        );
        let mu = Signed::random_in_symmetric_range(
            rng,
            &mask_bound::<S>(&rp.modulus, S::I_RANGE_BYTES),
        );

        let cap_a = cap_c
            .homomorphic_mul_signed(pk0, &alpha)
            .expect("peer ciphertext is invertible")
            .homomorphic_add(pk0, &Ciphertext::new_with_randomizer_signed(pk0, &beta, &r));
        let cap_b_x = Ciphertext::new_with_randomizer_signed(pk1, &alpha, &r_x);
        let cap_b_y = Ciphertext::new_with_randomizer_signed(pk1, &beta, &r_y);
        let cap_e = rp.commit(&alpha, &gamma).expect("honest parameters");
        let cap_s = rp.commit(x, &m).expect("honest parameters");
        let cap_f = rp.commit(&beta, &delta).expect("honest parameters");
        let cap_t = rp.commit(y, &mu).expect("honest parameters");

        let statement = AffPStatement {
            pk0,
            pk1,
            cap_c,
            cap_d: &cap_d,
            cap_x: &cap_x,
            cap_y: &cap_y,
            rp,
        };
        let challenge = Self::challenge(
            &statement,
            (
                (aux, &cap_a, &cap_b_x, &cap_b_y),
                (&cap_e, &cap_s, &cap_f, &cap_t),
            ),
        );

        let z1 = alpha.add(&x.mul_by_unsigned(&challenge));
        let z2 = beta.add(&y.mul_by_unsigned(&challenge));
        let z3 = gamma.add(&m.mul_by_unsigned(&challenge.into_wide()));
        let z4 = delta.add(&mu.mul_by_unsigned(&challenge.into_wide()));
        let w = r.mul_mod(&rho.pow_mod(&challenge, pk0.modulus()), pk0.modulus());
        let w_x = r_x.mul_mod(&rho_x.pow_mod(&challenge, pk1.modulus()), pk1.modulus());
        let w_y = r_y.mul_mod(&rho_y.pow_mod(&challenge, pk1.modulus()), pk1.modulus());

        Self {
            cap_a,
            cap_b_x,
            cap_b_y,
            cap_e,
            cap_s,
            cap_f,
            cap_t,
            challenge,
            z1,
            z2,
            z3,
            z4,
            w,
            w_x,
            w_y,
        }
    }

    pub fn verify(&self, statement: &AffPStatement<'_, S>, aux: &impl Hashable) -> bool {
        let challenge = Self::challenge(
            statement,
            (
                (aux, &self.cap_a, &self.cap_b_x, &self.cap_b_y),
                (&self.cap_e, &self.cap_s, &self.cap_f, &self.cap_t),
            ),
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
        if !self
            .z2
            .in_range_bits((8 * (S::J_RANGE_BYTES + S::EPS_BYTES)) as u32)
        {
            return false;
        }

        let pk0 = statement.pk0;
        let pk1 = statement.pk1;
        let rp = statement.rp;

        // C^z1 Enc_0(z2, w) == A D^e mod N0²
        let lhs = match statement.cap_c.homomorphic_mul_signed(pk0, &self.z1) {
            Some(product) => product.homomorphic_add(
                pk0,
                &Ciphertext::new_with_randomizer_signed(pk0, &self.z2, &self.w),
            ),
            None => return false,
        };
        let rhs = self
            .cap_a
            .homomorphic_add(pk0, &statement.cap_d.homomorphic_mul(pk0, &challenge));
        if lhs != rhs {
            return false;
        }

        // Enc_1(z1, w_x) == B_x X^e mod N1²
        let lhs = Ciphertext::new_with_randomizer_signed(pk1, &self.z1, &self.w_x);
        let rhs = self
            .cap_b_x
            .homomorphic_add(pk1, &statement.cap_x.homomorphic_mul(pk1, &challenge));
        if lhs != rhs {
            return false;
        }

        // Enc_1(z2, w_y) == B_y Y^e mod N1²
        let lhs = Ciphertext::new_with_randomizer_signed(pk1, &self.z2, &self.w_y);
        let rhs = self
            .cap_b_y
            .homomorphic_add(pk1, &statement.cap_y.homomorphic_mul(pk1, &challenge));
        if lhs != rhs {
            return false;
        }

        // s^z1 t^z3 == E S^e mod N̂
        let lhs = match rp.commit(&self.z1, &self.z3) {
            Some(commitment) => commitment,
            None => return false,
        };
        let rhs = rp.mul(&self.cap_e, &self.cap_s.pow_mod(&challenge, &rp.modulus));
        if lhs != rhs {
            return false;
        }

        // s^z2 t^z4 == F T^e mod N̂
        let lhs = match rp.commit(&self.z2, &self.z4) {
            Some(commitment) => commitment,
            None => return false,
        };
        let rhs = rp.mul(&self.cap_f, &self.cap_t.pow_mod(&challenge, &rp.modulus));
        lhs == rhs
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::{AffPProof, AffPStatement};
    use crate::curve::Scalar;
    use crate::paillier::{Ciphertext, RPParams, SecretKeyPaillier};
    use crate::protocols::common::{SchemeParams, TestParams};
    use crate::uint::{Signed, UintLike};

    type Paillier = <TestParams as SchemeParams>::Paillier;

    #[test]
    fn prove_and_verify() {
        let sk0 = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let pk0 = sk0.public_key();
        let sk1 = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let pk1 = sk1.public_key();
        let (_rp_secret, rp) = RPParams::random(&mut OsRng);

        // The verifier's ciphertext the affine operation acts on.
        let k = Signed::from_unsigned(Scalar::random(&mut OsRng).to_uint());
        let cap_c = Ciphertext::new_with_randomizer_signed(
            pk0,
            &k,
            &pk0.random_randomizer(&mut OsRng),
        );

        let x = Signed::from_unsigned(Scalar::random(&mut OsRng).to_uint());
        let y = Signed::random_in_range_bits(
            &mut OsRng,
            (8 * TestParams::J_RANGE_BYTES) as u32,
        );
        let rho = pk0.random_randomizer(&mut OsRng);
        let rho_x = pk1.random_randomizer(&mut OsRng);
        let rho_y = pk1.random_randomizer(&mut OsRng);

        let cap_d = cap_c
            .homomorphic_mul_signed(pk0, &x)
            .unwrap()
            .homomorphic_add(
                pk0,
                &Ciphertext::new_with_randomizer_signed(pk0, &y, &rho),
            );
        let cap_x = Ciphertext::new_with_randomizer_signed(pk1, &x, &rho_x);
        let cap_y = Ciphertext::new_with_randomizer_signed(pk1, &y, &rho_y);

        let aux: &[u8] = b"presigning round 2";
        let proof = AffPProof::<TestParams>::random(
            &mut OsRng, &x, &y, &rho, &rho_x, &rho_y, pk0, pk1, &cap_c, &rp, &aux,
        );

        let statement = AffPStatement {
            pk0,
            pk1,
            cap_c: &cap_c,
            cap_d: &cap_d,
            cap_x: &cap_x,
            cap_y: &cap_y,
            rp: &rp,
        };
        assert!(proof.verify(&statement, &aux));

        // Substituting another D must be rejected.
        let other_d = cap_d.homomorphic_add(
            pk0,
            &Ciphertext::new_with_randomizer_signed(
                pk0,
                &Signed::from_unsigned(Scalar::from(1u64).to_uint()),
                &pk0.random_randomizer(&mut OsRng),
            ),
        );
        let bad_statement = AffPStatement {
            cap_d: &other_d,
            ..statement
        };
        assert!(!proof.verify(&bad_statement, &aux));
    }

    #[test]
    fn offset_at_the_range_edge_still_verifies() {
        let sk0 = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let pk0 = sk0.public_key();
        let sk1 = SecretKeyPaillier::<Paillier>::random(&mut OsRng);
        let pk1 = sk1.public_key();
        let (_rp_secret, rp) = RPParams::random(&mut OsRng);

        let k = Signed::from_unsigned(Scalar::random(&mut OsRng).to_uint());
        let k_randomizer = pk0.random_randomizer(&mut OsRng);
        let cap_c = Ciphertext::new_with_randomizer_signed(pk0, &k, &k_randomizer);

        let x_scalar = Scalar::random(&mut OsRng);
        let x = Signed::from_unsigned(x_scalar.to_uint());
        // β exactly at ±2^(8 J)
        let edge = <Paillier as crate::paillier::PaillierParams>::Uint::one()
            .wrapping_shl((8 * TestParams::J_RANGE_BYTES) as u32);
        for y in [
            Signed::from_unsigned(edge),
            Signed::from_unsigned(edge).neg(),
        ] {
            let rho = pk0.random_randomizer(&mut OsRng);
            let rho_x = pk1.random_randomizer(&mut OsRng);
            let rho_y = pk1.random_randomizer(&mut OsRng);

            let cap_d = cap_c
                .homomorphic_mul_signed(pk0, &x)
                .unwrap()
                .homomorphic_add(
                    pk0,
                    &Ciphertext::new_with_randomizer_signed(pk0, &y, &rho),
                );
            let cap_x = Ciphertext::new_with_randomizer_signed(pk1, &x, &rho_x);
            let cap_y = Ciphertext::new_with_randomizer_signed(pk1, &y, &rho_y);

            let aux: &[u8] = b"presigning round 2";
            let proof = AffPProof::<TestParams>::random(
                &mut OsRng, &x, &y, &rho, &rho_x, &rho_y, pk0, pk1, &cap_c, &rp, &aux,
            );
            let statement = AffPStatement {
                pk0,
                pk1,
                cap_c: &cap_c,
                cap_d: &cap_d,
                cap_x: &cap_x,
                cap_y: &cap_y,
                rp: &rp,
            };
            assert!(proof.verify(&statement, &aux));

            // The MtA reconstruction is exact: centered decryption of D
            // recovers x k + y over the integers, so α - β == x k mod q.
            let alpha = sk0.decrypt_signed(&cap_d);
            assert_eq!(
                Scalar::from_signed(&alpha) - Scalar::from_signed(&y),
                Scalar::from_signed(&k) * x_scalar,
            );
        }
    }
}
