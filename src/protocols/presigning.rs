//! Non-interactive pre-signing: produces the one-shot nonce commitment
//! `(R, k_i, χ_i)` a signature share is later computed from.
//!
//! Round 1 broadcasts the Paillier ciphertexts `K = Enc(k)`, `G = Enc(γ)`
//! and sends each peer a range proof for `K`. Round 2 runs two
//! multiplicative-to-additive conversions against every peer's `K` (for
//! `γ k` and for `x k`), with the affine-operation proofs binding them to
//! the round-1 ciphertexts. Round 3 opens `δ_i` and `Δ_i = Γ^{k_i}`, and
//! the final round checks `g^δ == Σ Δ_j` before deriving `R = Γ^{1/δ}`.
//!
//! The MtA here follows the +β convention: `D = K^γ · Enc(β)` with the
//! subtraction deferred to the summation, `δ_i = γ k + Σ (α - β)`.

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::common::{uint_from_scalar, KeyShare, PartyId, PartyIdx, PresigningData, SchemeParams};
use super::generic::{
    FinalizeError, FinalizeSuccess, FirstRound, InitError, NonExistent, ReceiveError, Round,
    ToSendTyped,
};
use crate::curve::{Point, Scalar};
use crate::paillier::{Ciphertext, PaillierParams, PublicKeyPaillier, RPParams};
use crate::sigma::aff_g::{AffGProof, AffGStatement};
use crate::sigma::aff_p::{AffPProof, AffPStatement};
use crate::sigma::enc::EncProof;
use crate::sigma::log_star::LogStarProof;
use crate::sigma::{PailUint, ProofAux};
use crate::tools::collections::{HoleRange, HoleVec, HoleVecAccum};
use crate::tools::hashing::{Chain, Hash, HashOutput, Hashable};
use crate::uint::Signed;

struct Context<S: SchemeParams> {
    session_hash: HashOutput,
    key_share: KeyShare<S>,
    k: Scalar,
    gamma: Scalar,
    rho: PailUint<S>,
    nu: PailUint<S>,
}

impl<S: SchemeParams> Context<S> {
    fn id(&self) -> PartyId {
        self.key_share.party_id()
    }

    fn my_idx(&self) -> usize {
        self.key_share.party_index().as_usize()
    }

    fn num_parties(&self) -> usize {
        self.key_share.num_parties()
    }

    fn pk(&self) -> &PublicKeyPaillier<S::Paillier> {
        self.key_share.secret_aux.paillier_sk.public_key()
    }

    fn pk_of(&self, idx: usize) -> &PublicKeyPaillier<S::Paillier> {
        &self.key_share.public_aux[idx].paillier_pk
    }

    fn rp_of(&self, idx: usize) -> &RPParams<S::Paillier> {
        &self.key_share.public_aux[idx].rp_params
    }

    fn aux(&self) -> ProofAux {
        ProofAux::new(self.session_hash, self.id())
    }

    fn aux_for(&self, from: PartyIdx) -> ProofAux {
        self.aux()
            .for_prover(self.key_share.ids[from.as_usize()])
    }

    fn k_signed(&self) -> Signed<PailUint<S>> {
        Signed::from_unsigned(self.k.to_uint())
    }

    fn gamma_signed(&self) -> Signed<PailUint<S>> {
        Signed::from_unsigned(self.gamma.to_uint())
    }
}

pub(crate) struct Round1Part1<S: SchemeParams> {
    context: Context<S>,
    k_ciphertext: Ciphertext<S::Paillier>,
    g_ciphertext: Ciphertext<S::Paillier>,
}

impl<S: SchemeParams> FirstRound for Round1Part1<S> {
    type Context = KeyShare<S>;

    fn new(
        rng: &mut impl CryptoRngCore,
        session_hash: &HashOutput,
        num_parties: usize,
        party_idx: PartyIdx,
        key_share: Self::Context,
    ) -> Result<Self, InitError> {
        // The centered MtA decryption is exact only while β fits well
        // inside the Paillier plaintext range.
        assert!(<S::Paillier as PaillierParams>::PRIME_BYTES >= S::J_RANGE_BYTES);

        if key_share.num_parties() != num_parties || key_share.party_index() != party_idx {
            return Err(InitError::Internal("inconsistent key share".into()));
        }

        let k = Scalar::random(rng);
        let gamma = Scalar::random(rng);
        let pk = key_share.secret_aux.paillier_sk.public_key();
        let rho = pk.random_randomizer(rng);
        let nu = pk.random_randomizer(rng);

        let k_ciphertext =
            Ciphertext::new_with_randomizer(pk, &uint_from_scalar::<S::Paillier>(&k), &rho);
        let g_ciphertext =
            Ciphertext::new_with_randomizer(pk, &uint_from_scalar::<S::Paillier>(&gamma), &nu);

        Ok(Self {
            context: Context {
                session_hash: *session_hash,
                key_share,
                k,
                gamma,
                rho,
                nu,
            },
            k_ciphertext,
            g_ciphertext,
        })
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Round1Bcast<P: PaillierParams> {
    k_ciphertext: Ciphertext<P>,
    g_ciphertext: Ciphertext<P>,
}

impl<P: PaillierParams> Hashable for Round1Bcast<P> {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain(&self.k_ciphertext).chain(&self.g_ciphertext)
    }
}

impl<S: SchemeParams> Round for Round1Part1<S> {
    type Message = Round1Bcast<S::Paillier>;
    type Payload = Round1Bcast<S::Paillier>;
    type NextRound = Round1Part2<S>;
    type Result = PresigningData;

    const ROUND_NUM: u8 = 1;
    const NEXT_ROUND_NUM: Option<u8> = Some(2);

    fn to_send(&self, _rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message> {
        ToSendTyped::Broadcast(Round1Bcast {
            k_ciphertext: self.k_ciphertext.clone(),
            g_ciphertext: self.g_ciphertext.clone(),
        })
    }

    fn verify_received(
        &self,
        _from: PartyIdx,
        msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError> {
        Ok(msg)
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        let (k_ciphertexts, g_ciphertexts) = payloads
            .map(|bcast| (bcast.k_ciphertext, bcast.g_ciphertext))
            .unzip();
        let k_ciphertexts = k_ciphertexts.into_vec(self.k_ciphertext);
        let g_ciphertexts = g_ciphertexts.into_vec(self.g_ciphertext);
        Ok(FinalizeSuccess::AnotherRound(Round1Part2 {
            context: self.context,
            k_ciphertexts,
            g_ciphertexts,
        }))
    }
}

pub(crate) struct Round1Part2<S: SchemeParams> {
    context: Context<S>,
    k_ciphertexts: Vec<Ciphertext<S::Paillier>>,
    g_ciphertexts: Vec<Ciphertext<S::Paillier>>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Round1Direct<S: SchemeParams>(EncProof<S>);

impl<S: SchemeParams> Round for Round1Part2<S> {
    type Message = Round1Direct<S>;
    type Payload = ();
    type NextRound = Round2<S>;
    type Result = PresigningData;

    const ROUND_NUM: u8 = 2;
    const NEXT_ROUND_NUM: Option<u8> = Some(3);

    fn to_send(&self, rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message> {
        let aux = self.context.aux();
        let messages = HoleRange::new(self.context.num_parties(), self.context.my_idx())
            .map(|idx| {
                // K is proven in range against each peer's own
                // Ring-Pedersen parameters.
                let proof = EncProof::random(
                    rng,
                    &self.context.k_signed(),
                    &self.context.rho,
                    self.context.pk(),
                    self.context.rp_of(idx),
                    &aux,
                );
                (PartyIdx::from_usize(idx), Round1Direct(proof))
            })
            .collect();
        ToSendTyped::Direct(messages)
    }

    fn verify_received(
        &self,
        from: PartyIdx,
        msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError> {
        let aux = self.context.aux_for(from);
        if msg.0.verify(
            self.context.pk_of(from.as_usize()),
            &self.k_ciphertexts[from.as_usize()],
            self.context.rp_of(self.context.my_idx()),
            &aux,
        ) {
            Ok(())
        } else {
            Err(ReceiveError::VerificationFail(
                "encryption range proof (psi_enc)".into(),
            ))
        }
    }

    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        _payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        Ok(FinalizeSuccess::AnotherRound(Round2::new(rng, self)))
    }
}

/// Per-peer MtA state: the offsets, their randomizers, and the four
/// ciphertexts sent in round 2.
struct MtAArtefact<S: SchemeParams> {
    beta: Signed<PailUint<S>>,
    beta_hat: Signed<PailUint<S>>,
    r: PailUint<S>,
    s: PailUint<S>,
    r_hat: PailUint<S>,
    s_hat: PailUint<S>,
    cap_d: Ciphertext<S::Paillier>,
    cap_f: Ciphertext<S::Paillier>,
    cap_d_hat: Ciphertext<S::Paillier>,
    cap_f_hat: Ciphertext<S::Paillier>,
}

pub(crate) struct Round2<S: SchemeParams> {
    context: Context<S>,
    k_ciphertexts: Vec<Ciphertext<S::Paillier>>,
    g_ciphertexts: Vec<Ciphertext<S::Paillier>>,
    artefacts: HoleVec<MtAArtefact<S>>,
    echo: HashOutput,
}

impl<S: SchemeParams> Round2<S> {
    fn new(rng: &mut impl CryptoRngCore, round1: Round1Part2<S>) -> Self {
        let num_parties = round1.context.num_parties();
        let my_idx = round1.context.my_idx();
        let pk = round1.context.pk();
        let gamma_uint = uint_from_scalar::<S::Paillier>(&round1.context.gamma);
        let secret_uint =
            uint_from_scalar::<S::Paillier>(&round1.context.key_share.secret_share);

        let mut artefacts = HoleVecAccum::new(num_parties, my_idx);
        for idx in HoleRange::new(num_parties, my_idx) {
            let target_pk = round1.context.pk_of(idx);
            let k_target = &round1.k_ciphertexts[idx];

            // Multiplication share of γ k: D = K^γ Enc_peer(β),
            // F = Enc_self(β).
            let beta =
                Signed::random_in_range_bits(rng, (8 * S::J_RANGE_BYTES) as u32);
            let r = pk.random_randomizer(rng);
            let s = target_pk.random_randomizer(rng);
            let cap_f = Ciphertext::new_with_randomizer_signed(pk, &beta, &r);
            let cap_d = k_target.homomorphic_mul(target_pk, &gamma_uint).homomorphic_add(
                target_pk,
                &Ciphertext::new_with_randomizer_signed(target_pk, &beta, &s),
            );

            // Multiplication share of x k, analogous.
            let beta_hat =
                Signed::random_in_range_bits(rng, (8 * S::J_RANGE_BYTES) as u32);
            let r_hat = pk.random_randomizer(rng);
            let s_hat = target_pk.random_randomizer(rng);
            let cap_f_hat = Ciphertext::new_with_randomizer_signed(pk, &beta_hat, &r_hat);
            let cap_d_hat = k_target
                .homomorphic_mul(target_pk, &secret_uint)
                .homomorphic_add(
                    target_pk,
                    &Ciphertext::new_with_randomizer_signed(target_pk, &beta_hat, &s_hat),
                );

            artefacts
                .insert(
                    idx,
                    MtAArtefact {
                        beta,
                        beta_hat,
                        r,
                        s,
                        r_hat,
                        s_hat,
                        cap_d,
                        cap_f,
                        cap_d_hat,
                        cap_f_hat,
                    },
                )
                .expect("slot is empty");
        }

        // Echo hash over everyone's round-1 ciphertexts in roster order.
        let mut digest = Hash::new_with_dst(b"PresigningEcho");
        for idx in 0..num_parties {
            digest = digest
                .chain(&round1.k_ciphertexts[idx])
                .chain(&round1.g_ciphertexts[idx]);
        }
        let echo = digest.finalize();

        Self {
            context: round1.context,
            k_ciphertexts: round1.k_ciphertexts,
            g_ciphertexts: round1.g_ciphertexts,
            artefacts: artefacts.finalize().expect("all slots filled"),
            echo,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Round2Direct<S: SchemeParams> {
    gamma: Point, // Γ_i
    cap_d: Ciphertext<S::Paillier>,
    cap_f: Ciphertext<S::Paillier>,
    cap_d_hat: Ciphertext<S::Paillier>,
    cap_f_hat: Ciphertext<S::Paillier>,
    psi_affp: AffPProof<S>,
    psi_affg: AffGProof<S>,
    psi_log_g: LogStarProof<S>,
    echo: HashOutput,
}

pub(crate) struct Round2Payload {
    gamma: Point,
    alpha: Scalar,
    alpha_hat: Scalar,
}

impl<S: SchemeParams> Round for Round2<S> {
    type Message = Round2Direct<S>;
    type Payload = Round2Payload;
    type NextRound = Round3<S>;
    type Result = PresigningData;

    const ROUND_NUM: u8 = 3;
    const NEXT_ROUND_NUM: Option<u8> = Some(4);

    fn to_send(&self, rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message> {
        let aux = self.context.aux();
        let big_gamma = self.context.gamma.mul_by_generator();
        let pk = self.context.pk();

        let messages = HoleRange::new(self.context.num_parties(), self.context.my_idx())
            .map(|idx| {
                let target_pk = self.context.pk_of(idx);
                let target_rp = self.context.rp_of(idx);
                let artefact = self.artefacts.get(idx).expect("peer index is valid");

                let psi_affp = AffPProof::random(
                    rng,
                    &self.context.gamma_signed(),
                    &artefact.beta,
                    &artefact.s,
                    &self.context.nu,
                    &artefact.r,
                    target_pk,
                    pk,
                    &self.k_ciphertexts[idx],
                    target_rp,
                    &aux,
                );

                let psi_affg = AffGProof::random(
                    rng,
                    &Signed::from_unsigned(
                        self.context.key_share.secret_share.to_uint(),
                    ),
                    &artefact.beta_hat,
                    &artefact.s_hat,
                    &artefact.r_hat,
                    target_pk,
                    pk,
                    &self.k_ciphertexts[idx],
                    target_rp,
                    &aux,
                );

                let psi_log_g = LogStarProof::random(
                    rng,
                    &self.context.gamma_signed(),
                    &self.context.nu,
                    pk,
                    &Point::GENERATOR,
                    target_rp,
                    &aux,
                );

                let message = Round2Direct {
                    gamma: big_gamma,
                    cap_d: artefact.cap_d.clone(),
                    cap_f: artefact.cap_f.clone(),
                    cap_d_hat: artefact.cap_d_hat.clone(),
                    cap_f_hat: artefact.cap_f_hat.clone(),
                    psi_affp,
                    psi_affg,
                    psi_log_g,
                    echo: self.echo,
                };
                (PartyIdx::from_usize(idx), message)
            })
            .collect();
        ToSendTyped::Direct(messages)
    }

    fn verify_received(
        &self,
        from: PartyIdx,
        msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError> {
        let my_idx = self.context.my_idx();
        let from_idx = from.as_usize();
        let aux = self.context.aux_for(from);
        let pk = self.context.pk();
        let from_pk = self.context.pk_of(from_idx);
        let my_rp = self.context.rp_of(my_idx);

        if msg.echo != self.echo {
            return Err(ReceiveError::VerificationFail("echo broadcast".into()));
        }

        // The affine operation acted on our K; the committed multiplier
        // is the peer's round-1 G (for γ) or its public key share (for x).
        let affp_statement = AffPStatement::<S> {
            pk0: pk,
            pk1: from_pk,
            cap_c: &self.k_ciphertexts[my_idx],
            cap_d: &msg.cap_d,
            cap_x: &self.g_ciphertexts[from_idx],
            cap_y: &msg.cap_f,
            rp: my_rp,
        };
        if !msg.psi_affp.verify(&affp_statement, &aux) {
            return Err(ReceiveError::VerificationFail(
                "affine operation proof (psi_affp)".into(),
            ));
        }

        let affg_statement = AffGStatement::<S> {
            pk0: pk,
            pk1: from_pk,
            cap_c: &self.k_ciphertexts[my_idx],
            cap_d: &msg.cap_d_hat,
            cap_x: &self.context.key_share.public_shares[from_idx],
            cap_y: &msg.cap_f_hat,
            rp: my_rp,
        };
        if !msg.psi_affg.verify(&affg_statement, &aux) {
            return Err(ReceiveError::VerificationFail(
                "affine operation proof (psi_affg)".into(),
            ));
        }

        if !msg.psi_log_g.verify(
            from_pk,
            &self.g_ciphertexts[from_idx],
            &Point::GENERATOR,
            &msg.gamma,
            my_rp,
            &aux,
        ) {
            return Err(ReceiveError::VerificationFail(
                "gamma consistency proof (psi_logG)".into(),
            ));
        }

        let sk = &self.context.key_share.secret_aux.paillier_sk;
        let alpha = Scalar::from_signed(&sk.decrypt_signed(&msg.cap_d));
        let alpha_hat = Scalar::from_signed(&sk.decrypt_signed(&msg.cap_d_hat));

        Ok(Round2Payload {
            gamma: msg.gamma,
            alpha,
            alpha_hat,
        })
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        let own_gamma = self.context.gamma.mul_by_generator();
        let big_gamma = own_gamma + payloads.iter().map(|payload| payload.gamma).sum::<Point>();

        let big_delta = &big_gamma * &self.context.k;

        // δ_i = γ k + Σ (α - β), χ_i = x k + Σ (α̂ - β̂)
        let mut delta = self.context.gamma * self.context.k;
        let mut product_share = self.context.key_share.secret_share * self.context.k;
        for (idx, payload) in payloads.enumerate() {
            let artefact = self.artefacts.get(idx).expect("peer index is valid");
            delta = delta + payload.alpha - Scalar::from_signed(&artefact.beta);
            product_share =
                product_share + payload.alpha_hat - Scalar::from_signed(&artefact.beta_hat);
        }

        Ok(FinalizeSuccess::AnotherRound(Round3 {
            context: self.context,
            k_ciphertexts: self.k_ciphertexts,
            big_gamma,
            delta,
            big_delta,
            product_share,
        }))
    }
}

pub(crate) struct Round3<S: SchemeParams> {
    context: Context<S>,
    k_ciphertexts: Vec<Ciphertext<S::Paillier>>,
    big_gamma: Point, // Γ
    delta: Scalar,    // δ_i
    big_delta: Point, // Δ_i
    product_share: Scalar, // χ_i
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Round3Direct<S: SchemeParams> {
    delta: Scalar,
    big_delta: Point,
    psi_log_k: LogStarProof<S>,
}

pub(crate) struct Round3Payload {
    delta: Scalar,
    big_delta: Point,
}

impl<S: SchemeParams> Round for Round3<S> {
    type Message = Round3Direct<S>;
    type Payload = Round3Payload;
    type NextRound = NonExistent<Self::Result>;
    type Result = PresigningData;

    const ROUND_NUM: u8 = 4;
    const NEXT_ROUND_NUM: Option<u8> = None;

    fn to_send(&self, rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message> {
        let aux = self.context.aux();
        let messages = HoleRange::new(self.context.num_parties(), self.context.my_idx())
            .map(|idx| {
                // K encrypts the same k that exponentiates Γ into Δ_i.
                let psi_log_k = LogStarProof::random(
                    rng,
                    &self.context.k_signed(),
                    &self.context.rho,
                    self.context.pk(),
                    &self.big_gamma,
                    self.context.rp_of(idx),
                    &aux,
                );
                let message = Round3Direct {
                    delta: self.delta,
                    big_delta: self.big_delta,
                    psi_log_k,
                };
                (PartyIdx::from_usize(idx), message)
            })
            .collect();
        ToSendTyped::Direct(messages)
    }

    fn verify_received(
        &self,
        from: PartyIdx,
        msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError> {
        let aux = self.context.aux_for(from);
        if !msg.psi_log_k.verify(
            self.context.pk_of(from.as_usize()),
            &self.k_ciphertexts[from.as_usize()],
            &self.big_gamma,
            &msg.big_delta,
            self.context.rp_of(self.context.my_idx()),
            &aux,
        ) {
            return Err(ReceiveError::VerificationFail(
                "nonce consistency proof (psi_logK)".into(),
            ));
        }
        Ok(Round3Payload {
            delta: msg.delta,
            big_delta: msg.big_delta,
        })
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        let delta =
            self.delta + payloads.iter().map(|payload| payload.delta).sum::<Scalar>();
        let big_delta =
            self.big_delta + payloads.iter().map(|payload| payload.big_delta).sum::<Point>();

        // g^δ == Σ Δ_j; a mismatch means some party lied about its
        // MtA outputs.
        if delta.mul_by_generator() != big_delta {
            return Err(FinalizeError::VerificationFail(
                "delta consistency".into(),
            ));
        }

        let delta_inv: Option<Scalar> = delta.invert().into();
        let nonce_point = match delta_inv {
            Some(delta_inv) => &self.big_gamma * &delta_inv,
            None => return Err(FinalizeError::Internal("delta is zero".into())),
        };

        Ok(FinalizeSuccess::Result(PresigningData {
            nonce_point,
            nonce_share: self.context.k,
            product_share: self.product_share,
        }))
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::Round1Part1;
    use crate::curve::Scalar;
    use crate::protocols::common::{KeyShare, PartyId, PartyIdx, SessionInfo, TestParams};
    use crate::protocols::generic::FirstRound;
    use crate::protocols::test_utils::{assert_next_round, assert_result, step};

    #[test]
    fn execute_presigning() {
        let session = SessionInfo::new(b"presigning test session", vec![
            PartyId(101),
            PartyId(102),
            PartyId(103),
        ]);
        let key_shares = KeyShare::<TestParams>::new_centralized(&mut OsRng, session.ids());
        let session_hash = key_shares[0].session_hash(&session);

        let r1 = key_shares
            .iter()
            .enumerate()
            .map(|(idx, key_share)| {
                Round1Part1::<TestParams>::new(
                    &mut OsRng,
                    &session_hash,
                    3,
                    PartyIdx::from_usize(idx),
                    key_share.clone(),
                )
                .unwrap()
            })
            .collect();

        let r1p2 = assert_next_round(step(&mut OsRng, r1).unwrap()).unwrap();
        let r2 = assert_next_round(step(&mut OsRng, r1p2).unwrap()).unwrap();
        let r3 = assert_next_round(step(&mut OsRng, r2).unwrap()).unwrap();
        let presigning = assert_result(step(&mut OsRng, r3).unwrap()).unwrap();

        // Every party derived the same nonce point.
        assert_eq!(presigning[0].nonce_point, presigning[1].nonce_point);
        assert_eq!(presigning[0].nonce_point, presigning[2].nonce_point);

        // The additive shares are consistent: Σ χ_i == (Σ k_i)(Σ x_i),
        // and R == g^(1/Σ k_i).
        let k: Scalar = presigning.iter().map(|data| data.nonce_share).sum();
        let k_times_x: Scalar = presigning.iter().map(|data| data.product_share).sum();
        let x: Scalar = key_shares
            .iter()
            .map(|share| share.secret_share)
            .sum();
        assert_eq!(k * x, k_times_x);
        let k_inv: Option<Scalar> = k.invert().into();
        assert_eq!(k_inv.unwrap().mul_by_generator(), presigning[0].nonce_point);
    }
}
