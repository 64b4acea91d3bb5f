//! Key refresh and auxiliary-information generation.
//!
//! Each party draws a fresh Paillier keypair and fresh Ring-Pedersen
//! parameters, and re-shares zero additively across the group: the
//! individual shares rotate while the aggregate key stays fixed.
//! The commit/echo/reveal/prove schedule mirrors key generation, with
//! the Paillier-Blum and Ring-Pedersen parameter proofs attached to the
//! proving round and the zero-reshares delivered encrypted under the
//! recipients' fresh keys.

use std::time::Instant;

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::common::{
    KeyShare, KeyShareSeed, PartyId, PartyIdx, PublicAuxData, SchemeParams, SecretAuxData,
};
use super::generic::{
    FinalizeError, FinalizeSuccess, FirstRound, InitError, NonExistent, ReceiveError, Round,
    ToSendTyped,
};
use crate::curve::{Point, Scalar};
use crate::paillier::{
    Ciphertext, PaillierParams, PublicKeyPaillier, RPParams, RPSecret, SecretKeyPaillier,
};
use crate::sigma::blum_modulus::ModProof;
use crate::sigma::prm::PrmProof;
use crate::sigma::sch::{SchCommitment, SchProof, SchSecret};
use crate::sigma::ProofAux;
use crate::uint::UintLike;
use crate::tools::collections::{HoleRange, HoleVec};
use crate::tools::hashing::{random_chunk, Chain, Hash, HashOutput, Hashable};

/// The values committed to in round 1 and revealed in round 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RefreshData<P: PaillierParams> {
    reshare_publics: Vec<Point>,         // X_i^j = g^{x_i^j}
    sch_commitments: Vec<SchCommitment>, // A_i^j
    paillier_pk: PublicKeyPaillier<P>,
    rp_params: RPParams<P>,
    rho: HashOutput,
    u: HashOutput,
}

impl<P: PaillierParams> Hashable for RefreshData<P> {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest
            .chain(&self.reshare_publics)
            .chain(&self.sch_commitments)
            .chain(&self.paillier_pk)
            .chain(&self.rp_params)
            .chain(&self.rho)
            .chain(&self.u)
    }
}

impl<P: PaillierParams> RefreshData<P> {
    fn hash(&self, session_hash: &HashOutput, id: PartyId) -> HashOutput {
        Hash::new_with_dst(b"RefreshCommitment")
            .chain(session_hash)
            .chain(&id)
            .chain(self)
            .finalize()
    }
}

struct Context<S: SchemeParams> {
    session_hash: HashOutput,
    seed: KeyShareSeed,
    paillier_sk: SecretKeyPaillier<S::Paillier>,
    rp_secret: RPSecret<S::Paillier>,
    reshare_secrets: Vec<Scalar>, // x_i^j, summing to zero
    sch_secrets: Vec<SchSecret>,  // τ^j
    data: RefreshData<S::Paillier>,
}

impl<S: SchemeParams> Context<S> {
    fn id(&self) -> PartyId {
        self.seed.party_id()
    }

    fn my_idx(&self) -> usize {
        self.seed.party_index().as_usize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round1Bcast {
    hash: HashOutput,
}

pub(crate) struct Round1<S: SchemeParams> {
    context: Context<S>,
}

impl<S: SchemeParams> FirstRound for Round1<S> {
    type Context = KeyShareSeed;

    fn new(
        rng: &mut impl CryptoRngCore,
        session_hash: &HashOutput,
        num_parties: usize,
        party_idx: PartyIdx,
        seed: Self::Context,
    ) -> Result<Self, InitError> {
        if seed.ids.len() != num_parties || seed.party_index() != party_idx {
            return Err(InitError::Internal("inconsistent key share".into()));
        }
        let my_idx = party_idx.as_usize();

        // Prime generation dominates the runtime of the whole protocol.
        let prime_timer = Instant::now();
        let paillier_sk = SecretKeyPaillier::random(rng);
        let (rp_secret, rp_params) = RPParams::random(rng);
        tracing::debug!(
            elapsed_ms = prime_timer.elapsed().as_millis() as u64,
            "refresh round 1: generated fresh moduli"
        );

        // Sample reshares for the peers; own reshare is the negated sum,
        // so that the whole vector shares zero.
        let mut reshare_secrets = vec![Scalar::ZERO; num_parties];
        for idx in HoleRange::new(num_parties, my_idx) {
            reshare_secrets[idx] = Scalar::random(rng);
            reshare_secrets[my_idx] = reshare_secrets[my_idx] - reshare_secrets[idx];
        }
        let reshare_publics: Vec<Point> = reshare_secrets
            .iter()
            .map(|secret| secret.mul_by_generator())
            .collect();

        let sch_secrets: Vec<SchSecret> =
            (0..num_parties).map(|_| SchSecret::random(rng)).collect();
        let sch_commitments = sch_secrets.iter().map(SchCommitment::new).collect();

        let data = RefreshData {
            reshare_publics,
            sch_commitments,
            paillier_pk: paillier_sk.public_key().clone(),
            rp_params,
            rho: random_chunk(rng),
            u: random_chunk(rng),
        };

        Ok(Self {
            context: Context {
                session_hash: *session_hash,
                seed,
                paillier_sk,
                rp_secret,
                reshare_secrets,
                sch_secrets,
                data,
            },
        })
    }
}

impl<S: SchemeParams> Round for Round1<S> {
    type Message = Round1Bcast;
    type Payload = HashOutput;
    type NextRound = Round2<S>;
    type Result = KeyShare<S>;

    const ROUND_NUM: u8 = 1;
    const NEXT_ROUND_NUM: Option<u8> = Some(2);

    fn to_send(&self, _rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message> {
        let hash = self
            .context
            .data
            .hash(&self.context.session_hash, self.context.id());
        ToSendTyped::Broadcast(Round1Bcast { hash })
    }

    fn verify_received(
        &self,
        _from: PartyIdx,
        msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError> {
        Ok(msg.hash)
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        let own_hash = self
            .context
            .data
            .hash(&self.context.session_hash, self.context.id());
        let all_hashes = payloads.into_vec(own_hash);
        let echo = Hash::new_with_dst(b"RefreshEcho")
            .chain(&all_hashes)
            .finalize();

        Ok(FinalizeSuccess::AnotherRound(Round2 {
            hashes: all_hashes,
            echo,
            context: self.context,
        }))
    }
}

pub(crate) struct Round2<S: SchemeParams> {
    context: Context<S>,
    hashes: Vec<HashOutput>, // V_j, own included
    echo: HashOutput,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Round2Bcast<P: PaillierParams> {
    data: RefreshData<P>,
    echo: HashOutput,
}

impl<S: SchemeParams> Round for Round2<S> {
    type Message = Round2Bcast<S::Paillier>;
    type Payload = RefreshData<S::Paillier>;
    type NextRound = Round3<S>;
    type Result = KeyShare<S>;

    const ROUND_NUM: u8 = 2;
    const NEXT_ROUND_NUM: Option<u8> = Some(3);

    fn to_send(&self, _rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message> {
        ToSendTyped::Broadcast(Round2Bcast {
            data: self.context.data.clone(),
            echo: self.echo,
        })
    }

    fn verify_received(
        &self,
        from: PartyIdx,
        msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError> {
        let num_parties = self.context.seed.ids.len();
        let id_from = self.context.seed.ids[from.as_usize()];

        if msg.data.reshare_publics.len() != num_parties
            || msg.data.sch_commitments.len() != num_parties
        {
            return Err(ReceiveError::Malformed(
                "wrong number of reshare entries".into(),
            ));
        }

        if msg.data.hash(&self.context.session_hash, id_from) != self.hashes[from.as_usize()] {
            return Err(ReceiveError::VerificationFail(
                "commitment decommitment".into(),
            ));
        }

        if msg.echo != self.echo {
            return Err(ReceiveError::VerificationFail("echo broadcast".into()));
        }

        // The fresh modulus must have the agreed size.
        if msg.data.paillier_pk.modulus().bits()
            < 2 * <S::Paillier as PaillierParams>::PRIME_BITS - 1
        {
            return Err(ReceiveError::VerificationFail("modulus bit length".into()));
        }

        // The reshares must sum to zero: Π_k X_j^k == identity.
        let combined: Point = msg.data.reshare_publics.iter().cloned().sum();
        if !combined.is_identity() {
            return Err(ReceiveError::VerificationFail("reshare zero sum".into()));
        }

        Ok(msg.data)
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        let combined_rho = payloads
            .iter()
            .fold(self.context.data.rho, |rho, data| rho.xor(&data.rho));

        Ok(FinalizeSuccess::AnotherRound(Round3 {
            datas: payloads,
            combined_rho,
            context: self.context,
        }))
    }
}

pub(crate) struct Round3<S: SchemeParams> {
    context: Context<S>,
    datas: HoleVec<RefreshData<S::Paillier>>,
    combined_rho: HashOutput,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Round3Bcast<S: SchemeParams> {
    enc_reshares: Vec<Ciphertext<S::Paillier>>, // Enc_j(x_i^j)
    mod_proof: ModProof<S::Paillier>,
    prm_proof: PrmProof<S::Paillier>,
    sch_proofs: Vec<SchProof>,
}

impl<S: SchemeParams> Round3<S> {
    fn aux(&self) -> ProofAux {
        ProofAux::new(self.context.session_hash, self.context.id())
            .with_context(self.combined_rho)
    }

    fn paillier_pk_of(&self, idx: usize) -> &PublicKeyPaillier<S::Paillier> {
        if idx == self.context.my_idx() {
            &self.context.data.paillier_pk
        } else {
            &self.datas.get(idx).expect("peer index is valid").paillier_pk
        }
    }
}

impl<S: SchemeParams> Round for Round3<S> {
    type Message = Round3Bcast<S>;
    type Payload = Scalar;
    type NextRound = NonExistent<Self::Result>;
    type Result = KeyShare<S>;

    const ROUND_NUM: u8 = 3;
    const NEXT_ROUND_NUM: Option<u8> = None;

    fn to_send(&self, rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message> {
        let aux = self.aux();
        let num_parties = self.context.seed.ids.len();

        let mod_proof = ModProof::random(
            rng,
            &self.context.paillier_sk,
            S::M_PROOF_ITERATIONS,
            &aux,
        );
        let prm_proof = PrmProof::random(
            rng,
            &self.context.rp_secret,
            &self.context.data.rp_params,
            S::M_PROOF_ITERATIONS,
            &aux,
        );

        let sch_proofs = (0..num_parties)
            .map(|idx| {
                SchProof::new(
                    &self.context.sch_secrets[idx],
                    &self.context.reshare_secrets[idx],
                    &self.context.data.sch_commitments[idx],
                    &self.context.data.reshare_publics[idx],
                    &aux,
                )
            })
            .collect();

        // Every reshare is encrypted to its recipient's fresh key,
        // own reshare included.
        let enc_reshares = (0..num_parties)
            .map(|idx| {
                let pk = self.paillier_pk_of(idx);
                Ciphertext::new_with_randomizer(
                    pk,
                    &self.context.reshare_secrets[idx].to_uint(),
                    &pk.random_randomizer(rng),
                )
            })
            .collect();

        ToSendTyped::Broadcast(Round3Bcast {
            enc_reshares,
            mod_proof,
            prm_proof,
            sch_proofs,
        })
    }

    fn verify_received(
        &self,
        from: PartyIdx,
        msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError> {
        let num_parties = self.context.seed.ids.len();
        let my_idx = self.context.my_idx();
        let data_from = self.datas.get(from.as_usize()).expect("peer index is valid");

        if msg.enc_reshares.len() != num_parties || msg.sch_proofs.len() != num_parties {
            return Err(ReceiveError::Malformed(
                "wrong number of reshare entries".into(),
            ));
        }

        // Decrypt the reshare addressed to us and check it against
        // the public reshare committed in round 2.
        let reshare = Scalar::from_uint(
            &self.context.paillier_sk.decrypt(&msg.enc_reshares[my_idx]),
        );
        if reshare.mul_by_generator() != data_from.reshare_publics[my_idx] {
            return Err(ReceiveError::VerificationFail(
                "reshare consistency".into(),
            ));
        }

        let aux = self
            .aux()
            .for_prover(self.context.seed.ids[from.as_usize()]);

        if !msg
            .mod_proof
            .verify(&data_from.paillier_pk, S::M_PROOF_ITERATIONS, &aux)
        {
            return Err(ReceiveError::VerificationFail(
                "paillier-blum modulus proof (psi_mod)".into(),
            ));
        }

        if !msg
            .prm_proof
            .verify(&data_from.rp_params, S::M_PROOF_ITERATIONS, &aux)
        {
            return Err(ReceiveError::VerificationFail(
                "ring-pedersen parameters proof (psi_rped)".into(),
            ));
        }

        for idx in 0..num_parties {
            if !msg.sch_proofs[idx].verify(
                &data_from.sch_commitments[idx],
                &data_from.reshare_publics[idx],
                &aux,
            ) {
                return Err(ReceiveError::VerificationFail(
                    "schnorr proof (psi_sch)".into(),
                ));
            }
        }

        Ok(reshare)
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        let num_parties = self.context.seed.ids.len();
        let my_idx = self.context.my_idx();

        // x_i += Σ_j x_j^i (including our own reshare to ourselves)
        let secret_share = self.context.seed.secret_share
            + self.context.reshare_secrets[my_idx]
            + payloads.iter().cloned().sum::<Scalar>();

        // X_p += Σ_j X_j^p for every party p
        let public_shares: Vec<Point> = (0..num_parties)
            .map(|p| {
                let from_peers: Point = self
                    .datas
                    .iter()
                    .map(|data| data.reshare_publics[p])
                    .sum();
                self.context.seed.public_shares[p]
                    + from_peers
                    + self.context.data.reshare_publics[p]
            })
            .collect();

        if secret_share.mul_by_generator() != public_shares[my_idx] {
            return Err(FinalizeError::Internal(
                "secret and public share diverged after refresh".into(),
            ));
        }

        let public_aux = (0..num_parties)
            .map(|idx| {
                let data = if idx == my_idx {
                    &self.context.data
                } else {
                    self.datas.get(idx).expect("peer index is valid")
                };
                PublicAuxData {
                    paillier_pk: data.paillier_pk.clone(),
                    rp_params: data.rp_params.clone(),
                }
            })
            .collect();

        Ok(FinalizeSuccess::Result(KeyShare {
            index: self.context.seed.party_index(),
            ids: self.context.seed.ids.clone(),
            srid: self.context.seed.srid,
            secret_share,
            public_shares,
            secret_aux: SecretAuxData {
                paillier_sk: self.context.paillier_sk.clone(),
            },
            public_aux,
        }))
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::Round1;
    use crate::curve::{Point, Scalar};
    use crate::protocols::common::{PartyId, PartyIdx, SessionInfo, TestParams};
    use crate::protocols::generic::FirstRound;
    use crate::protocols::test_utils::{assert_next_round, assert_result, step};

    #[test]
    fn execute_refresh() {
        let session = SessionInfo::new(b"refresh test session", vec![
            PartyId(101),
            PartyId(102),
            PartyId(103),
        ]);

        // Start from centrally generated seeds standing in for a key-gen run.
        let shares =
            crate::protocols::common::KeyShare::<TestParams>::new_centralized(&mut OsRng, session.ids());
        let seeds: Vec<_> = shares.iter().map(|share| share.to_seed()).collect();

        let secret_before: Scalar = seeds.iter().map(|seed| seed.secret_share).sum();
        let aggregate_before: Point = seeds[0].verifying_key();
        let old_secrets: Vec<Scalar> = seeds.iter().map(|seed| seed.secret_share).collect();

        let session_hash = seeds[0].session_hash(&session);
        let r1 = seeds
            .into_iter()
            .enumerate()
            .map(|(idx, seed)| {
                Round1::<TestParams>::new(
                    &mut OsRng,
                    &session_hash,
                    3,
                    PartyIdx::from_usize(idx),
                    seed,
                )
                .unwrap()
            })
            .collect();

        let r2 = assert_next_round(step(&mut OsRng, r1).unwrap()).unwrap();
        let r3 = assert_next_round(step(&mut OsRng, r2).unwrap()).unwrap();
        let new_shares = assert_result(step(&mut OsRng, r3).unwrap()).unwrap();

        // The aggregate is preserved while every share rotated.
        let secret_after: Scalar = new_shares.iter().map(|share| share.secret_share).sum();
        assert_eq!(secret_before, secret_after);
        assert_eq!(new_shares[0].verifying_key(), aggregate_before);
        for (share, old) in new_shares.iter().zip(old_secrets) {
            assert_ne!(share.secret_share, old);
            assert_eq!(
                share.secret_share.mul_by_generator(),
                share.public_shares()[share.party_index().as_usize()]
            );
        }

        // All parties agree on the refreshed session hash.
        for share in &new_shares[1..] {
            assert_eq!(
                share.session_hash(&session),
                new_shares[0].session_hash(&session)
            );
        }
    }
}
