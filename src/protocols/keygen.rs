//! Distributed ECDSA key generation.
//!
//! Four rounds per party: commit to the share data with a hash `V_i`,
//! reveal it together with an echo hash over everyone's commitments,
//! prove knowledge of the secret share with a Schnorr proof bound to the
//! combined shared randomness, and finally verify all proofs and store
//! the share. The final round sends nothing.

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::common::{KeyShareSeed, PartyId, PartyIdx};
use super::generic::{
    FinalizeError, FinalizeSuccess, FirstRound, InitError, NonExistent, ReceiveError, Round,
    ToSendTyped,
};
use crate::curve::{Point, Scalar};
use crate::sigma::sch::{SchCommitment, SchProof, SchSecret};
use crate::sigma::ProofAux;
use crate::tools::collections::HoleVec;
use crate::tools::hashing::{random_chunk, Chain, Hash, HashOutput, Hashable};

/// The values committed to in round 1 and revealed in round 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullData {
    srid_part: HashOutput,     // srid_i
    public: Point,             // X_i
    commitment: SchCommitment, // A_i
    u: HashOutput,             // u_i
}

impl Hashable for FullData {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest
            .chain(&self.srid_part)
            .chain(&self.public)
            .chain(&self.commitment)
            .chain(&self.u)
    }
}

impl FullData {
    /// `V_i = H(sid_hash ‖ id_i ‖ srid_i ‖ X_i ‖ A_i ‖ u_i)`
    fn hash(&self, session_hash: &HashOutput, id: PartyId) -> HashOutput {
        Hash::new_with_dst(b"KeygenCommitment")
            .chain(session_hash)
            .chain(&id)
            .chain(self)
            .finalize()
    }
}

struct Context {
    ids: Vec<PartyId>,
    party_idx: PartyIdx,
    session_hash: HashOutput,
    key_share: Scalar,
    sch_secret: SchSecret,
    data: FullData,
}

impl Context {
    fn id(&self) -> PartyId {
        self.ids[self.party_idx.as_usize()]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round1Bcast {
    hash: HashOutput,
}

pub(crate) struct Round1 {
    context: Context,
}

impl FirstRound for Round1 {
    type Context = Vec<PartyId>;

    fn new(
        rng: &mut impl CryptoRngCore,
        session_hash: &HashOutput,
        num_parties: usize,
        party_idx: PartyIdx,
        ids: Self::Context,
    ) -> Result<Self, InitError> {
        if ids.len() != num_parties || party_idx.as_usize() >= num_parties {
            return Err(InitError::Internal("inconsistent party roster".into()));
        }

        let secret = Scalar::random(rng);
        let public = secret.mul_by_generator();

        let proof_secret = SchSecret::random(rng);
        let commitment = SchCommitment::new(&proof_secret);

        let data = FullData {
            srid_part: random_chunk(rng),
            public,
            commitment,
            u: random_chunk(rng),
        };

        Ok(Self {
            context: Context {
                ids,
                party_idx,
                session_hash: *session_hash,
                key_share: secret,
                sch_secret: proof_secret,
                data,
            },
        })
    }
}

impl Round for Round1 {
    type Message = Round1Bcast;
    type Payload = HashOutput;
    type NextRound = Round2;
    type Result = KeyShareSeed;

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
        // The echo hash covers everyone's V in roster order, own included.
        let own_hash = self
            .context
            .data
            .hash(&self.context.session_hash, self.context.id());
        let all_hashes = payloads.clone().into_vec(own_hash);
        let echo = Hash::new_with_dst(b"KeygenEcho")
            .chain(&all_hashes)
            .finalize();

        Ok(FinalizeSuccess::AnotherRound(Round2 {
            hashes: payloads,
            echo,
            context: self.context,
        }))
    }
}

pub(crate) struct Round2 {
    context: Context,
    hashes: HoleVec<HashOutput>, // V_j
    echo: HashOutput,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Round2Bcast {
    data: FullData,
    echo: HashOutput,
}

impl Round for Round2 {
    type Message = Round2Bcast;
    type Payload = FullData;
    type NextRound = Round3;
    type Result = KeyShareSeed;

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
        let id_from = self.context.ids[from.as_usize()];

        if &msg.data.hash(&self.context.session_hash, id_from)
            != self.hashes.get(from.as_usize()).expect("peer index is valid")
        {
            return Err(ReceiveError::VerificationFail(
                "commitment decommitment".into(),
            ));
        }

        if msg.echo != self.echo {
            return Err(ReceiveError::VerificationFail("echo broadcast".into()));
        }

        Ok(msg.data)
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        let srid = payloads
            .iter()
            .fold(self.context.data.srid_part, |srid, data| {
                srid.xor(&data.srid_part)
            });

        Ok(FinalizeSuccess::AnotherRound(Round3 {
            datas: payloads,
            srid,
            context: self.context,
        }))
    }
}

pub(crate) struct Round3 {
    context: Context,
    datas: HoleVec<FullData>,
    srid: HashOutput,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Round3Bcast {
    proof: SchProof,
}

impl Round3 {
    fn aux(&self) -> ProofAux {
        ProofAux::new(self.context.session_hash, self.context.id()).with_context(self.srid)
    }
}

impl Round for Round3 {
    type Message = Round3Bcast;
    type Payload = bool;
    type NextRound = NonExistent<Self::Result>;
    type Result = KeyShareSeed;

    const ROUND_NUM: u8 = 3;
    const NEXT_ROUND_NUM: Option<u8> = None;

    fn to_send(&self, _rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message> {
        let proof = SchProof::new(
            &self.context.sch_secret,
            &self.context.key_share,
            &self.context.data.commitment,
            &self.context.data.public,
            &self.aux(),
        );
        ToSendTyped::Broadcast(Round3Bcast { proof })
    }

    fn verify_received(
        &self,
        from: PartyIdx,
        msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError> {
        let party_data = self.datas.get(from.as_usize()).expect("peer index is valid");

        // The proof is verified against the commitment A_j received in
        // round 2, so a substituted commitment cannot pass.
        let aux = self.aux().for_prover(self.context.ids[from.as_usize()]);
        if !msg
            .proof
            .verify(&party_data.commitment, &party_data.public, &aux)
        {
            return Err(ReceiveError::VerificationFail("schnorr proof (psi)".into()));
        }
        Ok(true)
    }

    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        _payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        let datas = self.datas.into_vec(self.context.data.clone());
        let public_shares = datas.into_iter().map(|data| data.public).collect();
        Ok(FinalizeSuccess::Result(KeyShareSeed {
            index: self.context.party_idx,
            ids: self.context.ids.clone(),
            srid: self.srid,
            secret_share: self.context.key_share,
            public_shares,
        }))
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::Round1;
    use crate::protocols::common::{PartyId, PartyIdx, SessionInfo};
    use crate::protocols::generic::FirstRound;
    use crate::protocols::test_utils::{assert_next_round, assert_result, step};

    #[test]
    fn execute_keygen() {
        let session = SessionInfo::new(b"keygen test session", vec![
            PartyId(101),
            PartyId(102),
            PartyId(103),
        ]);
        let session_hash = session.initial_hash();

        let r1 = (0..3)
            .map(|idx| {
                Round1::new(
                    &mut OsRng,
                    &session_hash,
                    3,
                    PartyIdx::from_usize(idx),
                    session.ids().to_vec(),
                )
                .unwrap()
            })
            .collect();

        let r2 = assert_next_round(step(&mut OsRng, r1).unwrap()).unwrap();
        let r3 = assert_next_round(step(&mut OsRng, r2).unwrap()).unwrap();
        let seeds = assert_result(step(&mut OsRng, r3).unwrap()).unwrap();

        // All parties agree on the public key set and the session hash.
        for seed in &seeds[1..] {
            assert_eq!(seed.public_shares(), seeds[0].public_shares());
            assert_eq!(seed.session_hash(&session), seeds[0].session_hash(&session));
        }

        // Each public share corresponds to the secret share.
        for seed in &seeds {
            assert_eq!(
                seed.secret_share.mul_by_generator(),
                seed.public_shares()[seed.party_index().as_usize()]
            );
        }
    }
}
