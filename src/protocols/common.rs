//! Types shared between the protocol phases: party identifiers, scheme
//! parameters, the session hash, and the key share in its two stages of
//! completeness (after key generation, and after refresh).

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::curve::{Point, Scalar, ORDER_BE_BYTES};
use crate::paillier::{
    PaillierParams, PaillierProduction, PaillierTest, PublicKeyPaillier, RPParams,
    SecretKeyPaillier,
};
use crate::tools::hashing::{random_chunk, Chain, Hash, HashOutput, Hashable};

/// The ordinal of a party in the signing set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyIdx(u32);

impl PartyIdx {
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub fn from_usize(index: usize) -> Self {
        Self(index as u32)
    }
}

impl Hashable for PartyIdx {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain(&self.0)
    }
}

/// An arbitrary 64-bit label a party is known by to its peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyId(pub u64);

impl Hashable for PartyId {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain(&self.0)
    }
}

impl core::fmt::Display for PartyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Protocol-wide constants that must match across all parties.
pub trait SchemeParams:
    Clone + Copy + core::fmt::Debug + PartialEq + Eq + Send + Sync + 'static
{
    /// ℓ: the byte bound on plaintexts proven by ψ_enc and ψ_log
    /// (the 𝓘 range; curve scalars fit it).
    const I_RANGE_BYTES: usize;
    /// ℓ': the byte bound on MtA offsets β (the 𝓙 range).
    const J_RANGE_BYTES: usize;
    /// ε: the slack on range-proof responses.
    const EPS_BYTES: usize;
    /// Iteration count of the bit-challenge proofs (ψ_mod, ψ_rped).
    const M_PROOF_ITERATIONS: usize;
    type Paillier: PaillierParams;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductionParams;

impl SchemeParams for ProductionParams {
    const I_RANGE_BYTES: usize = 32;
    const J_RANGE_BYTES: usize = 64;
    const EPS_BYTES: usize = 64;
    const M_PROOF_ITERATIONS: usize = 80;
    type Paillier = PaillierProduction;
}

/// Small moduli and few proof iterations; only suitable for tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestParams;

impl SchemeParams for TestParams {
    const I_RANGE_BYTES: usize = 32;
    const J_RANGE_BYTES: usize = 32;
    const EPS_BYTES: usize = 40;
    const M_PROOF_ITERATIONS: usize = 13;
    type Paillier = PaillierTest;
}

/// The out-of-band agreed session identifier and the roster of parties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    sid: Box<[u8]>,
    ids: Vec<PartyId>,
}

impl SessionInfo {
    pub fn new(sid: &[u8], ids: Vec<PartyId>) -> Self {
        Self {
            sid: sid.into(),
            ids,
        }
    }

    pub fn ids(&self) -> &[PartyId] {
        &self.ids
    }

    pub fn num_parties(&self) -> usize {
        self.ids.len()
    }

    /// The session hash binding the sid, the shared randomness, the curve,
    /// and everything the group has established so far about each party.
    /// Components not yet established are skipped; the hash must be
    /// recomputed after key generation and after each refresh.
    pub(crate) fn session_hash<P: PaillierParams>(
        &self,
        srid: &HashOutput,
        public_shares: Option<&[Point]>,
        public_aux: Option<&[PublicAuxData<P>]>,
    ) -> HashOutput {
        let mut digest = Hash::new_with_dst(b"SessionHash")
            .chain_bytes(&self.sid)
            .chain(srid)
            .chain(&Point::GENERATOR)
            .chain_constant_sized_bytes(&ORDER_BE_BYTES);
        for (idx, id) in self.ids.iter().enumerate() {
            digest = digest.chain(id);
            if let Some(shares) = public_shares {
                digest = digest.chain(&shares[idx]);
            }
            if let Some(aux) = public_aux {
                digest = digest
                    .chain(&aux[idx].paillier_pk)
                    .chain(&aux[idx].rp_params);
            }
        }
        digest.finalize()
    }

    /// The pre-keygen session hash: no shared randomness or public keys yet.
    pub fn initial_hash(&self) -> HashOutput {
        self.session_hash::<PaillierProduction>(&ZERO_CHUNK, None, None)
    }
}

pub(crate) const ZERO_CHUNK: HashOutput =
    HashOutput([0u8; crate::tools::hashing::KAPPA_RANDOM_ORACLE_BYTES]);

/// The output of key generation: an additive share of the joint key,
/// before any auxiliary information exists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyShareSeed {
    pub(crate) index: PartyIdx,
    pub(crate) ids: Vec<PartyId>,
    /// The shared random identifier, the XOR of all parties' contributions.
    pub(crate) srid: HashOutput,
    pub(crate) secret_share: Scalar,
    pub(crate) public_shares: Vec<Point>,
}

impl KeyShareSeed {
    pub fn party_index(&self) -> PartyIdx {
        self.index
    }

    pub fn party_id(&self) -> PartyId {
        self.ids[self.index.as_usize()]
    }

    pub fn public_shares(&self) -> &[Point] {
        &self.public_shares
    }

    /// The aggregate public key `Σ X_i`.
    pub fn verifying_key(&self) -> Point {
        self.public_shares.iter().cloned().sum()
    }

    pub fn session_hash(&self, session: &SessionInfo) -> HashOutput {
        session.session_hash::<PaillierProduction>(&self.srid, Some(&self.public_shares), None)
    }
}

impl Drop for KeyShareSeed {
    fn drop(&mut self) {
        self.secret_share.zeroize();
    }
}

/// This party's secret auxiliary data, rotated on every refresh.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct SecretAuxData<P: PaillierParams> {
    pub(crate) paillier_sk: SecretKeyPaillier<P>,
}

/// A party's public auxiliary data, as seen by everyone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub(crate) struct PublicAuxData<P: PaillierParams> {
    pub(crate) paillier_pk: PublicKeyPaillier<P>,
    pub(crate) rp_params: RPParams<P>,
}

/// A full key share: the secret scalar share plus all auxiliary
/// information needed to participate in pre-signing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct KeyShare<S: SchemeParams> {
    pub(crate) index: PartyIdx,
    pub(crate) ids: Vec<PartyId>,
    pub(crate) srid: HashOutput,
    pub(crate) secret_share: Scalar,
    pub(crate) public_shares: Vec<Point>,
    pub(crate) secret_aux: SecretAuxData<S::Paillier>,
    pub(crate) public_aux: Vec<PublicAuxData<S::Paillier>>,
}

impl<S: SchemeParams> KeyShare<S> {
    pub fn num_parties(&self) -> usize {
        self.ids.len()
    }

    pub fn party_index(&self) -> PartyIdx {
        self.index
    }

    pub fn party_id(&self) -> PartyId {
        self.ids[self.index.as_usize()]
    }

    pub fn ids(&self) -> &[PartyId] {
        &self.ids
    }

    pub fn public_shares(&self) -> &[Point] {
        &self.public_shares
    }

    /// The aggregate public key `Σ X_i`.
    pub fn verifying_key(&self) -> Point {
        self.public_shares.iter().cloned().sum()
    }

    pub fn session_hash(&self, session: &SessionInfo) -> HashOutput {
        session.session_hash(&self.srid, Some(&self.public_shares), Some(&self.public_aux))
    }

    /// The core share data, as input to a subsequent refresh.
    pub(crate) fn to_seed(&self) -> KeyShareSeed {
        KeyShareSeed {
            index: self.index,
            ids: self.ids.clone(),
            srid: self.srid,
            secret_share: self.secret_share,
            public_shares: self.public_shares.clone(),
        }
    }

    /// Generates a consistent set of key shares in one place, bypassing
    /// the protocols. Testing only: a real deployment never materializes
    /// the full key.
    pub fn new_centralized(
        rng: &mut impl CryptoRngCore,
        ids: &[PartyId],
    ) -> Vec<KeyShare<S>> {
        let secrets: Vec<Scalar> = ids.iter().map(|_| Scalar::random(rng)).collect();
        let public_shares: Vec<Point> =
            secrets.iter().map(|secret| secret.mul_by_generator()).collect();
        let srid = random_chunk(rng);

        let secret_aux: Vec<SecretAuxData<S::Paillier>> = ids
            .iter()
            .map(|_| SecretAuxData {
                paillier_sk: SecretKeyPaillier::random(rng),
            })
            .collect();
        let public_aux: Vec<PublicAuxData<S::Paillier>> = secret_aux
            .iter()
            .map(|aux| PublicAuxData {
                paillier_pk: aux.paillier_sk.public_key().clone(),
                rp_params: RPParams::random(rng).1,
            })
            .collect();

        secrets
            .iter()
            .zip(secret_aux)
            .enumerate()
            .map(|(idx, (secret, aux))| KeyShare {
                index: PartyIdx::from_usize(idx),
                ids: ids.to_vec(),
                srid,
                secret_share: *secret,
                public_shares: public_shares.clone(),
                secret_aux: aux,
                public_aux: public_aux.clone(),
            })
            .collect()
    }
}

impl<S: SchemeParams> Drop for KeyShare<S> {
    fn drop(&mut self) {
        self.secret_share.zeroize();
    }
}

/// The one-shot output of pre-signing. Must be consumed by exactly one
/// signature; the secrets are erased on drop.
#[derive(Clone, Debug)]
pub struct PresigningData {
    /// The nonce point `R`.
    pub(crate) nonce_point: Point,
    /// `k_i`, this party's additive share of the (inverted) nonce.
    pub(crate) nonce_share: Scalar,
    /// `χ_i`, this party's additive share of `k x`.
    pub(crate) product_share: Scalar,
}

impl PresigningData {
    pub fn nonce_point(&self) -> Point {
        self.nonce_point
    }
}

impl Drop for PresigningData {
    fn drop(&mut self) {
        self.nonce_share.zeroize();
        self.product_share.zeroize();
    }
}

/// Converts a curve scalar into the Paillier plaintext space.
pub(crate) fn uint_from_scalar<P: PaillierParams>(scalar: &Scalar) -> P::Uint {
    scalar.to_uint()
}
