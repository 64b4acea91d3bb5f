//! Session constructors for the three protocol phases.
//!
//! Each constructor computes the session hash binding everything the
//! group has established so far, so the Fiat-Shamir transcripts of a
//! phase cannot be replayed into another.

use rand_core::CryptoRngCore;

use super::error::Error;
use super::generic::Session;
use crate::protocols::common::{
    KeyShare, KeyShareSeed, PartyIdx, PresigningData, SchemeParams, SessionInfo,
};
use crate::protocols::{key_refresh, keygen, presigning};

/// A session producing this party's [`KeyShareSeed`].
pub fn make_keygen_session(
    rng: &mut impl CryptoRngCore,
    session: &SessionInfo,
    party_idx: PartyIdx,
) -> Result<Session<KeyShareSeed>, Error> {
    let session_hash = session.initial_hash();
    Session::new::<keygen::Round1>(
        rng,
        &session_hash,
        session.ids().to_vec(),
        party_idx,
        session.ids().to_vec(),
    )
}

/// A refresh session following key generation: rotates the share and
/// produces the first full [`KeyShare`].
pub fn make_refresh_session<S: SchemeParams>(
    rng: &mut impl CryptoRngCore,
    session: &SessionInfo,
    seed: KeyShareSeed,
) -> Result<Session<KeyShare<S>>, Error> {
    let session_hash = seed.session_hash(session);
    let party_idx = seed.party_index();
    Session::new::<key_refresh::Round1<S>>(
        rng,
        &session_hash,
        session.ids().to_vec(),
        party_idx,
        seed,
    )
}

/// A refresh session following an earlier refresh: the session hash
/// additionally binds the auxiliary data being replaced.
pub fn make_refresh_session_from_share<S: SchemeParams>(
    rng: &mut impl CryptoRngCore,
    session: &SessionInfo,
    key_share: &KeyShare<S>,
) -> Result<Session<KeyShare<S>>, Error> {
    let session_hash = key_share.session_hash(session);
    let party_idx = key_share.party_index();
    Session::new::<key_refresh::Round1<S>>(
        rng,
        &session_hash,
        session.ids().to_vec(),
        party_idx,
        key_share.to_seed(),
    )
}

/// A pre-signing session producing the one-shot [`PresigningData`].
pub fn make_presigning_session<S: SchemeParams>(
    rng: &mut impl CryptoRngCore,
    session: &SessionInfo,
    key_share: &KeyShare<S>,
) -> Result<Session<PresigningData>, Error> {
    let session_hash = key_share.session_hash(session);
    let party_idx = key_share.party_index();
    Session::new::<presigning::Round1Part1<S>>(
        rng,
        &session_hash,
        session.ids().to_vec(),
        party_idx,
        key_share.clone(),
    )
}
