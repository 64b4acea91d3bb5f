//! The round state machine every protocol phase is built from.
//!
//! A round emits its messages once, accepts one message from every peer
//! (verifying on receipt), and finalizes into either the next round or
//! the protocol result. Waiting for the full set of peer messages is the
//! caller's responsibility (the session layer, or the lockstep test
//! driver); rounds themselves never block.

use core::marker::PhantomData;

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};

use super::common::PartyIdx;
use crate::tools::collections::HoleVec;
use crate::tools::hashing::HashOutput;

/// What a round sends: one broadcast, or one message per peer.
pub(crate) enum ToSendTyped<Message> {
    Broadcast(Message),
    Direct(Vec<(PartyIdx, Message)>),
}

/// A check failed on a message received from a peer.
#[derive(Clone, Debug)]
pub enum ReceiveError {
    /// A cryptographic check failed; the named check identifies it
    /// in diagnostics.
    VerificationFail(String),
    /// The message is structurally wrong (lengths, missing entries).
    Malformed(String),
}

/// A failure at the end of a round, after all messages were received.
#[derive(Clone, Debug)]
pub enum FinalizeError {
    /// A cross-party consistency check failed; no single peer
    /// is identified.
    VerificationFail(String),
    Internal(String),
}

/// A failure constructing the first round.
#[derive(Clone, Debug)]
pub enum InitError {
    Internal(String),
}

pub(crate) enum FinalizeSuccess<R: Round> {
    Result(R::Result),
    AnotherRound(R::NextRound),
}

pub(crate) trait Round: Sized + Send + 'static {
    type Message: Serialize + for<'de> Deserialize<'de> + Clone + Send;
    type Payload: Send;
    type NextRound: Round<Result = Self::Result>;
    type Result: Send;

    const ROUND_NUM: u8;
    const NEXT_ROUND_NUM: Option<u8>;

    fn to_send(&self, rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message>;
    fn verify_received(
        &self,
        from: PartyIdx,
        msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError>;
    fn finalize(
        self,
        rng: &mut impl CryptoRngCore,
        payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError>;
}

pub(crate) trait FirstRound: Round {
    type Context;
    fn new(
        rng: &mut impl CryptoRngCore,
        session_hash: &HashOutput,
        num_parties: usize,
        party_idx: PartyIdx,
        context: Self::Context,
    ) -> Result<Self, InitError>;
}

/// The terminal `NextRound` of a protocol's last round.
pub(crate) struct NonExistent<Res>(PhantomData<Res>);

impl<Res: Send + 'static> Round for NonExistent<Res> {
    type Message = ();
    type Payload = ();
    type NextRound = Self;
    type Result = Res;

    const ROUND_NUM: u8 = 0;
    const NEXT_ROUND_NUM: Option<u8> = None;

    fn to_send(&self, _rng: &mut impl CryptoRngCore) -> ToSendTyped<Self::Message> {
        unreachable!()
    }
    fn verify_received(
        &self,
        _from: PartyIdx,
        _msg: Self::Message,
    ) -> Result<Self::Payload, ReceiveError> {
        unreachable!()
    }
    fn finalize(
        self,
        _rng: &mut impl CryptoRngCore,
        _payloads: HoleVec<Self::Payload>,
    ) -> Result<FinalizeSuccess<Self>, FinalizeError> {
        unreachable!()
    }
}
