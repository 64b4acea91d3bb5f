use std::time::Instant;

use rand_core::CryptoRngCore;
use serde::{de::DeserializeOwned, Serialize};

use super::error::Error;
use crate::protocols::common::{PartyId, PartyIdx};
use crate::protocols::generic::{
    FinalizeError, FinalizeSuccess, FirstRound, InitError, ReceiveError, Round, ToSendTyped,
};
use crate::tools::collections::HoleVecAccum;
use crate::tools::hashing::HashOutput;

/// Serialized round messages, tagged with the round number.
pub enum ToSend {
    /// One message for every peer.
    Broadcast(Box<[u8]>),
    /// An individual message per peer.
    Direct(Vec<(PartyIdx, Box<[u8]>)>),
}

fn serialize_message(message: &impl Serialize) -> Result<Vec<u8>, Error> {
    bincode::serde::encode_to_vec(message, bincode::config::standard()).map_err(|err| {
        Error::Internal {
            cause: format!("message serialization failed: {err}"),
        }
    })
}

fn deserialize_message<M: DeserializeOwned>(message_bytes: &[u8]) -> Result<M, String> {
    bincode::serde::decode_from_slice(message_bytes, bincode::config::standard())
        .map(|(message, _len)| message)
        .map_err(|err| err.to_string())
}

/// The round number is a one-byte frame prefix.
fn frame_with_round(round: u8, message: Vec<u8>) -> Box<[u8]> {
    let mut framed = Vec::with_capacity(message.len() + 1);
    framed.push(round);
    framed.extend_from_slice(&message);
    framed.into_boxed_slice()
}

fn unframe_round(message_bytes: &[u8]) -> Result<(u8, &[u8]), Error> {
    message_bytes
        .split_first()
        .map(|(round, rest)| (*round, rest))
        .ok_or_else(|| Error::ProtocolViolation {
            reason: "empty message".into(),
        })
}

enum StageResult<Res> {
    AnotherRound(Box<dyn DynStage<Res>>),
    Result(Res),
}

/// An object-safe wrapper over one [`Round`] and its message accumulator.
trait DynStage<Res>: Send {
    fn round_num(&self) -> u8;
    fn get_messages(&mut self, rng: &mut dyn CryptoRngCore) -> Result<ToSend, Error>;
    fn receive(
        &mut self,
        from: PartyIdx,
        from_id: PartyId,
        message_bytes: &[u8],
    ) -> Result<(), Error>;
    fn is_finished_receiving(&self) -> Result<bool, Error>;
    fn finalize(self: Box<Self>, rng: &mut dyn CryptoRngCore) -> Result<StageResult<Res>, Error>;
}

struct GenericStage<R: Round> {
    round: R,
    accum: Option<HoleVecAccum<R::Payload>>,
    num_parties: usize,
    party_idx: PartyIdx,
}

impl<R: Round> GenericStage<R> {
    fn new(round: R, num_parties: usize, party_idx: PartyIdx) -> Self {
        Self {
            round,
            accum: None,
            num_parties,
            party_idx,
        }
    }
}

impl<R: Round> DynStage<R::Result> for GenericStage<R> {
    fn round_num(&self) -> u8 {
        R::ROUND_NUM
    }

    fn get_messages(&mut self, mut rng: &mut dyn CryptoRngCore) -> Result<ToSend, Error> {
        if self.accum.is_some() {
            return Err(Error::Internal {
                cause: "the session is not in a sending state".into(),
            });
        }

        let timer = Instant::now();
        let (to_send, total_bytes) = match self.round.to_send(&mut rng) {
            ToSendTyped::Broadcast(message) => {
                let message = frame_with_round(R::ROUND_NUM, serialize_message(&message)?);
                let bytes = message.len() * (self.num_parties - 1);
                (ToSend::Broadcast(message), bytes)
            }
            ToSendTyped::Direct(messages) => {
                let mut serialized = Vec::with_capacity(messages.len());
                let mut bytes = 0;
                for (idx, message) in messages.into_iter() {
                    let message = frame_with_round(R::ROUND_NUM, serialize_message(&message)?);
                    bytes += message.len();
                    serialized.push((idx, message));
                }
                (ToSend::Direct(serialized), bytes)
            }
        };
        tracing::debug!(
            round = R::ROUND_NUM,
            outgoing_bytes = total_bytes,
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "round messages emitted"
        );

        self.accum = Some(HoleVecAccum::new(
            self.num_parties,
            self.party_idx.as_usize(),
        ));
        Ok(to_send)
    }

    fn receive(
        &mut self,
        from: PartyIdx,
        from_id: PartyId,
        message_bytes: &[u8],
    ) -> Result<(), Error> {
        let accum = self.accum.as_mut().ok_or_else(|| Error::Internal {
            cause: "the session is in a sending state, cannot receive".into(),
        })?;

        let message: R::Message =
            deserialize_message(message_bytes).map_err(|err| Error::ProtocolViolation {
                reason: format!("undecodable message from party {from_id}: {err}"),
            })?;

        let slot = accum
            .get_mut(from.as_usize())
            .ok_or_else(|| Error::ProtocolViolation {
                reason: format!("message from an unexpected party index {}", from.as_usize()),
            })?;
        if slot.is_some() {
            return Err(Error::ProtocolViolation {
                reason: format!(
                    "duplicate round {} message from party {from_id}",
                    R::ROUND_NUM
                ),
            });
        }

        let payload = self
            .round
            .verify_received(from, message)
            .map_err(|err| match err {
                ReceiveError::VerificationFail(check) => {
                    tracing::warn!(party = %from_id, check, "verification failure");
                    Error::VerificationFailed {
                        check,
                        party: from_id,
                    }
                }
                ReceiveError::Malformed(reason) => Error::ProtocolViolation {
                    reason: format!("malformed message from party {from_id}: {reason}"),
                },
            })?;

        *slot = Some(payload);
        Ok(())
    }

    fn is_finished_receiving(&self) -> Result<bool, Error> {
        Ok(self
            .accum
            .as_ref()
            .ok_or_else(|| Error::Internal {
                cause: "not in a receiving state".into(),
            })?
            .can_finalize())
    }

    fn finalize(
        self: Box<Self>,
        mut rng: &mut dyn CryptoRngCore,
    ) -> Result<StageResult<R::Result>, Error> {
        let stage = *self;
        let accum = stage.accum.ok_or_else(|| Error::Internal {
            cause: "the session is in a sending state, cannot finalize".into(),
        })?;

        let missing = accum.missing();
        let payloads = accum.finalize().ok_or_else(|| Error::ProtocolViolation {
            reason: format!(
                "missing round {} messages from parties {missing:?}",
                R::ROUND_NUM
            ),
        })?;

        match stage.round.finalize(&mut rng, payloads) {
            Ok(FinalizeSuccess::Result(result)) => Ok(StageResult::Result(result)),
            Ok(FinalizeSuccess::AnotherRound(next)) => Ok(StageResult::AnotherRound(Box::new(
                GenericStage::new(next, stage.num_parties, stage.party_idx),
            ))),
            Err(FinalizeError::VerificationFail(check)) => {
                tracing::warn!(check, "verification failure at the round barrier");
                Err(Error::ProtocolViolation {
                    reason: format!("cross-party check `{check}` failed"),
                })
            }
            Err(FinalizeError::Internal(cause)) => Err(Error::Internal { cause }),
        }
    }
}

/// A party's view of one protocol execution, from the first round to the
/// result. Messages arriving one round ahead are cached and replayed
/// after the stage advances.
pub struct Session<Res> {
    party_idx: PartyIdx,
    ids: Vec<PartyId>,
    stage: Option<Box<dyn DynStage<Res>>>,
    result: Option<Res>,
    cached: Vec<(PartyIdx, Box<[u8]>)>,
}

impl<Res: Send + 'static> Session<Res> {
    pub(crate) fn new<R>(
        rng: &mut impl CryptoRngCore,
        session_hash: &HashOutput,
        ids: Vec<PartyId>,
        party_idx: PartyIdx,
        context: R::Context,
    ) -> Result<Self, Error>
    where
        R: FirstRound + Round<Result = Res>,
    {
        let num_parties = ids.len();
        let round = R::new(rng, session_hash, num_parties, party_idx, context)
            .map_err(|InitError::Internal(cause)| Error::Internal { cause })?;
        Ok(Self {
            party_idx,
            ids,
            stage: Some(Box::new(GenericStage::new(round, num_parties, party_idx))),
            result: None,
            cached: Vec::new(),
        })
    }

    fn stage(&self) -> Result<&dyn DynStage<Res>, Error> {
        self.stage.as_deref().ok_or_else(|| Error::Internal {
            cause: "the session has already produced its result".into(),
        })
    }

    fn stage_mut(&mut self) -> Result<&mut Box<dyn DynStage<Res>>, Error> {
        self.stage.as_mut().ok_or_else(|| Error::Internal {
            cause: "the session has already produced its result".into(),
        })
    }

    pub fn party_index(&self) -> PartyIdx {
        self.party_idx
    }

    pub fn current_round_num(&self) -> Result<u8, Error> {
        Ok(self.stage()?.round_num())
    }

    /// Produces this round's outgoing messages and switches the session
    /// into its receiving state.
    pub fn get_messages(&mut self, rng: &mut impl CryptoRngCore) -> Result<ToSend, Error> {
        self.stage_mut()?.get_messages(rng)
    }

    pub fn receive(&mut self, from: PartyIdx, message_bytes: &[u8]) -> Result<(), Error> {
        let (round, payload) = unframe_round(message_bytes)?;
        let current = self.stage()?.round_num();
        let from_id = *self
            .ids
            .get(from.as_usize())
            .ok_or_else(|| Error::ProtocolViolation {
                reason: format!("message from an unknown party index {}", from.as_usize()),
            })?;

        if round == current {
            self.stage_mut()?.receive(from, from_id, payload)
        } else if round == current + 1 {
            // A peer has already advanced past the barrier; keep its
            // message for our next round.
            self.cached.push((from, message_bytes.into()));
            Ok(())
        } else {
            Err(Error::ProtocolViolation {
                reason: format!(
                    "out-of-order message from party {from_id}: round {round} while in round {current}"
                ),
            })
        }
    }

    pub fn has_cached_messages(&self) -> bool {
        !self.cached.is_empty()
    }

    pub fn receive_cached_message(&mut self) -> Result<(), Error> {
        let (from, message_bytes) = self.cached.pop().ok_or_else(|| Error::Internal {
            cause: "no more cached messages left".into(),
        })?;
        self.receive(from, &message_bytes)
    }

    pub fn is_finished_receiving(&self) -> Result<bool, Error> {
        self.stage()?.is_finished_receiving()
    }

    /// Closes the round barrier: verifies cross-party checks and advances
    /// to the next round, or stores the protocol result.
    pub fn finalize_stage(&mut self, rng: &mut impl CryptoRngCore) -> Result<(), Error> {
        let stage = self.stage.take().ok_or_else(|| Error::Internal {
            cause: "the session has already produced its result".into(),
        })?;
        match stage.finalize(rng)? {
            StageResult::AnotherRound(next) => self.stage = Some(next),
            StageResult::Result(result) => self.result = Some(result),
        }
        Ok(())
    }

    /// Whether the protocol has run to completion.
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(self) -> Result<Res, Error> {
        self.result.ok_or_else(|| Error::Internal {
            cause: "the session has not produced a result yet".into(),
        })
    }
}
