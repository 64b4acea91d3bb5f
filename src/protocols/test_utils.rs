//! A lockstep driver executing one round across all parties, for tests.

use rand_core::CryptoRngCore;

use super::common::PartyIdx;
use super::generic::{FinalizeSuccess, Round, ToSendTyped};
use crate::tools::collections::HoleVecAccum;

/// Sends every party's round messages to their destinations, verifies
/// them on receipt, and finalizes every party.
pub(crate) fn step<R: Round>(
    rng: &mut impl CryptoRngCore,
    rounds: Vec<R>,
) -> Result<Vec<FinalizeSuccess<R>>, String> {
    let num_parties = rounds.len();
    let mut accums: Vec<HoleVecAccum<R::Payload>> = (0..num_parties)
        .map(|idx| HoleVecAccum::new(num_parties, idx))
        .collect();

    for (from, round) in rounds.iter().enumerate() {
        match round.to_send(rng) {
            ToSendTyped::Broadcast(message) => {
                for to in (0..num_parties).filter(|to| *to != from) {
                    let payload = rounds[to]
                        .verify_received(PartyIdx::from_usize(from), message.clone())
                        .map_err(|err| format!("{from} -> {to}: {err:?}"))?;
                    accums[to]
                        .insert(from, payload)
                        .ok_or_else(|| format!("duplicate message {from} -> {to}"))?;
                }
            }
            ToSendTyped::Direct(messages) => {
                for (to, message) in messages {
                    let to = to.as_usize();
                    let payload = rounds[to]
                        .verify_received(PartyIdx::from_usize(from), message)
                        .map_err(|err| format!("{from} -> {to}: {err:?}"))?;
                    accums[to]
                        .insert(from, payload)
                        .ok_or_else(|| format!("duplicate message {from} -> {to}"))?;
                }
            }
        }
    }

    rounds
        .into_iter()
        .zip(accums)
        .map(|(round, accum)| {
            let payloads = accum
                .finalize()
                .ok_or_else(|| "missing messages at the round barrier".to_string())?;
            round
                .finalize(rng, payloads)
                .map_err(|err| format!("finalize: {err:?}"))
        })
        .collect()
}

pub(crate) fn assert_next_round<R: Round>(
    outcomes: Vec<FinalizeSuccess<R>>,
) -> Result<Vec<R::NextRound>, String> {
    outcomes
        .into_iter()
        .map(|outcome| match outcome {
            FinalizeSuccess::AnotherRound(round) => Ok(round),
            FinalizeSuccess::Result(_) => {
                Err("expected another round, got a result".to_string())
            }
        })
        .collect()
}

pub(crate) fn assert_result<R: Round>(
    outcomes: Vec<FinalizeSuccess<R>>,
) -> Result<Vec<R::Result>, String> {
    outcomes
        .into_iter()
        .map(|outcome| match outcome {
            FinalizeSuccess::Result(result) => Ok(result),
            FinalizeSuccess::AnotherRound(_) => {
                Err("expected a result, got another round".to_string())
            }
        })
        .collect()
}
