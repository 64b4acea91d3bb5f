//! The auxiliary transcript prefix every Fiat-Shamir challenge is bound to.

use crate::protocols::common::PartyId;
use crate::tools::hashing::{Chain, HashOutput, Hashable};

/// Binds a proof to the session, the prover, and optionally a phase-specific
/// randomness chunk (the combined srid in key generation, the combined ρ
/// in refresh).
///
/// Verifying a peer's proof requires the same binding with the peer's id
/// substituted; [`Self::for_prover`] produces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofAux {
    session_hash: HashOutput,
    prover: PartyId,
    context: Option<HashOutput>,
}

impl ProofAux {
    pub fn new(session_hash: HashOutput, prover: PartyId) -> Self {
        Self {
            session_hash,
            prover,
            context: None,
        }
    }

    pub fn with_context(self, context: HashOutput) -> Self {
        Self {
            context: Some(context),
            ..self
        }
    }

    /// The same binding, re-keyed to another prover.
    pub fn for_prover(&self, prover: PartyId) -> Self {
        Self {
            prover,
            ..self.clone()
        }
    }
}

impl Hashable for ProofAux {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest
            .chain(&self.session_hash)
            .chain(&self.prover)
            .chain(&self.context)
    }
}
