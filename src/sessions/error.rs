use displaydoc::Display;

use crate::protocols::common::PartyId;

/// Why a protocol session aborted. None of these are recoverable within
/// the session; the whole phase must be restarted.
#[derive(Debug, Clone, Display)]
pub enum Error {
    /// verification of `{check}` failed for party {party}
    VerificationFailed { check: String, party: PartyId },
    /// protocol violation: {reason}
    ProtocolViolation { reason: String },
    /// internal error: {cause}
    Internal { cause: String },
}

impl std::error::Error for Error {}
