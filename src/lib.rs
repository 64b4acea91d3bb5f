//! Multi-party threshold ECDSA signing in the CMP/CGGMP '20 family.
//!
//! `n` parties jointly hold an ECDSA key such that no party ever learns
//! it, yet the full set can produce standard ECDSA signatures verifiable
//! against the single aggregate public key. Three interactive phases
//! ([key generation](sessions::make_keygen_session),
//! [refresh with auxiliary information](sessions::make_refresh_session),
//! [pre-signing](sessions::make_presigning_session)) are driven as
//! round-based sessions over a caller-supplied authenticated transport;
//! [signature shares](sign) are then computed locally and
//! [combined](combine_shares) without further interaction.

mod curve;
mod paillier;
mod protocols;
pub mod sessions;
mod sigma;
mod tools;
mod uint;

pub use curve::{Point, Scalar, Signature};
pub use paillier::{PaillierParams, PaillierProduction, PaillierTest};
pub use protocols::common::{
    KeyShare, KeyShareSeed, PartyId, PartyIdx, PresigningData, ProductionParams, SchemeParams,
    SessionInfo, TestParams,
};
pub use protocols::signing::{combine_shares, sign, SignatureShare};
pub use tools::hashing::KAPPA_RANDOM_ORACLE_BYTES;

pub use k256;
