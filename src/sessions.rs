//! Drives a protocol state machine over serialized messages.
//!
//! The transport is the caller's: this layer only decides what to send,
//! verifies and accumulates what was received, and reports which party a
//! failed check is attributable to. Production deployments must supply an
//! authenticated, confidential point-to-point channel; the protocol
//! assumes authentic delivery.

pub(crate) mod error;
pub(crate) mod generic;
pub(crate) mod states;

pub use error::Error;
pub use generic::{Session, ToSend};
pub use states::{
    make_keygen_session, make_presigning_session, make_refresh_session,
    make_refresh_session_from_share,
};
