//! The zero-knowledge proofs binding the protocol rounds together.
//!
//! All proofs are non-interactive via Fiat-Shamir: the challenge is a
//! SHA-512 hash of the auxiliary session binding ([`aux::ProofAux`]),
//! the public statement, and the prover's commitments. Verifiers always
//! recompute the challenge from the *received* statement; accepting a
//! proof under a different aux than the prover used is a protocol break.

pub(crate) mod aff_g;
pub(crate) mod aff_p;
pub(crate) mod aux;
pub(crate) mod blum_modulus;
pub(crate) mod enc;
pub(crate) mod log_star;
pub(crate) mod prm;
pub(crate) mod sch;

pub(crate) use aux::ProofAux;

use crate::curve::order_as_uint;
use crate::paillier::PaillierParams;
use crate::protocols::common::SchemeParams;
use crate::tools::hashing::{Chain, Hash, HashOutput};
use crate::uint::{HasWide, UintLike};

pub(crate) type PailUint<S> = <<S as SchemeParams>::Paillier as PaillierParams>::Uint;
pub(crate) type PailWide<S> = <<S as SchemeParams>::Paillier as PaillierParams>::WideUint;

/// The sampling bound `2^(8 bytes) * modulus` for Ring-Pedersen mask values.
pub(crate) fn mask_bound<S: SchemeParams>(
    rp_modulus: &PailUint<S>,
    bytes: usize,
) -> PailWide<S> {
    rp_modulus.into_wide().wrapping_shl((8 * bytes) as u32)
}

/// Reduces a transcript hash into a challenge below the curve order.
pub(crate) fn challenge_from_hash<T: UintLike>(output: &HashOutput) -> T {
    let wide = T::from_be_slice_padded(output.as_bytes());
    wide.rem(&order_as_uint::<T>())
}

/// Expands a transcript hash into a value below `modulus`,
/// chaining hash chunks until the target width is filled.
pub(crate) fn expand_from_hash<T: UintLike>(
    output: &HashOutput,
    index: u64,
    modulus: &T,
) -> T {
    let mut bytes = Vec::with_capacity(T::BYTES);
    let mut counter = 0u64;
    while bytes.len() < T::BYTES {
        let chunk = Hash::new_with_dst(b"UintExpansion")
            .chain(output)
            .chain(&index)
            .chain(&counter)
            .finalize();
        bytes.extend_from_slice(chunk.as_bytes());
        counter += 1;
    }
    T::from_be_slice_padded(&bytes[..T::BYTES]).rem(modulus)
}
