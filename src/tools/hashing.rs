//! SHA-512 transcript hashing.
//!
//! Every commitment, challenge and session hash in the protocol goes through
//! the [`Hash`] object, so that the byte layout of hash preimages is defined
//! in exactly one place.

use core::fmt;

use sha2::{Digest, Sha512};

use super::serde_bytes;

/// The size of one random-oracle chunk (input and output), in bytes.
pub const KAPPA_RANDOM_ORACLE_BYTES: usize = 64;

/// A SHA-512 output chunk.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HashOutput(pub(crate) [u8; KAPPA_RANDOM_ORACLE_BYTES]);

impl HashOutput {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Bitwise XOR, used to combine per-party randomness contributions.
    pub(crate) fn xor(&self, other: &Self) -> Self {
        let mut result = self.0;
        for (r, b) in result.iter_mut().zip(other.0.iter()) {
            *r ^= b;
        }
        Self(result)
    }
}

impl AsRef<[u8]> for HashOutput {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for HashOutput {
    type Error = String;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; KAPPA_RANDOM_ORACLE_BYTES] = bytes
            .try_into()
            .map_err(|_| "Invalid length of a hash output".to_string())?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for HashOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashOutput({}...)", hex::encode(&self.0[..8]))
    }
}

impl serde::Serialize for HashOutput {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_bytes::as_base64::serialize(self, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for HashOutput {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_bytes::as_base64::deserialize(deserializer)
    }
}

/// A digest object that can absorb [`Hashable`] values.
pub trait Chain: Sized {
    fn chain_raw_bytes(self, bytes: &[u8]) -> Self;

    /// Hash raw bytes whose length is fixed by the type layout.
    fn chain_constant_sized_bytes(self, bytes: &impl AsRef<[u8]>) -> Self {
        self.chain_raw_bytes(bytes.as_ref())
    }

    /// Hash variable-length bytes, prefixed with the length
    /// so that chunk boundaries are unambiguous.
    fn chain_bytes(self, bytes: &(impl AsRef<[u8]> + ?Sized)) -> Self {
        let bytes = bytes.as_ref();
        self.chain_raw_bytes(&(bytes.len() as u64).to_be_bytes())
            .chain_raw_bytes(bytes)
    }

    fn chain<T: Hashable + ?Sized>(self, value: &T) -> Self {
        value.chain(self)
    }
}

/// A value that can be deterministically absorbed into a transcript.
pub trait Hashable {
    fn chain<C: Chain>(&self, digest: C) -> C;
}

/// A SHA-512 transcript with domain separation.
pub struct Hash(Sha512);

impl Hash {
    fn new() -> Self {
        Self(Sha512::new())
    }

    pub fn new_with_dst(dst: &[u8]) -> Self {
        Self::new().chain_bytes(dst)
    }

    pub fn finalize(self) -> HashOutput {
        HashOutput(self.0.finalize().into())
    }
}

impl Chain for Hash {
    fn chain_raw_bytes(mut self, bytes: &[u8]) -> Self {
        self.0.update(bytes);
        self
    }
}

impl Hashable for HashOutput {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain_constant_sized_bytes(&self.0)
    }
}

impl Hashable for u8 {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain_raw_bytes(&[*self])
    }
}

impl Hashable for u32 {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain_raw_bytes(&self.to_be_bytes())
    }
}

impl Hashable for u64 {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain_raw_bytes(&self.to_be_bytes())
    }
}

impl Hashable for usize {
    fn chain<C: Chain>(&self, digest: C) -> C {
        (*self as u64).chain(digest)
    }
}

impl Hashable for [u8] {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain_bytes(self)
    }
}

impl Hashable for Box<[u8]> {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain_bytes(self.as_ref())
    }
}

impl<T: Hashable + ?Sized> Hashable for &T {
    fn chain<C: Chain>(&self, digest: C) -> C {
        (**self).chain(digest)
    }
}

impl<T: Hashable> Hashable for Option<T> {
    fn chain<C: Chain>(&self, digest: C) -> C {
        match self {
            None => digest.chain(&0u8),
            Some(value) => digest.chain(&1u8).chain(value),
        }
    }
}

impl<T: Hashable> Hashable for Vec<T> {
    fn chain<C: Chain>(&self, digest: C) -> C {
        let mut digest = digest.chain(&self.len());
        for value in self {
            digest = digest.chain(value);
        }
        digest
    }
}

impl<T1: Hashable, T2: Hashable> Hashable for (T1, T2) {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain(&self.0).chain(&self.1)
    }
}

impl<T1: Hashable, T2: Hashable, T3: Hashable> Hashable for (T1, T2, T3) {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest.chain(&self.0).chain(&self.1).chain(&self.2)
    }
}

impl<T1: Hashable, T2: Hashable, T3: Hashable, T4: Hashable> Hashable for (T1, T2, T3, T4) {
    fn chain<C: Chain>(&self, digest: C) -> C {
        digest
            .chain(&self.0)
            .chain(&self.1)
            .chain(&self.2)
            .chain(&self.3)
    }
}

/// Fills a 64-byte chunk with random bytes.
pub(crate) fn random_chunk(rng: &mut impl rand_core::CryptoRngCore) -> HashOutput {
    let mut bytes = [0u8; KAPPA_RANDOM_ORACLE_BYTES];
    rng.fill_bytes(&mut bytes);
    HashOutput(bytes)
}

#[cfg(test)]
mod tests {
    use super::{Chain, Hash, Hashable};

    #[test]
    fn chunk_boundaries_are_unambiguous() {
        let h1 = Hash::new_with_dst(b"test")
            .chain(&b"ab"[..])
            .chain(&b"c"[..])
            .finalize();
        let h2 = Hash::new_with_dst(b"test")
            .chain(&b"a"[..])
            .chain(&b"bc"[..])
            .finalize();
        assert_ne!(h1, h2);
    }

    #[test]
    fn xor_is_involutive() {
        let h1 = Hash::new_with_dst(b"a").finalize();
        let h2 = Hash::new_with_dst(b"b").finalize();
        assert_eq!(h1.xor(&h2).xor(&h2), h1);
    }
}
