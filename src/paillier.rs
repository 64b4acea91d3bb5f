pub(crate) mod encryption;
pub(crate) mod keys;
pub(crate) mod params;
pub(crate) mod ring_pedersen;

pub(crate) use encryption::Ciphertext;
pub(crate) use keys::{PublicKeyPaillier, SecretKeyPaillier};
pub use params::{PaillierParams, PaillierProduction, PaillierTest};
pub(crate) use ring_pedersen::{RPParams, RPSecret};
