use serde::{Deserialize, Serialize};

use super::arithmetic::{Point, Scalar};

/// A full ECDSA signature, assembled from per-party signature shares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub r: Scalar,
    pub s: Scalar,
}

impl Signature {
    pub(crate) fn from_scalars(r: Scalar, s: Scalar) -> Option<Self> {
        if r == Scalar::ZERO || s == Scalar::ZERO {
            return None;
        }
        Some(Self { r, s })
    }

    /// The backend verifier rejects malleable signatures, so normalize
    /// `s` into the low half of the scalar range.
    pub fn normalized(self) -> Self {
        if self.s.is_high() {
            Self {
                r: self.r,
                s: -self.s,
            }
        } else {
            self
        }
    }

    pub fn to_backend(self) -> k256::ecdsa::Signature {
        let normalized = self.normalized();
        k256::ecdsa::Signature::from_scalars(
            normalized.r.to_be_bytes(),
            normalized.s.to_be_bytes(),
        )
        .expect("r and s are non-zero scalars")
    }

    /// Textbook verification against a public key point:
    /// `r == x((m/s) g + (r/s) P) mod q`.
    pub fn verify(&self, public_key: &Point, message: &Scalar) -> bool {
        let s_inv: Option<Scalar> = self.s.invert().into();
        let s_inv = match s_inv {
            Some(s_inv) => s_inv,
            None => return false,
        };
        let u1 = *message * s_inv;
        let u2 = self.r * s_inv;
        let point = u1.mul_by_generator() + public_key * &u2;
        !point.is_identity() && point.x_coordinate() == self.r
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::{Scalar, Signature};

    #[test]
    fn sign_and_verify_single_party() {
        // A plain single-signer ECDSA as a sanity check of the verifier.
        let secret = Scalar::random(&mut OsRng);
        let public = secret.mul_by_generator();
        let message = Scalar::random(&mut OsRng);

        let k = Scalar::random(&mut OsRng);
        let big_r = k.invert().map(|k_inv| k_inv.mul_by_generator()).unwrap();
        let r = big_r.x_coordinate();
        let s = k * (message + r * secret);

        let signature = Signature::from_scalars(r, s).unwrap();
        assert!(signature.verify(&public, &message));
        assert!(!signature.verify(&public, &(message + Scalar::ONE)));

        // The normalized form still verifies.
        assert!(signature.normalized().verify(&public, &message));
    }
}
