//! The local signature share and the trivial combiner.
//!
//! No interaction happens here: given the message hash, each party
//! computes its share from stored pre-signing state, and anyone can sum
//! the shares into a standard ECDSA signature.

use serde::{Deserialize, Serialize};

use super::common::PresigningData;
use crate::curve::{Scalar, Signature};

/// One party's additive share of an ECDSA signature:
/// `σ_i = k_i m + χ_i r mod q`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureShare {
    pub r: Scalar,
    pub sigma: Scalar,
}

/// Computes this party's signature share for a message hash reduced into
/// the scalar field. Consumes the pre-signing state: it is one-shot, and
/// its secrets are erased when it drops here.
pub fn sign(presigning: PresigningData, message: &Scalar) -> SignatureShare {
    let r = presigning.nonce_point.x_coordinate();
    let sigma = presigning.nonce_share * *message + presigning.product_share * r;
    SignatureShare { r, sigma }
}

/// Sums signature shares into a full signature: `σ = Σ σ_i mod q`.
///
/// `None` if the shares disagree on `r` or produce a degenerate
/// signature.
pub fn combine_shares(shares: &[SignatureShare]) -> Option<Signature> {
    let first = shares.first()?;
    if shares.iter().any(|share| share.r != first.r) {
        return None;
    }
    let sigma: Scalar = shares.iter().map(|share| share.sigma).sum();
    Signature::from_scalars(first.r, sigma)
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;

    use super::{combine_shares, sign};
    use crate::curve::{Point, Scalar};
    use crate::protocols::common::PresigningData;

    #[test]
    fn shares_combine_into_a_valid_signature() {
        // Simulate the presigning outputs directly: k_i and χ_i = k_i' x
        // summing to k and k x.
        let secret = Scalar::random(&mut OsRng);
        let public = secret.mul_by_generator();
        let message = Scalar::random(&mut OsRng);

        let k_shares = [Scalar::random(&mut OsRng), Scalar::random(&mut OsRng)];
        let k: Scalar = k_shares.iter().cloned().sum();
        let k_inv: Option<Scalar> = k.invert().into();
        let nonce_point: Point = k_inv.unwrap().mul_by_generator();

        // Split k x additively between the two parties.
        let chi_0 = Scalar::random(&mut OsRng);
        let chi_1 = k * secret - chi_0;

        let shares = [
            sign(
                PresigningData {
                    nonce_point,
                    nonce_share: k_shares[0],
                    product_share: chi_0,
                },
                &message,
            ),
            sign(
                PresigningData {
                    nonce_point,
                    nonce_share: k_shares[1],
                    product_share: chi_1,
                },
                &message,
            ),
        ];

        let signature = combine_shares(&shares).unwrap();
        assert!(signature.verify(&public, &message));
    }

    #[test]
    fn mismatched_r_is_rejected() {
        let message = Scalar::random(&mut OsRng);
        let make = |nonce: Scalar| {
            sign(
                PresigningData {
                    nonce_point: nonce.mul_by_generator(),
                    nonce_share: Scalar::random(&mut OsRng),
                    product_share: Scalar::random(&mut OsRng),
                },
                &message,
            )
        };
        let shares = [make(Scalar::from(2u64)), make(Scalar::from(3u64))];
        assert!(combine_shares(&shares).is_none());
    }
}
