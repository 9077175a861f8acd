// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use ecdsa::signature::hazmat::PrehashVerifier;
use ed25519_dalek::Verifier;
use hmac::Mac;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Sign, Pss, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::{Error, Result};
use crate::params::AlgorithmIdentifier;
use crate::sha_hash::ShaAlgorithm;
use crate::subtle::crypto_key::{CryptoKey, KeyKind};
use crate::subtle::key_algorithm::KeyAlgorithm;
use crate::subtle::key_usage::KeyUsage;
use crate::subtle::sign_algorithm::SigningAlgorithm;
use crate::subtle::{algorithm_mismatch_error, algorithm_not_supported_error, EllipticCurve};

pub fn verify(
    algorithm: &AlgorithmIdentifier,
    key: &CryptoKey,
    signature: &[u8],
    data: &[u8],
) -> Result<bool> {
    let algorithm = SigningAlgorithm::from_params(algorithm)?;
    key.check_validity(algorithm.name(), KeyUsage::Verify)?;

    let handle = key.handle();
    match algorithm {
        SigningAlgorithm::Hmac => {
            key.check_kind(&[KeyKind::Secret])?;
            let hash = match key.algorithm() {
                KeyAlgorithm::Hmac { hash, .. } => *hash,
                _ => return algorithm_mismatch_error("HMAC"),
            };
            hmac_verify(hash, handle, signature, data)
        },
        SigningAlgorithm::Ecdsa { hash } => {
            key.check_kind(&[KeyKind::Public])?;
            let curve = match key.algorithm() {
                KeyAlgorithm::Ec { curve, .. } => *curve,
                _ => return algorithm_mismatch_error("ECDSA"),
            };
            // A signature of the wrong width for the curve verifies false,
            // it is not an error.
            if signature.len() != curve.field_size() * 2 {
                return Ok(false);
            }
            let digest = hash.digest(data);
            ecdsa_verify(curve, handle, signature, &digest)
        },
        SigningAlgorithm::RsaPss { salt_length } => {
            let (hash, public_key) = rsa_verifying_key(key, "RSA-PSS")?;
            let digest = hash.digest(data);
            let padding = match hash {
                ShaAlgorithm::SHA1 => Pss::new_with_salt::<Sha1>(salt_length as usize),
                ShaAlgorithm::SHA256 => Pss::new_with_salt::<Sha256>(salt_length as usize),
                ShaAlgorithm::SHA384 => Pss::new_with_salt::<Sha384>(salt_length as usize),
                ShaAlgorithm::SHA512 => Pss::new_with_salt::<Sha512>(salt_length as usize),
            };
            Ok(public_key.verify(padding, &digest, signature).is_ok())
        },
        SigningAlgorithm::RsassaPkcs1v15 => {
            let (hash, public_key) = rsa_verifying_key(key, "RSASSA-PKCS1-v1_5")?;
            let digest = hash.digest(data);
            let padding = match hash {
                ShaAlgorithm::SHA1 => Pkcs1v15Sign::new::<Sha1>(),
                ShaAlgorithm::SHA256 => Pkcs1v15Sign::new::<Sha256>(),
                ShaAlgorithm::SHA384 => Pkcs1v15Sign::new::<Sha384>(),
                ShaAlgorithm::SHA512 => Pkcs1v15Sign::new::<Sha512>(),
            };
            Ok(public_key.verify(padding, &digest, signature).is_ok())
        },
        SigningAlgorithm::Ed25519 => {
            key.check_kind(&[KeyKind::Public])?;
            let Ok(signature) = ed25519_dalek::Signature::try_from(signature) else {
                return Ok(false);
            };
            let public: [u8; 32] = handle
                .try_into()
                .map_err(|_| Error::operation("Invalid Ed25519 public key"))?;
            let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&public)
                .map_err(|_| Error::operation("Invalid Ed25519 public key"))?;
            Ok(verifying_key.verify(data, &signature).is_ok())
        },
        SigningAlgorithm::Ed448 { .. } => algorithm_not_supported_error("Ed448"),
    }
}

pub(crate) fn hmac_verify(
    hash: ShaAlgorithm,
    key: &[u8],
    signature: &[u8],
    data: &[u8],
) -> Result<bool> {
    Ok(match hash {
        ShaAlgorithm::SHA1 => {
            let mut mac = hmac::Hmac::<Sha1>::new_from_slice(key)
                .map_err(|e| Error::operation(e.to_string()))?;
            mac.update(data);
            mac.verify_slice(signature).is_ok()
        },
        ShaAlgorithm::SHA256 => {
            let mut mac = hmac::Hmac::<Sha256>::new_from_slice(key)
                .map_err(|e| Error::operation(e.to_string()))?;
            mac.update(data);
            mac.verify_slice(signature).is_ok()
        },
        ShaAlgorithm::SHA384 => {
            let mut mac = hmac::Hmac::<Sha384>::new_from_slice(key)
                .map_err(|e| Error::operation(e.to_string()))?;
            mac.update(data);
            mac.verify_slice(signature).is_ok()
        },
        ShaAlgorithm::SHA512 => {
            let mut mac = hmac::Hmac::<Sha512>::new_from_slice(key)
                .map_err(|e| Error::operation(e.to_string()))?;
            mac.update(data);
            mac.verify_slice(signature).is_ok()
        },
    })
}

fn ecdsa_verify(
    curve: EllipticCurve,
    handle: &[u8],
    signature: &[u8],
    digest: &[u8],
) -> Result<bool> {
    Ok(match curve {
        EllipticCurve::P256 => {
            let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(handle)
                .map_err(|e| Error::operation(e.to_string()))?;
            let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
                return Ok(false);
            };
            verifying_key.verify_prehash(digest, &signature).is_ok()
        },
        EllipticCurve::P384 => {
            let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(handle)
                .map_err(|e| Error::operation(e.to_string()))?;
            let Ok(signature) = p384::ecdsa::Signature::from_slice(signature) else {
                return Ok(false);
            };
            verifying_key.verify_prehash(digest, &signature).is_ok()
        },
        EllipticCurve::P521 => {
            let verifying_key = p521::ecdsa::VerifyingKey::from_sec1_bytes(handle)
                .map_err(|e| Error::operation(e.to_string()))?;
            let Ok(signature) = p521::ecdsa::Signature::from_slice(signature) else {
                return Ok(false);
            };
            verifying_key.verify_prehash(digest, &signature).is_ok()
        },
    })
}

fn rsa_verifying_key(
    key: &CryptoKey,
    algorithm_name: &str,
) -> Result<(ShaAlgorithm, RsaPublicKey)> {
    key.check_kind(&[KeyKind::Public])?;
    let hash = match key.algorithm() {
        KeyAlgorithm::Rsa { hash, .. } => *hash,
        _ => return algorithm_mismatch_error(algorithm_name),
    };
    let public_key = RsaPublicKey::from_pkcs1_der(key.handle())
        .map_err(|e| Error::operation(e.to_string()))?;
    Ok((hash, public_key))
}

#[cfg(test)]
mod tests {
    use elliptic_curve::sec1::ToEncodedPoint;

    use super::*;
    use crate::params::Params;
    use crate::subtle::key_usage::{SIGN, VERIFY};
    use crate::subtle::sign::sign;
    use crate::subtle::EcAlgorithm;

    fn hmac_key(material: Vec<u8>) -> CryptoKey {
        let length = material.len() as u32 * 8;
        CryptoKey::new(
            KeyKind::Secret,
            "HMAC",
            true,
            KeyAlgorithm::Hmac {
                hash: ShaAlgorithm::SHA256,
                length,
            },
            SIGN | VERIFY,
            material,
        )
    }

    #[test]
    fn hmac_round_trip() {
        let key = hmac_key(vec![7u8; 32]);
        let mac = sign(&"HMAC".into(), &key, b"message").unwrap();
        assert!(verify(&"HMAC".into(), &key, &mac, b"message").unwrap());
        assert!(!verify(&"HMAC".into(), &key, &mac, b"other message").unwrap());
    }

    #[test]
    fn ecdsa_round_trip_and_wrong_width_is_false() {
        let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let point = secret.public_key().to_encoded_point(false);

        let private = CryptoKey::new(
            KeyKind::Private,
            "ECDSA",
            true,
            KeyAlgorithm::Ec {
                curve: EllipticCurve::P256,
                algorithm: EcAlgorithm::Ecdsa,
            },
            SIGN,
            secret.to_bytes().to_vec(),
        );
        let public = CryptoKey::new(
            KeyKind::Public,
            "ECDSA",
            true,
            KeyAlgorithm::Ec {
                curve: EllipticCurve::P256,
                algorithm: EcAlgorithm::Ecdsa,
            },
            VERIFY,
            point.as_bytes().to_vec(),
        );

        let params: AlgorithmIdentifier = Params::new()
            .with("name", "ECDSA")
            .with("hash", "SHA-256")
            .into();
        let signature = sign(&params, &private, b"message").unwrap();
        assert!(verify(&params, &public, &signature, b"message").unwrap());

        // Truncated signature must verify false rather than error.
        assert!(!verify(&params, &public, &signature[..63], b"message").unwrap());
    }

    #[test]
    fn ed25519_round_trip() {
        let signing_key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        let private = CryptoKey::new(
            KeyKind::Private,
            "Ed25519",
            true,
            KeyAlgorithm::Okp {
                curve: crate::subtle::OkpCurve::Ed25519,
            },
            SIGN,
            signing_key.to_bytes().to_vec(),
        );
        let public = CryptoKey::new(
            KeyKind::Public,
            "Ed25519",
            true,
            KeyAlgorithm::Okp {
                curve: crate::subtle::OkpCurve::Ed25519,
            },
            VERIFY,
            signing_key.verifying_key().to_bytes().to_vec(),
        );

        let signature = sign(&"Ed25519".into(), &private, b"message").unwrap();
        assert!(verify(&"Ed25519".into(), &public, &signature, b"message").unwrap());
        assert!(!verify(&"Ed25519".into(), &public, &[0u8; 3], b"message").unwrap());
    }
}
