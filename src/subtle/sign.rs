// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use ecdsa::signature::hazmat::PrehashSigner;
use ed25519_dalek::Signer;
use hmac::Mac;
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::{Pkcs1v15Sign, Pss, RsaPrivateKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::{Error, Result};
use crate::params::AlgorithmIdentifier;
use crate::sha_hash::ShaAlgorithm;
use crate::subtle::crypto_key::{CryptoKey, KeyKind};
use crate::subtle::key_algorithm::KeyAlgorithm;
use crate::subtle::key_usage::KeyUsage;
use crate::subtle::sign_algorithm::SigningAlgorithm;
use crate::subtle::{algorithm_mismatch_error, algorithm_not_supported_error};

pub fn sign(algorithm: &AlgorithmIdentifier, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
    let algorithm = SigningAlgorithm::from_params(algorithm)?;
    key.check_validity(algorithm.name(), KeyUsage::Sign)?;
    key.check_kind(&[KeyKind::Secret, KeyKind::Private])?;

    let handle = key.handle();
    match algorithm {
        SigningAlgorithm::Hmac => {
            let hash = match key.algorithm() {
                KeyAlgorithm::Hmac { hash, .. } => *hash,
                _ => return algorithm_mismatch_error("HMAC"),
            };
            hmac_sign(hash, handle, data)
        },
        SigningAlgorithm::Ecdsa { hash } => {
            let digest = hash.digest(data);
            let curve = match key.algorithm() {
                KeyAlgorithm::Ec { curve, .. } => *curve,
                _ => return algorithm_mismatch_error("ECDSA"),
            };
            ecdsa_sign(curve, handle, &digest)
        },
        SigningAlgorithm::RsaPss { salt_length } => {
            let (hash, private_key) = rsa_signing_key(key, "RSA-PSS")?;
            let digest = hash.digest(data);
            let padding = match hash {
                ShaAlgorithm::SHA1 => Pss::new_with_salt::<Sha1>(salt_length as usize),
                ShaAlgorithm::SHA256 => Pss::new_with_salt::<Sha256>(salt_length as usize),
                ShaAlgorithm::SHA384 => Pss::new_with_salt::<Sha384>(salt_length as usize),
                ShaAlgorithm::SHA512 => Pss::new_with_salt::<Sha512>(salt_length as usize),
            };
            private_key
                .sign_with_rng(&mut OsRng, padding, &digest)
                .map_err(|e| Error::operation(e.to_string()))
        },
        SigningAlgorithm::RsassaPkcs1v15 => {
            let (hash, private_key) = rsa_signing_key(key, "RSASSA-PKCS1-v1_5")?;
            let digest = hash.digest(data);
            let padding = match hash {
                ShaAlgorithm::SHA1 => Pkcs1v15Sign::new::<Sha1>(),
                ShaAlgorithm::SHA256 => Pkcs1v15Sign::new::<Sha256>(),
                ShaAlgorithm::SHA384 => Pkcs1v15Sign::new::<Sha384>(),
                ShaAlgorithm::SHA512 => Pkcs1v15Sign::new::<Sha512>(),
            };
            private_key
                .sign(padding, &digest)
                .map_err(|e| Error::operation(e.to_string()))
        },
        SigningAlgorithm::Ed25519 => {
            let seed: [u8; 32] = handle
                .try_into()
                .map_err(|_| Error::operation("Invalid Ed25519 private key"))?;
            let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
            Ok(signing_key.sign(data).to_vec())
        },
        SigningAlgorithm::Ed448 { .. } => algorithm_not_supported_error("Ed448"),
    }
}

pub(crate) fn hmac_sign(hash: ShaAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    Ok(match hash {
        ShaAlgorithm::SHA1 => {
            let mut mac = hmac::Hmac::<Sha1>::new_from_slice(key)
                .map_err(|e| Error::operation(e.to_string()))?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        },
        ShaAlgorithm::SHA256 => {
            let mut mac = hmac::Hmac::<Sha256>::new_from_slice(key)
                .map_err(|e| Error::operation(e.to_string()))?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        },
        ShaAlgorithm::SHA384 => {
            let mut mac = hmac::Hmac::<Sha384>::new_from_slice(key)
                .map_err(|e| Error::operation(e.to_string()))?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        },
        ShaAlgorithm::SHA512 => {
            let mut mac = hmac::Hmac::<Sha512>::new_from_slice(key)
                .map_err(|e| Error::operation(e.to_string()))?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        },
    })
}

/// Produces the fixed-width `r || s` encoding required for ECDSA signatures.
fn ecdsa_sign(
    curve: crate::subtle::EllipticCurve,
    handle: &[u8],
    digest: &[u8],
) -> Result<Vec<u8>> {
    use crate::subtle::EllipticCurve;

    Ok(match curve {
        EllipticCurve::P256 => {
            let signing_key = p256::ecdsa::SigningKey::from_slice(handle)
                .map_err(|e| Error::operation(e.to_string()))?;
            let signature: p256::ecdsa::Signature = signing_key
                .sign_prehash(digest)
                .map_err(|e| Error::operation(e.to_string()))?;
            signature.to_bytes().to_vec()
        },
        EllipticCurve::P384 => {
            let signing_key = p384::ecdsa::SigningKey::from_slice(handle)
                .map_err(|e| Error::operation(e.to_string()))?;
            let signature: p384::ecdsa::Signature = signing_key
                .sign_prehash(digest)
                .map_err(|e| Error::operation(e.to_string()))?;
            signature.to_bytes().to_vec()
        },
        EllipticCurve::P521 => {
            let signing_key = p521::ecdsa::SigningKey::from_slice(handle)
                .map_err(|e| Error::operation(e.to_string()))?;
            let signature: p521::ecdsa::Signature = signing_key
                .sign_prehash(digest)
                .map_err(|e| Error::operation(e.to_string()))?;
            signature.to_bytes().to_vec()
        },
    })
}

fn rsa_signing_key(
    key: &CryptoKey,
    algorithm_name: &str,
) -> Result<(ShaAlgorithm, RsaPrivateKey)> {
    let hash = match key.algorithm() {
        KeyAlgorithm::Rsa { hash, .. } => *hash,
        _ => return algorithm_mismatch_error(algorithm_name),
    };
    let private_key = RsaPrivateKey::from_pkcs1_der(key.handle())
        .map_err(|e| Error::operation(e.to_string()))?;
    Ok((hash, private_key))
}
