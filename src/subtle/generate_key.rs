// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::rc::Rc;

use elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::{BigUint, RsaPrivateKey};

use crate::error::{Error, Result};
use crate::params::AlgorithmIdentifier;
use crate::subtle::crypto_key::{CryptoKey, CryptoKeyPair, KeyKind, KeyOrPair};
use crate::subtle::key_algorithm::{KeyAlgorithm, KeyAlgorithmMode, KeyAlgorithmWithUsages};
use crate::subtle::key_usage::KeyUsage;
use crate::subtle::{algorithm_not_supported_error, EllipticCurve, OkpCurve};

/// Generates a secret key or a key pair for the given algorithm.
///
/// A generated public half is always extractable; the secret or private half
/// honors the `extractable` argument.
pub fn generate_key(
    algorithm: &AlgorithmIdentifier,
    extractable: bool,
    usages: &[KeyUsage],
) -> Result<KeyOrPair> {
    let KeyAlgorithmWithUsages {
        name,
        algorithm: key_algorithm,
        public_usages,
        private_usages,
    } = KeyAlgorithm::from_params(KeyAlgorithmMode::Generate, algorithm, usages)?;

    match &key_algorithm {
        KeyAlgorithm::Aes { length } => {
            if public_usages == 0 {
                return Err(Error::syntax("Usages must not be empty for a secret key"));
            }
            let mut handle = vec![0u8; *length as usize / 8];
            OsRng.fill_bytes(&mut handle);
            Ok(KeyOrPair::Key(Rc::new(CryptoKey::new(
                KeyKind::Secret,
                name,
                extractable,
                key_algorithm,
                public_usages,
                handle,
            ))))
        },
        KeyAlgorithm::Hmac { length, .. } => {
            if public_usages == 0 {
                return Err(Error::syntax("Usages must not be empty for a secret key"));
            }
            let mut handle = vec![0u8; (*length as usize).div_ceil(8)];
            OsRng.fill_bytes(&mut handle);
            Ok(KeyOrPair::Key(Rc::new(CryptoKey::new(
                KeyKind::Secret,
                name,
                extractable,
                key_algorithm,
                public_usages,
                handle,
            ))))
        },
        KeyAlgorithm::Rsa {
            modulus_length,
            public_exponent,
            ..
        } => {
            if private_usages == 0 {
                return Err(Error::syntax(
                    "Usages must not be empty for the private key",
                ));
            }
            let exponent = BigUint::from_bytes_be(public_exponent);
            let private_key =
                RsaPrivateKey::new_with_exp(&mut OsRng, *modulus_length as usize, &exponent)
                    .map_err(|e| Error::operation(e.to_string()))?;
            let public_handle = private_key
                .to_public_key()
                .to_pkcs1_der()
                .map_err(|e| Error::operation(e.to_string()))?
                .into_vec();
            let private_handle = private_key
                .to_pkcs1_der()
                .map_err(|e| Error::operation(e.to_string()))?
                .to_bytes()
                .to_vec();
            Ok(pair(
                name,
                key_algorithm,
                extractable,
                public_usages,
                private_usages,
                public_handle,
                private_handle,
            ))
        },
        KeyAlgorithm::Ec { curve, .. } => {
            if private_usages == 0 {
                return Err(Error::syntax(
                    "Usages must not be empty for the private key",
                ));
            }
            let (public_handle, private_handle) = generate_ec_pair(*curve);
            Ok(pair(
                name,
                key_algorithm,
                extractable,
                public_usages,
                private_usages,
                public_handle,
                private_handle,
            ))
        },
        KeyAlgorithm::Okp { curve } => {
            if private_usages == 0 {
                return Err(Error::syntax(
                    "Usages must not be empty for the private key",
                ));
            }
            let (public_handle, private_handle) = generate_okp_pair(*curve)?;
            Ok(pair(
                name,
                key_algorithm,
                extractable,
                public_usages,
                private_usages,
                public_handle,
                private_handle,
            ))
        },
        // from_params already rejects these in generate mode.
        KeyAlgorithm::Hkdf | KeyAlgorithm::Pbkdf2 => algorithm_not_supported_error(&name),
    }
}

fn pair(
    name: String,
    algorithm: KeyAlgorithm,
    extractable: bool,
    public_usages: u8,
    private_usages: u8,
    public_handle: Vec<u8>,
    private_handle: Vec<u8>,
) -> KeyOrPair {
    let public_key = Rc::new(CryptoKey::new(
        KeyKind::Public,
        name.clone(),
        true,
        algorithm.clone(),
        public_usages,
        public_handle,
    ));
    let private_key = Rc::new(CryptoKey::new(
        KeyKind::Private,
        name,
        extractable,
        algorithm,
        private_usages,
        private_handle,
    ));
    KeyOrPair::Pair(CryptoKeyPair {
        public_key,
        private_key,
    })
}

fn generate_ec_pair(curve: EllipticCurve) -> (Vec<u8>, Vec<u8>) {
    match curve {
        EllipticCurve::P256 => {
            let secret = p256::SecretKey::random(&mut OsRng);
            let point = secret.public_key().to_encoded_point(false);
            (point.as_bytes().to_vec(), secret.to_bytes().to_vec())
        },
        EllipticCurve::P384 => {
            let secret = p384::SecretKey::random(&mut OsRng);
            let point = secret.public_key().to_encoded_point(false);
            (point.as_bytes().to_vec(), secret.to_bytes().to_vec())
        },
        EllipticCurve::P521 => {
            let secret = p521::SecretKey::random(&mut OsRng);
            let point = secret.public_key().to_encoded_point(false);
            (point.as_bytes().to_vec(), secret.to_bytes().to_vec())
        },
    }
}

fn generate_okp_pair(curve: OkpCurve) -> Result<(Vec<u8>, Vec<u8>)> {
    Ok(match curve {
        OkpCurve::Ed25519 => {
            let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
            (
                signing_key.verifying_key().to_bytes().to_vec(),
                signing_key.to_bytes().to_vec(),
            )
        },
        OkpCurve::X25519 => {
            let secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
            let public = x25519_dalek::PublicKey::from(&secret);
            (public.as_bytes().to_vec(), secret.to_bytes().to_vec())
        },
        OkpCurve::X448 => {
            let mut seed = [0u8; 56];
            OsRng.fill_bytes(&mut seed);
            let secret = x448::Secret::from_bytes(&seed)
                .ok_or_else(|| Error::operation("X448 key generation failed"))?;
            let public = x448::PublicKey::from(&secret);
            (public.as_bytes().to_vec(), secret.as_bytes().to_vec())
        },
        OkpCurve::Ed448 => return algorithm_not_supported_error("Ed448"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::params::Params;

    #[test]
    fn aes_generate_produces_fresh_material() {
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "AES-GCM")
            .with("length", 256u32)
            .into();
        let KeyOrPair::Key(a) = generate_key(&params, true, &[KeyUsage::Encrypt]).unwrap()
        else {
            panic!("expected a secret key");
        };
        let KeyOrPair::Key(b) = generate_key(&params, true, &[KeyUsage::Encrypt]).unwrap()
        else {
            panic!("expected a secret key");
        };
        assert_eq!(a.handle().len(), 32);
        assert_ne!(a.handle(), b.handle());
    }

    #[test]
    fn secret_generation_requires_usages() {
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "AES-CBC")
            .with("length", 128u32)
            .into();
        let err = generate_key(&params, true, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn pair_generation_requires_private_usages() {
        // verify alone leaves the private half without usages
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "ECDSA")
            .with("namedCurve", "P-256")
            .into();
        let err = generate_key(&params, true, &[KeyUsage::Verify]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn ec_pair_halves_are_wired_up() {
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "ECDSA")
            .with("namedCurve", "P-384")
            .into();
        let KeyOrPair::Pair(pair) =
            generate_key(&params, false, &[KeyUsage::Sign, KeyUsage::Verify]).unwrap()
        else {
            panic!("expected a key pair");
        };
        assert_eq!(pair.public_key.kind(), KeyKind::Public);
        assert!(pair.public_key.extractable());
        assert_eq!(pair.public_key.usages(), vec![KeyUsage::Verify]);
        assert_eq!(pair.private_key.kind(), KeyKind::Private);
        assert!(!pair.private_key.extractable());
        assert_eq!(pair.private_key.usages(), vec![KeyUsage::Sign]);
        // uncompressed SEC1 point and raw scalar
        assert_eq!(pair.public_key.handle().len(), 97);
        assert_eq!(pair.public_key.handle()[0], 0x04);
        assert_eq!(pair.private_key.handle().len(), 48);
    }

    #[test]
    fn x25519_generation_yields_matching_halves() {
        let KeyOrPair::Pair(pair) =
            generate_key(&"X25519".into(), true, &[KeyUsage::DeriveBits]).unwrap()
        else {
            panic!("expected a key pair");
        };
        let secret: [u8; 32] = pair.private_key.handle().try_into().unwrap();
        let expected =
            x25519_dalek::PublicKey::from(&x25519_dalek::StaticSecret::from(secret));
        assert_eq!(pair.public_key.handle(), expected.as_bytes());
    }

    #[test]
    fn ed448_generation_is_not_supported() {
        let err = generate_key(&"Ed448".into(), true, &[KeyUsage::Sign]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn kdf_generation_is_not_supported() {
        let err = generate_key(&"HKDF".into(), false, &[KeyUsage::DeriveBits]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }
}
