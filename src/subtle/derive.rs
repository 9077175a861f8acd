// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::rc::Rc;

use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::{Error, Result};
use crate::params::AlgorithmIdentifier;
use crate::sha_hash::ShaAlgorithm;
use crate::subtle::crypto_key::{CryptoKey, KeyKind};
use crate::subtle::derive_algorithm::DeriveAlgorithm;
use crate::subtle::key_algorithm::{
    extract_sha_hash, KeyAlgorithm, KeyAlgorithmMode, KeyAlgorithmWithUsages,
};
use crate::subtle::key_usage::KeyUsage;
use crate::subtle::{
    algorithm_mismatch_error, algorithm_not_supported_error, require_params, EllipticCurve,
};
use crate::params::to_name_and_maybe_params;

/// Derives `length` bits from the base key. A `length` of `None` asks for
/// the natural output of the algorithm, which only key agreement has (the
/// full shared secret).
pub fn derive_bits(
    algorithm: &AlgorithmIdentifier,
    base_key: &CryptoKey,
    length: Option<u32>,
) -> Result<Vec<u8>> {
    let algorithm = DeriveAlgorithm::from_params(algorithm)?;
    base_key.check_validity(algorithm.name(), KeyUsage::DeriveBits)?;
    derive_raw(&algorithm, base_key, length)
}

/// Derives key material and imports it under the target algorithm, as if by
/// deriveBits followed by a raw import.
pub fn derive_key(
    algorithm: &AlgorithmIdentifier,
    base_key: &CryptoKey,
    derived_key_algorithm: &AlgorithmIdentifier,
    extractable: bool,
    usages: &[KeyUsage],
) -> Result<Rc<CryptoKey>> {
    let derive = DeriveAlgorithm::from_params(algorithm)?;
    base_key.check_validity(derive.name(), KeyUsage::DeriveKey)?;

    let KeyAlgorithmWithUsages {
        name,
        algorithm: key_algorithm,
        public_usages,
        ..
    } = KeyAlgorithm::from_params(KeyAlgorithmMode::Derive, derived_key_algorithm, usages)?;

    if public_usages == 0 {
        return Err(Error::syntax("Usages must not be empty for a secret key"));
    }

    let length = match &key_algorithm {
        KeyAlgorithm::Aes { length } => Some(*length as u32),
        KeyAlgorithm::Hmac { length, .. } => Some(*length),
        _ => None,
    };
    if matches!(key_algorithm, KeyAlgorithm::Hkdf | KeyAlgorithm::Pbkdf2) && extractable {
        return Err(Error::syntax(
            [&name, " keys must not be extractable"].concat(),
        ));
    }

    let handle = derive_raw(&derive, base_key, length)?;

    Ok(Rc::new(CryptoKey::new(
        KeyKind::Secret,
        name,
        extractable,
        key_algorithm,
        public_usages,
        handle,
    )))
}

/// Length semantics for `getKeyLength`: the bit length a derived key of the
/// given algorithm will have, or `None` when the algorithm takes variable
/// length key material.
pub fn get_key_length(algorithm: &AlgorithmIdentifier) -> Result<Option<u32>> {
    let (name, params) = to_name_and_maybe_params(algorithm)?;

    match name.to_ascii_uppercase().as_str() {
        "AES-CBC" | "AES-CTR" | "AES-GCM" | "AES-KW" => {
            let params = require_params(params, &name)?;
            let length: u32 = params.get_required("length")?;
            if !matches!(length, 128 | 192 | 256) {
                return Err(Error::operation(
                    "AES key length must be 128, 192 or 256 bits",
                ));
            }
            Ok(Some(length))
        },
        "HMAC" => {
            let params = require_params(params, "HMAC")?;
            let length = match params.get_optional::<u32>("length")? {
                Some(0) => return Err(Error::operation("HMAC key length must not be zero")),
                Some(length) => length,
                None => {
                    let hash = extract_sha_hash(params)?;
                    hash.block_len() as u32 * 8
                },
            };
            Ok(Some(length))
        },
        "HKDF" | "PBKDF2" => Ok(None),
        _ => algorithm_not_supported_error(&name),
    }
}

fn derive_raw(
    algorithm: &DeriveAlgorithm,
    base_key: &CryptoKey,
    length: Option<u32>,
) -> Result<Vec<u8>> {
    match algorithm {
        DeriveAlgorithm::DiffieHellman { name, public } => {
            base_key.check_kind(&[KeyKind::Private])?;
            public.check_kind(&[KeyKind::Public])?;
            if !public.name().eq_ignore_ascii_case(name) {
                return Err(Error::invalid_access(
                    "The public key does not belong to the requested algorithm",
                ));
            }

            let secret = match (base_key.algorithm(), public.algorithm()) {
                (
                    KeyAlgorithm::Ec { curve, .. },
                    KeyAlgorithm::Ec {
                        curve: public_curve,
                        ..
                    },
                ) => {
                    if curve != public_curve {
                        return Err(Error::invalid_access(
                            "The keys belong to different curves",
                        ));
                    }
                    ecdh_shared_secret(*curve, base_key.handle(), public.handle())?
                },
                (KeyAlgorithm::Okp { curve }, KeyAlgorithm::Okp { curve: public_curve })
                    if curve == public_curve =>
                {
                    match curve {
                        crate::subtle::OkpCurve::X25519 => {
                            x25519_shared_secret(base_key.handle(), public.handle())?
                        },
                        crate::subtle::OkpCurve::X448 => {
                            x448_shared_secret(base_key.handle(), public.handle())?
                        },
                        _ => return algorithm_mismatch_error(name),
                    }
                },
                _ => return Err(Error::invalid_access("The keys do not match")),
            };

            truncate_to_bits(secret, length)
        },
        DeriveAlgorithm::Hkdf { hash, salt, info } => {
            base_key.check_kind(&[KeyKind::Secret])?;
            let length = checked_output_length(length, "HKDF")?;
            if length == 0 {
                return Ok(Vec::new());
            }
            let mut okm = vec![0u8; length / 8];
            hkdf_expand(*hash, salt, base_key.handle(), info, &mut okm)?;
            Ok(okm)
        },
        DeriveAlgorithm::Pbkdf2 {
            hash,
            salt,
            iterations,
        } => {
            base_key.check_kind(&[KeyKind::Secret])?;
            let length = checked_output_length(length, "PBKDF2")?;
            if length == 0 {
                return Err(Error::operation("PBKDF2 output length must not be zero"));
            }
            let mut okm = vec![0u8; length / 8];
            match hash {
                ShaAlgorithm::SHA1 => {
                    pbkdf2::pbkdf2_hmac::<Sha1>(base_key.handle(), salt, *iterations, &mut okm)
                },
                ShaAlgorithm::SHA256 => {
                    pbkdf2::pbkdf2_hmac::<Sha256>(base_key.handle(), salt, *iterations, &mut okm)
                },
                ShaAlgorithm::SHA384 => {
                    pbkdf2::pbkdf2_hmac::<Sha384>(base_key.handle(), salt, *iterations, &mut okm)
                },
                ShaAlgorithm::SHA512 => {
                    pbkdf2::pbkdf2_hmac::<Sha512>(base_key.handle(), salt, *iterations, &mut okm)
                },
            }
            Ok(okm)
        },
    }
}

fn hkdf_expand(
    hash: ShaAlgorithm,
    salt: &[u8],
    ikm: &[u8],
    info: &[u8],
    okm: &mut [u8],
) -> Result<()> {
    let expanded = match hash {
        ShaAlgorithm::SHA1 => hkdf::Hkdf::<Sha1>::new(Some(salt), ikm).expand(info, okm),
        ShaAlgorithm::SHA256 => hkdf::Hkdf::<Sha256>::new(Some(salt), ikm).expand(info, okm),
        ShaAlgorithm::SHA384 => hkdf::Hkdf::<Sha384>::new(Some(salt), ikm).expand(info, okm),
        ShaAlgorithm::SHA512 => hkdf::Hkdf::<Sha512>::new(Some(salt), ikm).expand(info, okm),
    };
    expanded.map_err(|_| Error::operation("HKDF output length is too large"))
}

fn checked_output_length(length: Option<u32>, name: &str) -> Result<usize> {
    let Some(length) = length else {
        return Err(Error::operation(
            [name, " requires an explicit output length"].concat(),
        ));
    };
    if length % 8 != 0 {
        return Err(Error::operation(
            [name, " output length must be a multiple of 8 bits"].concat(),
        ));
    }
    Ok(length as usize)
}

/// Truncates a shared secret to `length` bits, zeroing the unused low bits
/// of a partial trailing byte. `None` keeps the whole secret.
fn truncate_to_bits(mut secret: Vec<u8>, length: Option<u32>) -> Result<Vec<u8>> {
    let Some(length) = length else {
        return Ok(secret);
    };
    let length = length as usize;
    if length > secret.len() * 8 {
        return Err(Error::operation(
            "Requested length exceeds the derived secret",
        ));
    }
    secret.truncate(length.div_ceil(8));
    let partial_bits = length % 8;
    if partial_bits != 0 {
        if let Some(last) = secret.last_mut() {
            *last &= 0xFFu8 << (8 - partial_bits);
        }
    }
    Ok(secret)
}

fn ecdh_shared_secret(
    curve: EllipticCurve,
    private: &[u8],
    public: &[u8],
) -> Result<Vec<u8>> {
    let secret = match curve {
        EllipticCurve::P256 => {
            let secret = p256::SecretKey::from_slice(private)
                .map_err(|e| Error::operation(e.to_string()))?;
            let public = p256::PublicKey::from_sec1_bytes(public)
                .map_err(|e| Error::operation(e.to_string()))?;
            p256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine())
                .raw_secret_bytes()
                .to_vec()
        },
        EllipticCurve::P384 => {
            let secret = p384::SecretKey::from_slice(private)
                .map_err(|e| Error::operation(e.to_string()))?;
            let public = p384::PublicKey::from_sec1_bytes(public)
                .map_err(|e| Error::operation(e.to_string()))?;
            p384::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine())
                .raw_secret_bytes()
                .to_vec()
        },
        EllipticCurve::P521 => {
            let secret = p521::SecretKey::from_slice(private)
                .map_err(|e| Error::operation(e.to_string()))?;
            let public = p521::PublicKey::from_sec1_bytes(public)
                .map_err(|e| Error::operation(e.to_string()))?;
            p521::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine())
                .raw_secret_bytes()
                .to_vec()
        },
    };
    // An all-zero x-coordinate must not leak out as key material.
    if secret.iter().fold(0u8, |acc, b| acc | b) == 0 {
        return Err(Error::operation("ECDH produced a degenerate secret"));
    }
    Ok(secret)
}

fn x25519_shared_secret(private: &[u8], public: &[u8]) -> Result<Vec<u8>> {
    let private: [u8; 32] = private
        .try_into()
        .map_err(|_| Error::operation("Invalid X25519 private key"))?;
    let public: [u8; 32] = public
        .try_into()
        .map_err(|_| Error::operation("Invalid X25519 public key"))?;
    let secret = x25519_dalek::StaticSecret::from(private);
    let shared = secret.diffie_hellman(&x25519_dalek::PublicKey::from(public));
    // An all-zero secret means a low-order public key.
    if shared.as_bytes().iter().fold(0u8, |acc, b| acc | b) == 0 {
        return Err(Error::operation("X25519 produced a degenerate secret"));
    }
    Ok(shared.as_bytes().to_vec())
}

fn x448_shared_secret(private: &[u8], public: &[u8]) -> Result<Vec<u8>> {
    let secret = x448::Secret::from_bytes(private)
        .ok_or_else(|| Error::operation("Invalid X448 private key"))?;
    let public = x448::PublicKey::from_bytes(public)
        .ok_or_else(|| Error::operation("Invalid X448 public key"))?;
    let shared = secret
        .as_diffie_hellman(&public)
        .ok_or_else(|| Error::operation("X448 produced a degenerate secret"))?;
    Ok(shared.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use elliptic_curve::sec1::ToEncodedPoint;

    use super::*;
    use crate::error::ErrorKind;
    use crate::params::Params;
    use crate::subtle::key_usage::{DERIVE_BITS, DERIVE_KEY};
    use crate::subtle::EcAlgorithm;

    fn kdf_key(name: &str, algorithm: KeyAlgorithm, material: &[u8]) -> CryptoKey {
        CryptoKey::new(
            KeyKind::Secret,
            name,
            false,
            algorithm,
            DERIVE_BITS | DERIVE_KEY,
            material.to_vec(),
        )
    }

    fn ecdh_pair(usages: u8) -> (CryptoKey, Rc<CryptoKey>) {
        let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let point = secret.public_key().to_encoded_point(false);
        let algorithm = KeyAlgorithm::Ec {
            curve: EllipticCurve::P256,
            algorithm: EcAlgorithm::Ecdh,
        };
        let private = CryptoKey::new(
            KeyKind::Private,
            "ECDH",
            false,
            algorithm.clone(),
            usages,
            secret.to_bytes().to_vec(),
        );
        let public = Rc::new(CryptoKey::new(
            KeyKind::Public,
            "ECDH",
            true,
            algorithm,
            0,
            point.as_bytes().to_vec(),
        ));
        (private, public)
    }

    #[test]
    fn pbkdf2_sha1_known_answer() {
        // RFC 6070 test vector, c = 2
        let key = kdf_key("PBKDF2", KeyAlgorithm::Pbkdf2, b"password");
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "PBKDF2")
            .with("hash", "SHA-1")
            .with("salt", b"salt".to_vec())
            .with("iterations", 2u32)
            .into();
        let bits = derive_bits(&params, &key, Some(160)).unwrap();
        assert_eq!(
            bits,
            [
                0xea, 0x6c, 0x01, 0x4d, 0xc7, 0x2d, 0x6f, 0x8c, 0xcd, 0x1e, 0xd9, 0x2a, 0xce,
                0x1d, 0x41, 0xf0, 0xd8, 0xde, 0x89, 0x57
            ]
        );
    }

    #[test]
    fn hkdf_sha256_known_answer() {
        // RFC 5869 test case 1
        let key = kdf_key("HKDF", KeyAlgorithm::Hkdf, &[0x0b; 22]);
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "HKDF")
            .with("hash", "SHA-256")
            .with("salt", (0x00u8..=0x0c).collect::<Vec<u8>>())
            .with("info", (0xf0u8..=0xf9).collect::<Vec<u8>>())
            .into();
        let bits = derive_bits(&params, &key, Some(336)).unwrap();
        assert_eq!(
            bits,
            [
                0x3c, 0xb2, 0x5f, 0x25, 0xfa, 0xac, 0xd5, 0x7a, 0x90, 0x43, 0x4f, 0x64, 0xd0,
                0x36, 0x2f, 0x2a, 0x2d, 0x2d, 0x0a, 0x90, 0xcf, 0x1a, 0x5a, 0x4c, 0x5d, 0xb0,
                0x2d, 0x56, 0xec, 0xc4, 0xc5, 0xbf, 0x34, 0x00, 0x72, 0x08, 0xd5, 0xb8, 0x87,
                0x18, 0x58, 0x65
            ]
        );
    }

    #[test]
    fn kdf_length_must_be_whole_bytes() {
        let key = kdf_key("HKDF", KeyAlgorithm::Hkdf, &[1u8; 16]);
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "HKDF")
            .with("hash", "SHA-256")
            .with("salt", Vec::<u8>::new())
            .with("info", Vec::<u8>::new())
            .into();
        let err = derive_bits(&params, &key, Some(12)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
        let err = derive_bits(&params, &key, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }

    #[test]
    fn ecdh_null_length_yields_the_full_secret() {
        let (private, public) = ecdh_pair(DERIVE_BITS);
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "ECDH")
            .with("public", public)
            .into();
        let bits = derive_bits(&params, &private, None).unwrap();
        assert_eq!(bits.len(), 32);
    }

    #[test]
    fn ecdh_truncation_masks_partial_bytes() {
        let (private, public) = ecdh_pair(DERIVE_BITS);
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "ECDH")
            .with("public", public)
            .into();
        let full = derive_bits(&params, &private, None).unwrap();
        let bits = derive_bits(&params, &private, Some(12)).unwrap();
        assert_eq!(bits.len(), 2);
        assert_eq!(bits[0], full[0]);
        assert_eq!(bits[1], full[1] & 0xF0);
    }

    #[test]
    fn ecdh_all_zero_secret_is_rejected() {
        // P-256 has a point with x = 0; multiplying it by d = 1 keeps x = 0,
        // so the agreement would hand back 32 zero bytes.
        let mut compressed = vec![0x02u8];
        compressed.extend_from_slice(&[0u8; 32]);
        let point = p256::PublicKey::from_sec1_bytes(&compressed)
            .unwrap()
            .to_encoded_point(false);
        let mut scalar = [0u8; 32];
        scalar[31] = 1;

        let algorithm = KeyAlgorithm::Ec {
            curve: EllipticCurve::P256,
            algorithm: EcAlgorithm::Ecdh,
        };
        let private = CryptoKey::new(
            KeyKind::Private,
            "ECDH",
            false,
            algorithm.clone(),
            DERIVE_BITS,
            scalar.to_vec(),
        );
        let public = Rc::new(CryptoKey::new(
            KeyKind::Public,
            "ECDH",
            true,
            algorithm,
            0,
            point.as_bytes().to_vec(),
        ));
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "ECDH")
            .with("public", public)
            .into();
        let err = derive_bits(&params, &private, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }

    #[test]
    fn ecdh_excessive_length_is_rejected() {
        let (private, public) = ecdh_pair(DERIVE_BITS);
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "ECDH")
            .with("public", public)
            .into();
        let err = derive_bits(&params, &private, Some(512)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }

    #[test]
    fn x25519_rfc7748_vector() {
        use crate::subtle::OkpCurve;

        // RFC 7748 §6.1
        let alice_private = [
            0x77, 0x07, 0x6d, 0x0a, 0x73, 0x18, 0xa5, 0x7d, 0x3c, 0x16, 0xc1, 0x72, 0x51, 0xb2,
            0x66, 0x45, 0xdf, 0x4c, 0x2f, 0x87, 0xeb, 0xc0, 0x99, 0x2a, 0xb1, 0x77, 0xfb, 0xa5,
            0x1d, 0xb9, 0x2c, 0x2a,
        ];
        let bob_public = [
            0xde, 0x9e, 0xdb, 0x7d, 0x7b, 0x7d, 0xc1, 0xb4, 0xd3, 0x5b, 0x61, 0xc2, 0xec, 0xe4,
            0x35, 0x37, 0x3f, 0x83, 0x43, 0xc8, 0x5b, 0x78, 0x67, 0x4d, 0xad, 0xfc, 0x7e, 0x14,
            0x6f, 0x88, 0x2b, 0x4f,
        ];
        let shared = [
            0x4a, 0x5d, 0x9d, 0x5b, 0xa4, 0xce, 0x2d, 0xe1, 0x72, 0x8e, 0x3b, 0xf4, 0x80, 0x35,
            0x0f, 0x25, 0xe0, 0x7e, 0x21, 0xc9, 0x47, 0xd1, 0x9e, 0x33, 0x76, 0xf0, 0x9b, 0x3c,
            0x1e, 0x16, 0x17, 0x42,
        ];

        let private = CryptoKey::new(
            KeyKind::Private,
            "X25519",
            false,
            KeyAlgorithm::Okp {
                curve: OkpCurve::X25519,
            },
            DERIVE_BITS,
            alice_private.to_vec(),
        );
        let public = Rc::new(CryptoKey::new(
            KeyKind::Public,
            "X25519",
            true,
            KeyAlgorithm::Okp {
                curve: OkpCurve::X25519,
            },
            0,
            bob_public.to_vec(),
        ));
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "X25519")
            .with("public", public)
            .into();
        assert_eq!(derive_bits(&params, &private, None).unwrap(), shared);
    }

    #[test]
    fn derive_key_produces_a_usable_aes_key() {
        let key = kdf_key("PBKDF2", KeyAlgorithm::Pbkdf2, b"correct horse");
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "PBKDF2")
            .with("hash", "SHA-256")
            .with("salt", vec![1u8; 16])
            .with("iterations", 10u32)
            .into();
        let target: AlgorithmIdentifier = Params::new()
            .with("name", "AES-GCM")
            .with("length", 256u32)
            .into();
        let derived = derive_key(&params, &key, &target, true, &[KeyUsage::Encrypt]).unwrap();
        assert_eq!(derived.kind(), KeyKind::Secret);
        assert_eq!(derived.name(), "AES-GCM");
        assert_eq!(derived.handle().len(), 32);
    }

    #[test]
    fn derive_key_requires_usages() {
        let key = kdf_key("PBKDF2", KeyAlgorithm::Pbkdf2, b"pw");
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "PBKDF2")
            .with("hash", "SHA-256")
            .with("salt", vec![1u8; 16])
            .with("iterations", 10u32)
            .into();
        let target: AlgorithmIdentifier = Params::new()
            .with("name", "AES-GCM")
            .with("length", 128u32)
            .into();
        let err = derive_key(&params, &key, &target, false, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn get_key_length_for_each_family() {
        let aes: AlgorithmIdentifier = Params::new()
            .with("name", "AES-CBC")
            .with("length", 192u32)
            .into();
        assert_eq!(get_key_length(&aes).unwrap(), Some(192));

        let hmac: AlgorithmIdentifier = Params::new()
            .with("name", "HMAC")
            .with("hash", "SHA-512")
            .into();
        assert_eq!(get_key_length(&hmac).unwrap(), Some(1024));

        let hkdf: AlgorithmIdentifier = Params::new()
            .with("name", "HKDF")
            .with("hash", "SHA-256")
            .into();
        assert_eq!(get_key_length(&hkdf).unwrap(), None);
    }
}
