// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::borrow::Cow;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::{Error, Result};
use crate::params::AlgorithmIdentifier;
use crate::sha_hash::ShaAlgorithm;
use crate::subtle::aes_variants::{
    AesCbcDecVariant, AesCbcEncVariant, AesCtrVariant, AesGcmVariant,
};
use crate::subtle::crypto_key::{CryptoKey, KeyKind};
use crate::subtle::encryption_algorithm::EncryptionAlgorithm;
use crate::subtle::key_algorithm::KeyAlgorithm;
use crate::subtle::key_usage::KeyUsage;
use crate::subtle::{aes_key_length, algorithm_mismatch_error, EncryptionMode};

// GCM caps a single message at 2^39 - 256 bytes.
const MAX_GCM_PLAINTEXT_LEN: u64 = (1u64 << 39) - 256;

pub fn encrypt(
    algorithm: &AlgorithmIdentifier,
    key: &CryptoKey,
    data: &[u8],
) -> Result<Vec<u8>> {
    let algorithm = EncryptionAlgorithm::from_params(algorithm)?;
    key.check_validity(algorithm.name(), KeyUsage::Encrypt)?;
    key.check_kind(&[KeyKind::Secret, KeyKind::Public])?;
    encrypt_decrypt(
        &algorithm,
        key,
        data,
        EncryptionMode::Encryption,
        EncryptionOperation::Encrypt,
    )
}

pub fn decrypt(
    algorithm: &AlgorithmIdentifier,
    key: &CryptoKey,
    data: &[u8],
) -> Result<Vec<u8>> {
    let algorithm = EncryptionAlgorithm::from_params(algorithm)?;
    key.check_validity(algorithm.name(), KeyUsage::Decrypt)?;
    key.check_kind(&[KeyKind::Secret, KeyKind::Private])?;
    encrypt_decrypt(
        &algorithm,
        key,
        data,
        EncryptionMode::Encryption,
        EncryptionOperation::Decrypt,
    )
}

pub(crate) enum EncryptionOperation {
    Encrypt,
    Decrypt,
}

pub(crate) fn encrypt_decrypt(
    algorithm: &EncryptionAlgorithm,
    key: &CryptoKey,
    data: &[u8],
    mode: EncryptionMode,
    operation: EncryptionOperation,
) -> Result<Vec<u8>> {
    let handle = key.handle();
    let bytes = match algorithm {
        EncryptionAlgorithm::AesCbc { iv } => {
            let length = aes_key_length(key, "AES-CBC")?;
            match operation {
                EncryptionOperation::Encrypt => AesCbcEncVariant::new(length, handle, iv)
                    .map_err(|_| Error::operation("Invalid AES-CBC key or IV"))?
                    .encrypt(data),
                EncryptionOperation::Decrypt => {
                    if data.is_empty() || data.len() % 16 != 0 {
                        return Err(Error::operation(
                            "AES-CBC ciphertext length must be a non-zero multiple of 16",
                        ));
                    }
                    AesCbcDecVariant::new(length, handle, iv)
                        .map_err(|_| Error::operation("Invalid AES-CBC key or IV"))?
                        .decrypt(data)
                        .map_err(|_| Error::operation("Invalid AES-CBC padding"))?
                },
            }
        },
        EncryptionAlgorithm::AesCtr { counter, length: counter_length } => {
            let length = aes_key_length(key, "AES-CTR")?;
            if !matches!(*counter_length, 32 | 64 | 128) {
                return Err(Error::not_supported(
                    "Only 32, 64 and 128 bit AES-CTR counter lengths are supported",
                ));
            }
            let mut variant = AesCtrVariant::new(length, *counter_length, handle, counter)
                .map_err(|_| Error::operation("Invalid AES-CTR key or counter"))?;
            variant
                .apply_keystream(data)
                .map_err(|_| Error::operation("AES-CTR counter overflow"))?
        },
        EncryptionAlgorithm::AesGcm {
            iv,
            tag_length,
            additional_data,
        } => {
            let length = aes_key_length(key, "AES-GCM")?;
            if !matches!(*tag_length, 96 | 104 | 112 | 120 | 128) {
                return Err(Error::not_supported(
                    "Only 96 to 128 bit AES-GCM tag lengths are supported",
                ));
            }
            let variant = AesGcmVariant::new(length, *tag_length, handle)
                .map_err(|_| Error::operation("Invalid AES-GCM key"))?;
            let aad = additional_data.as_deref();

            match operation {
                EncryptionOperation::Encrypt => {
                    if data.len() as u64 > MAX_GCM_PLAINTEXT_LEN {
                        return Err(Error::operation("AES-GCM plaintext is too large"));
                    }
                    variant
                        .encrypt(iv, data, aad)
                        .map_err(|_| Error::operation("AES-GCM encryption failed"))?
                },
                EncryptionOperation::Decrypt => {
                    if data.len() < *tag_length as usize / 8 {
                        return Err(Error::operation(
                            "AES-GCM ciphertext is shorter than the tag",
                        ));
                    }
                    variant
                        .decrypt(iv, data, aad)
                        .map_err(|_| Error::operation("AES-GCM authentication failed"))?
                },
            }
        },
        EncryptionAlgorithm::AesKw => {
            let padding = match mode {
                EncryptionMode::Encryption => {
                    return Err(Error::invalid_access(
                        "AES-KW can only be used to wrap and unwrap keys",
                    ));
                },
                EncryptionMode::Wrapping(padding) => padding,
            };
            aes_key_length(key, "AES-KW")?;

            match operation {
                EncryptionOperation::Encrypt => {
                    let padded = if data.len() % 8 != 0 {
                        if padding == 0 {
                            return Err(Error::operation(
                                "AES-KW input must be a multiple of 8 bytes",
                            ));
                        }
                        let mut padded = data.to_vec();
                        padded.resize(data.len() + 8 - data.len() % 8, padding);
                        Cow::Owned(padded)
                    } else {
                        Cow::Borrowed(data)
                    };
                    aes_kw_wrap(handle, &padded)?
                },
                EncryptionOperation::Decrypt => {
                    let unwrapped = aes_kw_unwrap(handle, data)?;
                    if padding != 0 {
                        let trimmed_len = unwrapped
                            .iter()
                            .rposition(|&b| b != padding)
                            .map_or(0, |pos| pos + 1);
                        let mut unwrapped = unwrapped;
                        unwrapped.truncate(trimmed_len);
                        unwrapped
                    } else {
                        unwrapped
                    }
                },
            }
        },
        EncryptionAlgorithm::RsaOaep { label } => {
            let hash = match key.algorithm() {
                KeyAlgorithm::Rsa { hash, .. } => *hash,
                _ => return algorithm_mismatch_error("RSA-OAEP"),
            };
            // The rsa crate models the OAEP label as a string.
            let label = label
                .as_deref()
                .map(|bytes| {
                    std::str::from_utf8(bytes)
                        .map(str::to_string)
                        .map_err(|_| Error::operation("RSA-OAEP label must be valid UTF-8"))
                })
                .transpose()?;
            let padding = oaep_padding(hash, label);

            match operation {
                EncryptionOperation::Encrypt => {
                    let public_key = RsaPublicKey::from_pkcs1_der(handle)
                        .map_err(|e| Error::operation(e.to_string()))?;
                    public_key
                        .encrypt(&mut OsRng, padding, data)
                        .map_err(|e| Error::operation(e.to_string()))?
                },
                EncryptionOperation::Decrypt => {
                    let private_key = RsaPrivateKey::from_pkcs1_der(handle)
                        .map_err(|e| Error::operation(e.to_string()))?;
                    private_key
                        .decrypt(padding, data)
                        .map_err(|e| Error::operation(e.to_string()))?
                },
            }
        },
    };
    Ok(bytes)
}

fn oaep_padding(hash: ShaAlgorithm, label: Option<String>) -> Oaep {
    match (hash, label) {
        (ShaAlgorithm::SHA1, None) => Oaep::new::<Sha1>(),
        (ShaAlgorithm::SHA1, Some(label)) => Oaep::new_with_label::<Sha1, _>(label),
        (ShaAlgorithm::SHA256, None) => Oaep::new::<Sha256>(),
        (ShaAlgorithm::SHA256, Some(label)) => Oaep::new_with_label::<Sha256, _>(label),
        (ShaAlgorithm::SHA384, None) => Oaep::new::<Sha384>(),
        (ShaAlgorithm::SHA384, Some(label)) => Oaep::new_with_label::<Sha384, _>(label),
        (ShaAlgorithm::SHA512, None) => Oaep::new::<Sha512>(),
        (ShaAlgorithm::SHA512, Some(label)) => Oaep::new_with_label::<Sha512, _>(label),
    }
}

fn aes_kw_wrap(handle: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    match handle.len() {
        16 => aes_kw::KekAes128::try_from(handle)
            .map_err(|_| Error::operation("Invalid AES-KW key"))?
            .wrap_vec(data)
            .map_err(|_| Error::operation("AES-KW wrapping failed")),
        24 => aes_kw::KekAes192::try_from(handle)
            .map_err(|_| Error::operation("Invalid AES-KW key"))?
            .wrap_vec(data)
            .map_err(|_| Error::operation("AES-KW wrapping failed")),
        32 => aes_kw::KekAes256::try_from(handle)
            .map_err(|_| Error::operation("Invalid AES-KW key"))?
            .wrap_vec(data)
            .map_err(|_| Error::operation("AES-KW wrapping failed")),
        _ => Err(Error::operation("Invalid AES-KW key length")),
    }
}

fn aes_kw_unwrap(handle: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    match handle.len() {
        16 => aes_kw::KekAes128::try_from(handle)
            .map_err(|_| Error::operation("Invalid AES-KW key"))?
            .unwrap_vec(data)
            .map_err(|_| Error::operation("AES-KW unwrapping failed")),
        24 => aes_kw::KekAes192::try_from(handle)
            .map_err(|_| Error::operation("Invalid AES-KW key"))?
            .unwrap_vec(data)
            .map_err(|_| Error::operation("AES-KW unwrapping failed")),
        32 => aes_kw::KekAes256::try_from(handle)
            .map_err(|_| Error::operation("Invalid AES-KW key"))?
            .unwrap_vec(data)
            .map_err(|_| Error::operation("AES-KW unwrapping failed")),
        _ => Err(Error::operation("Invalid AES-KW key length")),
    }
}
