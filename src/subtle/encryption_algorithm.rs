// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use crate::error::{Error, Result};
use crate::params::{to_name_and_maybe_params, AlgorithmIdentifier};
use crate::subtle::{algorithm_not_supported_error, require_params};

/// Parsed parameters for the encrypt/decrypt (and key wrapping) operations.
#[derive(Debug)]
pub enum EncryptionAlgorithm {
    AesCbc {
        iv: Box<[u8]>,
    },
    AesCtr {
        counter: Box<[u8]>,
        length: u32,
    },
    AesGcm {
        iv: Box<[u8]>,
        tag_length: u8,
        additional_data: Option<Box<[u8]>>,
    },
    RsaOaep {
        label: Option<Box<[u8]>>,
    },
    AesKw,
}

impl EncryptionAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            EncryptionAlgorithm::AesCbc { .. } => "AES-CBC",
            EncryptionAlgorithm::AesCtr { .. } => "AES-CTR",
            EncryptionAlgorithm::AesGcm { .. } => "AES-GCM",
            EncryptionAlgorithm::RsaOaep { .. } => "RSA-OAEP",
            EncryptionAlgorithm::AesKw => "AES-KW",
        }
    }

    pub fn from_params(identifier: &AlgorithmIdentifier) -> Result<Self> {
        let (name, params) = to_name_and_maybe_params(identifier)?;

        Ok(match name.to_ascii_uppercase().as_str() {
            "AES-CBC" => {
                let params = require_params(params, "AES-CBC")?;
                let iv: Vec<u8> = params.get_required("iv")?;
                if iv.len() != 16 {
                    return Err(Error::operation("AES-CBC IV must be 16 bytes long"));
                }
                EncryptionAlgorithm::AesCbc {
                    iv: iv.into_boxed_slice(),
                }
            },
            "AES-CTR" => {
                let params = require_params(params, "AES-CTR")?;
                let counter: Vec<u8> = params.get_required("counter")?;
                if counter.len() != 16 {
                    return Err(Error::operation("AES-CTR counter must be 16 bytes long"));
                }
                let length: u32 = params.get_required("length")?;
                if length == 0 || length > 128 {
                    return Err(Error::operation(
                        "AES-CTR counter length must be between 1 and 128 bits",
                    ));
                }
                EncryptionAlgorithm::AesCtr {
                    counter: counter.into_boxed_slice(),
                    length,
                }
            },
            "AES-GCM" => {
                let params = require_params(params, "AES-GCM")?;
                let iv: Vec<u8> = params.get_required("iv")?;
                if iv.is_empty() {
                    return Err(Error::operation("AES-GCM IV must not be empty"));
                }
                if iv.len() != 12 {
                    return Err(Error::not_supported(
                        "AES-GCM only supports a 96-bit IV",
                    ));
                }

                let additional_data: Option<Vec<u8>> = params.get_optional("additionalData")?;
                let tag_length: u8 = params.get_optional("tagLength")?.unwrap_or(128);
                if !matches!(tag_length, 32 | 64 | 96 | 104 | 112 | 120 | 128) {
                    return Err(Error::operation(
                        "AES-GCM tagLength must be one of 32, 64, 96, 104, 112, 120 or 128",
                    ));
                }

                EncryptionAlgorithm::AesGcm {
                    iv: iv.into_boxed_slice(),
                    tag_length,
                    additional_data: additional_data.map(Vec::into_boxed_slice),
                }
            },
            "RSA-OAEP" => {
                let label: Option<Vec<u8>> = match params {
                    Some(params) => params.get_optional("label")?,
                    None => None,
                };
                EncryptionAlgorithm::RsaOaep {
                    label: label.map(Vec::into_boxed_slice),
                }
            },
            "AES-KW" => EncryptionAlgorithm::AesKw,
            _ => return algorithm_not_supported_error(&name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::params::Params;

    #[test]
    fn cbc_iv_must_be_a_full_block() {
        let err = EncryptionAlgorithm::from_params(
            &Params::new()
                .with("name", "AES-CBC")
                .with("iv", vec![0u8; 15])
                .into(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }

    #[test]
    fn ctr_length_bounds() {
        for (length, ok) in [(0u32, false), (1, true), (64, true), (128, true), (129, false)] {
            let result = EncryptionAlgorithm::from_params(
                &Params::new()
                    .with("name", "AES-CTR")
                    .with("counter", vec![0u8; 16])
                    .with("length", length)
                    .into(),
            );
            assert_eq!(result.is_ok(), ok, "length {}", length);
        }
    }

    #[test]
    fn gcm_tag_length_defaults_to_128() {
        let algorithm = EncryptionAlgorithm::from_params(
            &Params::new()
                .with("name", "AES-GCM")
                .with("iv", vec![0u8; 12])
                .into(),
        )
        .unwrap();
        match algorithm {
            EncryptionAlgorithm::AesGcm { tag_length, .. } => assert_eq!(tag_length, 128),
            other => panic!("unexpected algorithm: {:?}", other),
        }
    }

    #[test]
    fn gcm_rejects_invalid_tag_length() {
        let err = EncryptionAlgorithm::from_params(
            &Params::new()
                .with("name", "AES-GCM")
                .with("iv", vec![0u8; 12])
                .with("tagLength", 100u32)
                .into(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }

    #[test]
    fn oaep_label_is_optional() {
        let algorithm = EncryptionAlgorithm::from_params(&"RSA-OAEP".into()).unwrap();
        assert!(matches!(
            algorithm,
            EncryptionAlgorithm::RsaOaep { label: None }
        ));
    }
}
