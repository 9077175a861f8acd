// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use crate::error::{Error, Result};
use crate::params::{to_name_and_maybe_params, AlgorithmIdentifier};
use crate::sha_hash::ShaAlgorithm;
use crate::subtle::key_algorithm::extract_sha_hash;
use crate::subtle::{algorithm_not_supported_error, require_params};

/// Parsed parameters for the sign and verify operations.
#[derive(Debug)]
pub enum SigningAlgorithm {
    Ecdsa {
        hash: ShaAlgorithm,
    },
    Ed25519,
    Ed448 {
        context: Option<Box<[u8]>>,
    },
    Hmac,
    RsaPss {
        salt_length: u32,
    },
    RsassaPkcs1v15,
}

impl SigningAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SigningAlgorithm::Ecdsa { .. } => "ECDSA",
            SigningAlgorithm::Ed25519 => "Ed25519",
            SigningAlgorithm::Ed448 { .. } => "Ed448",
            SigningAlgorithm::Hmac => "HMAC",
            SigningAlgorithm::RsaPss { .. } => "RSA-PSS",
            SigningAlgorithm::RsassaPkcs1v15 => "RSASSA-PKCS1-v1_5",
        }
    }

    pub fn from_params(identifier: &AlgorithmIdentifier) -> Result<Self> {
        let (name, params) = to_name_and_maybe_params(identifier)?;

        Ok(match name.to_ascii_uppercase().as_str() {
            "ECDSA" => {
                let params = require_params(params, "ECDSA")?;
                let hash = extract_sha_hash(params)?;
                SigningAlgorithm::Ecdsa { hash }
            },
            "ED25519" => SigningAlgorithm::Ed25519,
            "ED448" => {
                let context: Option<Vec<u8>> = match params {
                    Some(params) => params.get_optional("context")?,
                    None => None,
                };
                if let Some(context) = &context {
                    if context.len() > 255 {
                        return Err(Error::operation(
                            "Ed448 context must not exceed 255 bytes",
                        ));
                    }
                }
                SigningAlgorithm::Ed448 {
                    context: context.map(Vec::into_boxed_slice),
                }
            },
            "HMAC" => SigningAlgorithm::Hmac,
            "RSA-PSS" => {
                let params = require_params(params, "RSA-PSS")?;
                let salt_length: u32 = params.get_required("saltLength")?;
                SigningAlgorithm::RsaPss { salt_length }
            },
            "RSASSA-PKCS1-V1_5" => SigningAlgorithm::RsassaPkcs1v15,
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
    fn ecdsa_requires_hash() {
        let err = SigningAlgorithm::from_params(
            &Params::new().with("name", "ECDSA").into(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        let algorithm = SigningAlgorithm::from_params(
            &Params::new()
                .with("name", "ECDSA")
                .with("hash", "SHA-384")
                .into(),
        )
        .unwrap();
        assert!(matches!(
            algorithm,
            SigningAlgorithm::Ecdsa {
                hash: ShaAlgorithm::SHA384
            }
        ));
    }

    #[test]
    fn ed448_context_limit() {
        let err = SigningAlgorithm::from_params(
            &Params::new()
                .with("name", "Ed448")
                .with("context", vec![0u8; 256])
                .into(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }

    #[test]
    fn bare_names_parse() {
        assert!(matches!(
            SigningAlgorithm::from_params(&"Ed25519".into()).unwrap(),
            SigningAlgorithm::Ed25519
        ));
        assert!(matches!(
            SigningAlgorithm::from_params(&"hmac".into()).unwrap(),
            SigningAlgorithm::Hmac
        ));
    }
}
