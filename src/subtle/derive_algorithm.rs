// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::params::{to_name_and_maybe_params, AlgorithmIdentifier};
use crate::sha_hash::ShaAlgorithm;
use crate::subtle::crypto_key::CryptoKey;
use crate::subtle::key_algorithm::extract_sha_hash;
use crate::subtle::{algorithm_not_supported_error, require_params};

/// Parsed parameters for the deriveBits/deriveKey operations.
#[derive(Debug)]
pub enum DeriveAlgorithm {
    /// ECDH and the X25519/X448 functions: the peer's public key comes in as
    /// a parameter, the local private key is the operation's base key.
    DiffieHellman {
        name: String,
        public: Rc<CryptoKey>,
    },
    Hkdf {
        hash: ShaAlgorithm,
        salt: Box<[u8]>,
        info: Box<[u8]>,
    },
    Pbkdf2 {
        hash: ShaAlgorithm,
        salt: Box<[u8]>,
        iterations: u32,
    },
}

impl DeriveAlgorithm {
    pub fn name(&self) -> &str {
        match self {
            DeriveAlgorithm::DiffieHellman { name, .. } => name,
            DeriveAlgorithm::Hkdf { .. } => "HKDF",
            DeriveAlgorithm::Pbkdf2 { .. } => "PBKDF2",
        }
    }

    pub fn from_params(identifier: &AlgorithmIdentifier) -> Result<Self> {
        let (name, params) = to_name_and_maybe_params(identifier)?;

        Ok(match name.to_ascii_uppercase().as_str() {
            "ECDH" | "X25519" | "X448" => {
                let canonical = match name.to_ascii_uppercase().as_str() {
                    "ECDH" => "ECDH",
                    "X25519" => "X25519",
                    _ => "X448",
                };
                let params = require_params(params, canonical)?;
                let public: Rc<CryptoKey> = params.get_required("public")?;
                DeriveAlgorithm::DiffieHellman {
                    name: canonical.to_string(),
                    public,
                }
            },
            "HKDF" => {
                let params = require_params(params, "HKDF")?;
                let hash = extract_sha_hash(params)?;
                let salt: Vec<u8> = params.get_required("salt")?;
                let info: Vec<u8> = params.get_required("info")?;
                DeriveAlgorithm::Hkdf {
                    hash,
                    salt: salt.into_boxed_slice(),
                    info: info.into_boxed_slice(),
                }
            },
            "PBKDF2" => {
                let params = require_params(params, "PBKDF2")?;
                let hash = extract_sha_hash(params)?;
                let salt: Vec<u8> = params.get_required("salt")?;
                let iterations: u32 = params.get_required("iterations")?;
                if iterations == 0 {
                    return Err(Error::operation("PBKDF2 iterations must not be zero"));
                }
                DeriveAlgorithm::Pbkdf2 {
                    hash,
                    salt: salt.into_boxed_slice(),
                    iterations,
                }
            },
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
    fn pbkdf2_rejects_zero_iterations() {
        let err = DeriveAlgorithm::from_params(
            &Params::new()
                .with("name", "PBKDF2")
                .with("hash", "SHA-256")
                .with("salt", vec![1u8; 8])
                .with("iterations", 0u32)
                .into(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }

    #[test]
    fn hkdf_requires_salt_and_info() {
        let err = DeriveAlgorithm::from_params(
            &Params::new()
                .with("name", "HKDF")
                .with("hash", "SHA-256")
                .with("salt", vec![1u8; 8])
                .into(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }
}
