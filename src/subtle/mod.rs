// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The SubtleCrypto operation set: algorithm dispatch, key-material model
//! and the import/export codecs.

mod aes_variants;
mod crypto_key;
mod derive;
mod derive_algorithm;
mod encryption;
mod encryption_algorithm;
mod export_key;
mod generate_key;
mod import_key;
mod jwk;
mod key_algorithm;
mod key_usage;
mod sign;
mod sign_algorithm;
mod verify;
mod wrapping;

pub use crypto_key::{CryptoKey, CryptoKeyPair, KeyKind, KeyOrPair};
pub use derive::{derive_bits, derive_key, get_key_length};
pub use derive_algorithm::DeriveAlgorithm;
pub use encryption::{decrypt, encrypt};
pub use encryption_algorithm::EncryptionAlgorithm;
pub use export_key::{export_key, ExportOutput};
pub use generate_key::generate_key;
pub use import_key::import_key;
pub use jwk::{JsonWebKey, RsaOtherPrimesInfo};
pub use key_algorithm::{
    EcAlgorithm, KeyAlgorithm, KeyFormat, KeyFormatData, KeyAlgorithmMode,
};
pub use key_usage::{usage_intersection, validate_jwk_key_ops, KeyUsage};
pub use sign::sign;
pub use sign_algorithm::SigningAlgorithm;
pub use verify::verify;
pub use wrapping::{unwrap_key, wrap_key};

use crate::error::{Error, Result};
use crate::params::Params;
use crate::sha_hash::ShaAlgorithm;

/// Whether a cipher invocation encrypts payload data or wraps key material.
/// Wrapping carries the padding byte used for JWK-serialized keys.
pub(crate) enum EncryptionMode {
    Encryption,
    Wrapping(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EllipticCurve {
    P256,
    P384,
    P521,
}

impl EllipticCurve {
    pub fn as_str(&self) -> &'static str {
        match self {
            EllipticCurve::P256 => "P-256",
            EllipticCurve::P384 => "P-384",
            EllipticCurve::P521 => "P-521",
        }
    }

    /// Coordinate width in bytes.
    pub fn field_size(&self) -> usize {
        match self {
            EllipticCurve::P256 => 32,
            EllipticCurve::P384 => 48,
            EllipticCurve::P521 => 66,
        }
    }

    pub fn oid(&self) -> const_oid::ObjectIdentifier {
        match self {
            EllipticCurve::P256 => const_oid::db::rfc5912::SECP_256_R_1,
            EllipticCurve::P384 => const_oid::db::rfc5912::SECP_384_R_1,
            EllipticCurve::P521 => const_oid::db::rfc5912::SECP_521_R_1,
        }
    }
}

impl TryFrom<&str> for EllipticCurve {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Ok(match s {
            "P-256" => EllipticCurve::P256,
            "P-384" => EllipticCurve::P384,
            "P-521" => EllipticCurve::P521,
            _ => {
                return Err(Error::not_supported(
                    ["Curve '", s, "' is not supported"].concat(),
                ))
            },
        })
    }
}

impl AsRef<str> for EllipticCurve {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// RFC 8410 curves. The name doubles as the algorithm name and the JWK `crv`
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OkpCurve {
    Ed25519,
    Ed448,
    X25519,
    X448,
}

impl OkpCurve {
    pub fn as_str(&self) -> &'static str {
        match self {
            OkpCurve::Ed25519 => "Ed25519",
            OkpCurve::Ed448 => "Ed448",
            OkpCurve::X25519 => "X25519",
            OkpCurve::X448 => "X448",
        }
    }

    pub fn oid(&self) -> const_oid::ObjectIdentifier {
        match self {
            OkpCurve::Ed25519 => const_oid::db::rfc8410::ID_ED_25519,
            OkpCurve::Ed448 => const_oid::db::rfc8410::ID_ED_448,
            OkpCurve::X25519 => const_oid::db::rfc8410::ID_X_25519,
            OkpCurve::X448 => const_oid::db::rfc8410::ID_X_448,
        }
    }

    pub fn public_key_len(&self) -> usize {
        match self {
            OkpCurve::Ed25519 | OkpCurve::X25519 => 32,
            OkpCurve::X448 => 56,
            OkpCurve::Ed448 => 57,
        }
    }

    pub fn private_key_len(&self) -> usize {
        match self {
            OkpCurve::Ed25519 | OkpCurve::X25519 => 32,
            OkpCurve::X448 => 56,
            OkpCurve::Ed448 => 57,
        }
    }

    pub fn is_signature(&self) -> bool {
        matches!(self, OkpCurve::Ed25519 | OkpCurve::Ed448)
    }
}

impl AsRef<str> for OkpCurve {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

pub(crate) fn require_params<'a>(params: Option<&'a Params>, name: &str) -> Result<&'a Params> {
    params.ok_or_else(|| {
        Error::type_error(["The ", name, " algorithm requires a parameter object"].concat())
    })
}

pub(crate) fn algorithm_mismatch_error<T>(algorithm_name: &str) -> Result<T> {
    Err(Error::data(
        ["Key data does not match the ", algorithm_name, " algorithm"].concat(),
    ))
}

pub(crate) fn algorithm_not_supported_error<T>(algorithm_name: &str) -> Result<T> {
    Err(Error::not_supported(
        ["Algorithm '", algorithm_name, "' is not supported"].concat(),
    ))
}

pub(crate) fn hash_mismatch_error<T>(hash: &ShaAlgorithm) -> Result<T> {
    Err(Error::data(
        ["Key hash is expected to be ", hash.as_str()].concat(),
    ))
}

/// Returns the AES key size in bits after checking the key belongs to an AES
/// algorithm and its material matches the declared size.
pub(crate) fn aes_key_length(key: &CryptoKey, algorithm_name: &str) -> Result<u16> {
    match key.algorithm() {
        KeyAlgorithm::Aes { length } => {
            if key.handle().len() * 8 != *length as usize {
                return Err(Error::operation(
                    "AES key material does not match its declared length",
                ));
            }
            Ok(*length)
        },
        _ => algorithm_mismatch_error(algorithm_name),
    }
}
