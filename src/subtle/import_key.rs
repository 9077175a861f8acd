// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::params::{to_name_and_maybe_params, AlgorithmIdentifier};
use crate::subtle::crypto_key::{CryptoKey, KeyKind};
use crate::subtle::key_algorithm::{
    KeyAlgorithm, KeyAlgorithmMode, KeyAlgorithmWithUsages, KeyFormatData,
};
use crate::subtle::key_usage::{validate_jwk_key_ops, KeyUsage};

pub fn import_key(
    format: KeyFormatData,
    algorithm: &AlgorithmIdentifier,
    extractable: bool,
    usages: &[KeyUsage],
) -> Result<Rc<CryptoKey>> {
    if let KeyFormatData::Jwk(jwk) = &format {
        validate_jwk_key_ops(jwk, usages)?;
        if jwk.ext == Some(false) && extractable {
            return Err(Error::data(
                "JWK marks the key as not extractable",
            ));
        }
        check_jwk_use(jwk.use_.as_deref(), algorithm, usages)?;
    }

    let mut kind = KeyKind::Secret;
    let mut data = Vec::new();
    let KeyAlgorithmWithUsages {
        name,
        algorithm: key_algorithm,
        public_usages,
        private_usages,
    } = KeyAlgorithm::from_params(
        KeyAlgorithmMode::Import {
            format,
            kind: &mut kind,
            data: &mut data,
        },
        algorithm,
        usages,
    )?;

    if usages.is_empty() && kind != KeyKind::Public {
        return Err(Error::syntax(
            ["Usages must not be empty for a ", kind.as_str(), " key"].concat(),
        ));
    }
    if matches!(key_algorithm, KeyAlgorithm::Hkdf | KeyAlgorithm::Pbkdf2) && extractable {
        return Err(Error::syntax(
            [&name, " keys must not be extractable"].concat(),
        ));
    }

    Ok(Rc::new(CryptoKey::new(
        kind,
        name,
        extractable,
        key_algorithm,
        public_usages | private_usages,
        data,
    )))
}

/// Cross-checks the JWK `use` member against the algorithm family. Signature
/// algorithms expect `sig`, everything else `enc`. The member is only
/// enforced when usages were requested, matching how `key_ops` is handled.
fn check_jwk_use(
    use_: Option<&str>,
    algorithm: &AlgorithmIdentifier,
    usages: &[KeyUsage],
) -> Result<()> {
    let (Some(use_), false) = (use_, usages.is_empty()) else {
        return Ok(());
    };
    let (name, _) = to_name_and_maybe_params(algorithm)?;
    let expected = match name.to_ascii_uppercase().as_str() {
        "HMAC" | "ECDSA" | "ED25519" | "ED448" | "RSA-PSS" | "RSASSA-PKCS1-V1_5" => "sig",
        _ => "enc",
    };
    if use_ != expected {
        return Err(Error::data(
            ["JWK 'use' must be '", expected, "' for the ", &name, " algorithm"].concat(),
        ));
    }
    Ok(())
}
