// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::rc::Rc;

use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::subtle::key_algorithm::KeyAlgorithm;
use crate::subtle::key_usage::KeyUsage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Secret,
    Public,
    Private,
}

impl KeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::Secret => "secret",
            KeyKind::Public => "public",
            KeyKind::Private => "private",
        }
    }
}

/// A handle to key material plus the metadata fixed at creation time.
///
/// The handle holds the material in the internal form each algorithm family
/// settles on at import/generate time: raw bytes for symmetric and OKP keys,
/// PKCS#1 DER for RSA halves, an uncompressed SEC1 point for EC public keys
/// and the raw scalar for EC private keys. The buffer is wiped on drop.
#[derive(Debug)]
pub struct CryptoKey {
    kind: KeyKind,
    extractable: bool,
    name: Box<str>,
    algorithm: KeyAlgorithm,
    usages_mask: u8,
    handle: Zeroizing<Vec<u8>>,
}

impl CryptoKey {
    pub fn new(
        kind: KeyKind,
        name: impl Into<Box<str>>,
        extractable: bool,
        algorithm: KeyAlgorithm,
        usages_mask: u8,
        handle: Vec<u8>,
    ) -> Self {
        Self {
            kind,
            extractable,
            name: name.into(),
            algorithm,
            usages_mask,
            handle: Zeroizing::new(handle),
        }
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn extractable(&self) -> bool {
        self.extractable
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn algorithm(&self) -> &KeyAlgorithm {
        &self.algorithm
    }

    /// The recognized usages, in canonical order.
    pub fn usages(&self) -> Vec<KeyUsage> {
        KeyUsage::from_mask(self.usages_mask)
    }

    pub fn usages_mask(&self) -> u8 {
        self.usages_mask
    }

    pub fn handle(&self) -> &[u8] {
        &self.handle
    }

    /// Gate used by every keyed operation: the key must carry the usage and
    /// its algorithm name must match the requested one.
    pub fn check_validity(&self, algorithm_name: &str, usage: KeyUsage) -> Result<()> {
        if !self.name.eq_ignore_ascii_case(algorithm_name) {
            return Err(Error::invalid_access(
                [
                    "Key algorithm '",
                    &self.name,
                    "' does not match requested algorithm '",
                    algorithm_name,
                    "'",
                ]
                .concat(),
            ));
        }
        if self.usages_mask & usage.mask() == 0 {
            return Err(Error::invalid_access(
                [
                    "The key does not support the '",
                    usage.as_str(),
                    "' operation",
                ]
                .concat(),
            ));
        }
        Ok(())
    }

    /// Keyed operations also constrain which half of a pair they accept:
    /// encrypt/verify/wrapKey want a public or secret key, the rest the
    /// private or secret one.
    pub fn check_kind(&self, expected: &[KeyKind]) -> Result<()> {
        if !expected.contains(&self.kind) {
            return Err(Error::invalid_access(
                [
                    "The operation is not valid for a ",
                    self.kind.as_str(),
                    " key",
                ]
                .concat(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CryptoKeyPair {
    pub public_key: Rc<CryptoKey>,
    pub private_key: Rc<CryptoKey>,
}

/// What `generate_key` hands back: a single key for symmetric algorithms, a
/// pair for asymmetric ones.
#[derive(Debug, Clone)]
pub enum KeyOrPair {
    Key(Rc<CryptoKey>),
    Pair(CryptoKeyPair),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::subtle::key_usage;

    fn test_key(usages_mask: u8) -> CryptoKey {
        CryptoKey::new(
            KeyKind::Secret,
            "AES-GCM",
            true,
            KeyAlgorithm::Aes { length: 128 },
            usages_mask,
            vec![0u8; 16],
        )
    }

    #[test]
    fn usage_gate() {
        let key = test_key(key_usage::ENCRYPT);
        assert!(key.check_validity("AES-GCM", KeyUsage::Encrypt).is_ok());
        let err = key.check_validity("AES-GCM", KeyUsage::Decrypt).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccess);
    }

    #[test]
    fn algorithm_name_gate_is_case_insensitive() {
        let key = test_key(key_usage::ENCRYPT);
        assert!(key.check_validity("aes-gcm", KeyUsage::Encrypt).is_ok());
        let err = key.check_validity("AES-CBC", KeyUsage::Encrypt).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccess);
    }

    #[test]
    fn usages_are_canonically_ordered() {
        let key = test_key(key_usage::UNWRAP_KEY | key_usage::DECRYPT | key_usage::ENCRYPT);
        assert_eq!(
            key.usages(),
            vec![KeyUsage::Encrypt, KeyUsage::Decrypt, KeyUsage::UnwrapKey]
        );
    }

    #[test]
    fn kind_gate() {
        let key = test_key(key_usage::ENCRYPT);
        assert!(key.check_kind(&[KeyKind::Secret, KeyKind::Public]).is_ok());
        let err = key.check_kind(&[KeyKind::Private]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccess);
    }
}
