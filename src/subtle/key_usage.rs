// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use crate::error::{Error, Result};
use crate::subtle::jwk::JsonWebKey;

/// Recognized key usages, in the canonical order used by
/// [`usage_intersection`] and exported key `key_ops`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    DeriveKey,
    DeriveBits,
    WrapKey,
    UnwrapKey,
}

pub const ENCRYPT: u8 = 1 << 0;
pub const DECRYPT: u8 = 1 << 1;
pub const SIGN: u8 = 1 << 2;
pub const VERIFY: u8 = 1 << 3;
pub const DERIVE_KEY: u8 = 1 << 4;
pub const DERIVE_BITS: u8 = 1 << 5;
pub const WRAP_KEY: u8 = 1 << 6;
pub const UNWRAP_KEY: u8 = 1 << 7;

pub const NO_USAGES: u8 = 0;

impl KeyUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyUsage::Encrypt => "encrypt",
            KeyUsage::Decrypt => "decrypt",
            KeyUsage::Sign => "sign",
            KeyUsage::Verify => "verify",
            KeyUsage::DeriveKey => "deriveKey",
            KeyUsage::DeriveBits => "deriveBits",
            KeyUsage::WrapKey => "wrapKey",
            KeyUsage::UnwrapKey => "unwrapKey",
        }
    }

    pub fn mask(&self) -> u8 {
        match self {
            KeyUsage::Encrypt => ENCRYPT,
            KeyUsage::Decrypt => DECRYPT,
            KeyUsage::Sign => SIGN,
            KeyUsage::Verify => VERIFY,
            KeyUsage::DeriveKey => DERIVE_KEY,
            KeyUsage::DeriveBits => DERIVE_BITS,
            KeyUsage::WrapKey => WRAP_KEY,
            KeyUsage::UnwrapKey => UNWRAP_KEY,
        }
    }

    /// All usages whose bit is set in `mask`, in canonical order.
    pub fn from_mask(mask: u8) -> Vec<KeyUsage> {
        ALL_USAGES
            .iter()
            .filter(|usage| usage.mask() & mask != 0)
            .copied()
            .collect()
    }
}

pub const ALL_USAGES: [KeyUsage; 8] = [
    KeyUsage::Encrypt,
    KeyUsage::Decrypt,
    KeyUsage::Sign,
    KeyUsage::Verify,
    KeyUsage::DeriveKey,
    KeyUsage::DeriveBits,
    KeyUsage::WrapKey,
    KeyUsage::UnwrapKey,
];

impl TryFrom<&str> for KeyUsage {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Ok(match s {
            "encrypt" => KeyUsage::Encrypt,
            "decrypt" => KeyUsage::Decrypt,
            "sign" => KeyUsage::Sign,
            "verify" => KeyUsage::Verify,
            "deriveKey" => KeyUsage::DeriveKey,
            "deriveBits" => KeyUsage::DeriveBits,
            "wrapKey" => KeyUsage::WrapKey,
            "unwrapKey" => KeyUsage::UnwrapKey,
            _ => {
                return Err(Error::type_error(
                    ["'", s, "' is not a valid key usage"].concat(),
                ))
            },
        })
    }
}

impl AsRef<str> for KeyUsage {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

pub fn mask_of(usages: &[KeyUsage]) -> u8 {
    usages.iter().fold(0, |acc, usage| acc | usage.mask())
}

/// Checks that every requested usage is legal for the algorithm and returns
/// the combined bitmask. Illegal usages are a `SyntaxError`.
pub fn classify_and_check_usages(name: &str, usages: &[KeyUsage], allowed: u8) -> Result<u8> {
    let mask = mask_of(usages);
    if mask & !allowed != 0 {
        let offending = KeyUsage::from_mask(mask & !allowed);
        return Err(Error::syntax(
            [
                "Usage '",
                offending[0].as_str(),
                "' is not supported by the ",
                name,
                " algorithm",
            ]
            .concat(),
        ));
    }
    Ok(mask)
}

/// Like [`classify_and_check_usages`], for key-pair algorithms where the
/// public and private halves support different usages. Returns the masks to
/// assign to each half.
pub fn classify_and_check_pair_usages(
    name: &str,
    usages: &[KeyUsage],
    public_allowed: u8,
    private_allowed: u8,
) -> Result<(u8, u8)> {
    let mask = classify_and_check_usages(name, usages, public_allowed | private_allowed)?;
    Ok((mask & public_allowed, mask & private_allowed))
}

/// Set intersection of two usage lists, deduplicated and in canonical order.
pub fn usage_intersection(a: &[KeyUsage], b: &[KeyUsage]) -> Vec<KeyUsage> {
    KeyUsage::from_mask(mask_of(a) & mask_of(b))
}

/// RFC 7517 consistency checks on a JWK's `key_ops` and `use` members,
/// plus the requirement that every requested usage is listed in `key_ops`.
/// All violations are `DataError`s.
pub fn validate_jwk_key_ops(jwk: &JsonWebKey, usages: &[KeyUsage]) -> Result<()> {
    let Some(key_ops) = &jwk.key_ops else {
        return Ok(());
    };

    let mut seen: u8 = 0;
    for op in key_ops {
        let usage = KeyUsage::try_from(op.as_str())
            .map_err(|_| Error::data(["Invalid key operation: ", op].concat()))?;
        if seen & usage.mask() != 0 {
            return Err(Error::data(["Duplicate key operation: ", op].concat()));
        }
        seen |= usage.mask();
    }

    // Only the combinations sign/verify, encrypt/decrypt and wrapKey/unwrapKey
    // may appear together (RFC 7517 §4.3).
    let used_for_signing = seen & (SIGN | VERIFY) != 0;
    let used_for_encryption = seen & (ENCRYPT | DECRYPT) != 0;
    let used_for_wrapping = seen & (WRAP_KEY | UNWRAP_KEY) != 0;
    if used_for_signing as u8 + used_for_encryption as u8 + used_for_wrapping as u8 > 1 {
        return Err(Error::data(
            "Multiple unrelated key operations are specified",
        ));
    }

    if let Some(use_) = &jwk.use_ {
        for op in key_ops {
            if op == "deriveKey" || op == "deriveBits" {
                continue;
            }
            if use_ == "sig" && op != "sign" && op != "verify" {
                return Err(Error::data(
                    "use=sig but key_ops does not contain 'sign' or 'verify'",
                ));
            }
            if use_ == "enc" && (op == "sign" || op == "verify") {
                return Err(Error::data("use=enc but key_ops contains 'sign' or 'verify'"));
            }
        }
    }

    for usage in usages {
        if seen & usage.mask() == 0 {
            return Err(Error::data(
                ["Missing key_ops usage: ", usage.as_str()].concat(),
            ));
        }
    }

    Ok(())
}
