// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaAlgorithm {
    SHA1,
    SHA256,
    SHA384,
    SHA512,
}

impl ShaAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShaAlgorithm::SHA1 => "SHA-1",
            ShaAlgorithm::SHA256 => "SHA-256",
            ShaAlgorithm::SHA384 => "SHA-384",
            ShaAlgorithm::SHA512 => "SHA-512",
        }
    }

    /// The numeric suffix used by JWA algorithm names (HS256, PS384, ...).
    pub fn as_numeric_str(&self) -> &'static str {
        match self {
            ShaAlgorithm::SHA1 => "1",
            ShaAlgorithm::SHA256 => "256",
            ShaAlgorithm::SHA384 => "384",
            ShaAlgorithm::SHA512 => "512",
        }
    }

    pub fn digest_len(&self) -> usize {
        match self {
            ShaAlgorithm::SHA1 => 20,
            ShaAlgorithm::SHA256 => 32,
            ShaAlgorithm::SHA384 => 48,
            ShaAlgorithm::SHA512 => 64,
        }
    }

    /// Internal block size in bytes, the default HMAC key length.
    pub fn block_len(&self) -> usize {
        match self {
            ShaAlgorithm::SHA1 | ShaAlgorithm::SHA256 => 64,
            ShaAlgorithm::SHA384 | ShaAlgorithm::SHA512 => 128,
        }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            ShaAlgorithm::SHA1 => Sha1::digest(data).to_vec(),
            ShaAlgorithm::SHA256 => Sha256::digest(data).to_vec(),
            ShaAlgorithm::SHA384 => Sha384::digest(data).to_vec(),
            ShaAlgorithm::SHA512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl TryFrom<&str> for ShaAlgorithm {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "SHA1" | "SHA-1" => ShaAlgorithm::SHA1,
            "SHA256" | "SHA-256" => ShaAlgorithm::SHA256,
            "SHA384" | "SHA-384" => ShaAlgorithm::SHA384,
            "SHA512" | "SHA-512" => ShaAlgorithm::SHA512,
            _ => {
                return Err(Error::not_supported(
                    ["Hash algorithm '", s, "' is not supported"].concat(),
                ))
            },
        })
    }
}

impl AsRef<str> for ShaAlgorithm {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn sha256_digest() {
        let digest = ShaAlgorithm::SHA256.digest(b"hello world");
        assert_eq!(
            to_hex(&digest),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn digest_lengths() {
        for (alg, len) in [
            (ShaAlgorithm::SHA1, 20),
            (ShaAlgorithm::SHA256, 32),
            (ShaAlgorithm::SHA384, 48),
            (ShaAlgorithm::SHA512, 64),
        ] {
            assert_eq!(alg.digest(b"x").len(), len);
            assert_eq!(alg.digest_len(), len);
        }
    }

    #[test]
    fn parses_both_spellings() {
        assert_eq!(
            ShaAlgorithm::try_from("sha-384").unwrap(),
            ShaAlgorithm::SHA384
        );
        assert_eq!(
            ShaAlgorithm::try_from("SHA512").unwrap(),
            ShaAlgorithm::SHA512
        );
        assert!(ShaAlgorithm::try_from("MD5").is_err());
    }
}
