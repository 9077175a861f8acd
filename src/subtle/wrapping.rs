// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::params::AlgorithmIdentifier;
use crate::subtle::crypto_key::{CryptoKey, KeyKind};
use crate::subtle::encryption::{encrypt_decrypt, EncryptionOperation};
use crate::subtle::encryption_algorithm::EncryptionAlgorithm;
use crate::subtle::export_key::{export_key, ExportOutput};
use crate::subtle::import_key::import_key;
use crate::subtle::key_algorithm::{KeyFormat, KeyFormatData};
use crate::subtle::key_usage::KeyUsage;
use crate::subtle::EncryptionMode;

// AES-KW needs 8-byte blocks; JWK text is padded with spaces, which the JSON
// parser skips on the way back in.
const JWK_PADDING: u8 = b' ';

/// Exports a key and encrypts it with the wrapping key.
pub fn wrap_key(
    format: KeyFormat,
    key: &CryptoKey,
    wrapping_key: &CryptoKey,
    wrap_algorithm: &AlgorithmIdentifier,
) -> Result<Vec<u8>> {
    let algorithm = EncryptionAlgorithm::from_params(wrap_algorithm)?;
    wrapping_key.check_validity(algorithm.name(), KeyUsage::WrapKey)?;
    wrapping_key.check_kind(&[KeyKind::Secret, KeyKind::Public])?;

    let (bytes, padding) = match export_key(format, key)? {
        ExportOutput::Bytes(bytes) => (bytes, 0),
        ExportOutput::Jwk(jwk) => {
            let bytes =
                serde_json::to_vec(&jwk).map_err(|e| Error::operation(e.to_string()))?;
            (bytes, JWK_PADDING)
        },
    };

    encrypt_decrypt(
        &algorithm,
        wrapping_key,
        &bytes,
        EncryptionMode::Wrapping(padding),
        EncryptionOperation::Encrypt,
    )
}

/// Decrypts wrapped key material and imports it under the target algorithm.
pub fn unwrap_key(
    format: KeyFormat,
    wrapped_key: &[u8],
    unwrapping_key: &CryptoKey,
    unwrap_algorithm: &AlgorithmIdentifier,
    unwrapped_key_algorithm: &AlgorithmIdentifier,
    extractable: bool,
    usages: &[KeyUsage],
) -> Result<Rc<CryptoKey>> {
    let algorithm = EncryptionAlgorithm::from_params(unwrap_algorithm)?;
    unwrapping_key.check_validity(algorithm.name(), KeyUsage::UnwrapKey)?;
    unwrapping_key.check_kind(&[KeyKind::Secret, KeyKind::Private])?;

    let padding = if format == KeyFormat::Jwk {
        JWK_PADDING
    } else {
        0
    };
    let bytes = encrypt_decrypt(
        &algorithm,
        unwrapping_key,
        wrapped_key,
        EncryptionMode::Wrapping(padding),
        EncryptionOperation::Decrypt,
    )?;

    let format_data = match format {
        KeyFormat::Jwk => {
            let jwk = serde_json::from_slice(&bytes)
                .map_err(|_| Error::data("Wrapped data is not a valid JWK"))?;
            KeyFormatData::Jwk(jwk)
        },
        KeyFormat::Raw => KeyFormatData::Raw(bytes),
        KeyFormat::Spki => KeyFormatData::Spki(bytes),
        KeyFormat::Pkcs8 => KeyFormatData::Pkcs8(bytes),
    };

    import_key(format_data, unwrapped_key_algorithm, extractable, usages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::params::Params;

    fn kek(usages_mask: u8) -> CryptoKey {
        CryptoKey::new(
            KeyKind::Secret,
            "AES-KW",
            false,
            crate::subtle::KeyAlgorithm::Aes { length: 256 },
            usages_mask,
            vec![0x11u8; 32],
        )
    }

    fn aes_target() -> Rc<CryptoKey> {
        import_key(
            KeyFormatData::Raw(vec![0x22u8; 16]),
            &Params::new().with("name", "AES-GCM").into(),
            true,
            &[KeyUsage::Encrypt, KeyUsage::Decrypt],
        )
        .unwrap()
    }

    #[test]
    fn raw_aes_kw_round_trip() {
        use crate::subtle::key_usage::{UNWRAP_KEY, WRAP_KEY};

        let kek = kek(WRAP_KEY | UNWRAP_KEY);
        let target = aes_target();

        let wrapped = wrap_key(KeyFormat::Raw, &target, &kek, &"AES-KW".into()).unwrap();
        // RFC 3394 adds a 8-byte integrity block
        assert_eq!(wrapped.len(), 24);
        assert_ne!(&wrapped[8..], target.handle());

        let unwrapped = unwrap_key(
            KeyFormat::Raw,
            &wrapped,
            &kek,
            &"AES-KW".into(),
            &Params::new().with("name", "AES-GCM").into(),
            true,
            &[KeyUsage::Encrypt],
        )
        .unwrap();
        assert_eq!(unwrapped.handle(), target.handle());
    }

    #[test]
    fn jwk_aes_kw_round_trip_pads_to_blocks() {
        use crate::subtle::key_usage::{UNWRAP_KEY, WRAP_KEY};

        let kek = kek(WRAP_KEY | UNWRAP_KEY);
        let target = aes_target();

        let wrapped = wrap_key(KeyFormat::Jwk, &target, &kek, &"AES-KW".into()).unwrap();
        assert_eq!(wrapped.len() % 8, 0);

        let unwrapped = unwrap_key(
            KeyFormat::Jwk,
            &wrapped,
            &kek,
            &"AES-KW".into(),
            &Params::new().with("name", "AES-GCM").into(),
            true,
            &[KeyUsage::Decrypt],
        )
        .unwrap();
        assert_eq!(unwrapped.handle(), target.handle());
    }

    #[test]
    fn gcm_can_wrap_too() {
        use crate::subtle::key_usage::{UNWRAP_KEY, WRAP_KEY};

        let kek = CryptoKey::new(
            KeyKind::Secret,
            "AES-GCM",
            false,
            crate::subtle::KeyAlgorithm::Aes { length: 128 },
            WRAP_KEY | UNWRAP_KEY,
            vec![0x33u8; 16],
        );
        let params: AlgorithmIdentifier = Params::new()
            .with("name", "AES-GCM")
            .with("iv", vec![5u8; 12])
            .into();
        let target = aes_target();

        let wrapped = wrap_key(KeyFormat::Raw, &target, &kek, &params).unwrap();
        let unwrapped = unwrap_key(
            KeyFormat::Raw,
            &wrapped,
            &kek,
            &params,
            &Params::new().with("name", "AES-GCM").into(),
            false,
            &[KeyUsage::Encrypt],
        )
        .unwrap();
        assert_eq!(unwrapped.handle(), target.handle());
    }

    #[test]
    fn wrapping_requires_the_wrap_usage() {
        use crate::subtle::key_usage::UNWRAP_KEY;

        let kek = kek(UNWRAP_KEY);
        let target = aes_target();
        let err = wrap_key(KeyFormat::Raw, &target, &kek, &"AES-KW".into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAccess);
    }

    #[test]
    fn tampered_wrap_is_rejected() {
        use crate::subtle::key_usage::{UNWRAP_KEY, WRAP_KEY};

        let kek = kek(WRAP_KEY | UNWRAP_KEY);
        let target = aes_target();
        let mut wrapped = wrap_key(KeyFormat::Raw, &target, &kek, &"AES-KW".into()).unwrap();
        wrapped[0] ^= 1;
        let err = unwrap_key(
            KeyFormat::Raw,
            &wrapped,
            &kek,
            &"AES-KW".into(),
            &Params::new().with("name", "AES-GCM").into(),
            true,
            &[KeyUsage::Encrypt],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
    }
}
