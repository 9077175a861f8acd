// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Monomorphized AES cipher instances. RustCrypto encodes the key size and
//! GCM tag size in the type, so each supported combination gets its own
//! variant and the callers pick one at runtime from the key algorithm.

use aes::cipher::block_padding::{Pkcs7, UnpadError};
use aes::cipher::consts::{U12, U13, U14, U15, U16};
use aes::cipher::{
    BlockDecryptMut, BlockEncryptMut, InvalidLength, KeyIvInit, StreamCipher, StreamCipherError,
};
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{AesGcm, KeyInit};
use ctr::{Ctr128BE, Ctr32BE, Ctr64BE};

pub enum AesCbcEncVariant {
    Aes128(cbc::Encryptor<Aes128>),
    Aes192(cbc::Encryptor<Aes192>),
    Aes256(cbc::Encryptor<Aes256>),
}

impl AesCbcEncVariant {
    pub fn new(key_len: u16, key: &[u8], iv: &[u8]) -> Result<Self, InvalidLength> {
        Ok(match key_len {
            128 => Self::Aes128(cbc::Encryptor::new_from_slices(key, iv)?),
            192 => Self::Aes192(cbc::Encryptor::new_from_slices(key, iv)?),
            256 => Self::Aes256(cbc::Encryptor::new_from_slices(key, iv)?),
            _ => return Err(InvalidLength),
        })
    }

    pub fn encrypt(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Aes128(v) => v.encrypt_padded_vec_mut::<Pkcs7>(data),
            Self::Aes192(v) => v.encrypt_padded_vec_mut::<Pkcs7>(data),
            Self::Aes256(v) => v.encrypt_padded_vec_mut::<Pkcs7>(data),
        }
    }
}

pub enum AesCbcDecVariant {
    Aes128(cbc::Decryptor<Aes128>),
    Aes192(cbc::Decryptor<Aes192>),
    Aes256(cbc::Decryptor<Aes256>),
}

impl AesCbcDecVariant {
    pub fn new(key_len: u16, key: &[u8], iv: &[u8]) -> Result<Self, InvalidLength> {
        Ok(match key_len {
            128 => Self::Aes128(cbc::Decryptor::new_from_slices(key, iv)?),
            192 => Self::Aes192(cbc::Decryptor::new_from_slices(key, iv)?),
            256 => Self::Aes256(cbc::Decryptor::new_from_slices(key, iv)?),
            _ => return Err(InvalidLength),
        })
    }

    pub fn decrypt(self, data: &[u8]) -> Result<Vec<u8>, UnpadError> {
        match self {
            Self::Aes128(v) => v.decrypt_padded_vec_mut::<Pkcs7>(data),
            Self::Aes192(v) => v.decrypt_padded_vec_mut::<Pkcs7>(data),
            Self::Aes256(v) => v.decrypt_padded_vec_mut::<Pkcs7>(data),
        }
    }
}

pub enum AesCtrVariant {
    Aes128Ctr32(Ctr32BE<Aes128>),
    Aes128Ctr64(Ctr64BE<Aes128>),
    Aes128Ctr128(Ctr128BE<Aes128>),
    Aes192Ctr32(Ctr32BE<Aes192>),
    Aes192Ctr64(Ctr64BE<Aes192>),
    Aes192Ctr128(Ctr128BE<Aes192>),
    Aes256Ctr32(Ctr32BE<Aes256>),
    Aes256Ctr64(Ctr64BE<Aes256>),
    Aes256Ctr128(Ctr128BE<Aes256>),
}

impl AesCtrVariant {
    pub fn new(
        key_len: u16,
        counter_length: u32,
        key: &[u8],
        counter: &[u8],
    ) -> Result<Self, InvalidLength> {
        Ok(match (key_len, counter_length) {
            (128, 32) => Self::Aes128Ctr32(Ctr32BE::new_from_slices(key, counter)?),
            (128, 64) => Self::Aes128Ctr64(Ctr64BE::new_from_slices(key, counter)?),
            (128, 128) => Self::Aes128Ctr128(Ctr128BE::new_from_slices(key, counter)?),
            (192, 32) => Self::Aes192Ctr32(Ctr32BE::new_from_slices(key, counter)?),
            (192, 64) => Self::Aes192Ctr64(Ctr64BE::new_from_slices(key, counter)?),
            (192, 128) => Self::Aes192Ctr128(Ctr128BE::new_from_slices(key, counter)?),
            (256, 32) => Self::Aes256Ctr32(Ctr32BE::new_from_slices(key, counter)?),
            (256, 64) => Self::Aes256Ctr64(Ctr64BE::new_from_slices(key, counter)?),
            (256, 128) => Self::Aes256Ctr128(Ctr128BE::new_from_slices(key, counter)?),
            _ => return Err(InvalidLength),
        })
    }

    /// CTR mode is symmetric: the same keystream application both encrypts
    /// and decrypts.
    pub fn apply_keystream(&mut self, data: &[u8]) -> Result<Vec<u8>, StreamCipherError> {
        let mut output = data.to_vec();
        match self {
            Self::Aes128Ctr32(v) => v.try_apply_keystream(&mut output)?,
            Self::Aes128Ctr64(v) => v.try_apply_keystream(&mut output)?,
            Self::Aes128Ctr128(v) => v.try_apply_keystream(&mut output)?,
            Self::Aes192Ctr32(v) => v.try_apply_keystream(&mut output)?,
            Self::Aes192Ctr64(v) => v.try_apply_keystream(&mut output)?,
            Self::Aes192Ctr128(v) => v.try_apply_keystream(&mut output)?,
            Self::Aes256Ctr32(v) => v.try_apply_keystream(&mut output)?,
            Self::Aes256Ctr64(v) => v.try_apply_keystream(&mut output)?,
            Self::Aes256Ctr128(v) => v.try_apply_keystream(&mut output)?,
        }
        Ok(output)
    }
}

pub enum AesGcmVariant {
    Aes128Gcm96(AesGcm<Aes128, U12, U12>),
    Aes192Gcm96(AesGcm<Aes192, U12, U12>),
    Aes256Gcm96(AesGcm<Aes256, U12, U12>),
    Aes128Gcm104(AesGcm<Aes128, U12, U13>),
    Aes192Gcm104(AesGcm<Aes192, U12, U13>),
    Aes256Gcm104(AesGcm<Aes256, U12, U13>),
    Aes128Gcm112(AesGcm<Aes128, U12, U14>),
    Aes192Gcm112(AesGcm<Aes192, U12, U14>),
    Aes256Gcm112(AesGcm<Aes256, U12, U14>),
    Aes128Gcm120(AesGcm<Aes128, U12, U15>),
    Aes192Gcm120(AesGcm<Aes192, U12, U15>),
    Aes256Gcm120(AesGcm<Aes256, U12, U15>),
    Aes128Gcm128(AesGcm<Aes128, U12, U16>),
    Aes192Gcm128(AesGcm<Aes192, U12, U16>),
    Aes256Gcm128(AesGcm<Aes256, U12, U16>),
}

impl AesGcmVariant {
    pub fn new(key_len: u16, tag_length: u8, key: &[u8]) -> Result<Self, InvalidLength> {
        Ok(match (key_len, tag_length) {
            (128, 96) => Self::Aes128Gcm96(AesGcm::new_from_slice(key)?),
            (192, 96) => Self::Aes192Gcm96(AesGcm::new_from_slice(key)?),
            (256, 96) => Self::Aes256Gcm96(AesGcm::new_from_slice(key)?),
            (128, 104) => Self::Aes128Gcm104(AesGcm::new_from_slice(key)?),
            (192, 104) => Self::Aes192Gcm104(AesGcm::new_from_slice(key)?),
            (256, 104) => Self::Aes256Gcm104(AesGcm::new_from_slice(key)?),
            (128, 112) => Self::Aes128Gcm112(AesGcm::new_from_slice(key)?),
            (192, 112) => Self::Aes192Gcm112(AesGcm::new_from_slice(key)?),
            (256, 112) => Self::Aes256Gcm112(AesGcm::new_from_slice(key)?),
            (128, 120) => Self::Aes128Gcm120(AesGcm::new_from_slice(key)?),
            (192, 120) => Self::Aes192Gcm120(AesGcm::new_from_slice(key)?),
            (256, 120) => Self::Aes256Gcm120(AesGcm::new_from_slice(key)?),
            (128, 128) => Self::Aes128Gcm128(AesGcm::new_from_slice(key)?),
            (192, 128) => Self::Aes192Gcm128(AesGcm::new_from_slice(key)?),
            (256, 128) => Self::Aes256Gcm128(AesGcm::new_from_slice(key)?),
            _ => return Err(InvalidLength),
        })
    }

    pub fn encrypt(
        &self,
        nonce: &[u8],
        msg: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<Vec<u8>, aes_gcm::Error> {
        if nonce.len() != 12 {
            return Err(aes_gcm::Error);
        }
        let nonce = aes_gcm::Nonce::from_slice(nonce);
        let plaintext = Payload {
            msg,
            aad: aad.unwrap_or_default(),
        };
        match self {
            Self::Aes128Gcm96(v) => v.encrypt(nonce, plaintext),
            Self::Aes192Gcm96(v) => v.encrypt(nonce, plaintext),
            Self::Aes256Gcm96(v) => v.encrypt(nonce, plaintext),
            Self::Aes128Gcm104(v) => v.encrypt(nonce, plaintext),
            Self::Aes192Gcm104(v) => v.encrypt(nonce, plaintext),
            Self::Aes256Gcm104(v) => v.encrypt(nonce, plaintext),
            Self::Aes128Gcm112(v) => v.encrypt(nonce, plaintext),
            Self::Aes192Gcm112(v) => v.encrypt(nonce, plaintext),
            Self::Aes256Gcm112(v) => v.encrypt(nonce, plaintext),
            Self::Aes128Gcm120(v) => v.encrypt(nonce, plaintext),
            Self::Aes192Gcm120(v) => v.encrypt(nonce, plaintext),
            Self::Aes256Gcm120(v) => v.encrypt(nonce, plaintext),
            Self::Aes128Gcm128(v) => v.encrypt(nonce, plaintext),
            Self::Aes192Gcm128(v) => v.encrypt(nonce, plaintext),
            Self::Aes256Gcm128(v) => v.encrypt(nonce, plaintext),
        }
    }

    pub fn decrypt(
        &self,
        nonce: &[u8],
        msg: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<Vec<u8>, aes_gcm::Error> {
        if nonce.len() != 12 {
            return Err(aes_gcm::Error);
        }
        let nonce = aes_gcm::Nonce::from_slice(nonce);
        let ciphertext = Payload {
            msg,
            aad: aad.unwrap_or_default(),
        };
        match self {
            Self::Aes128Gcm96(v) => v.decrypt(nonce, ciphertext),
            Self::Aes192Gcm96(v) => v.decrypt(nonce, ciphertext),
            Self::Aes256Gcm96(v) => v.decrypt(nonce, ciphertext),
            Self::Aes128Gcm104(v) => v.decrypt(nonce, ciphertext),
            Self::Aes192Gcm104(v) => v.decrypt(nonce, ciphertext),
            Self::Aes256Gcm104(v) => v.decrypt(nonce, ciphertext),
            Self::Aes128Gcm112(v) => v.decrypt(nonce, ciphertext),
            Self::Aes192Gcm112(v) => v.decrypt(nonce, ciphertext),
            Self::Aes256Gcm112(v) => v.decrypt(nonce, ciphertext),
            Self::Aes128Gcm120(v) => v.decrypt(nonce, ciphertext),
            Self::Aes192Gcm120(v) => v.decrypt(nonce, ciphertext),
            Self::Aes256Gcm120(v) => v.decrypt(nonce, ciphertext),
            Self::Aes128Gcm128(v) => v.decrypt(nonce, ciphertext),
            Self::Aes192Gcm128(v) => v.decrypt(nonce, ciphertext),
            Self::Aes256Gcm128(v) => v.decrypt(nonce, ciphertext),
        }
    }
}
