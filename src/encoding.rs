// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use crate::error::{Error, Result};

pub fn bytes_to_b64_url_safe_string(bytes: &[u8]) -> String {
    base64_simd::URL_SAFE_NO_PAD.encode_to_string(bytes)
}

/// Decodes base64url, treating absent padding as implicit: the input is
/// accepted with or without trailing `=`.
pub fn bytes_from_b64_url_safe(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim_end_matches('=');
    base64_simd::URL_SAFE_NO_PAD
        .decode_to_vec(trimmed.as_bytes())
        .map_err(|e| Error::data(["base64 decode: ", &e.to_string()].concat()))
}

/// RFC 7518 §2 big-integer encoding: the minimal big-endian octet sequence of
/// the value, base64url encoded without padding. Zero is the single zero
/// octet, "AA".
pub fn base64_url_uint_encode(bytes_be: &[u8]) -> String {
    let mut start = 0;
    while start < bytes_be.len() && bytes_be[start] == 0 {
        start += 1;
    }
    if start == bytes_be.len() {
        return bytes_to_b64_url_safe_string(&[0]);
    }
    bytes_to_b64_url_safe_string(&bytes_be[start..])
}

/// Inverse of [`base64_url_uint_encode`]: yields the minimal big-endian byte
/// representation of the integer. The zero value decodes to an empty buffer.
pub fn base64_url_uint_decode(input: &str) -> Result<Vec<u8>> {
    let bytes = bytes_from_b64_url_safe(input)?;
    let mut start = 0;
    while start < bytes.len() && bytes[start] == 0 {
        start += 1;
    }
    Ok(bytes[start..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_encode_trims_leading_zeroes() {
        assert_eq!(base64_url_uint_encode(&[0x00, 0x01, 0x00, 0x01]), "AQAB");
        assert_eq!(base64_url_uint_encode(&[0x01, 0x00, 0x01]), "AQAB");
    }

    #[test]
    fn uint_zero_encodes_as_aa() {
        assert_eq!(base64_url_uint_encode(&[]), "AA");
        assert_eq!(base64_url_uint_encode(&[0x00, 0x00]), "AA");
        assert_eq!(base64_url_uint_decode("AA").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn uint_round_trip() {
        for buffer in [
            vec![],
            vec![0x00],
            vec![0x01],
            vec![0x00, 0x80, 0x01],
            vec![0xff; 33],
        ] {
            let minimal: Vec<u8> = {
                let mut start = 0;
                while start < buffer.len() && buffer[start] == 0 {
                    start += 1;
                }
                buffer[start..].to_vec()
            };
            let encoded = base64_url_uint_encode(&buffer);
            assert_eq!(base64_url_uint_decode(&encoded).unwrap(), minimal);
        }
    }

    #[test]
    fn decode_accepts_padded_input() {
        assert_eq!(bytes_from_b64_url_safe("AQAB").unwrap(), vec![1, 0, 1]);
        assert_eq!(bytes_from_b64_url_safe("AQ==").unwrap(), vec![1]);
        assert_eq!(bytes_from_b64_url_safe("AQ").unwrap(), vec![1]);
    }

    #[test]
    fn decode_rejects_invalid_input() {
        assert!(bytes_from_b64_url_safe("!!!").is_err());
    }
}
