// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// RFC 7517 JSON Web Key, restricted to the members the import and export
/// operations consume. Unknown members are ignored on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonWebKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kty: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,

    // Elliptic-curve and OKP members.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,

    // RSA members.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oth: Option<Vec<RsaOtherPrimesInfo>>,

    // Symmetric key member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
}

/// RFC 7518 §6.3.2.7 entry for RSA keys with more than two primes. Such keys
/// are recognized so they can be rejected, never imported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RsaOtherPrimesInfo {
    pub r: String,
    pub d: String,
    pub t: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_member_is_renamed() {
        let jwk: JsonWebKey =
            serde_json::from_str(r#"{"kty":"oct","use":"sig","k":"AQAB"}"#).unwrap();
        assert_eq!(jwk.use_.as_deref(), Some("sig"));
        let out = serde_json::to_string(&jwk).unwrap();
        assert!(out.contains(r#""use":"sig""#));
        assert!(!out.contains("use_"));
    }

    #[test]
    fn absent_members_are_omitted() {
        let jwk = JsonWebKey {
            kty: Some("oct".into()),
            k: Some("AAAA".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&jwk).unwrap(), r#"{"kty":"oct","k":"AAAA"}"#);
    }

    #[test]
    fn unknown_members_are_ignored() {
        let jwk: JsonWebKey =
            serde_json::from_str(r#"{"kty":"EC","crv":"P-256","x5c":["ignored"]}"#).unwrap();
        assert_eq!(jwk.kty.as_deref(), Some("EC"));
        assert_eq!(jwk.crv.as_deref(), Some("P-256"));
    }
}
