// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::rc::Rc;

use der::asn1::{OctetStringRef, UintRef};
use der::{Decode, Encode};
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use pkcs8::{DecodePrivateKey, PrivateKeyInfo};
use spki::SubjectPublicKeyInfoRef;

use crate::encoding::bytes_from_b64_url_safe;
use crate::error::{Error, Result};
use crate::params::{to_name_and_maybe_params, AlgorithmIdentifier, Params};
use crate::sha_hash::ShaAlgorithm;
use crate::subtle::crypto_key::KeyKind;
use crate::subtle::jwk::JsonWebKey;
use crate::subtle::key_usage::{
    classify_and_check_usages, KeyUsage, DECRYPT, DERIVE_BITS, DERIVE_KEY, ENCRYPT, SIGN,
    UNWRAP_KEY, VERIFY, WRAP_KEY,
};
use crate::subtle::{
    algorithm_mismatch_error, algorithm_not_supported_error, hash_mismatch_error, require_params,
    EllipticCurve, OkpCurve,
};

const SYMMETRIC_USAGES: u8 = ENCRYPT | DECRYPT | WRAP_KEY | UNWRAP_KEY;
const KW_USAGES: u8 = WRAP_KEY | UNWRAP_KEY;
const MAC_USAGES: u8 = SIGN | VERIFY;
const KDF_USAGES: u8 = DERIVE_KEY | DERIVE_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcAlgorithm {
    Ecdh,
    Ecdsa,
}

/// The resolved, immutable algorithm a key was created for. Stored on the
/// [`CryptoKey`](crate::subtle::CryptoKey) and consulted by every later
/// operation on that key.
#[derive(Debug, Clone)]
pub enum KeyAlgorithm {
    Aes {
        length: u16,
    },
    Ec {
        curve: EllipticCurve,
        algorithm: EcAlgorithm,
    },
    Okp {
        curve: OkpCurve,
    },
    Hmac {
        hash: ShaAlgorithm,
        length: u32,
    },
    Rsa {
        modulus_length: u32,
        public_exponent: Rc<Box<[u8]>>,
        hash: ShaAlgorithm,
    },
    Hkdf,
    Pbkdf2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Jwk,
    Raw,
    Spki,
    Pkcs8,
}

impl KeyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyFormat::Jwk => "jwk",
            KeyFormat::Raw => "raw",
            KeyFormat::Spki => "spki",
            KeyFormat::Pkcs8 => "pkcs8",
        }
    }
}

impl TryFrom<&str> for KeyFormat {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Ok(match s {
            "jwk" => KeyFormat::Jwk,
            "raw" => KeyFormat::Raw,
            "spki" => KeyFormat::Spki,
            "pkcs8" => KeyFormat::Pkcs8,
            _ => {
                return Err(Error::type_error(
                    "Key format must be 'jwk', 'raw', 'spki' or 'pkcs8'",
                ))
            },
        })
    }
}

/// Key material in one of the four import/export formats.
pub enum KeyFormatData {
    Jwk(JsonWebKey),
    Raw(Vec<u8>),
    Spki(Vec<u8>),
    Pkcs8(Vec<u8>),
}

/// Context the algorithm is being resolved in. Import also parses the key
/// material, reporting the resulting key kind and internal encoding through
/// the two out-parameters.
pub enum KeyAlgorithmMode<'a> {
    Import {
        format: KeyFormatData,
        kind: &'a mut KeyKind,
        data: &'a mut Vec<u8>,
    },
    Generate,
    Derive,
}

#[derive(Debug)]
pub struct KeyAlgorithmWithUsages {
    pub name: String,
    pub algorithm: KeyAlgorithm,
    pub public_usages: u8,
    pub private_usages: u8,
}

impl KeyAlgorithm {
    /// Resolves an algorithm identifier plus requested usages into the
    /// concrete [`KeyAlgorithm`] and the usage masks for each key half.
    /// Algorithm names are matched case-insensitively.
    pub fn from_params(
        mode: KeyAlgorithmMode<'_>,
        identifier: &AlgorithmIdentifier,
        usages: &[KeyUsage],
    ) -> Result<KeyAlgorithmWithUsages> {
        let (name, params) = to_name_and_maybe_params(identifier)?;
        let upper = name.to_ascii_uppercase();

        // deriveKey targets must support both get-key-length and import.
        if matches!(mode, KeyAlgorithmMode::Derive)
            && !matches!(
                upper.as_str(),
                "AES-CBC" | "AES-CTR" | "AES-GCM" | "AES-KW" | "HMAC" | "HKDF" | "PBKDF2"
            )
        {
            return algorithm_not_supported_error(&name);
        }

        let mut public_usages;
        let mut private_usages = 0;

        let (canonical, algorithm) = match upper.as_str() {
            "AES-CBC" | "AES-CTR" | "AES-GCM" | "AES-KW" => {
                let canonical: &str = match upper.as_str() {
                    "AES-CBC" => "AES-CBC",
                    "AES-CTR" => "AES-CTR",
                    "AES-GCM" => "AES-GCM",
                    _ => "AES-KW",
                };
                let length = if let KeyAlgorithmMode::Import { format, kind, data } = mode {
                    let bits = import_symmetric_key(format, kind, data, canonical, None)?;
                    if !matches!(bits, 128 | 192 | 256) {
                        return Err(Error::data(
                            ["AES key data must be 128, 192 or 256 bits"].concat(),
                        ));
                    }
                    bits as u16
                } else {
                    let params = require_params(params, canonical)?;
                    let length: u16 = params.get_required("length")?;
                    if !matches!(length, 128 | 192 | 256) {
                        return Err(Error::operation(
                            "AES key length must be 128, 192 or 256 bits",
                        ));
                    }
                    length
                };

                let allowed = if canonical == "AES-KW" {
                    KW_USAGES
                } else {
                    SYMMETRIC_USAGES
                };
                public_usages = classify_and_check_usages(canonical, usages, allowed)?;
                (canonical, KeyAlgorithm::Aes { length })
            },
            "HMAC" => {
                let params = require_params(params, "HMAC")?;
                let hash = extract_sha_hash(params)?;
                let length_member: Option<u32> = params.get_optional("length")?;

                let length = match mode {
                    KeyAlgorithmMode::Import { format, kind, data } => {
                        let data_bits =
                            import_symmetric_key(format, kind, data, "HMAC", Some(&hash))? as u32;
                        if data_bits == 0 {
                            return Err(Error::data("HMAC key data must not be empty"));
                        }
                        match length_member {
                            None => data_bits,
                            Some(0) => return Err(Error::data("HMAC key length must not be 0")),
                            Some(length) => {
                                // The length may only drop bits from the last
                                // byte of the key data.
                                if length > data_bits || length <= data_bits - 8 {
                                    return Err(Error::data(
                                        "HMAC key length does not match key data",
                                    ));
                                }
                                length
                            },
                        }
                    },
                    KeyAlgorithmMode::Generate | KeyAlgorithmMode::Derive => match length_member {
                        None => (hash.block_len() * 8) as u32,
                        Some(0) => {
                            return Err(Error::operation("HMAC key length must not be 0"))
                        },
                        Some(length) => length,
                    },
                };

                public_usages = classify_and_check_usages("HMAC", usages, MAC_USAGES)?;
                ("HMAC", KeyAlgorithm::Hmac { hash, length })
            },
            "RSA-OAEP" | "RSA-PSS" | "RSASSA-PKCS1-V1_5" => {
                let canonical: &str = match upper.as_str() {
                    "RSA-OAEP" => "RSA-OAEP",
                    "RSA-PSS" => "RSA-PSS",
                    _ => "RSASSA-PKCS1-v1_5",
                };
                let params = require_params(params, canonical)?;
                let hash = extract_sha_hash(params)?;

                let (modulus_length, public_exponent, key_kind) =
                    if let KeyAlgorithmMode::Import { format, kind, data } = mode {
                        let (modulus_length, public_exponent) =
                            import_rsa_key(format, kind, data, canonical, &hash)?;
                        (modulus_length, public_exponent, Some(*kind))
                    } else {
                        let modulus_length: u32 = params.get_required("modulusLength")?;
                        let public_exponent: Vec<u8> = params.get_required("publicExponent")?;
                        (modulus_length, public_exponent.into_boxed_slice(), None)
                    };

                let (public_allowed, private_allowed) = if canonical == "RSA-OAEP" {
                    (ENCRYPT | WRAP_KEY, DECRYPT | UNWRAP_KEY)
                } else {
                    (VERIFY, SIGN)
                };
                (public_usages, private_usages) = split_usages(
                    canonical,
                    usages,
                    public_allowed,
                    private_allowed,
                    key_kind,
                )?;

                (
                    canonical,
                    KeyAlgorithm::Rsa {
                        modulus_length,
                        public_exponent: Rc::new(public_exponent),
                        hash,
                    },
                )
            },
            "ECDSA" | "ECDH" => {
                let (canonical, algorithm, public_allowed, private_allowed) =
                    if upper == "ECDSA" {
                        ("ECDSA", EcAlgorithm::Ecdsa, VERIFY, SIGN)
                    } else {
                        ("ECDH", EcAlgorithm::Ecdh, 0, KDF_USAGES)
                    };
                let params = require_params(params, canonical)?;
                let curve_name: String = params.get_required("namedCurve")?;
                let curve = EllipticCurve::try_from(curve_name.as_str())?;

                let key_kind = if let KeyAlgorithmMode::Import { format, kind, data } = mode {
                    import_ec_key(format, kind, data, canonical, curve)?;
                    Some(*kind)
                } else {
                    None
                };

                (public_usages, private_usages) = split_usages(
                    canonical,
                    usages,
                    public_allowed,
                    private_allowed,
                    key_kind,
                )?;

                (canonical, KeyAlgorithm::Ec { curve, algorithm })
            },
            "ED25519" | "ED448" | "X25519" | "X448" => {
                let curve = match upper.as_str() {
                    "ED25519" => OkpCurve::Ed25519,
                    "ED448" => OkpCurve::Ed448,
                    "X25519" => OkpCurve::X25519,
                    _ => OkpCurve::X448,
                };
                let canonical = curve.as_str();
                let (public_allowed, private_allowed) = if curve.is_signature() {
                    (VERIFY, SIGN)
                } else {
                    (0, KDF_USAGES)
                };

                let key_kind = if let KeyAlgorithmMode::Import { format, kind, data } = mode {
                    import_okp_key(format, kind, data, curve)?;
                    Some(*kind)
                } else {
                    None
                };

                (public_usages, private_usages) = split_usages(
                    canonical,
                    usages,
                    public_allowed,
                    private_allowed,
                    key_kind,
                )?;

                (canonical, KeyAlgorithm::Okp { curve })
            },
            "HKDF" | "PBKDF2" => {
                let canonical: &str = if upper == "HKDF" { "HKDF" } else { "PBKDF2" };
                match mode {
                    KeyAlgorithmMode::Import { format, kind, data } => {
                        import_derive_key(format, kind, data, canonical)?;
                    },
                    // A derived key carries the raw secret assembled by the
                    // derive operation.
                    KeyAlgorithmMode::Derive => {},
                    KeyAlgorithmMode::Generate => {
                        return algorithm_not_supported_error(canonical);
                    },
                }
                public_usages = classify_and_check_usages(canonical, usages, KDF_USAGES)?;
                let algorithm = if canonical == "HKDF" {
                    KeyAlgorithm::Hkdf
                } else {
                    KeyAlgorithm::Pbkdf2
                };
                (canonical, algorithm)
            },
            _ => return algorithm_not_supported_error(&name),
        };

        Ok(KeyAlgorithmWithUsages {
            name: canonical.to_string(),
            algorithm,
            public_usages,
            private_usages,
        })
    }
}

/// Checks usages against the halves' allowed masks and splits them. When the
/// key kind is already known (import), only that half's usages are legal.
fn split_usages(
    name: &str,
    usages: &[KeyUsage],
    public_allowed: u8,
    private_allowed: u8,
    kind: Option<KeyKind>,
) -> Result<(u8, u8)> {
    let (public_allowed, private_allowed) = match kind {
        Some(KeyKind::Private) => (0, private_allowed),
        Some(KeyKind::Public) | Some(KeyKind::Secret) => (public_allowed, 0),
        None => (public_allowed, private_allowed),
    };
    let mask = classify_and_check_usages(name, usages, public_allowed | private_allowed)?;
    Ok((mask & public_allowed, mask & private_allowed))
}

pub fn extract_sha_hash(params: &Params) -> Result<ShaAlgorithm> {
    let hash: AlgorithmIdentifier = params.get_required("hash")?;
    let (name, _) = to_name_and_maybe_params(&hash)?;
    ShaAlgorithm::try_from(name.as_str())
}

fn import_derive_key(
    format: KeyFormatData,
    kind: &mut KeyKind,
    data: &mut Vec<u8>,
    algorithm_name: &str,
) -> Result<()> {
    if let KeyFormatData::Raw(bytes) = format {
        *data = bytes;
        *kind = KeyKind::Secret;
        Ok(())
    } else {
        Err(Error::not_supported(
            [algorithm_name, " only supports the 'raw' import format"].concat(),
        ))
    }
}

fn import_symmetric_key(
    format: KeyFormatData,
    kind: &mut KeyKind,
    data: &mut Vec<u8>,
    algorithm_name: &str,
    hash: Option<&ShaAlgorithm>,
) -> Result<usize> {
    *kind = KeyKind::Secret;

    match format {
        KeyFormatData::Jwk(jwk) => {
            if jwk.kty.as_deref() != Some("oct") {
                return algorithm_mismatch_error(algorithm_name);
            }
            let k = jwk
                .k
                .as_deref()
                .ok_or_else(|| Error::data("JWK is missing 'k'"))?;
            *data = bytes_from_b64_url_safe(k)?;

            if let Some(alg) = jwk.alg.as_deref() {
                let expected = match hash {
                    // HMAC - HS1, HS256, HS512 etc
                    Some(hash) => ["HS", hash.as_numeric_str()].concat(),
                    // AES - A128CBC, A256GCM, A256KW etc
                    None => {
                        let (_, suffix) = algorithm_name.split_once('-').unwrap_or_default();
                        let bits = (data.len() * 8).to_string();
                        ["A", &bits, suffix].concat()
                    },
                };
                if alg != expected {
                    return algorithm_mismatch_error(algorithm_name);
                }
            }
            Ok(data.len() * 8)
        },
        KeyFormatData::Raw(bytes) => {
            *data = bytes;
            Ok(data.len() * 8)
        },
        _ => Err(Error::not_supported(
            [
                algorithm_name,
                " only supports the 'raw' and 'jwk' import formats",
            ]
            .concat(),
        )),
    }
}

/// Maps a JWK `alg` value to its numeric hash suffix, checking it belongs to
/// the requested RSA algorithm. A bare "RSA-OAEP" means SHA-1.
fn rsa_jwk_hash_suffix<'a>(algorithm_name: &str, alg: &'a str) -> Result<&'a str> {
    if let Some(rest) = alg.strip_prefix("RSA-OAEP") {
        if algorithm_name != "RSA-OAEP" {
            return algorithm_mismatch_error(algorithm_name);
        }
        return match rest {
            "" => Ok("1"),
            _ => rest
                .strip_prefix('-')
                .ok_or_else(|| Error::data(["Invalid JWK alg: ", alg].concat())),
        };
    }
    if let Some(rest) = alg.strip_prefix("PS") {
        if algorithm_name != "RSA-PSS" {
            return algorithm_mismatch_error(algorithm_name);
        }
        return Ok(rest);
    }
    if let Some(rest) = alg.strip_prefix("RS") {
        if algorithm_name != "RSASSA-PKCS1-v1_5" {
            return algorithm_mismatch_error(algorithm_name);
        }
        return Ok(rest);
    }
    algorithm_mismatch_error(algorithm_name)
}

fn import_rsa_key(
    format: KeyFormatData,
    kind: &mut KeyKind,
    data: &mut Vec<u8>,
    algorithm_name: &str,
    hash: &ShaAlgorithm,
) -> Result<(u32, Box<[u8]>)> {
    fn public_key_info(
        kind: &mut KeyKind,
        data: &mut Vec<u8>,
        public_key: rsa::pkcs1::RsaPublicKey<'_>,
    ) -> Result<(usize, Vec<u8>)> {
        *data = public_key
            .to_der()
            .map_err(|e| Error::data(e.to_string()))?;
        *kind = KeyKind::Public;
        let modulus_length = public_key.modulus.as_bytes().len() * 8;
        let public_exponent = public_key.public_exponent.as_bytes().to_vec();
        Ok((modulus_length, public_exponent))
    }

    macro_rules! uint_from_b64 {
        ($name:ident, $field:expr, $member:literal) => {
            let bytes = match $field {
                Some(value) => bytes_from_b64_url_safe(value)?,
                None => return Err(Error::data(concat!("JWK is missing '", $member, "'"))),
            };
            let $name = UintRef::new(&bytes)
                .map_err(|_| Error::data(concat!("JWK '", $member, "' is not a valid integer")))?;
        };
    }

    let (modulus_length, public_exponent) = match format {
        KeyFormatData::Jwk(jwk) => {
            if jwk.kty.as_deref() != Some("RSA") {
                return algorithm_mismatch_error(algorithm_name);
            }
            if let Some(alg) = jwk.alg.as_deref() {
                if rsa_jwk_hash_suffix(algorithm_name, alg)? != hash.as_numeric_str() {
                    return hash_mismatch_error(hash);
                }
            }
            if jwk.oth.is_some() {
                return Err(Error::not_supported(
                    "RSA keys with more than two primes are not supported",
                ));
            }

            uint_from_b64!(modulus, jwk.n.as_deref(), "n");
            uint_from_b64!(public_exponent, jwk.e.as_deref(), "e");
            let modulus_length = modulus.as_bytes().len() * 8;

            if let Some(d) = jwk.d.as_deref() {
                uint_from_b64!(private_exponent, Some(d), "d");
                uint_from_b64!(prime1, jwk.p.as_deref(), "p");
                uint_from_b64!(prime2, jwk.q.as_deref(), "q");
                uint_from_b64!(exponent1, jwk.dp.as_deref(), "dp");
                uint_from_b64!(exponent2, jwk.dq.as_deref(), "dq");
                uint_from_b64!(coefficient, jwk.qi.as_deref(), "qi");

                let private_key = rsa::pkcs1::RsaPrivateKey {
                    modulus,
                    public_exponent,
                    private_exponent,
                    prime1,
                    prime2,
                    exponent1,
                    exponent2,
                    coefficient,
                    other_prime_infos: None,
                };

                *data = private_key
                    .to_der()
                    .map_err(|e| Error::data(e.to_string()))?;
                *kind = KeyKind::Private;
                (modulus_length, public_exponent.as_bytes().to_vec())
            } else {
                let public_key = rsa::pkcs1::RsaPublicKey {
                    modulus,
                    public_exponent,
                };
                public_key_info(kind, data, public_key)?
            }
        },
        KeyFormatData::Pkcs8(bytes) => {
            let pk_info =
                PrivateKeyInfo::from_der(&bytes).map_err(|e| Error::data(e.to_string()))?;
            if pk_info.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
                return algorithm_mismatch_error(algorithm_name);
            }

            let private_key = rsa::pkcs1::RsaPrivateKey::from_der(pk_info.private_key)
                .map_err(|e| Error::data(e.to_string()))?;
            if private_key.other_prime_infos.is_some() {
                return Err(Error::not_supported(
                    "RSA keys with more than two primes are not supported",
                ));
            }

            let public_exponent = private_key.public_exponent.as_bytes().to_vec();
            let modulus_length = private_key.modulus.as_bytes().len() * 8;
            *data = pk_info.private_key.to_vec();
            *kind = KeyKind::Private;

            (modulus_length, public_exponent)
        },
        KeyFormatData::Spki(bytes) => {
            let pk_info = SubjectPublicKeyInfoRef::try_from(bytes.as_slice())
                .map_err(|e| Error::data(e.to_string()))?;
            if pk_info.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
                return algorithm_mismatch_error(algorithm_name);
            }

            let public_key =
                rsa::pkcs1::RsaPublicKey::from_der(pk_info.subject_public_key.raw_bytes())
                    .map_err(|e| Error::data(e.to_string()))?;
            public_key_info(kind, data, public_key)?
        },
        KeyFormatData::Raw(_) => {
            return Err(Error::not_supported(
                [algorithm_name, " does not support the 'raw' import format"].concat(),
            ))
        },
    };

    Ok((modulus_length as u32, public_exponent.into_boxed_slice()))
}

/// Decodes a fixed-width base64url field element, left-padding shorter
/// values with zeroes.
fn decode_fixed(value: &str, size: usize) -> Result<Vec<u8>> {
    let bytes = bytes_from_b64_url_safe(value)?;
    if bytes.len() > size {
        return Err(Error::data("Field element is too large for the curve"));
    }
    let mut out = vec![0u8; size - bytes.len()];
    out.extend_from_slice(&bytes);
    Ok(out)
}

/// Parses a SEC1 point for `curve`, returning its canonical uncompressed
/// encoding.
pub fn ec_point_from_sec1(curve: EllipticCurve, bytes: &[u8]) -> Result<Vec<u8>> {
    let point = match curve {
        EllipticCurve::P256 => p256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|_| Error::data("Invalid P-256 public key"))?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EllipticCurve::P384 => p384::PublicKey::from_sec1_bytes(bytes)
            .map_err(|_| Error::data("Invalid P-384 public key"))?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EllipticCurve::P521 => p521::PublicKey::from_sec1_bytes(bytes)
            .map_err(|_| Error::data("Invalid P-521 public key"))?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
    };
    Ok(point)
}

fn ec_public_from_jwk(curve: EllipticCurve, x: &str, y: &str) -> Result<Vec<u8>> {
    let size = curve.field_size();
    let x = decode_fixed(x, size)?;
    let y = decode_fixed(y, size)?;

    macro_rules! point_for {
        ($crate_:ident) => {{
            let point = $crate_::EncodedPoint::from_affine_coordinates(
                $crate_::FieldBytes::from_slice(&x),
                $crate_::FieldBytes::from_slice(&y),
                false,
            );
            let key: Option<$crate_::PublicKey> =
                $crate_::PublicKey::from_encoded_point(&point).into();
            key.ok_or_else(|| Error::data("Point is not on the curve"))?;
            point.as_bytes().to_vec()
        }};
    }

    Ok(match curve {
        EllipticCurve::P256 => point_for!(p256),
        EllipticCurve::P384 => point_for!(p384),
        EllipticCurve::P521 => point_for!(p521),
    })
}

fn ec_private_from_scalar(curve: EllipticCurve, d: &[u8]) -> Result<Vec<u8>> {
    match curve {
        EllipticCurve::P256 => {
            p256::SecretKey::from_slice(d).map_err(|_| Error::data("Invalid P-256 private key"))?;
        },
        EllipticCurve::P384 => {
            p384::SecretKey::from_slice(d).map_err(|_| Error::data("Invalid P-384 private key"))?;
        },
        EllipticCurve::P521 => {
            p521::SecretKey::from_slice(d).map_err(|_| Error::data("Invalid P-521 private key"))?;
        },
    }
    Ok(d.to_vec())
}

fn import_ec_key(
    format: KeyFormatData,
    kind: &mut KeyKind,
    data: &mut Vec<u8>,
    algorithm_name: &str,
    curve: EllipticCurve,
) -> Result<()> {
    match format {
        KeyFormatData::Jwk(jwk) => {
            if jwk.kty.as_deref() != Some("EC") {
                return algorithm_mismatch_error(algorithm_name);
            }
            if jwk.crv.as_deref() != Some(curve.as_str()) {
                return Err(Error::data(
                    ["JWK 'crv' must be ", curve.as_str()].concat(),
                ));
            }

            if let Some(d) = jwk.d.as_deref() {
                let d = decode_fixed(d, curve.field_size())?;
                *data = ec_private_from_scalar(curve, &d)?;
                *kind = KeyKind::Private;
            } else {
                let x = jwk
                    .x
                    .as_deref()
                    .ok_or_else(|| Error::data("JWK is missing 'x'"))?;
                let y = jwk
                    .y
                    .as_deref()
                    .ok_or_else(|| Error::data("JWK is missing 'y'"))?;
                *data = ec_public_from_jwk(curve, x, y)?;
                *kind = KeyKind::Public;
            }
        },
        KeyFormatData::Raw(bytes) => {
            *data = ec_point_from_sec1(curve, &bytes)?;
            *kind = KeyKind::Public;
        },
        KeyFormatData::Spki(bytes) => {
            let spki = SubjectPublicKeyInfoRef::try_from(bytes.as_slice())
                .map_err(|e| Error::data(e.to_string()))?;
            if spki.algorithm.oid != const_oid::db::rfc5912::ID_EC_PUBLIC_KEY {
                return algorithm_mismatch_error(algorithm_name);
            }
            let params_oid = spki
                .algorithm
                .parameters_oid()
                .map_err(|e| Error::data(e.to_string()))?;
            if params_oid != curve.oid() {
                return Err(Error::data(
                    ["Key is not a ", curve.as_str(), " key"].concat(),
                ));
            }
            *data = ec_point_from_sec1(curve, spki.subject_public_key.raw_bytes())?;
            *kind = KeyKind::Public;
        },
        KeyFormatData::Pkcs8(bytes) => {
            // from_pkcs8_der checks both the algorithm OID and the curve.
            let scalar = match curve {
                EllipticCurve::P256 => p256::SecretKey::from_pkcs8_der(&bytes)
                    .map_err(|e| Error::data(e.to_string()))?
                    .to_bytes()
                    .to_vec(),
                EllipticCurve::P384 => p384::SecretKey::from_pkcs8_der(&bytes)
                    .map_err(|e| Error::data(e.to_string()))?
                    .to_bytes()
                    .to_vec(),
                EllipticCurve::P521 => p521::SecretKey::from_pkcs8_der(&bytes)
                    .map_err(|e| Error::data(e.to_string()))?
                    .to_bytes()
                    .to_vec(),
            };
            *data = scalar;
            *kind = KeyKind::Private;
        },
    };
    Ok(())
}

fn import_okp_key(
    format: KeyFormatData,
    kind: &mut KeyKind,
    data: &mut Vec<u8>,
    curve: OkpCurve,
) -> Result<()> {
    let algorithm_name = curve.as_str();
    let check_public_len = |bytes: &[u8]| -> Result<()> {
        if bytes.len() != curve.public_key_len() {
            return Err(Error::data(
                [
                    algorithm_name,
                    " public keys must be ",
                    &curve.public_key_len().to_string(),
                    " bytes long",
                ]
                .concat(),
            ));
        }
        Ok(())
    };

    match format {
        KeyFormatData::Jwk(jwk) => {
            if jwk.kty.as_deref() != Some("OKP") {
                return algorithm_mismatch_error(algorithm_name);
            }
            if jwk.crv.as_deref() != Some(algorithm_name) {
                return Err(Error::data(
                    ["JWK 'crv' must be ", algorithm_name].concat(),
                ));
            }
            if curve.is_signature() {
                if let Some(alg) = jwk.alg.as_deref() {
                    if alg != algorithm_name {
                        return algorithm_mismatch_error(algorithm_name);
                    }
                }
            }

            if let Some(d) = jwk.d.as_deref() {
                let private_key = bytes_from_b64_url_safe(d)?;
                if private_key.len() != curve.private_key_len() {
                    return Err(Error::data(
                        [
                            algorithm_name,
                            " private keys must be ",
                            &curve.private_key_len().to_string(),
                            " bytes long",
                        ]
                        .concat(),
                    ));
                }
                *data = private_key;
                *kind = KeyKind::Private;
            } else {
                let x = jwk
                    .x
                    .as_deref()
                    .ok_or_else(|| Error::data("JWK is missing 'x'"))?;
                let public_key = bytes_from_b64_url_safe(x)?;
                check_public_len(&public_key)?;
                *data = public_key;
                *kind = KeyKind::Public;
            }
        },
        KeyFormatData::Raw(bytes) => {
            check_public_len(&bytes)?;
            *data = bytes;
            *kind = KeyKind::Public;
        },
        KeyFormatData::Spki(bytes) => {
            let spki = SubjectPublicKeyInfoRef::try_from(bytes.as_slice())
                .map_err(|e| Error::data(e.to_string()))?;
            if spki.algorithm.oid != curve.oid() {
                return algorithm_mismatch_error(algorithm_name);
            }
            let public_key = spki.subject_public_key.raw_bytes();
            check_public_len(public_key)?;
            *data = public_key.to_vec();
            *kind = KeyKind::Public;
        },
        KeyFormatData::Pkcs8(bytes) => {
            let pk_info =
                PrivateKeyInfo::from_der(&bytes).map_err(|e| Error::data(e.to_string()))?;
            if pk_info.algorithm.oid != curve.oid() {
                return algorithm_mismatch_error(algorithm_name);
            }
            // RFC 8410: the private key is a CurvePrivateKey, an OCTET
            // STRING nested inside the PKCS#8 privateKey field.
            let inner = OctetStringRef::from_der(pk_info.private_key)
                .map_err(|e| Error::data(e.to_string()))?;
            let private_key = inner.as_bytes();
            if private_key.len() != curve.private_key_len() {
                return Err(Error::data(
                    [algorithm_name, " private key has an invalid length"].concat(),
                ));
            }
            *data = private_key.to_vec();
            *kind = KeyKind::Private;
        },
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::subtle::key_usage::KeyUsage;

    fn import_mode<'a>(
        format: KeyFormatData,
        kind: &'a mut KeyKind,
        data: &'a mut Vec<u8>,
    ) -> KeyAlgorithmMode<'a> {
        KeyAlgorithmMode::Import { format, kind, data }
    }

    #[test]
    fn aes_raw_import() {
        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let result = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Raw(vec![7u8; 16]), &mut kind, &mut data),
            &"AES-GCM".into(),
            &[KeyUsage::Encrypt, KeyUsage::Decrypt],
        )
        .unwrap();

        assert_eq!(result.name, "AES-GCM");
        assert!(matches!(result.algorithm, KeyAlgorithm::Aes { length: 128 }));
        assert_eq!(data, vec![7u8; 16]);
    }

    #[test]
    fn aes_raw_import_rejects_odd_length() {
        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Raw(vec![7u8; 17]), &mut kind, &mut data),
            &"AES-GCM".into(),
            &[KeyUsage::Encrypt],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn algorithm_names_are_case_insensitive() {
        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let result = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Raw(vec![7u8; 32]), &mut kind, &mut data),
            &"aes-cbc".into(),
            &[KeyUsage::Encrypt],
        )
        .unwrap();
        assert_eq!(result.name, "AES-CBC");
    }

    #[test]
    fn aes_jwk_alg_mismatch_is_data_error() {
        let jwk = JsonWebKey {
            kty: Some("oct".into()),
            // 16 bytes of key data but an alg claiming 256 bits.
            k: Some("AAAAAAAAAAAAAAAAAAAAAA".into()),
            alg: Some("A256GCM".into()),
            ..Default::default()
        };
        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Jwk(jwk), &mut kind, &mut data),
            &"AES-GCM".into(),
            &[KeyUsage::Encrypt],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn aes_kw_rejects_encrypt_usage() {
        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Raw(vec![7u8; 16]), &mut kind, &mut data),
            &"AES-KW".into(),
            &[KeyUsage::Encrypt],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn rsa_private_jwk_requires_crt_fields() {
        let jwk = JsonWebKey {
            kty: Some("RSA".into()),
            n: Some("AQAB".into()),
            e: Some("AQAB".into()),
            d: Some("AQAB".into()),
            ..Default::default()
        };
        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Jwk(jwk), &mut kind, &mut data),
            &AlgorithmIdentifier::from(
                Params::new()
                    .with("name", "RSA-PSS")
                    .with("hash", "SHA-256"),
            ),
            &[KeyUsage::Sign],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn rsa_multi_prime_jwk_is_rejected() {
        let jwk = JsonWebKey {
            kty: Some("RSA".into()),
            n: Some("AQAB".into()),
            e: Some("AQAB".into()),
            oth: Some(vec![crate::subtle::jwk::RsaOtherPrimesInfo {
                r: "AQ".into(),
                d: "AQ".into(),
                t: "AQ".into(),
            }]),
            ..Default::default()
        };
        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Jwk(jwk), &mut kind, &mut data),
            &AlgorithmIdentifier::from(
                Params::new()
                    .with("name", "RSA-OAEP")
                    .with("hash", "SHA-256"),
            ),
            &[KeyUsage::Decrypt],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn ecdh_public_import_requires_empty_usages() {
        use rand::rngs::OsRng;
        use spki::EncodePublicKey;

        let secret = p256::SecretKey::random(&mut OsRng);
        let spki_der = secret
            .public_key()
            .to_public_key_der()
            .unwrap()
            .into_vec();

        let params = AlgorithmIdentifier::from(
            Params::new()
                .with("name", "ECDH")
                .with("namedCurve", "P-256"),
        );

        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Spki(spki_der.clone()), &mut kind, &mut data),
            &params,
            &[KeyUsage::DeriveBits],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Spki(spki_der), &mut kind, &mut data),
            &params,
            &[],
        )
        .unwrap();
        assert_eq!(kind, KeyKind::Public);
        // Canonical uncompressed SEC1 point.
        assert_eq!(data.len(), 65);
        assert_eq!(data[0], 0x04);
    }

    #[test]
    fn ec_spki_curve_mismatch_is_data_error() {
        use rand::rngs::OsRng;
        use spki::EncodePublicKey;

        let secret = p384::SecretKey::random(&mut OsRng);
        let spki_der = secret
            .public_key()
            .to_public_key_der()
            .unwrap()
            .into_vec();

        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Spki(spki_der), &mut kind, &mut data),
            &AlgorithmIdentifier::from(
                Params::new()
                    .with("name", "ECDSA")
                    .with("namedCurve", "P-256"),
            ),
            &[KeyUsage::Verify],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn okp_jwk_crv_mismatch_is_data_error() {
        let jwk = JsonWebKey {
            kty: Some("OKP".into()),
            crv: Some("X25519".into()),
            x: Some(crate::encoding::bytes_to_b64_url_safe_string(&[9u8; 32])),
            ..Default::default()
        };
        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Jwk(jwk), &mut kind, &mut data),
            &"Ed25519".into(),
            &[],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn hkdf_import_is_raw_only() {
        let jwk = JsonWebKey {
            kty: Some("oct".into()),
            k: Some("AAAA".into()),
            ..Default::default()
        };
        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Jwk(jwk), &mut kind, &mut data),
            &"HKDF".into(),
            &[KeyUsage::DeriveBits],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn kdf_generate_is_not_supported() {
        let err = KeyAlgorithm::from_params(
            KeyAlgorithmMode::Generate,
            &"PBKDF2".into(),
            &[KeyUsage::DeriveKey],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn rsa_oaep_generate_splits_usages_between_halves() {
        use crate::subtle::key_usage::{DECRYPT, ENCRYPT, UNWRAP_KEY, WRAP_KEY};

        let result = KeyAlgorithm::from_params(
            KeyAlgorithmMode::Generate,
            &AlgorithmIdentifier::from(
                Params::new()
                    .with("name", "RSA-OAEP")
                    .with("hash", "SHA-256")
                    .with("modulusLength", 2048u32)
                    .with("publicExponent", vec![0x01, 0x00, 0x01]),
            ),
            &[
                KeyUsage::Encrypt,
                KeyUsage::Decrypt,
                KeyUsage::WrapKey,
                KeyUsage::UnwrapKey,
            ],
        )
        .unwrap();
        assert_eq!(result.public_usages, ENCRYPT | WRAP_KEY);
        assert_eq!(result.private_usages, DECRYPT | UNWRAP_KEY);
    }

    #[test]
    fn spki_with_trailing_bytes_is_data_error() {
        use rand::rngs::OsRng;
        use spki::EncodePublicKey;

        let secret = p256::SecretKey::random(&mut OsRng);
        let mut spki_der = secret
            .public_key()
            .to_public_key_der()
            .unwrap()
            .into_vec();
        spki_der.push(0x00);

        let mut kind = KeyKind::Secret;
        let mut data = Vec::new();
        let err = KeyAlgorithm::from_params(
            import_mode(KeyFormatData::Spki(spki_der), &mut kind, &mut data),
            &AlgorithmIdentifier::from(
                Params::new()
                    .with("name", "ECDSA")
                    .with("namedCurve", "P-256"),
            ),
            &[],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn hmac_generate_defaults_length_to_block_size() {
        let result = KeyAlgorithm::from_params(
            KeyAlgorithmMode::Generate,
            &AlgorithmIdentifier::from(
                Params::new().with("name", "HMAC").with("hash", "SHA-512"),
            ),
            &[KeyUsage::Sign, KeyUsage::Verify],
        )
        .unwrap();
        match result.algorithm {
            KeyAlgorithm::Hmac { length, .. } => assert_eq!(length, 1024),
            other => panic!("unexpected algorithm: {:?}", other),
        }
    }
}
