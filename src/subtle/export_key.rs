// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use der::asn1::{AnyRef, BitStringRef, OctetString};
use der::{Decode, Encode};
use elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::PrivateKeyInfo;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::EncodePublicKey;
use spki::{AlgorithmIdentifier, SubjectPublicKeyInfo};

use crate::encoding::{base64_url_uint_encode, bytes_to_b64_url_safe_string};
use crate::error::{Error, Result};
use crate::sha_hash::ShaAlgorithm;
use crate::subtle::crypto_key::{CryptoKey, KeyKind};
use crate::subtle::jwk::JsonWebKey;
use crate::subtle::key_algorithm::{ec_point_from_sec1, KeyAlgorithm, KeyFormat};
use crate::subtle::{algorithm_not_supported_error, EllipticCurve, OkpCurve};

/// What `export_key` produces: raw/spki/pkcs8 exports are byte buffers, jwk
/// exports a structured key.
#[derive(Debug)]
pub enum ExportOutput {
    Bytes(Vec<u8>),
    Jwk(JsonWebKey),
}

pub fn export_key(format: KeyFormat, key: &CryptoKey) -> Result<ExportOutput> {
    if matches!(key.algorithm(), KeyAlgorithm::Hkdf | KeyAlgorithm::Pbkdf2) {
        return Err(Error::not_supported(
            [key.name(), " keys cannot be exported"].concat(),
        ));
    }
    if !key.extractable() {
        return Err(Error::invalid_access("The key is not extractable"));
    }

    match format {
        KeyFormat::Raw => export_raw(key),
        KeyFormat::Spki => export_spki(key),
        KeyFormat::Pkcs8 => export_pkcs8(key),
        KeyFormat::Jwk => Ok(ExportOutput::Jwk(export_jwk(key)?)),
    }
}

fn export_raw(key: &CryptoKey) -> Result<ExportOutput> {
    match (key.algorithm(), key.kind()) {
        (KeyAlgorithm::Aes { .. } | KeyAlgorithm::Hmac { .. }, KeyKind::Secret)
        | (KeyAlgorithm::Ec { .. }, KeyKind::Public)
        | (KeyAlgorithm::Okp { .. }, KeyKind::Public) => {
            Ok(ExportOutput::Bytes(key.handle().to_vec()))
        },
        _ => Err(Error::not_supported(
            [
                "The 'raw' format does not apply to ",
                key.kind().as_str(),
                " ",
                key.name(),
                " keys",
            ]
            .concat(),
        )),
    }
}

fn export_spki(key: &CryptoKey) -> Result<ExportOutput> {
    key.check_kind(&[KeyKind::Public])?;

    let der = match key.algorithm() {
        KeyAlgorithm::Rsa { .. } => {
            let public_key = rsa::RsaPublicKey::from_pkcs1_der(key.handle())
                .map_err(|e| Error::operation(e.to_string()))?;
            public_key
                .to_public_key_der()
                .map_err(|e| Error::operation(e.to_string()))?
                .into_vec()
        },
        KeyAlgorithm::Ec { curve, .. } => ec_spki(*curve, key.handle())?,
        KeyAlgorithm::Okp { curve } => {
            let spki: SubjectPublicKeyInfo<AnyRef<'_>, BitStringRef<'_>> =
                SubjectPublicKeyInfo {
                    algorithm: AlgorithmIdentifier {
                        oid: curve.oid(),
                        parameters: None,
                    },
                    subject_public_key: BitStringRef::from_bytes(key.handle())
                        .map_err(|e| Error::operation(e.to_string()))?,
                };
            spki.to_der().map_err(|e| Error::operation(e.to_string()))?
        },
        _ => {
            return Err(Error::not_supported(
                ["The 'spki' format does not apply to ", key.name(), " keys"].concat(),
            ))
        },
    };
    Ok(ExportOutput::Bytes(der))
}

fn ec_spki(curve: EllipticCurve, point: &[u8]) -> Result<Vec<u8>> {
    let der = match curve {
        EllipticCurve::P256 => p256::PublicKey::from_sec1_bytes(point)
            .map_err(|e| Error::operation(e.to_string()))?
            .to_public_key_der(),
        EllipticCurve::P384 => p384::PublicKey::from_sec1_bytes(point)
            .map_err(|e| Error::operation(e.to_string()))?
            .to_public_key_der(),
        EllipticCurve::P521 => p521::PublicKey::from_sec1_bytes(point)
            .map_err(|e| Error::operation(e.to_string()))?
            .to_public_key_der(),
    };
    Ok(der.map_err(|e| Error::operation(e.to_string()))?.into_vec())
}

fn export_pkcs8(key: &CryptoKey) -> Result<ExportOutput> {
    key.check_kind(&[KeyKind::Private])?;

    let der = match key.algorithm() {
        KeyAlgorithm::Rsa { .. } => {
            let pk_info = PrivateKeyInfo::new(
                AlgorithmIdentifier {
                    oid: const_oid::db::rfc5912::RSA_ENCRYPTION,
                    parameters: Some(AnyRef::NULL),
                },
                key.handle(),
            );
            pk_info
                .to_der()
                .map_err(|e| Error::operation(e.to_string()))?
        },
        KeyAlgorithm::Ec { curve, .. } => ec_pkcs8(*curve, key.handle())?,
        KeyAlgorithm::Okp { curve } => {
            // RFC 8410 nests the key in an inner OCTET STRING.
            let inner = OctetString::new(key.handle())
                .map_err(|e| Error::operation(e.to_string()))?
                .to_der()
                .map_err(|e| Error::operation(e.to_string()))?;
            let pk_info = PrivateKeyInfo::new(
                AlgorithmIdentifier {
                    oid: curve.oid(),
                    parameters: None,
                },
                &inner,
            );
            pk_info
                .to_der()
                .map_err(|e| Error::operation(e.to_string()))?
        },
        _ => {
            return Err(Error::not_supported(
                ["The 'pkcs8' format does not apply to ", key.name(), " keys"].concat(),
            ))
        },
    };
    Ok(ExportOutput::Bytes(der))
}

fn ec_pkcs8(curve: EllipticCurve, scalar: &[u8]) -> Result<Vec<u8>> {
    use elliptic_curve::pkcs8::EncodePrivateKey;

    let der = match curve {
        EllipticCurve::P256 => p256::SecretKey::from_slice(scalar)
            .map_err(|e| Error::operation(e.to_string()))?
            .to_pkcs8_der(),
        EllipticCurve::P384 => p384::SecretKey::from_slice(scalar)
            .map_err(|e| Error::operation(e.to_string()))?
            .to_pkcs8_der(),
        EllipticCurve::P521 => p521::SecretKey::from_slice(scalar)
            .map_err(|e| Error::operation(e.to_string()))?
            .to_pkcs8_der(),
    };
    Ok(der
        .map_err(|e| Error::operation(e.to_string()))?
        .to_bytes()
        .to_vec())
}

fn export_jwk(key: &CryptoKey) -> Result<JsonWebKey> {
    let mut jwk = JsonWebKey {
        ext: Some(key.extractable()),
        key_ops: Some(
            key.usages()
                .iter()
                .map(|usage| usage.as_str().to_string())
                .collect(),
        ),
        ..Default::default()
    };

    match key.algorithm() {
        KeyAlgorithm::Aes { length } => {
            jwk.kty = Some("oct".into());
            jwk.k = Some(bytes_to_b64_url_safe_string(key.handle()));
            let (_, suffix) = key.name().split_once('-').unwrap_or_default();
            jwk.alg = Some(["A", &length.to_string(), suffix].concat());
        },
        KeyAlgorithm::Hmac { hash, .. } => {
            jwk.kty = Some("oct".into());
            jwk.k = Some(bytes_to_b64_url_safe_string(key.handle()));
            jwk.alg = Some(["HS", hash.as_numeric_str()].concat());
        },
        KeyAlgorithm::Rsa { hash, .. } => {
            jwk.kty = Some("RSA".into());
            jwk.alg = Some(rsa_jwk_alg(key.name(), *hash));
            match key.kind() {
                KeyKind::Public => {
                    let public_key = rsa::pkcs1::RsaPublicKey::from_der(key.handle())
                        .map_err(|e| Error::operation(e.to_string()))?;
                    jwk.n = Some(base64_url_uint_encode(public_key.modulus.as_bytes()));
                    jwk.e = Some(base64_url_uint_encode(
                        public_key.public_exponent.as_bytes(),
                    ));
                },
                KeyKind::Private => {
                    let private_key = rsa::pkcs1::RsaPrivateKey::from_der(key.handle())
                        .map_err(|e| Error::operation(e.to_string()))?;
                    jwk.n = Some(base64_url_uint_encode(private_key.modulus.as_bytes()));
                    jwk.e = Some(base64_url_uint_encode(
                        private_key.public_exponent.as_bytes(),
                    ));
                    jwk.d = Some(base64_url_uint_encode(
                        private_key.private_exponent.as_bytes(),
                    ));
                    jwk.p = Some(base64_url_uint_encode(private_key.prime1.as_bytes()));
                    jwk.q = Some(base64_url_uint_encode(private_key.prime2.as_bytes()));
                    jwk.dp = Some(base64_url_uint_encode(private_key.exponent1.as_bytes()));
                    jwk.dq = Some(base64_url_uint_encode(private_key.exponent2.as_bytes()));
                    jwk.qi = Some(base64_url_uint_encode(private_key.coefficient.as_bytes()));
                },
                KeyKind::Secret => {
                    return Err(Error::operation("RSA keys cannot be secret keys"))
                },
            }
        },
        KeyAlgorithm::Ec { curve, .. } => {
            jwk.kty = Some("EC".into());
            jwk.crv = Some(curve.as_str().into());
            let size = curve.field_size();
            let point = match key.kind() {
                KeyKind::Public => key.handle().to_vec(),
                KeyKind::Private => {
                    jwk.d = Some(bytes_to_b64_url_safe_string(key.handle()));
                    ec_public_point(*curve, key.handle())?
                },
                KeyKind::Secret => {
                    return Err(Error::operation("EC keys cannot be secret keys"))
                },
            };
            // uncompressed SEC1: 0x04 || x || y
            jwk.x = Some(bytes_to_b64_url_safe_string(&point[1..1 + size]));
            jwk.y = Some(bytes_to_b64_url_safe_string(&point[1 + size..]));
        },
        KeyAlgorithm::Okp { curve } => {
            jwk.kty = Some("OKP".into());
            jwk.crv = Some(curve.as_str().into());
            if curve.is_signature() {
                jwk.alg = Some(curve.as_str().into());
            }
            match key.kind() {
                KeyKind::Public => {
                    jwk.x = Some(bytes_to_b64_url_safe_string(key.handle()));
                },
                KeyKind::Private => {
                    jwk.d = Some(bytes_to_b64_url_safe_string(key.handle()));
                    jwk.x = Some(bytes_to_b64_url_safe_string(&okp_public_bytes(
                        *curve,
                        key.handle(),
                    )?));
                },
                KeyKind::Secret => {
                    return Err(Error::operation("OKP keys cannot be secret keys"))
                },
            }
        },
        KeyAlgorithm::Hkdf | KeyAlgorithm::Pbkdf2 => {
            return algorithm_not_supported_error(key.name())
        },
    }

    Ok(jwk)
}

fn rsa_jwk_alg(name: &str, hash: ShaAlgorithm) -> String {
    match name {
        "RSA-OAEP" => match hash {
            ShaAlgorithm::SHA1 => "RSA-OAEP".to_string(),
            _ => ["RSA-OAEP-", hash.as_numeric_str()].concat(),
        },
        "RSA-PSS" => ["PS", hash.as_numeric_str()].concat(),
        _ => ["RS", hash.as_numeric_str()].concat(),
    }
}

/// Recomputes the uncompressed public point from a private scalar.
fn ec_public_point(curve: EllipticCurve, scalar: &[u8]) -> Result<Vec<u8>> {
    let point = match curve {
        EllipticCurve::P256 => p256::SecretKey::from_slice(scalar)
            .map_err(|e| Error::operation(e.to_string()))?
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EllipticCurve::P384 => p384::SecretKey::from_slice(scalar)
            .map_err(|e| Error::operation(e.to_string()))?
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
        EllipticCurve::P521 => p521::SecretKey::from_slice(scalar)
            .map_err(|e| Error::operation(e.to_string()))?
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec(),
    };
    // round-trips through the validating parser
    ec_point_from_sec1(curve, &point)
}

fn okp_public_bytes(curve: OkpCurve, private: &[u8]) -> Result<Vec<u8>> {
    Ok(match curve {
        OkpCurve::Ed25519 => {
            let seed: [u8; 32] = private
                .try_into()
                .map_err(|_| Error::operation("Invalid Ed25519 private key"))?;
            ed25519_dalek::SigningKey::from_bytes(&seed)
                .verifying_key()
                .to_bytes()
                .to_vec()
        },
        OkpCurve::X25519 => {
            let seed: [u8; 32] = private
                .try_into()
                .map_err(|_| Error::operation("Invalid X25519 private key"))?;
            x25519_dalek::PublicKey::from(&x25519_dalek::StaticSecret::from(seed))
                .as_bytes()
                .to_vec()
        },
        OkpCurve::X448 => {
            let secret = x448::Secret::from_bytes(private)
                .ok_or_else(|| Error::operation("Invalid X448 private key"))?;
            x448::PublicKey::from(&secret).as_bytes().to_vec()
        },
        // The Ed448 public half cannot be recomputed here.
        OkpCurve::Ed448 => return algorithm_not_supported_error("Ed448"),
    })
}
