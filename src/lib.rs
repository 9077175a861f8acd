// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Web Cryptography algorithm dispatch and key-material model.
//!
//! The [`subtle`] module carries the SubtleCrypto operation set: encrypt,
//! decrypt, sign, verify, deriveBits, deriveKey, generateKey, importKey,
//! exportKey, wrapKey, unwrapKey and getKeyLength. Algorithms are addressed
//! by name or by a parameter bag ([`Params`]), mirroring how the Web exposes
//! them, and keys are opaque [`subtle::CryptoKey`] handles that carry their
//! algorithm, usages and extractability.

mod encoding;
mod error;
mod params;
mod sha_hash;
pub mod subtle;

pub use error::{Error, ErrorKind, Result};
pub use params::{AlgorithmIdentifier, ParamValue, Params};
pub use sha_hash::ShaAlgorithm;
