// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Loosely-typed algorithm parameter bags.
//!
//! Callers hand every operation an [`AlgorithmIdentifier`]: either a bare
//! algorithm name or a [`Params`] bag whose `"name"` member names the
//! algorithm and whose remaining members carry the per-algorithm parameters.
//! The per-algorithm parsers pull fields out with [`Params::get_required`] /
//! [`Params::get_optional`], which produce `TypeError` on missing or
//! mistyped members.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::subtle::CryptoKey;

#[derive(Debug, Clone)]
pub enum ParamValue {
    Str(String),
    Uint(u64),
    Bool(bool),
    Bytes(Vec<u8>),
    Bag(Params),
    Key(Rc<CryptoKey>),
}

/// How each operation identifies its algorithm: a bare name, or a parameter
/// bag with at least a `"name"` member.
#[derive(Debug, Clone)]
pub enum AlgorithmIdentifier {
    Name(String),
    Params(Params),
}

impl From<&str> for AlgorithmIdentifier {
    fn from(name: &str) -> Self {
        AlgorithmIdentifier::Name(name.into())
    }
}

impl From<String> for AlgorithmIdentifier {
    fn from(name: String) -> Self {
        AlgorithmIdentifier::Name(name)
    }
}

impl From<Params> for AlgorithmIdentifier {
    fn from(params: Params) -> Self {
        AlgorithmIdentifier::Params(params)
    }
}

/// Splits an identifier into its algorithm name and, when present, the bag
/// holding the rest of the parameters.
pub fn to_name_and_maybe_params(
    identifier: &AlgorithmIdentifier,
) -> Result<(String, Option<&Params>)> {
    match identifier {
        AlgorithmIdentifier::Name(name) => Ok((name.clone(), None)),
        AlgorithmIdentifier::Params(params) => {
            let name: String = params.get_required("name")?;
            Ok((name, Some(params)))
        },
    }
}

#[derive(Debug, Clone, Default)]
pub struct Params {
    entries: HashMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn get_required<'a, T: FromParamValue<'a>>(&'a self, key: &str) -> Result<T> {
        match self.entries.get(key) {
            Some(value) => T::from_param_value(value)
                .ok_or_else(|| Error::type_error(Self::wrong_type_message(key, T::EXPECTED))),
            None => Err(Error::type_error(
                ["Algorithm '", key, "' member is required"].concat(),
            )),
        }
    }

    pub fn get_optional<'a, T: FromParamValue<'a>>(&'a self, key: &str) -> Result<Option<T>> {
        match self.entries.get(key) {
            Some(value) => T::from_param_value(value)
                .map(Some)
                .ok_or_else(|| Error::type_error(Self::wrong_type_message(key, T::EXPECTED))),
            None => Ok(None),
        }
    }

    fn wrong_type_message(key: &str, expected: &str) -> String {
        ["Algorithm '", key, "' member must be ", expected].concat()
    }
}

/// Extraction of a typed view from a [`ParamValue`]. `None` means the stored
/// value has the wrong shape, which the accessors turn into `TypeError`.
pub trait FromParamValue<'a>: Sized {
    const EXPECTED: &'static str;

    fn from_param_value(value: &'a ParamValue) -> Option<Self>;
}

impl<'a> FromParamValue<'a> for String {
    const EXPECTED: &'static str = "a string";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for &'a str {
    const EXPECTED: &'static str = "a string";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for u64 {
    const EXPECTED: &'static str = "an unsigned integer";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Uint(n) => Some(*n),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for u32 {
    const EXPECTED: &'static str = "an unsigned 32-bit integer";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Uint(n) => u32::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for u16 {
    const EXPECTED: &'static str = "an unsigned 16-bit integer";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Uint(n) => u16::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for u8 {
    const EXPECTED: &'static str = "an unsigned 8-bit integer";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Uint(n) => u8::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for &'a [u8] {
    const EXPECTED: &'static str = "a byte buffer";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for Vec<u8> {
    const EXPECTED: &'static str = "a byte buffer";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for &'a Params {
    const EXPECTED: &'static str = "an object";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Bag(p) => Some(p),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for AlgorithmIdentifier {
    const EXPECTED: &'static str = "an algorithm name or object";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Str(s) => Some(AlgorithmIdentifier::Name(s.clone())),
            ParamValue::Bag(p) => Some(AlgorithmIdentifier::Params(p.clone())),
            _ => None,
        }
    }
}

impl<'a> FromParamValue<'a> for Rc<CryptoKey> {
    const EXPECTED: &'static str = "a CryptoKey";

    fn from_param_value(value: &'a ParamValue) -> Option<Self> {
        match value {
            ParamValue::Key(k) => Some(k.clone()),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.into())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<u64> for ParamValue {
    fn from(n: u64) -> Self {
        ParamValue::Uint(n)
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        ParamValue::Uint(n as u64)
    }
}

impl From<u16> for ParamValue {
    fn from(n: u16) -> Self {
        ParamValue::Uint(n as u64)
    }
}

impl From<u8> for ParamValue {
    fn from(n: u8) -> Self {
        ParamValue::Uint(n as u64)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(b: Vec<u8>) -> Self {
        ParamValue::Bytes(b)
    }
}

impl From<&[u8]> for ParamValue {
    fn from(b: &[u8]) -> Self {
        ParamValue::Bytes(b.to_vec())
    }
}

impl From<Params> for ParamValue {
    fn from(p: Params) -> Self {
        ParamValue::Bag(p)
    }
}

impl From<Rc<CryptoKey>> for ParamValue {
    fn from(k: Rc<CryptoKey>) -> Self {
        ParamValue::Key(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn required_member_missing_is_type_error() {
        let params = Params::new().with("name", "AES-GCM");
        let err = params.get_required::<Vec<u8>>("iv").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn wrong_member_type_is_type_error() {
        let params = Params::new().with("length", "not a number");
        let err = params.get_required::<u32>("length").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(params.get_optional::<u32>("length").is_err());
    }

    #[test]
    fn optional_member_absent_is_none() {
        let params = Params::new();
        assert!(params.get_optional::<u32>("length").unwrap().is_none());
    }

    #[test]
    fn name_extraction() {
        let plain: AlgorithmIdentifier = "SHA-256".into();
        let (name, rest) = to_name_and_maybe_params(&plain).unwrap();
        assert_eq!(name, "SHA-256");
        assert!(rest.is_none());

        let bag: AlgorithmIdentifier = Params::new()
            .with("name", "AES-CTR")
            .with("length", 64u32)
            .into();
        let (name, rest) = to_name_and_maybe_params(&bag).unwrap();
        assert_eq!(name, "AES-CTR");
        assert_eq!(rest.unwrap().get_required::<u32>("length").unwrap(), 64);
    }

    #[test]
    fn nested_bag_round_trip() {
        let params = Params::new().with("hash", Params::new().with("name", "SHA-384"));
        let hash: &Params = params.get_required("hash").unwrap();
        assert_eq!(hash.get_required::<String>("name").unwrap(), "SHA-384");
    }
}
