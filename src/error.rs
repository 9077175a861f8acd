// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The six WebCrypto failure kinds. The embedding layer maps each kind to its
//! own user-visible exception type, so the kind must survive propagation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Type,
    Syntax,
    Data,
    InvalidAccess,
    Operation,
    NotSupported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Type => "TypeError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Data => "DataError",
            ErrorKind::InvalidAccess => "InvalidAccessError",
            ErrorKind::Operation => "OperationError",
            ErrorKind::NotSupported => "NotSupportedError",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{}: {message}", kind.as_str())]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data, message)
    }

    pub fn invalid_access(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidAccess, message)
    }

    pub fn operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Operation, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_preserved_in_display() {
        let err = Error::data("JWK has no 'k' field");
        assert_eq!(err.kind(), ErrorKind::Data);
        assert_eq!(err.to_string(), "DataError: JWK has no 'k' field");
    }
}
