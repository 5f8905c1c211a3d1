//! Shared primitives for all Rust crates in Rolegate.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::Identity;

/// Result type used across Rolegate crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Application error categories.
///
/// Every authorization failure renders as the bare message so the gate can
/// hand it back to the caller unchanged.
#[derive(Debug, Error)]
pub enum AppError {
    /// Inbound request carried no usable identity credentials.
    #[error("{0}")]
    CredentialMissing(String),

    /// Network failure or non-200 answer from the second-factor service.
    #[error("{0}")]
    SecondFactorTransport(String),

    /// Second-factor response body did not match the expected shape.
    #[error("{0}")]
    SecondFactorMalformedResponse(String),

    /// Second-factor service answered but did not approve the attempt.
    #[error("{0}")]
    SecondFactorDenied(String),

    /// Directory connection could not be established or bound.
    #[error("{0}")]
    DirectoryBind(String),

    /// Directory search failed at the protocol level.
    #[error("{0}")]
    DirectorySearch(String),

    /// Identity is not (unambiguously) a member of the role group.
    #[error("{0}")]
    RoleNotAuthorized(String),

    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns a stable short label for the error category, used in logs.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::CredentialMissing(_) => "credential_missing",
            Self::SecondFactorTransport(_) => "second_factor_transport",
            Self::SecondFactorMalformedResponse(_) => "second_factor_malformed_response",
            Self::SecondFactorDenied(_) => "second_factor_denied",
            Self::DirectoryBind(_) => "directory_bind",
            Self::DirectorySearch(_) => "directory_search",
            Self::RoleNotAuthorized(_) => "role_not_authorized",
            Self::Validation(_) => "validation",
            Self::Internal(_) => "internal",
        }
    }
}
