use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, NonEmptyString};

/// Login handle of the human user being authorized.
///
/// Only the handle is retained; whatever secret accompanied it is dropped at
/// the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(NonEmptyString);

impl Identity {
    /// Creates an identity from a login handle.
    pub fn new(login: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(login)
            .map(Self)
            .map_err(|_| AppError::CredentialMissing("identity must not be empty".to_owned()))
    }

    /// Returns the login handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Identity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
