//! Second-factor service request and response shapes.
//!
//! The service answers HTTP 200 even when the attempt was not approved; the
//! real outcome sits in two layers of the JSON body. Both layers are kept
//! here so denial detail survives into the rejection message.

use std::collections::BTreeMap;

use rolegate_core::{AppError, AppResult, Identity};
use serde::Deserialize;

/// Path of the blocking authentication endpoint.
pub const SECOND_FACTOR_AUTH_PATH: &str = "/auth/v2/auth";

/// Outer call status reported on success.
pub const STAT_OK: &str = "OK";

/// Inner result reported when the user approved the attempt.
pub const RESULT_ALLOW: &str = "allow";

/// Factor and device selector letting the service pick the registered method.
pub const AUTOMATIC_SELECTION: &str = "auto";

/// Parameters for one step-up authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondFactorAuthRequest {
    username: String,
    factor: &'static str,
    device: &'static str,
}

impl SecondFactorAuthRequest {
    /// Challenges the identity through whatever factor and device it registered.
    #[must_use]
    pub fn automatic(identity: &Identity) -> Self {
        Self {
            username: identity.as_str().to_owned(),
            factor: AUTOMATIC_SELECTION,
            device: AUTOMATIC_SELECTION,
        }
    }

    /// Returns the request parameters keyed by name.
    #[must_use]
    pub fn params(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("username".to_owned(), self.username.clone()),
            ("factor".to_owned(), self.factor.to_owned()),
            ("device".to_owned(), self.device.to_owned()),
        ])
    }
}

/// Parsed body of an authentication call.
///
/// Failure fields such as `code` and `message` are not modelled; a failed
/// call is reported with its raw body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecondFactorResponse {
    /// Outer call status, `OK` when the call itself succeeded.
    pub stat: String,
    /// Nested outcome, present when the call succeeded.
    #[serde(default)]
    pub response: Option<SecondFactorOutcome>,
}

/// Nested decision of an authentication call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SecondFactorOutcome {
    /// `allow` when approved, anything else otherwise.
    #[serde(default)]
    pub result: String,
    /// Machine-readable status such as `allow`, `deny` or `fraud`.
    #[serde(default)]
    pub status: String,
    /// Human-readable status message.
    #[serde(default)]
    pub status_msg: String,
}

/// Interpretation of a parsed second-factor response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondFactorVerdict {
    /// Outer call succeeded and the user approved.
    Approved,
    /// Outer call status was not `OK`.
    CallFailed,
    /// Call succeeded but the nested result was not `allow`.
    Denied {
        /// Nested status.
        status: String,
        /// Nested status message.
        status_msg: String,
    },
}

impl SecondFactorResponse {
    /// Parses a response body.
    pub fn from_json(body: &[u8]) -> AppResult<Self> {
        let parsed: Self = serde_json::from_slice(body).map_err(|error| {
            AppError::SecondFactorMalformedResponse(format!(
                "malformed second factor response: {error}"
            ))
        })?;

        if parsed.stat == STAT_OK && parsed.response.is_none() {
            return Err(AppError::SecondFactorMalformedResponse(
                "malformed second factor response: missing field `response`".to_owned(),
            ));
        }

        Ok(parsed)
    }

    /// Applies the two-layer approval rule.
    #[must_use]
    pub fn verdict(&self) -> SecondFactorVerdict {
        if self.stat != STAT_OK {
            return SecondFactorVerdict::CallFailed;
        }

        match &self.response {
            Some(outcome) if outcome.result == RESULT_ALLOW => SecondFactorVerdict::Approved,
            Some(outcome) => SecondFactorVerdict::Denied {
                status: outcome.status.clone(),
                status_msg: outcome.status_msg.clone(),
            },
            None => SecondFactorVerdict::Denied {
                status: String::new(),
                status_msg: String::new(),
            },
        }
    }
}
