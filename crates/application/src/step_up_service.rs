//! Step-up authentication through the second-factor service.
//!
//! The service answers HTTP 200 for most outcomes, so approval is read from
//! the body: the call status must be `OK` and the nested result `allow`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rolegate_core::{AppError, AppResult, Identity};
use rolegate_domain::{
    SECOND_FACTOR_AUTH_PATH, SecondFactorAuthRequest, SecondFactorResponse, SecondFactorVerdict,
};

/// One signed `POST` to the second-factor service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCallRequest {
    /// Absolute request path.
    pub path: String,
    /// Request parameters.
    pub params: BTreeMap<String, String>,
}

/// Raw answer of the second-factor service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCallResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl SignedCallResponse {
    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Port for signed calls to the second-factor service.
///
/// Implementations own request signing and the bounded wait policy; they
/// report network failures as [`AppError::SecondFactorTransport`].
#[async_trait]
pub trait SecondFactorTransport: Send + Sync {
    /// Performs one signed `POST` and returns the raw answer.
    async fn signed_call(&self, request: SignedCallRequest) -> AppResult<SignedCallResponse>;
}

/// Verifies that an identity approves the current access attempt.
#[derive(Clone)]
pub struct StepUpAuthenticator {
    transport: Arc<dyn SecondFactorTransport>,
}

impl StepUpAuthenticator {
    /// Creates a new authenticator over a transport implementation.
    #[must_use]
    pub fn new(transport: Arc<dyn SecondFactorTransport>) -> Self {
        Self { transport }
    }

    /// Challenges the identity and waits for its answer.
    ///
    /// Returns `Ok(())` only when the call status is `OK` and the nested
    /// result is `allow`. Transport and parse failures surface as their own
    /// error categories, distinct from [`AppError::SecondFactorDenied`].
    pub async fn authenticate(&self, identity: &Identity) -> AppResult<()> {
        let request = SignedCallRequest {
            path: SECOND_FACTOR_AUTH_PATH.to_owned(),
            params: SecondFactorAuthRequest::automatic(identity).params(),
        };

        let response = self.transport.signed_call(request).await?;
        if response.status != 200 {
            return Err(AppError::SecondFactorTransport(format!(
                "expected 200, got {}: {}",
                response.status,
                response.body_text()
            )));
        }

        let parsed = SecondFactorResponse::from_json(&response.body)?;
        match parsed.verdict() {
            SecondFactorVerdict::Approved => Ok(()),
            SecondFactorVerdict::CallFailed => Err(AppError::SecondFactorDenied(format!(
                "request failed: {}",
                response.body_text()
            ))),
            SecondFactorVerdict::Denied { status, status_msg } => Err(
                AppError::SecondFactorDenied(format!("request denied: {status}: {status_msg}")),
            ),
        }
    }
}
