use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use rolegate_application::{SecondFactorTransport, SignedCallRequest, SignedCallResponse};
use rolegate_core::{AppError, AppResult};
use secrecy::SecretString;
use tracing::debug;
use url::Url;

mod signature;

use signature::{CanonicalRequest, authorization_header};

const USER_AGENT: &str = concat!("rolegate/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the second-factor service.
#[derive(Debug)]
pub struct DuoSecondFactorConfig {
    /// Integration key identifying this application.
    pub integration_key: String,
    /// Secret key used to sign requests.
    pub secret_key: SecretString,
    /// API host name, without scheme.
    pub api_host: String,
    /// Upper bound on one blocking call, including the user's response time.
    pub timeout: Duration,
}

/// Signed HTTPS transport for the second-factor service.
pub struct DuoSecondFactorTransport {
    http_client: reqwest::Client,
    integration_key: String,
    secret_key: SecretString,
    api_host: String,
    base_url: Url,
}

impl DuoSecondFactorTransport {
    /// Creates a transport talking HTTPS to the configured API host.
    pub fn new(config: DuoSecondFactorConfig) -> AppResult<Self> {
        let base_url = Url::parse(&format!("https://{}", config.api_host)).map_err(|error| {
            AppError::Validation(format!(
                "invalid second factor API host '{}': {error}",
                config.api_host
            ))
        })?;

        Self::with_base_url(config, base_url)
    }

    /// Creates a transport against an explicit base URL.
    ///
    /// The signature still uses the configured API host.
    pub fn with_base_url(config: DuoSecondFactorConfig, base_url: Url) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build second factor HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            integration_key: config.integration_key,
            secret_key: config.secret_key,
            api_host: config.api_host,
            base_url,
        })
    }
}

#[async_trait]
impl SecondFactorTransport for DuoSecondFactorTransport {
    async fn signed_call(&self, request: SignedCallRequest) -> AppResult<SignedCallResponse> {
        let body = serde_json::to_string(&request.params).map_err(|error| {
            AppError::Internal(format!("failed to encode second factor request: {error}"))
        })?;
        let date = Utc::now().to_rfc2822();
        let authorization = authorization_header(
            &CanonicalRequest {
                date: date.as_str(),
                host: self.api_host.as_str(),
                path: request.path.as_str(),
                body: body.as_str(),
            },
            self.integration_key.as_str(),
            &self.secret_key,
        )?;

        let url = self.base_url.join(&request.path).map_err(|error| {
            AppError::Internal(format!(
                "invalid second factor path '{}': {error}",
                request.path
            ))
        })?;

        let response = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(DATE, date)
            .header(AUTHORIZATION, authorization)
            .body(body)
            .send()
            .await
            .map_err(|error| {
                AppError::SecondFactorTransport(format!("second factor request failed: {error}"))
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|error| {
            AppError::SecondFactorTransport(format!(
                "failed to read second factor response: {error}"
            ))
        })?;

        debug!(
            host = %self.api_host,
            path = %request.path,
            status,
            "second factor call completed"
        );

        Ok(SignedCallResponse {
            status,
            body: body.to_vec(),
        })
    }
}
