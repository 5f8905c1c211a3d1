use serde::Serialize;

/// Health probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Payload returned once a caller passed the authorization gate.
#[derive(Debug, Serialize)]
pub struct CredentialGrantResponse {
    pub subject: String,
    pub role: String,
}
