use axum::Json;
use axum::extract::Extension;
use tracing::info;

use crate::dto::CredentialGrantResponse;
use crate::middleware::AuthorizedPrincipal;

/// Hand-off point for the credential issuer; only reached through the gate.
pub async fn issue_credentials_handler(
    Extension(principal): Extension<AuthorizedPrincipal>,
) -> Json<CredentialGrantResponse> {
    info!(
        subject = %principal.identity,
        role = %principal.role,
        "credential request accepted"
    );

    Json(CredentialGrantResponse {
        subject: principal.identity.as_str().to_owned(),
        role: principal.role.as_str().to_owned(),
    })
}
