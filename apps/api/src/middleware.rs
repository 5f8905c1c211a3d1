use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rolegate_application::AuthorizationDecision;
use rolegate_core::{AppError, AppResult, Identity};
use rolegate_domain::Role;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Identity and role that passed the authorization gate for this request.
#[derive(Debug, Clone)]
pub struct AuthorizedPrincipal {
    pub identity: Identity,
    pub role: Role,
}

/// Runs step-up authentication, then role membership, before the inner handler.
pub async fn require_step_up_and_role(
    State(state): State<AppState>,
    role: Result<Path<String>, PathRejection>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let role = role.map(|Path(role)| role).map_err(|rejection| {
        AppError::Validation(format!("invalid role: {}", rejection.body_text()))
    });
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "authorization_gate",
        %request_id,
        role = role.as_deref().unwrap_or_default()
    );

    let outcome = authorize_request(&state, request.headers(), role)
        .instrument(span)
        .await;

    match outcome {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(error) => Err(ApiError::forbidden(error, state.expose_error_detail)),
    }
}

async fn authorize_request(
    state: &AppState,
    headers: &HeaderMap,
    role: AppResult<String>,
) -> AppResult<AuthorizedPrincipal> {
    let identity = basic_auth_identity(headers).inspect_err(|error| {
        warn!(category = error.category(), %error, "authorization denied");
    })?;
    let role = role.and_then(Role::new).inspect_err(|error| {
        warn!(identity = %identity, category = error.category(), %error, "authorization denied");
    })?;

    match state.authorization_gate.authorize(&identity, &role).await {
        AuthorizationDecision::Granted => {
            info!(identity = %identity, "authorization granted");
            Ok(AuthorizedPrincipal { identity, role })
        }
        AuthorizationDecision::Denied { stage, error } => {
            warn!(
                identity = %identity,
                stage = stage.as_str(),
                category = error.category(),
                %error,
                "authorization denied"
            );
            Err(error)
        }
    }
}

/// Extracts the login from basic-auth credentials; the password is required
/// to be present but is discarded.
fn basic_auth_identity(headers: &HeaderMap) -> AppResult<Identity> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| {
            AppError::CredentialMissing("missing basic authorization credentials".to_owned())
        })?
        .to_str()
        .map_err(|_| malformed_credentials())?;

    let (scheme, encoded) = value.split_once(' ').ok_or_else(malformed_credentials)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AppError::CredentialMissing(format!(
            "unsupported authorization scheme '{scheme}'"
        )));
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(malformed_credentials)?;
    let (login, _password) = decoded.split_once(':').ok_or_else(malformed_credentials)?;

    Identity::new(login)
}

fn malformed_credentials() -> AppError {
    AppError::CredentialMissing("malformed basic authorization credentials".to_owned())
}
