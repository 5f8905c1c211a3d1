//! Rolegate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use rolegate_application::{AuthorizationGate, RoleValidator, StepUpAuthenticator};
use rolegate_core::AppError;
use rolegate_infrastructure::{DuoSecondFactorTransport, LdapDirectoryConnector};
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let address = config.socket_address()?;

    let second_factor_host = config.second_factor.api_host.clone();
    let directory_url = config.directory.url.clone();

    let step_up = StepUpAuthenticator::new(Arc::new(DuoSecondFactorTransport::new(
        config.second_factor,
    )?));
    let role_validator = RoleValidator::new(
        Arc::new(LdapDirectoryConnector::new(config.directory)),
        config.directory_layout,
    );

    let app_state = AppState {
        authorization_gate: AuthorizationGate::new(step_up, role_validator),
        expose_error_detail: config.expose_error_detail,
    };
    let app = api_router::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        second_factor_host = %second_factor_host,
        directory_url = %directory_url,
        "rolegate-api listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
