use rolegate_application::AuthorizationGate;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_gate: AuthorizationGate,
    pub expose_error_detail: bool,
}
