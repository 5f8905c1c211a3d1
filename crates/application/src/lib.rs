//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_gate;
mod role_validation_service;
mod step_up_service;

pub use authorization_gate::{AuthorizationDecision, AuthorizationGate, GateStage};
pub use role_validation_service::{DirectoryConnection, DirectoryConnector, RoleValidator};
pub use step_up_service::{
    SecondFactorTransport, SignedCallRequest, SignedCallResponse, StepUpAuthenticator,
};
