//! The two-stage authorization decision.
//!
//! A request is granted only when the identity approves the step-up push and
//! is the single member returned for the role's group. Directory access is
//! skipped entirely when step-up fails.

use rolegate_core::{AppError, Identity};
use rolegate_domain::Role;

use crate::{RoleValidator, StepUpAuthenticator};

/// Stage of the gate that produced a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    /// Second-factor step-up authentication.
    StepUp,
    /// Directory role membership.
    RoleMembership,
}

impl GateStage {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StepUp => "step_up",
            Self::RoleMembership => "role_membership",
        }
    }
}

/// Outcome of validating one identity and role pair.
#[derive(Debug)]
pub enum AuthorizationDecision {
    /// Both checks passed.
    Granted,
    /// A check failed; later stages did not run.
    Denied {
        /// Stage that failed.
        stage: GateStage,
        /// Failure reported by that stage.
        error: AppError,
    },
}

/// Step-up authentication followed by role membership, short-circuiting on
/// the first failure.
#[derive(Clone)]
pub struct AuthorizationGate {
    step_up: StepUpAuthenticator,
    role_validator: RoleValidator,
}

impl AuthorizationGate {
    /// Creates a new gate.
    #[must_use]
    pub fn new(step_up: StepUpAuthenticator, role_validator: RoleValidator) -> Self {
        Self {
            step_up,
            role_validator,
        }
    }

    /// Decides whether the identity may act in the role for this request.
    pub async fn authorize(&self, identity: &Identity, role: &Role) -> AuthorizationDecision {
        if let Err(error) = self.step_up.authenticate(identity).await {
            return AuthorizationDecision::Denied {
                stage: GateStage::StepUp,
                error,
            };
        }

        match self
            .role_validator
            .validate_role_for_user(identity, role)
            .await
        {
            Ok(()) => AuthorizationDecision::Granted,
            Err(error) => AuthorizationDecision::Denied {
                stage: GateStage::RoleMembership,
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests;
