use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rolegate_core::{AppError, AppResult, Identity};
use rolegate_domain::{DirectoryEntry, DirectoryLayout, DirectorySearchRequest, Role};

use crate::{
    DirectoryConnection, DirectoryConnector, RoleValidator, SecondFactorTransport,
    SignedCallRequest, SignedCallResponse, StepUpAuthenticator,
};

use super::{AuthorizationDecision, AuthorizationGate, GateStage};

struct CannedTransport {
    body: &'static str,
}

#[async_trait]
impl SecondFactorTransport for CannedTransport {
    async fn signed_call(&self, _request: SignedCallRequest) -> AppResult<SignedCallResponse> {
        Ok(SignedCallResponse {
            status: 200,
            body: self.body.as_bytes().to_vec(),
        })
    }
}

struct CannedDirectory {
    entries: Vec<DirectoryEntry>,
    binds: AtomicUsize,
}

struct CannedConnection {
    entries: Vec<DirectoryEntry>,
}

#[async_trait]
impl DirectoryConnection for CannedConnection {
    async fn search(
        &mut self,
        _request: &DirectorySearchRequest,
    ) -> AppResult<Vec<DirectoryEntry>> {
        Ok(self.entries.clone())
    }

    async fn close(self: Box<Self>) {}
}

#[async_trait]
impl DirectoryConnector for CannedDirectory {
    async fn bind(&self) -> AppResult<Box<dyn DirectoryConnection>> {
        self.binds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CannedConnection {
            entries: self.entries.clone(),
        }))
    }
}

const APPROVED: &str =
    r#"{"stat":"OK","response":{"result":"allow","status":"allow","status_msg":"Success"}}"#;

fn gate(
    second_factor_body: &'static str,
    entries: Vec<DirectoryEntry>,
) -> (AuthorizationGate, Arc<CannedDirectory>) {
    let directory = Arc::new(CannedDirectory {
        entries,
        binds: AtomicUsize::new(0),
    });
    let layout = match DirectoryLayout::new("ou=kube,dc=example,dc=com", None) {
        Ok(layout) => layout,
        Err(error) => panic!("layout should be valid: {error}"),
    };
    let gate = AuthorizationGate::new(
        StepUpAuthenticator::new(Arc::new(CannedTransport {
            body: second_factor_body,
        })),
        RoleValidator::new(directory.clone(), layout),
    );
    (gate, directory)
}

async fn authorize(gate: &AuthorizationGate, login: &str, role: &str) -> AuthorizationDecision {
    let (Ok(identity), Ok(role)) = (Identity::new(login), Role::new(role)) else {
        panic!("fixtures should be valid");
    };
    gate.authorize(&identity, &role).await
}

fn denial_message(decision: AuthorizationDecision) -> Option<String> {
    match decision {
        AuthorizationDecision::Granted => None,
        AuthorizationDecision::Denied { error, .. } => Some(error.to_string()),
    }
}

#[tokio::test]
async fn approved_member_is_granted() {
    let (gate, directory) = gate(
        APPROVED,
        vec![DirectoryEntry::with_login("uid=alice", "alice")],
    );

    let decision = authorize(&gate, "alice", "admins").await;
    assert!(matches!(decision, AuthorizationDecision::Granted));
    assert_eq!(directory.binds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn denied_step_up_never_reaches_directory() {
    let (gate, directory) = gate(
        r#"{"stat":"OK","response":{"result":"deny","status":"denied","status_msg":"user declined"}}"#,
        vec![DirectoryEntry::with_login("uid=bob", "bob")],
    );

    match authorize(&gate, "bob", "admins").await {
        AuthorizationDecision::Denied {
            stage: GateStage::StepUp,
            error: AppError::SecondFactorDenied(message),
        } => {
            assert!(message.contains("denied"));
            assert!(message.contains("user declined"));
        }
        other => panic!("expected step-up denial, got {other:?}"),
    }
    assert_eq!(directory.binds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_step_up_never_reaches_directory() {
    let (gate, directory) = gate("{", Vec::new());

    let decision = authorize(&gate, "alice", "admins").await;
    assert!(matches!(
        decision,
        AuthorizationDecision::Denied {
            stage: GateStage::StepUp,
            error: AppError::SecondFactorMalformedResponse(_),
        }
    ));
    assert_eq!(directory.binds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_member_is_denied_at_role_stage() {
    let (gate, _) = gate(APPROVED, Vec::new());

    let decision = authorize(&gate, "carol", "ops").await;
    let stage = match &decision {
        AuthorizationDecision::Denied { stage, .. } => Some(*stage),
        AuthorizationDecision::Granted => None,
    };
    assert_eq!(stage, Some(GateStage::RoleMembership));

    let message = denial_message(decision);
    assert_eq!(
        message.as_deref(),
        Some("uid=carol,ou=people,ou=kube,dc=example,dc=com is not a member of cn=ops,ou=kube,dc=example,dc=com")
    );
}

#[tokio::test]
async fn ambiguous_membership_is_denied() {
    let (gate, _) = gate(
        APPROVED,
        vec![
            DirectoryEntry::with_login("uid=dave", "dave"),
            DirectoryEntry::with_login("uid=dave,ou=contractors", "dave"),
        ],
    );

    let message = denial_message(authorize(&gate, "dave", "ops").await).unwrap_or_default();
    assert!(message.starts_with("got 2 entries for query"));
}
