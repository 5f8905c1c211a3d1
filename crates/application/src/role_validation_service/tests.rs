use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rolegate_core::{AppError, AppResult, Identity};
use rolegate_domain::{DirectoryEntry, DirectoryLayout, DirectorySearchRequest, Role};
use tokio::sync::Mutex;

use super::{DirectoryConnection, DirectoryConnector, RoleValidator};

#[derive(Default)]
struct Counters {
    binds: AtomicUsize,
    closes: AtomicUsize,
    searches: Mutex<Vec<DirectorySearchRequest>>,
}

enum Script {
    BindFails,
    SearchFails,
    Returns(Vec<DirectoryEntry>),
}

struct ScriptedConnector {
    script: Script,
    counters: Arc<Counters>,
}

struct ScriptedConnection {
    entries: Option<Vec<DirectoryEntry>>,
    counters: Arc<Counters>,
}

#[async_trait]
impl DirectoryConnection for ScriptedConnection {
    async fn search(
        &mut self,
        request: &DirectorySearchRequest,
    ) -> AppResult<Vec<DirectoryEntry>> {
        self.counters.searches.lock().await.push(request.clone());
        self.entries.clone().ok_or_else(|| {
            AppError::DirectorySearch("LDAP Result Code 32 \"No Such Object\"".to_owned())
        })
    }

    async fn close(self: Box<Self>) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DirectoryConnector for ScriptedConnector {
    async fn bind(&self) -> AppResult<Box<dyn DirectoryConnection>> {
        self.counters.binds.fetch_add(1, Ordering::SeqCst);
        let entries = match &self.script {
            Script::BindFails => {
                return Err(AppError::DirectoryBind(
                    "LDAP Result Code 49 \"Invalid Credentials\"".to_owned(),
                ));
            }
            Script::SearchFails => None,
            Script::Returns(entries) => Some(entries.clone()),
        };

        Ok(Box::new(ScriptedConnection {
            entries,
            counters: self.counters.clone(),
        }))
    }
}

fn validator(script: Script) -> (RoleValidator, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let layout = match DirectoryLayout::new("ou=kube,dc=example,dc=com", None) {
        Ok(layout) => layout,
        Err(error) => panic!("layout should be valid: {error}"),
    };
    let connector = ScriptedConnector {
        script,
        counters: counters.clone(),
    };
    (RoleValidator::new(Arc::new(connector), layout), counters)
}

async fn validate(validator: &RoleValidator, login: &str, role: &str) -> AppResult<()> {
    let (Ok(identity), Ok(role)) = (Identity::new(login), Role::new(role)) else {
        panic!("fixtures should be valid");
    };
    validator.validate_role_for_user(&identity, &role).await
}

fn entry(login: &str) -> DirectoryEntry {
    DirectoryEntry::with_login(format!("uid={login},ou=people,ou=kube,dc=example,dc=com"), login)
}

#[tokio::test]
async fn single_matching_entry_is_authorized() {
    let (validator, counters) = validator(Script::Returns(vec![entry("alice")]));

    let result = validate(&validator, "alice", "admins").await;
    assert!(result.is_ok());
    assert_eq!(counters.binds.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);

    let searches = counters.searches.lock().await;
    assert_eq!(searches.len(), 1);
    assert_eq!(
        searches[0].base_dn,
        "uid=alice,ou=people,ou=kube,dc=example,dc=com"
    );
    assert_eq!(
        searches[0].filter,
        "(&(objectClass=person)(memberOf=cn=admins,ou=kube,dc=example,dc=com))"
    );
}

#[tokio::test]
async fn zero_entries_names_user_and_group() {
    let (validator, counters) = validator(Script::Returns(Vec::new()));

    match validate(&validator, "carol", "ops").await {
        Err(AppError::RoleNotAuthorized(message)) => assert_eq!(
            message,
            "uid=carol,ou=people,ou=kube,dc=example,dc=com is not a member of cn=ops,ou=kube,dc=example,dc=com"
        ),
        other => panic!("expected role error, got {other:?}"),
    }
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mismatched_single_entry_is_rejected() {
    let (validator, counters) = validator(Script::Returns(vec![entry("mallory")]));

    match validate(&validator, "alice", "admins").await {
        Err(AppError::RoleNotAuthorized(message)) => assert_eq!(
            message,
            r#""alice" is not a member of "admins"; search returned "mallory""#
        ),
        other => panic!("expected role error, got {other:?}"),
    }
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn single_entry_without_login_attribute_is_rejected() {
    let (validator, _) = validator(Script::Returns(vec![DirectoryEntry::default()]));

    let result = validate(&validator, "alice", "admins").await;
    assert!(matches!(result, Err(AppError::RoleNotAuthorized(_))));
}

#[tokio::test]
async fn multiple_entries_are_ambiguous() {
    let (validator, counters) = validator(Script::Returns(vec![entry("dave"), entry("dave")]));

    match validate(&validator, "dave", "ops").await {
        Err(AppError::RoleNotAuthorized(message)) => {
            assert!(message.starts_with("got 2 entries for query (&(objectClass=person)"));
        }
        other => panic!("expected role error, got {other:?}"),
    }
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn search_failure_still_releases_connection() {
    let (validator, counters) = validator(Script::SearchFails);

    let result = validate(&validator, "alice", "admins").await;
    assert!(matches!(result, Err(AppError::DirectorySearch(_))));
    assert_eq!(counters.binds.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn bind_failure_never_releases() {
    let (validator, counters) = validator(Script::BindFails);

    let result = validate(&validator, "alice", "admins").await;
    assert!(matches!(result, Err(AppError::DirectoryBind(_))));
    assert_eq!(counters.binds.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 0);
    assert!(counters.searches.lock().await.is_empty());
}

#[tokio::test]
async fn role_metacharacters_are_escaped_in_search() {
    let (validator, counters) = validator(Script::Returns(Vec::new()));

    let result = validate(&validator, "alice", "*)(cn=*").await;
    assert!(matches!(result, Err(AppError::RoleNotAuthorized(_))));

    let searches = counters.searches.lock().await;
    assert_eq!(
        searches[0].filter,
        "(&(objectClass=person)(memberOf=cn=\\5c2a\\5c29\\5c28cn\\5c3d\\5c2a,ou=kube,dc=example,dc=com))"
    );
}
