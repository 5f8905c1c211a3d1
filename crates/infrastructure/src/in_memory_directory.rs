use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use rolegate_application::{DirectoryConnection, DirectoryConnector};
use rolegate_core::{AppError, AppResult, Identity};
use rolegate_domain::{DirectoryEntry, DirectoryLayout, DirectorySearchRequest, Role};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct DirectoryState {
    entries: RwLock<HashMap<(String, String), Vec<DirectoryEntry>>>,
    binds: AtomicUsize,
    closes: AtomicUsize,
    searches: AtomicUsize,
    fail_bind: AtomicBool,
    fail_search: AtomicBool,
}

/// In-memory directory answering searches from canned entries.
///
/// Searches are matched on their exact base and filter; anything else
/// returns no entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<DirectoryState>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entries returned for the membership query of an identity and role.
    pub async fn set_members(
        &self,
        layout: &DirectoryLayout,
        identity: &Identity,
        role: &Role,
        entries: Vec<DirectoryEntry>,
    ) {
        let query = layout.membership_query(identity, role);
        self.state
            .entries
            .write()
            .await
            .insert((query.request.base_dn, query.request.filter), entries);
    }

    /// Registers the identity as the single member of the role group.
    pub async fn add_member(&self, layout: &DirectoryLayout, identity: &Identity, role: &Role) {
        let entry = DirectoryEntry::with_login(layout.user_dn(identity), identity.as_str());
        self.set_members(layout, identity, role, vec![entry]).await;
    }

    /// Makes every following bind fail.
    pub fn fail_binds(&self, fail: bool) {
        self.state.fail_bind.store(fail, Ordering::SeqCst);
    }

    /// Makes every following search fail.
    pub fn fail_searches(&self, fail: bool) {
        self.state.fail_search.store(fail, Ordering::SeqCst);
    }

    /// Number of successful and failed bind attempts.
    #[must_use]
    pub fn bind_count(&self) -> usize {
        self.state.binds.load(Ordering::SeqCst)
    }

    /// Number of released connections.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Number of executed searches.
    #[must_use]
    pub fn search_count(&self) -> usize {
        self.state.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryConnector for InMemoryDirectory {
    async fn bind(&self) -> AppResult<Box<dyn DirectoryConnection>> {
        self.state.binds.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_bind.load(Ordering::SeqCst) {
            return Err(AppError::DirectoryBind(
                "in-memory directory refused bind".to_owned(),
            ));
        }

        Ok(Box::new(InMemoryDirectoryConnection {
            state: self.state.clone(),
        }))
    }
}

struct InMemoryDirectoryConnection {
    state: Arc<DirectoryState>,
}

#[async_trait]
impl DirectoryConnection for InMemoryDirectoryConnection {
    async fn search(&mut self, request: &DirectorySearchRequest) -> AppResult<Vec<DirectoryEntry>> {
        self.state.searches.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_search.load(Ordering::SeqCst) {
            return Err(AppError::DirectorySearch(format!(
                "in-memory directory search under '{}' failed",
                request.base_dn
            )));
        }

        Ok(self
            .state
            .entries
            .read()
            .await
            .get(&(request.base_dn.clone(), request.filter.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn close(self: Box<Self>) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}
