//! Role membership checks against the directory.
//!
//! Each check binds a fresh connection, runs one membership search and
//! releases the connection before the result is interpreted. Exactly one
//! entry whose login matches the identity counts as membership.

use std::sync::Arc;

use async_trait::async_trait;
use rolegate_core::{AppError, AppResult, Identity};
use rolegate_domain::{
    DirectoryEntry, DirectoryLayout, DirectorySearchRequest, MembershipQuery, Role,
};

/// Ready, authenticated directory connection.
#[async_trait]
pub trait DirectoryConnection: Send {
    /// Executes one search request.
    async fn search(&mut self, request: &DirectorySearchRequest) -> AppResult<Vec<DirectoryEntry>>;

    /// Releases the connection.
    async fn close(self: Box<Self>);
}

/// Factory yielding bound directory connections.
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    /// Opens and binds a new connection.
    async fn bind(&self) -> AppResult<Box<dyn DirectoryConnection>>;
}

/// Checks that an identity belongs to the directory group of a role.
#[derive(Clone)]
pub struct RoleValidator {
    connector: Arc<dyn DirectoryConnector>,
    layout: DirectoryLayout,
}

impl RoleValidator {
    /// Creates a new validator.
    #[must_use]
    pub fn new(connector: Arc<dyn DirectoryConnector>, layout: DirectoryLayout) -> Self {
        Self { connector, layout }
    }

    /// Ensures the identity is the single member entry found for the role group.
    ///
    /// The connection is closed exactly once whenever `bind` succeeded,
    /// whatever the outcome of the search.
    pub async fn validate_role_for_user(&self, identity: &Identity, role: &Role) -> AppResult<()> {
        let query = self.layout.membership_query(identity, role);

        let mut connection = self.connector.bind().await?;
        let search_result = connection.search(&query.request).await;
        connection.close().await;

        let entries = search_result?;
        interpret_membership(identity, role, &query, &entries)
    }
}

fn interpret_membership(
    identity: &Identity,
    role: &Role,
    query: &MembershipQuery,
    entries: &[DirectoryEntry],
) -> AppResult<()> {
    match entries {
        [] => Err(AppError::RoleNotAuthorized(format!(
            "{} is not a member of {}",
            query.user_dn, query.role_dn
        ))),
        [entry] => {
            let login = entry.login().unwrap_or_default();
            if login == identity.as_str() {
                Ok(())
            } else {
                Err(AppError::RoleNotAuthorized(format!(
                    "{:?} is not a member of {:?}; search returned {:?}",
                    identity.as_str(),
                    role.as_str(),
                    login
                )))
            }
        }
        _ => Err(AppError::RoleNotAuthorized(format!(
            "got {} entries for query {}: [{}]",
            entries.len(),
            query.request.filter,
            entries
                .iter()
                .map(DirectoryEntry::dn)
                .collect::<Vec<_>>()
                .join(" ")
        ))),
    }
}

#[cfg(test)]
mod tests;
