use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchOptions};
use rolegate_application::{DirectoryConnection, DirectoryConnector};
use rolegate_core::{AppError, AppResult};
use rolegate_domain::{DerefAliases, DirectoryEntry, DirectorySearchRequest, SearchScope};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

/// Connection settings for the directory service.
#[derive(Debug)]
pub struct LdapDirectoryConfig {
    /// Directory URL, `ldap://` or `ldaps://`.
    pub url: String,
    /// Service account used for the simple bind.
    pub bind_dn: String,
    /// Service account password.
    pub bind_password: SecretString,
    /// Timeout applied to connecting, binding and every search.
    pub timeout: Duration,
}

/// Opens one bound connection per call.
pub struct LdapDirectoryConnector {
    config: LdapDirectoryConfig,
}

impl LdapDirectoryConnector {
    /// Creates a new connector.
    #[must_use]
    pub fn new(config: LdapDirectoryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DirectoryConnector for LdapDirectoryConnector {
    async fn bind(&self) -> AppResult<Box<dyn DirectoryConnection>> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.config.timeout);
        let (driver, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(|error| {
                AppError::DirectoryBind(format!(
                    "failed to connect to directory '{}': {error}",
                    self.config.url
                ))
            })?;

        tokio::spawn(async move {
            if let Err(error) = driver.drive().await {
                warn!(%error, "directory connection terminated");
            }
        });

        let bound = ldap
            .with_timeout(self.config.timeout)
            .simple_bind(
                &self.config.bind_dn,
                self.config.bind_password.expose_secret(),
            )
            .await
            .and_then(|result| result.success());

        if let Err(error) = bound {
            let _ = ldap.unbind().await;
            return Err(AppError::DirectoryBind(format!(
                "failed to bind to directory as '{}': {error}",
                self.config.bind_dn
            )));
        }

        Ok(Box::new(LdapDirectoryConnection {
            ldap,
            timeout: self.config.timeout,
        }))
    }
}

struct LdapDirectoryConnection {
    ldap: Ldap,
    timeout: Duration,
}

#[async_trait]
impl DirectoryConnection for LdapDirectoryConnection {
    async fn search(&mut self, request: &DirectorySearchRequest) -> AppResult<Vec<DirectoryEntry>> {
        let options = SearchOptions::new()
            .deref(deref_policy(request.deref_aliases))
            .sizelimit(i32::try_from(request.size_limit).unwrap_or(i32::MAX))
            .timelimit(i32::try_from(request.time_limit).unwrap_or(i32::MAX))
            .typesonly(request.types_only);

        let (entries, _) = self
            .ldap
            .with_search_options(options)
            .with_timeout(self.timeout)
            .search(
                &request.base_dn,
                scope(request.scope),
                &request.filter,
                request.attributes.clone(),
            )
            .await
            .and_then(|result| result.success())
            .map_err(|error| {
                AppError::DirectorySearch(format!(
                    "directory search under '{}' failed: {error}",
                    request.base_dn
                ))
            })?;

        debug!(
            base_dn = %request.base_dn,
            filter = %request.filter,
            entries = entries.len(),
            "directory search completed"
        );

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| DirectoryEntry::new(entry.dn, entry.attrs.into_iter().collect()))
            .collect())
    }

    async fn close(self: Box<Self>) {
        let mut connection = *self;
        if let Err(error) = connection.ldap.unbind().await {
            debug!(%error, "directory unbind failed");
        }
    }
}

fn scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Subtree => Scope::Subtree,
    }
}

fn deref_policy(policy: DerefAliases) -> ldap3::DerefAliases {
    match policy {
        DerefAliases::Never => ldap3::DerefAliases::Never,
    }
}
