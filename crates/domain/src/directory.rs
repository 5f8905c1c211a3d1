//! Directory naming rules for role membership queries.
//!
//! Role and identity strings are caller supplied, so both are escaped before
//! they become part of a distinguished name (RFC 4514) and the resulting
//! distinguished name is escaped again before it is embedded in a search
//! filter (RFC 4515).

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Write};

use rolegate_core::{AppError, AppResult, Identity, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Canonical login attribute requested from matched entries.
pub const LOGIN_ATTRIBUTE: &str = "uid";

/// Requested privilege level, mapped to exactly one directory group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role(NonEmptyString);

impl Role {
    /// Creates a role from its name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        NonEmptyString::new(value)
            .map(Self)
            .map_err(|_| AppError::Validation("role must not be empty".to_owned()))
    }

    /// Returns the role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Escapes a value for use as an attribute value inside a distinguished name.
///
/// Every character with special meaning in a distinguished name or a search
/// filter is written in `\XX` hex form, so the result never contains a bare
/// separator or filter metacharacter.
#[must_use]
pub fn escape_dn_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());

    for (index, character) in value.chars().enumerate() {
        let special = matches!(
            character,
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' | '=' | '*' | '(' | ')' | '\0'
        ) || (index == 0 && matches!(character, ' ' | '#'))
            || (index == last && character == ' ');

        if special {
            push_hex_escape(&mut escaped, character);
        } else {
            escaped.push(character);
        }
    }

    escaped
}

/// Escapes a value for use as an assertion value inside a search filter.
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for character in value.chars() {
        if matches!(character, '*' | '(' | ')' | '\\' | '\0') {
            push_hex_escape(&mut escaped, character);
        } else {
            escaped.push(character);
        }
    }

    escaped
}

fn push_hex_escape(buffer: &mut String, character: char) {
    let mut encoded = [0_u8; 4];
    for byte in character.encode_utf8(&mut encoded).bytes() {
        let _ = write!(buffer, "\\{byte:02x}");
    }
}

/// Where identities and role groups live in the directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayout {
    search_base: String,
    people_base: String,
}

impl DirectoryLayout {
    /// Creates a layout from the role search base and an optional people base.
    ///
    /// The people base defaults to `ou=people,<search base>`.
    pub fn new(search_base: impl Into<String>, people_base: Option<String>) -> AppResult<Self> {
        let search_base = NonEmptyString::new(search_base).map_err(|_| {
            AppError::Validation("directory search base must not be empty".to_owned())
        })?;
        let search_base = String::from(search_base);
        let people_base = match people_base.filter(|value| !value.trim().is_empty()) {
            Some(value) => value,
            None => format!("ou=people,{search_base}"),
        };

        Ok(Self {
            search_base,
            people_base,
        })
    }

    /// Returns the base under which identities live.
    #[must_use]
    pub fn people_base(&self) -> &str {
        self.people_base.as_str()
    }

    /// Returns the distinguished name of the group representing a role.
    #[must_use]
    pub fn role_group_dn(&self, role: &Role) -> String {
        format!("cn={},{}", escape_dn_value(role.as_str()), self.search_base)
    }

    /// Returns the distinguished name of an identity's own entry.
    #[must_use]
    pub fn user_dn(&self, identity: &Identity) -> String {
        format!(
            "{LOGIN_ATTRIBUTE}={},{}",
            escape_dn_value(identity.as_str()),
            self.people_base
        )
    }

    /// Builds the membership query for one identity and role pair.
    #[must_use]
    pub fn membership_query(&self, identity: &Identity, role: &Role) -> MembershipQuery {
        let user_dn = self.user_dn(identity);
        let role_dn = self.role_group_dn(role);
        let filter = format!(
            "(&(objectClass=person)(memberOf={}))",
            escape_filter_value(role_dn.as_str())
        );

        MembershipQuery {
            request: DirectorySearchRequest {
                base_dn: user_dn.clone(),
                scope: SearchScope::Subtree,
                deref_aliases: DerefAliases::Never,
                size_limit: 0,
                time_limit: 0,
                types_only: false,
                filter,
                attributes: vec![LOGIN_ATTRIBUTE.to_owned()],
            },
            user_dn,
            role_dn,
        }
    }
}

/// Search scope relative to the base entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// The base entry and everything below it.
    Subtree,
}

/// Alias dereferencing policy for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerefAliases {
    /// Never dereference aliases.
    Never,
}

/// Directory search parameters, independent of the client library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySearchRequest {
    /// Base entry of the search.
    pub base_dn: String,
    /// Search scope.
    pub scope: SearchScope,
    /// Alias dereferencing policy.
    pub deref_aliases: DerefAliases,
    /// Maximum number of entries, `0` means no client-side limit.
    pub size_limit: u32,
    /// Maximum seconds, `0` means no client-side limit.
    pub time_limit: u32,
    /// Whether to return attribute names only.
    pub types_only: bool,
    /// Escaped search filter.
    pub filter: String,
    /// Attributes to return.
    pub attributes: Vec<String>,
}

/// Membership query together with the names used to build it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipQuery {
    /// Search to execute.
    pub request: DirectorySearchRequest,
    /// Distinguished name of the identity entry.
    pub user_dn: String,
    /// Distinguished name of the role group.
    pub role_dn: String,
}

/// One entry returned from a directory search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryEntry {
    dn: String,
    attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Creates an entry from its name and attribute values.
    #[must_use]
    pub fn new(dn: impl Into<String>, attributes: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            dn: dn.into(),
            attributes,
        }
    }

    /// Creates an entry exposing only a login attribute.
    #[must_use]
    pub fn with_login(dn: impl Into<String>, login: impl Into<String>) -> Self {
        Self::new(
            dn,
            BTreeMap::from([(LOGIN_ATTRIBUTE.to_owned(), vec![login.into()])]),
        )
    }

    /// Returns the entry's distinguished name.
    #[must_use]
    pub fn dn(&self) -> &str {
        self.dn.as_str()
    }

    /// Returns the first value of an attribute, matched case-insensitively.
    #[must_use]
    pub fn first_value(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// Returns the entry's login attribute, if present.
    #[must_use]
    pub fn login(&self) -> Option<&str> {
        self.first_value(LOGIN_ATTRIBUTE)
    }
}
