//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod duo_second_factor_transport;
mod in_memory_directory;
mod ldap_directory_connector;

pub use duo_second_factor_transport::{DuoSecondFactorConfig, DuoSecondFactorTransport};
pub use in_memory_directory::InMemoryDirectory;
pub use ldap_directory_connector::{LdapDirectoryConfig, LdapDirectoryConnector};
