use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use rolegate_core::AppError;
use rolegate_domain::DirectoryLayout;
use rolegate_infrastructure::{DuoSecondFactorConfig, LdapDirectoryConfig};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

const DEFAULT_SECOND_FACTOR_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_DIRECTORY_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub second_factor: DuoSecondFactorConfig,
    pub directory: LdapDirectoryConfig,
    pub directory_layout: DirectoryLayout,
    pub expose_error_detail: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let second_factor = DuoSecondFactorConfig {
            integration_key: required_non_empty(&lookup, "DUO_IKEY")?,
            secret_key: SecretString::from(required_non_empty(&lookup, "DUO_SKEY")?),
            api_host: required_non_empty(&lookup, "DUO_API_HOST")?,
            timeout: seconds(
                &lookup,
                "DUO_TIMEOUT_SECONDS",
                DEFAULT_SECOND_FACTOR_TIMEOUT_SECONDS,
            )?,
        };

        let directory = LdapDirectoryConfig {
            url: required_non_empty(&lookup, "LDAP_URL")?,
            bind_dn: required_non_empty(&lookup, "LDAP_BIND_DN")?,
            bind_password: SecretString::from(required(&lookup, "LDAP_BIND_PASSWORD")?),
            timeout: seconds(
                &lookup,
                "LDAP_TIMEOUT_SECONDS",
                DEFAULT_DIRECTORY_TIMEOUT_SECONDS,
            )?,
        };

        let directory_layout = DirectoryLayout::new(
            required_non_empty(&lookup, "LDAP_SEARCH_BASE")?,
            lookup("LDAP_PEOPLE_BASE"),
        )?;

        let expose_error_detail = lookup("GATE_EXPOSE_ERROR_DETAIL")
            .map(|value| !value.eq_ignore_ascii_case("false"))
            .unwrap_or(true);

        Ok(Self {
            api_host,
            api_port,
            second_factor,
            directory,
            directory_layout,
            expose_error_detail,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = required(lookup, name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn seconds<F>(lookup: &F, name: &str, default: u64) -> Result<Duration, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(Duration::from_secs(default));
    };

    match value.parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(AppError::Validation(format!(
            "{name} must be a positive number of seconds, got '{value}'"
        ))),
    }
}
