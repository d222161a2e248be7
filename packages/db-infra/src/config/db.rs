use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::DbInfraError;

pub const DEFAULT_POSTGRES_HOST: &str = "localhost";
pub const DEFAULT_POSTGRES_PORT: &str = "5432";

/// Characters left unescaped in the userinfo part of a connection URL.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const SUPPORTED_SCHEMES: [&str; 3] = ["postgres://", "postgresql://", "sqlite:"];

/// Resolve the primary database URL from a variable lookup.
///
/// `DATABASE_URL` wins when set. Otherwise the URL is composed from
/// `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_DB`, `POSTGRES_USER` and
/// `POSTGRES_PASSWORD`; the last three are required in that case.
pub fn database_url<F>(lookup: F) -> Result<String, DbInfraError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_empty(&lookup, "DATABASE_URL") {
        validate_db_url(&url)?;
        return Ok(url);
    }

    let host = non_empty(&lookup, "POSTGRES_HOST").unwrap_or_else(|| DEFAULT_POSTGRES_HOST.into());
    let port = non_empty(&lookup, "POSTGRES_PORT").unwrap_or_else(|| DEFAULT_POSTGRES_PORT.into());
    if port.parse::<u16>().is_err() {
        return Err(DbInfraError::Config {
            message: format!("POSTGRES_PORT must be a valid port number, got '{port}'"),
        });
    }

    let db_name = must_var(&lookup, "POSTGRES_DB")?;
    let username = must_var(&lookup, "POSTGRES_USER")?;
    let password = must_var(&lookup, "POSTGRES_PASSWORD")?;

    Ok(format!(
        "postgresql://{}:{}@{host}:{port}/{db_name}",
        utf8_percent_encode(&username, USERINFO),
        utf8_percent_encode(&password, USERINFO),
    ))
}

/// Reject URLs for drivers this build cannot connect with.
pub fn validate_db_url(url: &str) -> Result<(), DbInfraError> {
    if SUPPORTED_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        Ok(())
    } else {
        Err(DbInfraError::Config {
            message: format!(
                "unsupported database URL '{}': expected postgres://, postgresql:// or sqlite:",
                redact_db_url(url)
            ),
        })
    }
}

/// Mask the password in a connection string so it can be logged.
pub fn redact_db_url(url: &str) -> String {
    let Some(at) = url.rfind('@') else {
        return url.to_string();
    };
    let (auth_part, host_part) = url.split_at(at);
    let user_start = auth_part.find("://").map(|i| i + 3).unwrap_or(0);

    match auth_part[user_start..].find(':') {
        Some(colon) => format!("{}:***{}", &auth_part[..user_start + colon], host_part),
        None => url.to_string(),
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

/// Get required variable or return error
fn must_var<F>(lookup: &F, name: &str) -> Result<String, DbInfraError>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, name).ok_or_else(|| DbInfraError::Config {
        message: format!("Required environment variable '{name}' is not set"),
    })
}
