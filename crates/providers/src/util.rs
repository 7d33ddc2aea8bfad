//! Shared utility functions for provider adapters.

use ao_domain::error::Error;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key for a provider from its configured env var.
///
/// Missing `api_key_env` is allowed (some local endpoints need no auth);
/// a configured but unset env var is an error.
pub fn resolve_api_key(provider_id: &str, api_key_env: Option<&str>) -> ao_domain::error::Result<Option<String>> {
    match api_key_env {
        None => Ok(None),
        Some(var) => std::env::var(var).map(Some).map_err(|_| {
            Error::Config(format!(
                "provider '{provider_id}': environment variable '{var}' not set"
            ))
        }),
    }
}
