//! API key resolution shared by authenticated clients.
//!
//! A caller-supplied value is tried first as a path to an env-style file,
//! then as the literal key. Without a value the key is read from the
//! process environment.

use crate::error::{ReconError, ReconResult};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// A resolved API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw secret, for request headers only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Where credentials are read from
pub trait EnvironmentSource {
    /// Load `KEY=value` entries from a file into the environment and return them
    fn read_env_file(&self, path: &Path) -> ReconResult<HashMap<String, String>>;

    fn get_env_var(&self, name: &str) -> Option<String>;
}

/// The real process environment; env files are loaded with dotenvy
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl EnvironmentSource for ProcessEnvironment {
    fn read_env_file(&self, path: &Path) -> ReconResult<HashMap<String, String>> {
        let entries = dotenvy::from_path_iter(path).map_err(|e| {
            ReconError::configuration(format!(
                "Failed to read credential file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut loaded = HashMap::new();
        for entry in entries {
            let (key, value) = match entry {
                Ok(pair) => pair,
                Err(dotenvy::Error::LineParse(line, _)) => {
                    tracing::debug!("Skipping malformed line in {}: {}", path.display(), line);
                    continue;
                }
                Err(e) => {
                    return Err(ReconError::configuration(format!(
                        "Failed to read credential file {}: {}",
                        path.display(),
                        e
                    )))
                }
            };
            // File values win over anything already set for this process
            std::env::set_var(&key, &value);
            loaded.insert(key, value);
        }

        Ok(loaded)
    }

    fn get_env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Resolve an API key against the process environment
pub fn resolve_api_key(value: Option<&str>, env_name: &str) -> ReconResult<ApiKey> {
    resolve_api_key_with(&ProcessEnvironment, value, env_name)
}

/// Resolve an API key with precedence file path > literal value > environment variable
pub fn resolve_api_key_with<S>(source: &S, value: Option<&str>, env_name: &str) -> ReconResult<ApiKey>
where
    S: EnvironmentSource + ?Sized,
{
    let resolved = match value {
        Some(value) if Path::new(value).is_file() => {
            tracing::debug!("Reading {} from credential file", env_name);
            let loaded = source
                .read_env_file(Path::new(value))
                .unwrap_or_else(|e| {
                    tracing::warn!("Ignoring credential file for {}: {}", env_name, e);
                    HashMap::new()
                });
            loaded
                .get(env_name)
                .cloned()
                .or_else(|| source.get_env_var(env_name))
        }
        Some(value) => Some(value.to_string()),
        None => source.get_env_var(env_name),
    };

    match resolved {
        Some(key) if !key.trim().is_empty() => Ok(ApiKey::new(key)),
        _ => Err(ReconError::api_key(format!(
            "An API key is required. Either supply one explicitly (as a value or a \
             path to an env file) or set the '{}' environment variable.",
            env_name
        ))),
    }
}
