//! YAML parser for client configs
//!
//! Processing order: parse, substitute `${VAR}` placeholders, merge the
//! selected profile over the base document, then map onto
//! [`ClientConfig`] and validate.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::loader::types::ConfigDocument;
use crate::template::{has_placeholder, interpolate_yaml};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variable naming the profile when none is passed
pub const PROFILE_ENV: &str = "ZAI_PROFILE";

/// Load a config from a YAML file
///
/// `profile` falls back to the `ZAI_PROFILE` environment variable.
pub fn load_config(path: impl AsRef<Path>, profile: Option<&str>) -> Result<ClientConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::config(format!("Config file not found: {}", path.display()))
        } else {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_config_from_str(&content, profile)
}

/// Load a config from a YAML string
pub fn load_config_from_str(yaml: &str, profile: Option<&str>) -> Result<ClientConfig> {
    let mut doc: Value = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse YAML: {e}")))?;
    if doc.is_null() {
        doc = Value::Mapping(Mapping::new());
    }
    if !doc.is_mapping() {
        return Err(Error::config("Config root must be a mapping"));
    }

    interpolate_yaml(&mut doc);

    let profiles = doc
        .as_mapping_mut()
        .and_then(|m| m.remove("profiles"))
        .unwrap_or(Value::Null);

    let env_profile = std::env::var(PROFILE_ENV).ok().filter(|p| !p.is_empty());
    if let Some(name) = profile.or(env_profile.as_deref()) {
        apply_profile(&mut doc, &profiles, name)?;
    }

    let document: ConfigDocument = serde_yaml::from_value(doc)
        .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
    let config = document.into_client_config()?;
    config.validate()?;
    Ok(config)
}

fn apply_profile(doc: &mut Value, profiles: &Value, name: &str) -> Result<()> {
    if profiles.is_null() {
        debug!("No profiles defined; ignoring profile '{}'", name);
        return Ok(());
    }

    let Some(overrides) = profiles.get(name) else {
        let available = profiles
            .as_mapping()
            .map(|m| {
                m.keys()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        return Err(Error::config(format!(
            "Profile '{name}' not found. Available: {available}"
        )));
    };

    debug!("Applying config profile '{}'", name);
    deep_merge(doc, overrides.clone());
    Ok(())
}

/// Merge `overrides` into `base`; nested mappings merge, everything else replaces
pub(crate) fn deep_merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Mapping(base), Value::Mapping(overrides)) => {
            for (key, value) in overrides {
                let nested = value.is_mapping() && base.get(&key).is_some_and(Value::is_mapping);
                if nested {
                    if let Some(existing) = base.get_mut(&key) {
                        deep_merge(existing, value);
                    }
                } else {
                    base.insert(key, value);
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

impl ConfigDocument {
    /// Map the document onto a config, starting from defaults
    pub fn into_client_config(self) -> Result<ClientConfig> {
        let mut config = ClientConfig::default();

        // A key that still reads `${...}` was never set; let the
        // environment fallback handle it instead of failing validation.
        config.api_key = self
            .api
            .api_key
            .filter(|k| !k.is_empty() && !has_placeholder(k));
        if let Some(base_url) = self.api.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.api.timeout {
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(max_retries) = self.api.max_retries {
            config.retry.max_retries = max_retries;
        }
        if let Some(pattern) = self.api.credential_pattern {
            config.credential_pattern = pattern;
        }

        if let Some(initial) = self.retry.initial_backoff {
            config.retry.initial_backoff = seconds("retry.initial_backoff", initial)?;
        }
        if let Some(max) = self.retry.max_backoff {
            config.retry.max_backoff = seconds("retry.max_backoff", max)?;
        }

        if let Some(requests) = self.rate_limit.requests {
            config.rate_limit.max_requests = requests;
        }
        if let Some(window) = self.rate_limit.window {
            config.rate_limit.time_window = Duration::from_secs(window);
        }

        let defaults = &mut config.search_defaults;
        if let Some(n) = self.search_defaults.num_results {
            defaults.num_results = n;
        }
        if let Some(t) = self.search_defaults.search_type {
            defaults.search_type = t;
        }
        if self.search_defaults.language.is_some() {
            defaults.language = self.search_defaults.language;
        }
        if self.search_defaults.region.is_some() {
            defaults.region = self.search_defaults.region;
        }
        if let Some(s) = self.search_defaults.safe_search {
            defaults.safe_search = s;
        }

        Ok(config)
    }
}

fn seconds(field: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| Error::config(format!("{field} must be a non-negative number of seconds")))
}
