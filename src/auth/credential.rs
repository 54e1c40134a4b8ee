//! Credential type and format validation

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Any provider-style key: at least 20 of `[A-Za-z0-9._-]`
static FLEXIBLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]{20,}$").unwrap());

/// Z.AI-issued key: `zai_` followed by exactly 32 alphanumerics
static PREFIXED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^zai_[a-zA-Z0-9]{32}$").unwrap());

/// Accepted credential format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialPattern {
    /// At least 20 characters of alphanumerics, `.`, `_` or `-`
    #[default]
    Flexible,
    /// `zai_` prefix plus 32 alphanumerics
    Prefixed,
}

impl CredentialPattern {
    fn regex(self) -> &'static Regex {
        match self {
            CredentialPattern::Flexible => &FLEXIBLE_PATTERN,
            CredentialPattern::Prefixed => &PREFIXED_PATTERN,
        }
    }

    /// Human-readable description used in error messages
    pub fn describe(self) -> &'static str {
        match self {
            CredentialPattern::Flexible => {
                "at least 20 characters of letters, digits, dots, underscores or hyphens"
            }
            CredentialPattern::Prefixed => "'zai_' followed by 32 letters or digits",
        }
    }

    /// Check a secret against this pattern
    pub fn matches(self, secret: &str) -> bool {
        self.regex().is_match(secret)
    }
}

/// A validated API secret
///
/// Immutable once constructed. `Debug` output is redacted and there is no
/// `Display` impl, so the secret cannot leak through logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validate `secret` against `pattern`
    pub fn new(secret: impl Into<String>, pattern: CredentialPattern) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(Error::invalid_credential("API key cannot be empty"));
        }
        if !pattern.matches(&secret) {
            return Err(Error::invalid_credential(format!(
                "expected {}",
                pattern.describe()
            )));
        }
        Ok(Self(secret))
    }

    /// The raw secret, for building the Authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}
