//! YAML config loader
//!
//! Loads a [`crate::ClientConfig`] from a YAML document with optional
//! named profiles and `${VAR}` environment placeholders.

mod parser;
mod types;

pub use parser::{load_config, load_config_from_str, PROFILE_ENV};
pub use types::{
    ApiSection, ConfigDocument, RateLimitSection, RetrySection, SearchDefaultsSection,
};
