//! Authentication module
//!
//! Validates the API credential once, at construction time, and turns it
//! into the canonical request headers.
//!
//! The same validator backs every configuration path: explicit key,
//! config object, and environment.

mod authenticator;
mod credential;

pub use authenticator::{Authenticator, API_KEY_ENV};
pub use credential::{Credential, CredentialPattern};
