//! Shared helpers for unit tests

use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes environment mutation across tests and restores the
/// previous values on drop.
pub struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    fn lock() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub fn set(key: &str, value: &str) -> Self {
        Self::lock().and_set(key, value)
    }

    pub fn unset(key: &str) -> Self {
        Self::lock().and_unset(key)
    }

    pub fn and_set(mut self, key: &str, value: &str) -> Self {
        self.saved.push((key.to_string(), std::env::var(key).ok()));
        std::env::set_var(key, value);
        self
    }

    pub fn and_unset(mut self, key: &str) -> Self {
        self.saved.push((key.to_string(), std::env::var(key).ok()));
        std::env::remove_var(key);
        self
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }
}
