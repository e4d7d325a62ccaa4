//! Configuration for [`DiagnosticRwLock`](crate::DiagnosticRwLock).
//!
//! The timeout is a per-lock value passed at construction; there is no
//! process-wide setting. `from_env` and `from_json` exist so a test harness
//! or deployment can pick the value without recompiling.

use std::env::{self, VarError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Timeout used when no configuration is supplied.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment variable read by [`LockConfig::from_env`], in milliseconds.
pub const LOCK_TIMEOUT_ENV: &str = "TINYSYNC_LOCK_TIMEOUT_MS";

/// Settings for a diagnostic lock.
///
/// Serialized as `{"timeout_ms": 5000}`; a missing field takes the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long an acquisition may wait before the lock reports itself stuck.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
}

impl LockConfig {
    /// Configuration with the given timeout.
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Reads [`LOCK_TIMEOUT_ENV`]; falls back to the default when unset.
    ///
    /// # Errors
    /// Fails if the variable is set but is not a positive whole number,
    /// including when it is not valid Unicode.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(LOCK_TIMEOUT_ENV) {
            Ok(raw) => parse_timeout_ms(&raw),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(raw)) => Err(ConfigError::InvalidEnv {
                var: LOCK_TIMEOUT_ENV,
                value: raw.to_string_lossy().into_owned(),
            }),
        }
    }

    /// Parses a JSON document such as `{"timeout_ms": 250}`.
    ///
    /// # Errors
    /// Fails on malformed JSON or a zero timeout.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Rejects a zero timeout.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroTimeout`].
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(self)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_LOCK_TIMEOUT)
    }
}

fn parse_timeout_ms(raw: &str) -> Result<LockConfig, ConfigError> {
    let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: LOCK_TIMEOUT_ENV,
        value: raw.to_owned(),
    })?;
    LockConfig::with_timeout(Duration::from_millis(ms)).validate()
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
