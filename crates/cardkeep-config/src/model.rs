// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level cardkeep configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CardkeepConfig {
    /// Argon2id password hashing cost.
    #[serde(default)]
    pub hashing: HashingConfig,

    /// PBKDF2 key derivation cost.
    #[serde(default)]
    pub key_derivation: KeyDerivationConfig,

    /// In-memory key cache behavior.
    #[serde(default)]
    pub key_cache: KeyCacheConfig,

    /// Registration-time password rules.
    #[serde(default)]
    pub password_policy: PasswordPolicyConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CardkeepConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Argon2id cost parameters for newly hashed passwords.
///
/// Existing hashes keep the parameters embedded in their encoded string, so
/// raising these never invalidates stored credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HashingConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_memory_cost")]
    pub memory_cost: u32,

    /// Pass count (default: 4).
    #[serde(default = "default_hash_iterations")]
    pub iterations: u32,

    /// Lanes (default: available CPU cores).
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_cost: default_memory_cost(),
            iterations: default_hash_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_memory_cost() -> u32 {
    64 * 1024
}

fn default_hash_iterations() -> u32 {
    4
}

fn default_parallelism() -> u32 {
    std::thread::available_parallelism()
        .map(|n| u32::try_from(n.get()).unwrap_or(1).min(255))
        .unwrap_or(1)
}

/// PBKDF2-HMAC-SHA256 settings used to derive the per-user field key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyDerivationConfig {
    #[serde(default = "default_kdf_iterations")]
    pub iterations: u32,
}

impl Default for KeyDerivationConfig {
    fn default() -> Self {
        Self {
            iterations: default_kdf_iterations(),
        }
    }
}

fn default_kdf_iterations() -> u32 {
    100_000
}

/// Key cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyCacheConfig {
    /// Idle time after which an unlocked session locks itself (default: 30 min).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Interval of the background sweep of expired keys. 0 disables it.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl KeyCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// `None` when the sweep is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl Default for KeyCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    30 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Password complexity rules enforced when a user registers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordPolicyConfig {
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    #[serde(default = "default_true")]
    pub require_uppercase: bool,

    #[serde(default = "default_true")]
    pub require_lowercase: bool,

    #[serde(default = "default_true")]
    pub require_digit: bool,

    /// Require at least one non-alphanumeric character.
    #[serde(default = "default_true")]
    pub require_special: bool,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

fn default_min_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
