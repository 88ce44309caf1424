// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::CardkeepConfig;

/// OWASP floor for Argon2id memory cost (19 MiB).
const MIN_MEMORY_COST: u32 = 19 * 1024;

/// Ceiling the hasher enforces when verifying stored hashes (1 GiB).
const MAX_MEMORY_COST: u32 = 1024 * 1024;

const MIN_KDF_ITERATIONS: u32 = 100_000;

const MIN_TTL_SECS: u64 = 60;
const MAX_TTL_SECS: u64 = 24 * 60 * 60;

const MIN_PASSWORD_LENGTH: usize = 8;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &CardkeepConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let hashing = &config.hashing;
    if hashing.parallelism == 0 || hashing.parallelism > 255 {
        errors.push(ConfigError::validation(format!(
            "hashing.parallelism must be between 1 and 255, got {}",
            hashing.parallelism
        )));
    }
    if hashing.memory_cost < MIN_MEMORY_COST {
        errors.push(ConfigError::validation(format!(
            "hashing.memory_cost must be at least {MIN_MEMORY_COST} (19 MiB), got {}",
            hashing.memory_cost
        )));
    }
    if hashing.memory_cost > MAX_MEMORY_COST {
        errors.push(ConfigError::validation(format!(
            "hashing.memory_cost must be at most {MAX_MEMORY_COST} (1 GiB), got {}",
            hashing.memory_cost
        )));
    }
    if u64::from(hashing.memory_cost) < 8 * u64::from(hashing.parallelism) {
        errors.push(ConfigError::validation(format!(
            "hashing.memory_cost must be at least 8 * parallelism ({}), got {}",
            8 * u64::from(hashing.parallelism),
            hashing.memory_cost
        )));
    }
    if hashing.iterations < 1 {
        errors.push(ConfigError::validation(
            "hashing.iterations must be at least 1, got 0",
        ));
    }

    if config.key_derivation.iterations < MIN_KDF_ITERATIONS {
        errors.push(ConfigError::validation(format!(
            "key_derivation.iterations must be at least {MIN_KDF_ITERATIONS}, got {}",
            config.key_derivation.iterations
        )));
    }

    let ttl = config.key_cache.ttl_secs;
    if !(MIN_TTL_SECS..=MAX_TTL_SECS).contains(&ttl) {
        errors.push(ConfigError::validation(format!(
            "key_cache.ttl_secs must be between {MIN_TTL_SECS} and {MAX_TTL_SECS}, got {ttl}"
        )));
    }

    if config.password_policy.min_length < MIN_PASSWORD_LENGTH {
        errors.push(ConfigError::validation(format!(
            "password_policy.min_length must be at least {MIN_PASSWORD_LENGTH}, got {}",
            config.password_policy.min_length
        )));
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
