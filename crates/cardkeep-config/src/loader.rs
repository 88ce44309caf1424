// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./cardkeep.toml` > `~/.config/cardkeep/cardkeep.toml` >
//! `/etc/cardkeep/cardkeep.toml`, with `CARDKEEP_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CardkeepConfig;

/// Local config file name, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "cardkeep.toml";

/// System-wide config file.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/cardkeep/cardkeep.toml";

/// Section names recognised in `CARDKEEP_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "hashing",
    "key_derivation",
    "key_cache",
    "password_policy",
    "logging",
];

/// Path of the per-user XDG config file, if a config dir exists.
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cardkeep").join(LOCAL_CONFIG_FILE))
}

/// Build the full Figment (defaults, files, env) without extracting it.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. System file
/// 3. User XDG file
/// 4. Local file
/// 5. `CARDKEEP_*` environment variables
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CardkeepConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_FILE))
        .merge(Toml::file(user_config_file().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<CardkeepConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CardkeepConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CardkeepConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file plus env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CardkeepConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CardkeepConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Env provider mapping `CARDKEEP_KEY_CACHE_TTL_SECS` to `key_cache.ttl_secs`.
///
/// Section names contain underscores themselves, so the split point is found
/// by matching known section prefixes rather than splitting on `_`. Variables
/// outside every section (such as `CARDKEEP_PASSWORD`) are not configuration
/// and are skipped.
fn env_provider() -> Env {
    Env::prefixed("CARDKEEP_")
        .filter(|key| nested_key(key.as_str()).is_some())
        .map(|key| {
            nested_key(key.as_str())
                .unwrap_or_else(|| key.as_str().to_string())
                .into()
        })
}

fn nested_key(key: &str) -> Option<String> {
    let key = key.to_ascii_lowercase();
    ENV_SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .map(|field| format!("{section}.{field}"))
    })
}
