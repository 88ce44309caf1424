// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cardkeep doctor` command implementation.
//!
//! Exercises every layer with the effective configuration: hashing, key
//! derivation, field encryption, and a full in-memory session lifecycle.
//! Nothing is written to disk.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cardkeep_config::CardkeepConfig;
use cardkeep_core::{CardkeepError, KEY_SALT_LENGTH, UserId};
use cardkeep_crypto::{FieldCipher, HashParams, KeyDeriver, PasswordHasher};
use cardkeep_records::{CardSecrets, MemoryStore, ProtectedRecordService};
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

/// Hashing slower than this is flagged as a likely misconfiguration.
const SLOW_HASH_THRESHOLD: Duration = Duration::from_secs(2);

const SAMPLE_CARD_NUMBER: &str = "4111111111111111";

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }

    fn from_outcome(name: &str, outcome: Result<String, CardkeepError>, start: Instant) -> Self {
        match outcome {
            Ok(message) => Self::new(name, CheckStatus::Pass, message, start),
            Err(e) => Self::new(name, CheckStatus::Fail, e.to_string(), start),
        }
    }
}

/// Run the `cardkeep doctor` command. Returns whether every check passed
/// without failures.
pub async fn run_doctor(config: &CardkeepConfig, plain: bool) -> bool {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_hashing(config).await,
        check_key_derivation(config).await,
        check_field_cipher(),
        check_session_lifecycle(config).await,
    ];

    println!();
    println!("  cardkeep doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Pass => {}
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
        }
        println!("{}", format_line(result, use_color));
    }

    println!();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    fail_count == 0
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let duration_ms = result.duration.as_millis();
    let (symbol, message) = match (&result.status, use_color) {
        (CheckStatus::Pass, true) => ("✓".green().to_string(), result.message.clone()),
        (CheckStatus::Warn, true) => ("!".yellow().to_string(), result.message.yellow().to_string()),
        (CheckStatus::Fail, true) => ("✗".red().to_string(), result.message.red().to_string()),
        (CheckStatus::Pass, false) => ("[OK]  ".to_string(), result.message.clone()),
        (CheckStatus::Warn, false) => ("[WARN]".to_string(), result.message.clone()),
        (CheckStatus::Fail, false) => ("[FAIL]".to_string(), result.message.clone()),
    };
    format!(
        "    {symbol} {:<20} {message} ({duration_ms}ms)",
        result.name
    )
}

/// A password that satisfies any valid policy configuration.
fn sample_password(config: &CardkeepConfig) -> SecretString {
    let mut password = String::from("Doctor-Check-1");
    while password.chars().count() < config.password_policy.min_length {
        password.push('x');
    }
    SecretString::from(password)
}

async fn check_hashing(config: &CardkeepConfig) -> CheckResult {
    const NAME: &str = "Password hashing";
    let start = Instant::now();
    let params = HashParams::from(&config.hashing);
    let password = sample_password(config);

    let outcome = tokio::task::spawn_blocking(move || -> Result<String, CardkeepError> {
        let hasher = PasswordHasher::new(params)?;
        let encoded = hasher.hash(password.expose_secret())?;
        if !hasher.verify(password.expose_secret(), &encoded) {
            return Err(CardkeepError::Internal("fresh hash did not verify".to_string()));
        }
        if hasher.verify("not-the-password", &encoded) {
            return Err(CardkeepError::Internal("wrong password verified".to_string()));
        }
        Ok(format!(
            "argon2id m={} t={} p={}",
            params.memory_cost, params.iterations, params.parallelism
        ))
    })
    .await
    .unwrap_or_else(|e| Err(CardkeepError::Internal(format!("check panicked: {e}"))));

    let mut result = CheckResult::from_outcome(NAME, outcome, start);
    if result.status == CheckStatus::Pass && result.duration > SLOW_HASH_THRESHOLD {
        result.status = CheckStatus::Warn;
        result.message = format!("{} (slow, consider lowering memory_cost)", result.message);
    }
    result
}

async fn check_key_derivation(config: &CardkeepConfig) -> CheckResult {
    const NAME: &str = "Key derivation";
    let start = Instant::now();
    let deriver = match KeyDeriver::try_from(&config.key_derivation) {
        Ok(deriver) => deriver,
        Err(e) => return CheckResult::from_outcome(NAME, Err(e), start),
    };
    let password = sample_password(config);

    let outcome = tokio::task::spawn_blocking(move || -> Result<String, CardkeepError> {
        let salt = [0x5a; KEY_SALT_LENGTH];
        let first = deriver.derive(password.expose_secret(), &salt)?;
        let second = deriver.derive(password.expose_secret(), &salt)?;
        if first != second {
            return Err(CardkeepError::Internal(
                "derivation is not deterministic".to_string(),
            ));
        }
        Ok(format!(
            "pbkdf2-hmac-sha256 {} iterations",
            deriver.iterations()
        ))
    })
    .await
    .unwrap_or_else(|e| Err(CardkeepError::Internal(format!("check panicked: {e}"))));

    CheckResult::from_outcome(NAME, outcome, start)
}

fn check_field_cipher() -> CheckResult {
    const NAME: &str = "Field cipher";
    let start = Instant::now();

    let outcome = field_cipher_roundtrip();
    CheckResult::from_outcome(NAME, outcome, start)
}

fn field_cipher_roundtrip() -> Result<String, CardkeepError> {
    let key = [0x42; 32];
    let mut field = FieldCipher::encrypt(SAMPLE_CARD_NUMBER, &key)?;
    if FieldCipher::decrypt(&field, &key)? != SAMPLE_CARD_NUMBER {
        return Err(CardkeepError::Internal("round trip mismatch".to_string()));
    }
    field.tag[0] ^= 1;
    match FieldCipher::decrypt(&field, &key) {
        Err(CardkeepError::DecryptionFailed) => Ok("aes-256-gcm".to_string()),
        _ => Err(CardkeepError::Internal(
            "tampered field was not rejected".to_string(),
        )),
    }
}

async fn check_session_lifecycle(config: &CardkeepConfig) -> CheckResult {
    const NAME: &str = "Session lifecycle";
    let start = Instant::now();
    let outcome = session_lifecycle(config).await;
    CheckResult::from_outcome(NAME, outcome, start)
}

async fn session_lifecycle(config: &CardkeepConfig) -> Result<String, CardkeepError> {
    let service = ProtectedRecordService::from_config(config, Arc::new(MemoryStore::new()))?;
    let cancel = CancellationToken::new();
    let _sweeper = service.spawn_cache_sweeper(config, cancel.clone());
    let _stop_sweeper = cancel.drop_guard();
    let user = UserId::new_random();
    let password = sample_password(config);

    service.register(user, &password).await?;
    service.login(user, &password).await?;

    let card = CardSecrets::new(SAMPLE_CARD_NUMBER, Some("0420".to_string()));
    let protected = service.protect_card(&user, &card)?;
    let revealed = service.reveal_card(&user, &protected.encode().decode()?)?;
    if revealed.card_number.expose_secret() != SAMPLE_CARD_NUMBER {
        return Err(CardkeepError::Internal("revealed card mismatch".to_string()));
    }

    service.lock(&user);
    match service.reveal_field(&user, &protected.card_number) {
        Err(CardkeepError::Locked) => Ok("register, login, protect, reveal, lock".to_string()),
        _ => Err(CardkeepError::Internal(
            "field still readable after lock".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> CardkeepConfig {
        let mut config = CardkeepConfig::default();
        config.hashing.memory_cost = 19456;
        config.hashing.iterations = 1;
        config.hashing.parallelism = 1;
        config
    }

    #[test]
    fn sample_password_meets_policy_length() {
        let mut config = CardkeepConfig::default();
        config.password_policy.min_length = 24;
        assert_eq!(sample_password(&config).expose_secret().chars().count(), 24);
    }

    #[test]
    fn cipher_check_passes() {
        assert_eq!(check_field_cipher().status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn lifecycle_check_passes_with_defaults() {
        let result = check_session_lifecycle(&fast_config()).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
    }

    #[tokio::test]
    async fn zero_kdf_iterations_fail_the_check() {
        let mut config = fast_config();
        config.key_derivation.iterations = 0;
        let result = check_key_derivation(&config).await;
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.contains("non-zero"), "{}", result.message);
    }

    #[tokio::test]
    async fn doctor_reports_success() {
        assert!(run_doctor(&fast_config(), true).await);
    }

    #[test]
    fn plain_lines_use_text_markers() {
        let result = CheckResult {
            name: "Field cipher".to_string(),
            status: CheckStatus::Fail,
            message: "boom".to_string(),
            duration: Duration::from_millis(3),
        };
        let line = format_line(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("boom"));
        assert!(line.contains("(3ms)"));
    }
}
