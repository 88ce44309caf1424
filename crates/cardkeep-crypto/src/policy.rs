// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password complexity rules applied when a user registers.

use cardkeep_config::model::PasswordPolicyConfig;
use cardkeep_core::{CardkeepError, Result};

/// Complexity requirements for new passwords.
///
/// Length is counted in Unicode scalar values. "Special" means any character
/// that is neither alphanumeric nor whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from(&PasswordPolicyConfig::default())
    }
}

impl From<&PasswordPolicyConfig> for PasswordPolicy {
    fn from(config: &PasswordPolicyConfig) -> Self {
        Self {
            min_length: config.min_length,
            require_uppercase: config.require_uppercase,
            require_lowercase: config.require_lowercase,
            require_digit: config.require_digit,
            require_special: config.require_special,
        }
    }
}

impl PasswordPolicy {
    /// Check `password` against every rule.
    ///
    /// All violations are reported together in a single
    /// [`CardkeepError::InvalidInput`].
    pub fn validate(&self, password: &str) -> Result<()> {
        let violations = self.violations(password);
        if violations.is_empty() {
            return Ok(());
        }
        Err(CardkeepError::InvalidInput(format!(
            "password does not meet policy: {}",
            violations.join("; ")
        )))
    }

    fn violations(&self, password: &str) -> Vec<String> {
        let mut out = Vec::new();

        if password.trim().is_empty() {
            out.push("must not be empty".to_string());
        }
        let length = password.chars().count();
        if length < self.min_length {
            out.push(format!(
                "must be at least {} characters (got {length})",
                self.min_length
            ));
        }
        if self.require_uppercase && !password.chars().any(char::is_uppercase) {
            out.push("must contain an uppercase letter".to_string());
        }
        if self.require_lowercase && !password.chars().any(char::is_lowercase) {
            out.push("must contain a lowercase letter".to_string());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            out.push("must contain a digit".to_string());
        }
        if self.require_special
            && !password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            out.push("must contain a special character".to_string());
        }

        out
    }
}
