// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password acquisition via TTY prompt or the CARDKEEP_PASSWORD environment variable.

use cardkeep_core::CardkeepError;
use secrecy::SecretString;

/// The environment variable name for providing the password non-interactively.
pub const PASSWORD_ENV_VAR: &str = "CARDKEEP_PASSWORD";

/// Get a password from the environment or an interactive prompt.
///
/// Priority:
/// 1. `CARDKEEP_PASSWORD` environment variable (scripts, CI)
/// 2. Interactive TTY prompt via `rpassword`
pub fn read_password(prompt: &str) -> Result<SecretString, CardkeepError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV_VAR)
        && !password.is_empty()
    {
        return Ok(SecretString::from(password));
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("{prompt}: ");
        let password = rpassword::read_password()
            .map_err(|e| CardkeepError::InvalidInput(format!("failed to read password: {e}")))?;
        if password.is_empty() {
            return Err(CardkeepError::InvalidInput(
                "empty password not allowed".to_string(),
            ));
        }
        return Ok(SecretString::from(password));
    }

    Err(CardkeepError::InvalidInput(format!(
        "No password provided. Set {PASSWORD_ENV_VAR} or run interactively."
    )))
}
