// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System CSPRNG access for salts and nonces.

use cardkeep_core::{CardkeepError, Result};
use ring::rand::{SecureRandom, SystemRandom};

/// Fill a fixed-size array from the system CSPRNG.
pub(crate) fn random_array<const N: usize>(what: &str) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| CardkeepError::Crypto(format!("failed to generate random {what}")))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_draws_differ() {
        let a: [u8; 16] = random_array("test bytes").unwrap();
        let b: [u8; 16] = random_array("test bytes").unwrap();
        assert_ne!(a, b);
    }
}
