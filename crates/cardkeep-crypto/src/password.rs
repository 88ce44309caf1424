// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-way password hashing with Argon2id.
//!
//! Hashes are stored in a self-describing string:
//!
//! ```text
//! $argon2id$v=19$m=<memory KiB>,t=<iterations>,p=<parallelism>$<base64 salt>$<base64 hash>
//! ```
//!
//! Base64 is the standard alphabet with padding. Every cost parameter travels
//! with the hash, so verification needs no outside configuration and raising
//! the configured cost never invalidates existing credentials.

use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cardkeep_config::model::HashingConfig;
use cardkeep_core::{CardkeepError, Result};
use tracing::debug;
use zeroize::Zeroizing;

use crate::random::random_array;

/// Algorithm tag in the encoded string.
pub const ALGORITHM_ID: &str = "argon2id";

/// Argon2 version 0x13.
pub const ARGON2_VERSION: u32 = 19;

/// Salt length for new hashes, in bytes.
pub const HASH_SALT_LENGTH: usize = 16;

/// Hash output length for new hashes, in bytes.
pub const HASH_LENGTH: usize = 32;

/// Memory ceiling in KiB (1 GiB). Stored hashes and hasher parameters above
/// it are refused before Argon2 allocates anything.
pub const MAX_MEMORY_COST: u32 = 1024 * 1024;

const MIN_STORED_SALT_LENGTH: usize = 8;
const MIN_STORED_HASH_LENGTH: usize = 16;
const MAX_STORED_HASH_LENGTH: usize = 64;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&HashingConfig> for HashParams {
    fn from(config: &HashingConfig) -> Self {
        Self {
            memory_cost: config.memory_cost,
            iterations: config.iterations,
            parallelism: config.parallelism,
        }
    }
}

impl HashParams {
    fn to_argon2(self, output_len: usize) -> std::result::Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost,
            self.iterations,
            self.parallelism,
            Some(output_len),
        )
    }
}

/// Hashes and verifies passwords.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: HashParams,
}

impl PasswordHasher {
    /// Build a hasher, rejecting parameters Argon2 cannot run with.
    pub fn new(params: HashParams) -> Result<Self> {
        if params.memory_cost > MAX_MEMORY_COST {
            return Err(CardkeepError::InvalidInput(format!(
                "Argon2id memory cost {} KiB exceeds the {MAX_MEMORY_COST} KiB ceiling",
                params.memory_cost
            )));
        }
        params
            .to_argon2(HASH_LENGTH)
            .map_err(|e| CardkeepError::InvalidInput(format!("invalid Argon2id parameters: {e}")))?;
        Ok(Self { params })
    }

    pub fn params(&self) -> HashParams {
        self.params
    }

    /// Hash a password with a fresh random salt.
    ///
    /// Two calls with the same password return different strings.
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.trim().is_empty() {
            return Err(CardkeepError::InvalidInput(
                "password cannot be empty".to_string(),
            ));
        }

        let salt: [u8; HASH_SALT_LENGTH] = random_array("password salt")?;
        let hash = argon2id(password, &salt, self.params, HASH_LENGTH)
            .map_err(|e| CardkeepError::Crypto(format!("Argon2id hashing failed: {e}")))?;

        let encoded = EncodedHash {
            params: self.params,
            salt: salt.to_vec(),
            hash: hash.to_vec(),
        };
        debug!(
            m = self.params.memory_cost,
            t = self.params.iterations,
            p = self.params.parallelism,
            "password hashed"
        );
        Ok(encoded.to_string())
    }

    /// Check a password against a stored encoded hash.
    ///
    /// Never fails: a malformed or unsupported stored hash is a mismatch.
    pub fn verify(&self, password: &str, encoded_hash: &str) -> bool {
        verify_password(password, encoded_hash)
    }

    /// True when `encoded_hash` was produced with weaker or different
    /// parameters than this hasher's, so it should be re-hashed on next login.
    pub fn needs_rehash(&self, encoded_hash: &str) -> bool {
        match encoded_hash.parse::<EncodedHash>() {
            Ok(parsed) => parsed.params != self.params || parsed.hash.len() != HASH_LENGTH,
            Err(_) => true,
        }
    }
}

/// Check a password against a stored encoded hash.
///
/// Parse failures, unknown algorithms, and out-of-range parameters all yield
/// `false`; the reason is logged at debug level only.
pub fn verify_password(password: &str, encoded_hash: &str) -> bool {
    if password.is_empty() {
        return false;
    }
    match check(password, encoded_hash) {
        Ok(matched) => matched,
        Err(reason) => {
            debug!(%reason, "stored password hash rejected");
            false
        }
    }
}

fn check(password: &str, encoded_hash: &str) -> std::result::Result<bool, HashParseError> {
    let stored: EncodedHash = encoded_hash.parse()?;
    let computed = argon2id(password, &stored.salt, stored.params, stored.hash.len())
        .map_err(|_| HashParseError::Parameters)?;
    Ok(constant_time_eq(&stored.hash, &computed))
}

fn argon2id(
    password: &str,
    salt: &[u8],
    params: HashParams,
    output_len: usize,
) -> std::result::Result<Zeroizing<Vec<u8>>, argon2::Error> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2(output_len)?);
    let mut output = Zeroizing::new(vec![0u8; output_len]);
    argon2.hash_password_into(password.as_bytes(), salt, &mut output)?;
    Ok(output)
}

/// Compare two byte strings without an early exit.
///
/// Runs over the full length of `expected`; only the lengths leak.
fn constant_time_eq(expected: &[u8], actual: &[u8]) -> bool {
    if expected.len() != actual.len() {
        return false;
    }
    let diff = expected
        .iter()
        .zip(actual)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    std::hint::black_box(diff) == 0
}

/// Why a stored hash string was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashParseError {
    Structure,
    UnknownAlgorithm(String),
    UnsupportedVersion(String),
    Parameters,
    Base64,
    Length,
}

impl fmt::Display for HashParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure => f.write_str("wrong number of `$` sections"),
            Self::UnknownAlgorithm(alg) => write!(f, "unknown algorithm `{alg}`"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported version `{v}`"),
            Self::Parameters => f.write_str("invalid cost parameters"),
            Self::Base64 => f.write_str("invalid base64"),
            Self::Length => f.write_str("salt or hash length out of range"),
        }
    }
}

/// Parsed form of the encoded hash string.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EncodedHash {
    params: HashParams,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${ALGORITHM_ID}$v={ARGON2_VERSION}$m={},t={},p={}${}${}",
            self.params.memory_cost,
            self.params.iterations,
            self.params.parallelism,
            STANDARD.encode(&self.salt),
            STANDARD.encode(&self.hash),
        )
    }
}

impl FromStr for EncodedHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let rest = s.strip_prefix('$').ok_or(HashParseError::Structure)?;
        let parts: Vec<&str> = rest.split('$').collect();
        let [alg, version, params, salt, hash] = parts.as_slice() else {
            return Err(HashParseError::Structure);
        };

        if *alg != ALGORITHM_ID {
            return Err(HashParseError::UnknownAlgorithm((*alg).to_string()));
        }
        if version.strip_prefix("v=") != Some("19") {
            return Err(HashParseError::UnsupportedVersion((*version).to_string()));
        }

        let params = parse_params(params)?;
        let salt = STANDARD.decode(salt).map_err(|_| HashParseError::Base64)?;
        let hash = STANDARD.decode(hash).map_err(|_| HashParseError::Base64)?;

        if salt.len() < MIN_STORED_SALT_LENGTH
            || !(MIN_STORED_HASH_LENGTH..=MAX_STORED_HASH_LENGTH).contains(&hash.len())
        {
            return Err(HashParseError::Length);
        }
        if params.memory_cost > MAX_MEMORY_COST || params.to_argon2(hash.len()).is_err() {
            return Err(HashParseError::Parameters);
        }

        Ok(Self { params, salt, hash })
    }
}

/// Parse `m=..,t=..,p=..`; each key exactly once, any order.
fn parse_params(section: &str) -> std::result::Result<HashParams, HashParseError> {
    let (mut m, mut t, mut p) = (None, None, None);
    for pair in section.split(',') {
        let (key, value) = pair.split_once('=').ok_or(HashParseError::Parameters)?;
        let value: u32 = value.parse().map_err(|_| HashParseError::Parameters)?;
        let slot = match key {
            "m" => &mut m,
            "t" => &mut t,
            "p" => &mut p,
            _ => return Err(HashParseError::Parameters),
        };
        if slot.replace(value).is_some() {
            return Err(HashParseError::Parameters);
        }
    }
    match (m, t, p) {
        (Some(memory_cost), Some(iterations), Some(parallelism)) => Ok(HashParams {
            memory_cost,
            iterations,
            parallelism,
        }),
        _ => Err(HashParseError::Parameters),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Low cost for fast tests.
    fn test_hasher() -> PasswordHasher {
        PasswordHasher::new(HashParams {
            memory_cost: 8192,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = test_hasher();
        let encoded = hasher.hash("Correct-Horse-9").unwrap();
        assert!(hasher.verify("Correct-Horse-9", &encoded));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hasher = test_hasher();
        let encoded = hasher.hash("Correct-Horse-9").unwrap();
        assert!(!hasher.verify("Correct-Horse-8", &encoded));
    }

    #[test]
    fn same_password_hashes_differently() {
        let hasher = test_hasher();
        let a = hasher.hash("same password").unwrap();
        let b = hasher.hash("same password").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("same password", &a));
        assert!(hasher.verify("same password", &b));
    }

    #[test]
    fn encoded_format_embeds_all_parameters() {
        let encoded = test_hasher().hash("pw").unwrap();
        assert!(encoded.starts_with("$argon2id$v=19$m=8192,t=1,p=1$"));

        let sections: Vec<&str> = encoded.split('$').collect();
        assert_eq!(sections.len(), 6);
        assert_eq!(STANDARD.decode(sections[4]).unwrap().len(), HASH_SALT_LENGTH);
        assert_eq!(STANDARD.decode(sections[5]).unwrap().len(), HASH_LENGTH);
    }

    #[test]
    fn blank_password_is_rejected_for_hashing() {
        let hasher = test_hasher();
        for blank in ["", "   ", "\t\n"] {
            let err = hasher.hash(blank).unwrap_err();
            assert!(matches!(err, CardkeepError::InvalidInput(_)));
        }
    }

    #[test]
    fn empty_password_never_verifies() {
        let hasher = test_hasher();
        let encoded = hasher.hash("something").unwrap();
        assert!(!hasher.verify("", &encoded));
    }

    #[test]
    fn verification_uses_embedded_parameters() {
        let weak = test_hasher();
        let encoded = weak.hash("portable").unwrap();

        let stronger = PasswordHasher::new(HashParams {
            memory_cost: 16384,
            iterations: 2,
            parallelism: 2,
        })
        .unwrap();
        assert!(stronger.verify("portable", &encoded));
        assert!(stronger.needs_rehash(&encoded));
        assert!(!weak.needs_rehash(&encoded));
    }

    #[test]
    fn malformed_hashes_fail_closed() {
        let hasher = test_hasher();
        let good = hasher.hash("pw").unwrap();
        let salt_and_hash = good.splitn(5, '$').nth(4).unwrap().to_string();

        let cases = [
            String::new(),
            "garbage".to_string(),
            "$argon2id$v=19$m=8192,t=1,p=1$onlysalt".to_string(),
            format!("$argon2i$v=19$m=8192,t=1,p=1${salt_and_hash}"),
            format!("$bcrypt$v=19$m=8192,t=1,p=1${salt_and_hash}"),
            format!("$argon2id$v=16$m=8192,t=1,p=1${salt_and_hash}"),
            format!("$argon2id$v=19$m=8192,t=1${salt_and_hash}"),
            format!("$argon2id$v=19$m=8192,t=1,p=1,p=1${salt_and_hash}"),
            format!("$argon2id$v=19$m=abc,t=1,p=1${salt_and_hash}"),
            format!("$argon2id$v=19$m=8192,t=0,p=1${salt_and_hash}"),
            format!("$argon2id$v=19$m=99999999,t=1,p=1${salt_and_hash}"),
            format!("$argon2id$v=19$m=4194304,t=1,p=1${salt_and_hash}"),
            format!("$argon2id$v=19$m=1048577,t=1,p=1${salt_and_hash}"),
            "$argon2id$v=19$m=8192,t=1,p=1$!!!!$AAAA".to_string(),
            format!("{good}$extra"),
        ];
        for case in &cases {
            assert!(!hasher.verify("pw", case), "should reject: {case}");
        }
    }

    #[test]
    fn truncated_hash_fails_closed() {
        let hasher = test_hasher();
        let encoded = hasher.hash("pw").unwrap();
        let (prefix, hash_b64) = encoded.rsplit_once('$').unwrap();
        let mut hash = STANDARD.decode(hash_b64).unwrap();
        hash.truncate(8);
        let truncated = format!("{prefix}${}", STANDARD.encode(&hash));
        assert!(!hasher.verify("pw", &truncated));
    }

    #[test]
    fn parse_reports_structured_reasons() {
        assert_eq!(
            "$scrypt$v=19$m=1,t=1,p=1$AAAAAAAAAAA=$AAAAAAAAAAAAAAAAAAAAAA=="
                .parse::<EncodedHash>()
                .unwrap_err(),
            HashParseError::UnknownAlgorithm("scrypt".to_string())
        );
        assert_eq!(
            "no-dollar".parse::<EncodedHash>().unwrap_err(),
            HashParseError::Structure
        );
    }

    #[test]
    fn params_parse_in_any_order() {
        let params = parse_params("p=2,m=8192,t=3").unwrap();
        assert_eq!(
            params,
            HashParams {
                memory_cost: 8192,
                iterations: 3,
                parallelism: 2
            }
        );
    }

    #[test]
    fn constant_time_eq_behaviour() {
        assert!(constant_time_eq(b"abcdef", b"abcdef"));
        assert!(!constant_time_eq(b"abcdef", b"abcdeg"));
        assert!(!constant_time_eq(b"abcdef", b"abcde"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn invalid_hasher_parameters_rejected() {
        let err = PasswordHasher::new(HashParams {
            memory_cost: 8192,
            iterations: 0,
            parallelism: 1,
        })
        .unwrap_err();
        assert!(matches!(err, CardkeepError::InvalidInput(_)));
    }

    #[test]
    fn oversized_memory_cost_rejected() {
        let err = PasswordHasher::new(HashParams {
            memory_cost: MAX_MEMORY_COST + 1,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap_err();
        assert!(matches!(err, CardkeepError::InvalidInput(_)));
    }
}
