// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of registration, unlock, and field protection.

use std::sync::Arc;
use std::time::Duration;

use cardkeep_config::CardkeepConfig;
use cardkeep_core::{CardkeepError, CredentialStore, UserId};
use cardkeep_crypto::{HashParams, KeyDeriver, PasswordHasher, PasswordPolicy};
use cardkeep_keycache::{KeyCache, ManualClock};
use cardkeep_records::{CardSecrets, MemoryStore, ProtectedRecordService};
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

const TTL: Duration = Duration::from_secs(30 * 60);
const PASSWORD: &str = "Correct-Horse-9";

struct Harness {
    service: ProtectedRecordService,
    store: MemoryStore,
    clock: Arc<ManualClock>,
}

fn fast_hasher() -> PasswordHasher {
    PasswordHasher::new(HashParams {
        memory_cost: 8192,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

fn harness() -> Harness {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(KeyCache::with_clock(TTL, clock.clone()));
    let service = ProtectedRecordService::new(
        Arc::new(store.clone()),
        cache,
        fast_hasher(),
        KeyDeriver::new(1000).unwrap(),
        PasswordPolicy::default(),
    );
    Harness {
        service,
        store,
        clock,
    }
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

async fn registered(h: &Harness) -> UserId {
    let user = UserId::new_random();
    h.service.register(user, &secret(PASSWORD)).await.unwrap();
    user
}

#[tokio::test]
async fn unlock_protect_reveal_then_expire() {
    let h = harness();
    let user = registered(&h).await;

    h.service.unlock(user, &secret(PASSWORD)).await.unwrap();
    let field = h.service.protect_field(&user, "4111111111111111").unwrap();
    assert_eq!(
        h.service.reveal_field(&user, &field).unwrap(),
        "4111111111111111"
    );

    h.clock.advance(TTL + Duration::from_secs(1));
    assert!(matches!(
        h.service.reveal_field(&user, &field),
        Err(CardkeepError::Locked)
    ));
}

#[tokio::test]
async fn activity_keeps_the_session_open() {
    let h = harness();
    let user = registered(&h).await;
    h.service.login(user, &secret(PASSWORD)).await.unwrap();
    let field = h.service.protect_field(&user, "0420").unwrap();

    for _ in 0..6 {
        h.clock.advance(TTL - Duration::from_secs(60));
        assert_eq!(h.service.reveal_field(&user, &field).unwrap(), "0420");
    }
}

#[tokio::test]
async fn new_user_starts_locked() {
    let h = harness();
    let user = registered(&h).await;
    assert!(!h.service.is_unlocked(&user));
    assert!(matches!(
        h.service.protect_field(&user, "1234"),
        Err(CardkeepError::Locked)
    ));
}

#[tokio::test]
async fn register_rejects_weak_password_and_duplicates() {
    let h = harness();
    let user = UserId::new_random();

    let err = h.service.register(user, &secret("short")).await.unwrap_err();
    assert!(matches!(err, CardkeepError::InvalidInput(_)));
    assert_eq!(h.store.credential_count().await, 0);

    h.service.register(user, &secret(PASSWORD)).await.unwrap();
    let err = h
        .service
        .register(user, &secret("Another-Pass-2"))
        .await
        .unwrap_err();
    assert!(matches!(err, CardkeepError::AlreadyRegistered(id) if id == user));
}

#[tokio::test]
async fn register_stores_encoded_hash_and_independent_salt() {
    let h = harness();
    let user = registered(&h).await;

    let credential = h.store.load_credential(&user).await.unwrap().unwrap();
    assert!(credential.password_hash.starts_with("$argon2id$v=19$m=8192,t=1,p=1$"));
    assert!(h.store.load_key_salt(&user).await.unwrap().is_some());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let h = harness();
    let user = registered(&h).await;

    let wrong = h
        .service
        .login(user, &secret("Wrong-Horse-9"))
        .await
        .unwrap_err();
    let unknown = h
        .service
        .login(UserId::new_random(), &secret(PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(wrong, CardkeepError::AuthenticationFailed));
    assert_eq!(wrong.to_string(), unknown.to_string());
    assert!(!h.service.is_unlocked(&user));
}

#[tokio::test]
async fn login_upgrades_outdated_hash() {
    let h = harness();
    let user = registered(&h).await;

    let stronger = ProtectedRecordService::new(
        Arc::new(h.store.clone()),
        Arc::new(KeyCache::new(TTL)),
        PasswordHasher::new(HashParams {
            memory_cost: 8192,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap(),
        KeyDeriver::new(1000).unwrap(),
        PasswordPolicy::default(),
    );
    stronger.login(user, &secret(PASSWORD)).await.unwrap();

    let credential = h.store.load_credential(&user).await.unwrap().unwrap();
    assert!(credential.password_hash.contains("m=8192,t=2,p=1"));

    // The old service still verifies the upgraded hash.
    h.service.login(user, &secret(PASSWORD)).await.unwrap();
}

#[tokio::test]
async fn unlock_without_salt_is_not_found() {
    let h = harness();
    let user = registered(&h).await;
    h.store.delete_key_salt(&user).await;

    let err = h.service.unlock(user, &secret(PASSWORD)).await.unwrap_err();
    assert!(matches!(err, CardkeepError::NotFound(_)));

    let err = h.service.login(user, &secret(PASSWORD)).await.unwrap_err();
    assert!(matches!(err, CardkeepError::NotFound(_)));
    assert!(!h.service.is_unlocked(&user));
}

#[tokio::test]
async fn unlock_rejects_blank_password() {
    let h = harness();
    let user = registered(&h).await;
    let err = h.service.unlock(user, &secret("   ")).await.unwrap_err();
    assert!(matches!(err, CardkeepError::InvalidInput(_)));
}

#[tokio::test]
async fn wrong_password_unlock_fails_at_reveal() {
    let h = harness();
    let user = registered(&h).await;
    h.service.unlock(user, &secret(PASSWORD)).await.unwrap();
    let field = h.service.protect_field(&user, "4111111111111111").unwrap();

    h.service.unlock(user, &secret("Not-The-Pass-1")).await.unwrap();
    assert!(matches!(
        h.service.reveal_field(&user, &field),
        Err(CardkeepError::DecryptionFailed)
    ));
}

#[tokio::test]
async fn lock_is_immediate_and_idempotent() {
    let h = harness();
    let user = registered(&h).await;
    h.service.unlock(user, &secret(PASSWORD)).await.unwrap();
    let field = h.service.protect_field(&user, "1234").unwrap();

    h.service.lock(&user);
    h.service.lock(&user);
    assert!(matches!(
        h.service.reveal_field(&user, &field),
        Err(CardkeepError::Locked)
    ));
}

#[tokio::test]
async fn fields_are_bound_to_their_owner() {
    let h = harness();
    let alice = registered(&h).await;
    let bob = registered(&h).await;
    h.service.unlock(alice, &secret(PASSWORD)).await.unwrap();
    h.service.unlock(bob, &secret(PASSWORD)).await.unwrap();

    let alice_field = h.service.protect_field(&alice, "4111111111111111").unwrap();
    assert!(matches!(
        h.service.reveal_field(&bob, &alice_field),
        Err(CardkeepError::DecryptionFailed)
    ));
}

#[tokio::test]
async fn card_with_and_without_pin() {
    let h = harness();
    let user = registered(&h).await;
    h.service.unlock(user, &secret(PASSWORD)).await.unwrap();

    let with_pin = CardSecrets::new("6035123412341234", Some("0420".to_string()));
    let protected = h.service.protect_card(&user, &with_pin).unwrap();
    let stored = protected.encode();
    let revealed = h.service.reveal_card(&user, &stored.decode().unwrap()).unwrap();
    assert_eq!(revealed.card_number.expose_secret(), "6035123412341234");
    assert_eq!(
        revealed.pin.as_ref().map(|p| p.expose_secret().to_string()),
        Some("0420".to_string())
    );

    let without_pin = CardSecrets::new("6035999988887777", None);
    let protected = h.service.protect_card(&user, &without_pin).unwrap();
    assert!(protected.pin.is_none());
    assert!(h.service.reveal_card(&user, &protected).unwrap().pin.is_none());

    let empty_pin = CardSecrets::new("6035999988887777", Some(String::new()));
    let protected = h.service.protect_card(&user, &empty_pin).unwrap();
    let revealed = h.service.reveal_card(&user, &protected).unwrap();
    assert_eq!(revealed.pin.map(|p| p.expose_secret().to_string()), Some(String::new()));
}

#[tokio::test]
async fn optional_field_absent_needs_no_session() {
    let h = harness();
    let user = registered(&h).await;
    assert!(h.service.protect_optional_field(&user, None).unwrap().is_none());
    assert!(matches!(
        h.service.protect_optional_field(&user, Some("1")),
        Err(CardkeepError::Locked)
    ));
}

#[tokio::test]
async fn login_caches_exactly_one_key() {
    let h = harness();
    let user = registered(&h).await;
    h.service.login(user, &secret(PASSWORD)).await.unwrap();
    assert_eq!(h.service.cache().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_users_do_not_interfere() {
    let h = Arc::new(harness());
    let mut users = Vec::new();
    for _ in 0..8 {
        users.push(registered(&h).await);
    }

    let mut tasks = Vec::new();
    for (i, user) in users.iter().copied().enumerate() {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            h.service.login(user, &secret(PASSWORD)).await.unwrap();
            let value = format!("card-{i}");
            let field = h.service.protect_field(&user, &value).unwrap();
            assert_eq!(h.service.reveal_field(&user, &field).unwrap(), value);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(h.service.cache().len(), users.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_has_one_winner() {
    let h = Arc::new(harness());
    for _ in 0..20 {
        let user = UserId::new_random();
        let first = tokio::spawn({
            let h = h.clone();
            async move { h.service.register(user, &secret(PASSWORD)).await }
        });
        let second = tokio::spawn({
            let h = h.clone();
            async move { h.service.register(user, &secret("Another-Pass-2")).await }
        });
        let (first, second) = tokio::join!(first, second);
        let outcomes = [first.unwrap(), second.unwrap()];

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(CardkeepError::AlreadyRegistered(id)) if *id == user))
                .count(),
            1
        );

        // The winner's password must still unlock the stored salt.
        let winner = if outcomes[0].is_ok() { PASSWORD } else { "Another-Pass-2" };
        h.service.login(user, &secret(winner)).await.unwrap();
        let field = h.service.protect_field(&user, "5500").unwrap();
        assert_eq!(h.service.reveal_field(&user, &field).unwrap(), "5500");
    }
    assert_eq!(h.store.credential_count().await, 20);
}

#[tokio::test]
async fn from_config_rejects_zero_kdf_iterations() {
    let mut config = CardkeepConfig::default();
    config.hashing.memory_cost = 8192;
    config.hashing.iterations = 1;
    config.hashing.parallelism = 1;
    config.key_derivation.iterations = 0;

    let err = ProtectedRecordService::from_config(&config, Arc::new(MemoryStore::new()))
        .err()
        .unwrap();
    assert!(matches!(err, CardkeepError::Config(_)));
}

#[tokio::test]
async fn from_config_uses_configured_policy() {
    let mut config = CardkeepConfig::default();
    config.hashing.memory_cost = 8192;
    config.hashing.iterations = 1;
    config.hashing.parallelism = 1;
    config.password_policy.min_length = 12;

    let service =
        ProtectedRecordService::from_config(&config, Arc::new(MemoryStore::new())).unwrap();
    assert_eq!(service.cache().default_ttl(), Duration::from_secs(1800));

    let err = service
        .register(UserId::new_random(), &secret("Short-Pw1!"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("at least 12"));
}

#[tokio::test]
async fn sweeper_follows_configuration() {
    let mut config = CardkeepConfig::default();
    config.hashing.memory_cost = 8192;
    config.hashing.parallelism = 1;
    let service =
        ProtectedRecordService::from_config(&config, Arc::new(MemoryStore::new())).unwrap();
    let cancel = CancellationToken::new();

    let handle = service
        .spawn_cache_sweeper(&config, cancel.clone())
        .expect("sweeper enabled by default");
    cancel.cancel();
    handle.await.unwrap();

    config.key_cache.sweep_interval_secs = 0;
    assert!(service.spawn_cache_sweeper(&config, cancel).is_none());
}

#[tokio::test]
#[traced_test]
async fn secrets_never_reach_the_logs() {
    let h = harness();
    let user = registered(&h).await;
    h.service.login(user, &secret(PASSWORD)).await.unwrap();
    let field = h.service.protect_field(&user, "4111111111111111").unwrap();
    h.service.reveal_field(&user, &field).unwrap();
    let _ = h.service.login(user, &secret("Wrong-Horse-9")).await;
    h.service.lock(&user);

    assert!(logs_contain("session unlocked"));
    assert!(logs_contain("login failed"));
    assert!(!logs_contain(PASSWORD));
    assert!(!logs_contain("Wrong-Horse-9"));
    assert!(!logs_contain("4111111111111111"));
    assert!(!logs_contain("$argon2id$"));
}
