//! Property-based tests for the authentication engine.
//!
//! Property 5: Username Uniqueness
//! Property 6: Single-Use Refresh Tokens
//! Property 7: Logout Idempotence
//! Property 8: Concurrent Exclusivity

use proptest::prelude::*;
use std::sync::Arc;
use test_utils::fixtures::TEST_SECRET;
use test_utils::{password_strategy, username_strategy};
use token_lifecycle::config::PasswordConfig;
use token_lifecycle::storage::MemoryStorage;
use token_lifecycle::{AuthEngine, AuthError, Config};

fn create_test_engine() -> (AuthEngine, MemoryStorage) {
    let config = Config::new(TEST_SECRET)
        .unwrap()
        .with_password_config(PasswordConfig::fast_for_tests());
    let storage = MemoryStorage::new();
    let engine = AuthEngine::with_argon2(&config, Arc::new(storage.clone())).unwrap();
    (engine, storage)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Property 5: Username Uniqueness
    ///
    /// A second signup for a taken username fails whatever the password,
    /// and the first credentials keep working.
    #[test]
    fn prop_duplicate_signup_rejected(
        username in username_strategy(),
        first in password_strategy(),
        second in password_strategy(),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let (engine, storage) = create_test_engine();
            engine.signup(&username, &first).await.unwrap();

            let result = engine.signup(&username, &second).await;
            prop_assert!(matches!(result, Err(AuthError::UsernameTaken)));
            prop_assert_eq!(storage.identity_count().await, 1);

            prop_assert!(engine.login(&username, &first).await.is_ok());
            Ok(())
        })?;
    }

    /// Property 6: Single-Use Refresh Tokens
    ///
    /// Each refresh token in a rotation chain is accepted exactly once and
    /// the owner never holds more than one live record.
    #[test]
    fn prop_refresh_token_single_use(
        username in username_strategy(),
        password in password_strategy(),
        rotations in 1usize..5,
    ) {
        let rt = runtime();
        rt.block_on(async {
            let (engine, storage) = create_test_engine();
            engine.signup(&username, &password).await.unwrap();
            let mut current = engine.login(&username, &password).await.unwrap().refresh_token;

            for _ in 0..rotations {
                let next = engine.refresh(&current).await.unwrap().refresh_token;
                prop_assert_ne!(&next, &current);
                prop_assert!(engine.refresh(&current).await.is_err());
                prop_assert_eq!(storage.refresh_token_count().await, 1);
                current = next;
            }
            Ok(())
        })?;
    }

    /// Property 7: Logout Idempotence
    ///
    /// Logging out any string succeeds and never creates a record.
    #[test]
    fn prop_logout_unknown_token_is_noop(token in any::<String>()) {
        let rt = runtime();
        rt.block_on(async {
            let (engine, storage) = create_test_engine();

            prop_assert!(engine.logout(&token).await.is_ok());
            prop_assert!(engine.logout(&token).await.is_ok());
            prop_assert_eq!(storage.refresh_token_count().await, 0);
            Ok(())
        })?;
    }
}

/// Property 8a: concurrent signups of one username admit exactly one.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_signup_admits_one() {
    let (engine, storage) = create_test_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.signup("alice", &format!("pw-{}", i)).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(err) => assert!(matches!(err, AuthError::UsernameTaken)),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(storage.identity_count().await, 1);
}

/// Property 8b: concurrent refreshes of one token admit exactly one.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_admits_one() {
    let (engine, storage) = create_test_engine();
    engine.signup("alice", "pw1").await.unwrap();
    let pair = engine.login("alice", "pw1").await.unwrap();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let token = pair.refresh_token.clone();
            tokio::spawn(async move { engine.refresh(&token).await })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(rotated) => winners.push(rotated),
            Err(err) => assert!(matches!(err, AuthError::InvalidRefreshToken)),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(storage.refresh_token_count().await, 1);
    engine.refresh(&winners[0].refresh_token).await.unwrap();
}
