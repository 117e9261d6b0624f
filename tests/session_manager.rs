mod common;

use chrono::{TimeDelta, Utc};
use common::*;
use diary::application_impl::*;
use diary::application_port::*;
use diary::domain_model::*;
use diary::domain_port::*;
use diary::infra_memory::MemorySessionStore;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn created_session_validates_to_its_user() {
    let (manager, store) = memory_manager();

    let tokens = manager.create_session(UserId(42)).await.unwrap();
    assert_eq!(store.len(), 2);
    assert_ne!(tokens.access_session_id, tokens.refresh_session_id);

    let session = manager
        .validate_access(&tokens.access_token.0)
        .await
        .unwrap();
    assert_eq!(session.user_id, UserId(42));
    assert_eq!(session.session_id, tokens.access_session_id);
}

#[tokio::test]
async fn token_classes_are_not_interchangeable() {
    let (manager, _) = memory_manager();
    let tokens = manager.create_session(UserId(7)).await.unwrap();

    assert!(matches!(
        manager.validate_access(&tokens.refresh_token.0).await,
        Err(SessionError::SignatureInvalid) | Err(SessionError::Malformed)
    ));
    assert!(matches!(
        manager.refresh(&tokens.access_token.0).await,
        Err(SessionError::SignatureInvalid) | Err(SessionError::Malformed)
    ));
}

#[tokio::test]
async fn revoked_access_token_is_rejected() {
    let (manager, _) = memory_manager();
    let tokens = manager.create_session(UserId(1)).await.unwrap();

    assert_eq!(manager.revoke(tokens.access_session_id).await.unwrap(), 1);
    assert!(matches!(
        manager.validate_access(&tokens.access_token.0).await,
        Err(SessionError::Revoked)
    ));

    // Revoking again is not an error.
    assert_eq!(manager.revoke(tokens.access_session_id).await.unwrap(), 0);
}

#[tokio::test]
async fn refresh_rotates_and_is_single_use() {
    let (manager, store) = memory_manager();
    let first = manager.create_session(UserId(5)).await.unwrap();

    let second = manager.refresh(&first.refresh_token.0).await.unwrap();
    assert_ne!(second.refresh_session_id, first.refresh_session_id);
    assert_eq!(store.get(&first.refresh_session_id).await.unwrap(), None);

    let session = manager
        .validate_access(&second.access_token.0)
        .await
        .unwrap();
    assert_eq!(session.user_id, UserId(5));

    assert!(matches!(
        manager.refresh(&first.refresh_token.0).await,
        Err(SessionError::Revoked)
    ));

    // The access session issued before the rotation lives until it expires.
    assert!(manager.validate_access(&first.access_token.0).await.is_ok());
}

#[tokio::test]
async fn concurrent_refreshes_have_one_winner() {
    let (manager, _) = memory_manager();
    let tokens = manager.create_session(UserId(9)).await.unwrap();

    let (a, b) = tokio::join!(
        manager.refresh(&tokens.refresh_token.0),
        manager.refresh(&tokens.refresh_token.0)
    );
    let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn expired_token_fails_even_with_a_live_record() {
    let store = Arc::new(MemorySessionStore::new());
    let issuer = issuer();
    let manager = RealSessionManager::new(issuer.clone(), store.clone());

    let tokens = issuer
        .issue_at(UserId(3), Utc::now() - TimeDelta::hours(1))
        .unwrap();
    store
        .put(&tokens.access_session_id, UserId(3), Duration::from_secs(60))
        .await
        .unwrap();

    assert!(matches!(
        manager.validate_access(&tokens.access_token.0).await,
        Err(SessionError::Expired)
    ));
}

#[tokio::test]
async fn token_from_a_foreign_secret_is_rejected() {
    let (manager, store) = memory_manager();
    let foreign = JwtTokenIssuer::try_new(JwtConfig::new(
        "diary.test",
        "someone-elses-access",
        "someone-elses-refresh",
    ))
    .unwrap();

    let tokens = foreign.issue(UserId(11)).unwrap();
    store
        .put(&tokens.access_session_id, UserId(11), Duration::from_secs(60))
        .await
        .unwrap();

    assert!(matches!(
        manager.validate_access(&tokens.access_token.0).await,
        Err(SessionError::SignatureInvalid)
    ));
}

#[tokio::test]
async fn stored_identity_wins_over_the_claim() {
    let (manager, store) = memory_manager();
    let tokens = manager.create_session(UserId(1)).await.unwrap();

    store
        .put(&tokens.access_session_id, UserId(2), Duration::from_secs(60))
        .await
        .unwrap();

    let session = manager
        .validate_access(&tokens.access_token.0)
        .await
        .unwrap();
    assert_eq!(session.user_id, UserId(2));
}

#[tokio::test]
async fn unavailable_store_fails_closed() {
    let (healthy, _) = memory_manager();
    let tokens = healthy.create_session(UserId(1)).await.unwrap();

    let manager = manager_with(Arc::new(FailingSessionStore));
    let result = manager.validate_access(&tokens.access_token.0).await;
    assert!(matches!(result, Err(SessionError::Store(_))));
    assert!(result.unwrap_err().is_internal());

    assert!(matches!(
        manager.create_session(UserId(1)).await,
        Err(SessionError::Store(_))
    ));
    assert!(matches!(
        manager.refresh(&tokens.refresh_token.0).await,
        Err(SessionError::Store(_))
    ));
}

#[tokio::test]
async fn slow_store_times_out_as_a_store_error() {
    let store = Arc::new(SlowSessionStore {
        inner: MemorySessionStore::new(),
        delay: Duration::from_millis(200),
    });
    let manager = manager_with(store).with_store_timeout(Duration::from_millis(20));

    assert!(matches!(
        manager.create_session(UserId(1)).await,
        Err(SessionError::Store(_))
    ));
}

#[tokio::test]
async fn failed_refresh_write_leaves_no_access_record() {
    let store = Arc::new(FlakySessionStore::new(1));
    let manager = manager_with(store.clone());

    assert!(matches!(
        manager.create_session(UserId(1)).await,
        Err(SessionError::Store(_))
    ));
    assert!(store.inner.is_empty());
}

#[tokio::test]
async fn authenticator_collapses_every_failure() {
    let (manager, _) = memory_manager();
    let manager = Arc::new(manager);
    let authenticator = RequestAuthenticator::new(manager.clone());

    let tokens = manager.create_session(UserId(8)).await.unwrap();
    let session = authenticator
        .authenticate(Some(&bearer(&tokens)))
        .await
        .unwrap();
    assert_eq!(session.user_id, UserId(8));
    let lowercase = format!("bearer {}", tokens.access_token.0);
    assert_eq!(
        authenticator.authenticate(Some(&lowercase)).await,
        Ok(session)
    );

    assert_eq!(authenticator.authenticate(None).await, Err(Unauthorized));
    assert_eq!(
        authenticator.authenticate(Some("Bearer not-a-jwt")).await,
        Err(Unauthorized)
    );
    let refresh_as_access = format!("Bearer {}", tokens.refresh_token.0);
    assert_eq!(
        authenticator.authenticate(Some(&refresh_as_access)).await,
        Err(Unauthorized)
    );

    manager.revoke(tokens.access_session_id).await.unwrap();
    assert_eq!(
        authenticator.authenticate(Some(&bearer(&tokens))).await,
        Err(Unauthorized)
    );

    let failing_manager = manager_with(Arc::new(FailingSessionStore));
    let failing = RequestAuthenticator::new(Arc::new(failing_manager));
    let fresh = manager.create_session(UserId(8)).await.unwrap();
    assert_eq!(
        failing.authenticate(Some(&bearer(&fresh))).await,
        Err(Unauthorized)
    );
}

#[tokio::test]
async fn zero_lifetime_is_refused_before_any_write() {
    let store = Arc::new(MemorySessionStore::new());
    let config = JwtConfig {
        access_ttl: Duration::ZERO,
        ..JwtConfig::new("diary.test", ACCESS_SECRET, REFRESH_SECRET)
    };
    let issuer = Arc::new(JwtTokenIssuer::try_new(config).unwrap());
    let manager = RealSessionManager::new(issuer, store.clone());

    let result = manager.create_session(UserId(1)).await;
    assert!(matches!(result, Err(SessionError::Signing(_))));
    assert!(store.is_empty());
}

fn slow_manager(delay_ms: u64) -> (RealSessionManager, Arc<SlowSessionStore>) {
    let store = Arc::new(SlowSessionStore {
        inner: MemorySessionStore::new(),
        delay: Duration::from_millis(delay_ms),
    });
    let manager = manager_with(store.clone()).with_store_timeout(Duration::from_secs(5));
    (manager, store)
}

#[tokio::test]
async fn dropped_create_still_writes_both_records() {
    let (manager, store) = slow_manager(50);

    // Gives up between the access and the refresh write.
    let abandoned = tokio::time::timeout(
        Duration::from_millis(75),
        manager.create_session(UserId(4)),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(store.inner.len() <= 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.inner.len(), 2);
}

#[tokio::test]
async fn dropped_refresh_still_completes_the_rotation() {
    let (manager, store) = slow_manager(50);
    let tokens = manager.create_session(UserId(6)).await.unwrap();
    assert_eq!(store.inner.len(), 2);

    // Gives up after the lookup, before the old record is deleted.
    let abandoned = tokio::time::timeout(
        Duration::from_millis(75),
        manager.refresh(&tokens.refresh_token.0),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(
        store.inner.get(&tokens.refresh_session_id).await.unwrap(),
        None
    );
    // Old access record plus a complete new pair.
    assert_eq!(store.inner.len(), 3);
    assert_eq!(
        store.inner.get(&tokens.access_session_id).await.unwrap(),
        Some(UserId(6))
    );
}
