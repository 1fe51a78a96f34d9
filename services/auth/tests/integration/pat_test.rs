use std::sync::Arc;

use chrono::{Duration, Timelike, Utc};
use uuid::Uuid;

use lattice_auth::domain::types::{PAT_CREATE_WINDOW_SECS, PersonalAccessToken};
use lattice_auth::error::AuthServiceError;
use lattice_auth::ratelimit::{InMemoryRateLimitStore, RateLimiter};
use lattice_auth::usecase::pat::{
    CreatePatInput, CreatePatUseCase, DeletePatUseCase, ListPatsUseCase, ValidatePatUseCase,
    last_used_channel, spawn_last_used_worker,
};

use crate::helpers::{MockPatRepo, test_pat};

fn create_usecase(tokens: MockPatRepo) -> CreatePatUseCase<MockPatRepo, InMemoryRateLimitStore> {
    CreatePatUseCase {
        tokens,
        limiter: Arc::new(RateLimiter::new(InMemoryRateLimitStore::new())),
        token_prefix: "lat".to_owned(),
        token_environment: "live".to_owned(),
    }
}

fn input(user_id: Uuid, name: &str) -> CreatePatInput {
    CreatePatInput {
        user_id,
        name: name.to_owned(),
        expires_at: None,
    }
}

// ── CreatePatUseCase ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_token_in_expected_format() {
    let tokens = MockPatRepo::empty();
    let handle = tokens.handle();
    let user_id = Uuid::new_v4();

    let created = create_usecase(tokens)
        .execute(input(user_id, "ci deploy key"))
        .await
        .unwrap();

    let parts: Vec<&str> = created.token.split('_').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "lat");
    assert_eq!(parts[1], "live");
    assert_eq!(parts[2].len(), 32);

    let stored = handle.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].token, created.token);
    assert_eq!(stored[0].name, "ci deploy key");
    assert!(stored[0].last_used_at.is_none());
}

#[tokio::test]
async fn dangerous_name_should_fail_before_any_quota_check() {
    let usecase = create_usecase(MockPatRepo::empty());
    let user_id = Uuid::new_v4();

    let result = usecase
        .execute(input(user_id, "<script>alert(1)</script>"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidTokenName)),
        "expected InvalidTokenName, got {result:?}"
    );

    // The rejected call must not have consumed a rate-limit slot.
    let count = usecase
        .limiter
        .get_count(
            &format!("api_key_creation:{user_id}"),
            PAT_CREATE_WINDOW_SECS,
        )
        .await;
    assert_eq!(count, 0);
}

#[tokio::test]
async fn fifty_first_creation_in_window_should_hit_rate_limit() {
    let usecase = create_usecase(MockPatRepo::empty());
    let user_id = Uuid::new_v4();

    for i in 0..50 {
        usecase
            .execute(input(user_id, &format!("token {i}")))
            .await
            .unwrap_or_else(|e| panic!("creation {i} failed: {e:?}"));
    }

    let before = Utc::now();
    let result = usecase.execute(input(user_id, "one too many")).await;
    match result {
        Err(AuthServiceError::RateLimitExceeded { resets_at }) => {
            // Reset time is coarse: top of an hour, in the future.
            assert_eq!(resets_at.minute(), 0);
            assert_eq!(resets_at.second(), 0);
            assert!(resets_at > before);
        }
        other => panic!("expected RateLimitExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_should_be_per_user() {
    let usecase = create_usecase(MockPatRepo::empty());
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    for i in 0..50 {
        usecase.execute(input(first, &format!("t{i}"))).await.unwrap();
    }
    assert!(usecase.execute(input(first, "over")).await.is_err());
    assert!(usecase.execute(input(second, "fresh user")).await.is_ok());
}

#[tokio::test]
async fn active_token_ceiling_should_fail_distinctly_from_rate_limit() {
    let user_id = Uuid::new_v4();
    let existing: Vec<PersonalAccessToken> = (0..500)
        .map(|i| test_pat(user_id, &format!("lat_live_existing{i:027}")))
        .collect();
    let usecase = create_usecase(MockPatRepo::new(existing));

    let result = usecase.execute(input(user_id, "501st")).await;
    assert!(
        matches!(result, Err(AuthServiceError::MaxTokensExceeded)),
        "expected MaxTokensExceeded, got {result:?}"
    );
}

#[tokio::test]
async fn expired_tokens_should_not_count_toward_ceiling() {
    let user_id = Uuid::new_v4();
    let mut existing: Vec<PersonalAccessToken> = (0..500)
        .map(|i| test_pat(user_id, &format!("lat_live_existing{i:027}")))
        .collect();
    for token in existing.iter_mut().take(10) {
        token.expires_at = Some(Utc::now() - Duration::seconds(1));
    }
    let usecase = create_usecase(MockPatRepo::new(existing));

    assert!(usecase.execute(input(user_id, "fits again")).await.is_ok());
}

#[tokio::test]
async fn collision_should_retry_then_succeed() {
    let tokens = MockPatRepo::with_collisions(3);
    let handle = tokens.handle();

    create_usecase(tokens)
        .execute(input(Uuid::new_v4(), "resilient"))
        .await
        .unwrap();
    assert_eq!(handle.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn persistent_collisions_should_exhaust_the_retry_bound() {
    let tokens = MockPatRepo::with_collisions(100);
    let result = create_usecase(tokens)
        .execute(input(Uuid::new_v4(), "doomed"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::TokenGenerationFailed)),
        "expected TokenGenerationFailed, got {result:?}"
    );
}

// ── ValidatePatUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_token_should_be_not_found() {
    let (tx, _rx) = last_used_channel();
    let usecase = ValidatePatUseCase {
        tokens: MockPatRepo::empty(),
        last_used: tx,
    };
    let result = usecase.execute("lat_live_doesnotexist").await;
    assert!(
        matches!(result, Err(AuthServiceError::NotFound)),
        "expected NotFound, got {result:?}"
    );
}

#[tokio::test]
async fn expired_token_should_fail_but_stay_in_store() {
    let user_id = Uuid::new_v4();
    let mut token = test_pat(user_id, "lat_live_expiredtoken");
    token.expires_at = Some(Utc::now() - Duration::seconds(1));
    let tokens = MockPatRepo::new(vec![token]);
    let handle = tokens.handle();

    let (tx, _rx) = last_used_channel();
    let usecase = ValidatePatUseCase {
        tokens,
        last_used: tx,
    };
    let result = usecase.execute("lat_live_expiredtoken").await;
    assert!(
        matches!(result, Err(AuthServiceError::TokenExpired)),
        "expected TokenExpired, got {result:?}"
    );
    // Lazy expiry: validation never deletes.
    assert_eq!(handle.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn validation_should_stamp_last_used_via_the_worker() {
    let user_id = Uuid::new_v4();
    let tokens = MockPatRepo::new(vec![test_pat(user_id, "lat_live_activetoken00")]);
    let handle = tokens.handle();

    let (tx, rx) = last_used_channel();
    let worker = spawn_last_used_worker(tokens.clone(), rx);

    let usecase = ValidatePatUseCase {
        tokens,
        last_used: tx,
    };
    let identity = usecase.execute("lat_live_activetoken00").await.unwrap();
    assert_eq!(identity.user_id, user_id);

    // Close the queue and wait for the worker to drain it.
    drop(usecase);
    worker.await.unwrap();

    assert!(handle.lock().unwrap()[0].last_used_at.is_some());
}

// ── ListPatsUseCase / DeletePatUseCase ───────────────────────────────────────

#[tokio::test]
async fn listing_should_only_show_the_callers_tokens() {
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    let tokens = MockPatRepo::new(vec![
        test_pat(owner, "lat_live_mine0000000001"),
        test_pat(other, "lat_live_theirs00000001"),
    ]);

    let usecase = ListPatsUseCase { tokens };
    let summaries = usecase.execute(owner).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, "test token");
}

#[tokio::test]
async fn delete_should_enforce_ownership_before_mutation() {
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let token = test_pat(owner, "lat_live_guarded000001");
    let token_id = token.id;
    let tokens = MockPatRepo::new(vec![token]);
    let handle = tokens.handle();

    let usecase = DeletePatUseCase { tokens };

    let result = usecase.execute(intruder, token_id).await;
    assert!(
        matches!(result, Err(AuthServiceError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
    assert_eq!(handle.lock().unwrap().len(), 1);

    usecase.execute(owner, token_id).await.unwrap();
    assert!(handle.lock().unwrap().is_empty());

    let result = usecase.execute(owner, token_id).await;
    assert!(
        matches!(result, Err(AuthServiceError::NotFound)),
        "expected NotFound, got {result:?}"
    );
}
