use chrono::{Duration, Utc};

use lattice_auth::error::AuthServiceError;
use lattice_auth::usecase::session::{
    RefreshTokenUseCase, RevokeSessionUseCase, issue_access_token, mint_session,
};
use lattice_auth_types::cookie::REFRESH_TOKEN_EXP;
use lattice_auth_types::token::{TokenType, validate_access_token, validate_token};

use crate::helpers::{MockSessionRepo, MockUserRepo, test_secrets, test_user};

// ── mint_session ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_mint_pair_sharing_one_session_id() {
    let sessions = MockSessionRepo::empty();
    let handle = sessions.handle();
    let user = test_user();

    let pair = mint_session(&sessions, &user, &test_secrets()).await.unwrap();

    let access = validate_token(
        &pair.access_token,
        &test_secrets().access,
        TokenType::Access,
    )
    .unwrap();
    assert_eq!(access.user_id, user.id.to_string());
    assert_eq!(access.email.as_deref(), Some("user@example.com"));
    assert_eq!(access.session_id, pair.session_id.to_string());

    let refresh = validate_token(
        &pair.refresh_token,
        &test_secrets().refresh,
        TokenType::Refresh,
    )
    .unwrap();
    assert_eq!(refresh.session_id, pair.session_id.to_string());
    // Email rides on access tokens only.
    assert!(refresh.email.is_none());

    let stored = handle.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, pair.session_id);
    assert_eq!(stored[0].refresh_token, pair.refresh_token);
    assert!(!stored[0].revoked);
    let expected_expiry = Utc::now() + Duration::seconds(REFRESH_TOKEN_EXP as i64);
    assert!((stored[0].expires_at - expected_expiry).num_seconds().abs() < 5);
}

#[tokio::test]
async fn access_token_should_not_validate_as_refresh_and_vice_versa() {
    let sessions = MockSessionRepo::empty();
    let pair = mint_session(&sessions, &test_user(), &test_secrets())
        .await
        .unwrap();

    // Wrong-type failures surface before any signature check.
    let err = validate_access_token(&pair.refresh_token, &test_secrets().access).unwrap_err();
    assert!(matches!(
        err,
        lattice_auth_types::token::AuthError::WrongTokenType
    ));

    let err = validate_token(
        &pair.access_token,
        &test_secrets().refresh,
        TokenType::Refresh,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        lattice_auth_types::token::AuthError::WrongTokenType
    ));
}

// ── RefreshTokenUseCase ──────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_should_issue_new_access_token_only() {
    let sessions = MockSessionRepo::empty();
    let user = test_user();
    let pair = mint_session(&sessions, &user, &test_secrets()).await.unwrap();

    let usecase = RefreshTokenUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
        sessions,
        secrets: test_secrets(),
    };
    let out = usecase.execute(&pair.refresh_token).await.unwrap();

    assert_eq!(out.user_id, user.id);
    let claims = validate_token(&out.access_token, &test_secrets().access, TokenType::Access)
        .unwrap();
    // Same session id is reused; the refresh token is not rotated.
    assert_eq!(claims.session_id, pair.session_id.to_string());
}

#[tokio::test]
async fn refresh_with_access_token_should_fail_with_type_error() {
    let sessions = MockSessionRepo::empty();
    let user = test_user();
    let pair = mint_session(&sessions, &user, &test_secrets()).await.unwrap();

    let usecase = RefreshTokenUseCase {
        users: MockUserRepo::new(vec![user]),
        sessions,
        secrets: test_secrets(),
    };
    let result = usecase.execute(&pair.access_token).await;
    assert!(
        matches!(result, Err(AuthServiceError::WrongTokenType)),
        "expected WrongTokenType, got {result:?}"
    );
}

#[tokio::test]
async fn refresh_with_garbage_should_fail_as_malformed() {
    let usecase = RefreshTokenUseCase {
        users: MockUserRepo::empty(),
        sessions: MockSessionRepo::empty(),
        secrets: test_secrets(),
    };
    let result = usecase.execute("not-a-jwt").await;
    assert!(
        matches!(result, Err(AuthServiceError::MalformedToken)),
        "expected MalformedToken, got {result:?}"
    );
}

#[tokio::test]
async fn refresh_of_revoked_session_should_fail_distinctly() {
    let sessions = MockSessionRepo::empty();
    let user = test_user();
    let pair = mint_session(&sessions, &user, &test_secrets()).await.unwrap();

    let revoke = RevokeSessionUseCase {
        sessions: sessions.clone(),
    };
    revoke.execute(pair.session_id).await.unwrap();

    let usecase = RefreshTokenUseCase {
        users: MockUserRepo::new(vec![user]),
        sessions,
        secrets: test_secrets(),
    };
    let result = usecase.execute(&pair.refresh_token).await;
    assert!(
        matches!(result, Err(AuthServiceError::SessionRevoked)),
        "expected SessionRevoked, got {result:?}"
    );
}

#[tokio::test]
async fn refresh_past_database_expiry_should_fail_even_with_valid_jwt() {
    let sessions = MockSessionRepo::empty();
    let handle = sessions.handle();
    let user = test_user();
    let pair = mint_session(&sessions, &user, &test_secrets()).await.unwrap();

    // Session row expires independently of the JWT's own exp.
    handle.lock().unwrap()[0].expires_at = Utc::now() - Duration::seconds(1);

    let usecase = RefreshTokenUseCase {
        users: MockUserRepo::new(vec![user]),
        sessions,
        secrets: test_secrets(),
    };
    let result = usecase.execute(&pair.refresh_token).await;
    assert!(
        matches!(result, Err(AuthServiceError::SessionExpired)),
        "expected SessionExpired, got {result:?}"
    );
}

#[tokio::test]
async fn refresh_with_unknown_session_should_fail_as_not_found() {
    let user = test_user();
    let session_id = uuid::Uuid::new_v4();
    let (refresh_token, _) = {
        // A structurally valid refresh JWT whose session row never existed.
        let token = lattice_auth::usecase::session::issue_refresh_token(
            user.id,
            session_id,
            &test_secrets().refresh,
        )
        .unwrap();
        (token, session_id)
    };

    let usecase = RefreshTokenUseCase {
        users: MockUserRepo::new(vec![user]),
        sessions: MockSessionRepo::empty(),
        secrets: test_secrets(),
    };
    let result = usecase.execute(&refresh_token).await;
    assert!(
        matches!(result, Err(AuthServiceError::NotFound)),
        "expected NotFound, got {result:?}"
    );
}

#[tokio::test]
async fn refresh_with_mismatched_stored_token_should_fail_as_not_found() {
    let sessions = MockSessionRepo::empty();
    let handle = sessions.handle();
    let user = test_user();
    let pair = mint_session(&sessions, &user, &test_secrets()).await.unwrap();

    handle.lock().unwrap()[0].refresh_token = "rotated-elsewhere".to_owned();

    let usecase = RefreshTokenUseCase {
        users: MockUserRepo::new(vec![user]),
        sessions,
        secrets: test_secrets(),
    };
    let result = usecase.execute(&pair.refresh_token).await;
    assert!(
        matches!(result, Err(AuthServiceError::NotFound)),
        "expected NotFound, got {result:?}"
    );
}

#[tokio::test]
async fn refresh_should_stamp_last_activity() {
    let sessions = MockSessionRepo::empty();
    let handle = sessions.handle();
    let user = test_user();
    let pair = mint_session(&sessions, &user, &test_secrets()).await.unwrap();
    let initial_activity = handle.lock().unwrap()[0].last_activity_at;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let usecase = RefreshTokenUseCase {
        users: MockUserRepo::new(vec![user]),
        sessions,
        secrets: test_secrets(),
    };
    usecase.execute(&pair.refresh_token).await.unwrap();

    assert!(handle.lock().unwrap()[0].last_activity_at > initial_activity);
}

// ── RevokeSessionUseCase ─────────────────────────────────────────────────────

#[tokio::test]
async fn revocation_should_be_terminal() {
    let sessions = MockSessionRepo::empty();
    let handle = sessions.handle();
    let user = test_user();
    let pair = mint_session(&sessions, &user, &test_secrets()).await.unwrap();

    let usecase = RevokeSessionUseCase {
        sessions: sessions.clone(),
    };
    usecase.execute(pair.session_id).await.unwrap();

    {
        let stored = handle.lock().unwrap();
        assert!(stored[0].revoked);
        assert!(stored[0].revoked_at.is_some());
    }

    // A second revoke finds no live session.
    let result = usecase.execute(pair.session_id).await;
    assert!(
        matches!(result, Err(AuthServiceError::NotFound)),
        "expected NotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_revoke_by_refresh_token_string() {
    let sessions = MockSessionRepo::empty();
    let handle = sessions.handle();
    let user = test_user();
    let pair = mint_session(&sessions, &user, &test_secrets()).await.unwrap();

    let usecase = RevokeSessionUseCase { sessions };
    usecase
        .execute_by_refresh_token(&pair.refresh_token)
        .await
        .unwrap();
    assert!(handle.lock().unwrap()[0].revoked);

    let result = usecase.execute_by_refresh_token("unknown-token").await;
    assert!(
        matches!(result, Err(AuthServiceError::NotFound)),
        "expected NotFound, got {result:?}"
    );
}

// ── issue_access_token ───────────────────────────────────────────────────────

#[tokio::test]
async fn issued_access_token_should_round_trip_claims() {
    let user = test_user();
    let session_id = uuid::Uuid::new_v4();
    let (token, exp) = issue_access_token(
        user.id,
        user.email.as_deref(),
        session_id,
        &test_secrets().access,
    )
    .unwrap();

    let info = validate_access_token(&token, &test_secrets().access).unwrap();
    assert_eq!(info.user_id, user.id);
    assert_eq!(info.email, user.email);
    assert_eq!(info.session_id, session_id);
    assert_eq!(info.exp, exp);
}
