use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use lattice_core::config::Config as _;
use lattice_core::tracing::init_tracing;

use lattice_auth::config::AuthConfig;
use lattice_auth::infra::notify::HttpNotifier;
use lattice_auth::infra::oauth::{HttpOAuthProvider, OAuthClientConfig};
use lattice_auth::ratelimit::{InMemoryRateLimitStore, RateLimiter, spawn_sweeper};
use lattice_auth::router::build_router;
use lattice_auth::state::AppState;
use lattice_auth::usecase::pat::{last_used_channel, spawn_expiry_sweeper, spawn_last_used_worker};
use lattice_auth::usecase::session::JwtSecrets;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let rate_limiter = Arc::new(RateLimiter::new(InMemoryRateLimitStore::new()));
    spawn_sweeper(Arc::clone(&rate_limiter));

    let state = AppState {
        db: db.clone(),
        secrets: JwtSecrets {
            access: config.jwt_access_secret,
            refresh: config.jwt_refresh_secret,
        },
        cookie_domain: config.cookie_domain,
        siwe_domain: config.siwe_domain,
        siwe_uri: config.siwe_uri,
        token_prefix: config.token_prefix,
        token_environment: config.token_environment,
        rate_limiter,
        notifier: HttpNotifier::new(config.notify_url),
        oauth: HttpOAuthProvider::new(OAuthClientConfig {
            github_client_id: config.oauth_github_client_id,
            github_client_secret: config.oauth_github_client_secret,
            google_client_id: config.oauth_google_client_id,
            google_client_secret: config.oauth_google_client_secret,
        }),
        pat_last_used: {
            let (tx, rx) = last_used_channel();
            spawn_last_used_worker(
                lattice_auth::infra::db::DbPersonalAccessTokenRepository { db: db.clone() },
                rx,
            );
            tx
        },
    };

    spawn_expiry_sweeper(state.pat_repo());

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
