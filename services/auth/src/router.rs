use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use lattice_core::health::{healthz, readyz};
use lattice_core::middleware::request_id_layer;

use crate::handlers::{
    code::{check_code, request_code, verify_code},
    oauth::oauth_login,
    pat::{create_pat, delete_pat, list_pats, validate_pat},
    siwe::{create_challenge, verify_challenge},
    token::{check_token, refresh_token, revoke_token},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Verification codes
        .route("/auth/code", post(request_code))
        .route("/auth/code/verify", post(verify_code))
        .route("/auth/code/check", post(check_code))
        // SIWE
        .route("/auth/siwe/challenge", post(create_challenge))
        .route("/auth/siwe/verify", post(verify_challenge))
        // Delegated OAuth
        .route("/auth/oauth", post(oauth_login))
        // Session tokens
        .route("/auth/token", get(check_token))
        .route("/auth/token", patch(refresh_token))
        .route("/auth/token", delete(revoke_token))
        // Personal access tokens
        .route("/auth/pats", post(create_pat))
        .route("/auth/pats", get(list_pats))
        .route("/auth/pats/{token_id}", delete(delete_pat))
        .route("/auth/pat/validate", post(validate_pat))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
