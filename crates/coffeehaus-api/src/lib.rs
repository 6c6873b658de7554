//! HTTP surface of the Coffeehaus user-service: identity, profiles, the feed
//! and shop search.

pub mod auth;
pub mod error;
pub mod feed;
pub mod middleware;
pub mod search;
pub mod state;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

pub use error::{ApiError, ApiResult};
pub use state::{AppState, AppStateInner};

/// All routes, without the transport layers (CORS, tracing) the server adds.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(feed::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/user", get(users::get_user).post(users::create_profile))
        .route("/user/{username}", put(users::update_profile))
        .route("/users/{username}", get(users::get_profile))
        .route("/usernames/{username}", get(users::username_exists))
        .route("/feed", get(feed::get_feed))
        .route("/search", get(search::search))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
