pub mod health;
pub mod posts;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application router. Lives here so integration tests can
/// build the exact service `main` serves.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(posts::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
