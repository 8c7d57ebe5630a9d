use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/articles/:id/comments",
            get(handlers::list_comments).post(handlers::post_comment),
        )
        .route(
            "/api/comments/:id",
            patch(handlers::update_comment).delete(handlers::delete_comment),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
