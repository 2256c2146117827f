// src/routes.rs

use axum::{
    Router, http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{question, question_set};
use crate::state::AppState;

/// Assembles the main application router.
///
/// * Merges the question and question-set sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let question_routes = Router::new()
        .route("/", post(question::create_question))
        .route(
            "/{id}",
            get(question::get_question)
                .put(question::update_question)
                .delete(question::archive_question),
        );

    let set_routes = Router::new()
        .route("/", post(question_set::create_set))
        .route("/{id}", get(question_set::get_set))
        .route("/{id}/reorder", post(question_set::reorder_set));

    Router::new()
        .nest("/api/questions", question_routes)
        .nest("/api/question-sets", set_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
