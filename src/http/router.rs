//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (request tracing, metrics) and returns
//! an axum router ready for serving.

use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;
use crate::observability;

/// Create the main application router. `testing` mounts the
/// `/api/testing/*` reset routes.
pub fn create_router(state: AppState, testing: bool) -> Router {
    let mut api = Router::new()
        .route("/reservations", post(handlers::create_reservation))
        // One path segment, two meanings: GET takes a room id, DELETE a reservation id.
        .route(
            "/reservations/{id}",
            get(handlers::list_reservations).delete(handlers::cancel_reservation),
        )
        .route("/rooms", get(handlers::list_rooms).post(handlers::create_room))
        .route("/rooms/{id}", put(handlers::update_room).delete(handlers::delete_room))
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route("/users/{id}", delete(handlers::delete_user))
        .route("/login", post(handlers::login));

    if testing {
        api = api.nest("/testing", testing_routes());
    }

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .fallback(handlers::unknown_endpoint)
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn testing_routes() -> Router<AppState> {
    Router::new()
        .route("/resetAll", post(handlers::reset_all))
        .route("/resetReservations", post(handlers::reset_reservations))
        .route("/resetRooms", post(handlers::reset_rooms))
        .route("/resetUsers", post(handlers::reset_users))
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let started = Instant::now();
    let response = next.run(request).await;

    let status = observability::status_label(response.status().as_u16());
    metrics::counter!(
        observability::HTTP_REQUESTS_TOTAL,
        "method" => method.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(observability::HTTP_REQUEST_DURATION_SECONDS, "method" => method)
        .record(started.elapsed().as_secs_f64());
    response
}
