pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // API routes
        .nest("/api", api_routes())

        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/payments", payment_routes())
        .nest("/checkout", checkout_routes())
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/dashboard", get(handlers::balance::dashboard))
        .route("/:id/balance", get(handlers::balance::statement))
        .route("/:id/payments", get(handlers::payments::list_for_user))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(handlers::payments::get))
        .route("/:id/submit-proof", post(handlers::payments::submit_proof))
        .route("/:id/confirm-cash", post(handlers::payments::confirm_cash))
        .route("/:id/approve", post(handlers::payments::approve))
        .route("/:id/reject", post(handlers::payments::reject))
}

fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(handlers::checkout::book_service))
        .route("/bookings/:id/cancel", post(handlers::checkout::cancel_booking))
        .route("/appointments", post(handlers::checkout::book_appointment))
        .route(
            "/appointments/:id/cancel",
            post(handlers::checkout::cancel_appointment),
        )
        .route("/pharmacy-orders", post(handlers::checkout::order_medicine))
        .route(
            "/pharmacy-orders/:id/cancel",
            post(handlers::checkout::cancel_order),
        )
        .route(
            "/equipment-purchases",
            post(handlers::checkout::purchase_equipment),
        )
        .route(
            "/equipment-purchases/:id/cancel",
            post(handlers::checkout::cancel_purchase),
        )
        .route(
            "/equipment-rentals",
            post(handlers::checkout::rent_equipment),
        )
        .route(
            "/equipment-rentals/:id/cancel",
            post(handlers::checkout::cancel_rental),
        )
}
