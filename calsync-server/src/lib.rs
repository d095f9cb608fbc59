//! calsync-server - HTTP relay between Outlook calendars and Zoho CRM

pub mod convert;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::status::router())
        .merge(routes::sync::router())
        .merge(routes::meetings::router())
        .merge(routes::interactions::router())
        .merge(routes::tasks::router())
        .merge(routes::records::router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
