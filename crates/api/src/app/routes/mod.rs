use axum::Router;

pub mod orders;
pub mod shifts;
pub mod system;

/// Router for all tenant-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/cash-shifts", shifts::router())
        .nest("/orders", orders::router())
}
