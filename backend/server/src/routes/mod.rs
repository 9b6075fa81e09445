use axum::response::Response;

use crate::utils::ok;

pub mod bookings;
pub mod dashboard;
pub mod kos;
pub mod reviews;
pub mod users;

pub async fn health_handler() -> Response {
    ok("ok")
}
