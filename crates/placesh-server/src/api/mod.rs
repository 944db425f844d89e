mod canvas;
mod health;

use axum::Router;

use crate::AppState;

pub use canvas::{client_key, place_pixel, PlaceRequest, MAX_WINDOW_EXTENT};

/// Create the API router
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(canvas::router())
}
