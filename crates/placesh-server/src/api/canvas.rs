use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Query, State},
    routing::{get, post},
    Json, Router,
};
use placesh_core::{parse_hex, Pixel, Placement, WorldCoord};
use serde::{Deserialize, Serialize};

use crate::canvas::PixelUpdate;
use crate::error::AppError;
use crate::AppState;

/// Largest width or height a single window request may ask for
pub const MAX_WINDOW_EXTENT: usize = 512;

/// Query for a window read
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CursorCell {
    pub col: usize,
    pub row: usize,
}

/// A rendered window, rows top to bottom
#[derive(Debug, Serialize, Deserialize)]
pub struct WindowResponse {
    pub left: i64,
    pub top: i64,
    pub width: usize,
    pub height: usize,
    pub cursor: CursorCell,
    pub rows: Vec<Vec<Pixel>>,
}

#[derive(Debug, Deserialize)]
pub struct PixelQuery {
    pub x: i32,
    pub y: i32,
}

/// Request to place a pixel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRequest {
    /// Display name, logged only. The cooldown follows the connection.
    #[serde(default)]
    pub user: Option<String>,
    pub x: i32,
    pub y: i32,
    /// `#RRGGBB` color, reduced to the palette on placement
    pub color: String,
}

/// Rate limiting identity of a peer: its IP address, whatever port or name it
/// uses.
pub fn client_key(peer: SocketAddr) -> String {
    peer.ip().to_string()
}

/// Validate and apply a placement request from `client`.
///
/// The color is parsed before the canvas is touched, so invalid input never
/// mutates anything.
pub async fn place_pixel(
    state: &AppState,
    client: &str,
    req: &PlaceRequest,
) -> Result<PixelUpdate, AppError> {
    let pixel = parse_hex(&req.color)?.to_ansi256();
    let world = WorldCoord::new(req.x, req.y);

    tracing::debug!(
        client,
        name = req.user.as_deref(),
        x = req.x,
        y = req.y,
        "placement requested"
    );
    match state.canvas.place(client, world, pixel, Instant::now()).await? {
        Placement::Allowed => Ok(PixelUpdate {
            x: req.x,
            y: req.y,
            pixel,
        }),
        Placement::Rejected { remaining } => Err(AppError::RateLimited { remaining }),
    }
}

/// Read a window of the canvas centered on (x, y)
async fn get_window(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<WindowResponse>, AppError> {
    if query.width > MAX_WINDOW_EXTENT || query.height > MAX_WINDOW_EXTENT {
        return Err(AppError::BadRequest(format!(
            "window extents are limited to {}x{}",
            MAX_WINDOW_EXTENT, MAX_WINDOW_EXTENT
        )));
    }

    let window = state
        .canvas
        .window(WorldCoord::new(query.x, query.y), query.width, query.height)
        .await?;
    let bounds = window.bounds();
    let (col, row) = bounds.cursor();

    Ok(Json(WindowResponse {
        left: bounds.left,
        top: bounds.top,
        width: bounds.width,
        height: bounds.height,
        cursor: CursorCell { col, row },
        rows: window.into_rows(),
    }))
}

/// Read a single pixel
async fn get_pixel(
    State(state): State<AppState>,
    Query(query): Query<PixelQuery>,
) -> Json<PixelUpdate> {
    let pixel = state.canvas.pixel(WorldCoord::new(query.x, query.y)).await;
    Json(PixelUpdate {
        x: query.x,
        y: query.y,
        pixel,
    })
}

/// Place a pixel
async fn post_pixel(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(req): Json<PlaceRequest>,
) -> Result<Json<PixelUpdate>, AppError> {
    let update = place_pixel(&state, &client_key(peer), &req).await?;
    Ok(Json(update))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/canvas/window", get(get_window))
        .route("/api/canvas/pixel", get(get_pixel))
        .route("/api/canvas/pixels", post(post_pixel))
}
