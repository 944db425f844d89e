use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};

use crate::api::{client_key, place_pixel, PlaceRequest};
use crate::error::AppError;
use crate::AppState;

/// WebSocket handler for live canvas updates
async fn ws_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    let client = client_key(peer);
    ws.on_upgrade(move |socket| handle_socket(socket, state, client))
}

async fn handle_socket(socket: WebSocket, state: AppState, client: String) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before anything else so no placement is missed
    let mut update_rx = state.canvas.subscribe();

    // Replies to this client only (rejections, parse errors)
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(16);

    // Spawn task to forward updates and replies to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            let text = tokio::select! {
                update = update_rx.recv() => match update {
                    Ok(update) => match serde_json::to_string(&update) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("Failed to encode update: {}", e);
                            continue;
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Live client lagging, dropped updates");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(text) => text,
                    None => break,
                },
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Handle placement commands from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let result = match serde_json::from_str::<PlaceRequest>(&text) {
                        Ok(req) => place_pixel(&state, &client, &req).await,
                        Err(e) => Err(AppError::BadRequest(e.to_string())),
                    };
                    // Accepted placements reach this client via the broadcast
                    if let Err(e) = result {
                        if reply_tx.send(e.body().to_string()).await.is_err() {
                            break;
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    tracing::debug!("Live connection closed");
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}
