use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use warp::ws::WebSocket;

use super::RelayState;

// Handle a WebSocket connection for an already identified player
pub async fn handle_ws_client(ws: WebSocket, display_name: String, state: RelayState) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Forward queued frames to the socket; when this task ends the channel
    // closes and further sends to this connection fail
    tokio::task::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_tx.send(message).await {
                debug!("Failed to write WebSocket frame: {}", e);
                break;
            }
        }
    });

    let connection = state.server.open_connection(display_name, tx).await;

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(msg) => {
                if msg.is_close() {
                    break;
                }
                // Only text frames carry commands
                let text = match msg.to_str() {
                    Ok(text) => text,
                    Err(_) => continue,
                };
                if let Err(e) = state
                    .handler
                    .handle_client_message(&connection.id, text)
                    .await
                {
                    if e.is_protocol_error() {
                        debug!("Dropped frame from {}: {}", connection.name, e);
                    } else {
                        warn!("Command from {} failed: {}", connection.name, e);
                    }
                }
            }
            Err(e) => {
                error!("WebSocket error for {}: {}", connection.name, e);
                break;
            }
        }
    }

    info!("Connection closed by {}", connection.name);
    state.server.close_connection(&connection.id).await;
}
