//! Request handlers for the relay's HTTP surface

pub mod websocket;

use std::convert::Infallible;
use std::sync::Arc;

use log::warn;
use warp::http::{HeaderMap, StatusCode};
use warp::{Filter, Rejection, Reply};

use crate::auth::IdentityResolver;
use crate::constants::{HEALTH_PATH, WS_PATH};
use crate::core::message_handler::MessageHandler;
use crate::core::server::SharedServerManager;

// Re-export the websocket handler
pub use websocket::handle_ws_client;

/// Everything a connection handler needs
#[derive(Clone)]
pub struct RelayState {
    pub server: SharedServerManager,
    pub handler: Arc<MessageHandler>,
    pub identity: Arc<dyn IdentityResolver>,
}

/// `/game` websocket endpoint and `/health`
pub fn routes(
    state: RelayState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let ws_route = warp::path(WS_PATH)
        .and(warp::path::end())
        .and(warp::ws())
        .and(warp::header::headers_cloned())
        .and(with_state(state))
        .map(
            |ws: warp::ws::Ws, headers: HeaderMap, state: RelayState| -> Box<dyn Reply> {
                match state.identity.resolve(&headers) {
                    Ok(name) => Box::new(
                        ws.on_upgrade(move |socket| handle_ws_client(socket, name, state)),
                    ),
                    Err(e) => {
                        warn!("Rejected WebSocket upgrade: {}", e);
                        Box::new(warp::reply::with_status(
                            e.to_string(),
                            StatusCode::UNAUTHORIZED,
                        ))
                    }
                }
            },
        );

    let health_route = warp::path(HEALTH_PATH).and(warp::path::end()).map(|| "OK");

    ws_route.or(health_route)
}

// Helper function to include relay state in request
fn with_state(state: RelayState) -> impl Filter<Extract = (RelayState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
