use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use game_relay::auth::HeaderIdentityResolver;
use game_relay::config::ServerConfig;
use game_relay::constants::WS_PATH;
use game_relay::core::{MessageHandler, ServerManager};
use game_relay::handlers::{routes, RelayState};
use game_relay::storage::MemoryStorage;

#[tokio::main]
async fn main() {
    // Initialize env
    let dotenv_result = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv_result {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("No .env file loaded: {}", e),
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, heartbeat={}s",
        config.host,
        config.port,
        config.heartbeat_interval.as_secs()
    );

    let storage = if config.guest_profiles {
        MemoryStorage::with_guest_profiles()
    } else {
        MemoryStorage::new()
    };

    if let Some(ref path) = config.fixtures_path {
        match storage.load_fixtures_file(path).await {
            Ok(count) => info!("Loaded {} fixture records from {}", count, path),
            Err(e) => {
                error!("Failed to load fixtures from {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }

    let server = Arc::new(ServerManager::with_memory_storage(Arc::new(storage)));
    server.clone().start_heartbeat_task(config.heartbeat_interval);

    let identity = HeaderIdentityResolver::new(config.identity_header.clone());
    info!("Reading player identity from the {} header", identity.header());

    let state = RelayState {
        server: server.clone(),
        handler: Arc::new(MessageHandler::with_max_frame_bytes(
            server,
            config.max_frame_bytes,
        )),
        identity: Arc::new(identity),
    };

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting game relay on {} (ws path /{})", addr, WS_PATH);

    warp::serve(routes(state)).run(addr).await;
}
