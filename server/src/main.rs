use std::sync::Arc;

use arena_server::api;
use arena_server::config::ServerConfig;
use arena_server::directory::RoomDirectory;
use arena_server::map::WorldMap;
use arena_server::ws::AppState;
use axum::http::HeaderValue;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::default();

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let mut rng = match config.map_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let map = WorldMap::generate(&config.game, &mut rng);
    tracing::info!(
        "Generated {}x{} map with {} obstacles and {} grass patches",
        map.width(),
        map.height(),
        map.obstacles().len(),
        map.grass_patches().len()
    );

    let directory = RoomDirectory::new(Arc::new(config.game.clone()), Arc::new(map));
    let app_state = AppState {
        directory,
        outbound_queue_capacity: config.outbound_queue_capacity,
    };

    let cors = if config.allowed_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    };
    let app = api::router(app_state).layer(cors);

    let listen_addr = config.listen_addr.clone();
    tracing::info!("Starting arena server on {}", listen_addr);
    println!("Arena server listening on {}", listen_addr);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
