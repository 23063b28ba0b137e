use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use game_core::{WordList, WordSource};
use game_server::{
    config::Config, create_routes, game_manager::GameManager, keepalive::KeepAlive,
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Parola server...");

    let config = Config::from_env();

    let words: Arc<dyn WordSource> = match &config.words_file {
        Some(path) => match WordList::from_file(path) {
            Ok(words) => Arc::new(words),
            Err(e) => {
                error!("{:#}", e);
                error!("Set WORDS_FILE to a readable list of five-letter words, or unset it.");
                std::process::exit(1);
            }
        },
        None => {
            let words = WordList::italian();
            info!("Using bundled Italian word list ({} words)", words.len());
            Arc::new(words)
        }
    };

    let connection_manager = Arc::new(ConnectionManager::new());
    let game_manager = Arc::new(GameManager::new(
        connection_manager.clone(),
        words,
        config.default_room_settings(),
        config.reveal_delay(),
    ));

    let routes = create_routes(
        connection_manager.clone(),
        game_manager.clone(),
        config.environment.clone(),
        config.public_dir.clone(),
    );

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_game_manager = game_manager.clone();
    let connection_timeout = config.connection_timeout();
    let room_idle_timeout = config.room_idle_timeout();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            cleanup_game_manager
                .cleanup_idle_rooms(room_idle_timeout)
                .await;
        }
    });

    if let Some(url) = &config.keepalive_url {
        match KeepAlive::new(url, config.keepalive_interval()) {
            Ok(keepalive) => {
                tokio::spawn(keepalive.run());
            }
            Err(e) => error!("Keep-alive disabled: {}", e),
        }
    }

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            error!("Invalid HOST {:?}: {}", config.host, e);
            std::process::exit(1);
        }
    };

    info!(
        "Server starting on {}:{} ({})",
        config.host, config.port, config.environment
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), async {
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
                .expect("Failed to listen for SIGINT");
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to listen for SIGTERM");

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
