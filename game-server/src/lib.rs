use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use warp::Filter;

use crate::game_manager::{GameManager, ServerStats};
use crate::websocket::ConnectionManager;

pub mod config;
pub mod game_manager;
pub mod keepalive;
pub mod websocket;

pub const SERVICE_NAME: &str = "parola";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    environment: String,
    timestamp: String,
}

#[derive(Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    stats: ServerStats,
    environment: String,
    timestamp: String,
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    game_manager: Arc<GameManager>,
    environment: String,
    public_dir: PathBuf,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let game_manager_filter = warp::any().map({
        let game_manager = game_manager.clone();
        move || game_manager.clone()
    });

    let environment_filter = warp::any().map(move || environment.clone());

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::path::end())
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(game_manager_filter.clone())
        .map(|ws: warp::ws::Ws, conn_mgr, game_mgr| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, game_mgr))
        });

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(environment_filter.clone())
        .map(|environment: String| {
            warp::reply::json(&HealthResponse {
                status: "healthy",
                service: SERVICE_NAME,
                environment,
                timestamp: Utc::now().to_rfc3339(),
            })
        });

    let stats = warp::path!("api" / "stats")
        .and(warp::get())
        .and(game_manager_filter)
        .and(environment_filter)
        .and_then(handle_stats_request);

    // Static client, with index.html for any other GET
    let index = public_dir.join("index.html");
    let static_files = warp::get()
        .and(warp::fs::dir(public_dir))
        .or(warp::get().and(warp::fs::file(index)));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(stats)
        .or(static_files)
        .with(cors)
        .with(warp::log(SERVICE_NAME))
}

async fn handle_stats_request(
    game_manager: Arc<GameManager>,
    environment: String,
) -> Result<impl warp::Reply, warp::Rejection> {
    let stats = game_manager.stats().await;
    Ok(warp::reply::json(&StatsResponse {
        stats,
        environment,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
