//! Binary entrypoint for the rmirec recording server.
//!
//! Reads configuration from environment variables:
//! - `RMIREC_DB_PATH`: SQLite artifact database path (default: "rmirec.db")
//! - `RMIREC_PORT`: Server listen port (default: "3000")
//! - `RMIREC_OPTIONS`: Optional JSON file with recorder options

use rmirec_codegen::RecorderOptions;
use rmirec_server::router::build_router;
use rmirec_server::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let db_path = std::env::var("RMIREC_DB_PATH").unwrap_or_else(|_| "rmirec.db".to_string());
    let port = std::env::var("RMIREC_PORT").unwrap_or_else(|_| "3000".to_string());
    let options = match std::env::var("RMIREC_OPTIONS") {
        Ok(path) => load_options(&path),
        Err(_) => RecorderOptions::default(),
    };

    let state = AppState::new(&db_path, options).expect("Failed to initialize application state");

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("rmirec server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn load_options(path: &str) -> RecorderOptions {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read recorder options '{}': {}", path, e));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("Invalid recorder options '{}': {}", path, e))
}
