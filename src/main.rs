use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use greengpt_backend::api;
use greengpt_backend::config::Config;
use greengpt_backend::db::Database;
use greengpt_backend::llm::GenerationClient;
use greengpt_backend::metrics;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();
    metrics::register_metrics();

    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");
    let db = Arc::new(db);

    let generator = GenerationClient::from_config(&config).map(Arc::new);
    if generator.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; serving fallback questions only");
    }

    let mut app = api::router(db, generator).layer(CorsLayer::permissive());

    if let Some(dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Green GPT backend listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
