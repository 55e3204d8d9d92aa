mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::item::PgItemStore;
use services::media::{FsMediaStore, MediaConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let db_config = db::DbConfig::from_env().expect("DATABASE_URL required");
    let pool = db::init_pool(&db_config).await.expect("database init failed");

    let media_config = MediaConfig::from_env(port);
    tracing::info!(root = %media_config.root.display(), ttl_secs = media_config.ttl_secs, "media store configured");

    let items = Arc::new(PgItemStore::new(pool.clone()));
    let media = Arc::new(FsMediaStore::new(media_config));
    let state = state::AppState::new(pool, items, media);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "bucketlist listening");
    axum::serve(listener, app).await.expect("server failed");
}
