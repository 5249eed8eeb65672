mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod routes;
mod services;
mod websocket;
mod ws;

use config::Config;
use db::notes::{MemoryNoteStore, NoteStore, PgNoteStore};
use routes::create_router;
use services::persistence::PersistenceBridge;
use std::panic;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use ws::SessionGateway;

/// Shared state handed to every HTTP and websocket handler
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<SessionGateway>,
    pub persistence: Arc<PersistenceBridge>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "colab_notes=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    if config.is_development() {
        info!("Running in development mode");
    }

    // Pick the note store behind the persistence bridge
    let store: Arc<dyn NoteStore> = match &config.db_url {
        Some(db_url) => match PgNoteStore::connect(db_url).await {
            Ok(store) => {
                info!("Database initialized successfully");
                Arc::new(store)
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                warn!("Notes will only be kept in memory");
                Arc::new(MemoryNoteStore::new())
            }
        },
        None => {
            warn!("No database URL configured - notes will only be kept in memory");
            Arc::new(MemoryNoteStore::new())
        }
    };

    let persistence = Arc::new(PersistenceBridge::new(
        store,
        config.note_cache_capacity,
        config.note_cache_idle(),
    ));
    let address = config.server_address();
    let app_state = Arc::new(AppState {
        config,
        gateway: Arc::new(SessionGateway::new()),
        persistence,
    });

    let app_routes = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSocket available at ws://{}/ws", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    if let Err(e) = axum::serve(listener, app_routes).await {
        error!("Server error: {}", e);
    }
}
