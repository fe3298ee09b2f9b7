use std::net::SocketAddr;

use todo_service::auth::providers::OAuthProviders;
use todo_service::config::Config;
use todo_service::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_service=debug,tower_http=debug".into()),
        )
        .init();

    // Load config
    let config = Config::from_env()
        .map_err(|e| format!("Failed to load configuration (DATABASE_URL, JWT_SECRET): {e}"))?;

    // Connect to database
    let db = todo_service::db::pool::connect(&config.database_url).await?;
    tracing::info!("Connected to database");

    // Run migrations
    todo_service::db::migration::run(&db).await?;
    tracing::info!("Migrations applied");

    let oauth = OAuthProviders::from_config(&config);

    // Build app state
    let state = AppState::with_database(config.clone(), db, oauth).await?;
    tracing::info!(image_storage = ?config.image_storage, "Stores ready");

    // Build router
    let app = todo_service::routes::create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
