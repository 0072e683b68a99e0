//! Binary entry point: wires the store, the service, and the router,
//! then serves until SIGINT or SIGTERM.

use std::sync::Arc;

use infrastructure::{DynamoTaskRepository, InMemoryTaskRepository, TaskRepository};
use task_api::config::{Config, StorageKind};
use task_api::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let repository: Arc<dyn TaskRepository> = match config.storage {
        StorageKind::Memory => Arc::new(InMemoryTaskRepository::new()),
        StorageKind::DynamoDb => Arc::new(
            DynamoTaskRepository::connect(&config.table_name, config.dynamodb_endpoint.as_deref())
                .await,
        ),
    };

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    tracing::info!(%addr, storage = ?config.storage, "server starting");

    let router = app(AppState::new(repository));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
