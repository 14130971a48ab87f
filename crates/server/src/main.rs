use std::path::PathBuf;

use dsicola_api::deploy;
use dsicola_server::{AppConfig, AppState, build_router, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dsicola_server=info,tower_http=info".into()),
        )
        .init();

    let data_dir = std::env::var(deploy::ENV_DATA_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"));

    tracing::info!("data directory: {}", data_dir.display());

    let db = storage::init_db(&data_dir)?;
    tracing::info!("database initialized");

    let config = AppConfig::from_env();

    let admin_email = std::env::var(deploy::ENV_SUPERADMIN_EMAIL).ok();
    let admin_password = std::env::var(deploy::ENV_SUPERADMIN_PASSWORD).ok();
    match (admin_email, admin_password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            storage::bootstrap_super_admin(&db, &email, &password, config.pbkdf2_iterations)?;
        }
        _ => tracing::info!("super admin bootstrap skipped (credentials not set)"),
    }

    let base_url = config.base_url.clone();
    let app = build_router(AppState { db, config });

    tracing::info!("starting server at {base_url}");

    let port = std::env::var(deploy::ENV_PORT).unwrap_or_else(|_| "3000".into());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
