//! Example consumer: serves blueprint resolution over HTTP.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Config directory comes from `BLUEPRINTS_CONFIG` (default `config`), holding
//! `routes.json` and optionally `blueprints.json`.

use blueprint_sdk::{apply_env_overrides, blueprint_routes, common_routes, load_from_dir, resolve, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("blueprint_sdk=info")),
        )
        .init();

    let config_dir = std::env::var("BLUEPRINTS_CONFIG").unwrap_or_else(|_| "config".into());
    let mut config = load_from_dir(&config_dir)?;
    apply_env_overrides(&mut config.blueprints)?;
    let model = resolve(&config)?;
    let state = AppState::in_memory(model);

    let app = common_routes().merge(blueprint_routes(state));
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
