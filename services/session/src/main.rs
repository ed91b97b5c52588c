use session_service::config::Config;
use session_service::http::{router, AppState};
use session_service::jwt::AccessTokenKeys;
use session_service::refresh::{RotationEngine, SessionIssuer};
use session_service::store::{PostgresStore, RevocationStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.log_json);
    info!("Starting session service");

    let store: Arc<dyn RevocationStore> =
        Arc::new(PostgresStore::connect(&config.database_url).await?);
    let keys = Arc::new(AccessTokenKeys::new(
        &config.jwt_secret,
        &config.jwt_issuer,
        config.access_token_ttl,
    ));

    let state = AppState {
        issuer: Arc::new(SessionIssuer::new(
            store.clone(),
            keys.clone(),
            config.refresh_token_ttl,
        )),
        rotator: Arc::new(RotationEngine::new(
            store,
            keys.clone(),
            config.refresh_token_ttl,
        )),
        keys,
        access_ttl_secs: config.access_token_ttl.as_secs(),
        refresh_ttl_secs: config.refresh_token_ttl.as_secs(),
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Session service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
