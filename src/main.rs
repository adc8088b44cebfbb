use expense_tracker_server::{
    AppState, build_app,
    config::{Config, LogFormat},
    constants::DEFAULT_LOG_FILTER,
    database,
    sessions::cleanup_expired_sessions,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init(),
        LogFormat::Plain => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let db = database::init_db(&config.data_path).await?;
    if config.seed_demo_data && database::seed_demo_data(&db).await? {
        tracing::info!("demo data inserted");
    }
    cleanup_expired_sessions(&db).await?;

    let state = AppState {
        db,
        session_expiry_hours: config.session_expiry_hours,
    };
    let app = build_app(state, &config.session_secret)?;

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!(data_path = %config.data_path, "server running on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
