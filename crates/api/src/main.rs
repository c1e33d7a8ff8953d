use api::{build_app, init_domain_services};
use config::{ApiConfig, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A local .env file is optional
    dotenvy::dotenv().ok();

    // Load configuration first to get logging settings
    let config = ApiConfig::load_or_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    init_tracing(&config.logging);

    let domain_services = init_domain_services(&config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize services");
        e
    })?;

    let app = build_app(domain_services);

    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    tracing::info!(address = %bind_address, "Server started successfully");
    tracing::info!(
        assistant_configured = config.assistant.is_configured(),
        search_configured = config.search.api_key.is_some(),
        max_tool_rounds = config.assistant.max_tool_rounds,
        "Upstream configuration"
    );
    tracing::info!("API Endpoints:");
    tracing::info!("  - POST /api/chat (Streamed chat turn)");
    tracing::info!("  - GET /api/chat/{{thread_id}}/messages (Thread history)");
    tracing::info!("  - POST /api/search (Legal search)");
    tracing::info!("  - GET /health");
    tracing::info!("  - GET /docs (OpenAPI documentation)");

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(logging_config: &LoggingConfig) {
    let filter = logging_config.filter_directive();

    match logging_config.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .init();
        }
    }
}
