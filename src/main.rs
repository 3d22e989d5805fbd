use std::net::TcpListener;
use trading_gateway::configuration::get_configuration;
use trading_gateway::startup::{build_profile_store, build_session_service, run};
use trading_gateway::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting gateway");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let sessions = build_profile_store(&configuration.profile)
        .and_then(|profiles| build_session_service(&configuration, profiles))
        .map_err(|e| {
            tracing::error!("Failed to initialise session service: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Startup error")
        })?;

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, sessions)?.await
}
