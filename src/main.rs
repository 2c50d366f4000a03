/// Server Entry Point
///
/// Reads the server configuration from the environment (see `ServerConfig`),
/// loads the tool configuration file, registers the tools and starts the
/// selected transport. Logs are written to stderr; with the STDIO transport,
/// stdout carries nothing but response lines.

use tracing_subscriber::EnvFilter;

use tool_rpc::core::dispatcher::AppState;
use tool_rpc::core::error::ServerError;
use tool_rpc::core::server;
use tool_rpc::core::utils::{self, ServerConfig, TransportMode};
use tool_rpc::tools;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let tool_config = utils::load_config(&config.config_path)?;
    let registry = tools::initialize_tools(&tool_config);
    let state = AppState {
        server_name: config.name.clone(),
        server_version: config.version.clone(),
    };

    match config.transport {
        TransportMode::Stdio => server::run_server_stdio(registry, state).await,
        TransportMode::Http => {
            server::run_server_http(registry, state, &config.host, config.port, config.workers).await
        }
    }
}
