/// Server Transports
///
/// This module frames dispatcher envelopes onto a byte stream:
/// - STDIO: newline-delimited JSON on stdin/stdout, one request at a time
/// - HTTP: one envelope per POST body, served by Actix Web
///
/// Both transports share `respond`, which wraps the dispatcher in a last-resort
/// panic guard so that every frame is answered with a well-formed envelope.

use actix_web::{
    App, HttpResponse, HttpServer,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use bytes::Bytes;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, info};

use crate::core::dispatcher::{AppState, dispatch_line, panic_message};
use crate::core::error::ServerError;
use crate::core::protocol::MCPResponse;
use crate::core::registry::ToolRegistry;

/// Answer one transport frame.
///
/// The dispatcher already converts tool failures into error envelopes; this
/// guard covers anything that still unwinds out of it.
pub async fn respond(registry: &ToolRegistry, state: &AppState, frame: &str) -> MCPResponse {
    match AssertUnwindSafe(dispatch_line(registry, state, frame)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(%message, "dispatcher panicked");
            MCPResponse::server_error(None, message)
        }
    }
}

/// Serve newline-delimited JSON-RPC over any buffered reader and writer.
///
/// - Each non-blank line is answered with exactly one response line, flushed
///   before the next line is read, so responses keep request order.
/// - Blank lines are skipped without a response.
/// - End of input ends the loop with `Ok(())`.
/// - Only I/O errors on the streams themselves end the loop with an error.
pub async fn serve_lines<R, W>(
    registry: &ToolRegistry,
    state: &AppState,
    mut reader: R,
    mut writer: W,
) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = Vec::with_capacity(8192);
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            debug!("input closed");
            break;
        }

        // Invalid UTF-8 is replaced rather than rejected; the dispatcher then
        // reports the frame as unparseable.
        let text = String::from_utf8_lossy(&buffer);
        let frame = text.trim();
        if frame.is_empty() {
            continue;
        }
        debug!(request = frame, "received");

        let response = respond(registry, state, frame).await;
        let mut line = response.to_line();
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Run the server in STDIO mode.
///
/// Reads requests line-by-line from stdin and writes responses to stdout.
/// Logging goes to stderr so stdout only ever carries response lines.
pub async fn run_server_stdio(registry: Arc<ToolRegistry>, state: AppState) -> Result<(), ServerError> {
    info!(
        name = %state.server_name,
        version = %state.server_version,
        tools = registry.len(),
        "server started in stdio mode"
    );

    // 8KB buffers balance memory usage with I/O efficiency
    let stdin = BufReader::with_capacity(8192, tokio::io::stdin());
    let stdout = BufWriter::with_capacity(8192, tokio::io::stdout());
    let result = serve_lines(&registry, &state, stdin, stdout).await;

    match &result {
        Ok(()) => info!("stdin closed, server stopped"),
        Err(e) => error!(error = %e, "stdio transport failed"),
    }
    result
}

/// Health check endpoint handler.
async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": state.server_name
    }))
}

/// JSON-RPC endpoint handler.
///
/// The raw body is handed to the dispatcher so that undecodable bodies still
/// receive an error envelope (with HTTP 200) instead of a framework 400.
async fn rpc_handler(
    state: web::Data<AppState>,
    registry: web::Data<ToolRegistry>,
    body: Bytes,
) -> HttpResponse {
    let frame = String::from_utf8_lossy(&body);
    let response = respond(registry.get_ref(), state.get_ref(), frame.trim()).await;
    HttpResponse::Ok()
        .content_type("application/json")
        .body(response.to_line())
}

/// Register the HTTP routes on an Actix application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/mcp", web::post().to(rpc_handler))
        .route("/", web::post().to(rpc_handler))
        .route("/", web::get().to(health));
}

/// Run the server in HTTP mode.
///
/// The server is configured with:
/// - Worker threads: from configuration
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Disconnect timeout: 2 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(
    registry: Arc<ToolRegistry>,
    state: AppState,
    host: &str,
    port: u16,
    workers: usize,
) -> Result<(), ServerError> {
    let bind_addr = format!("{host}:{port}");
    info!(
        name = %state.server_name,
        version = %state.server_version,
        bind = %bind_addr,
        workers,
        tools = registry.len(),
        "server starting in http mode"
    );

    let app_state = web::Data::new(state);
    let tool_registry = web::Data::from(registry);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(tool_registry.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            // %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure)
    })
    .workers(workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await?;

    info!("http server stopped");
    Ok(())
}
