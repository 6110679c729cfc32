use std::sync::Arc;

use billing_server::app_state::AppState;
use billing_server::routes::route;
use billing_server::settings::load_config;
use billing_server::utils::tracing::init_tracer;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Accept connections and spawn a task per connection.
///
/// Listens for `SIGINT` / `ctrl-c` and shuts down gracefully, allowing
/// in-flight connections to finish.
async fn run_server(
    state: Arc<AppState>,
    bind_address: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(bind_address).await?;
    info!(address = %bind_address, "server listening");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = result?;
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::task::spawn(async move {
                    debug!(peer = ?peer_addr, "accepted connection");

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { route(req, state).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        warn!(error = ?err, "error serving connection");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("received shutdown signal, stopping server");
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config()?;
    let _tracer_provider = init_tracer();
    info!(
        data_file = %config.data_file.display(),
        currency = %config.currency_symbol,
        "configuration loaded"
    );

    let state = Arc::new(AppState::new(&config));
    run_server(state, &config.listen_address).await
}
