//! HTTP listener for the sync and control endpoints.
//!
//! Binds the configured listen port on all interfaces (the peer connects
//! from another host) and serves one connection per task. Request bodies
//! are collected up front; uploads arrive as a single streamed body and the
//! handlers work on the complete bytes.

use std::net::SocketAddr;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::routes;
use crate::state::ServerState;

/// HTTP server hosting the peer-facing `/sync` endpoints and the operator
/// control plane.
pub struct SyncServer {
    state: ServerState,
    addr: SocketAddr,
}

impl SyncServer {
    /// Creates a new `SyncServer` bound to the given listen port.
    pub fn new(state: ServerState, listen: u16) -> Self {
        let addr = SocketAddr::from(([0, 0, 0, 0], listen));
        Self { state, addr }
    }

    /// Starts the HTTP server. This future runs until the provided
    /// cancellation token is triggered.
    ///
    /// Should be spawned as a background task.
    pub async fn run(&self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "Sync server listening");

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, _) = result?;
                    let io = TokioIo::new(stream);
                    let state = self.state.clone();

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let state = state.clone();
                            async move { handle_request(req, &state).await }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            error!(error = %e, "Sync HTTP connection error");
                        }
                    });
                }
                _ = shutdown.cancelled() => {
                    info!("Sync server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Collects the request body and hands the request to the router.
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: &ServerState,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();
    Ok(routes::route(parts.method, parts.uri, body, state).await)
}
