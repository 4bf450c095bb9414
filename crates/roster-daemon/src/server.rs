use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use roster_config::ServerConfig;
use roster_http::{
    header, read_request, write_response, HttpProtocolError, Request, Response, StatusCode,
};
use roster_store::Store;
use roster_types::{
    ErrorResponse, RouteNotFoundResponse, ERR_BAD_REQUEST, ERR_INTERNAL, ERR_PAYLOAD_TOO_LARGE,
};
use serde::Serialize;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::handlers::{handle_route, HandlerContext, Reply};
use crate::router::resolve;

pub struct DaemonServer {
    listener: TcpListener,
    ctx: Arc<HandlerContext>,
    max_body_bytes: u64,
    shutdown_tx: broadcast::Sender<()>,
}

impl DaemonServer {
    pub async fn bind(config: &ServerConfig, store: Store) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            listener,
            ctx: Arc::new(HandlerContext::new(store)),
            max_body_bytes: config.max_body_bytes,
            shutdown_tx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Sending on the returned channel stops the accept loop.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let server = Arc::new(self);

        loop {
            tokio::select! {
                result = server.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let server = Arc::clone(&server);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_client(stream).await {
                                    error!("Error handling client {}: {}", peer, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_client(&self, mut stream: TcpStream) -> anyhow::Result<()> {
        let start = Instant::now();
        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half);

        let response = match read_request(&mut reader, self.max_body_bytes).await {
            Ok(request) => {
                let method = request.method().clone();
                let path = request.uri().path().to_string();
                let response = dispatch(Arc::clone(&self.ctx), request).await;
                info!(
                    "{} {} -> {} in {:?}",
                    method,
                    path,
                    response.status().as_u16(),
                    start.elapsed()
                );
                response
            }
            Err(e) if e.is_client_error() => {
                warn!("Rejecting malformed request: {}", e);
                protocol_error_response(&e)
            }
            Err(e) => {
                debug!("Connection ended before a full request: {}", e);
                return Ok(());
            }
        };

        write_response(&mut write_half, &response).await?;
        write_half.shutdown().await?;
        Ok(())
    }
}

/// Routes one request and runs its handler on the blocking pool, since the
/// handler does synchronous file I/O for the whole load/modify/save cycle.
pub async fn dispatch(ctx: Arc<HandlerContext>, request: Request<Vec<u8>>) -> Response<Vec<u8>> {
    let Some(route) = resolve(request.method(), request.uri().path()) else {
        return json_response(StatusCode::NOT_FOUND, &RouteNotFoundResponse::default());
    };

    let body = request.into_body();
    let reply = tokio::task::spawn_blocking(move || handle_route(&ctx, route, &body)).await;

    match reply {
        Ok(Reply { status, body }) => json_response(status, &body),
        Err(e) => {
            error!("Handler task failed: {}", e);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse::new(ERR_INTERNAL),
            )
        }
    }
}

fn protocol_error_response(err: &HttpProtocolError) -> Response<Vec<u8>> {
    match err {
        HttpProtocolError::PayloadTooLarge { .. } => json_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            &ErrorResponse::new(ERR_PAYLOAD_TOO_LARGE),
        ),
        _ => json_response(StatusCode::BAD_REQUEST, &ErrorResponse::new(ERR_BAD_REQUEST)),
    }
}

/// Fallback body when an envelope fails to encode.
const INTERNAL_ERROR_BODY: &str = r#"{"error":"Internal Server Error"}"#;

fn json_response(status: StatusCode, body: &impl Serialize) -> Response<Vec<u8>> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            error!("Failed to encode response body: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_BODY.as_bytes().to_vec(),
            )
        }
    };
    let mut response = Response::new(bytes);
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json; charset=utf-8"),
    );
    response
}
