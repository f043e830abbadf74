//! Proxy server: TCP listener, request routing, and lifecycle.
//!
//! The server binds to `config.bind_addr:config.bind_port` (port 0 = OS
//! assigned), accepts TCP connections, parses one HTTP/1.1 request per
//! connection, and routes it:
//!
//! `GET /proxy?...` -> [`handler::handle_proxy`]
//! `GET /?...`      -> [`host::host_page`]
//!
//! Every response carries `Content-Length` and `Connection: close`.

use crate::audit;
use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::fetch::Fetcher;
use crate::handler::{self, ProxyResponse};
use crate::host;
use crate::request::PROXY_PATH;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Maximum total size of HTTP headers (64 KiB). Prevents OOM from
/// malicious clients sending unbounded header data.
const MAX_HEADER_SIZE: usize = 64 * 1024;

/// Handle returned when the proxy server starts.
///
/// Drop the handle or call [`ProxyHandle::shutdown`] to stop the proxy.
pub struct ProxyHandle {
    /// The actual port the proxy is listening on
    pub port: u16,
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
}

impl ProxyHandle {
    /// Signal the proxy to shut down gracefully.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Address the listener is bound to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Shared state for the proxy server.
struct ProxyState {
    fetcher: Fetcher,
    config: ProxyConfig,
    /// Active connection count for connection limiting.
    active_connections: AtomicUsize,
}

/// Start the proxy server.
///
/// Validates `config`, builds the shared outbound client, binds the
/// listener, and begins accepting connections on the current runtime.
pub async fn start(config: ProxyConfig) -> Result<ProxyHandle> {
    config.validate()?;
    let fetcher = Fetcher::new(&config)?;

    let bind_addr = SocketAddr::new(config.bind_addr, config.bind_port);
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| ProxyError::Bind {
            addr: bind_addr.to_string(),
            source: e,
        })?;

    let local_addr = listener.local_addr().map_err(|e| ProxyError::Bind {
        addr: bind_addr.to_string(),
        source: e,
    })?;

    info!("Proxy server listening on {}", local_addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = Arc::new(ProxyState {
        fetcher,
        config,
        active_connections: AtomicUsize::new(0),
    });

    // The caller must keep this runtime driven for the server to make progress.
    tokio::spawn(accept_loop(listener, state, shutdown_rx));

    Ok(ProxyHandle {
        port: local_addr.port(),
        addr: local_addr,
        shutdown_tx,
    })
}

/// Accept loop: listen for connections until shutdown.
async fn accept_loop(
    listener: TcpListener,
    state: Arc<ProxyState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        let max = state.config.max_connections;
                        if max > 0 {
                            let current = state.active_connections.load(Ordering::Relaxed);
                            if current >= max {
                                warn!("Connection limit reached ({}/{}), rejecting {}", current, max, addr);
                                drop(stream);
                                continue;
                            }
                        }
                        state.active_connections.fetch_add(1, Ordering::Relaxed);

                        debug!("Accepted connection from {}", addr);
                        let state = Arc::clone(&state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &state).await {
                                debug!("Connection handler error: {}", e);
                            }
                            state.active_connections.fetch_sub(1, Ordering::Relaxed);
                        });
                    }
                    Err(e) => {
                        warn!("Accept error: {}", e);
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Proxy server shutting down");
                    return;
                }
            }
        }
    }
}

/// What arrived before the request body.
enum RequestHead {
    /// Request line, without its terminator
    Line(String),
    /// Client went away before completing the request line
    Closed,
    /// Request line plus headers exceed [`MAX_HEADER_SIZE`]
    TooLarge,
}

/// Handle a single client connection: one request, one response.
async fn handle_connection(mut stream: TcpStream, state: &ProxyState) -> Result<()> {
    let deadline = state.config.request_read_timeout();
    let head = match tokio::time::timeout(deadline, read_request_head(&mut stream)).await {
        Ok(head) => head?,
        Err(_) => {
            audit::log_rejected("-", 408, "request head not received in time");
            let response = ProxyResponse::text(408, "Request Timeout");
            return write_response(&mut stream, &response).await;
        }
    };

    let request_line = match head {
        RequestHead::Line(line) => line,
        RequestHead::Closed => return Ok(()),
        RequestHead::TooLarge => {
            audit::log_rejected("-", 431, "request head too large");
            let response = ProxyResponse::text(431, "Request Header Fields Too Large");
            return write_response(&mut stream, &response).await;
        }
    };

    let response = route(&request_line, state).await;
    write_response(&mut stream, &response).await
}

/// Read the request line and headers through a [`MAX_HEADER_SIZE`] window.
///
/// Headers are discarded; routing only needs the request line.
async fn read_request_head(stream: &mut TcpStream) -> Result<RequestHead> {
    let mut reader = BufReader::new(stream.take(MAX_HEADER_SIZE as u64 + 1));

    let mut line = String::new();
    let mut total = reader.read_line(&mut line).await?;
    if total > MAX_HEADER_SIZE {
        return Ok(RequestHead::TooLarge);
    }
    if !line.ends_with('\n') {
        return Ok(RequestHead::Closed);
    }
    let request_line = line.trim_end().to_string();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        total += n;
        if total > MAX_HEADER_SIZE {
            return Ok(RequestHead::TooLarge);
        }
        if n == 0 || line.trim().is_empty() {
            break;
        }
    }

    Ok(RequestHead::Line(request_line))
}

async fn route(request_line: &str, state: &ProxyState) -> ProxyResponse {
    let (method, target) = match parse_request_line(request_line) {
        Ok(parts) => parts,
        Err(e) => {
            audit::log_rejected(request_line, 400, &e.to_string());
            return ProxyResponse::text(400, "Bad Request");
        }
    };

    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    if path != PROXY_PATH && path != "/" {
        audit::log_rejected(target, 404, "unknown route");
        return ProxyResponse::text(404, "Not Found");
    }

    if method != "GET" {
        audit::log_rejected(target, 405, "method not allowed");
        return ProxyResponse::text(405, "Method Not Allowed");
    }

    if path == PROXY_PATH {
        handler::handle_proxy(query, &state.fetcher).await
    } else {
        host::host_page(query)
    }
}

/// Split `METHOD TARGET HTTP/x.y` into method and origin-form target.
fn parse_request_line(line: &str) -> Result<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ProxyError::HttpParse(format!(
            "malformed request line: {}",
            line
        )));
    };

    if !version.starts_with("HTTP/1.") {
        return Err(ProxyError::HttpParse(format!(
            "unsupported HTTP version: {}",
            version
        )));
    }
    if !target.starts_with('/') {
        return Err(ProxyError::HttpParse(format!(
            "unsupported request target: {}",
            target
        )));
    }

    Ok((method, target))
}

async fn write_response(stream: &mut TcpStream, response: &ProxyResponse) -> Result<()> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\n",
        response.status,
        reason_phrase(response.status)
    );
    if let Some(ref content_type) = response.content_type {
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        response.body.len()
    ));

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&response.body).await?;
    stream.flush().await?;
    stream.shutdown().await?;
    Ok(())
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Content Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Content",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        100..=199 => "Informational",
        200..=299 => "Success",
        300..=399 => "Redirection",
        400..=499 => "Client Error",
        _ => "Server Error",
    }
}
