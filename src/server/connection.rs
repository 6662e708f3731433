// Connection handling module
// Accepts one TCP connection and serves its requests through the application

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;

use super::ServerState;
use crate::error::HttpError;
use crate::handler::error_handler;
use crate::http::{Origin, Request, Response};
use crate::logger::{self, AccessLogEntry};

/// Accept a connection, checking the connection limit.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<ServerState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment first, then check, so concurrent accepts cannot both slip under the limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Serve the connection in a local task; the counter is decremented when it closes.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<ServerState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            performance.read_timeout,
            performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| serve_request(req, Arc::clone(&service_state), peer_addr)),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Buffer the request, run the application on the blocking pool, log the access line
async fn serve_request(
    req: hyper::Request<Incoming>,
    state: Arc<ServerState>,
    peer_addr: SocketAddr,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let max_body_size = state.config.http.max_body_size;
    let server_name = state.config.http.server_name.as_str();

    if let Some(resp) = check_body_size(&req, max_body_size) {
        return Ok(resp);
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.is::<LengthLimitError>() => {
            logger::log_error(&format!("Request body too large (max: {max_body_size})"));
            return Ok(build_413_response());
        }
        Err(err) => {
            logger::log_connection_error(&err);
            let response = error_handler::default_response(&HttpError::from_code(400));
            return Ok(to_transport(response, server_name));
        }
    };

    let origin = Origin {
        scheme: "http".to_string(),
        server_name: state.config.server.host.clone(),
        server_port: state.config.server.port,
    };
    let remote_addr = peer_addr.ip().to_string();

    // Form parsing and dispatch are synchronous, so both run on the blocking pool
    let app_state = Arc::clone(&state);
    let dispatched = tokio::task::spawn_blocking(move || {
        let mut request = Request::new(hyper::Request::from_parts(parts, body), origin);
        let entry = AccessLogEntry::for_request(remote_addr, &request);
        (entry, app_state.app.handle(&mut request))
    })
    .await;

    let (mut entry, response) = match dispatched {
        Ok(dispatched) => dispatched,
        Err(err) => {
            logger::log_error(&format!("Request task failed: {err}"));
            let response = error_handler::default_response(&HttpError::internal_server_error());
            return Ok(to_transport(response, server_name));
        }
    };

    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().len();
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    if state.config.logging.access_log {
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(to_transport(response, server_name))
}

/// Convert for hyper, announcing `server_name` in the `Server` header
fn to_transport(response: Response, server_name: &str) -> hyper::Response<Full<Bytes>> {
    let mut response = response.into_http();
    match HeaderValue::from_str(server_name) {
        Ok(value) => {
            response.headers_mut().insert(header::SERVER, value);
        }
        Err(_) => logger::log_warning(&format!("Invalid server name '{server_name}'")),
    }
    response.map(Full::new)
}

/// Reject up front when `Content-Length` already exceeds the limit
fn check_body_size(
    req: &hyper::Request<Incoming>,
    max_body_size: u64,
) -> Option<hyper::Response<Full<Bytes>>> {
    let content_length = req.headers().get(hyper::header::CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn build_413_response() -> hyper::Response<Full<Bytes>> {
    hyper::Response::builder()
        .status(413)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build 413 response: {e}"));
            hyper::Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_413_response() {
        let resp = build_413_response();
        assert_eq!(resp.status(), 413);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("413 Payload Too Large"));
    }

    #[tokio::test]
    async fn test_to_transport_keeps_status_and_body() {
        let response = Response::new("gone").with_status(hyper::StatusCode::GONE);
        let resp = to_transport(response, "Tokio-Hyper/1.0");
        assert_eq!(resp.status(), 410);
        assert_eq!(resp.headers()["server"], "Tokio-Hyper/1.0");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("gone"));
    }
}
