// Server loop module
// Accepts connections until CTRL-C

use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::listener::create_reusable_listener;
use super::ServerState;
use crate::logger;

/// Bind `addr` and serve until interrupted.
///
/// Connection tasks are spawned with `spawn_local`, so this runs inside a `LocalSet`.
pub async fn run(state: ServerState, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let listener = create_reusable_listener(addr)?;
    logger::log_server_start(&listener.local_addr()?, &state.config);

    let local = tokio::task::LocalSet::new();
    local
        .run_until(start_server_loop(
            listener,
            Arc::new(state),
            Arc::new(AtomicUsize::new(0)),
        ))
        .await
}

#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<ServerState>,
    active_connections: Arc<AtomicUsize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            result = &mut shutdown => {
                result?;
                logger::log_debug("Interrupt received, shutting down");
                println!("\nServer stopped");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Application;
    use crate::config::{AppConfig, Config};
    use crate::handler::{MethodTable, Route};
    use crate::http::Response;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_serves_request_over_tcp() {
        let route = Route::new(
            "/golden/corn/",
            MethodTable::new().on_get(|_, _| Ok(Response::new("golden corn"))),
        );
        let app = Application::new(AppConfig::default(), vec![route.into()], Vec::new()).unwrap();
        let state = Arc::new(ServerState::new(app, Config::default()));
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                tokio::task::spawn_local(async move {
                    let _ = start_server_loop(listener, state, Arc::new(AtomicUsize::new(0))).await;
                });

                let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
                stream
                    .write_all(b"GET /golden/corn/ HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                    .await
                    .unwrap();
                let mut raw = String::new();
                stream.read_to_string(&mut raw).await.unwrap();

                assert!(raw.starts_with("HTTP/1.1 200 OK"));
                assert!(raw.ends_with("golden corn"));
            })
            .await;
    }
}
