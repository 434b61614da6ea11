//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use quote_relay::config::RelayConfig;
use quote_relay::{HttpServer, QuoteStore, Shutdown};

pub const USDBRL_OK: &str = r#"{"USDBRL":{"code":"USD","codein":"BRL","bid":"5.12","ask":"5.13"}}"#;

/// Start a programmable mock upstream on an ephemeral port.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 2048];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Upstream that always answers `status` with `body` after `delay`.
pub async fn start_upstream(status: u16, body: &'static str, delay: Duration) -> SocketAddr {
    start_programmable_upstream(move || async move {
        tokio::time::sleep(delay).await;
        (status, body.to_string())
    })
    .await
}

/// Relay config pointing at `upstream`, with test-friendly budgets.
pub fn relay_config(upstream: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.url = format!("http://{upstream}/json/last/USD-BRL");
    config.upstream.use_system_proxy = false;
    config.upstream.timeout_ms = 200;
    // Generous so a loaded test host does not flake the happy path.
    config.storage.timeout_ms = 500;
    config
}

pub struct Relay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl Relay {
    pub fn url(&self) -> String {
        format!("http://{}/cotacao", self.addr)
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `server` on an ephemeral port.
pub async fn spawn_server(server: HttpServer) -> Relay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let _ = tokio::spawn(server.run(listener, shutdown.clone()));

    Relay { addr, shutdown }
}

/// Start a relay backed by `store`.
pub async fn start_relay(config: RelayConfig, store: QuoteStore) -> Relay {
    spawn_server(HttpServer::new(config, store).unwrap()).await
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
