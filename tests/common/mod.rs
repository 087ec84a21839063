//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use client_identity::config::IdentityConfig;
use client_identity::http::AppState;
use client_identity::lifecycle::Shutdown;
use client_identity::HttpServer;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const ADMIN_KEY: &str = "integration-admin-key";

/// A server running on loopback ports, stopped on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub state: AppState,
    pub config_tx: mpsc::UnboundedSender<IdentityConfig>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Reserve a loopback port by binding and releasing it.
async fn free_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Boot the server with `config`, the admin API enabled on its own port.
pub async fn spawn_server(mut config: IdentityConfig) -> TestServer {
    let admin_addr = free_port().await;
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config.admin.bind_address = admin_addr.to_string();
    config.observability.metrics_enabled = false;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config);
    let state = server.state().clone();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (config_tx, config_updates) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    // Give the admin listener time to bind.
    tokio::time::sleep(Duration::from_millis(200)).await;

    TestServer {
        addr,
        admin_addr,
        state,
        config_tx,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}
