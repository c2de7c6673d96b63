//! Shared utilities for integration tests: echo backends and an in-process
//! gateway, all on ephemeral ports.

#![allow(dead_code)]

use gateway_router::admin;
use gateway_router::config::GatewayConfig;
use gateway_router::conformance::{echo, AdminEndpoint, ConformanceTest};
use gateway_router::http::HttpServer;
use gateway_router::lifecycle::Shutdown;
use gateway_router::upstream::BackendRef;
use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

async fn ephemeral() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").await.unwrap()
}

/// Start an echo backend identifying itself as `backend`.
pub async fn start_echo_backend(backend: BackendRef) -> SocketAddr {
    let listener = ephemeral().await;
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = echo::serve(listener, backend).await;
    });
    addr
}

/// Start one echo backend per backend the test references.
pub async fn start_backends_for(test: &ConformanceTest) -> BTreeMap<BackendRef, SocketAddr> {
    let mut addrs = BTreeMap::new();
    for reference in test.backend_refs() {
        let addr = start_echo_backend(reference.clone()).await;
        addrs.insert(reference, addr);
    }
    addrs
}

/// A local address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = ephemeral().await;
    listener.local_addr().unwrap()
}

/// Start a raw backend whose responses are computed by `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = ephemeral().await;
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let (status, body) = f().await;
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// An in-process gateway with its admin API.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub admin: AdminEndpoint,
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub async fn start(config: GatewayConfig) -> Self {
        let api_key = config.admin.api_key.clone();
        let server = HttpServer::new(config).unwrap();
        let shutdown = Shutdown::new();

        let admin_listener = ephemeral().await;
        let admin_addr = admin_listener.local_addr().unwrap();
        let state = server.state();
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = admin::serve(admin_listener, state, admin_shutdown).await;
        });

        let listener = ephemeral().await;
        let addr = listener.local_addr().unwrap();
        let (updates, config_updates) = mpsc::unbounded_channel();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, config_updates, server_shutdown).await;
        });

        Self {
            addr,
            admin: AdminEndpoint::new(format!("http://{}", admin_addr), api_key),
            updates,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
