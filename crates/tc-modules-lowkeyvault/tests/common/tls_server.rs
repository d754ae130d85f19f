//! Minimal HTTPS server for trust tests
//!
//! Answers every connection with `200 OK` and body `ok`, so tests can check
//! whether a client accepts the server's certificate.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

const RESPONSE: &str = concat!(
    "HTTP/1.1 200 OK\r\n",
    "content-type: text/plain\r\n",
    "content-length: 2\r\n",
    "connection: close\r\n",
    "\r\n",
    "ok",
);

/// A running HTTPS server, stopped on drop
pub struct TlsServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TlsServer {
    pub async fn start(config: Arc<rustls::ServerConfig>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind TLS listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let acceptor = TlsAcceptor::from(config);

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    // Handshake failures are expected when the client rejects us
                    let Ok(mut tls) = acceptor.accept(stream).await else {
                        return;
                    };
                    let mut request = [0u8; 4096];
                    let _ = tls.read(&mut request).await;
                    let _ = tls.write_all(RESPONSE.as_bytes()).await;
                    let _ = tls.shutdown().await;
                });
            }
        });

        Self { addr, task }
    }

    /// URL of the server root, addressed by IP
    pub fn url(&self) -> String {
        format!("https://{}/", self.addr)
    }
}

impl Drop for TlsServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
