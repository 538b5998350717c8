//! Mock HTTP server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use rest_batch::{RestClient, Transport};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Client on a fresh reqwest transport, independent of the shared one.
    pub fn client(&self) -> RestClient {
        RestClient::builder()
            .transport(fresh_transport())
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client builds")
    }

    pub async fn mock_json(&self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Expect an exact request body and header, reply with `status`.
    pub async fn mock_expecting(
        &self,
        method: &str,
        path: &str,
        header: (&str, &str),
        body: &str,
        status: usize,
    ) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .match_header(header.0, header.1)
            .match_body(Matcher::Exact(body.to_string()))
            .with_status(status)
            .create_async()
            .await
    }

    pub async fn mock_never_called(&self, path: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", path)
            .expect(0)
            .create_async()
            .await
    }

    pub async fn mock_redirect(&self, from: &str, to: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", from)
            .with_status(302)
            .with_header("location", to)
            .create_async()
            .await
    }
}

pub fn fresh_transport() -> Arc<dyn Transport> {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("reqwest client");
    Arc::new(rest_batch::ReqwestTransport::with_client(client))
}

/// Address that accepts connections and never answers.
pub async fn black_hole() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}/", addr)
}

/// Address nothing listens on.
pub async fn refused() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}/", addr)
}
