#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::service::service_fn;
use hyper::{Body, Request, Response, StatusCode};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TWO_BREEDS: &str = r#"[
    {"id": 1, "name": "Affenpinscher", "temperament": "Stubborn, Curious", "weight": {"metric": "3 - 6"}},
    {"id": 2, "name": "Beagle", "bred_for": null, "weight": {"metric": "9 - 11"}}
]"#;

/// Canned HTTP upstream bound to an ephemeral local port.
///
/// Every request gets the same status and body, after `delay`.
pub struct FakeApi {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl FakeApi {
    pub async fn start(status: u16, body: &'static str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: u16, body: &'static str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("failed to bind");
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let status = StatusCode::from_u16(status).unwrap();

        let counter = hits.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _peer)) = listener.accept().await else { break };
                let counter = counter.clone();
                let svc = service_fn(move |_req: Request<Body>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async move {
                        tokio::time::sleep(delay).await;
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(status)
                                .header("content-type", "application/json")
                                .body(Body::from(body))
                                .unwrap(),
                        )
                    }
                });
                tokio::spawn(async move {
                    let _ = hyper::server::conn::Http::new().serve_connection(stream, svc).await;
                });
            }
        });

        Self { addr, hits, handle }
    }

    /// Base URL, without the endpoint.
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn breeds_url(&self) -> String {
        format!("{}/breeds", self.base_url())
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
