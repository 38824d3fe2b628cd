//! Shared helpers for swapbook-core integration tests

#![allow(dead_code)]

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tokio::net::TcpListener;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// The worked example from the product notes, plus a second brand
pub const SAMPLE_DATABASE: &str = r#"{
  "carsByBrand": {
    "Toyota": [
      {"car": "Supra", "swappableEngines": ["2JZ", "B58"]}
    ],
    "Nissan": [
      {"car": "Skyline R32", "swappableEngines": ["RB26DETT", "VR38DETT"]},
      {"car": "Silvia S14", "swappableEngines": ["SR20DET", "2JZ"]}
    ]
  }
}"#;

/// A local origin serving one canned response for the database path
pub struct MockOrigin {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl MockOrigin {
    /// Serve `body` with `status` at `<prefix>/engine_swap_database.json`
    pub async fn start(prefix: &str, status: StatusCode, body: &'static str) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let route = format!("{}/engine_swap_database.json", prefix.trim_end_matches('/'));
        let app = Router::new().route(
            &route,
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (status, body)
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}{prefix}"),
            hits,
        }
    }

    pub async fn serving(body: &'static str) -> Self {
        Self::start("/", StatusCode::OK, body).await
    }

    /// Number of requests the origin has answered
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// An address nothing listens on
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}
