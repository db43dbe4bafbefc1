//! Local stand-in for the album search service.
//!
//! Search terms select the canned response:
//!   "Nobody Nothing" → zero results
//!   "Broken Json"    → non-JSON body
//!   "Missing Image"  → artwork URL that 404s
//!   anything else    → one result whose 600x600 rendition downloads fine

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sleeve_proto::config::ArtworkConfig;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

struct Counters {
    addr: SocketAddr,
    searches: AtomicUsize,
    downloads: AtomicUsize,
    last_term: Mutex<Option<String>>,
}

pub(crate) struct TestServer {
    addr: SocketAddr,
    counters: Arc<Counters>,
}

impl TestServer {
    pub(crate) const IMAGE: &'static [u8] = b"\xff\xd8\xff\xe0 fake jpeg payload";

    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let counters = Arc::new(Counters {
            addr,
            searches: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
            last_term: Mutex::new(None),
        });

        let app = Router::new()
            .route("/search", get(search))
            .route("/art/:file", get(art))
            .with_state(counters.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, counters }
    }

    pub(crate) fn config(&self, cache_dir: &std::path::Path) -> ArtworkConfig {
        ArtworkConfig {
            search_url: format!("http://{}/search", self.addr),
            cache_dir: cache_dir.to_path_buf(),
            request_timeout_ms: 5_000,
            ..Default::default()
        }
    }

    pub(crate) fn searches(&self) -> usize {
        self.counters.searches.load(Ordering::SeqCst)
    }

    pub(crate) fn downloads(&self) -> usize {
        self.counters.downloads.load(Ordering::SeqCst)
    }

    pub(crate) fn last_term(&self) -> Option<String> {
        self.counters.last_term.lock().unwrap().clone()
    }
}

async fn search(
    State(counters): State<Arc<Counters>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    counters.searches.fetch_add(1, Ordering::SeqCst);
    let term = params.get("term").cloned().unwrap_or_default();
    *counters.last_term.lock().unwrap() = Some(term.clone());

    assert_eq!(params.get("entity").map(String::as_str), Some("album"));
    assert_eq!(params.get("limit").map(String::as_str), Some("1"));

    match term.as_str() {
        "Nobody Nothing" => Json(json!({ "resultCount": 0, "results": [] })).into_response(),
        "Broken Json" => "<html>not json</html>".into_response(),
        "Missing Image" => Json(json!({
            "resultCount": 1,
            "results": [{ "artworkUrl100": format!("http://{}/art/gone-100x100bb.jpg", counters.addr) }]
        }))
        .into_response(),
        _ => Json(json!({
            "resultCount": 1,
            "results": [{ "artworkUrl100": format!("http://{}/art/100x100bb.jpg", counters.addr) }]
        }))
        .into_response(),
    }
}

async fn art(State(counters): State<Arc<Counters>>, Path(file): Path<String>) -> Response {
    counters.downloads.fetch_add(1, Ordering::SeqCst);
    // Only the upgraded rendition exists, so a missed rewrite shows up as 404.
    if file == "600x600bb.jpg" {
        TestServer::IMAGE.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
