//! In-process HTTP stub used by the async tests
//!
//! Serves canned responses per path and records every request URI
//! (path and query) it receives.

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Canned response for one path
#[derive(Clone, Debug)]
pub(crate) struct StubRoute {
    path: String,
    status: u16,
    content_type: &'static str,
    body: String,
}

impl StubRoute {
    pub(crate) fn json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            status: 200,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub(crate) fn xml(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: 200,
            content_type: "text/xml",
            body: body.into(),
        }
    }

    pub(crate) fn text(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: 200,
            content_type: "text/plain",
            body: body.into(),
        }
    }

    pub(crate) fn status(path: impl Into<String>, status: u16) -> Self {
        Self {
            path: path.into(),
            status,
            content_type: "text/plain",
            body: String::new(),
        }
    }
}

#[derive(Clone)]
struct StubState {
    routes: Arc<HashMap<String, StubRoute>>,
    requests: Arc<Mutex<Vec<String>>>,
}

/// Handle for a running stub server; stops the server on drop
pub(crate) struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Bind on an ephemeral port and serve the routes built from the base URL
    pub(crate) async fn start<F>(routes: F) -> Self
    where
        F: FnOnce(&str) -> Vec<StubRoute>,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener address");
        let base_url = format!("http://{addr}");

        let routes = routes(&base_url)
            .into_iter()
            .map(|route| (route.path.clone(), route))
            .collect();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            routes: Arc::new(routes),
            requests: Arc::clone(&requests),
        };

        let app = Router::new().fallback(serve_route).with_state(state);
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            requests,
            handle,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request URIs received so far, in arrival order
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_route(State(state): State<StubState>, uri: Uri) -> Response {
    if let Ok(mut requests) = state.requests.lock() {
        requests.push(uri.to_string());
    }

    match state.routes.get(uri.path()) {
        Some(route) => {
            let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::OK);
            (
                status,
                [(header::CONTENT_TYPE, route.content_type)],
                route.body.clone(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
