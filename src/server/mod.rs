//! JSON-over-HTTP front end for the finance book.

use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use http_body_util::BodyExt;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::auth::{AuthService, MemorySessionStore};
use crate::book::Book;
use crate::config::Config;
use crate::storage::JsonFileStore;

pub mod error;
pub mod params;
mod routes;

pub use error::{ApiError, HttpResponse};

/// Shared state handed to every request.
pub struct AppState {
    book: Mutex<Book>,
    auth: Mutex<AuthService>,
    require_auth: bool,
}

impl AppState {
    pub fn new(book: Book, auth: AuthService, require_auth: bool) -> Self {
        Self {
            book: Mutex::new(book),
            auth: Mutex::new(auth),
            require_auth,
        }
    }

    /// File-backed state rooted at the configured data directory.
    pub fn from_config(cfg: &Config) -> Self {
        let book = Book::new(JsonFileStore::new(cfg.database_path()));
        let auth = AuthService::new(
            JsonFileStore::new(cfg.users_path()),
            MemorySessionStore::new(),
            cfg.session_ttl(),
        );
        Self::new(book, auth, cfg.require_auth)
    }

    // Every change reaches the store in a single save, so a request that
    // panicked while holding a guard left nothing half-applied.
    fn book(&self) -> MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(|poisoned| {
            warn!("recovering book lock after a panic");
            poisoned.into_inner()
        })
    }

    fn auth(&self) -> MutexGuard<'_, AuthService> {
        self.auth.lock().unwrap_or_else(|poisoned| {
            warn!("recovering auth lock after a panic");
            poisoned.into_inner()
        })
    }
}

/// Handles one request. Never fails; errors become JSON error responses.
pub async fn handle<B>(state: Arc<AppState>, req: Request<B>) -> HttpResponse
where
    B: Body,
    B::Error: Display,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let response = match body.collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            routes::dispatch(&state, &parts.method, &parts.uri, &parts.headers, &bytes)
        }
        Err(e) => Err(ApiError::BadRequest(format!("could not read body: {e}"))),
    };
    let response = response.unwrap_or_else(|e| {
        if e.status().is_server_error() {
            warn!(method = %parts.method, path = parts.uri.path(), error = %e, "request failed");
        } else {
            debug!(method = %parts.method, path = parts.uri.path(), error = %e, "request rejected");
        }
        e.into_response()
    });
    debug!(
        method = %parts.method,
        path = parts.uri.path(),
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    response
}

/// Accepts connections on `addr` until the listener fails.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let state = Arc::clone(&state);
                async move { Ok::<_, Infallible>(handle(state, req).await) }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                warn!(%peer, error = %e, "connection error");
            }
        });
    }
}
