//! HTTP interface to the catalog and the page cache.
//!
//! | Method | Path                         | Response                         |
//! |--------|------------------------------|----------------------------------|
//! | `GET`  | `/apis/books`                | every book, newest first (JSON)  |
//! | `GET`  | `/apis/books/{id}`           | one book (JSON)                  |
//! | `GET`  | `/books/{id}`                | the book's page manifest (JSON)  |
//! | `GET`  | `/books/{id}/thumbnail`      | cover thumbnail (JPEG)           |
//! | `GET`  | `/books/{id}/{filename}`     | a file from the book's cache     |
//!
//! Unknown paths, identifiers and files are `404 Not Found`, other methods on
//! a known path are `405 Method Not Allowed`.

pub mod error;
mod response;
mod routes;

use exn::ResultExt;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ErrorKind, Result};

pub use crate::routes::AppState;

/// A bound listener, ready to [`run`](Self::run).
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
}
impl Server {
    pub async fn bind(addr: SocketAddr, state: AppState) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.or_raise(|| ErrorKind::Bind(addr))?;
        Ok(Self { listener, state: Arc::new(state) })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr().map_err(ErrorKind::Io)?)
    }

    /// Serve connections until `shutdown` is cancelled, then give in-flight
    /// connections up to `grace` to finish.
    pub async fn run(self, shutdown: CancellationToken, grace: Duration) -> Result<()> {
        let graceful = GracefulShutdown::new();
        info!(addr = %self.local_addr()?, "listening");
        loop {
            let (stream, peer) = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        // Usually transient (e.g. too many open files).
                        warn!(error = %err, "failed to accept connection");
                        continue;
                    },
                },
            };
            let state = Arc::clone(&self.state);
            let service = service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { Ok::<_, Infallible>(routes::handle(&state, req).await) }
            });
            let connection = graceful.watch(http1::Builder::new().serve_connection(TokioIo::new(stream), service));
            tokio::spawn(async move {
                if let Err(err) = connection.await {
                    debug!(%peer, error = %err, "connection closed with an error");
                }
            });
        }
        info!("shutting down");
        tokio::select! {
            () = graceful.shutdown() => debug!("all connections closed"),
            () = tokio::time::sleep(grace) => warn!(grace = ?grace, "timed out waiting for connections to close"),
        }
        Ok(())
    }
}
