//! HTTP transport and graceful shutdown.
//!
//! The server owns the accept loop and nothing else: every request on every
//! connection is answered by the [`Dispatcher`], and a shutdown signal stops
//! accepting while in-flight connections drain.

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};

/// The HTTP server hosting one [`Dispatcher`].
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Accepts connections and answers every request from `dispatcher`.
    ///
    /// Returns only after a full graceful shutdown: SIGTERM or Ctrl-C stops
    /// the accept loop, then all in-flight connections run to completion.
    pub async fn serve(self, dispatcher: Dispatcher) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| Error::Bind {
                addr: self.addr,
                source,
            })?;
        let dispatcher = Arc::new(dispatcher);

        info!(addr = %self.addr, "mockd listening");

        // Every connection task lands in the JoinSet so shutdown can wait
        // for the stragglers.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Arms are checked top-to-bottom: a shutdown signal wins
                // over any queued connection.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let dispatcher = Arc::clone(&dispatcher);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection, not
                        // once per connection.
                        let svc = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                            let dispatcher = Arc::clone(&dispatcher);
                            async move {
                                let method = req.method().clone();
                                let path = req.uri().path().to_owned();
                                let response = dispatcher.handle(&method, &path).await;
                                Ok::<_, std::convert::Infallible>(response)
                            }
                        });

                        // auto::Builder speaks HTTP/1.1 or HTTP/2, whichever
                        // the client opens with.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the set stays bounded on
                // long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("mockd stopped");
        Ok(())
    }
}

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both SIGTERM and SIGINT (Ctrl-C); on other
/// platforms only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = sigterm => {}
    }
}
