//! Local redirect listener for the authorization flow
//!
//! Serves the redirect URI's path on its host and port. Every request is
//! handed to [`AuthorizationFlow::handle_callback`] and answered with a
//! small HTML page. The first terminal outcome is delivered through a
//! oneshot channel to whoever is waiting in [`CallbackServer::wait`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use ledgerbridge_core::{AuthorizationFlow, CallbackOutcome, CallbackParams};
use ledgerbridge_domain::{LedgerBridgeError, Result};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};
use url::Url;

use crate::errors::to_domain;

struct ServerState {
    flow: Arc<AuthorizationFlow>,
    done: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
}

/// Running callback listener.
pub struct CallbackServer {
    local_addr: SocketAddr,
    path: String,
    outcome_rx: Option<oneshot::Receiver<CallbackOutcome>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Listen on the host, port and path of the flow's redirect URI.
    ///
    /// # Errors
    /// `Config` if the redirect URI is not an `http` URL with a host,
    /// `Network` if the address cannot be bound.
    pub async fn start(flow: Arc<AuthorizationFlow>) -> Result<Self> {
        let (addr, path) = listen_target(flow.redirect_uri())?;
        Self::bind(flow, &addr, &path).await
    }

    /// Listen on an explicit address. Port `0` picks a free port.
    ///
    /// # Errors
    /// `Network` if the address cannot be bound.
    pub async fn bind(flow: Arc<AuthorizationFlow>, addr: &str, path: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|err| {
            LedgerBridgeError::Network(format!("failed to bind callback listener on {addr}: {err}"))
        })?;
        let local_addr = listener.local_addr().map_err(to_domain)?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let state = Arc::new(ServerState { flow, done: Mutex::new(Some(outcome_tx)) });
        let app = Router::new().route(path, get(handle_callback)).with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("callback server error: {}", err);
            }
        });

        info!(%local_addr, path, "callback listener started");
        Ok(Self {
            local_addr,
            path: path.to_string(),
            outcome_rx: Some(outcome_rx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// URL of the callback route on the bound address.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("http://{}{}", self.local_addr, self.path)
    }

    /// Wait for a terminal outcome (authorized, failed or denied).
    ///
    /// Requests without a code or with a mismatched state are answered but
    /// do not end the wait.
    ///
    /// # Errors
    /// `Network` on timeout, `Internal` if called twice or the server died.
    pub async fn wait(&mut self, timeout: Duration) -> Result<CallbackOutcome> {
        let rx = self
            .outcome_rx
            .take()
            .ok_or_else(|| LedgerBridgeError::Internal("callback outcome already taken".into()))?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => {
                Err(LedgerBridgeError::Internal("callback server stopped unexpectedly".into()))
            }
            Err(_) => Err(LedgerBridgeError::Network(format!(
                "timed out after {}s waiting for the authorization callback",
                timeout.as_secs()
            ))),
        }
    }

    /// Stop accepting requests and wait for the server task.
    ///
    /// # Errors
    /// `Internal` if the server task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(LedgerBridgeError::Internal(format!(
                        "callback server panicked: {err}"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_callback(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<CallbackParams>,
) -> Html<String> {
    let outcome = state.flow.handle_callback(&params).await;
    let page = render_page(&outcome);

    if outcome.is_terminal() {
        if let Some(tx) = state.done.lock().await.take() {
            let _ = tx.send(outcome);
        }
    }

    Html(page)
}

fn render_page(outcome: &CallbackOutcome) -> String {
    let title = if outcome.is_success() { "Authorization Complete" } else { "Authorization Failed" };
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n<body><p>{}</p></body>\n</html>",
        escape_html(&outcome.user_message())
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// `host:port` and path to serve for a redirect URI.
fn listen_target(redirect_uri: &str) -> Result<(String, String)> {
    let url = Url::parse(redirect_uri)
        .map_err(|err| LedgerBridgeError::Config(format!("invalid redirect URI: {err}")))?;
    if url.scheme() != "http" {
        return Err(LedgerBridgeError::Config(format!(
            "redirect URI must use http for the local listener: {redirect_uri}"
        )));
    }
    let host = url
        .host_str()
        .ok_or_else(|| LedgerBridgeError::Config("redirect URI has no host".into()))?;
    let port = url.port_or_known_default().unwrap_or(80);
    let path = if url.path().is_empty() { "/".to_string() } else { url.path().to_string() };

    Ok((format!("{host}:{port}"), path))
}
