use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use axum::{Extension, Router, routing::get};
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
    time::timeout,
};
use url::{Host, Url};

use crate::{
    api,
    config::validate_redirect_uri,
    error::ConfigError,
    types::{AuthSession, CallbackOutcome},
};

/// How long a served connection may take to finish after the code arrived.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Single-use HTTP listener for the OAuth redirect.
///
/// Binds only to the loopback interface on the port of the registered
/// redirect URI and answers exactly one request on the redirect path.
#[derive(Debug, Clone)]
pub struct LoopbackAuthServer {
    addr: SocketAddr,
    path: String,
    max_wait: Duration,
}

impl LoopbackAuthServer {
    pub fn new(addr: SocketAddr, path: impl Into<String>, max_wait: Duration) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        Self {
            addr,
            path,
            max_wait,
        }
    }

    /// Derives address and path from the redirect URI. `localhost` maps to
    /// `127.0.0.1`.
    pub fn from_redirect_uri(redirect_uri: &str, max_wait: Duration) -> Result<Self, ConfigError> {
        validate_redirect_uri(redirect_uri)?;

        let invalid = |reason: &str| ConfigError::InvalidRedirectUri {
            uri: redirect_uri.to_string(),
            reason: reason.to_string(),
        };
        let url = Url::parse(redirect_uri).map_err(|e| invalid(&e.to_string()))?;

        let ip = match url.host() {
            Some(Host::Ipv4(ip)) => IpAddr::V4(ip),
            Some(Host::Ipv6(ip)) => IpAddr::V6(ip),
            Some(Host::Domain(_)) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            None => return Err(invalid("missing host")),
        };
        let port = url.port().ok_or_else(|| invalid("missing port"))?;

        Ok(Self::new(SocketAddr::new(ip, port), url.path(), max_wait))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Binds the listener without accepting anything yet.
    ///
    /// With `expected_state` set, a redirect whose `state` differs is treated
    /// as carrying no code.
    pub async fn bind(&self, expected_state: Option<String>) -> std::io::Result<BoundAuthServer> {
        let listener = TcpListener::bind(self.addr).await?;

        Ok(BoundAuthServer {
            listener,
            path: self.path.clone(),
            max_wait: self.max_wait,
            expected_state,
        })
    }

    /// Binds, waits for the single redirect and shuts down again.
    pub async fn run_once(&self) -> std::io::Result<CallbackOutcome> {
        Ok(self.bind(None).await?.wait().await)
    }
}

/// A bound listener that has not served its request yet.
pub struct BoundAuthServer {
    listener: TcpListener,
    path: String,
    max_wait: Duration,
    expected_state: Option<String>,
}

impl BoundAuthServer {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until the first request on the redirect path was answered or
    /// the maximum wait elapsed, then shuts the listener down.
    pub async fn wait(self) -> CallbackOutcome {
        let BoundAuthServer {
            listener,
            path,
            max_wait,
            expected_state,
        } = self;

        let (code_tx, code_rx) = oneshot::channel::<Option<String>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let session = Arc::new(Mutex::new(AuthSession {
            expected_state,
            responder: Some(code_tx),
        }));

        let app = Router::new()
            .route(&path, get(api::callback))
            .layer(Extension(session));

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let outcome = match timeout(max_wait, code_rx).await {
            Ok(Ok(Some(code))) => CallbackOutcome::Code(code),
            Ok(Ok(None)) | Ok(Err(_)) => CallbackOutcome::Missing,
            Err(_) => CallbackOutcome::TimedOut,
        };

        let _ = shutdown_tx.send(());
        let abort = server.abort_handle();
        if timeout(SHUTDOWN_GRACE, server).await.is_err() {
            abort.abort();
        }

        outcome
    }
}
