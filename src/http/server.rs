//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared registry, classifier, guard and resolver from config
//! - Wire up middleware (request ID, tracing, timeout, client address, guard)
//! - Serve the main router and, when enabled, the admin router
//! - Apply config reloads to the guard policy and resolver

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header::USER_AGENT, HeaderMap, Request},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, AdminState};
use crate::agent::{ClientClassifier, ClientKind, PatternRegistry};
use crate::config::IdentityConfig;
use crate::http::middleware::{
    client_addr_middleware, client_guard_middleware, shared_resolver, ClientAddr, ClientGuard,
    SharedResolver,
};
use crate::lifecycle::shutdown;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PatternRegistry>,
    pub classifier: ClientClassifier,
    pub guard: ClientGuard,
    pub resolver: SharedResolver,
}

impl AppState {
    /// Build state from `config`, seeding the registry from its pattern edits.
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::with_registry(config, Arc::new(config.patterns.build()))
    }

    /// Build state around an existing registry.
    pub fn with_registry(config: &IdentityConfig, registry: Arc<PatternRegistry>) -> Self {
        let classifier = ClientClassifier::new(registry.clone());
        Self {
            guard: ClientGuard::new(classifier.clone(), config.guard.clone()),
            resolver: shared_resolver(config.resolver.build()),
            registry,
            classifier,
        }
    }

    /// Apply the reloadable parts of `config`. Pattern lists are left alone.
    pub fn apply(&self, config: &IdentityConfig) {
        self.resolver.store(Arc::new(config.resolver.build()));
        self.guard.reload(config.guard.clone());
        tracing::info!(
            trusted_headers = config.resolver.trusted_headers.len(),
            policy = config.guard.name(),
            "Configuration reloaded"
        );
    }
}

/// Client identity server.
pub struct HttpServer {
    router: Router,
    admin_router: Option<Router>,
    config: IdentityConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: IdentityConfig) -> Self {
        let state = AppState::from_config(&config);
        Self::with_state(config, state)
    }

    /// Create a server around prepared state.
    pub fn with_state(config: IdentityConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state.clone());
        let admin_router = config.admin.enabled.then(|| {
            setup_admin_router(AdminState::new(state.registry.clone(), &config.admin.api_key))
        });

        Self {
            router,
            admin_router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &IdentityConfig, state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami_handler))
            .route("/health", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                state.guard.clone(),
                client_guard_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                state.resolver.clone(),
                client_addr_middleware,
            ))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The main router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The admin router, when the admin API is enabled.
    pub fn admin_router(&self) -> Option<Router> {
        self.admin_router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` are applied live. The
    /// admin API, when enabled, binds its own listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<IdentityConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, policy = self.config.guard.name(), "HTTP server starting");

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                state.apply(&config);
            }
        });

        let admin_task = match self.admin_router {
            Some(admin) => {
                let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
                tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
                let rx = shutdown.resubscribe();
                Some(tokio::spawn(async move {
                    axum::serve(admin_listener, admin)
                        .with_graceful_shutdown(shutdown::wait(rx))
                        .await
                }))
            }
            None => None,
        };

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        if let Some(task) = admin_task {
            match task.await {
                Ok(Err(e)) => tracing::error!(error = %e, "Admin API server failed"),
                Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
                Ok(Ok(())) => {}
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Response body of `/whoami`.
#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub address: String,
    pub valid: bool,
    pub private: bool,
    pub user_agent: String,
    pub kind: ClientKind,
}

async fn whoami_handler(
    State(state): State<AppState>,
    Extension(addr): Extension<ClientAddr>,
    headers: HeaderMap,
) -> Json<WhoAmI> {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    Json(WhoAmI {
        valid: addr.is_valid(),
        private: addr.is_private(),
        kind: state.classifier.kind(&user_agent),
        address: addr.0,
        user_agent,
    })
}
