//! Client address labelling middleware.
//!
//! Resolves the originating address once per request and stores it as a
//! [`ClientAddr`] extension for handlers and later layers.

use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::ip::{self, AddressResolver};

/// Resolver shared between the middleware and config reloads.
pub type SharedResolver = Arc<ArcSwap<AddressResolver>>;

/// Resolved client address. Not validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

impl ClientAddr {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        ip::is_valid(&self.0)
    }

    pub fn is_private(&self) -> bool {
        ip::is_private(&self.0)
    }
}

impl std::fmt::Display for ClientAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn shared_resolver(resolver: AddressResolver) -> SharedResolver {
    Arc::new(ArcSwap::from_pointee(resolver))
}

/// Attach a [`ClientAddr`] to the request.
///
/// The peer endpoint comes from `ConnectInfo<SocketAddr>`; without it the
/// fallback is empty.
pub async fn client_addr_middleware(
    State(resolver): State<SharedResolver>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let addr = resolver.load().resolve(request.headers(), &peer);
    tracing::debug!(client_addr = %addr, peer = %peer, "Client address resolved");

    request.extensions_mut().insert(ClientAddr(addr));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Extension, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(resolver: SharedResolver) -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(addr): Extension<ClientAddr>| async move { addr.0 }),
            )
            .layer(middleware::from_fn_with_state(resolver, client_addr_middleware))
    }

    async fn resolve(app: Router, request: Request<Body>) -> String {
        let response = app.oneshot(request).await.unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_header_address_attached() {
        let request = Request::builder()
            .uri("/")
            .header("X-Forwarded-For", "203.0.113.3, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        let addr = resolve(app(shared_resolver(AddressResolver::default())), request).await;
        assert_eq!(addr, "203.0.113.3");
    }

    #[tokio::test]
    async fn test_peer_fallback_from_connect_info() {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let peer: SocketAddr = "198.51.100.7:51000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));

        let addr = resolve(app(shared_resolver(AddressResolver::default())), request).await;
        assert_eq!(addr, "198.51.100.7");
    }

    #[tokio::test]
    async fn test_no_connect_info_is_empty() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let addr = resolve(app(shared_resolver(AddressResolver::default())), request).await;
        assert_eq!(addr, "");
    }

    #[tokio::test]
    async fn test_resolver_reload() {
        let resolver = shared_resolver(AddressResolver::default());
        let router = app(resolver.clone());
        let build = || {
            let mut request = Request::builder()
                .uri("/")
                .header("CF-Connecting-IP", "203.0.113.1")
                .body(Body::empty())
                .unwrap();
            request
                .extensions_mut()
                .insert(ConnectInfo("[2001:db8::5]:443".parse::<SocketAddr>().unwrap()));
            request
        };

        assert_eq!(resolve(router.clone(), build()).await, "203.0.113.1");

        resolver.store(Arc::new(AddressResolver::peer_only()));
        assert_eq!(resolve(router, build()).await, "2001:db8::5");
    }

    #[test]
    fn test_client_addr_helpers() {
        let addr = ClientAddr("10.1.2.3".to_string());
        assert!(addr.is_valid());
        assert!(addr.is_private());
        assert_eq!(addr.to_string(), "10.1.2.3");
        assert!(!ClientAddr(String::new()).is_valid());
    }
}
