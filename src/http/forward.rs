//! Reverse proxying of a single request to a chosen backend.
//!
//! # Responsibilities
//! - Rewrite the request URI to target the backend
//! - Strip hop-by-hop headers and record the client in `X-Forwarded-For`
//! - Stream the backend response back unchanged

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    uri::{Authority, InvalidUri, InvalidUriParts, PathAndQuery, Scheme},
    Request, Uri, Version,
};
use axum::response::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::load_balancer::Backend;

/// Error forwarding a request to a backend.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid backend authority: {0}")]
    Authority(#[from] InvalidUri),

    #[error("invalid upstream uri: {0}")]
    Uri(#[from] InvalidUriParts),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Capability to send a request to a backend and return its response.
pub trait Forwarder: Send + Sync + 'static {
    fn forward(
        &self,
        backend: &Backend,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response, ForwardError>> + Send;
}

/// Headers that apply to a single connection and must not be proxied.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// HTTP forwarder backed by a pooled hyper client.
#[derive(Clone, Debug)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
}

impl HttpForwarder {
    /// Create a forwarder that gives up connecting to a backend after `connect_timeout`.
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_keepalive(Some(Duration::from_secs(30)));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

impl Forwarder for HttpForwarder {
    async fn forward(&self, backend: &Backend, request: Request<Body>) -> Result<Response, ForwardError> {
        let (mut parts, body) = request.into_parts();

        parts.uri = upstream_uri(&parts.uri, backend.address())?;
        // The pooled client speaks HTTP/1.1 to backends whatever the client used.
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            append_forwarded_for(&mut parts.headers, peer.ip());
        }

        let response = self.client.request(Request::from_parts(parts, body)).await?;
        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Point `uri` at `http://<address>`, keeping its path and query.
pub fn upstream_uri(uri: &Uri, address: &str) -> Result<Uri, ForwardError> {
    let mut uri_parts = uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(Authority::from_str(address)?);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    Ok(Uri::from_parts(uri_parts)?)
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_str(name.trim()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }

    // Keep websocket-style upgrades out; the balancer does not tunnel.
    headers.remove(header::UPGRADE);
}

/// Append the client address to `X-Forwarded-For`.
pub fn append_forwarded_for(headers: &mut HeaderMap, client: IpAddr) {
    let name = HeaderName::from_static("x-forwarded-for");
    let value = match headers.get(&name).and_then(|v| v.to_str().ok()) {
        Some(prior) if !prior.is_empty() => format!("{}, {}", prior, client),
        _ => client.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(name, value);
    }
}
