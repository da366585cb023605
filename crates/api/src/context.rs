use axum::extract::{ConnectInfo, OriginalUri, Request};
use axum::http::Method;
use std::net::SocketAddr;

/// What the error normalizer and request logger know about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    method: Method,
    path: String,
    original_url: String,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            original_url: original_url.into(),
        }
    }

    /// Capture the context before the request is handed to the router.
    ///
    /// Uses the URI the client sent, not the one seen inside nested routers.
    pub fn from_request(req: &Request) -> Self {
        let uri = req
            .extensions()
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri)
            .unwrap_or_else(|| req.uri());

        let original_url = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        Self::new(req.method().clone(), uri.path(), original_url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path plus query string.
    pub fn original_url(&self) -> &str {
        &self.original_url
    }
}

/// Client address: first `x-forwarded-for` entry, else the peer, else `"unknown"`.
pub fn client_ip(req: &Request) -> String {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(uri: &str) -> Request {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn original_url_keeps_the_query_string() {
        let ctx = RequestContext::from_request(&request("/api/v1/users?page=2"));
        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.path(), "/api/v1/users");
        assert_eq!(ctx.original_url(), "/api/v1/users?page=2");
    }

    #[test]
    fn original_uri_extension_wins_over_the_request_uri() {
        let mut req = request("/users");
        req.extensions_mut()
            .insert(OriginalUri("/api/v1/users".parse().unwrap()));
        assert_eq!(RequestContext::from_request(&req).original_url(), "/api/v1/users");
    }

    #[test]
    fn client_ip_prefers_forwarded_header_then_peer() {
        let mut req = request("/");
        assert_eq!(client_ip(&req), "unknown");

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 4000))));
        assert_eq!(client_ip(&req), "10.0.0.7");

        req.headers_mut()
            .insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&req), "203.0.113.9");
    }
}
