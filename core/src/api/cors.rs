//! Origin allow-list applied to every response.
//!
//! Disallowed or missing origins get the literal `null` rather than no
//! header at all.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
    VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use reqwest::Url;

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    /// Hosts allowed verbatim.
    pub exact_hosts: Vec<String>,
    /// Domains allowed along with any of their subdomains.
    pub domains: Vec<String>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            exact_hosts: vec!["localhost".into(), "127.0.0.1".into()],
            domains: vec![
                "lovableproject.com".into(),
                "lovable.app".into(),
                "onrender.com".into(),
            ],
        }
    }
}

impl CorsPolicy {
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domains.push(domain.into());
        self
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        let Ok(url) = Url::parse(origin) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        if self.exact_hosts.iter().any(|h| h.eq_ignore_ascii_case(&host)) {
            return true;
        }
        self.domains.iter().any(|domain| {
            let domain = domain.to_ascii_lowercase();
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Value for `Access-Control-Allow-Origin` given the request's `Origin`.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        origin
            .filter(|value| value.to_str().is_ok_and(|o| !o.is_empty() && self.is_allowed(o)))
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("null"))
    }

    fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin(origin));
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
}

/// Answers preflight requests directly and decorates everything else.
pub async fn cors(State(policy): State<Arc<CorsPolicy>>, request: Request, next: Next) -> Response {
    let origin = request.headers().get(ORIGIN).cloned();
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        policy.apply(origin.as_ref(), response.headers_mut());
        return response;
    }
    let mut response = next.run(request).await;
    policy.apply(origin.as_ref(), response.headers_mut());
    response
}
