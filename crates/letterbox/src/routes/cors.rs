//! Origin allow-list enforcement and CORS headers.
//!
//! Unlike a permissive CORS layer, a disallowed origin is refused outright
//! with 403 before the handler runs.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Configured origin allow-list
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    /// An empty list allows every origin
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    /// `Access-Control-Allow-Origin` value for `origin`, `None` when refused
    pub fn allow(&self, origin: &str) -> Option<HeaderValue> {
        if self.allowed.is_empty() {
            return Some(HeaderValue::from_static("*"));
        }
        if self.allowed.iter().any(|allowed| allowed == origin) {
            return HeaderValue::from_str(origin).ok();
        }
        None
    }
}

/// Methods and headers advertised for a group of routes
#[derive(Debug, Clone, Copy)]
pub struct CorsScope {
    pub methods: &'static str,
    pub headers: &'static str,
}

pub const PUBLIC_POST: CorsScope = CorsScope {
    methods: "POST, OPTIONS",
    headers: "Content-Type",
};

pub const ADMIN_GET: CorsScope = CorsScope {
    methods: "GET, OPTIONS",
    headers: "Content-Type, x-admin-key",
};

pub const ADMIN_POST: CorsScope = CorsScope {
    methods: "POST, OPTIONS",
    headers: "Content-Type, x-admin-key",
};

/// Middleware: refuse disallowed origins, answer preflights, tag responses
pub async fn enforce_origin(
    State((policy, scope)): State<(Arc<OriginPolicy>, CorsScope)>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let Some(allow_origin) = policy.allow(origin) else {
        tracing::debug!(origin = %origin, path = %request.uri().path(), "Origin refused");
        return ApiError::OriginNotAllowed.into_response();
    };

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    if allow_origin != "*" {
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(scope.methods));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(scope.headers));

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_allows_any_origin() {
        let policy = OriginPolicy::new(Vec::new());
        assert_eq!(policy.allow("https://anything.example").unwrap(), "*");
        assert_eq!(policy.allow("").unwrap(), "*");
    }

    #[test]
    fn test_listed_origin_is_echoed() {
        let policy = OriginPolicy::new(vec!["https://site.example".to_string()]);
        assert_eq!(
            policy.allow("https://site.example").unwrap(),
            "https://site.example"
        );
        assert!(policy.allow("https://evil.example").is_none());
        // No Origin header at all is refused when a list is configured
        assert!(policy.allow("").is_none());
    }
}
