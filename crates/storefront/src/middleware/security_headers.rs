//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to API responses. The image proxy
//! endpoints are skipped: their whole purpose is to be embeddable from other
//! origins, and they set their own cross-origin and caching headers.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

/// Paths that must stay cross-origin friendly.
const PROXY_PATHS: &[&str] = &["/api/image-proxy", "/api/b2-proxy"];

/// Whether the path is served by an image proxy.
#[must_use]
pub fn is_proxy_path(path: &str) -> bool {
    PROXY_PATHS.contains(&path.trim_end_matches('/'))
}

/// Add security headers to every non-proxy response.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy: default-src 'none'; frame-ancestors 'none'` -
///   JSON responses never load anything
/// - `Cache-Control: no-store, max-age=0` - unless the handler set its own
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `X-DNS-Prefetch-Control: off` - Prevent DNS prefetch leakage
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let skip = is_proxy_path(request.uri().path());
    let mut response = next.run(request).await;
    if skip {
        return response;
    }

    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    // Catalog responses may choose their own caching
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_proxy_path() {
        assert!(is_proxy_path("/api/image-proxy"));
        assert!(is_proxy_path("/api/b2-proxy/"));
        assert!(!is_proxy_path("/api/products"));
        assert!(!is_proxy_path("/api/image-proxy-extra"));
    }
}
