//! Response headers for a JSON-only API
//!
//! Nothing served here is meant to be framed, sniffed or cached by shared
//! caches: responses carry student records and tokens.

use axum::{extract::Request, middleware::Next, response::Response};
use http::{header, HeaderValue};

const API_HEADERS: &[(header::HeaderName, &str)] = &[
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::CACHE_CONTROL, "no-store"),
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'none'; frame-ancestors 'none'",
    ),
];

/// Middleware that stamps the API response headers, leaving any header a
/// handler already set untouched.
pub async fn add_security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in API_HEADERS {
        if !headers.contains_key(name) {
            headers.insert(name.clone(), HeaderValue::from_static(*value));
        }
    }

    response
}
