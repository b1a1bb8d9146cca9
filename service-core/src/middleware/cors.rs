//! Cross-origin policy built from an explicit list of allowed origins.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Wildcard entry that opts into allowing every origin.
pub const ANY_ORIGIN: &str = "*";

/// Builds the CORS layer for the given origins.
///
/// An empty list grants no cross-origin access. A `*` entry allows any
/// origin; otherwise only the listed origins are echoed back. Entries that are
/// not valid header values are skipped.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.iter().any(|o| o == ANY_ORIGIN) {
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{}': {}", o, e);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
