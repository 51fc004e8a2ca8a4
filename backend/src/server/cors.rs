//! Cross-origin policy for the browser client.

use actix_cors::Cors;
use actix_web::http::{Method, header};

use onemore::domain::TRACE_ID_HEADER;

/// Origin entry that admits any caller.
pub const ANY_ORIGIN: &str = "*";

const PREFLIGHT_MAX_AGE_SECS: usize = 3600;

/// Build the CORS middleware for the configured origins.
///
/// A `*` entry admits every origin; the request origin is echoed back so
/// credentialed requests keep working. Other entries are matched exactly.
pub fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([TRACE_ID_HEADER])
        .supports_credentials()
        .max_age(PREFLIGHT_MAX_AGE_SECS);

    if origins.iter().any(|origin| origin == ANY_ORIGIN) {
        return cors.allow_any_origin();
    }
    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
