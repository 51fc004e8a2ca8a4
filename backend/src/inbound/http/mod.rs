//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod counters;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::{Scope, web};

pub use error::{ApiResult, json_error_handler};

/// Versioned API scope with every authenticated and login endpoint mounted.
///
/// The caller supplies `web::Data<HttpState>` on the enclosing app.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use onemore::inbound::http::api_scope;
///
/// let _app = App::new().service(api_scope());
/// ```
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(users::login)
        .service(counters::list_counters)
        .service(counters::create_counter)
        .service(counters::get_counter)
        .service(counters::update_counter)
        .service(counters::delete_counter)
        .service(counters::increment)
        .service(counters::decrement)
        .service(counters::list_events)
}
