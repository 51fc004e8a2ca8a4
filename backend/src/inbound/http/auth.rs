//! Bearer authentication for HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by concentrating
//! credential parsing and caller resolution here.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{BearerToken, BearerTokenError, Error, User};

use super::state::HttpState;

pub(crate) fn map_bearer_error(error: BearerTokenError) -> Error {
    match error {
        BearerTokenError::Missing => Error::unauthorized("missing bearer token"),
        BearerTokenError::Malformed => Error::unauthorized("malformed authorization header"),
    }
}

/// Parse the `Authorization` header into a bearer token.
pub(crate) fn bearer_token(req: &HttpRequest) -> Result<BearerToken, Error> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| Error::unauthorized("malformed authorization header"))?,
        ),
        None => None,
    };
    BearerToken::from_authorization_header(header).map_err(map_bearer_error)
}

/// The caller resolved from the request's bearer credential.
///
/// Extraction fails with `401` when the header is missing or malformed, or
/// when the identity provider rejects the token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let token = token?;
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let user = state.login.resolve(&token).await?;
            Ok(AuthenticatedUser(user))
        })
    }
}
