//! Reqwest-backed identity verifier.
//!
//! Exchanges a bearer token for the account it belongs to using the identity
//! toolkit `accounts:lookup` endpoint. The adapter owns transport concerns
//! only: request timeout, status mapping and JSON decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::{LookupError, LookupRequestDto, LookupResponseDto};
use crate::domain::ports::{IdentityVerificationError, IdentityVerifier};
use crate::domain::{BearerToken, VerifiedIdentity};

/// Default identity toolkit lookup endpoint.
pub const DEFAULT_IDENTITY_ENDPOINT: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

/// Identity verifier talking to one identity toolkit endpoint.
pub struct IdentityToolkitVerifier {
    client: Client,
    endpoint: Url,
}

impl IdentityToolkitVerifier {
    /// Build a verifier; the API key is attached as the `key` query parameter.
    ///
    /// ```rust,no_run
    /// use std::time::Duration;
    /// use onemore::outbound::identity::{DEFAULT_IDENTITY_ENDPOINT, IdentityToolkitVerifier};
    ///
    /// let endpoint = DEFAULT_IDENTITY_ENDPOINT.parse().expect("valid url");
    /// let verifier = IdentityToolkitVerifier::new(endpoint, "api-key", Duration::from_secs(10));
    /// assert!(verifier.is_ok());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(mut endpoint: Url, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        endpoint.query_pairs_mut().append_pair("key", api_key);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl IdentityVerifier for IdentityToolkitVerifier {
    async fn verify(
        &self,
        token: &BearerToken,
    ) -> Result<VerifiedIdentity, IdentityVerificationError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&LookupRequestDto {
                id_token: token.expose(),
            })
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_identity(body.as_ref())
    }
}

fn parse_identity(body: &[u8]) -> Result<VerifiedIdentity, IdentityVerificationError> {
    let decoded: LookupResponseDto = serde_json::from_slice(body).map_err(|error| {
        IdentityVerificationError::decode(format!("invalid lookup payload: {error}"))
    })?;
    decoded.into_identity().map_err(|error| match error {
        LookupError::NoAccount => IdentityVerificationError::rejected("token matches no account"),
        LookupError::InvalidId(message) => IdentityVerificationError::decode(message),
    })
}

/// The request URL carries the API key, so it is stripped before formatting.
fn map_transport_error(error: reqwest::Error) -> IdentityVerificationError {
    let error = error.without_url();
    if error.is_timeout() {
        IdentityVerificationError::unavailable(format!("timed out: {error}"))
    } else {
        IdentityVerificationError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityVerificationError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            IdentityVerificationError::unavailable(message)
        }
        _ if status.is_client_error() => IdentityVerificationError::rejected(message),
        _ => IdentityVerificationError::unavailable(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Non-network coverage for status mapping and payload decoding.

    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_first_account_into_identity() {
        let body = r#"{
            "kind": "identitytoolkit#GetAccountInfoResponse",
            "users": [
                { "localId": "uid-7", "email": "kat@example.com", "displayName": "Kat" }
            ]
        }"#;

        let identity = parse_identity(body.as_bytes()).expect("payload decodes");
        assert_eq!(identity.external_identity().as_ref(), "uid-7");
        assert_eq!(identity.email(), Some("kat@example.com"));
        assert_eq!(identity.display_name(), Some("Kat"));
    }

    #[test]
    fn missing_profile_fields_are_absent() {
        let identity = parse_identity(br#"{"users":[{"localId":"uid-8"}]}"#)
            .expect("payload decodes");
        assert_eq!(identity.email(), None);
        assert_eq!(identity.display_name(), None);
    }

    #[rstest]
    #[case::no_users(br#"{"users":[]}"#.as_slice())]
    #[case::users_omitted(br#"{}"#.as_slice())]
    fn empty_account_list_is_rejected(#[case] body: &[u8]) {
        let error = parse_identity(body).expect_err("no account");
        assert!(matches!(error, IdentityVerificationError::Rejected { .. }));
    }

    #[rstest]
    #[case::not_json(b"<html>".as_slice())]
    #[case::blank_uid(br#"{"users":[{"localId":"  "}]}"#.as_slice())]
    fn undecodable_payloads_are_decode_errors(#[case] body: &[u8]) {
        let error = parse_identity(body).expect_err("decode should fail");
        assert!(matches!(error, IdentityVerificationError::Decode { .. }));
    }

    #[rstest]
    #[case::bad_request(StatusCode::BAD_REQUEST, true)]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, true)]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, false)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, false)]
    #[case::bad_gateway(StatusCode::BAD_GATEWAY, false)]
    fn maps_statuses_to_rejected_or_unavailable(
        #[case] status: StatusCode,
        #[case] rejected: bool,
    ) {
        let error = map_status_error(status, br#"{"error":{"message":"INVALID_ID_TOKEN"}}"#);
        if rejected {
            assert!(matches!(error, IdentityVerificationError::Rejected { .. }));
        } else {
            assert!(matches!(error, IdentityVerificationError::Unavailable { .. }));
        }
    }

    #[test]
    fn status_message_includes_compacted_body() {
        let error = map_status_error(StatusCode::BAD_REQUEST, b"  INVALID   ID\nTOKEN ");
        assert_eq!(
            error.to_string(),
            "identity token rejected: status 400: INVALID ID TOKEN"
        );
    }

    #[test]
    fn api_key_is_attached_to_endpoint() {
        let endpoint: Url = DEFAULT_IDENTITY_ENDPOINT.parse().expect("valid url");
        let verifier = IdentityToolkitVerifier::new(endpoint, "k-1", Duration::from_secs(1))
            .expect("client builds");
        assert_eq!(verifier.endpoint.query(), Some("key=k-1"));
    }

    #[tokio::test]
    async fn transport_failures_do_not_echo_the_api_key() {
        let endpoint: Url = "http://127.0.0.1:1/v1/accounts:lookup"
            .parse()
            .expect("valid url");
        let verifier =
            IdentityToolkitVerifier::new(endpoint, "SECRET-API-KEY", Duration::from_secs(2))
                .expect("client builds");
        let token = BearerToken::new("some-token").expect("token");

        let error = verifier.verify(&token).await.expect_err("nothing listens on port 1");

        assert!(matches!(error, IdentityVerificationError::Unavailable { .. }));
        let message = error.to_string();
        assert!(!message.contains("SECRET-API-KEY"), "leaked key: {message}");
        assert!(!message.contains("key="), "leaked query: {message}");
    }
}
