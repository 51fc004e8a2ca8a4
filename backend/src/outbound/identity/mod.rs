//! Identity provider adapters.

mod dto;
mod http_verifier;

pub use http_verifier::{DEFAULT_IDENTITY_ENDPOINT, IdentityToolkitVerifier};
