//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `ONEMORE_*` environment variables and
//! configuration files, in that order of precedence.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use onemore::domain::ProvisioningPolicy;
use onemore::outbound::identity::DEFAULT_IDENTITY_ENDPOINT;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_IDENTITY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

/// Runtime configuration for the server binary.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ONEMORE")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string; absent selects the in-memory store.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Skip applying pending migrations at startup.
    #[ortho_config(default = false)]
    pub skip_migrations: bool,
    /// Identity toolkit API key; absent selects the fixture verifier.
    pub identity_api_key: Option<String>,
    /// Identity toolkit lookup endpoint.
    pub identity_endpoint: Option<String>,
    /// Timeout for identity provider calls, in seconds.
    pub identity_timeout_secs: Option<u64>,
    /// Refuse logins from identities without a local user.
    #[ortho_config(default = false)]
    pub require_provisioned_users: bool,
    /// Serve the fixture verifier from a release build when no API key is set.
    #[ortho_config(default = false)]
    pub allow_fixture_identity: bool,
    /// Comma-separated browser origins; `*` admits any origin.
    pub cors_origins: Option<String>,
}

impl std::fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("db_max_connections", &self.db_max_connections)
            .field("skip_migrations", &self.skip_migrations)
            .field(
                "identity_api_key",
                &self.identity_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("identity_endpoint", &self.identity_endpoint)
            .field("identity_timeout_secs", &self.identity_timeout_secs)
            .field("require_provisioned_users", &self.require_provisioned_users)
            .field("allow_fixture_identity", &self.allow_fixture_identity)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl AppSettings {
    /// Parse the configured bind address, falling back to the default.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
    }

    /// Database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_deref())
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Identity provider API key, ignoring blank values.
    pub fn identity_api_key(&self) -> Option<&str> {
        non_blank(self.identity_api_key.as_deref())
    }

    pub fn identity_endpoint(&self) -> &str {
        non_blank(self.identity_endpoint.as_deref()).unwrap_or(DEFAULT_IDENTITY_ENDPOINT)
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_secs(
            self.identity_timeout_secs
                .unwrap_or(DEFAULT_IDENTITY_TIMEOUT_SECS),
        )
    }

    pub fn provisioning_policy(&self) -> ProvisioningPolicy {
        if self.require_provisioned_users {
            ProvisioningPolicy::RequireExisting
        } else {
            ProvisioningPolicy::AutoProvision
        }
    }

    /// Browser origins allowed by CORS, defaulting to the local dev server.
    pub fn cors_origins(&self) -> Vec<String> {
        let Some(raw) = non_blank(self.cors_origins.as_deref()) else {
            return DEFAULT_CORS_ORIGINS.into_iter().map(str::to_owned).collect();
        };
        raw.split(',')
            .filter_map(|origin| non_blank(Some(origin)))
            .map(|origin| origin.trim_end_matches('/').to_owned())
            .collect()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
