//! DTOs for the identity toolkit `accounts:lookup` exchange.

use serde::{Deserialize, Serialize};

use crate::domain::{ExternalIdentity, VerifiedIdentity};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LookupRequestDto<'a> {
    pub(super) id_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct LookupResponseDto {
    #[serde(default)]
    pub(super) users: Vec<AccountDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AccountDto {
    pub(super) local_id: String,
    pub(super) email: Option<String>,
    pub(super) display_name: Option<String>,
}

/// Why a decoded response could not become an identity.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum LookupError {
    NoAccount,
    InvalidId(String),
}

impl LookupResponseDto {
    pub(super) fn into_identity(self) -> Result<VerifiedIdentity, LookupError> {
        let account = self.users.into_iter().next().ok_or(LookupError::NoAccount)?;
        let uid = ExternalIdentity::new(account.local_id)
            .map_err(|err| LookupError::InvalidId(err.to_string()))?;
        Ok(VerifiedIdentity::new(uid, account.email, account.display_name))
    }
}
