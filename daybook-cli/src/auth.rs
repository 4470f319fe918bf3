//! Google credentials for the Sheets API.
//!
//! Either a ready bearer token in `GOOGLE_ACCESS_TOKEN`, or (with the
//! `service-account` feature) a service-account key in
//! `GOOGLE_CREDENTIALS_JSON` exchanged for a spreadsheets-scoped token.

use anyhow::Result;
use daybook_core::Error;

pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_ACCESS_TOKEN";
pub const CREDENTIALS_JSON_VAR: &str = "GOOGLE_CREDENTIALS_JSON";

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub async fn google_access_token() -> Result<String> {
    if let Some(token) = env_non_empty(ACCESS_TOKEN_VAR) {
        return Ok(token.trim().to_string());
    }

    #[cfg(feature = "service-account")]
    if let Some(json) = env_non_empty(CREDENTIALS_JSON_VAR) {
        return service_account::access_token(&json).await;
    }

    #[cfg(not(feature = "service-account"))]
    if env_non_empty(CREDENTIALS_JSON_VAR).is_some() {
        return Err(Error::configuration(format!(
            "{CREDENTIALS_JSON_VAR} is set but this build lacks the service-account feature; set {ACCESS_TOKEN_VAR} instead"
        ))
        .into());
    }

    Err(Error::configuration(format!(
        "missing Google credentials: set {ACCESS_TOKEN_VAR} or {CREDENTIALS_JSON_VAR}"
    ))
    .into())
}

#[cfg(feature = "service-account")]
mod service_account {
    use anyhow::{Context, Result, anyhow};
    use daybook_core::Error;
    use daybook_sheets::google::SPREADSHEETS_SCOPE;
    use yup_oauth2::{ServiceAccountAuthenticator, parse_service_account_key};

    pub async fn access_token(credentials_json: &str) -> Result<String> {
        let key = parse_service_account_key(credentials_json)
            .map_err(|e| Error::configuration(format!("invalid Google credentials JSON: {e}")))?;
        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("building service account authenticator")?;
        let token = auth
            .token(&[SPREADSHEETS_SCOPE])
            .await
            .context("requesting Google access token")?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("token response carried no access token"))
    }
}
