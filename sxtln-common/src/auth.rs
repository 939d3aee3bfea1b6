//! Session management: login, logout, API keys and credential checks

use crate::api::Api;
use crate::config::{Config, ConfigStore};
use crate::error::{Error, Result};
use crate::value::Document;

const LOGIN_ENDPOINT: &str = "/auth/login";
const CHECK_ENDPOINT: &str = "/auth/check";

/// Exchange user credentials for a session token and persist it
pub async fn login<A: Api + ?Sized>(
    api: &A,
    config: &mut Config,
    store: &ConfigStore,
    user: &str,
    password: &str,
) -> Result<Document> {
    let request = Document::new()
        .with("login", user)
        .with("password", password);

    let response = api.submit(LOGIN_ENDPOINT, Some(&request)).await?.body;
    config.token = response.require_str("token")?.to_string();
    store.save(config)?;

    tracing::info!(user, "logged in");
    Ok(response)
}

/// Forget the session token
pub fn logout(config: &mut Config, store: &ConfigStore) -> Result<Document> {
    config.token.clear();
    store.save(config)?;
    config.to_document()
}

pub fn set_api_key(config: &mut Config, store: &ConfigStore, api_key: &str) -> Result<Document> {
    config.api_key = api_key.to_string();
    store.save(config)?;
    config.to_document()
}

/// `{ok: true}` when the active credential is accepted, `{ok: false}` on a
/// client error. Server errors and transport failures become
/// [`Error::TokenInvalid`], keeping the status code when there is one.
pub async fn check<A: Api + ?Sized>(api: &A) -> Result<Document> {
    let ok = match api.fetch(CHECK_ENDPOINT).await {
        // a 200 is enough, whatever the body looks like
        Ok(_) | Err(Error::MalformedBody { .. }) => true,
        Err(Error::UnexpectedStatus { status, .. }) if (400..500).contains(&status) => false,
        Err(e @ (Error::UnexpectedStatus { .. } | Error::Transport(_))) => {
            tracing::debug!(error = %e, "credential check failed");
            return Err(Error::TokenInvalid { status: e.status() });
        }
        Err(e) => return Err(e),
    };
    Ok(Document::new().with("ok", ok))
}
