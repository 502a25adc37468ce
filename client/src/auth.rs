//! Docker Hub bearer-token exchange and in-memory token cache.
//!
//! Docker Hub requires a pull-scoped bearer token even for anonymous
//! access; the token service hands one out per repository.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Deserialize;

use ocimeta_core::{MetaError, Result};

/// Docker Hub token service endpoint.
pub(crate) const DOCKER_AUTH_URL: &str = "https://auth.docker.io/token";

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Process-lifetime cache of pull tokens, keyed by repository name.
///
/// No expiry tracking: a token fetched once is reused for the rest of
/// the process. The check-then-fetch-then-store sequence is not atomic,
/// so concurrent callers may fetch twice for the same repository; both
/// results are valid and the last store wins.
#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    tokens: Mutex<HashMap<String, String>>,
}

impl TokenCache {
    /// Return the cached pull token for `name`, fetching it from the
    /// token service on a miss.
    pub(crate) async fn get_or_fetch(
        &self,
        http: &reqwest::Client,
        auth_url: &str,
        name: &str,
    ) -> Result<String> {
        if let Some(token) = self.tokens.lock().get(name) {
            return Ok(token.clone());
        }

        let token = fetch_pull_token(http, auth_url, name).await?;
        self.tokens.lock().insert(name.to_string(), token.clone());
        Ok(token)
    }
}

/// Request a pull-scoped token for repository `name` from the token
/// service.
async fn fetch_pull_token(http: &reqwest::Client, auth_url: &str, name: &str) -> Result<String> {
    let response = http
        .get(auth_url)
        .query(&[
            ("service", "registry.docker.io"),
            ("scope", &format!("repository:{name}:pull")),
        ])
        .send()
        .await
        .map_err(|e| MetaError::AuthServiceUnavailable(e.to_string()))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(MetaError::UnexpectedStatus(status.as_u16()));
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| MetaError::MalformedResponse(e.to_string()))?;

    tracing::debug!(repository = name, "Fetched registry pull token");

    Ok(body.token)
}
