//! Registry client construction and authenticated request building.

use std::time::Duration;

use ocimeta_core::{MetaError, Result};

use crate::auth::{TokenCache, DOCKER_AUTH_URL};
use crate::blob::ConfigBlob;
use crate::credentials::CredentialStore;
use crate::reference::{ImageReference, DOCKER_REGISTRY};

/// Client for the OCI Distribution HTTP API.
///
/// Owns the HTTP client, the credential store and the token cache as
/// private fields; construct once per process and share by reference.
pub struct RegistryClient {
    http: reqwest::Client,
    insecure: bool,
    credentials: Option<CredentialStore>,
    tokens: TokenCache,
    auth_url: String,
}

impl RegistryClient {
    /// Create a client with default settings (https, no credentials).
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> RegistryClientBuilder {
        RegistryClientBuilder::default()
    }

    /// Resolve an image reference down to its configuration blob.
    pub async fn image_config(&self, image: &ImageReference) -> Result<ConfigBlob> {
        let digest = self
            .resolve_config_digest(&image.registry, &image.name, image.resolve_reference())
            .await?;
        self.config_blob(&image.registry, &image.name, &digest).await
    }

    /// URL scheme for registry requests.
    pub(crate) fn scheme(&self) -> &'static str {
        if self.insecure {
            "http"
        } else {
            "https"
        }
    }

    /// Build a GET request for `url` carrying the authorization the
    /// `(registry, name)` pair requires.
    ///
    /// Docker Hub gets a pull-scoped bearer token (cached per
    /// repository); a failed token exchange fails the request before the
    /// registry is contacted. Other registries get the `.netrc` password
    /// for their host as a bearer token when an entry exists, and go
    /// unauthenticated otherwise.
    pub(crate) async fn authorized_get(
        &self,
        registry: &str,
        name: &str,
        url: &str,
    ) -> Result<reqwest::RequestBuilder> {
        tracing::debug!(method = "GET", url = %url, "Registry request");

        let request = self.http.get(url);

        if registry == DOCKER_REGISTRY {
            let token = self
                .tokens
                .get_or_fetch(&self.http, &self.auth_url, name)
                .await
                .map_err(|e| MetaError::AuthenticationFailed(e.to_string()))?;
            return Ok(request.bearer_auth(token));
        }

        if let Some(credential) = self.credentials.as_ref().and_then(|c| c.lookup(registry)) {
            return Ok(request.bearer_auth(&credential.token));
        }

        Ok(request)
    }
}

/// Builder for [`RegistryClient`].
#[derive(Default)]
pub struct RegistryClientBuilder {
    insecure: bool,
    credentials: Option<CredentialStore>,
    timeout: Option<Duration>,
    auth_url: Option<String>,
}

impl RegistryClientBuilder {
    /// Talk to registries over plain http instead of https.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Attach a credential store for non-Docker-Hub registries.
    pub fn credentials(mut self, store: CredentialStore) -> Self {
        self.credentials = Some(store);
        self
    }

    /// Overall per-request deadline. Without one, cancellation is the
    /// caller's: dropping an in-flight future aborts the request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Token service endpoint for Docker Hub pulls. Defaults to the
    /// public `auth.docker.io` service.
    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| MetaError::RequestError(e.to_string()))?;

        Ok(RegistryClient {
            http,
            insecure: self.insecure,
            credentials: self.credentials,
            tokens: TokenCache::default(),
            auth_url: self.auth_url.unwrap_or_else(|| DOCKER_AUTH_URL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_default_https() {
        let client = RegistryClient::new().unwrap();
        assert_eq!(client.scheme(), "https");
    }

    #[test]
    fn test_scheme_insecure_http() {
        let client = RegistryClient::builder().insecure(true).build().unwrap();
        assert_eq!(client.scheme(), "http");
    }

    #[tokio::test]
    async fn test_authorized_get_anonymous_without_credentials() {
        let client = RegistryClient::builder().insecure(true).build().unwrap();
        let request = client
            .authorized_get("example.com:5000", "library/app", "http://example.com:5000/v2/")
            .await
            .unwrap()
            .build()
            .unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_authorized_get_uses_netrc_token() {
        let store =
            CredentialStore::from_text("machine example.com:5000 login a password s3cr3t").unwrap();
        let client = RegistryClient::builder()
            .insecure(true)
            .credentials(store)
            .build()
            .unwrap();

        let request = client
            .authorized_get("example.com:5000", "library/app", "http://example.com:5000/v2/")
            .await
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer s3cr3t")
        );
    }

    #[tokio::test]
    async fn test_authorized_get_docker_hub_attaches_pull_token() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .and(query_param("scope", "repository:library/nginx:pull"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"token": "hub-token"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = RegistryClient::builder()
            .auth_url(format!("{}/token", server.uri()))
            .build()
            .unwrap();

        // Two requests, one token exchange: the second hits the cache.
        for _ in 0..2 {
            let request = client
                .authorized_get(DOCKER_REGISTRY, "library/nginx", "https://example.invalid/v2/")
                .await
                .unwrap()
                .build()
                .unwrap();
            assert_eq!(
                request
                    .headers()
                    .get(reqwest::header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok()),
                Some("Bearer hub-token")
            );
        }
    }

    #[tokio::test]
    async fn test_authorized_get_docker_hub_fails_on_bad_exchange() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = RegistryClient::builder()
            .auth_url(format!("{}/token", server.uri()))
            .build()
            .unwrap();

        let error = client
            .authorized_get(DOCKER_REGISTRY, "library/nginx", "https://example.invalid/v2/")
            .await
            .unwrap_err();
        assert!(matches!(error, MetaError::AuthenticationFailed(_)));
    }
}
