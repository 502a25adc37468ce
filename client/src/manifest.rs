//! Manifest content negotiation.
//!
//! Resolves a reference to the digest of the image's configuration blob
//! via `GET /v2/{name}/manifests/{reference}`. Registries are
//! inconsistent about which manifest flavor they return for a given
//! reference, so two Accept orderings are tried before giving up.

use serde::Deserialize;

use ocimeta_core::{MetaError, Result};

use crate::client::RegistryClient;

pub(crate) const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub(crate) const MANIFEST_LIST_V2: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";
pub(crate) const OCI_INDEX_V1: &str = "application/vnd.oci.image.index.v1+json";
pub(crate) const OCI_MANIFEST_V1: &str = "application/vnd.oci.image.manifest.v1+json";

/// Accept ordering that favors a single-image manifest.
const ACCEPT_SINGLE_FIRST: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.oci.image.manifest.v1+json";

/// Accept ordering that favors a manifest list.
const ACCEPT_LIST_FIRST: &str = "application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json";

/// Nested-index hop limit for the list-fetch path.
const MAX_INDEX_DEPTH: usize = 8;

/// Single-platform manifest: only the config digest matters here.
#[derive(Deserialize)]
struct Manifest {
    config: ManifestConfig,
}

#[derive(Deserialize)]
struct ManifestConfig {
    digest: String,
}

/// Multi-platform manifest index.
#[derive(Deserialize)]
struct ManifestIndex {
    #[serde(default)]
    manifests: Vec<IndexEntry>,
}

#[derive(Deserialize)]
struct IndexEntry {
    digest: String,
}

/// Structured error body registries return on non-200 responses.
#[derive(Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

impl ErrorResponse {
    /// Join all server-supplied messages into one string.
    pub(crate) fn joined(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Turn a non-200 registry response into an error, decoding the
/// structured error body.
pub(crate) async fn error_from_response(response: reqwest::Response) -> MetaError {
    let status = response.status().as_u16();
    match response.json::<ErrorResponse>().await {
        Ok(body) => MetaError::RegistryError {
            status,
            messages: body.joined(),
        },
        Err(e) => MetaError::DecodeError(e.to_string()),
    }
}

fn content_type(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| MetaError::DecodeError(e.to_string()))
}

impl RegistryClient {
    /// Resolve `reference` to the digest of the image's configuration
    /// blob.
    ///
    /// Tries the single-manifest-first negotiation, then the
    /// list-first negotiation on any error; the second attempt's error
    /// is returned when both fail. Callers must not assume which flavor
    /// succeeded.
    pub async fn resolve_config_digest(
        &self,
        registry: &str,
        name: &str,
        reference: &str,
    ) -> Result<String> {
        match self
            .config_digest_single_first(registry, name, reference)
            .await
        {
            Ok(digest) => Ok(digest),
            Err(first) => {
                tracing::debug!(
                    error = %first,
                    "Single-first negotiation failed, retrying list-first"
                );
                self.config_digest_list_first(registry, name, reference)
                    .await
            }
        }
    }

    /// Fetch the manifest endpoint with the given Accept ordering,
    /// mapping non-200 responses to errors.
    async fn fetch_manifest(
        &self,
        registry: &str,
        name: &str,
        reference: &str,
        accept: &str,
    ) -> Result<reqwest::Response> {
        let url = format!(
            "{}://{}/v2/{}/manifests/{}",
            self.scheme(),
            registry,
            name,
            reference
        );

        let response = self
            .authorized_get(registry, name, &url)
            .await?
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| MetaError::RequestError(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(error_from_response(response).await);
        }

        Ok(response)
    }

    /// Single-first negotiation. A manifest-list response hands
    /// resolution to the list-fetch path with the first child digest.
    async fn config_digest_single_first(
        &self,
        registry: &str,
        name: &str,
        reference: &str,
    ) -> Result<String> {
        let response = self
            .fetch_manifest(registry, name, reference, ACCEPT_SINGLE_FIRST)
            .await?;

        match content_type(&response).as_str() {
            MANIFEST_V2 => {
                let manifest: Manifest = decode(response).await?;
                Ok(manifest.config.digest)
            }
            MANIFEST_LIST_V2 => {
                let index: ManifestIndex = decode(response).await?;
                match index.manifests.first() {
                    Some(entry) => {
                        let digest = entry.digest.clone();
                        self.config_digest_list_first(registry, name, &digest).await
                    }
                    None => Err(MetaError::NoManifestsFound),
                }
            }
            other => Err(MetaError::UnsupportedContentType(other.to_string())),
        }
    }

    /// List-first negotiation. Follows first-entry digests through
    /// nested indexes until a single manifest yields a config digest.
    ///
    /// Always the first index entry is chosen; no platform matching is
    /// performed.
    async fn config_digest_list_first(
        &self,
        registry: &str,
        name: &str,
        reference: &str,
    ) -> Result<String> {
        let mut reference = reference.to_string();

        for _ in 0..MAX_INDEX_DEPTH {
            let response = self
                .fetch_manifest(registry, name, &reference, ACCEPT_LIST_FIRST)
                .await?;

            match content_type(&response).as_str() {
                MANIFEST_LIST_V2 | OCI_INDEX_V1 => {
                    let index: ManifestIndex = decode(response).await?;
                    match index.manifests.first() {
                        Some(entry) => reference = entry.digest.clone(),
                        None => return Err(MetaError::NoManifestsFound),
                    }
                }
                MANIFEST_V2 | OCI_MANIFEST_V1 => {
                    let manifest: Manifest = decode(response).await?;
                    return Ok(manifest.config.digest);
                }
                other => return Err(MetaError::UnsupportedContentType(other.to_string())),
            }
        }

        Err(MetaError::IndexTooDeep(MAX_INDEX_DEPTH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_joined() {
        let body: ErrorResponse = serde_json::from_str(
            r#"{"errors":[{"message":"manifest unknown"},{"message":"try again"}]}"#,
        )
        .unwrap();
        assert_eq!(body.joined(), "manifest unknown; try again");
    }

    #[test]
    fn test_error_response_empty() {
        let body: ErrorResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(body.joined(), "");
    }

    #[test]
    fn test_manifest_decodes_config_digest() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"config":{"digest":"sha256:abc123"},"layers":[]}"#).unwrap();
        assert_eq!(manifest.config.digest, "sha256:abc123");
    }

    #[test]
    fn test_index_decodes_child_digests() {
        let index: ManifestIndex = serde_json::from_str(
            r#"{"manifests":[{"digest":"sha256:one"},{"digest":"sha256:two"}]}"#,
        )
        .unwrap();
        assert_eq!(index.manifests.len(), 2);
        assert_eq!(index.manifests[0].digest, "sha256:one");
    }
}
