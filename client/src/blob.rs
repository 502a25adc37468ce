//! Configuration blob fetch and creation-date resolution.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use ocimeta_core::{MetaError, Result};

use crate::client::RegistryClient;
use crate::manifest::error_from_response;

/// OCI annotation key carrying an image's creation date.
const CREATED_ANNOTATION: &str = "org.opencontainers.image.created";

/// An image's configuration blob.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigBlob {
    /// Runtime configuration section; carries the image labels
    #[serde(default)]
    pub config: BlobConfig,
    /// OCI annotations
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// Creation timestamp; absent in some builder outputs
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// The `config` section of a configuration blob.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlobConfig {
    #[serde(rename = "Labels", alias = "labels", default)]
    pub labels: HashMap<String, String>,
}

impl ConfigBlob {
    /// Resolve the image's creation date as an RFC3339 string.
    ///
    /// Prefers the top-level `created` timestamp. When absent, falls
    /// back to the OCI created annotation, with `annotations` taking
    /// precedence over `config.labels`. Returns `None` when no source
    /// carries it. Idempotent.
    pub fn created_date(&self) -> Option<String> {
        if let Some(created) = self.created {
            return Some(created.to_rfc3339_opts(SecondsFormat::Secs, true));
        }

        let source = if !self.annotations.is_empty() {
            &self.annotations
        } else if !self.config.labels.is_empty() {
            &self.config.labels
        } else {
            return None;
        };

        source.get(CREATED_ANNOTATION).cloned()
    }
}

impl RegistryClient {
    /// Fetch and decode the configuration blob named by `digest`.
    pub async fn config_blob(
        &self,
        registry: &str,
        name: &str,
        digest: &str,
    ) -> Result<ConfigBlob> {
        let url = format!(
            "{}://{}/v2/{}/blobs/{}",
            self.scheme(),
            registry,
            name,
            digest
        );

        let response = self
            .authorized_get(registry, name, &url)
            .await?
            .send()
            .await
            .map_err(|e| MetaError::RequestError(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| MetaError::DecodeError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(json: &str) -> ConfigBlob {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_created_from_timestamp() {
        let b = blob(r#"{"created":"2023-04-05T06:07:08Z","config":{"Labels":{}}}"#);
        assert_eq!(b.created_date(), Some("2023-04-05T06:07:08Z".to_string()));
    }

    #[test]
    fn test_created_timestamp_normalizes_offset() {
        let b = blob(r#"{"created":"2023-04-05T08:07:08+02:00"}"#);
        assert_eq!(b.created_date(), Some("2023-04-05T06:07:08Z".to_string()));
    }

    #[test]
    fn test_annotations_take_precedence_over_labels() {
        let b = blob(
            r#"{
                "config":{"Labels":{"org.opencontainers.image.created":"from-labels"}},
                "annotations":{"org.opencontainers.image.created":"from-annotations"}
            }"#,
        );
        assert_eq!(b.created_date(), Some("from-annotations".to_string()));
    }

    #[test]
    fn test_labels_used_when_annotations_empty() {
        let b = blob(
            r#"{"config":{"Labels":{"org.opencontainers.image.created":"2022-01-01T00:00:00Z"}}}"#,
        );
        assert_eq!(b.created_date(), Some("2022-01-01T00:00:00Z".to_string()));
    }

    #[test]
    fn test_no_creation_date_anywhere() {
        let b = blob(r#"{}"#);
        assert_eq!(b.created_date(), None);
    }

    #[test]
    fn test_created_date_is_idempotent() {
        let b = blob(
            r#"{
                "created":"2023-04-05T06:07:08Z",
                "annotations":{"org.opencontainers.image.created":"ignored"}
            }"#,
        );
        assert_eq!(b.created_date(), b.created_date());
    }

    #[test]
    fn test_lowercase_labels_alias() {
        let b = blob(r#"{"config":{"labels":{"a":"b"}}}"#);
        assert_eq!(b.config.labels.get("a"), Some(&"b".to_string()));
    }

    #[test]
    fn test_defaults_on_empty_document() {
        let b = blob(r#"{}"#);
        assert!(b.config.labels.is_empty());
        assert!(b.annotations.is_empty());
        assert!(b.created.is_none());
    }
}
