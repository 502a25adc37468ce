//! OCI image reference parsing.
//!
//! Parses image references like `ghcr.io/org/image:v1.0` into structured
//! components.

use ocimeta_core::{MetaError, Result};

/// Canonical Docker Hub registry host.
pub const DOCKER_REGISTRY: &str = "registry-1.docker.io";

/// Default tag when neither a tag nor a digest is given.
const DEFAULT_TAG: &str = "latest";

/// Parsed OCI image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry hostname (e.g., "ghcr.io", "registry-1.docker.io")
    pub registry: String,
    /// Repository name (e.g., "library/nginx", "org/image"); never
    /// contains the registry host
    pub name: String,
    /// Tag (e.g., "latest", "v1.0")
    pub tag: Option<String>,
    /// Digest (e.g., "sha256:abc123...")
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference string.
    ///
    /// Supports formats:
    /// - `nginx` → registry-1.docker.io/library/nginx:latest
    /// - `myuser/myimage:v1` → registry-1.docker.io/myuser/myimage:v1
    /// - `ghcr.io/org/image:tag` → ghcr.io/org/image:tag
    /// - `ghcr.io/org/image@sha256:abc...` → ghcr.io/org/image@sha256:abc...
    pub fn parse(image: &str) -> Result<Self> {
        if image.starts_with(':') || image.starts_with('@') || image.starts_with('/') {
            return Err(MetaError::InvalidReference(image.to_string()));
        }

        let (registry, rest) = match image.matches('/').count() {
            0 => (DOCKER_REGISTRY.to_string(), format!("library/{image}")),
            1 => (DOCKER_REGISTRY.to_string(), image.to_string()),
            2 => match image.split_once('/') {
                Some((registry, rest)) => (registry.to_string(), rest.to_string()),
                None => return Err(MetaError::InvalidReference(image.to_string())),
            },
            _ => return Err(MetaError::InvalidReference(image.to_string())),
        };

        // "docker.io" is an alias clients use; the registry itself lives
        // at registry-1.docker.io.
        let registry = if registry == "docker.io" {
            DOCKER_REGISTRY.to_string()
        } else {
            registry
        };

        let (rest, digest) = match rest.split_once('@') {
            Some((name, digest)) => (name.to_string(), Some(digest.to_string())),
            None => (rest, None),
        };

        let (name, tag) = match rest.split_once(':') {
            Some((name, tag)) => (name.to_string(), Some(tag.to_string())),
            None => (rest, None),
        };

        let tag = if tag.is_none() && digest.is_none() {
            Some(DEFAULT_TAG.to_string())
        } else {
            tag
        };

        tracing::debug!(
            registry = %registry,
            name = %name,
            tag = ?tag,
            digest = ?digest,
            "Parsed image reference"
        );

        Ok(ImageReference {
            registry,
            name,
            tag,
            digest,
        })
    }

    /// The reference to resolve the manifest by: the digest when present,
    /// else the tag.
    pub fn resolve_reference(&self) -> &str {
        match (&self.digest, &self.tag) {
            (Some(digest), _) => digest,
            (None, Some(tag)) => tag,
            (None, None) => DEFAULT_TAG,
        }
    }

    /// Get the full reference string.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}", self.registry, self.name);
        if let Some(ref tag) = self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(digest);
        }
        s
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}
