//! Registry client for remote container image metadata.
//!
//! This crate resolves a human-readable image reference against the
//! OCI/Docker Distribution HTTP API down to the image's configuration
//! blob (creation timestamp, labels, annotations):
//!
//! ```text
//! image string
//!   └─▶ ImageReference (registry / name / tag / digest)
//!         └─▶ manifest negotiation  ──▶ config digest
//!               └─▶ blob fetch      ──▶ ConfigBlob
//! ```
//!
//! Authentication is attached per request: Docker Hub gets a pull-scoped
//! bearer token (cached in memory), other registries get the password of
//! a matching `.netrc` entry as a bearer token.

mod auth;
mod blob;
mod client;
mod credentials;
mod manifest;
mod reference;

pub use blob::{BlobConfig, ConfigBlob};
pub use client::{RegistryClient, RegistryClientBuilder};
pub use credentials::{CredentialStore, RegistryCredential};
pub use reference::{ImageReference, DOCKER_REGISTRY};
