//! `.netrc`-style registry credentials.
//!
//! The password field of a machine entry is presented as the bearer token
//! for that registry host. See
//! <https://www.gnu.org/software/inetutils/manual/html_node/The-_002enetrc-file.html>
//! for the file format.

use std::collections::HashMap;
use std::path::Path;

use ocimeta_core::{MetaError, Result};

/// Credentials for a single registry host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryCredential {
    /// Registry hostname this entry applies to
    pub host: String,
    /// Login name (unused for bearer auth, kept for completeness)
    pub login: String,
    /// Password field, sent as the bearer token
    pub token: String,
}

/// In-memory store of per-registry credentials parsed from a `.netrc`
/// file. At most one entry per host; populated once before any request
/// is issued and read-only afterward.
#[derive(Debug, Default)]
pub struct CredentialStore {
    machines: HashMap<String, RegistryCredential>,
}

impl CredentialStore {
    /// Load credentials from a `.netrc` file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            MetaError::CredentialError(format!("reading {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_text(&contents)
    }

    /// Parse credentials from `.netrc`-formatted text.
    ///
    /// Recognizes `machine`, `login` and `password` tokens; `account` is
    /// accepted and skipped with its value. `default` and `macdef` are
    /// rejected.
    pub fn from_text(contents: &str) -> Result<Self> {
        let mut machines = HashMap::new();
        let mut tokens = contents.split_whitespace();
        let mut current: Option<RegistryCredential> = None;

        while let Some(token) = tokens.next() {
            match token {
                "machine" => {
                    let host = tokens.next().ok_or_else(|| {
                        MetaError::CredentialError("machine token without a host".to_string())
                    })?;
                    if let Some(machine) = current.take() {
                        machines.insert(machine.host.clone(), machine);
                    }
                    current = Some(RegistryCredential {
                        host: host.to_string(),
                        login: String::new(),
                        token: String::new(),
                    });
                }
                "login" | "password" | "account" => {
                    let value = tokens.next().ok_or_else(|| {
                        MetaError::CredentialError(format!("{token} token without a value"))
                    })?;
                    match current.as_mut() {
                        Some(machine) if token == "login" => machine.login = value.to_string(),
                        Some(machine) if token == "password" => machine.token = value.to_string(),
                        Some(_) => {} // account: recognized but unused
                        None => {
                            return Err(MetaError::CredentialError(format!(
                                "{token} before any machine entry"
                            )));
                        }
                    }
                }
                other => {
                    return Err(MetaError::CredentialError(format!(
                        "unsupported netrc token '{other}'"
                    )));
                }
            }
        }

        if let Some(machine) = current.take() {
            machines.insert(machine.host.clone(), machine);
        }

        Ok(Self { machines })
    }

    /// Look up the credential entry for a registry host.
    pub fn lookup(&self, host: &str) -> Option<&RegistryCredential> {
        self.machines.get(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_single_machine() {
        let store =
            CredentialStore::from_text("machine ghcr.io login alice password wonderland").unwrap();
        let cred = store.lookup("ghcr.io").unwrap();
        assert_eq!(cred.login, "alice");
        assert_eq!(cred.token, "wonderland");
    }

    #[test]
    fn test_parse_multiple_machines() {
        let text = "machine ghcr.io login a password p1\nmachine quay.io login b password p2\n";
        let store = CredentialStore::from_text(text).unwrap();
        assert_eq!(store.lookup("ghcr.io").unwrap().token, "p1");
        assert_eq!(store.lookup("quay.io").unwrap().token, "p2");
    }

    #[test]
    fn test_parse_multiline_entry() {
        let text = "machine ghcr.io\n  login alice\n  password wonderland\n";
        let store = CredentialStore::from_text(text).unwrap();
        assert_eq!(store.lookup("ghcr.io").unwrap().token, "wonderland");
    }

    #[test]
    fn test_parse_account_skipped() {
        let text = "machine ghcr.io login a account ignored password p";
        let store = CredentialStore::from_text(text).unwrap();
        assert_eq!(store.lookup("ghcr.io").unwrap().token, "p");
    }

    #[test]
    fn test_lookup_unknown_host() {
        let store = CredentialStore::from_text("machine ghcr.io login a password p").unwrap();
        assert!(store.lookup("quay.io").is_none());
    }

    #[test]
    fn test_empty_text() {
        let store = CredentialStore::from_text("").unwrap();
        assert!(store.lookup("ghcr.io").is_none());
    }

    #[test]
    fn test_machine_without_host() {
        assert!(CredentialStore::from_text("machine").is_err());
    }

    #[test]
    fn test_login_before_machine() {
        assert!(CredentialStore::from_text("login alice").is_err());
    }

    #[test]
    fn test_unsupported_token() {
        assert!(CredentialStore::from_text("default login a password p").is_err());
    }

    #[test]
    fn test_last_entry_wins_for_duplicate_host() {
        let text = "machine ghcr.io login a password p1 machine ghcr.io login a password p2";
        let store = CredentialStore::from_text(text).unwrap();
        assert_eq!(store.lookup("ghcr.io").unwrap().token, "p2");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "machine ghcr.io login alice password wonderland").unwrap();

        let store = CredentialStore::from_file(file.path()).unwrap();
        assert_eq!(store.lookup("ghcr.io").unwrap().token, "wonderland");
    }

    #[test]
    fn test_from_file_missing() {
        let err = CredentialStore::from_file("/nonexistent/netrc").unwrap_err();
        assert!(matches!(err, MetaError::CredentialError(_)));
    }
}
