//! The `(username, hostname)` pair that qualifiers are matched against.
use std::fmt;

use crate::error::DeployError;

/// Identity of the current run.
///
/// Built once at startup and passed by reference into every resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
    host: String,
}

impl Identity {
    /// Create an identity from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Identity`] if either value is empty, since an
    /// empty component would make `name<>` match.
    pub fn new(username: impl Into<String>, host: impl Into<String>) -> Result<Self, DeployError> {
        let username = username.into();
        let host = host.into();
        if username.is_empty() {
            return Err(DeployError::Identity("username is empty".to_string()));
        }
        if host.is_empty() {
            return Err(DeployError::Identity("hostname is empty".to_string()));
        }
        Ok(Self { username, host })
    }

    /// Detect the identity of the current process, applying overrides.
    ///
    /// Username: override, `USER`, `USERNAME`, then the OS account name.
    /// Hostname: override, `HOSTNAME`, `COMPUTERNAME`, then the OS hostname.
    /// No external program is run.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Identity`] if a component cannot be determined.
    pub fn detect(username: Option<&str>, host: Option<&str>) -> Result<Self, DeployError> {
        let username = match username {
            Some(name) => name.to_string(),
            None => detect_component(&["USER", "USERNAME"], whoami::fallible::username)
                .ok_or_else(|| DeployError::Identity("cannot determine username".to_string()))?,
        };
        let host = match host {
            Some(name) => name.to_string(),
            None => detect_component(&["HOSTNAME", "COMPUTERNAME"], whoami::fallible::hostname)
                .ok_or_else(|| DeployError::Identity("cannot determine hostname".to_string()))?,
        };
        Self::new(username, host)
    }

    /// The username qualifiers are matched against.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The hostname qualifiers are matched against.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether `qualifier` is exactly `username@host`.
    #[must_use]
    pub fn is_user_at_host(&self, qualifier: &str) -> bool {
        qualifier
            .strip_prefix(self.username.as_str())
            .and_then(|rest| rest.strip_prefix('@'))
            .is_some_and(|host| host == self.host)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.host)
    }
}

/// First non-empty value among `vars`, falling back to `query`.
fn detect_component(
    vars: &[&str],
    query: impl FnOnce() -> std::io::Result<String>,
) -> Option<String> {
    vars.iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .or_else(|| {
            query()
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
}
