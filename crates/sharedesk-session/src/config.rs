//! Session configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two shared secrets and the hosting policy.
///
/// A token equal to `admin_password` authenticates as an administrator,
/// one equal to `password` as a regular user. An empty password can never
/// be matched, since an empty token counts as "no credential".
///
/// `Debug` redacts both secrets so the config can be logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Secret granting administrator privileges.
    pub admin_password: String,

    /// Secret granting regular user privileges.
    pub password: String,

    /// Whether control is handed out without an explicit request. The
    /// session layer only reports this; the server decides what it means.
    pub implicit_hosting: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            admin_password: String::new(),
            password: String::new(),
            implicit_hosting: true,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("admin_password", &"<redacted>")
            .field("password", &"<redacted>")
            .field("implicit_hosting", &self.implicit_hosting)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let config = SessionConfig {
            admin_password: "top-secret".into(),
            password: "also-secret".into(),
            implicit_hosting: false,
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("top-secret"));
        assert!(!printed.contains("also-secret"));
        assert!(printed.contains("implicit_hosting: false"));
    }

    #[test]
    fn test_deserialize_fills_missing_fields_from_default() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"password":"neko"}"#).unwrap();
        assert_eq!(config.password, "neko");
        assert_eq!(config.admin_password, "");
        assert!(config.implicit_hosting);
    }
}
