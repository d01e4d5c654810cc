//! API token handling using the secrecy crate
//!
//! Both credentials idsnap needs (the identity platform access token and the
//! version-control host token) are held as [`SecretString`]: zeroized on drop,
//! redacted in `Debug`, and only readable through `expose_secret()`.
//!
//! # Example
//!
//! ```rust
//! use idsnap::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let token = secret_string("ghp_example".to_string());
//! assert_eq!(token.expose_secret().as_ref(), "ghp_example");
//! assert!(!format!("{token:?}").contains("ghp_example"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Whether the token is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Formats the value as an HTTP bearer credential
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A token wrapped in `Secret`
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_string_creation() {
        let secret = secret_string("token-123".to_string());
        assert_eq!(secret.expose_secret(), "token-123");
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = secret_string("ghp_sensitive".to_string());
        let debug_output = format!("{secret:?}");

        assert!(!debug_output.contains("ghp_sensitive"));
        assert!(debug_output.contains("REDACTED") || debug_output.contains("Secret"));
    }

    #[test]
    fn test_secret_blank_and_bearer() {
        assert!(secret_string("  ".to_string()).expose_secret().is_blank());
        let secret = secret_string("abc".to_string());
        assert!(!secret.expose_secret().is_blank());
        assert_eq!(secret.expose_secret().bearer(), "Bearer abc");
    }

    #[test]
    fn test_secret_serde() {
        #[derive(Serialize, Deserialize)]
        struct TokenHolder {
            token: SecretString,
        }

        let holder: TokenHolder = toml::from_str("token = \"t0k3n\"").unwrap();
        assert_eq!(holder.token.expose_secret(), "t0k3n");

        let json = serde_json::to_string(&holder).unwrap();
        assert!(json.contains("t0k3n"));
    }
}
