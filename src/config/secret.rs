//! Secure credential handling using the secrecy crate
//!
//! Provider tokens, the LinkHub API token and the database connection string
//! are held as [`SecretString`]. The wrapped value is zeroed on drop and its
//! `Debug` output is redacted, so credentials never reach the logs through
//! `{:?}` formatting.
//!
//! # Example
//!
//! ```rust
//! use linkhub_sync::config::{secret_string, SecretString};
//! use secrecy::ExposeSecret;
//!
//! let token: SecretString = secret_string("pat-na1-123");
//! assert_eq!(token.expose_secret().as_ref(), "pat-na1-123");
//! assert!(!format!("{:?}", token).contains("pat-na1"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String payload that can live inside a [`Secret`]
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

impl From<&str> for SecretValue {
    fn from(s: &str) -> Self {
        SecretValue(s.to_string())
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl SecretValue {
    /// True when the value is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
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

/// Zeroizing, debug-redacted string
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string into a [`SecretString`]
pub fn secret_string(value: impl Into<String>) -> SecretString {
    Secret::new(SecretValue(value.into()))
}
