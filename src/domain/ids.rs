//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that cross the gateway and entity
//! store boundaries. Each wrapper rejects blank strings so an empty id never
//! reaches a query or an external API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, rejecting blank input
            pub fn new(id: impl Into<String>) -> Result<Self, String> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(concat!($label, " cannot be empty").to_string());
                }
                Ok(Self(id))
            }

            /// Returns the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes self and returns the inner String
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Integration instance identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use linkhub_sync::domain::ids::InstanceId;
    /// use std::str::FromStr;
    ///
    /// let id = InstanceId::from_str("inst_01").unwrap();
    /// assert_eq!(id.as_str(), "inst_01");
    /// ```
    InstanceId,
    "Instance ID"
);

string_id!(
    /// Provider catalog identifier
    ProviderId,
    "Provider ID"
);

string_id!(
    /// Integrator profile identifier (the user-level owner of an instance)
    ProfileId,
    "Profile ID"
);

string_id!(
    /// Tenant (company) identifier attached to every business entity write
    TenantId,
    "Tenant ID"
);

string_id!(
    /// Identifier returned by the business entity store after a write
    EntityId,
    "Entity ID"
);

string_id!(
    /// Sync run log row identifier
    SyncLogId,
    "Sync log ID"
);

impl InstanceId {
    /// Generates a fresh random instance id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl ProviderId {
    /// Generates a fresh random provider id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl SyncLogId {
    /// Generates a fresh random log id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
