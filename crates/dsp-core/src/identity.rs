//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the Dispatch Stack.
//! These prevent accidental identifier confusion — you cannot pass a
//! `DriverId` where a `CompanyId` is expected.
//!
//! Provider-issued identifiers (`ProviderEventId`, `ProviderPaymentId`)
//! wrap strings rather than UUIDs: their format is owned by the payment
//! provider and is treated as opaque.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a published delivery job.
    JobId,
    "job"
);

uuid_id!(
    /// Unique identifier for a driver's engagement with a job.
    BookingId,
    "booking"
);

uuid_id!(
    /// Unique identifier for a driver account.
    DriverId,
    "driver"
);

uuid_id!(
    /// Unique identifier for a company account.
    CompanyId,
    "company"
);

uuid_id!(
    /// Unique identifier for an administrator account.
    AdminId,
    "admin"
);

uuid_id!(
    /// Unique identifier for any platform user, used where the role is
    /// not yet known (e.g., subscription ownership).
    UserId,
    "user"
);

/// Provider-assigned event identifier, the idempotency key for webhook
/// deliveries. Opaque — the provider owns its format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderEventId(pub String);

impl ProviderEventId {
    /// Wrap a provider event identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event:{}", self.0)
    }
}

/// Provider-assigned payment identifier attached to a booking once a
/// checkout session or payment intent exists for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderPaymentId(pub String);

impl ProviderPaymentId {
    /// Wrap a provider payment identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderPaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "payment:{}", self.0)
    }
}
