//! Typed identifiers.

use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; 16]);

        impl $name {
            /// Creates an id from raw bytes.
            #[inline]
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }

            /// Creates a new random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4().into_bytes())
            }

            /// Returns the raw bytes.
            #[inline]
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }

            /// Returns the raw bytes by value.
            #[inline]
            #[must_use]
            pub const fn to_bytes(self) -> [u8; 16] {
                self.0
            }

            /// Converts to a UUID.
            #[must_use]
            pub fn to_uuid(&self) -> Uuid {
                Uuid::from_bytes(self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_uuid())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_uuid())
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid.into_bytes())
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.to_uuid()
            }
        }

        impl From<[u8; 16]> for $name {
            fn from(bytes: [u8; 16]) -> Self {
                Self::from_bytes(bytes)
            }
        }

        impl From<$name> for [u8; 16] {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier of a replicated entity.
    ///
    /// Ids are 128-bit UUIDs, identical on edge and cloud for the same
    /// logical entity.
    EntityId
);

define_id!(
    /// Identifier of the tenant that owns a set of entities.
    TenantId
);

define_id!(
    /// Identifier of a customer that entities can be assigned to.
    CustomerId
);

impl EntityId {
    /// Derives a deterministic id from a name within a namespace.
    ///
    /// Both nodes derive the same id for the same name, which lets entities
    /// without an allocated id (relations) be addressed by id.
    #[must_use]
    pub fn derived(namespace: &Uuid, name: &[u8]) -> Self {
        Self(Uuid::new_v5(namespace, name).into_bytes())
    }
}

impl From<CustomerId> for EntityId {
    fn from(id: CustomerId) -> Self {
        Self(id.0)
    }
}
