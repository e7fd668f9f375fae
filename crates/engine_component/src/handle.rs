//! Stable identities for entities and components.
//!
//! A handle is a random 128-bit identity rendered as a 32-character lowercase
//! hex token. Handles never change for the lifetime of the entity or
//! component they name, and are the only reference that stays valid across
//! storage relocations. The nil identity is reserved as the empty handle.

use std::fmt;

use uuid::Uuid;

macro_rules! define_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(Uuid);

        impl $name {
            /// The empty handle. Never assigned to a live object.
            pub const INVALID: Self = Self(Uuid::nil());

            /// Generate a fresh random handle.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing 128-bit identity.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse a 32-character hex token.
            ///
            /// Returns `None` for anything other than exactly 32 hex digits.
            #[must_use]
            pub fn from_token(token: &str) -> Option<Self> {
                if token.len() != TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }
                Uuid::try_parse(token).ok().map(Self)
            }

            /// The 32-character hex token for this handle.
            #[must_use]
            pub fn token(&self) -> String {
                self.0.simple().to_string()
            }

            /// The underlying 128-bit identity.
            #[must_use]
            pub const fn uuid(&self) -> Uuid {
                self.0
            }

            /// Returns `true` unless this is [`Self::INVALID`].
            #[must_use]
            pub fn is_valid(&self) -> bool {
                !self.0.is_nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.simple())
            }
        }
    };
}

/// Length of a rendered handle token.
pub const TOKEN_LEN: usize = 32;

define_handle!(
    /// Identity of an entity in a world.
    EntityHandle
);

define_handle!(
    /// Identity of a single component record.
    ComponentHandle
);
