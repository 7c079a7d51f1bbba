//! Typed identifiers for runs, events, and artifacts.
//!
//! Each identifier wraps a v4 UUID and renders with a short type prefix
//! (`run-…`, `evt-…`, `art-…`) so ledger payloads and error messages stay
//! self-describing. The serialized form stays the bare UUID; parsing
//! accepts either form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

macro_rules! typed_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Short type prefix used in the display form.
            pub const PREFIX: &'static str = $prefix;

            /// Mints a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Adopts a UUID minted elsewhere.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The raw UUID, without the display prefix.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", Self::PREFIX, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bare = s
                    .strip_prefix($prefix)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .unwrap_or(s);
                Uuid::parse_str(bare).map(Self).map_err(|_| {
                    ValidationError::unparseable(
                        stringify!($name),
                        s,
                        concat!("a UUID, bare or prefixed with '", $prefix, "-'"),
                    )
                })
            }
        }
    };
}

typed_id!(
    /// Identifier of one engine run.
    RunId,
    "run"
);

typed_id!(
    /// Identifier of one persisted engine event.
    EventId,
    "evt"
);

typed_id!(
    /// Identifier of one stored artifact.
    ArtifactId,
    "art"
);
