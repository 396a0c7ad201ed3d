//! Stable identifiers for durable engine records.
//!
//! Every prog, hook, default hook and schedule is keyed by a numeric id
//! that the persistence collaborator keeps stable across reboots.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a prog
    ProgId,
    "prog"
);
define_id!(
    /// Unique identifier for a hook
    HookId,
    "hook"
);
define_id!(
    /// Unique identifier for a default hook rule
    DefaultHookId,
    "defaulthook"
);
define_id!(
    /// Unique identifier for a prog schedule
    ScheduleId,
    "schedule"
);
