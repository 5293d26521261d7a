//! Unique identifiers for Hangout records.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            #[doc = concat!("Generate a new ", stringify!($name))]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

ulid_id!(
    /// Unique identifier for an Event
    EventId
);

ulid_id!(
    /// Unique identifier for an Attendance record.
    ///
    /// ULIDs sort by creation time at millisecond resolution, so ordering
    /// attendance by id approximates the order RSVPs were first recorded and is
    /// always stable for a given set of records.
    AttendanceId
);

ulid_id!(
    /// Unique identifier for a Driver record
    DriverId
);
