//! UTC instants for ledger entries, evidence, and run timing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in time, always UTC.
///
/// Fully ordered, so callers compare instants with the comparison
/// operators; [`Timestamp::latest`] keeps append-only sequences monotonic
/// when the wall clock steps backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Captures the current instant.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Adopts a UTC datetime produced elsewhere.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// The underlying UTC datetime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Whichever of the two instants is later.
    pub fn latest(self, other: Timestamp) -> Timestamp {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }

    /// Signed time from `earlier` to this instant; negative when this
    /// instant is the earlier one.
    pub fn elapsed_since(&self, earlier: &Timestamp) -> Duration {
        self.0 - earlier.0
    }

    /// This instant shifted forward by a number of milliseconds.
    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0 + Duration::milliseconds(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_captures_never_go_backwards() {
        let a = Timestamp::now();
        let b = Timestamp::now();
        assert!(a <= b);
    }

    #[test]
    fn ordering_operators_work_across_a_shift() {
        let a = Timestamp::now();
        let b = a.plus_millis(10);
        assert!(a < b);
        assert!(b > a);
    }

    #[test]
    fn latest_picks_the_later_instant_from_either_side() {
        let a = Timestamp::now();
        let b = a.plus_millis(250);
        assert_eq!(a.latest(b), b);
        assert_eq!(b.latest(a), b);
        assert_eq!(a.latest(a), a);
    }

    #[test]
    fn elapsed_since_is_signed() {
        let a = Timestamp::now();
        let b = a.plus_millis(250);
        assert_eq!(b.elapsed_since(&a).num_milliseconds(), 250);
        assert_eq!(a.elapsed_since(&b).num_milliseconds(), -250);
    }

    #[test]
    fn serde_round_trip_preserves_the_instant() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
