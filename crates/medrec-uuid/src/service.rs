//! Implementation of canonical UUIDs and timestamp ids.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::fmt;
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.3f";

/// medrec's canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// Values are only ever generated, never parsed, so the `Display` output is always canonical
/// and can be embedded in references and ids without further checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UuidService(Uuid);

impl Default for UuidService {
    fn default() -> Self {
        Self::new()
    }
}

impl UuidService {
    /// Generates a new random (v4) UUID in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UuidService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A time-prefixed identifier: `YYYYMMDDTHHMMSS.mmmZ-<canonical uuid>`.
///
/// The timestamp has millisecond precision. Ids produced by one [`TimestampIdGenerator`] are
/// strictly increasing, both as values and as strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimestampId {
    timestamp: DateTime<Utc>,
    uuid: UuidService,
}

impl TimestampId {
    /// Generates a new id.
    ///
    /// If `last` is given, the timestamp is guaranteed to be strictly greater than `last`'s
    /// (bumped by 1 ms when the clock has not advanced or has gone backwards).
    pub fn generate(last: Option<&TimestampId>) -> Self {
        let now = Utc::now().trunc_subsecs(3);

        let timestamp = match last {
            Some(prev) if now <= prev.timestamp => prev.timestamp + Duration::milliseconds(1),
            _ => now,
        };

        Self {
            timestamp,
            uuid: UuidService::new(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for TimestampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Z-{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.uuid
        )
    }
}

/// Stateful source of strictly increasing [`TimestampId`]s.
///
/// Not thread-safe by itself; the owner (one record store) drives it from a single thread.
#[derive(Clone, Debug, Default)]
pub struct TimestampIdGenerator {
    last: Option<TimestampId>,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces the next id, later than every id this generator has produced before.
    pub fn next_id(&mut self) -> TimestampId {
        let id = TimestampId::generate(self.last.as_ref());
        self.last = Some(id.clone());
        id
    }
}
