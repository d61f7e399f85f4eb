//! Identifier utilities.
//!
//! medrec needs two kinds of identifier:
//!
//! - A *canonical UUID* ([`UuidService`]): 32 lowercase hexadecimal characters, no hyphens. Used
//!   wherever an opaque random token is needed, for example inside image references.
//! - A *timestamp id* ([`TimestampId`]): a time-prefixed canonical UUID used for new patient
//!   records. It sorts by creation time and cannot collide even when two records are created in
//!   the same millisecond.
//!
//! Both are generate-only. Stored ids are kept as opaque strings by their owners, since older
//! data carries ids in other formats.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! ## Timestamp id form
//! `YYYYMMDDTHHMMSS.mmmZ-<canonical uuid>`, for example
//! `20260111T143522.045Z-550e8400e29b41d4a716446655440000`.

mod service;

pub use service::{TimestampId, TimestampIdGenerator, UuidService};
