//! Export modules for the aggregated event collection.
//!
//! Both exporters are pure serialization over an already-deduplicated,
//! already-sorted event slice; they do not fetch or dedup themselves. File
//! write failures propagate to the caller, since a requested export failing
//! is user-visible.
//!
//! - [`json`]: envelope with a generation timestamp and count
//! - [`csv`]: one header row plus RFC4180-style escaped rows

pub mod csv;
pub mod json;
