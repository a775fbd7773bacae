//! A profile-aware record decoder for Garmin's Flexible and Interoperable
//! Data Transfer protocol.
//!
//! Freehub turns activity recordings into named, typed field values:
//! definitions (including developer fields) are tracked as they appear,
//! values marked invalid are dropped, scales and offsets are applied, packed
//! components are expanded, compressed timestamps are reconstructed, and
//! measurements are converted into the units of your choice.
//!
//! Most users should begin with the functions in the [`avec`] module. If
//! these prove insufficient, drive a [`sans::Session`] directly as described
//! in the [`sans`] module.
//!
//! Field names and types come from a [`profile::Profile`].
//! [`profile::ProfileTables::standard`] covers common messages; load a full
//! profile export with `serde` for complete coverage.

pub mod avec;
pub mod profile;
pub mod sans;
pub mod units;

pub use sans::Value;
pub use units::DecodeOptions;
