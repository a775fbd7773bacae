//! Record-at-a-time decoding machinery.
//!
//! This module is intended for applications that drive decoding themselves,
//! for instance to resynchronize after damage or to decode documents
//! received in pieces. See [`crate::avec`] for implementations covering
//! common decoding patterns.
//!
//! # Architecture
//!
//! A [`Session`] holds all state carried between records: the definition
//! bound to each local message number, the developer fields described so
//! far, and the rolling timestamp counters. Call [`read_record`] with the
//! offset of each record header in turn. It returns the kind of record, the
//! offset of the next record, and for data records the decoded field values.
//!
//! Records depend on those before them, so a session must only be used for
//! one document at a time, and decoded strictly in order. The profile is
//! only read, and may be shared between sessions.
//!
//! Some areas of the decoding process are left to the caller:
//!
//! - Decoding the document header, and stopping once the declared number of
//! record bytes has been read. See [`header::DocumentHeader`].
//!
//! - Applying cyclic redundancy checks. Helper functions are provided in the
//! [`check`] module.

pub mod check;
pub mod component;
pub mod data;
pub mod definition;
pub mod header;
pub mod record;
pub mod time;
pub mod value;

pub use record::{DecodedRecord, Fields, RecordError, RecordKind, Session, read_record};
pub use value::Value;
