//! Slice-based decoder implementation.

use thiserror::Error;
use tracing::warn;

use crate::{
    profile::Profile,
    sans::{
        RecordError, RecordKind, Session, Value,
        check::compute_crc,
        header::{DocumentHeader, DocumentHeaderError},
    },
    units::DecodeOptions,
};

use super::{Checksum, FromRecords, Summary};

/// Errors occurring while decoding from a slice.
#[derive(Debug, Error)]
pub enum Error {
    /// Unexpectedly reached the end of the slice.
    #[error("Unexpectedly reached the end of the slice.")]
    EndOfSlice,
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) CRC values do not match.")]
    CyclicRedundancyCheck { found: u16, calculated: u16 },
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(#[from] DocumentHeaderError),
    /// Malformed record.
    #[error("Malformed record: {0}")]
    Record(#[from] RecordError),
}

/// Decode records from a slice of a document, publishing to a receiver.
///
/// A trailing CRC mismatch is an error unless the `force` option is set, in
/// which case it is only reported in the returned summary.
///
/// This method is also re-exported as `freehub::avec::decode_slice`.
pub fn decode(
    r: &[u8],
    profile: &impl Profile,
    options: &DecodeOptions,
    o: &mut impl FromRecords,
) -> Result<Summary, Error> {
    let header = DocumentHeader::decode(r)?;

    let i = usize::from(header.header_size);
    let end = i + header.data_size as usize; // Offset to the end of the record section.

    // Apply the cyclic redundancy check before continuing.
    let found = r.get(end..end + 2).ok_or(Error::EndOfSlice)?;
    let found = u16::from_le_bytes([found[0], found[1]]);
    let calculated = compute_crc(0, r.get(..end).ok_or(Error::EndOfSlice)?);

    let checksum = Checksum { found, calculated };

    if !checksum.is_valid() {
        if !options.force {
            Err(Error::CyclicRedundancyCheck { found, calculated })?;
        }
        warn!(found, calculated, "CRC values do not match, decoding anyway");
    }

    decode_records(&r[..end], i, profile, options, o)?;

    Ok(Summary { header, checksum })
}

/// Decode the records from offset `i` to the end of the slice.
fn decode_records(
    r: &[u8],
    mut i: usize,
    profile: &impl Profile,
    options: &DecodeOptions,
    o: &mut impl FromRecords,
) -> Result<(), Error> {
    let mut session = Session::new();

    // Time of the first `record` message.
    let mut start = None;

    while i < r.len() {
        let record = session.read_record(r, i, profile, options, start)?;
        i = record.next_offset;

        let (RecordKind::Message(name), Some(mut fields)) = (record.kind, record.fields) else {
            continue;
        };

        if name == "record" && start.is_none() {
            start = fields.get("timestamp").and_then(Value::as_timestamp);

            if start.is_some() && options.elapsed_record_field {
                fields.insert("elapsed_time".to_string(), Value::Float(0.0));
            }
        }

        o.add_record(&name, fields);
    }

    Ok(())
}
