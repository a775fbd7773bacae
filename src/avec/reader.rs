//! Reader-based decoder implementation.

use std::io::{ErrorKind, Read};

use thiserror::Error;

use crate::{
    profile::Profile,
    sans::header::{DocumentHeader, DocumentHeaderError},
    units::DecodeOptions,
};

use super::{FromRecords, Summary, slice};

/// Errors occurring while decoding from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// An error decoding the bytes read.
    #[error(transparent)]
    Decode(#[from] slice::Error),
}

impl From<DocumentHeaderError> for Error {
    fn from(err: DocumentHeaderError) -> Self {
        Self::Decode(slice::Error::Header(err))
    }
}

/// Decode a single document from a reader, publishing to a receiver.
///
/// Exactly the bytes of one document (header, records, and trailing CRC) are
/// read, so chained documents may be decoded by calling this repeatedly.
///
/// This method is also re-exported as `freehub::avec::decode_reader`.
pub fn decode(
    r: &mut impl Read,
    profile: &impl Profile,
    options: &DecodeOptions,
    o: &mut impl FromRecords,
) -> Result<Summary, Error> {
    let mut buf = vec![0; 12];
    r.read_exact(&mut buf)?;

    if buf[0] == 14 {
        take(r, &mut buf, 2)?;
    }

    let header = DocumentHeader::decode(&buf)?;

    // Records, then the trailing CRC.
    take(r, &mut buf, header.data_size as usize + 2)?;

    Ok(slice::decode(&buf, profile, options, o)?)
}

/// Read an exact number of bytes from a reader onto the end of a buffer.
///
/// The buffer grows with the bytes actually read, never with the declared
/// count alone.
fn take(r: &mut impl Read, buf: &mut Vec<u8>, n: usize) -> Result<(), Error> {
    let read = r.by_ref().take(n as u64).read_to_end(buf)?;

    if read < n {
        Err(std::io::Error::from(ErrorKind::UnexpectedEof))?;
    }

    Ok(())
}
