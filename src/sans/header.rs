//! Document and record header decoding.

use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

use super::check::compute_crc;

/// An error decoding a document header.
#[derive(Debug, Error)]
pub enum DocumentHeaderError {
    /// Incorrect filetype marker.
    #[error("Incorrect file type marker.")]
    NotFitData,
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    UnknownHeaderLength(u8),
    /// Fewer bytes than the header declares.
    #[error("Document ends inside its header.")]
    Truncated,
    /// Calculated and found header CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) header CRC values do not match.")]
    CyclicRedundancyCheck { found: u16, calculated: u16 },
}

/// The header opening every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentHeader {
    /// Length of the header in bytes, 12 or 14.
    pub header_size: u8,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Number of record bytes following the header, excluding the trailing
    /// CRC.
    pub data_size: u32,
    /// Header CRC, only present in 14 byte headers. Zero means unset.
    pub checksum: Option<u16>,
}

impl DocumentHeader {
    /// Decode a document header from the start of a slice.
    ///
    /// A header CRC, if present and set, is checked against the first 12
    /// bytes.
    pub fn decode(r: &[u8]) -> Result<Self, DocumentHeaderError> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct FileHeader {
            header_size: u8,
            protocol_version: u8,
            profile_version: [u8; 2],
            data_size: [u8; 4],
            data_type: [u8; 4],
        }

        let bytes: [u8; 12] = r
            .get(..12)
            .and_then(|b| b.try_into().ok())
            .ok_or(DocumentHeaderError::Truncated)?;

        let FileHeader {
            header_size,
            protocol_version,
            profile_version,
            data_size,
            data_type,
        } = zerocopy::transmute!(bytes);

        if &data_type != b".FIT" {
            Err(DocumentHeaderError::NotFitData)?;
        }

        let checksum = match header_size {
            12 => None,
            14 => {
                let found = r.get(12..14).ok_or(DocumentHeaderError::Truncated)?;
                let found = u16::from_le_bytes([found[0], found[1]]);
                let calculated = compute_crc(0, &bytes);

                if found != 0 && found != calculated {
                    Err(DocumentHeaderError::CyclicRedundancyCheck { found, calculated })?;
                }

                Some(found)
            }
            _ => Err(DocumentHeaderError::UnknownHeaderLength(header_size))?,
        };

        Ok(Self {
            header_size,
            protocol_version,
            profile_version: u16::from_le_bytes(profile_version),
            data_size: u32::from_le_bytes(data_size),
            checksum,
        })
    }
}

/// Flags carried by the header of a definition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefinitionHeader {
    /// The definition declares developer fields after its profile fields.
    pub has_developer_fields: bool,
}

/// The single byte opening every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader(pub u8);

impl RecordHeader {
    /// Classify the record following this header.
    ///
    /// Returns the local message number, and either the flags of a definition
    /// record or, for data records, the time offset of a compressed
    /// timestamp header if present.
    pub fn classify(self) -> (u8, Either<DefinitionHeader, Option<u8>>) {
        let r = self.0;

        bitfield! {
            struct Header(u8) {
                [7] is_compressed,
            }
        }

        if Header(r).is_compressed() {
            bitfield! {
                struct CompressedHeader(u8) {
                    [0..5] time_offset: u8,
                    [5..7] local_message: u8,
                }
            }

            let header = CompressedHeader(r);

            (header.local_message(), Right(Some(header.time_offset())))
        } else {
            bitfield! {
                struct NormalHeader(u8) {
                    [0..4] local_message: u8,
                    [5] is_developer,
                    [6] is_definition,
                }
            }

            let header = NormalHeader(r);

            let successor = if header.is_definition() {
                Left(DefinitionHeader {
                    has_developer_fields: header.is_developer(),
                })
            } else {
                Right(None)
            };

            (header.local_message(), successor)
        }
    }
}
