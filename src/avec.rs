//! Convenience interfaces for common decoding patterns.
//!
//! The functions in this module decode whole documents from slices and
//! readers, publishing each data record to a [`FromRecords`] receiver.
//! [`Document`] is a receiver collecting every record in order.
//!
//! ```
//! let profile = ProfileTables::standard();
//! let options = DecodeOptions::default();
//! let document = Document::from_slice(&data, &profile, &options)?;
//!
//! for record in document.messages("record") {
//!     println!("{:?}", record.fields.get("heart_rate"));
//! }
//! ```

pub mod reader;
pub mod slice;

use serde::Serialize;

use crate::{
    profile::Profile,
    sans::{Fields, header::DocumentHeader},
    units::DecodeOptions,
};

pub use reader::decode as decode_reader;
pub use slice::decode as decode_slice;

/// Receive decoded data records of a document, in order.
pub trait FromRecords {
    /// Add a data record, with the name of its global message.
    fn add_record(&mut self, name: &str, fields: Fields);
}

/// Found and calculated values of a document's trailing CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checksum {
    pub found: u16,
    pub calculated: u16,
}

impl Checksum {
    pub fn is_valid(&self) -> bool {
        self.found == self.calculated
    }
}

/// Header and integrity of a decoded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub header: DocumentHeader,
    pub checksum: Checksum,
}

/// A decoded data record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub name: String,
    pub fields: Fields,
}

/// Every data record of a document, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub messages: Vec<Message>,
    /// Trailing CRC, once decoded.
    pub checksum: Option<Checksum>,
}

impl FromRecords for Document {
    fn add_record(&mut self, name: &str, fields: Fields) {
        self.messages.push(Message {
            name: name.to_string(),
            fields,
        });
    }
}

impl Document {
    /// Decode a document from a slice.
    pub fn from_slice(
        r: &[u8],
        profile: &impl Profile,
        options: &DecodeOptions,
    ) -> Result<Self, slice::Error> {
        let mut document = Self::default();
        let summary = slice::decode(r, profile, options, &mut document)?;
        document.checksum = Some(summary.checksum);
        Ok(document)
    }

    /// Decode a document from a reader.
    pub fn from_reader(
        r: &mut impl std::io::Read,
        profile: &impl Profile,
        options: &DecodeOptions,
    ) -> Result<Self, reader::Error> {
        let mut document = Self::default();
        let summary = reader::decode(r, profile, options, &mut document)?;
        document.checksum = Some(summary.checksum);
        Ok(document)
    }

    /// Iterate over the records of a global message.
    pub fn messages<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages.iter().filter(move |m| m.name == name)
    }

    /// Check the trailing CRC.
    pub fn verify(&self) -> Result<(), slice::Error> {
        match self.checksum {
            Some(checksum) if !checksum.is_valid() => Err(slice::Error::CyclicRedundancyCheck {
                found: checksum.found,
                calculated: checksum.calculated,
            }),
            _ => Ok(()),
        }
    }
}
