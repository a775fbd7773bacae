#![allow(dead_code)]

use freehub::sans::check::compute_crc;

/// Builds record sections and whole documents byte by byte.
#[derive(Debug, Default, Clone)]
pub struct Builder {
    records: Vec<u8>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a little-endian definition record of `(field, size, base_type)`
    /// triples.
    pub fn definition(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_with(local, global, true, fields, None)
    }

    /// Add a big-endian definition record.
    pub fn definition_be(self, local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Self {
        self.definition_with(local, global, false, fields, None)
    }

    /// Add a little-endian definition record declaring developer fields as
    /// `(field, size, developer_data_index)` triples.
    pub fn developer_definition(
        self,
        local: u8,
        global: u16,
        fields: &[(u8, u8, u8)],
        developer_fields: &[(u8, u8, u8)],
    ) -> Self {
        self.definition_with(local, global, true, fields, Some(developer_fields))
    }

    fn definition_with(
        mut self,
        local: u8,
        global: u16,
        is_little_endian: bool,
        fields: &[(u8, u8, u8)],
        developer_fields: Option<&[(u8, u8, u8)]>,
    ) -> Self {
        let developer_flag = if developer_fields.is_some() { 0x20 } else { 0 };
        self.records.push(0x40 | developer_flag | local);
        self.records.push(0);

        if is_little_endian {
            self.records.push(0);
            self.records.extend_from_slice(&global.to_le_bytes());
        } else {
            self.records.push(1);
            self.records.extend_from_slice(&global.to_be_bytes());
        }

        self.records.push(fields.len() as u8);
        for (field, size, base_type) in fields {
            self.records.extend_from_slice(&[*field, *size, *base_type]);
        }

        if let Some(developer_fields) = developer_fields {
            self.records.push(developer_fields.len() as u8);
            for (field, size, index) in developer_fields {
                self.records.extend_from_slice(&[*field, *size, *index]);
            }
        }

        self
    }

    /// Add a data record with a normal header.
    pub fn data(mut self, local: u8, bytes: &[u8]) -> Self {
        self.records.push(local & 0x0F);
        self.records.extend_from_slice(bytes);
        self
    }

    /// Add a data record with a compressed timestamp header.
    pub fn compressed(mut self, local: u8, time_offset: u8, bytes: &[u8]) -> Self {
        self.records.push(0x80 | ((local & 0x03) << 5) | (time_offset & 0x1F));
        self.records.extend_from_slice(bytes);
        self
    }

    pub fn records(&self) -> &[u8] {
        &self.records
    }

    /// A whole document with a 14 byte header, and correct CRCs.
    pub fn document(&self) -> Vec<u8> {
        let mut r = vec![14, 0x20];
        r.extend_from_slice(&2132u16.to_le_bytes());
        r.extend_from_slice(&(self.records.len() as u32).to_le_bytes());
        r.extend_from_slice(b".FIT");

        let header_crc = compute_crc(0, &r);
        r.extend_from_slice(&header_crc.to_le_bytes());

        r.extend_from_slice(&self.records);

        let crc = compute_crc(0, &r);
        r.extend_from_slice(&crc.to_le_bytes());

        r
    }
}

/// A null padded string field of `size` bytes.
pub fn string(s: &str, size: usize) -> Vec<u8> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.resize(size, 0);
    bytes
}

/// A `field_description` record body for the standard profile's layout
/// (see [`FIELD_DESCRIPTION`]).
pub fn field_description(index: u8, number: u8, base_type: u8, name: &str) -> Vec<u8> {
    let mut bytes = vec![index, number, base_type];
    bytes.extend(string(name, 16));
    bytes
}

/// Definition fields of a `field_description` message.
pub const FIELD_DESCRIPTION: &[(u8, u8, u8)] =
    &[(0, 1, 0x02), (1, 1, 0x02), (2, 1, 0x02), (3, 16, 0x07)];
