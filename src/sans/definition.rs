//! Definition records and the tables they maintain.

use std::collections::HashMap;

use tracing::{debug, warn};
use zerocopy::FromBytes;

use crate::profile::Profile;

use super::{data::BaseType, header::DefinitionHeader, record::RecordError};

/// Layout of a single field within data records of a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Field number, or the field definition number of a developer field.
    pub field_number: u8,
    /// Width of the field in bytes.
    pub byte_size: u8,
    /// Base type number (the low four bits of the base type byte).
    pub base_type_code: u8,
    /// Multi-byte values of this field are stored in the record byte order.
    pub is_endian_sensitive: bool,
    pub is_little_endian: bool,
    /// Semantic type, from the profile or the developer field's base type.
    pub semantic_type: String,
    /// Field name, if the profile or a field description provides one.
    pub field_name: Option<String>,
    pub is_developer_field: bool,
}

/// Layout of the data records bound to a local message number.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    pub is_little_endian: bool,
    pub global_message_number: u16,
    /// Profile fields followed by developer fields, in record order.
    pub fields: Vec<FieldDefinition>,
}

impl MessageDefinition {
    /// Number of bytes in each data record using this definition, excluding
    /// the record header.
    pub fn data_size(&self) -> usize {
        self.fields.iter().map(|f| usize::from(f.byte_size)).sum()
    }
}

/// Store of definitions by local message number.
#[derive(Debug, Clone, Default)]
pub struct DefinitionTable([Option<MessageDefinition>; 16]);

impl DefinitionTable {
    /// Bind a definition to a local message number, replacing any earlier
    /// one.
    pub fn insert(&mut self, local: u8, definition: MessageDefinition) {
        self.0[usize::from(local & 0x0F)] = Some(definition);
    }

    /// Look up the definition bound to a local message number.
    pub fn get(&self, local: u8) -> Option<&MessageDefinition> {
        self.0[usize::from(local & 0x0F)].as_ref()
    }

    /// Look up the definition for a data record, falling back to local
    /// message 0 when none is bound.
    ///
    /// Returns the definition, and whether the fallback was taken.
    pub fn resolve(&self, local: u8) -> Option<(&MessageDefinition, bool)> {
        match self.get(local) {
            Some(definition) => Some((definition, false)),
            None => self.get(0).map(|definition| (definition, true)),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A developer field declared by a `field_description` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperFieldDescriptor {
    pub base_type_id: u8,
    pub field_name: String,
}

/// Store of developer field descriptions, keyed by developer data index and
/// field definition number.
#[derive(Debug, Clone, Default)]
pub struct DeveloperFieldTable(HashMap<(u8, u8), DeveloperFieldDescriptor>);

impl DeveloperFieldTable {
    /// Register a description, replacing any earlier one with the same key.
    pub fn register(
        &mut self,
        developer_data_index: u8,
        field_number: u8,
        descriptor: DeveloperFieldDescriptor,
    ) {
        self.0.insert((developer_data_index, field_number), descriptor);
    }

    /// Look up a registered description.
    pub fn resolve(
        &self,
        developer_data_index: u8,
        field_number: u8,
    ) -> Option<&DeveloperFieldDescriptor> {
        self.0.get(&(developer_data_index, field_number))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[repr(C, packed)]
#[derive(Debug, FromBytes)]
struct DefinitionMessage {
    _reserved: u8,
    architecture: u8,
    global_message: [u8; 2],
    field_count: u8,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct FieldHeader {
    field: u8,
    size: u8,
    base_type: u8,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct DeveloperFieldHeader {
    field: u8,
    size: u8,
    developer_data_index: u8,
}

/// Decode the definition record whose header is at offset `i`, binding it to
/// local message number `local`.
///
/// Returns the offset of the next record.
pub fn decode_definition(
    r: &[u8],
    i: usize,
    local: u8,
    header: DefinitionHeader,
    profile: &impl Profile,
    definitions: &mut DefinitionTable,
    developer_fields: &DeveloperFieldTable,
) -> Result<usize, RecordError> {
    let DefinitionMessage {
        architecture,
        global_message,
        field_count,
        ..
    } = zerocopy::transmute!(take::<5>(r, i + 1)?);

    let is_little_endian = architecture == 0;
    let global_message_number = super::data::read_integer(&global_message, is_little_endian);
    let global_message_number = global_message_number as u16;

    let message = profile.message(global_message_number);

    let mut j = i + 6; // Offset of the first field header.
    let mut fields = Vec::with_capacity(usize::from(field_count));

    for _ in 0..field_count {
        let FieldHeader {
            field,
            size,
            base_type,
        } = zerocopy::transmute!(take::<3>(r, j)?);
        j += 3;

        let base_type_code = base_type & 0x0F;

        if profile
            .base_type_size(base_type_code)
            .is_some_and(|width| size % width != 0)
        {
            warn!(field, size, base_type_code, "field size is not a multiple of its base type");
        }

        let attributes = message.and_then(|m| m.field(field));

        let semantic_type = match attributes {
            Some(attributes) => attributes.kind.clone(),
            None => base_type_name(base_type_code),
        };

        fields.push(FieldDefinition {
            field_number: field,
            byte_size: size,
            base_type_code,
            is_endian_sensitive: base_type & 0x80 == 0x80,
            is_little_endian,
            semantic_type,
            field_name: attributes.map(|a| a.field.clone()),
            is_developer_field: false,
        });
    }

    if header.has_developer_fields {
        let [developer_field_count] = take::<1>(r, j)?;
        j += 1;

        for _ in 0..developer_field_count {
            let DeveloperFieldHeader {
                field,
                size,
                developer_data_index,
            } = zerocopy::transmute!(take::<3>(r, j)?);
            j += 3;

            let descriptor = developer_fields
                .resolve(developer_data_index, field)
                .ok_or(RecordError::UnknownDeveloperField {
                    developer_data_index,
                    field_number: field,
                })?;

            let base_type_code = descriptor.base_type_id & 0x0F;

            fields.push(FieldDefinition {
                field_number: field,
                byte_size: size,
                base_type_code,
                is_endian_sensitive: descriptor.base_type_id & 0x80 == 0x80,
                is_little_endian,
                semantic_type: base_type_name(base_type_code),
                field_name: Some(descriptor.field_name.clone()),
                is_developer_field: true,
            });
        }
    }

    debug!(
        local,
        global = global_message_number,
        fields = fields.len(),
        "registered definition"
    );

    definitions.insert(
        local,
        MessageDefinition {
            is_little_endian,
            global_message_number,
            fields,
        },
    );

    Ok(j)
}

fn base_type_name(number: u8) -> String {
    BaseType::from_number(number)
        .map_or("byte", BaseType::name)
        .to_string()
}

/// Take an exact number of bytes from an offset in a slice.
pub(super) fn take<const N: usize>(r: &[u8], i: usize) -> Result<[u8; N], RecordError> {
    r.get(i..i + N)
        .and_then(|b| b.try_into().ok())
        .ok_or(RecordError::EndOfSlice { offset: i })
}
