//! Record-at-a-time decoding.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use either::Either::{Left, Right};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{profile::Profile, units::DecodeOptions};

use super::{
    component::unpack,
    data::{BaseType, RawValue, read_field},
    definition::{
        DefinitionTable, DeveloperFieldDescriptor, DeveloperFieldTable, decode_definition,
    },
    header::RecordHeader,
    time::{TimestampState, to_datetime},
    value::{Value, apply_units, format, is_invalid},
};

/// An error decoding a record. All are fatal to the document.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Unexpectedly reached the end of the slice.
    #[error("Unexpectedly reached the end of the slice (at offset {offset}).")]
    EndOfSlice { offset: usize },
    /// Found a data record for a local message without a definition, while
    /// local message 0 also has none.
    #[error("Found a data record for undefined local message {0}.")]
    UndefinedLocalMessage(u8),
    /// Found a definition declaring a developer field never described.
    #[error("Found undescribed developer field {field_number} (index {developer_data_index}).")]
    UnknownDeveloperField {
        developer_data_index: u8,
        field_number: u8,
    },
}

/// Decoded field values by field name.
pub type Fields = BTreeMap<String, Value>;

/// The kind of a decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Definition,
    /// A data record, with the name of its global message (`unknown` if the
    /// profile lacks it).
    Message(String),
}

/// The result of decoding a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub kind: RecordKind,
    /// Offset of the record following this one.
    pub next_offset: usize,
    /// Field values of a data record.
    pub fields: Option<Fields>,
}

impl DecodedRecord {
    /// The global message name of a data record.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::Message(name) => Some(name),
            RecordKind::Definition => None,
        }
    }
}

/// State carried between the records of a single document.
///
/// Records must be decoded in order, each against the state left by those
/// before it. Use a separate session for each document.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub definitions: DefinitionTable,
    pub developer_fields: DeveloperFieldTable,
    pub time: TimestampState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all definitions, developer fields, and timestamps, to begin a
    /// new document.
    pub fn reset(&mut self) {
        self.definitions.clear();
        self.developer_fields.clear();
        self.time.reset();
    }

    /// Decode the record at offset `i`. See [`read_record`].
    pub fn read_record(
        &mut self,
        r: &[u8],
        i: usize,
        profile: &impl Profile,
        options: &DecodeOptions,
        start: Option<DateTime<Utc>>,
    ) -> Result<DecodedRecord, RecordError> {
        read_record(r, i, self, profile, options, start)
    }
}

/// Raw values of fields with a role beyond their own value.
#[derive(Debug, Default)]
struct Keys {
    timestamp: Option<u32>,
    timestamp16: Option<u32>,
    developer_data_index: Option<u32>,
    field_definition_number: Option<u32>,
    fit_base_type_id: Option<u32>,
}

impl Keys {
    fn capture(&mut self, field: &str, raw: &RawValue) {
        let slot = match field {
            "timestamp" => &mut self.timestamp,
            "timestamp16" => &mut self.timestamp16,
            "developer_data_index" => &mut self.developer_data_index,
            "field_definition_number" => &mut self.field_definition_number,
            "fit_base_type_id" => &mut self.fit_base_type_id,
            _ => return,
        };
        *slot = raw.bits();
    }
}

/// Decode the record whose header is at offset `i`.
///
/// Definition records bind a definition in the session. Data records are
/// decoded against the definition bound to their local message number,
/// falling back to that of local message 0. `start` is the start time used
/// to derive `elapsed_time` for `record` messages, if requested by the
/// options.
pub fn read_record(
    r: &[u8],
    i: usize,
    session: &mut Session,
    profile: &impl Profile,
    options: &DecodeOptions,
    start: Option<DateTime<Utc>>,
) -> Result<DecodedRecord, RecordError> {
    let Session {
        definitions,
        developer_fields,
        time,
    } = session;

    let header = *r.get(i).ok_or(RecordError::EndOfSlice { offset: i })?;
    let (local, successor) = RecordHeader(header).classify();

    let time_offset = match successor {
        Left(header) => {
            let next_offset =
                decode_definition(r, i, local, header, profile, definitions, developer_fields)?;

            return Ok(DecodedRecord {
                kind: RecordKind::Definition,
                next_offset,
                fields: None,
            });
        }
        Right(time_offset) => time_offset,
    };

    let compressed_timestamp = time_offset.map(|t| time.advance(t));

    let (definition, fallback) = definitions
        .resolve(local)
        .ok_or(RecordError::UndefinedLocalMessage(local))?;

    if fallback {
        warn!(local, "no definition for local message, using local message 0");
    }

    let message = profile.message(definition.global_message_number);
    let name = message.map_or("unknown", |m| m.name.as_str());

    let mut fields = Fields::new();
    let mut keys = Keys::default();

    let mut j = i + 1;

    for field in &definition.fields {
        let raw = read_field(r, field, j).ok_or(RecordError::EndOfSlice { offset: j })?;
        j += usize::from(field.byte_size);

        let base_type = BaseType::from_number(field.base_type_code);
        if is_invalid(&raw, &field.semantic_type, base_type) {
            continue;
        }

        if field.is_developer_field {
            if let Some(field_name) = &field.field_name {
                let value = match raw {
                    RawValue::Unsigned(x) => Value::Integer(i64::from(x)),
                    RawValue::Signed(x) => Value::Integer(i64::from(x)),
                    RawValue::Text(text) => Value::Text(text),
                };
                fields.insert(field_name.clone(), value);
            }
            continue;
        }

        // Fields missing from the profile are skipped.
        let Some(attributes) = message.and_then(|m| m.field(field.field_number)) else {
            continue;
        };

        keys.capture(&attributes.field, &raw);

        let value = format(
            &raw,
            &attributes.kind,
            attributes.scale,
            attributes.offset,
            profile,
            time,
        );
        fields.insert(
            attributes.field.clone(),
            apply_units(value, &attributes.field, options),
        );

        if let Some(bits) = raw.bits() {
            for (component, x) in unpack(bits, field.byte_size, &attributes.components) {
                let value = format(
                    &RawValue::Unsigned(x),
                    &component.kind,
                    component.scale,
                    component.offset,
                    profile,
                    time,
                );
                // Components keep their native units.
                fields.insert(component.field.clone(), value);
            }
        }
    }

    match name {
        "field_description" => register_developer_field(&keys, &fields, developer_fields),
        "monitoring" => {
            if let Some(timestamp) = keys.timestamp {
                time.set_monitoring(timestamp);
                insert_timestamp(&mut fields, timestamp);
            } else if let Some(timestamp16) = keys.timestamp16 {
                let timestamp = time.merge_timestamp16(timestamp16 as u16);
                insert_timestamp(&mut fields, timestamp);
            }
        }
        _ => {}
    }

    if let Some(timestamp) = compressed_timestamp {
        if !fields.contains_key("timestamp") {
            insert_timestamp(&mut fields, timestamp);
        }
    }

    if name == "record" && options.elapsed_record_field {
        let timestamp = fields.get("timestamp").and_then(Value::as_timestamp);

        if let (Some(timestamp), Some(start)) = (timestamp, start) {
            let elapsed = (timestamp - start).num_milliseconds() as f64 / 1000.0;
            fields.insert("elapsed_time".to_string(), Value::Float(elapsed));
        }
    }

    trace!(name, offset = i, next_offset = j, fields = fields.len(), "decoded record");

    Ok(DecodedRecord {
        kind: RecordKind::Message(name.to_string()),
        next_offset: j,
        fields: Some(fields),
    })
}

fn insert_timestamp(fields: &mut Fields, timestamp: u32) {
    if let Some(t) = to_datetime(timestamp) {
        fields.insert("timestamp".to_string(), Value::Timestamp(t));
    }
}

fn register_developer_field(keys: &Keys, fields: &Fields, table: &mut DeveloperFieldTable) {
    let (Some(developer_data_index), Some(field_number)) =
        (keys.developer_data_index, keys.field_definition_number)
    else {
        warn!("field description without developer data index or field number");
        return;
    };

    let (developer_data_index, field_number) = (developer_data_index as u8, field_number as u8);

    let field_name = match fields.get("field_name").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => format!("developer_{developer_data_index}_{field_number}"),
    };

    let base_type_id = keys
        .fit_base_type_id
        .map_or(BaseType::Byte.number(), |x| x as u8);

    debug!(
        developer_data_index,
        field_number,
        base_type_id,
        %field_name,
        "described developer field"
    );

    table.register(
        developer_data_index,
        field_number,
        DeveloperFieldDescriptor {
            base_type_id,
            field_name,
        },
    );
}
