//! Message profiles and enumerated type dictionaries.
//!
//! Decoding consults a [`Profile`] to name the fields of each global message,
//! and to give them a semantic type, scale, offset, and component
//! decomposition. [`ProfileTables`] is an owned implementation which can be
//! deserialized from a full profile export, or built with
//! [`ProfileTables::standard`] for a small subset of common messages.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::sans::data::BaseType;

/// A named sub-field packed into some bits of a parent field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Component {
    /// Name of the field receiving this component.
    pub field: String,
    /// Number of bits taken from the parent, low-order first.
    pub bits: u8,
    /// Semantic type of the component.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub offset: f64,
}

/// Profile attributes of a single field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldProfile {
    /// Canonical field name.
    pub field: String,
    /// Semantic type: either a base type name, or the name of an enumerated
    /// or special type (such as `date_time`).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl FieldProfile {
    pub fn new(field: &str, kind: &str) -> Self {
        Self {
            field: field.to_string(),
            kind: kind.to_string(),
            scale: None,
            offset: 0.0,
            components: Vec::new(),
        }
    }

    pub fn scaled(mut self, scale: f64, offset: f64) -> Self {
        self.scale = Some(scale);
        self.offset = offset;
        self
    }

    pub fn component(mut self, field: &str, bits: u8, kind: &str, scale: Option<f64>) -> Self {
        self.components.push(Component {
            field: field.to_string(),
            bits,
            kind: kind.to_string(),
            scale,
            offset: 0.0,
        });
        self
    }
}

/// Profile of a global message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageProfile {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<u8, FieldProfile>,
}

impl MessageProfile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: BTreeMap::new(),
        }
    }

    /// Look up a field by its number.
    pub fn field(&self, number: u8) -> Option<&FieldProfile> {
        self.fields.get(&number)
    }

    fn with(mut self, number: u8, field: FieldProfile) -> Self {
        self.fields.insert(number, field);
        self
    }
}

/// Read-only lookups consulted while decoding.
///
/// Implementations must not change while a session is decoding with them.
pub trait Profile {
    /// Look up a global message by number.
    fn message(&self, number: u16) -> Option<&MessageProfile>;

    /// Look up the label table of an enumerated type, if `kind` names one.
    fn enumeration(&self, kind: &str) -> Option<&BTreeMap<u32, String>>;

    /// Look up the width in bytes of a single value of a base type.
    fn base_type_size(&self, code: u8) -> Option<u8> {
        BaseType::from_number(code).map(BaseType::size)
    }
}

/// An owned message profile directory and type dictionary.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileTables {
    #[serde(default)]
    pub messages: BTreeMap<u16, MessageProfile>,
    #[serde(default)]
    pub types: BTreeMap<String, BTreeMap<u32, String>>,
}

impl Profile for ProfileTables {
    fn message(&self, number: u16) -> Option<&MessageProfile> {
        self.messages.get(&number)
    }

    fn enumeration(&self, kind: &str) -> Option<&BTreeMap<u32, String>> {
        self.types.get(kind)
    }
}

impl ProfileTables {
    /// Tables for a subset of common messages and types.
    pub fn standard() -> Self {
        use FieldProfile as F;

        let messages = [
            (
                0,
                MessageProfile::new("file_id")
                    .with(0, F::new("type", "file"))
                    .with(1, F::new("manufacturer", "manufacturer"))
                    .with(2, F::new("product", "uint16"))
                    .with(3, F::new("serial_number", "uint32z"))
                    .with(4, F::new("time_created", "date_time"))
                    .with(5, F::new("number", "uint16"))
                    .with(8, F::new("product_name", "string")),
            ),
            (
                18,
                MessageProfile::new("session")
                    .with(253, F::new("timestamp", "date_time"))
                    .with(254, F::new("message_index", "message_index"))
                    .with(0, F::new("event", "event"))
                    .with(1, F::new("event_type", "event_type"))
                    .with(2, F::new("start_time", "date_time"))
                    .with(5, F::new("sport", "sport"))
                    .with(7, F::new("total_elapsed_time", "uint32").scaled(1000.0, 0.0))
                    .with(8, F::new("total_timer_time", "uint32").scaled(1000.0, 0.0))
                    .with(9, F::new("total_distance", "uint32").scaled(100.0, 0.0))
                    .with(14, F::new("avg_speed", "uint16").scaled(1000.0, 0.0))
                    .with(15, F::new("max_speed", "uint16").scaled(1000.0, 0.0))
                    .with(16, F::new("avg_heart_rate", "uint8"))
                    .with(17, F::new("max_heart_rate", "uint8"))
                    .with(22, F::new("total_ascent", "uint16"))
                    .with(23, F::new("total_descent", "uint16"))
                    .with(37, F::new("left_right_balance", "left_right_balance_100"))
                    .with(57, F::new("avg_temperature", "sint8"))
                    .with(58, F::new("max_temperature", "sint8")),
            ),
            (
                19,
                MessageProfile::new("lap")
                    .with(253, F::new("timestamp", "date_time"))
                    .with(254, F::new("message_index", "message_index"))
                    .with(2, F::new("start_time", "date_time"))
                    .with(7, F::new("total_elapsed_time", "uint32").scaled(1000.0, 0.0))
                    .with(9, F::new("total_distance", "uint32").scaled(100.0, 0.0))
                    .with(13, F::new("avg_speed", "uint16").scaled(1000.0, 0.0))
                    .with(15, F::new("avg_heart_rate", "uint8")),
            ),
            (
                20,
                MessageProfile::new("record")
                    .with(253, F::new("timestamp", "date_time"))
                    .with(0, F::new("position_lat", "sint32"))
                    .with(1, F::new("position_long", "sint32"))
                    .with(2, F::new("altitude", "uint16").scaled(5.0, -500.0))
                    .with(3, F::new("heart_rate", "uint8"))
                    .with(4, F::new("cadence", "uint8"))
                    .with(5, F::new("distance", "uint32").scaled(100.0, 0.0))
                    .with(
                        6,
                        F::new("speed", "uint16")
                            .scaled(1000.0, 0.0)
                            .component("enhanced_speed", 16, "uint32", Some(1000.0)),
                    )
                    .with(7, F::new("power", "uint16"))
                    .with(
                        8,
                        F::new("compressed_speed_distance", "byte")
                            .component("speed", 12, "uint16", Some(100.0))
                            .component("distance", 12, "uint32", Some(16.0)),
                    )
                    .with(13, F::new("temperature", "sint8"))
                    .with(30, F::new("left_right_balance", "left_right_balance"))
                    .with(73, F::new("enhanced_speed", "uint32").scaled(1000.0, 0.0))
                    .with(78, F::new("enhanced_altitude", "uint32").scaled(5.0, -500.0)),
            ),
            (
                21,
                MessageProfile::new("event")
                    .with(253, F::new("timestamp", "date_time"))
                    .with(0, F::new("event", "event"))
                    .with(1, F::new("event_type", "event_type"))
                    .with(2, F::new("data16", "uint16"))
                    .with(3, F::new("data", "uint32"))
                    .with(4, F::new("event_group", "uint8")),
            ),
            (
                23,
                MessageProfile::new("device_info")
                    .with(253, F::new("timestamp", "date_time"))
                    .with(0, F::new("device_index", "uint8"))
                    .with(2, F::new("manufacturer", "manufacturer"))
                    .with(3, F::new("serial_number", "uint32z"))
                    .with(4, F::new("product", "uint16"))
                    .with(5, F::new("software_version", "uint16").scaled(100.0, 0.0)),
            ),
            (
                34,
                MessageProfile::new("activity")
                    .with(253, F::new("timestamp", "date_time"))
                    .with(0, F::new("total_timer_time", "uint32").scaled(1000.0, 0.0))
                    .with(1, F::new("num_sessions", "uint16"))
                    .with(5, F::new("local_timestamp", "local_date_time")),
            ),
            (
                55,
                MessageProfile::new("monitoring")
                    .with(253, F::new("timestamp", "date_time"))
                    .with(2, F::new("distance", "uint32").scaled(100.0, 0.0))
                    .with(3, F::new("cycles", "uint32").scaled(2.0, 0.0))
                    .with(5, F::new("activity_type", "activity_type"))
                    .with(19, F::new("active_calories", "uint16"))
                    .with(24, F::new("current_activity_type_intensity", "byte"))
                    .with(26, F::new("timestamp16", "uint16"))
                    .with(27, F::new("heart_rate", "uint8")),
            ),
            (
                206,
                MessageProfile::new("field_description")
                    .with(0, F::new("developer_data_index", "uint8"))
                    .with(1, F::new("field_definition_number", "uint8"))
                    .with(2, F::new("fit_base_type_id", "uint8"))
                    .with(3, F::new("field_name", "string"))
                    .with(6, F::new("scale", "uint8"))
                    .with(7, F::new("offset", "sint8"))
                    .with(8, F::new("units", "string"))
                    .with(15, F::new("native_mesg_num", "mesg_num"))
                    .with(14, F::new("native_field_num", "uint8")),
            ),
            (
                207,
                MessageProfile::new("developer_data_id")
                    .with(0, F::new("developer_id", "byte"))
                    .with(1, F::new("application_id", "byte"))
                    .with(2, F::new("manufacturer_id", "manufacturer"))
                    .with(3, F::new("developer_data_index", "uint8"))
                    .with(4, F::new("application_version", "uint32")),
            ),
        ];

        let types = [
            (
                "file",
                &[
                    (1, "device"),
                    (2, "settings"),
                    (4, "activity"),
                    (6, "course"),
                    (15, "monitoring_a"),
                    (32, "monitoring_b"),
                ][..],
            ),
            (
                "manufacturer",
                &[
                    (1, "garmin"),
                    (15, "dynastream"),
                    (23, "suunto"),
                    (32, "wahoo_fitness"),
                    (255, "development"),
                    (265, "strava"),
                    (294, "coros"),
                ][..],
            ),
            (
                "sport",
                &[
                    (0, "generic"),
                    (1, "running"),
                    (2, "cycling"),
                    (5, "swimming"),
                    (11, "walking"),
                    (17, "hiking"),
                ][..],
            ),
            (
                "event",
                &[(0, "timer"), (3, "workout"), (8, "session"), (9, "lap"), (26, "activity")][..],
            ),
            (
                "event_type",
                &[
                    (0, "start"),
                    (1, "stop"),
                    (3, "marker"),
                    (4, "stop_all"),
                    (8, "stop_disable"),
                    (9, "stop_disable_all"),
                ][..],
            ),
            (
                "activity_type",
                &[
                    (0, "generic"),
                    (1, "running"),
                    (2, "cycling"),
                    (5, "swimming"),
                    (6, "walking"),
                    (8, "sedentary"),
                ][..],
            ),
            (
                "mesg_num",
                &[
                    (0, "file_id"),
                    (18, "session"),
                    (19, "lap"),
                    (20, "record"),
                    (21, "event"),
                    (23, "device_info"),
                    (34, "activity"),
                    (55, "monitoring"),
                ][..],
            ),
        ];

        Self {
            messages: messages.into_iter().collect(),
            types: types
                .into_iter()
                .map(|(kind, labels)| {
                    let labels = labels.iter().map(|(x, l)| (*x, l.to_string())).collect();
                    (kind.to_string(), labels)
                })
                .collect(),
        }
    }
}
