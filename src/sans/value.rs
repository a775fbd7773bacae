//! Formatting raw values into field values.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{profile::Profile, units::DecodeOptions};

use super::{
    data::{BaseType, RawValue},
    time::{TimestampState, to_datetime},
};

/// Degrees per semicircle, applied to signed 16 and 32 bit values.
pub const SEMICIRCLES_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Label of an enumerated type.
    Label(String),
    Timestamp(DateTime<Utc>),
    /// Left and right power contributions, in percent.
    Balance { left: f64, right: f64 },
}

impl Value {
    /// The value as a float, if numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(x) => Some(*x as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Label(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

/// The 'invalid' marker of a semantic type.
///
/// Types without a marker of their own use that of the field's base type.
fn invalid_marker(semantic_type: &str, base_type: Option<BaseType>) -> Option<u32> {
    match semantic_type {
        "left_right_balance" => Some(0xFF),
        "left_right_balance_100" => Some(0xFFFF),
        _ => BaseType::from_name(semantic_type)
            .or(base_type)
            .map(BaseType::invalid),
    }
}

/// Check whether a raw value holds the 'invalid' marker of its type.
pub fn is_invalid(raw: &RawValue, semantic_type: &str, base_type: Option<BaseType>) -> bool {
    match raw {
        RawValue::Text(text) => text.is_empty(),
        raw => raw.bits() == invalid_marker(semantic_type, base_type),
    }
}

/// Format a raw value according to its semantic type, scale, and offset.
///
/// Formatting a `date_time` seeds the compressed timestamp counter. Only
/// `sint32` values are read as signed: a `sint16` value is scaled as its
/// unsigned bit pattern, and a `sint8` value passes through as its byte.
pub fn format(
    raw: &RawValue,
    semantic_type: &str,
    scale: Option<f64>,
    offset: f64,
    profile: &impl Profile,
    time: &mut TimestampState,
) -> Value {
    let x = match raw {
        RawValue::Text(text) => return Value::Text(text.clone()),
        RawValue::Unsigned(x) => *x,
        RawValue::Signed(x) => *x as u32,
    };

    match semantic_type {
        "date_time" => {
            time.seed(x);
            to_datetime(x).map_or(Value::Integer(i64::from(x)), Value::Timestamp)
        }
        "left_right_balance" => {
            let right = f64::from(x & 0x7F);
            Value::Balance {
                left: 100.0 - right,
                right,
            }
        }
        "left_right_balance_100" => {
            let right = f64::from(x & 0x3FFF) / 100.0;
            Value::Balance {
                left: 100.0 - right,
                right,
            }
        }
        "sint32" => Value::Float(f64::from(x as i32) * SEMICIRCLES_TO_DEGREES),
        "sint16" => Value::Float(f64::from(x) * SEMICIRCLES_TO_DEGREES),
        "uint32" | "uint16" => match scale {
            Some(scale) if scale != 0.0 => Value::Float(f64::from(x) / scale + offset),
            _ => Value::Integer(i64::from(x)),
        },
        "float32" => Value::Float(f64::from(f32::from_bits(x))),
        kind => match profile.enumeration(kind) {
            Some(labels) => labels
                .get(&x)
                .map_or(Value::Integer(i64::from(x)), |l| Value::Label(l.clone())),
            None => Value::Integer(i64::from(x)),
        },
    }
}

/// Convert a numeric value of a named field into the units selected by the
/// options. Other values pass through unchanged.
pub fn apply_units(value: Value, field: &str, options: &DecodeOptions) -> Value {
    let Some(family) = crate::units::unit_family(field) else {
        return value;
    };

    let conversion = options.conversion(family);
    if conversion.is_identity() {
        return value;
    }

    match value.as_f64() {
        Some(x) => Value::Float(conversion.apply(x)),
        None => value,
    }
}
