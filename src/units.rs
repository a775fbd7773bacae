//! Unit dictionary and decoding options.

use std::{collections::HashMap, sync::LazyLock};

use serde::Deserialize;

/// A linear conversion from a field's native unit, `x * multiplier + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub multiplier: f64,
    pub offset: f64,
}

impl Conversion {
    pub const IDENTITY: Self = Self {
        multiplier: 1.0,
        offset: 0.0,
    };

    const fn scale(multiplier: f64) -> Self {
        Self {
            multiplier,
            offset: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn apply(&self, x: f64) -> f64 {
        x * self.multiplier + self.offset
    }
}

/// Unit for speed fields, natively metres per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SpeedUnit {
    #[default]
    #[serde(rename = "m/s")]
    MetersPerSecond,
    #[serde(rename = "km/h")]
    KilometersPerHour,
    #[serde(rename = "mph")]
    MilesPerHour,
}

impl SpeedUnit {
    pub fn conversion(self) -> Conversion {
        match self {
            Self::MetersPerSecond => Conversion::IDENTITY,
            Self::KilometersPerHour => Conversion::scale(3.6),
            Self::MilesPerHour => Conversion::scale(3.6 / 1.609344),
        }
    }
}

/// Unit for length and distance fields, natively metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LengthUnit {
    #[default]
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "mi")]
    Miles,
}

impl LengthUnit {
    pub fn conversion(self) -> Conversion {
        match self {
            Self::Meters => Conversion::IDENTITY,
            Self::Kilometers => Conversion::scale(1.0 / 1000.0),
            Self::Miles => Conversion::scale(1.0 / 1609.344),
        }
    }
}

/// Unit for temperature fields, natively degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Kelvin,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn conversion(self) -> Conversion {
        match self {
            Self::Celsius => Conversion::IDENTITY,
            Self::Kelvin => Conversion {
                multiplier: 1.0,
                offset: 273.15,
            },
            Self::Fahrenheit => Conversion {
                multiplier: 1.8,
                offset: 32.0,
            },
        }
    }
}

/// The family of units a field is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Speed,
    Length,
    Temperature,
}

static UNIT_FAMILIES: LazyLock<HashMap<&'static str, UnitFamily>> = LazyLock::new(|| {
    const SPEED: &[&str] = &[
        "speed",
        "enhanced_speed",
        "vertical_speed",
        "avg_speed",
        "max_speed",
        "speed_1s",
        "ball_speed",
        "enhanced_avg_speed",
        "enhanced_max_speed",
        "avg_pos_vertical_speed",
        "max_pos_vertical_speed",
        "avg_neg_vertical_speed",
        "max_neg_vertical_speed",
    ];
    const LENGTH: &[&str] = &[
        "distance",
        "total_distance",
        "enhanced_avg_altitude",
        "enhanced_min_altitude",
        "enhanced_max_altitude",
        "enhanced_altitude",
        "height",
        "odometer",
        "avg_stroke_distance",
        "min_altitude",
        "avg_altitude",
        "max_altitude",
        "total_ascent",
        "total_descent",
        "altitude",
        "cycle_length",
        "auto_wheelsize",
        "custom_wheelsize",
        "gps_accuracy",
    ];
    const TEMPERATURE: &[&str] = &["temperature", "avg_temperature", "max_temperature"];

    let families = [
        (SPEED, UnitFamily::Speed),
        (LENGTH, UnitFamily::Length),
        (TEMPERATURE, UnitFamily::Temperature),
    ];

    families
        .into_iter()
        .flat_map(|(names, family)| names.iter().map(move |name| (*name, family)))
        .collect()
});

/// Look up the unit family of a field by name.
pub fn unit_family(field: &str) -> Option<UnitFamily> {
    UNIT_FAMILIES.get(field).copied()
}

/// Options controlling how field values are presented.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub speed_unit: SpeedUnit,
    pub length_unit: LengthUnit,
    pub temperature_unit: TemperatureUnit,
    /// Derive `elapsed_time` (in seconds since the start time) for `record`
    /// messages.
    pub elapsed_record_field: bool,
    /// Decode a document whose trailing CRC does not match, rather than
    /// failing.
    pub force: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            speed_unit: SpeedUnit::default(),
            length_unit: LengthUnit::default(),
            temperature_unit: TemperatureUnit::default(),
            elapsed_record_field: false,
            force: true,
        }
    }
}

impl DecodeOptions {
    /// The conversion selected for a unit family.
    pub fn conversion(&self, family: UnitFamily) -> Conversion {
        match family {
            UnitFamily::Speed => self.speed_unit.conversion(),
            UnitFamily::Length => self.length_unit.conversion(),
            UnitFamily::Temperature => self.temperature_unit.conversion(),
        }
    }
}
