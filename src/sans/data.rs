//! Base types and raw field values.

use either::Either::{Left, Right};

use super::definition::FieldDefinition;

macro_rules! base_types {
    ($(
        $t:ident = $number:literal, $name:literal, $size:literal, $invalid:literal,
        $(#[$attr:meta])*;
    )*) => {
        /// A base type, identifying how field bytes are stored.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum BaseType {
            $($(#[$attr])* $t,)*
        }

        impl BaseType {
            /// Resolve a base type from its number (the low four bits of a
            /// base type byte).
            pub fn from_number(number: u8) -> Option<Self> {
                match number {
                    $($number => Some(Self::$t),)*
                    _ => None,
                }
            }

            /// Resolve a base type from its protocol name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$t),)*
                    _ => None,
                }
            }

            /// The base type number.
            pub fn number(self) -> u8 {
                match self {
                    $(Self::$t => $number,)*
                }
            }

            /// The protocol name of this base type.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$t => $name,)*
                }
            }

            /// The width of a single value of this base type in bytes.
            pub fn size(self) -> u8 {
                match self {
                    $(Self::$t => $size,)*
                }
            }

            /// The 'invalid' marker value, truncated to 32 bits.
            pub fn invalid(self) -> u32 {
                match self {
                    $(Self::$t => $invalid,)*
                }
            }
        }
    };
}

base_types! {
    Enum = 0, "enum", 1, 0xFF, /** `enum` */;
    Sint8 = 1, "sint8", 1, 0x7F, /** `sint8` */;
    Uint8 = 2, "uint8", 1, 0xFF, /** `uint8` */;
    Sint16 = 3, "sint16", 2, 0x7FFF, /** `sint16` */;
    Uint16 = 4, "uint16", 2, 0xFFFF, /** `uint16` */;
    Sint32 = 5, "sint32", 4, 0x7FFF_FFFF, /** `sint32` */;
    Uint32 = 6, "uint32", 4, 0xFFFF_FFFF, /** `uint32` */;
    String = 7, "string", 1, 0x00, /** `string`, null terminated UTF-8 */;
    Float32 = 8, "float32", 4, 0xFFFF_FFFF, /** `float32` */;
    Float64 = 9, "float64", 8, 0xFFFF_FFFF, /** `float64` */;
    Uint8z = 10, "uint8z", 1, 0x00, /** `uint8z` */;
    Uint16z = 11, "uint16z", 2, 0x0000, /** `uint16z` */;
    Uint32z = 12, "uint32z", 4, 0x0000_0000, /** `uint32z` */;
    Byte = 13, "byte", 1, 0xFF, /** `byte` */;
    Sint64 = 14, "sint64", 8, 0xFFFF_FFFF, /** `sint64` */;
    Uint64 = 15, "uint64", 8, 0xFFFF_FFFF, /** `uint64` */;
    Uint64z = 16, "uint64z", 8, 0x0000_0000, /** `uint64z` */;
}

/// A field value as stored, before formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A multi-byte or single-byte integer.
    Unsigned(u32),
    /// A multi-byte integer of the `sint32` kind.
    Signed(i32),
    /// A string, cut at its first null byte.
    Text(String),
}

impl RawValue {
    /// The integer bit pattern of this value, if it is not a string.
    pub fn bits(&self) -> Option<u32> {
        match self {
            Self::Unsigned(x) => Some(*x),
            Self::Signed(x) => Some(*x as u32),
            Self::Text(_) => None,
        }
    }
}

/// Concatenate bytes into an unsigned integer in the given byte order.
///
/// Bytes past the fourth least significant are discarded.
pub fn read_integer(r: &[u8], is_little_endian: bool) -> u32 {
    let bytes = if is_little_endian {
        Left(r.iter())
    } else {
        Right(r.iter().rev())
    };

    bytes.enumerate().fold(0, |acc, (i, b)| {
        acc | u32::from(*b).checked_shl(8 * i as u32).unwrap_or(0)
    })
}

/// Read the raw value of a field starting at offset `i`.
///
/// Returns `None` if the field runs past the end of the slice. Strings and
/// endian sensitive integers are read over their full declared width; other
/// fields are read from their first byte.
pub fn read_field(r: &[u8], field: &FieldDefinition, i: usize) -> Option<RawValue> {
    let bytes = r.get(i..i + usize::from(field.byte_size))?;

    if field.is_endian_sensitive {
        let x = read_integer(bytes, field.is_little_endian);

        return Some(if field.semantic_type == "sint32" {
            RawValue::Signed(x as i32)
        } else {
            RawValue::Unsigned(x)
        });
    }

    if field.semantic_type == "string" {
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        let text = String::from_utf8_lossy(&bytes[..end]).into_owned();

        return Some(RawValue::Text(text));
    }

    // A zero width field holds no data.
    let x = match bytes.first() {
        Some(b) => u32::from(*b),
        None => BaseType::from_number(field.base_type_code).map_or(0xFF, BaseType::invalid),
    };

    Some(RawValue::Unsigned(x))
}
