//! Expansion of bit-packed component fields.

use crate::profile::Component;

/// Split the raw value of a field `byte_size` bytes wide into its
/// components.
///
/// Components take consecutive bits, low-order first, and may span byte
/// boundaries. Bits past the width of the field read as zero.
pub fn unpack<'a>(
    raw: u32,
    byte_size: u8,
    components: &'a [Component],
) -> impl Iterator<Item = (&'a Component, u32)> + 'a {
    let width = (u32::from(byte_size) * 8).min(u32::BITS);
    let mut offset = 0;

    components.iter().map(move |component| {
        let bits = u32::from(component.bits).min(u32::BITS);

        let mut value = 0;
        let mut filled = 0;

        while filled < bits && offset < width {
            // Bits left in the current byte of the field.
            let available = (8 - offset % 8).min(width - offset);
            let take = available.min(bits - filled);

            value |= ((raw >> offset) & mask(take)) << filled;

            filled += take;
            offset += take;
        }

        offset += bits - filled;

        (component, value)
    })
}

fn mask(bits: u32) -> u32 {
    u32::MAX.checked_shr(u32::BITS - bits).unwrap_or(0)
}
