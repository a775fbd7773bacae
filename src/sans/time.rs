//! Rolling timestamp reconstruction.

use chrono::{DateTime, Utc};

/// Seconds between the Unix epoch and the protocol epoch (1989-12-31).
pub const EPOCH_OFFSET: i64 = 631_065_600;

/// Convert seconds since the protocol epoch to an absolute time.
pub fn to_datetime(seconds: u32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::from(seconds) + EPOCH_OFFSET, 0)
}

/// Timestamp counters carried between records of a single document.
///
/// Both counters hold seconds since the protocol epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampState {
    compressed: u32,
    last_time_offset: u8,
    monitoring: u32,
}

impl TimestampState {
    /// Seed the compressed timestamp counter from a full timestamp.
    pub fn seed(&mut self, timestamp: u32) {
        self.compressed = timestamp;
        self.last_time_offset = (timestamp & 0x1F) as u8;
    }

    /// Advance the compressed timestamp counter by the five bit time offset of
    /// a compressed timestamp header.
    ///
    /// Returns the reconstructed timestamp.
    pub fn advance(&mut self, time_offset: u8) -> u32 {
        let time_offset = time_offset & 0x1F;
        let delta = time_offset.wrapping_sub(self.last_time_offset) & 0x1F;

        self.compressed = self.compressed.wrapping_add(u32::from(delta));
        self.last_time_offset = time_offset;

        self.compressed
    }

    /// The compressed timestamp counter.
    pub fn compressed(&self) -> u32 {
        self.compressed
    }

    /// Replace the monitoring counter with a full timestamp.
    pub fn set_monitoring(&mut self, timestamp: u32) {
        self.monitoring = timestamp;
    }

    /// Merge a 16 bit timestamp into the monitoring counter, assuming less
    /// than one rollover since the last merge.
    ///
    /// Returns the merged timestamp.
    pub fn merge_timestamp16(&mut self, timestamp16: u16) -> u32 {
        let delta = u32::from(timestamp16).wrapping_sub(self.monitoring & 0xFFFF) & 0xFFFF;
        self.monitoring = self.monitoring.wrapping_add(delta);
        self.monitoring
    }

    /// The monitoring counter.
    pub fn monitoring(&self) -> u32 {
        self.monitoring
    }

    /// Clear both counters, as at the start of a document.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
