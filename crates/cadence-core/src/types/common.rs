//! Common types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Duration in whole seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Duration(pub u64);

impl Duration {
    pub const fn from_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    pub const fn as_seconds(&self) -> u64 {
        self.0
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Format as MM:SS or HH:MM:SS.
    pub fn format(&self) -> String {
        let total_secs = self.0;
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

impl From<u64> for Duration {
    fn from(seconds: u64) -> Self {
        Self(seconds)
    }
}

/// Format a fractional playback position as MM:SS, treating NaN and negatives as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_position(seconds: f64) -> String {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration(0).format();
    }
    Duration(seconds.floor() as u64).format()
}

/// Volume level (0.0 to 1.0).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Volume(f32);

impl Volume {
    pub const MIN: Self = Self(0.0);
    pub const MAX: Self = Self(1.0);
    pub const DEFAULT: Self = Self(1.0);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub const fn as_f32(&self) -> f32 {
        self.0
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_percentage(&self) -> u8 {
        (self.0 * 100.0).round() as u8
    }

    pub fn is_muted(&self) -> bool {
        self.0 <= 0.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<f32> for Volume {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_format() {
        assert_eq!(Duration::from_seconds(65).format(), "1:05");
        assert_eq!(Duration::from_seconds(3661).format(), "1:01:01");
        assert_eq!(Duration::from_seconds(0).format(), "0:00");
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(59.9), "0:59");
        assert_eq!(format_position(f64::NAN), "0:00");
        assert_eq!(format_position(-4.0), "0:00");
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_volume_clamping() {
        assert_eq!(Volume::new(1.5).as_f32(), 1.0);
        assert_eq!(Volume::new(-0.5).as_f32(), 0.0);
        assert_eq!(Volume::new(0.5).as_f32(), 0.5);
        assert_eq!(Volume::new(f32::NAN), Volume::MIN);
        assert_eq!(Volume::new(0.5).as_percentage(), 50);
        assert!(Volume::MIN.is_muted());
    }
}
