//! GNSS positioning types and adapter interface

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::error::PaResult;
use crate::handler::{Handler, HandlerRef};

/// Set of satellite constellations used in the position solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstellationMask(pub u32);

impl ConstellationMask {
    pub const GPS: Self = Self(1 << 0);
    pub const GLONASS: Self = Self(1 << 1);
    pub const BEIDOU: Self = Self(1 << 2);
    pub const GALILEO: Self = Self(1 << 3);

    /// Empty mask
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit value
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Check whether every constellation in `other` is included
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if no constellation is selected
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Default for ConstellationMask {
    fn default() -> Self {
        Self::GPS
    }
}

impl BitOr for ConstellationMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ConstellationMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// UTC time attached to a position fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GnssTime {
    pub hours: u16,
    pub minutes: u16,
    pub seconds: u16,
    pub milliseconds: u16,
    pub year: u16,
    pub month: u16,
    pub day: u16,
}

/// A position fix
///
/// Latitude and longitude are in millionths of a degree, altitude in
/// meters, horizontal speed in meters per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GnssPosition {
    pub latitude: i32,
    pub longitude: i32,
    pub altitude: i32,
    pub h_speed: u32,
    /// Fix dimension (0 = none, 2 = 2D, 3 = 3D)
    pub dimension: u8,
    pub hdop: u16,
    pub vdop: u16,
    pub time: GnssTime,
}

impl GnssPosition {
    /// Latitude in decimal degrees
    pub fn latitude_deg(&self) -> f64 {
        self.latitude as f64 / 1_000_000.0
    }

    /// Longitude in decimal degrees
    pub fn longitude_deg(&self) -> f64 {
        self.longitude as f64 / 1_000_000.0
    }
}

impl fmt::Display for GnssPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}, {:.6} alt {}m ({:04}-{:02}-{:02} {:02}:{:02}:{:02})",
            self.latitude_deg(),
            self.longitude_deg(),
            self.altitude,
            self.time.year,
            self.time.month,
            self.time.day,
            self.time.hours,
            self.time.minutes,
            self.time.seconds
        )
    }
}

/// GNSS engine restart kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RestartType {
    Hot,
    Warm,
    Cold,
    Factory,
}

/// Assisted-GNSS mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssistedMode {
    Standalone,
    MsBased,
    MsAssisted,
}

/// Validity window of an extended ephemeris file, seconds since the epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EphemerisValidity {
    pub start: u64,
    pub stop: u64,
}

/// Interface to the GNSS engine
pub trait GnssAdapter {
    /// Initialize the engine
    fn init(&mut self) -> PaResult<()>;
    /// Release the engine
    fn release(&mut self) -> PaResult<()>;

    /// Select the constellations to track
    fn set_constellation(&mut self, mask: ConstellationMask) -> PaResult<()>;
    /// Currently tracked constellations
    fn get_constellation(&self) -> PaResult<ConstellationMask>;

    /// Start acquiring fixes
    fn start(&mut self) -> PaResult<()>;
    /// Stop acquiring fixes
    fn stop(&mut self) -> PaResult<()>;

    /// Set the acquisition rate in milliseconds
    fn set_acquisition_rate(&mut self, rate_ms: u32) -> PaResult<()>;
    /// Get the acquisition rate in milliseconds
    fn get_acquisition_rate(&self) -> PaResult<u32>;

    /// Register a position fix handler
    fn add_position_handler(&mut self, handler: Handler<GnssPosition>) -> HandlerRef;
    /// Unregister a position fix handler
    fn remove_position_handler(&mut self, handler_ref: HandlerRef);

    /// Most recent position fix
    fn get_last_position(&self) -> PaResult<GnssPosition>;

    /// Load extended ephemeris data from a file
    fn load_extended_ephemeris_file(&mut self, path: &std::path::Path) -> PaResult<()>;
    /// Validity window of the loaded ephemeris data
    fn get_extended_ephemeris_validity(&self) -> PaResult<EphemerisValidity>;
    /// Use the loaded ephemeris data
    fn enable_extended_ephemeris_file(&mut self) -> PaResult<()>;
    /// Stop using the loaded ephemeris data
    fn disable_extended_ephemeris_file(&mut self) -> PaResult<()>;

    /// Force a restart of the given kind
    fn force_restart(&mut self, restart: RestartType) -> PaResult<()>;

    /// Time to first fix in milliseconds
    fn get_ttff(&self) -> PaResult<u32>;

    /// Power the engine on
    fn enable(&mut self) -> PaResult<()>;
    /// Power the engine off
    fn disable(&mut self) -> PaResult<()>;

    /// Set the SUPL assisted mode
    fn set_supl_assisted_mode(&mut self, mode: AssistedMode) -> PaResult<()>;
    /// Get the SUPL assisted mode
    fn get_supl_assisted_mode(&self) -> PaResult<AssistedMode>;
    /// Set the SUPL server URL
    fn set_supl_server_url(&mut self, url: &str) -> PaResult<()>;
    /// Inject a SUPL certificate under `id`
    fn inject_supl_certificate(&mut self, id: u8, certificate: &[u8]) -> PaResult<()>;
    /// Delete the SUPL certificate stored under `id`
    fn delete_supl_certificate(&mut self, id: u8) -> PaResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constellation_mask() {
        let mut mask = ConstellationMask::GPS;
        assert!(mask.contains(ConstellationMask::GPS));
        assert!(!mask.contains(ConstellationMask::GLONASS));

        mask |= ConstellationMask::GLONASS;
        assert!(mask.contains(ConstellationMask::GPS | ConstellationMask::GLONASS));
        assert_eq!(mask.bits(), 0b11);
        assert!(ConstellationMask::empty().is_empty());
    }

    #[test]
    fn test_position_display() {
        let pos = GnssPosition {
            latitude: 48_858_300,
            longitude: 2_294_400,
            time: GnssTime {
                year: 2013,
                month: 1,
                day: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            pos.to_string(),
            "48.858300, 2.294400 alt 0m (2013-01-01 00:00:00)"
        );
    }
}
