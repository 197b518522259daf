//! Simulated GNSS engine
//!
//! Accepts start/stop and constellation settings, and serves whatever fix
//! was last injected with [`GnssSimulator::report_position`]. Assistance,
//! ephemeris and restart features are not simulated and always fail.

use std::path::Path;

use pa_types::{
    AssistedMode, ConstellationMask, EphemerisValidity, GnssAdapter, GnssPosition, GnssTime,
    Handler, HandlerRef, HandlerRegistry, PaError, PaResult, RestartType,
};
use tracing::{debug, info, warn};

use crate::config::{modem_path, ConfigStore};
use crate::error::SimuError;

/// Canned fix served when the fake position option is enabled
pub const STUB_POSITION: GnssPosition = GnssPosition {
    latitude: 48_858_300,
    longitude: 2_294_400,
    altitude: 0,
    h_speed: 0,
    dimension: 0,
    hdop: 0,
    vdop: 0,
    time: GnssTime {
        hours: 0,
        minutes: 0,
        seconds: 0,
        milliseconds: 0,
        year: 2013,
        month: 1,
        day: 1,
    },
};

/// A simulated GNSS engine
#[derive(Debug, Default)]
pub struct GnssSimulator {
    constellation: ConstellationMask,
    acquisition_rate_ms: Option<u32>,
    started: bool,
    last_position: Option<GnssPosition>,
    position_handlers: HandlerRegistry<GnssPosition>,
}

impl GnssSimulator {
    /// Create an engine with no fix
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine that already holds [`STUB_POSITION`]
    pub fn with_fake_position() -> Self {
        Self {
            last_position: Some(STUB_POSITION),
            ..Self::default()
        }
    }

    /// Create an engine honoring the `gnss/fakePosition` option
    pub fn from_config(config: &ConfigStore) -> Result<Self, SimuError> {
        if config.get_bool(&modem_path("gnss/fakePosition"), false)? {
            Ok(Self::with_fake_position())
        } else {
            Ok(Self::new())
        }
    }

    /// Whether the engine has been started
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Last acquisition rate accepted by `set_acquisition_rate`
    pub fn acquisition_rate_ms(&self) -> Option<u32> {
        self.acquisition_rate_ms
    }

    /// Inject a fix and notify the position handlers
    pub fn report_position(&mut self, position: GnssPosition) {
        debug!("GNSS fix {}", position);
        self.last_position = Some(position);
        self.position_handlers.notify(&position);
    }

    /// Forget the last fix
    pub fn clear_position(&mut self) {
        self.last_position = None;
    }
}

impl GnssAdapter for GnssSimulator {
    fn init(&mut self) -> PaResult<()> {
        info!("PA GNSS Init");
        Ok(())
    }

    fn release(&mut self) -> PaResult<()> {
        self.started = false;
        Ok(())
    }

    fn set_constellation(&mut self, mask: ConstellationMask) -> PaResult<()> {
        self.constellation = mask;
        Ok(())
    }

    fn get_constellation(&self) -> PaResult<ConstellationMask> {
        Ok(self.constellation)
    }

    fn start(&mut self) -> PaResult<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> PaResult<()> {
        self.started = false;
        Ok(())
    }

    fn set_acquisition_rate(&mut self, rate_ms: u32) -> PaResult<()> {
        self.acquisition_rate_ms = Some(rate_ms);
        Ok(())
    }

    fn get_acquisition_rate(&self) -> PaResult<u32> {
        Err(PaError::Fault)
    }

    fn add_position_handler(&mut self, handler: Handler<GnssPosition>) -> HandlerRef {
        self.position_handlers.add(handler)
    }

    fn remove_position_handler(&mut self, handler_ref: HandlerRef) {
        if !self.position_handlers.remove(handler_ref) {
            warn!("Unknown position handler {:?}", handler_ref);
        }
    }

    fn get_last_position(&self) -> PaResult<GnssPosition> {
        self.last_position.ok_or(PaError::Fault)
    }

    fn load_extended_ephemeris_file(&mut self, _path: &Path) -> PaResult<()> {
        Err(PaError::Fault)
    }

    fn get_extended_ephemeris_validity(&self) -> PaResult<EphemerisValidity> {
        Err(PaError::Fault)
    }

    fn enable_extended_ephemeris_file(&mut self) -> PaResult<()> {
        Err(PaError::Fault)
    }

    fn disable_extended_ephemeris_file(&mut self) -> PaResult<()> {
        Err(PaError::Fault)
    }

    fn force_restart(&mut self, _restart: RestartType) -> PaResult<()> {
        Err(PaError::Fault)
    }

    fn get_ttff(&self) -> PaResult<u32> {
        Err(PaError::Fault)
    }

    fn enable(&mut self) -> PaResult<()> {
        Err(PaError::Fault)
    }

    fn disable(&mut self) -> PaResult<()> {
        Err(PaError::Fault)
    }

    fn set_supl_assisted_mode(&mut self, _mode: AssistedMode) -> PaResult<()> {
        Err(PaError::Fault)
    }

    fn get_supl_assisted_mode(&self) -> PaResult<AssistedMode> {
        Err(PaError::Fault)
    }

    fn set_supl_server_url(&mut self, _url: &str) -> PaResult<()> {
        Err(PaError::Fault)
    }

    fn inject_supl_certificate(&mut self, _id: u8, _certificate: &[u8]) -> PaResult<()> {
        Err(PaError::Fault)
    }

    fn delete_supl_certificate(&mut self, _id: u8) -> PaResult<()> {
        Err(PaError::Fault)
    }
}
