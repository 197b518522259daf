//! Status report printed by `modem-simu`

use std::fmt;

use pa_simu::PlatformSimulator;
use pa_types::{
    GnssAdapter, GnssPosition, InfoAdapter, PaResult, PinType, PukType, SimAdapter, SimId,
    SimState,
};
use serde::Serialize;

/// Snapshot of the simulated modem
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub imei: Option<String>,
    pub firmware_version: Option<String>,
    pub bootloader_version: Option<String>,
    pub device_model: Option<String>,
    pub sim: SimReport,
    pub gnss_fix: Option<GnssPosition>,
}

#[derive(Debug, Serialize)]
pub struct SimReport {
    pub card: Option<SimId>,
    pub state: Option<SimState>,
    pub pin_remaining_attempts: Option<u32>,
    pub puk_remaining_attempts: Option<u32>,
    pub iccid: Option<String>,
    pub imsi: Option<String>,
}

/// Unavailable values are reported as absent rather than failing the report
fn readable<T>(result: PaResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Value not readable: {}", e);
            None
        }
    }
}

impl StatusReport {
    pub fn collect(platform: &PlatformSimulator) -> Self {
        let info = platform.info();
        let sim = platform.sim();

        Self {
            imei: readable(info.get_imei()),
            firmware_version: readable(info.get_firmware_version()),
            bootloader_version: readable(info.get_bootloader_version()),
            device_model: readable(info.get_device_model()),
            sim: SimReport {
                card: readable(sim.get_selected_card()),
                state: readable(sim.get_state()),
                pin_remaining_attempts: readable(sim.get_pin_remaining_attempts(PinType::Pin)),
                puk_remaining_attempts: readable(sim.get_puk_remaining_attempts(PukType::Puk)),
                iccid: readable(sim.get_card_identification()),
                imsi: readable(sim.get_imsi()),
            },
            gnss_fix: readable(platform.gnss().get_last_position()),
        }
    }
}

struct Field<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Field<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "-"),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IMEI:               {}", Field(&self.imei))?;
        writeln!(f, "Firmware version:   {}", Field(&self.firmware_version))?;
        writeln!(f, "Bootloader version: {}", Field(&self.bootloader_version))?;
        writeln!(f, "Device model:       {}", Field(&self.device_model))?;

        match self.sim.card {
            Some(card) => writeln!(f, "SIM card:           {:?}", card)?,
            None => writeln!(f, "SIM card:           -")?,
        }
        writeln!(f, "SIM state:          {}", Field(&self.sim.state))?;
        writeln!(
            f,
            "PIN attempts left:  {}",
            Field(&self.sim.pin_remaining_attempts)
        )?;
        writeln!(
            f,
            "PUK attempts left:  {}",
            Field(&self.sim.puk_remaining_attempts)
        )?;
        writeln!(f, "ICCID:              {}", Field(&self.sim.iccid))?;
        writeln!(f, "IMSI:               {}", Field(&self.sim.imsi))?;
        write!(f, "GNSS fix:           {}", Field(&self.gnss_fix))
    }
}
