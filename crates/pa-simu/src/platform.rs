//! Platform simulator bundle
//!
//! Brings up every simulated sub-adapter against one shared configuration
//! store, the way a modem daemon initializes its platform adapters at
//! startup.

use pa_types::GnssAdapter;
use tracing::info;

use crate::config::{modem_path, ConfigStore};
use crate::error::SimuError;
use crate::gnss::GnssSimulator;
use crate::info::InfoSimulator;
use crate::sim::SimSimulator;

/// All simulated platform adapters
#[derive(Debug)]
pub struct PlatformSimulator {
    config: ConfigStore,
    sim: SimSimulator,
    info: InfoSimulator,
    gnss: GnssSimulator,
}

impl PlatformSimulator {
    /// Mark the simulated modem active and initialize the sub-adapters
    pub fn init(config: ConfigStore) -> Result<Self, SimuError> {
        info!("PA Init");

        config.set_bool(&modem_path("active"), true);

        let mut sim = SimSimulator::from_config(&config)?;
        sim.init()?;

        let info = InfoSimulator::new(config.clone());

        let mut gnss = GnssSimulator::from_config(&config)?;
        gnss.init()?;

        Ok(Self {
            config,
            sim,
            info,
            gnss,
        })
    }

    /// Whether the simulated modem is marked active in the configuration
    pub fn is_active(&self) -> bool {
        self.config
            .get_bool(&modem_path("active"), false)
            .unwrap_or(false)
    }

    /// Shared configuration store
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Simulated SIM
    pub fn sim(&self) -> &SimSimulator {
        &self.sim
    }

    /// Simulated SIM, mutable
    pub fn sim_mut(&mut self) -> &mut SimSimulator {
        &mut self.sim
    }

    /// Simulated info adapter
    pub fn info(&self) -> &InfoSimulator {
        &self.info
    }

    /// Simulated GNSS engine
    pub fn gnss(&self) -> &GnssSimulator {
        &self.gnss
    }

    /// Simulated GNSS engine, mutable
    pub fn gnss_mut(&mut self) -> &mut GnssSimulator {
        &mut self.gnss
    }

    /// Split the bundle into its sub-adapters
    pub fn into_parts(self) -> (SimSimulator, InfoSimulator, GnssSimulator) {
        (self.sim, self.info, self.gnss)
    }
}
