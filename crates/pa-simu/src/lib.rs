//! Modem Platform Adapter Simulation Library
//!
//! This crate provides stand-ins for modem platform adapters so that modem
//! services can be exercised without radio hardware. It includes:
//!
//! - **SimSimulator**: SIM card with a PIN/PUK attempt-counter state machine
//! - **InfoSimulator**: IMEI and version strings read from configuration
//! - **GnssSimulator**: GNSS engine serving injected or canned fixes
//! - **PlatformSimulator**: brings all of the above up on a shared config
//!
//! # Example
//!
//! ```rust
//! use pa_simu::SimSimulator;
//! use pa_types::{PinType, SimAdapter, SimState};
//!
//! let mut sim = SimSimulator::new();
//! sim.set_pin("1234").unwrap();
//! sim.report_sim_state(SimState::Inserted);
//!
//! sim.enter_pin(PinType::Pin, "1234").unwrap();
//! assert_eq!(sim.get_state(), Ok(SimState::Ready));
//! ```

pub mod config;
pub mod error;
pub mod gnss;
pub mod info;
pub mod platform;
pub mod sim;
pub mod sim_task;

pub use config::{modem_path, ConfigError, ConfigStore, ConfigValue, MODEM_ROOT};
pub use error::SimuError;
pub use gnss::{GnssSimulator, STUB_POSITION};
pub use info::InfoSimulator;
pub use platform::PlatformSimulator;
pub use sim::SimSimulator;
pub use sim_task::{run_sim_task, spawn_sim_task, SimTaskCommand, SimTaskError, SimTaskHandle};
