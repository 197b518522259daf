//! Modem Platform Adapter Types
//!
//! This crate defines the vocabulary shared between a modem management
//! framework and the platform adapters (PAs) that talk to modem hardware:
//!
//! - **SIM**: card state, PIN/PUK handling, identifiers, SIM Toolkit events
//! - **Info**: IMEI, firmware and bootloader versions, device model
//! - **GNSS**: position fixes, constellations, assistance settings
//!
//! Each subsystem exposes an adapter trait ([`SimAdapter`], [`InfoAdapter`],
//! [`GnssAdapter`]). Upper layers program against the traits; real drivers
//! and simulators implement them. Operations report failures with
//! [`PaError`].
//!
//! # Example
//!
//! ```rust
//! use pa_types::{HandlerRegistry, SimEvent, SimId, SimState};
//!
//! let mut registry = HandlerRegistry::<SimEvent>::new();
//! let handler = registry.add(|event| println!("SIM is now {}", event.state));
//!
//! registry.notify(&SimEvent { sim_id: SimId::External1, state: SimState::Ready });
//! registry.remove(handler);
//! ```

pub mod error;
pub mod gnss;
pub mod handler;
pub mod info;
pub mod sim;

pub use error::{PaError, PaResult};
pub use gnss::{
    AssistedMode, ConstellationMask, EphemerisValidity, GnssAdapter, GnssPosition, GnssTime,
    RestartType,
};
pub use handler::{Handler, HandlerRef, HandlerRegistry};
pub use info::{InfoAdapter, PriId};
pub use sim::{
    PinType, PukType, SimAdapter, SimCommand, SimCommandRequest, SimCommandResponse, SimEvent,
    SimId, SimState, StkEvent, StkEventReport,
};
