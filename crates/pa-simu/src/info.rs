//! Simulated modem identity
//!
//! Identity and version strings come from the `info` subtree of the
//! configuration store, with canned defaults. CDMA identifiers and the
//! other values a simulator has no source for always fail.

use pa_types::info::{DEVICE_MODEL_MAX_LEN, IMEI_MAX_LEN, VERSION_MAX_LEN};
use pa_types::{error::check_len, InfoAdapter, PaError, PaResult, PriId};
use tracing::{error, warn};

use crate::config::{modem_path, ConfigStore};

/// IMEI reported when none is configured
pub const DEFAULT_IMEI: &str = "314159265358979";
/// Firmware version reported when none is configured
pub const DEFAULT_FW_VERSION: &str = "Firmware 1.00";
/// Bootloader version reported when none is configured
pub const DEFAULT_BOOT_VERSION: &str = "Bootloader 1.00";

/// Model name for simulators running on an ARM host
pub const VIRT_ARM_MODEL: &str = "VIRT_ARM";
/// Model name for simulators running on a 32-bit x86 host
pub const VIRT_X86_MODEL: &str = "VIRT_X86";

/// Simulated modem information adapter
#[derive(Debug, Clone)]
pub struct InfoSimulator {
    config: ConfigStore,
    machine: String,
}

impl InfoSimulator {
    /// Create an info simulator reading from `config` on this host
    pub fn new(config: ConfigStore) -> Self {
        Self::with_machine(config, std::env::consts::ARCH)
    }

    /// Create an info simulator that pretends to run on `machine`
    pub fn with_machine(config: ConfigStore, machine: impl Into<String>) -> Self {
        Self {
            config,
            machine: machine.into(),
        }
    }

    /// Host machine name used to derive the device model
    pub fn machine(&self) -> &str {
        &self.machine
    }

    fn read_string(&self, key: &str, default: &str, max: usize) -> PaResult<String> {
        let path = modem_path(key);
        let value = self.config.get_string(&path, default).map_err(|e| {
            error!("Unexpected configuration for {}: {}", path, e);
            PaError::Fault
        })?;

        if let Err(e) = check_len(&value, max) {
            warn!("Configured {} is too long: {}", path, e);
            return Err(e);
        }
        Ok(value)
    }

    fn model_from_machine(&self) -> PaResult<String> {
        match self.machine.as_str() {
            "arm" | "armv5tejl" | "armv7l" => Ok(VIRT_ARM_MODEL.to_string()),
            "x86" | "i686" => Ok(VIRT_X86_MODEL.to_string()),
            other => {
                error!("Unknown machine '{}'", other);
                Err(PaError::Fault)
            }
        }
    }
}

impl InfoAdapter for InfoSimulator {
    fn get_imei(&self) -> PaResult<String> {
        self.read_string("info/imei", DEFAULT_IMEI, IMEI_MAX_LEN)
    }

    fn get_firmware_version(&self) -> PaResult<String> {
        self.read_string("info/fwVersion", DEFAULT_FW_VERSION, VERSION_MAX_LEN)
    }

    fn get_bootloader_version(&self) -> PaResult<String> {
        self.read_string("info/bootVersion", DEFAULT_BOOT_VERSION, VERSION_MAX_LEN)
    }

    fn get_device_model(&self) -> PaResult<String> {
        let model = self.read_string("info/deviceModel", "", DEVICE_MODEL_MAX_LEN)?;
        if model.is_empty() {
            // No configured model, fall back to the host architecture
            return self.model_from_machine();
        }
        Ok(model)
    }

    fn get_meid(&self) -> PaResult<String> {
        Err(PaError::Fault)
    }

    fn get_esn(&self) -> PaResult<String> {
        Err(PaError::Fault)
    }

    fn get_min(&self) -> PaResult<String> {
        Err(PaError::Fault)
    }

    fn get_prl_version(&self) -> PaResult<u16> {
        Err(PaError::Fault)
    }

    fn get_prl_only_preference(&self) -> PaResult<bool> {
        Err(PaError::Fault)
    }

    fn get_nai(&self) -> PaResult<String> {
        Err(PaError::Fault)
    }

    fn get_manufacturer_name(&self) -> PaResult<String> {
        Err(PaError::Fault)
    }

    fn get_pri_id(&self) -> PaResult<PriId> {
        Err(PaError::Fault)
    }

    fn get_platform_serial_number(&self) -> PaResult<String> {
        Err(PaError::Fault)
    }
}
