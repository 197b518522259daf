//! Modem identity and version information interface

use crate::error::PaResult;

/// Maximum IMEI length in digits
pub const IMEI_MAX_LEN: usize = 15;
/// Maximum device model name length
pub const DEVICE_MODEL_MAX_LEN: usize = 256;
/// Maximum firmware/bootloader version string length
pub const VERSION_MAX_LEN: usize = 256;

/// Product Requirement Information identifier
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriId {
    /// Part number
    pub part_number: String,
    /// Revision number
    pub revision: String,
}

/// Interface for querying modem identity and versions
pub trait InfoAdapter {
    /// International Mobile Equipment Identity
    fn get_imei(&self) -> PaResult<String>;

    /// Modem firmware version
    fn get_firmware_version(&self) -> PaResult<String>;

    /// Bootloader version
    fn get_bootloader_version(&self) -> PaResult<String>;

    /// Device model name
    fn get_device_model(&self) -> PaResult<String>;

    /// CDMA Mobile Equipment Identifier
    fn get_meid(&self) -> PaResult<String>;

    /// CDMA Electronic Serial Number
    fn get_esn(&self) -> PaResult<String>;

    /// CDMA Mobile Identification Number
    fn get_min(&self) -> PaResult<String>;

    /// CDMA Preferred Roaming List version
    fn get_prl_version(&self) -> PaResult<u16>;

    /// CDMA PRL-only preference
    fn get_prl_only_preference(&self) -> PaResult<bool>;

    /// CDMA Network Access Identifier
    fn get_nai(&self) -> PaResult<String>;

    /// Manufacturer name
    fn get_manufacturer_name(&self) -> PaResult<String>;

    /// Product Requirement Information identifier
    fn get_pri_id(&self) -> PaResult<PriId>;

    /// Platform serial number
    fn get_platform_serial_number(&self) -> PaResult<String>;
}
