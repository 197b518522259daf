//! SIM card types and the SIM adapter interface

use std::fmt;

use crate::error::{PaError, PaResult};
use crate::handler::{Handler, HandlerRef};

/// Maximum IMSI length in digits
pub const IMSI_MAX_LEN: usize = 15;
/// Maximum ICCID length in digits
pub const ICCID_MAX_LEN: usize = 20;
/// Minimum PIN length
pub const PIN_MIN_LEN: usize = 4;
/// Maximum PIN length
pub const PIN_MAX_LEN: usize = 8;
/// Maximum PUK length
pub const PUK_MAX_LEN: usize = 8;
/// Maximum Mobile Country Code length
pub const MCC_MAX_LEN: usize = 3;
/// Maximum Mobile Network Code length
pub const MNC_MAX_LEN: usize = 3;
/// Maximum subscriber phone number length
pub const PHONE_NUM_MAX_LEN: usize = 17;

/// SIM card state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimState {
    /// Card present, waiting for PIN
    Inserted,
    /// No card
    Absent,
    /// Unlocked and usable
    #[default]
    Ready,
    /// PIN blocked, waiting for PUK
    Blocked,
    /// Card busy
    Busy,
    /// State cannot be determined
    Unknown,
}

impl SimState {
    /// Returns a human-readable name for the state
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inserted => "Inserted",
            Self::Absent => "Absent",
            Self::Ready => "Ready",
            Self::Blocked => "Blocked",
            Self::Busy => "Busy",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SIM slot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimId {
    /// Soldered eUICC
    Embedded,
    /// First external slot
    #[default]
    External1,
    /// Second external slot
    External2,
    /// Remote SIM
    Remote,
}

impl SimId {
    /// Numeric slot value used on the wire
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Embedded => 0,
            Self::External1 => 1,
            Self::External2 => 2,
            Self::Remote => 3,
        }
    }
}

impl TryFrom<u8> for SimId {
    type Error = PaError;

    fn try_from(value: u8) -> PaResult<Self> {
        match value {
            0 => Ok(Self::Embedded),
            1 => Ok(Self::External1),
            2 => Ok(Self::External2),
            3 => Ok(Self::Remote),
            _ => {
                tracing::warn!("Unknown SIM slot {}", value);
                Err(PaError::BadParameter)
            }
        }
    }
}

/// PIN code kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PinType {
    Pin,
    Pin2,
}

/// PUK code kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PukType {
    Puk,
    Puk2,
}

/// SIM state change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimEvent {
    /// Card that changed state
    pub sim_id: SimId,
    /// New state
    pub state: SimState,
}

/// SIM Toolkit proactive event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StkEvent {
    OpenChannel,
    Refresh,
    CloseChannel,
    Unknown,
}

/// SIM Toolkit notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StkEventReport {
    pub sim_id: SimId,
    pub event: StkEvent,
}

/// Generic SIM file access command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimCommand {
    ReadRecord,
    ReadBinary,
    UpdateRecord,
    UpdateBinary,
    GetResponse,
}

/// Parameters of a generic SIM command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimCommandRequest {
    pub command: SimCommand,
    /// Elementary file identifier, e.g. "6F07"
    pub file_identifier: String,
    pub p1: u8,
    pub p2: u8,
    pub p3: u8,
    pub data: Vec<u8>,
    /// Path of the elementary file, e.g. "3F007FFF"
    pub path: String,
}

/// Status words and payload returned by the SIM
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimCommandResponse {
    pub sw1: u8,
    pub sw2: u8,
    pub data: Vec<u8>,
}

impl SimCommandResponse {
    /// Normal completion (SW 90 00) with no payload
    pub fn success() -> Self {
        Self {
            sw1: 0x90,
            sw2: 0x00,
            data: Vec::new(),
        }
    }

    /// Check for normal completion
    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }
}

/// Check that `code` is a well-formed PIN
pub fn validate_pin(code: &str) -> PaResult<()> {
    let len_ok = (PIN_MIN_LEN..=PIN_MAX_LEN).contains(&code.len());
    if len_ok && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(PaError::BadParameter)
    }
}

/// Interface the modem services layer uses to drive a SIM
pub trait SimAdapter {
    /// Select the active card
    fn select_card(&mut self, sim_id: SimId) -> PaResult<()>;

    /// Get the selected card
    fn get_selected_card(&self) -> PaResult<SimId>;

    /// Get the current SIM state
    fn get_state(&self) -> PaResult<SimState>;

    /// Register a SIM state change handler
    fn add_new_state_handler(&mut self, handler: Handler<SimEvent>) -> HandlerRef;

    /// Unregister a SIM state change handler
    fn remove_new_state_handler(&mut self, handler_ref: HandlerRef) -> PaResult<()>;

    /// Enter the PIN code
    fn enter_pin(&mut self, pin_type: PinType, pin: &str) -> PaResult<()>;

    /// Enter the PUK code and set a new PIN
    fn enter_puk(&mut self, puk_type: PukType, puk: &str, new_pin: &str) -> PaResult<()>;

    /// Remaining PIN attempts
    fn get_pin_remaining_attempts(&self, pin_type: PinType) -> PaResult<u32>;

    /// Remaining PUK attempts
    fn get_puk_remaining_attempts(&self, puk_type: PukType) -> PaResult<u32>;

    /// Change the PIN code
    fn change_pin(&mut self, pin_type: PinType, old: &str, new: &str) -> PaResult<()>;

    /// Enable PIN security
    fn enable_pin(&mut self, pin_type: PinType, code: &str) -> PaResult<()>;

    /// Disable PIN security
    fn disable_pin(&mut self, pin_type: PinType, code: &str) -> PaResult<()>;

    /// Get the card identification (ICCID)
    fn get_card_identification(&self) -> PaResult<String>;

    /// Get the International Mobile Subscriber Identity
    fn get_imsi(&self) -> PaResult<String>;

    /// Get the subscriber phone number
    fn get_subscriber_phone_number(&self) -> PaResult<String>;

    /// Get the home network operator name
    fn get_home_network_operator(&self) -> PaResult<String>;

    /// Get the home network MCC and MNC
    fn get_home_network_mcc_mnc(&self) -> PaResult<(String, String)>;

    /// Open a logical channel on the SIM
    fn open_logical_channel(&mut self) -> PaResult<u8>;

    /// Close a logical channel
    fn close_logical_channel(&mut self, channel: u8) -> PaResult<()>;

    /// Send an APDU and return the response
    fn send_apdu(&mut self, apdu: &[u8]) -> PaResult<Vec<u8>>;

    /// Trigger a SIM refresh
    fn refresh(&mut self) -> PaResult<()>;

    /// Register a SIM Toolkit event handler
    fn add_stk_event_handler(&mut self, handler: Handler<StkEventReport>) -> HandlerRef;

    /// Unregister a SIM Toolkit event handler
    fn remove_stk_event_handler(&mut self, handler_ref: HandlerRef) -> PaResult<()>;

    /// Accept or reject the pending SIM Toolkit command
    fn confirm_stk_command(&mut self, confirmation: bool) -> PaResult<()>;

    /// Send a generic SIM file access command
    fn send_command(&mut self, request: &SimCommandRequest) -> PaResult<SimCommandResponse>;
}
