//! Simulated SIM card
//!
//! Tracks the SIM state together with the remaining PIN and PUK attempts,
//! and notifies registered handlers whenever the state changes. Tests drive
//! the card through the `set_*`/`report_*` control surface and observe it
//! through the [`SimAdapter`] interface, exactly as the modem services layer
//! would.
//!
//! State transitions:
//!
//! ```text
//! Inserted --enter_pin(ok)--> Ready
//! Inserted --enter_pin(bad, last attempt)--> Blocked
//! Blocked  --enter_puk(ok)--> Ready
//! ```

use std::collections::BTreeSet;

use pa_types::sim::{
    validate_pin, ICCID_MAX_LEN, IMSI_MAX_LEN, MCC_MAX_LEN, MNC_MAX_LEN, PHONE_NUM_MAX_LEN,
    PUK_MAX_LEN,
};
use pa_types::{
    error::check_len, Handler, HandlerRef, HandlerRegistry, PaError, PaResult, PinType, PukType,
    SimAdapter, SimCommandRequest, SimCommandResponse, SimEvent, SimId, SimState, StkEvent,
    StkEventReport,
};
use tracing::{debug, info, warn};

use crate::config::{modem_path, ConfigStore};
use crate::error::SimuError;

/// PIN attempts available after a reset
pub const PIN_REMAINING_ATTEMPTS_DEFAULT: u32 = 3;
/// PUK attempts available after a reset
pub const PUK_REMAINING_ATTEMPTS_DEFAULT: u32 = 3;
/// Default home network Mobile Country Code
pub const DEFAULT_MCC: &str = "01";
/// Default home network Mobile Network Code
pub const DEFAULT_MNC: &str = "001";
/// Highest logical channel number
pub const MAX_LOGICAL_CHANNEL: u8 = 19;

/// APDU expected while a SIM access test is running (SELECT EF 6F07)
pub const ACCESS_TEST_APDU: [u8; 7] = [0x00, 0xA4, 0x00, 0x0C, 0x02, 0x6F, 0x07];
/// Response returned to [`ACCESS_TEST_APDU`]
pub const ACCESS_TEST_RESPONSE: [u8; 2] = [0x90, 0x00];

/// A simulated SIM card
#[derive(Debug)]
pub struct SimSimulator {
    state: SimState,
    selected_card: SimId,
    pin_remaining: u32,
    puk_remaining: u32,
    pin: String,
    puk: String,
    pin_enabled: bool,
    imsi: String,
    iccid: String,
    phone_number: String,
    home_operator: Option<String>,
    home_mcc: String,
    home_mnc: String,
    stk_confirmation: bool,
    access_test: bool,
    logical_channels: BTreeSet<u8>,
    state_handlers: HandlerRegistry<SimEvent>,
    stk_handlers: HandlerRegistry<StkEventReport>,
}

impl Default for SimSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimSimulator {
    /// Create a ready SIM with no codes or identifiers configured
    pub fn new() -> Self {
        Self {
            state: SimState::Ready,
            selected_card: SimId::External1,
            pin_remaining: PIN_REMAINING_ATTEMPTS_DEFAULT,
            puk_remaining: PUK_REMAINING_ATTEMPTS_DEFAULT,
            pin: String::new(),
            puk: String::new(),
            pin_enabled: true,
            imsi: String::new(),
            iccid: String::new(),
            phone_number: String::new(),
            home_operator: None,
            home_mcc: DEFAULT_MCC.to_string(),
            home_mnc: DEFAULT_MNC.to_string(),
            stk_confirmation: false,
            access_test: false,
            logical_channels: BTreeSet::new(),
            state_handlers: HandlerRegistry::new(),
            stk_handlers: HandlerRegistry::new(),
        }
    }

    /// Seed a SIM from the `sim` subtree of the configuration store
    ///
    /// Absent leaves keep the defaults of [`SimSimulator::new`].
    pub fn from_config(config: &ConfigStore) -> Result<Self, SimuError> {
        let mut sim = Self::new();

        let pin = config.get_string(&modem_path("sim/pin"), "")?;
        if !pin.is_empty() {
            sim.set_pin(&pin)?;
        }
        sim.set_puk(&config.get_string(&modem_path("sim/puk"), "")?)?;
        sim.set_imsi(&config.get_string(&modem_path("sim/imsi"), "")?)?;
        sim.set_card_identification(&config.get_string(&modem_path("sim/iccid"), "")?)?;
        sim.set_subscriber_phone_number(&config.get_string(&modem_path("sim/phoneNumber"), "")?)?;

        let operator = config.get_string(&modem_path("sim/operator"), "")?;
        if !operator.is_empty() {
            sim.set_home_network_operator(&operator);
        }

        let mcc = config.get_string(&modem_path("sim/mcc"), DEFAULT_MCC)?;
        let mnc = config.get_string(&modem_path("sim/mnc"), DEFAULT_MNC)?;
        sim.set_home_network_mcc_mnc(&mcc, &mnc)?;

        let state_path = modem_path("sim/state");
        let state = config.get_string(&state_path, SimState::Ready.name())?;
        sim.state = parse_state(&state).ok_or(SimuError::InvalidValue {
            path: state_path,
            value: state,
        })?;

        let slot_path = modem_path("sim/slot");
        let slot = config.get_int(&slot_path, SimId::External1.as_u8() as i64)?;
        sim.selected_card = u8::try_from(slot)
            .ok()
            .and_then(|s| SimId::try_from(s).ok())
            .ok_or(SimuError::InvalidValue {
                path: slot_path,
                value: slot.to_string(),
            })?;

        Ok(sim)
    }

    /// Log the SIM initialization
    pub fn init(&mut self) -> PaResult<()> {
        info!(
            "PA SIM Init (card {:?}, state {})",
            self.selected_card, self.state
        );
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Simulation control surface
    // -------------------------------------------------------------------------

    /// Set the PIN code; an empty code accepts any PIN
    pub fn set_pin(&mut self, pin: &str) -> PaResult<()> {
        if !pin.is_empty() {
            validate_pin(pin)?;
        }
        self.pin = pin.to_string();
        Ok(())
    }

    /// Set the PUK code
    pub fn set_puk(&mut self, puk: &str) -> PaResult<()> {
        check_len(puk, PUK_MAX_LEN)?;
        self.puk = puk.to_string();
        Ok(())
    }

    /// Set the card that `select_card` expects
    pub fn set_select_card(&mut self, sim_id: SimId) {
        self.selected_card = sim_id;
    }

    /// Set the IMSI
    pub fn set_imsi(&mut self, imsi: &str) -> PaResult<()> {
        check_len(imsi, IMSI_MAX_LEN)?;
        self.imsi = imsi.to_string();
        Ok(())
    }

    /// Set the ICCID
    pub fn set_card_identification(&mut self, iccid: &str) -> PaResult<()> {
        check_len(iccid, ICCID_MAX_LEN)?;
        self.iccid = iccid.to_string();
        Ok(())
    }

    /// Set the subscriber phone number
    pub fn set_subscriber_phone_number(&mut self, number: &str) -> PaResult<()> {
        check_len(number, PHONE_NUM_MAX_LEN)?;
        self.phone_number = number.to_string();
        Ok(())
    }

    /// Set the home network operator name
    pub fn set_home_network_operator(&mut self, name: &str) {
        self.home_operator = Some(name.to_string());
    }

    /// Set the home network MCC/MNC
    pub fn set_home_network_mcc_mnc(&mut self, mcc: &str, mnc: &str) -> PaResult<()> {
        if mcc.len() > MCC_MAX_LEN || mnc.len() > MNC_MAX_LEN {
            return Err(PaError::BadParameter);
        }
        self.home_mcc = mcc.to_string();
        self.home_mnc = mnc.to_string();
        Ok(())
    }

    /// Change the SIM state and notify the state handlers
    pub fn report_sim_state(&mut self, state: SimState) {
        debug!("SIM {:?} state {} -> {}", self.selected_card, self.state, state);
        self.state = state;
        let event = SimEvent {
            sim_id: self.selected_card,
            state,
        };
        self.state_handlers.notify(&event);
    }

    /// Raise a SIM Toolkit event
    pub fn report_stk_event(&mut self, event: StkEvent) {
        debug!("SIM {:?} STK event {:?}", self.selected_card, event);
        let report = StkEventReport {
            sim_id: self.selected_card,
            event,
        };
        self.stk_handlers.notify(&report);
    }

    /// Set the confirmation `confirm_stk_command` expects
    pub fn set_expected_stk_confirmation(&mut self, confirmation: bool) {
        self.stk_confirmation = confirmation;
    }

    /// Enable checking of APDUs against [`ACCESS_TEST_APDU`]
    pub fn set_sim_access_test(&mut self, in_progress: bool) {
        self.access_test = in_progress;
    }

    /// Whether PIN security is enabled
    pub fn is_pin_enabled(&self) -> bool {
        self.pin_enabled
    }

    /// Currently open logical channels
    pub fn logical_channels(&self) -> impl Iterator<Item = u8> + '_ {
        self.logical_channels.iter().copied()
    }

    fn pin_matches(&self, code: &str) -> bool {
        self.pin.is_empty() || self.pin == code
    }

    fn require_state(&self, allowed: &[SimState], err: PaError) -> PaResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            debug!("SIM operation refused in state {}", self.state);
            Err(err)
        }
    }
}

impl SimAdapter for SimSimulator {
    fn select_card(&mut self, sim_id: SimId) -> PaResult<()> {
        if sim_id != self.selected_card {
            return Err(PaError::UnexpectedCall(format!(
                "select_card({:?}), expected {:?}",
                sim_id, self.selected_card
            )));
        }
        Ok(())
    }

    fn get_selected_card(&self) -> PaResult<SimId> {
        Ok(self.selected_card)
    }

    fn get_state(&self) -> PaResult<SimState> {
        Ok(self.state)
    }

    fn add_new_state_handler(&mut self, handler: Handler<SimEvent>) -> HandlerRef {
        self.state_handlers.add(handler)
    }

    fn remove_new_state_handler(&mut self, handler_ref: HandlerRef) -> PaResult<()> {
        if self.state_handlers.remove(handler_ref) {
            Ok(())
        } else {
            Err(PaError::BadParameter)
        }
    }

    fn enter_pin(&mut self, _pin_type: PinType, pin: &str) -> PaResult<()> {
        self.require_state(&[SimState::Inserted], PaError::NotPossible)?;
        validate_pin(pin)?;

        if !self.pin_matches(pin) {
            if self.pin_remaining <= 1 {
                warn!("Last PIN attempt failed, SIM {:?} blocked", self.selected_card);
                self.report_sim_state(SimState::Blocked);
            }
            self.pin_remaining = self.pin_remaining.saturating_sub(1);
            return Err(PaError::BadParameter);
        }

        self.pin_remaining = PIN_REMAINING_ATTEMPTS_DEFAULT;
        self.report_sim_state(SimState::Ready);
        Ok(())
    }

    fn enter_puk(&mut self, _puk_type: PukType, puk: &str, new_pin: &str) -> PaResult<()> {
        self.require_state(&[SimState::Blocked], PaError::NotPossible)?;
        validate_pin(new_pin)?;

        if puk != self.puk {
            if self.puk_remaining <= 1 {
                warn!("PUK attempts exhausted, counter reset");
                self.puk_remaining = PUK_REMAINING_ATTEMPTS_DEFAULT;
            } else {
                self.puk_remaining -= 1;
            }
            return Err(PaError::BadParameter);
        }

        self.pin = new_pin.to_string();
        self.pin_remaining = PIN_REMAINING_ATTEMPTS_DEFAULT;
        self.puk_remaining = PUK_REMAINING_ATTEMPTS_DEFAULT;
        self.report_sim_state(SimState::Ready);
        Ok(())
    }

    fn get_pin_remaining_attempts(&self, _pin_type: PinType) -> PaResult<u32> {
        match self.state {
            SimState::Busy | SimState::Unknown => Err(PaError::NotPossible),
            _ => Ok(self.pin_remaining),
        }
    }

    fn get_puk_remaining_attempts(&self, _puk_type: PukType) -> PaResult<u32> {
        match self.state {
            SimState::Busy | SimState::Unknown => Err(PaError::NotPossible),
            // The attempt that resets the counter is not reported
            _ => Ok(self.puk_remaining.saturating_sub(1)),
        }
    }

    fn change_pin(&mut self, _pin_type: PinType, old: &str, new: &str) -> PaResult<()> {
        self.require_state(&[SimState::Ready], PaError::NotPossible)?;

        if !self.pin_matches(old) {
            return Err(PaError::Fault);
        }
        validate_pin(new)?;
        self.pin = new.to_string();
        Ok(())
    }

    fn enable_pin(&mut self, _pin_type: PinType, code: &str) -> PaResult<()> {
        self.require_state(&[SimState::Ready], PaError::NotPossible)?;

        if !self.pin_matches(code) {
            return Err(PaError::NotPossible);
        }
        self.pin_enabled = true;
        Ok(())
    }

    fn disable_pin(&mut self, _pin_type: PinType, code: &str) -> PaResult<()> {
        if code.is_empty() {
            return Err(PaError::BadParameter);
        }
        self.require_state(&[SimState::Inserted, SimState::Ready], PaError::NotPossible)?;

        if !self.pin_matches(code) {
            return Err(PaError::NotPossible);
        }
        self.pin_enabled = false;
        Ok(())
    }

    fn get_card_identification(&self) -> PaResult<String> {
        self.require_state(
            &[SimState::Blocked, SimState::Inserted, SimState::Ready],
            PaError::NotPossible,
        )?;
        Ok(self.iccid.clone())
    }

    fn get_imsi(&self) -> PaResult<String> {
        self.require_state(&[SimState::Ready], PaError::NotPossible)?;
        Ok(self.imsi.clone())
    }

    fn get_subscriber_phone_number(&self) -> PaResult<String> {
        self.require_state(&[SimState::Ready], PaError::NotPossible)?;
        Ok(self.phone_number.clone())
    }

    fn get_home_network_operator(&self) -> PaResult<String> {
        self.require_state(&[SimState::Ready], PaError::Fault)?;
        self.home_operator
            .clone()
            .ok_or_else(|| PaError::NotFound("home network operator".into()))
    }

    fn get_home_network_mcc_mnc(&self) -> PaResult<(String, String)> {
        self.require_state(&[SimState::Ready], PaError::Fault)?;
        Ok((self.home_mcc.clone(), self.home_mnc.clone()))
    }

    fn open_logical_channel(&mut self) -> PaResult<u8> {
        let channel = (1..=MAX_LOGICAL_CHANNEL)
            .find(|c| !self.logical_channels.contains(c))
            .ok_or(PaError::NotPossible)?;
        self.logical_channels.insert(channel);
        debug!("Opened logical channel {}", channel);
        Ok(channel)
    }

    fn close_logical_channel(&mut self, channel: u8) -> PaResult<()> {
        if self.logical_channels.remove(&channel) {
            debug!("Closed logical channel {}", channel);
            Ok(())
        } else {
            Err(PaError::BadParameter)
        }
    }

    fn send_apdu(&mut self, apdu: &[u8]) -> PaResult<Vec<u8>> {
        if !self.access_test {
            return Ok(Vec::new());
        }
        if apdu != ACCESS_TEST_APDU {
            return Err(PaError::UnexpectedCall(format!("APDU {:02X?}", apdu)));
        }
        Ok(ACCESS_TEST_RESPONSE.to_vec())
    }

    fn refresh(&mut self) -> PaResult<()> {
        Ok(())
    }

    fn add_stk_event_handler(&mut self, handler: Handler<StkEventReport>) -> HandlerRef {
        self.stk_handlers.add(handler)
    }

    fn remove_stk_event_handler(&mut self, handler_ref: HandlerRef) -> PaResult<()> {
        if self.stk_handlers.remove(handler_ref) {
            Ok(())
        } else {
            Err(PaError::BadParameter)
        }
    }

    fn confirm_stk_command(&mut self, confirmation: bool) -> PaResult<()> {
        if confirmation != self.stk_confirmation {
            return Err(PaError::UnexpectedCall(format!(
                "STK confirmation {}, expected {}",
                confirmation, self.stk_confirmation
            )));
        }
        Ok(())
    }

    fn send_command(&mut self, request: &SimCommandRequest) -> PaResult<SimCommandResponse> {
        debug!(
            "SIM command {:?} on {} ({})",
            request.command, request.file_identifier, request.path
        );
        Ok(SimCommandResponse::success())
    }
}

/// Parse a state name as written in the configuration
pub fn parse_state(name: &str) -> Option<SimState> {
    match name.to_ascii_lowercase().as_str() {
        "inserted" => Some(SimState::Inserted),
        "absent" => Some(SimState::Absent),
        "ready" => Some(SimState::Ready),
        "blocked" => Some(SimState::Blocked),
        "busy" => Some(SimState::Busy),
        "unknown" => Some(SimState::Unknown),
        _ => None,
    }
}
