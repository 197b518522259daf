//! Integration tests for the platform simulators
//!
//! These tests drive the simulators the way a modem services layer would:
//! - Through the adapter traits only
//! - Seeded from a JSON configuration document
//! - Across the SIM lock / unlock lifecycle
//! - Through the async SIM task

use std::sync::{Arc, Mutex};

use pa_simu::{modem_path, ConfigStore, PlatformSimulator, SimSimulator};
use pa_types::{
    GnssAdapter, GnssPosition, InfoAdapter, PaError, PinType, PukType, SimAdapter, SimEvent,
    SimId, SimState,
};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub const CONFIG: &str = r#"{
        "simulation": {
            "modem": {
                "info": {
                    "imei": "359377060012345",
                    "fwVersion": "SWI9X07Y_02.37.03.00",
                    "deviceModel": "WP7702"
                },
                "sim": {
                    "pin": "1234",
                    "puk": "11223344",
                    "imsi": "208014567890123",
                    "iccid": "89330123450000000042",
                    "phoneNumber": "+33611223344",
                    "operator": "Simu Mobile",
                    "mcc": "208",
                    "mnc": "01",
                    "state": "Inserted"
                },
                "gnss": { "fakePosition": true }
            }
        }
    }"#;

    /// Bring up a platform from the shared test configuration
    pub fn platform() -> PlatformSimulator {
        let config = ConfigStore::from_json_str(CONFIG).unwrap();
        PlatformSimulator::init(config).unwrap()
    }

    /// Register a handler that records every SIM state change
    pub fn record_states(sim: &mut dyn SimAdapter) -> Arc<Mutex<Vec<SimEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        sim.add_new_state_handler(Box::new(move |e: &SimEvent| sink.lock().unwrap().push(*e)));
        seen
    }

    /// Enter a wrong PIN until the SIM blocks
    pub fn exhaust_pin(sim: &mut dyn SimAdapter) {
        while sim.get_state() == Ok(SimState::Inserted) {
            assert_eq!(sim.enter_pin(PinType::Pin, "0000"), Err(PaError::BadParameter));
        }
    }
}

// ============================================================================
// Platform bring-up
// ============================================================================

#[test]
fn platform_reads_configured_identity() {
    let platform = helpers::platform();
    let info: &dyn InfoAdapter = platform.info();

    assert!(platform.is_active());
    assert_eq!(info.get_imei().unwrap(), "359377060012345");
    assert_eq!(info.get_firmware_version().unwrap(), "SWI9X07Y_02.37.03.00");
    assert_eq!(info.get_bootloader_version().unwrap(), "Bootloader 1.00");
    assert_eq!(info.get_device_model().unwrap(), "WP7702");
}

#[test]
fn platform_serves_fake_fix() {
    let platform = helpers::platform();
    let fix = platform.gnss().get_last_position().unwrap();

    assert!((fix.latitude_deg() - 48.8583).abs() < 1e-6);
    assert!((fix.longitude_deg() - 2.2944).abs() < 1e-6);
}

#[test]
fn config_changes_are_seen_by_running_platform() {
    let platform = helpers::platform();
    platform
        .config()
        .set_string(&modem_path("info/imei"), "000000000000001");

    assert_eq!(platform.info().get_imei().unwrap(), "000000000000001");
}

// ============================================================================
// SIM lifecycle
// ============================================================================

#[test]
fn sim_unlock_with_pin() {
    let mut platform = helpers::platform();
    let sim: &mut dyn SimAdapter = platform.sim_mut();
    let states = helpers::record_states(sim);

    // Locked card only exposes its ICCID
    assert_eq!(sim.get_state(), Ok(SimState::Inserted));
    assert_eq!(sim.get_card_identification().unwrap(), "89330123450000000042");
    assert_eq!(sim.get_imsi(), Err(PaError::NotPossible));
    assert_eq!(sim.get_home_network_operator(), Err(PaError::Fault));

    sim.enter_pin(PinType::Pin, "1234").unwrap();

    assert_eq!(sim.get_imsi().unwrap(), "208014567890123");
    assert_eq!(sim.get_subscriber_phone_number().unwrap(), "+33611223344");
    assert_eq!(sim.get_home_network_operator().unwrap(), "Simu Mobile");
    assert_eq!(
        sim.get_home_network_mcc_mnc().unwrap(),
        ("208".to_string(), "01".to_string())
    );
    assert_eq!(
        *states.lock().unwrap(),
        vec![SimEvent {
            sim_id: SimId::External1,
            state: SimState::Ready
        }]
    );
}

#[test]
fn sim_block_and_recover_with_puk() {
    let mut platform = helpers::platform();
    let sim: &mut dyn SimAdapter = platform.sim_mut();
    let states = helpers::record_states(sim);

    helpers::exhaust_pin(sim);
    assert_eq!(sim.get_state(), Ok(SimState::Blocked));
    assert_eq!(sim.get_pin_remaining_attempts(PinType::Pin), Ok(0));

    // Wrong PUK burns a PUK attempt, not a PIN attempt
    assert_eq!(
        sim.enter_puk(PukType::Puk, "99999999", "4321"),
        Err(PaError::BadParameter)
    );
    assert_eq!(sim.get_puk_remaining_attempts(PukType::Puk), Ok(1));

    sim.enter_puk(PukType::Puk, "11223344", "4321").unwrap();
    assert_eq!(sim.get_state(), Ok(SimState::Ready));
    assert_eq!(sim.get_pin_remaining_attempts(PinType::Pin), Ok(3));
    assert_eq!(sim.get_puk_remaining_attempts(PukType::Puk), Ok(2));

    let observed: Vec<SimState> = states.lock().unwrap().iter().map(|e| e.state).collect();
    assert_eq!(observed, vec![SimState::Blocked, SimState::Ready]);

    // New PIN protects the card from now on
    sim.change_pin(PinType::Pin, "4321", "8765").unwrap();
    assert_eq!(sim.change_pin(PinType::Pin, "4321", "1111"), Err(PaError::Fault));
}

#[test]
fn sim_handlers_can_be_removed_independently() {
    let mut sim = SimSimulator::new();
    let first = Arc::new(Mutex::new(0));
    let second = Arc::new(Mutex::new(0));

    let a = Arc::clone(&first);
    let r1 = sim.add_new_state_handler(Box::new(move |_: &SimEvent| *a.lock().unwrap() += 1));
    let b = Arc::clone(&second);
    sim.add_new_state_handler(Box::new(move |_: &SimEvent| *b.lock().unwrap() += 1));

    sim.report_sim_state(SimState::Absent);
    sim.remove_new_state_handler(r1).unwrap();
    sim.report_sim_state(SimState::Inserted);

    assert_eq!(*first.lock().unwrap(), 1);
    assert_eq!(*second.lock().unwrap(), 2);
}

// ============================================================================
// GNSS
// ============================================================================

#[test]
fn gnss_handlers_receive_injected_fixes() {
    let mut platform = helpers::platform();
    let fixes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fixes);

    let gnss = platform.gnss_mut();
    gnss.start().unwrap();
    gnss.add_position_handler(Box::new(move |p: &GnssPosition| sink.lock().unwrap().push(*p)));

    let fix = GnssPosition {
        latitude: 37_774_900,
        longitude: -122_419_400,
        altitude: 16,
        dimension: 3,
        ..Default::default()
    };
    gnss.report_position(fix);

    assert_eq!(*fixes.lock().unwrap(), vec![fix]);
    assert_eq!(gnss.get_last_position(), Ok(fix));
}

// ============================================================================
// SIM task
// ============================================================================

#[tokio::test]
async fn sim_task_shared_between_clients() {
    let platform = helpers::platform();
    let (sim, _, _) = platform.into_parts();
    let (handle, join) = pa_simu::spawn_sim_task(sim);

    let other = handle.clone();
    let mut events = other.subscribe();

    handle.enter_pin("1234").await.unwrap();
    assert_eq!(other.get_state().await, Ok(SimState::Ready));

    let event = tokio::time::timeout(std::time::Duration::from_millis(100), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.state, SimState::Ready);

    other.shutdown().await.unwrap();
    let sim = join.await.unwrap();
    assert_eq!(sim.get_imsi().unwrap(), "208014567890123");
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use pa_simu::sim::PIN_REMAINING_ATTEMPTS_DEFAULT;
    use proptest::prelude::*;

    const PIN: &str = "2468";

    fn pin_attempt() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(PIN.to_string()),
            "[0-9]{4,8}".prop_filter("not the PIN", |c| c != PIN),
        ]
    }

    proptest! {
        #[test]
        fn pin_entry_matches_counter_model(attempts in prop::collection::vec(pin_attempt(), 1..12)) {
            let mut sim = SimSimulator::new();
            sim.set_pin(PIN).unwrap();
            sim.report_sim_state(SimState::Inserted);

            let mut state = SimState::Inserted;
            let mut remaining = PIN_REMAINING_ATTEMPTS_DEFAULT;

            for code in &attempts {
                let result = sim.enter_pin(PinType::Pin, code);
                match state {
                    SimState::Inserted if code == PIN => {
                        prop_assert_eq!(result, Ok(()));
                        state = SimState::Ready;
                        remaining = PIN_REMAINING_ATTEMPTS_DEFAULT;
                    }
                    SimState::Inserted => {
                        prop_assert_eq!(result, Err(PaError::BadParameter));
                        remaining -= 1;
                        if remaining == 0 {
                            state = SimState::Blocked;
                        }
                    }
                    _ => prop_assert_eq!(result, Err(PaError::NotPossible)),
                }
            }

            prop_assert_eq!(sim.get_state(), Ok(state));
            prop_assert_eq!(sim.get_pin_remaining_attempts(PinType::Pin), Ok(remaining));
        }

        #[test]
        fn puk_counter_stays_in_range(wrong in 0usize..10) {
            let mut sim = SimSimulator::new();
            sim.set_puk("12345678").unwrap();
            sim.report_sim_state(SimState::Blocked);

            for _ in 0..wrong {
                let _ = sim.enter_puk(PukType::Puk, "00000000", "1111");
                let left = sim.get_puk_remaining_attempts(PukType::Puk).unwrap();
                prop_assert!(left <= 2);
                prop_assert_eq!(sim.get_state(), Ok(SimState::Blocked));
            }

            prop_assert_eq!(sim.enter_puk(PukType::Puk, "12345678", "1111"), Ok(()));
            prop_assert_eq!(sim.get_state(), Ok(SimState::Ready));
        }
    }
}
