//! SIM actor task
//!
//! Lets several async clients share one [`SimSimulator`]. The task owns the
//! simulator and:
//! - Serves commands received on an mpsc channel, answering over oneshot
//! - Re-publishes every SIM state change on a broadcast channel
//!
//! Clients normally talk to the task through a [`SimTaskHandle`].

use pa_types::{PaError, PaResult, PinType, PukType, SimAdapter, SimEvent, SimState};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::sim::SimSimulator;

/// Commands that can be sent to the SIM task
#[derive(Debug)]
pub enum SimTaskCommand {
    /// Query the SIM state
    GetState {
        reply: oneshot::Sender<PaResult<SimState>>,
    },
    /// Enter the PIN code
    EnterPin {
        pin: String,
        reply: oneshot::Sender<PaResult<()>>,
    },
    /// Enter the PUK code and a new PIN
    EnterPuk {
        puk: String,
        new_pin: String,
        reply: oneshot::Sender<PaResult<()>>,
    },
    /// Query remaining PIN attempts
    GetPinRemainingAttempts {
        reply: oneshot::Sender<PaResult<u32>>,
    },
    /// Force a state change (simulation control)
    ReportState(SimState),
    /// Stop the task
    Shutdown,
}

/// Errors seen by task clients
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimTaskError {
    /// The task is no longer running
    #[error("SIM task stopped")]
    Stopped,

    /// The simulator rejected the operation
    #[error(transparent)]
    Adapter(#[from] PaError),
}

/// Run the SIM task until shutdown or until every sender is dropped
///
/// Returns the simulator so callers can inspect its final state.
pub async fn run_sim_task(
    mut sim: SimSimulator,
    mut cmd_rx: mpsc::Receiver<SimTaskCommand>,
    event_tx: broadcast::Sender<SimEvent>,
) -> SimSimulator {
    info!(
        "Starting SIM task for card {:?}",
        sim.get_selected_card().unwrap_or_default()
    );

    let tx = event_tx.clone();
    let forwarder = sim.add_new_state_handler(Box::new(move |event: &SimEvent| {
        // No subscribers is fine
        let _ = tx.send(*event);
    }));

    while let Some(cmd) = cmd_rx.recv().await {
        debug!("SIM task command: {:?}", cmd);
        match cmd {
            SimTaskCommand::GetState { reply } => {
                let _ = reply.send(sim.get_state());
            }
            SimTaskCommand::EnterPin { pin, reply } => {
                let _ = reply.send(sim.enter_pin(PinType::Pin, &pin));
            }
            SimTaskCommand::EnterPuk {
                puk,
                new_pin,
                reply,
            } => {
                let _ = reply.send(sim.enter_puk(PukType::Puk, &puk, &new_pin));
            }
            SimTaskCommand::GetPinRemainingAttempts { reply } => {
                let _ = reply.send(sim.get_pin_remaining_attempts(PinType::Pin));
            }
            SimTaskCommand::ReportState(state) => sim.report_sim_state(state),
            SimTaskCommand::Shutdown => {
                info!("Shutdown requested for SIM task");
                break;
            }
        }
    }

    if sim.remove_new_state_handler(forwarder).is_err() {
        warn!("SIM task state forwarder already removed");
    }
    info!("SIM task ended");
    sim
}

/// Client side of a running SIM task
#[derive(Debug, Clone)]
pub struct SimTaskHandle {
    cmd_tx: mpsc::Sender<SimTaskCommand>,
    event_tx: broadcast::Sender<SimEvent>,
}

impl SimTaskHandle {
    /// Wrap the channels of a running task
    pub fn new(
        cmd_tx: mpsc::Sender<SimTaskCommand>,
        event_tx: broadcast::Sender<SimEvent>,
    ) -> Self {
        Self { cmd_tx, event_tx }
    }

    /// Subscribe to SIM state changes
    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.event_tx.subscribe()
    }

    /// Query the SIM state
    pub async fn get_state(&self) -> Result<SimState, SimTaskError> {
        self.request(|reply| SimTaskCommand::GetState { reply }).await
    }

    /// Enter the PIN code
    pub async fn enter_pin(&self, pin: &str) -> Result<(), SimTaskError> {
        let pin = pin.to_string();
        self.request(|reply| SimTaskCommand::EnterPin { pin, reply })
            .await
    }

    /// Enter the PUK code and set a new PIN
    pub async fn enter_puk(&self, puk: &str, new_pin: &str) -> Result<(), SimTaskError> {
        let (puk, new_pin) = (puk.to_string(), new_pin.to_string());
        self.request(|reply| SimTaskCommand::EnterPuk {
            puk,
            new_pin,
            reply,
        })
        .await
    }

    /// Query remaining PIN attempts
    pub async fn pin_remaining_attempts(&self) -> Result<u32, SimTaskError> {
        self.request(|reply| SimTaskCommand::GetPinRemainingAttempts { reply })
            .await
    }

    /// Force a SIM state change
    pub async fn report_state(&self, state: SimState) -> Result<(), SimTaskError> {
        self.cmd_tx
            .send(SimTaskCommand::ReportState(state))
            .await
            .map_err(|_| SimTaskError::Stopped)
    }

    /// Ask the task to stop
    pub async fn shutdown(&self) -> Result<(), SimTaskError> {
        self.cmd_tx
            .send(SimTaskCommand::Shutdown)
            .await
            .map_err(|_| SimTaskError::Stopped)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<PaResult<T>>) -> SimTaskCommand,
    ) -> Result<T, SimTaskError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| SimTaskError::Stopped)?;
        let result = reply_rx.await.map_err(|_| SimTaskError::Stopped)?;
        Ok(result?)
    }
}

/// Spawn a SIM task on the current tokio runtime
pub fn spawn_sim_task(
    sim: SimSimulator,
) -> (SimTaskHandle, tokio::task::JoinHandle<SimSimulator>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, _) = broadcast::channel(32);
    let handle = SimTaskHandle::new(cmd_tx, event_tx.clone());
    let join = tokio::spawn(run_sim_task(sim, cmd_rx, event_tx));
    (handle, join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn locked_sim() -> SimSimulator {
        let mut sim = SimSimulator::new();
        sim.set_pin("1234").unwrap();
        sim.set_puk("87654321").unwrap();
        sim.report_sim_state(SimState::Inserted);
        sim
    }

    #[tokio::test]
    async fn test_enter_pin_emits_ready() {
        let (handle, join) = spawn_sim_task(locked_sim());
        let mut events = handle.subscribe();

        assert_eq!(handle.get_state().await, Ok(SimState::Inserted));
        handle.enter_pin("1234").await.unwrap();

        let event = tokio::time::timeout(Duration::from_millis(100), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.state, SimState::Ready);

        handle.shutdown().await.unwrap();
        let sim = join.await.unwrap();
        assert_eq!(sim.get_state(), Ok(SimState::Ready));
    }

    #[tokio::test]
    async fn test_wrong_pin_reports_adapter_error() {
        let (handle, join) = spawn_sim_task(locked_sim());

        assert_eq!(
            handle.enter_pin("0000").await,
            Err(SimTaskError::Adapter(PaError::BadParameter))
        );
        assert_eq!(handle.pin_remaining_attempts().await, Ok(2));

        drop(handle);
        let _ = join.await;
    }

    #[tokio::test]
    async fn test_puk_flow_through_task() {
        let (handle, join) = spawn_sim_task(locked_sim());
        let mut events = handle.subscribe();

        handle.report_state(SimState::Blocked).await.unwrap();
        let event = tokio::time::timeout(Duration::from_millis(100), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.state, SimState::Blocked);

        handle.enter_puk("87654321", "4321").await.unwrap();
        assert_eq!(handle.get_state().await, Ok(SimState::Ready));

        handle.shutdown().await.unwrap();
        let _ = join.await;
    }

    #[tokio::test]
    async fn test_handle_after_shutdown() {
        let (handle, join) = spawn_sim_task(SimSimulator::new());

        handle.shutdown().await.unwrap();
        let result = tokio::time::timeout(Duration::from_millis(100), join)
            .await
            .unwrap();
        assert!(result.is_ok());

        assert_eq!(handle.get_state().await, Err(SimTaskError::Stopped));
    }
}
