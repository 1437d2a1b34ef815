//! Unified shared state for the control-panel services.
//!
//! `SharedBridge` provides thread-safe access to a single [`BridgeMachine`]
//! plus the panel-owned request flags and operator e-stop latch. The web
//! handlers only set flags and read snapshots; the tick driver remains the
//! sole caller of [`SharedBridge::tick`], so exactly one control cycle is
//! ever in flight.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_bascule::services::SharedBridge;
//!
//! let state = Arc::new(SharedBridge::new(machine, config));
//!
//! // Panel handlers set request flags
//! state.apply_command(PanelCommand::Raise);
//!
//! // The tick driver merges them with the hardware inputs each cycle
//! state.tick(sampler.sample(&state.config().detection, state.requests()))?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::config::{BridgeConfig, ConfigError};
use crate::machine::{BridgeMachine, BridgeStatus, TickInputs, Transition};
use crate::sensing::{PanelCommand, RequestFlags};
use crate::traits::BridgeEffectors;

/// Unified shared state for the panel services and the tick driver.
///
/// # Thread Safety
///
/// The machine sits behind a `Mutex`; handlers take it only for brief
/// snapshot reads, the tick driver for one control cycle at a time. Request
/// flags and configuration have their own locks so panel writes do not
/// contend with the control cycle, and every timestamp comes from one
/// shared `start_time`.
pub struct SharedBridge<IO: BridgeEffectors> {
    /// The state machine — mutable access for ticks and fault clears.
    machine: Mutex<BridgeMachine<IO>>,

    /// Latest committed configuration; every tick reads a fresh copy.
    config: Mutex<BridgeConfig>,

    /// Panel-owned request flags, merged into the tick inputs.
    requests: Mutex<RequestFlags>,

    /// Operator e-stop latch, OR-ed with the hardware e-stop input.
    estop_latch: AtomicBool,

    /// Time base shared by all services.
    start_time: Instant,
}

impl<IO: BridgeEffectors> SharedBridge<IO> {
    /// Create shared state wrapping a machine and its configuration.
    pub fn new(machine: BridgeMachine<IO>, config: BridgeConfig) -> Self {
        Self {
            machine: Mutex::new(machine),
            config: Mutex::new(config),
            requests: Mutex::new(RequestFlags::default()),
            estop_latch: AtomicBool::new(false),
            start_time: Instant::now(),
        }
    }

    /// Current timestamp in milliseconds since state creation.
    ///
    /// The unified time source for the tick driver and all snapshots.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Access the machine with a mutable lock.
    ///
    /// The closure pattern keeps the lock from being held across await
    /// points in async handlers.
    pub fn with_machine<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut BridgeMachine<IO>) -> R,
    {
        let mut guard = self.machine.lock().unwrap();
        f(&mut guard)
    }

    /// Snapshot the machine for the panel UI/API.
    pub fn status(&self) -> BridgeStatus {
        let now_ms = self.now_ms();
        let machine = self.machine.lock().unwrap();
        machine.status(now_ms)
    }

    /// The current panel request flags.
    pub fn requests(&self) -> RequestFlags {
        *self.requests.lock().unwrap()
    }

    /// Apply a panel command to the request flags.
    ///
    /// Flags stay set until the panel clears them — the core never clears
    /// request flags.
    pub fn apply_command(&self, command: PanelCommand) {
        self.requests.lock().unwrap().apply(command);
    }

    /// Set or release the operator e-stop latch.
    pub fn set_estop(&self, latched: bool) {
        self.estop_latch.store(latched, Ordering::Relaxed);
    }

    /// Whether the operator e-stop latch is set.
    pub fn estop_latched(&self) -> bool {
        self.estop_latch.load(Ordering::Relaxed)
    }

    /// Copy of the latest committed configuration.
    pub fn config(&self) -> BridgeConfig {
        *self.config.lock().unwrap()
    }

    /// Change one configuration parameter through the validated setter.
    ///
    /// Atomic with respect to a single parameter; the next tick observes
    /// the new value.
    pub fn set_param(&self, name: &str, value: &str) -> Result<(), ConfigError> {
        self.config.lock().unwrap().set_param(name, value)
    }

    /// Run one control cycle.
    ///
    /// Merges the panel request flags and the operator e-stop latch into
    /// the hardware inputs, then ticks the machine with the latest
    /// committed configuration. Call this from exactly one driver loop.
    pub fn tick(&self, hardware_inputs: TickInputs) -> Result<Option<Transition>, IO::Error> {
        let mut inputs = hardware_inputs;
        let requests = self.requests();
        inputs.request_raise |= requests.raise;
        inputs.request_lower |= requests.lower;
        inputs.request_abort |= requests.abort;
        inputs.estop |= self.estop_latched();

        let cfg = self.config();
        let now_ms = self.now_ms();
        self.with_machine(|machine| machine.tick(now_ms, inputs, &cfg))
    }
}
