//! The bridge control state machine.
//!
//! This module provides [`BridgeMachine`], the safety-critical core that
//! sequences road signals, marine signals, gate barriers, and the deck motor.
//!
//! # Overview
//!
//! The machine:
//! - Owns the authoritative [`BridgeState`] and the motion-scoped context
//!   (entry timestamp, deceleration latch, durations frozen at entry)
//! - Evaluates transition guards in a fixed order every tick; the first
//!   matching guard wins
//! - Re-commands the complete output set every tick — road/marine/gate
//!   outputs are a pure function of the active state, never left stale
//! - Records a [`FaultRecord`] on every emergency entry
//!
//! It never blocks, sleeps, or panics: all waiting is expressed as timer
//! checks against the state entry timestamp, and the only error it can
//! return is the effector implementation's own error type.
//!
//! # State diagram
//!
//! ```text
//!  DOWN ──[raise req / boat waiting]──▶ PREP_RAISE ──[yellow done + gates down]──▶ RAISING
//!    ▲                                     │                                         │
//!    │                              [vehicle/e-stop]                          [top limit]
//!    │                                     ▼                                         ▼
//!    │◀──[bottom limit]── EMERGENCY_LOWER ◀──[e-stop/abort/vehicle/timeout]──       UP
//!    │                                                                               │
//!  LOWERING ◀──[all clear]── PREP_LOWER ◀──[lower req / no boats]───────────────────┘
//!    │
//!    └──[e-stop/abort/vessel/timeout]──▶ EMERGENCY_RAISE ──[top limit]──▶ UP
//! ```
//!
//! # Example
//!
//! ```rust
//! use rs_bascule::{BridgeConfig, BridgeMachine, BridgeState, TickInputs};
//! use rs_bascule::hal::MockBridgeIo;
//!
//! let config = BridgeConfig::default();
//! let mut machine = BridgeMachine::new(MockBridgeIo::new(), 0);
//! assert_eq!(machine.state(), BridgeState::Down);
//!
//! // A waiting boat starts the raise sequence
//! let inputs = TickInputs {
//!     boat_waiting: true,
//!     ..TickInputs::default()
//! };
//! machine.tick(0, inputs, &config).unwrap();
//! assert_eq!(machine.state(), BridgeState::PrepRaise);
//! ```

use log::{info, warn};

use crate::config::BridgeConfig;
use crate::profile::{duty_for, MotionProfile};
use crate::traits::{
    BridgeEffectors, GateCommand, MarineSignal, MotorDirection, RoadSignal,
};

/// Number of fault records retained in the on-board history.
pub const FAULT_HISTORY: usize = 8;

// ============================================================================
// States and Outputs
// ============================================================================

/// The bridge control states. Exactly one is active at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BridgeState {
    /// Deck closed, road open. The idle/safe state.
    Down,
    /// Yellow dwell: clearing the deck and lowering the gates before motion.
    PrepRaise,
    /// Deck travelling up under power.
    Raising,
    /// Deck fully open, marine traffic cleared to pass.
    Up,
    /// One-tick marine-clearance check before closing.
    PrepLower,
    /// Deck travelling down under power.
    Lowering,
    /// Fail-safe: drive the deck open, exit only on the top limit.
    EmergencyRaise,
    /// Fail-safe: drive the deck closed, exit only on the bottom limit.
    EmergencyLower,
}

impl BridgeState {
    /// Returns the state name as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BridgeState::Down => "down",
            BridgeState::PrepRaise => "prep_raise",
            BridgeState::Raising => "raising",
            BridgeState::Up => "up",
            BridgeState::PrepLower => "prep_lower",
            BridgeState::Lowering => "lowering",
            BridgeState::EmergencyRaise => "emergency_raise",
            BridgeState::EmergencyLower => "emergency_lower",
        }
    }

    /// `true` while the deck is being driven.
    pub const fn is_motion(&self) -> bool {
        matches!(
            self,
            BridgeState::Raising
                | BridgeState::Lowering
                | BridgeState::EmergencyRaise
                | BridgeState::EmergencyLower
        )
    }

    /// `true` in either fail-safe state.
    pub const fn is_emergency(&self) -> bool {
        matches!(
            self,
            BridgeState::EmergencyRaise | BridgeState::EmergencyLower
        )
    }

    /// The signal and gate outputs this state commands.
    ///
    /// Outputs are a pure function of the active state; [`BridgeMachine`]
    /// re-commands this plan every tick so nothing is left stale from a
    /// prior state.
    pub const fn signal_plan(&self) -> SignalPlan {
        match self {
            BridgeState::Down => SignalPlan {
                road: RoadSignal::Green,
                marine: MarineSignal::Red,
                gates: GateCommand::Up,
            },
            BridgeState::PrepRaise => SignalPlan {
                road: RoadSignal::Yellow,
                marine: MarineSignal::Red,
                gates: GateCommand::Down,
            },
            BridgeState::Up => SignalPlan {
                road: RoadSignal::Red,
                marine: MarineSignal::Green,
                gates: GateCommand::Down,
            },
            // Every remaining state holds both ways of traffic.
            _ => SignalPlan {
                road: RoadSignal::Red,
                marine: MarineSignal::Red,
                gates: GateCommand::Down,
            },
        }
    }
}

/// Signal and gate outputs commanded by a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalPlan {
    /// Road traffic signal aspect.
    pub road: RoadSignal,
    /// Marine traffic signal aspect.
    pub marine: MarineSignal,
    /// Gate barrier command.
    pub gates: GateCommand,
}

// ============================================================================
// Inputs
// ============================================================================

/// Boolean guard inputs sampled once per tick.
///
/// The machine consumes clean booleans only; fail-safe resolution of
/// untrusted sensor reads happens in [`crate::sensing`] before these are
/// built. Request flags are level-sensitive and owned by their source — the
/// machine reads whatever value it is given each tick and never clears them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickInputs {
    /// Operator request to open the span.
    pub request_raise: bool,
    /// Operator request to close the span.
    pub request_lower: bool,
    /// Operator request to abandon the current motion.
    pub request_abort: bool,
    /// Emergency-stop input (masked by `SafetyConfig::estop_enabled`).
    pub estop: bool,
    /// Deck at the fully-open position.
    pub top_limit: bool,
    /// Deck at the fully-closed position.
    pub bottom_limit: bool,
    /// A vehicle is on the deck.
    pub car_on_bridge: bool,
    /// A vessel is holding in the waiting zone.
    pub boat_waiting: bool,
    /// A vessel is directly beneath the span.
    pub boat_under_span: bool,
}

// ============================================================================
// Faults
// ============================================================================

/// Why an emergency state was entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FaultReason {
    /// The emergency-stop input was asserted.
    EmergencyStop,
    /// An abort was requested during a motion.
    AbortRequested,
    /// A vehicle was detected on the deck.
    VehicleOnBridge,
    /// A vessel was detected under the span during closing.
    VesselUnderSpan,
    /// An opening motion exceeded its maximum duration.
    OpenTimeout,
    /// A closing motion exceeded its maximum duration.
    CloseTimeout,
}

impl FaultReason {
    /// Returns the reason code reported to the surrounding system.
    pub const fn code(&self) -> &'static str {
        match self {
            FaultReason::EmergencyStop => "ESTOP",
            FaultReason::AbortRequested => "ABORT",
            FaultReason::VehicleOnBridge => "VEHICLE_ON_BRIDGE",
            FaultReason::VesselUnderSpan => "VESSEL_UNDER_SPAN",
            FaultReason::OpenTimeout => "OPEN_TIMEOUT",
            FaultReason::CloseTimeout => "CLOSE_TIMEOUT",
        }
    }
}

/// One captured fault: what happened, in which state, and when.
///
/// Faults are inspectable by the surrounding system (alarm, panel UI); the
/// machine itself keeps running — a fault is fatal to the current motion,
/// never to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaultRecord {
    /// Why the emergency was entered.
    pub reason: FaultReason,
    /// The state that was active when the fault occurred.
    pub during: BridgeState,
    /// Tick timestamp of the fault.
    pub at_ms: u64,
}

/// A state change taken during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    /// State before the tick.
    pub from: BridgeState,
    /// State after the tick.
    pub to: BridgeState,
}

// ============================================================================
// Motion Context
// ============================================================================

/// Motion-scoped bookkeeping, rebuilt on every state entry.
///
/// The entry timestamp, the deceleration latch, and the expected/maximum
/// durations are frozen here when the state is entered; a configuration
/// edit mid-motion cannot retrigger or un-latch deceleration. Cruise and
/// slow duty values are deliberately *not* frozen — they are read live from
/// configuration each tick.
#[derive(Clone, Copy, Debug)]
struct MotionContext {
    entered_ms: u64,
    decelerating: bool,
    expected_ms: u64,
    max_ms: u64,
}

impl MotionContext {
    fn enter(now_ms: u64, expected_ms: u64, max_ms: u64) -> Self {
        Self {
            entered_ms: now_ms,
            decelerating: false,
            expected_ms,
            max_ms,
        }
    }

    fn elapsed(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.entered_ms)
    }
}

// ============================================================================
// Status Snapshot
// ============================================================================

/// Full state snapshot for the panel UI/API.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BridgeStatus {
    /// The active state.
    pub state: BridgeState,
    /// Time spent in the active state so far.
    pub elapsed_in_state_ms: u64,
    /// Whether the current motion has latched into its slow phase.
    pub decelerating: bool,
    /// Commanded road signal (pure function of state).
    pub road: RoadSignal,
    /// Commanded marine signal (pure function of state).
    pub marine: MarineSignal,
    /// Commanded gate position (pure function of state).
    pub gates: GateCommand,
    /// Most recent fault, if not yet cleared.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub fault: Option<FaultRecord>,
}

// ============================================================================
// Bridge Machine
// ============================================================================

/// The bridge state machine.
///
/// Generic over the effector capability set `IO`, injected at construction,
/// so the same logic runs against panel hardware or [`crate::hal::MockBridgeIo`].
///
/// # Contract
///
/// [`tick`](Self::tick) must be called at a bounded interval (≤100 ms
/// recommended) with a monotonically non-decreasing timestamp. The machine
/// performs no internal sleeping or blocking; deceleration and timeout
/// behavior depend on the caller keeping tick latency bounded.
pub struct BridgeMachine<IO: BridgeEffectors> {
    io: IO,
    state: BridgeState,
    motion: MotionContext,
    fault: Option<FaultRecord>,
    history: heapless::Deque<FaultRecord, FAULT_HISTORY>,
}

impl<IO: BridgeEffectors> BridgeMachine<IO> {
    /// Create a machine in [`BridgeState::Down`] with its entry timestamp
    /// set to `now_ms`.
    pub fn new(io: IO, now_ms: u64) -> Self {
        info!("bridge controller initialised in {}", BridgeState::Down.as_str());
        Self {
            io,
            state: BridgeState::Down,
            motion: MotionContext::enter(now_ms, 0, 0),
            fault: None,
            history: heapless::Deque::new(),
        }
    }

    /// The active state.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Borrow the effector implementation.
    pub fn io(&self) -> &IO {
        &self.io
    }

    /// Mutably borrow the effector implementation.
    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// The most recent fault, if not yet cleared.
    pub fn last_fault(&self) -> Option<FaultRecord> {
        self.fault
    }

    /// Clear the pending fault indicator (the history is retained).
    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    /// Iterate the retained fault history, oldest first.
    pub fn fault_history(&self) -> impl Iterator<Item = &FaultRecord> {
        self.history.iter()
    }

    /// Whether the current motion has latched into its slow phase.
    pub fn decelerating(&self) -> bool {
        self.motion.decelerating
    }

    /// Time spent in the active state as of `now_ms`.
    pub fn elapsed_in_state(&self, now_ms: u64) -> u64 {
        self.motion.elapsed(now_ms)
    }

    /// Snapshot the machine for the panel UI/API.
    pub fn status(&self, now_ms: u64) -> BridgeStatus {
        let plan = self.state.signal_plan();
        BridgeStatus {
            state: self.state,
            elapsed_in_state_ms: self.motion.elapsed(now_ms),
            decelerating: self.motion.decelerating,
            road: plan.road,
            marine: plan.marine,
            gates: plan.gates,
            fault: self.fault,
        }
    }

    fn record_fault(&mut self, reason: FaultReason, now_ms: u64) {
        let record = FaultRecord {
            reason,
            during: self.state,
            at_ms: now_ms,
        };
        warn!(
            "fault {} during {} at t={}ms",
            reason.code(),
            self.state.as_str(),
            now_ms
        );
        if self.history.is_full() {
            self.history.pop_front();
        }
        let _ = self.history.push_back(record);
        self.fault = Some(record);
    }

    fn enter(&mut self, next: BridgeState, now_ms: u64, cfg: &BridgeConfig) {
        info!(
            "bridge state {} -> {} at t={}ms",
            self.state.as_str(),
            next.as_str(),
            now_ms
        );
        self.state = next;
        // Durations are frozen at entry; duty values stay live.
        let (expected, max) = match next {
            BridgeState::PrepRaise => (cfg.timing.yellow_ms, cfg.timing.yellow_ms),
            BridgeState::Raising => (cfg.timing.open_expected_ms, cfg.timing.open_max_ms),
            BridgeState::Lowering => (cfg.timing.close_expected_ms, cfg.timing.close_max_ms),
            BridgeState::EmergencyRaise | BridgeState::EmergencyLower => {
                (cfg.timing.emergency_ms, cfg.timing.emergency_ms)
            }
            _ => (0, 0),
        };
        self.motion = MotionContext::enter(now_ms, expected, max);
    }

    /// Run one control cycle.
    ///
    /// Re-commands the output set for the active state, evaluates the
    /// state's guards in fixed order (first true wins), and returns the
    /// transition taken, if any. Only effector errors propagate; every
    /// abnormal condition of the bridge itself becomes a state transition
    /// plus a [`FaultRecord`].
    pub fn tick(
        &mut self,
        now_ms: u64,
        inputs: TickInputs,
        cfg: &BridgeConfig,
    ) -> Result<Option<Transition>, IO::Error> {
        let from = self.state;

        let plan = self.state.signal_plan();
        self.io.set_road_signal(plan.road)?;
        self.io.set_marine_signal(plan.marine)?;
        self.io.command_gates(plan.gates)?;

        let estop = inputs.estop && cfg.safety.estop_enabled;
        let timeout_armed = cfg.safety.motion_timeout_enabled;
        let elapsed = self.motion.elapsed(now_ms);

        let next = match self.state {
            BridgeState::Down => {
                self.io.motor_stop()?;
                if inputs.request_raise || inputs.boat_waiting {
                    Some(BridgeState::PrepRaise)
                } else {
                    None
                }
            }

            BridgeState::PrepRaise => {
                if inputs.car_on_bridge {
                    // A vehicle arriving during the yellow window aborts the
                    // opening; the sequence never proceeds to motion.
                    self.record_fault(FaultReason::VehicleOnBridge, now_ms);
                    Some(BridgeState::EmergencyLower)
                } else if estop {
                    self.record_fault(FaultReason::EmergencyStop, now_ms);
                    Some(BridgeState::EmergencyLower)
                } else if elapsed >= self.motion.expected_ms
                    && self.io.gates_confirmed_down().or_assume_inactive()
                {
                    Some(BridgeState::Raising)
                } else {
                    None
                }
            }

            BridgeState::Raising => {
                if estop || inputs.request_abort || inputs.car_on_bridge {
                    self.io.motor_stop()?;
                    let reason = if estop {
                        FaultReason::EmergencyStop
                    } else if inputs.request_abort {
                        FaultReason::AbortRequested
                    } else {
                        FaultReason::VehicleOnBridge
                    };
                    self.record_fault(reason, now_ms);
                    Some(BridgeState::EmergencyLower)
                } else if inputs.top_limit {
                    self.io.motor_stop()?;
                    Some(BridgeState::Up)
                } else if timeout_armed && elapsed >= self.motion.max_ms {
                    self.io.motor_stop()?;
                    self.record_fault(FaultReason::OpenTimeout, now_ms);
                    Some(BridgeState::EmergencyLower)
                } else {
                    let profile = MotionProfile {
                        expected_ms: self.motion.expected_ms,
                        cruise: cfg.drive.open_cruise,
                        slow: cfg.drive.open_slow,
                    };
                    let duty = duty_for(elapsed, &profile, &mut self.motion.decelerating);
                    self.io.motor_enable()?;
                    self.io.motor_set_direction(MotorDirection::Up)?;
                    self.io.motor_set_duty(duty)?;
                    None
                }
            }

            BridgeState::Up => {
                self.io.motor_stop()?;
                if inputs.request_lower || (!inputs.boat_waiting && !inputs.boat_under_span) {
                    Some(BridgeState::PrepLower)
                } else {
                    None
                }
            }

            BridgeState::PrepLower => {
                // Single-tick evaluation, no timer: either abort back to Up
                // or commit to the closing motion.
                if inputs.boat_under_span || inputs.boat_waiting {
                    Some(BridgeState::Up)
                } else {
                    Some(BridgeState::Lowering)
                }
            }

            BridgeState::Lowering => {
                if estop || inputs.request_abort || inputs.boat_under_span {
                    self.io.motor_stop()?;
                    let reason = if estop {
                        FaultReason::EmergencyStop
                    } else if inputs.request_abort {
                        FaultReason::AbortRequested
                    } else {
                        FaultReason::VesselUnderSpan
                    };
                    self.record_fault(reason, now_ms);
                    Some(BridgeState::EmergencyRaise)
                } else if inputs.bottom_limit {
                    self.io.motor_stop()?;
                    Some(BridgeState::Down)
                } else if timeout_armed && elapsed >= self.motion.max_ms {
                    self.io.motor_stop()?;
                    self.record_fault(FaultReason::CloseTimeout, now_ms);
                    Some(BridgeState::EmergencyRaise)
                } else {
                    let profile = MotionProfile {
                        expected_ms: self.motion.expected_ms,
                        cruise: cfg.drive.close_cruise,
                        slow: cfg.drive.close_slow,
                    };
                    let duty = duty_for(elapsed, &profile, &mut self.motion.decelerating);
                    self.io.motor_enable()?;
                    self.io.motor_set_direction(MotorDirection::Down)?;
                    self.io.motor_set_duty(duty)?;
                    None
                }
            }

            BridgeState::EmergencyRaise => {
                if inputs.top_limit {
                    self.io.motor_stop()?;
                    Some(BridgeState::Up)
                } else if elapsed >= self.motion.max_ms {
                    // The state is a terminal sink, but the motor is never
                    // driven unbounded: past the emergency ceiling the duty
                    // is removed while the machine holds here.
                    self.io.motor_stop()?;
                    None
                } else {
                    self.io.motor_enable()?;
                    self.io.motor_set_direction(MotorDirection::Up)?;
                    self.io.motor_set_duty(cfg.drive.open_cruise)?;
                    None
                }
            }

            BridgeState::EmergencyLower => {
                if inputs.bottom_limit {
                    self.io.motor_stop()?;
                    Some(BridgeState::Down)
                } else if elapsed >= self.motion.max_ms {
                    self.io.motor_stop()?;
                    None
                } else {
                    self.io.motor_enable()?;
                    self.io.motor_set_direction(MotorDirection::Down)?;
                    self.io.motor_set_duty(cfg.drive.close_cruise)?;
                    None
                }
            }
        };

        if let Some(to) = next {
            self.enter(to, now_ms, cfg);
            return Ok(Some(Transition { from, to }));
        }
        Ok(None)
    }
}

// ============================================================================
// Tests
// ============================================================================
