//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware traits, enabling
//! development and testing of the full control sequence on desktop.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockBridgeIo`] | [`BridgeEffectors`] | Records commanded signals/gates/motor |
//! | [`MockLimits`] | [`LimitSwitches`] | Injectable switch readings |
//! | [`MockVehicleSensor`] | [`VehicleDetector`] | Injectable vehicle presence |
//! | [`MockRange`] | [`RangeFinder`] | Queued distance samples |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`SystemClock`] | [`Clock`] | Wall-clock source for desktop runs |
//!
//! # Example
//!
//! ```rust
//! use rs_bascule::{BridgeConfig, BridgeMachine, BridgeState, TickInputs};
//! use rs_bascule::hal::MockBridgeIo;
//! use rs_bascule::traits::RoadSignal;
//!
//! let config = BridgeConfig::default();
//! let mut machine = BridgeMachine::new(MockBridgeIo::new(), 0);
//! machine.tick(0, TickInputs::default(), &config).unwrap();
//!
//! // Verify commanded outputs
//! assert_eq!(machine.io().road, RoadSignal::Green);
//! assert_eq!(machine.io().motor_duty, 0);
//! ```
//!
//! [`BridgeEffectors`]: crate::traits::BridgeEffectors
//! [`LimitSwitches`]: crate::traits::LimitSwitches
//! [`VehicleDetector`]: crate::traits::VehicleDetector
//! [`RangeFinder`]: crate::traits::RangeFinder
//! [`Clock`]: crate::traits::Clock

use crate::traits::{
    BridgeEffectors, Clock, GateCommand, LimitSwitches, MarineSignal, MotorDirection,
    RangeFinder, RangeSample, RoadSignal, SensorReading, VehicleDetector,
};

extern crate alloc;
use alloc::collections::VecDeque;

// ============================================================================
// Effector Mock
// ============================================================================

/// Mock effector set for testing.
///
/// Records the last commanded value of every output for verification, and
/// lets tests inject the gate feedback reading. Setting [`failing`]
/// (`failing: true`) makes every command return `Err(())` to exercise error
/// propagation.
///
/// [`failing`]: Self::failing
///
/// # Example
///
/// ```rust
/// use rs_bascule::hal::MockBridgeIo;
/// use rs_bascule::traits::{BridgeEffectors, MotorDirection, RoadSignal};
///
/// let mut io = MockBridgeIo::new();
/// io.set_road_signal(RoadSignal::Yellow).unwrap();
/// io.motor_enable().unwrap();
/// io.motor_set_direction(MotorDirection::Up).unwrap();
/// io.motor_set_duty(170).unwrap();
///
/// assert_eq!(io.road, RoadSignal::Yellow);
/// assert_eq!(io.motor_duty, 170);
/// assert_eq!(io.duty_calls, 1);
/// ```
#[derive(Debug)]
pub struct MockBridgeIo {
    /// Last commanded road signal.
    pub road: RoadSignal,
    /// Last commanded marine signal.
    pub marine: MarineSignal,
    /// Last commanded gate position.
    pub gates: GateCommand,
    /// Whether the motor output stage is enabled.
    pub motor_enabled: bool,
    /// Last commanded direction, if any.
    pub motor_direction: Option<MotorDirection>,
    /// Last commanded duty.
    pub motor_duty: u8,
    /// Injectable gate-down feedback reading.
    pub gates_down_feedback: SensorReading,
    /// Number of times `motor_set_duty` was called.
    pub duty_calls: usize,
    /// When `true`, every command returns `Err(())`.
    pub failing: bool,
}

impl Default for MockBridgeIo {
    fn default() -> Self {
        Self {
            road: RoadSignal::Red,
            marine: MarineSignal::Red,
            gates: GateCommand::Down,
            motor_enabled: false,
            motor_direction: None,
            motor_duty: 0,
            // Gates confirm immediately unless a test says otherwise.
            gates_down_feedback: SensorReading::Active,
            duty_calls: 0,
            failing: false,
        }
    }
}

impl MockBridgeIo {
    /// Creates a mock with gates confirming immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock with the given gate feedback reading.
    pub fn with_gate_feedback(mut self, reading: SensorReading) -> Self {
        self.gates_down_feedback = reading;
        self
    }

    /// `true` if the motor is stopped (no duty, stage disabled).
    pub fn motor_stopped(&self) -> bool {
        self.motor_duty == 0 && !self.motor_enabled
    }

    fn check(&self) -> Result<(), ()> {
        if self.failing {
            Err(())
        } else {
            Ok(())
        }
    }
}

impl BridgeEffectors for MockBridgeIo {
    type Error = ();

    fn set_road_signal(&mut self, signal: RoadSignal) -> Result<(), ()> {
        self.check()?;
        self.road = signal;
        Ok(())
    }

    fn set_marine_signal(&mut self, signal: MarineSignal) -> Result<(), ()> {
        self.check()?;
        self.marine = signal;
        Ok(())
    }

    fn command_gates(&mut self, command: GateCommand) -> Result<(), ()> {
        self.check()?;
        self.gates = command;
        Ok(())
    }

    fn gates_confirmed_down(&self) -> SensorReading {
        self.gates_down_feedback
    }

    fn motor_enable(&mut self) -> Result<(), ()> {
        self.check()?;
        self.motor_enabled = true;
        Ok(())
    }

    fn motor_disable(&mut self) -> Result<(), ()> {
        self.check()?;
        self.motor_enabled = false;
        Ok(())
    }

    fn motor_set_direction(&mut self, direction: MotorDirection) -> Result<(), ()> {
        self.check()?;
        self.motor_direction = Some(direction);
        Ok(())
    }

    fn motor_set_duty(&mut self, duty: u8) -> Result<(), ()> {
        self.check()?;
        self.motor_duty = duty;
        self.duty_calls += 1;
        Ok(())
    }
}

// ============================================================================
// Sensor Mocks
// ============================================================================

/// Mock limit switches with directly settable readings.
#[derive(Debug, Clone, Copy)]
pub struct MockLimits {
    /// E-stop reading.
    pub estop: SensorReading,
    /// Top limit reading.
    pub top: SensorReading,
    /// Bottom limit reading.
    pub bottom: SensorReading,
}

impl Default for MockLimits {
    fn default() -> Self {
        Self {
            estop: SensorReading::Inactive,
            top: SensorReading::Inactive,
            bottom: SensorReading::Inactive,
        }
    }
}

impl MockLimits {
    /// Creates mock switches with everything released.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LimitSwitches for MockLimits {
    fn estop(&self) -> SensorReading {
        self.estop
    }

    fn top(&self) -> SensorReading {
        self.top
    }

    fn bottom(&self) -> SensorReading {
        self.bottom
    }
}

/// Mock vehicle detector with a directly settable reading.
#[derive(Debug, Clone, Copy)]
pub struct MockVehicleSensor {
    /// Vehicle presence reading.
    pub present: SensorReading,
}

impl Default for MockVehicleSensor {
    fn default() -> Self {
        Self {
            present: SensorReading::Inactive,
        }
    }
}

impl MockVehicleSensor {
    /// Creates a mock with no vehicle present.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VehicleDetector for MockVehicleSensor {
    fn vehicle_present(&self) -> SensorReading {
        self.present
    }
}

/// Mock rangefinder with queued samples.
///
/// Queued samples are returned in FIFO order; once the queue drains the
/// fallback sample repeats indefinitely.
///
/// # Example
///
/// ```rust
/// use rs_bascule::hal::MockRange;
/// use rs_bascule::traits::{RangeFinder, RangeSample};
///
/// let mut range = MockRange::fixed(RangeSample::Distance(2000));
/// range.queue_sample(RangeSample::Distance(300));
///
/// assert_eq!(range.distance_mm(), RangeSample::Distance(300));
/// assert_eq!(range.distance_mm(), RangeSample::Distance(2000));
/// assert_eq!(range.distance_mm(), RangeSample::Distance(2000));
/// ```
#[derive(Debug, Default)]
pub struct MockRange {
    queue: VecDeque<RangeSample>,
    fallback: Option<RangeSample>,
}

impl MockRange {
    /// Creates a mock that times out on every read.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that repeats `sample` once its queue drains.
    pub fn fixed(sample: RangeSample) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: Some(sample),
        }
    }

    /// Queue one sample to be returned before the fallback.
    pub fn queue_sample(&mut self, sample: RangeSample) {
        self.queue.push_back(sample);
    }
}

impl RangeFinder for MockRange {
    fn distance_mm(&mut self) -> RangeSample {
        self.queue
            .pop_front()
            .or(self.fallback)
            .unwrap_or(RangeSample::Timeout)
    }
}

// ============================================================================
// Clocks
// ============================================================================

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_bascule::hal::MockClock;
/// use rs_bascule::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0 ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

/// Wall-clock time source for desktop runs.
///
/// Milliseconds since construction, backed by `std::time::Instant`.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Creates a clock with its epoch at the moment of construction.
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

// ============================================================================
// Tests
// ============================================================================
