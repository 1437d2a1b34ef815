//! Hardware abstraction traits for signals, gates, the deck motor, and sensors.
//!
//! This module defines the capability set that allows rs-bascule to run
//! against real hardware or desktop mocks with the same control logic.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`BridgeEffectors`] | Road/marine signals, gate barriers, deck motor |
//! | [`LimitSwitches`] | E-stop and top/bottom deck limit switches |
//! | [`VehicleDetector`] | Vehicle-on-bridge detection |
//! | [`RangeFinder`] | Ultrasonic distance measurement for boat detection |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! # Untrusted readings
//!
//! Discrete sensor queries return [`SensorReading`] rather than `bool`: a
//! read that cannot complete (open wire, echo timeout) surfaces as
//! [`SensorReading::Unknown`] instead of silently defaulting to one side.
//! The sampling layer in [`crate::sensing`] decides the safe interpretation
//! per input before anything reaches the state machine.
//!
//! # Example
//!
//! ```rust
//! use rs_bascule::traits::{BridgeEffectors, RoadSignal, MotorDirection};
//! use rs_bascule::hal::MockBridgeIo;
//!
//! let mut io = MockBridgeIo::new();
//! io.set_road_signal(RoadSignal::Red).unwrap();
//! io.motor_enable().unwrap();
//! io.motor_set_direction(MotorDirection::Up).unwrap();
//! io.motor_set_duty(170).unwrap();
//! ```

// ============================================================================
// Signal and Command Enums
// ============================================================================

/// Road traffic signal aspect.
///
/// Commanded as a whole-signal state; the adapter drives the individual
/// lamps. Defaults to [`Red`](Self::Red) so an uninitialised signal head
/// stops traffic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RoadSignal {
    /// Stop all road traffic.
    #[default]
    Red,
    /// Clear the deck: the bridge is about to move.
    Yellow,
    /// Road traffic may cross.
    Green,
}

impl RoadSignal {
    /// Returns the aspect as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RoadSignal::Red => "red",
            RoadSignal::Yellow => "yellow",
            RoadSignal::Green => "green",
        }
    }
}

/// Marine traffic signal aspect.
///
/// Defaults to [`Red`](Self::Red): vessels hold until explicitly cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MarineSignal {
    /// Vessels must hold clear of the span.
    #[default]
    Red,
    /// Vessels may pass under the raised span.
    Green,
}

impl MarineSignal {
    /// Returns the aspect as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MarineSignal::Red => "red",
            MarineSignal::Green => "green",
        }
    }
}

/// Gate barrier command.
///
/// Gates are commanded independently of the deck motor. Defaults to
/// [`Down`](Self::Down): with no better information the barriers stay
/// across the roadway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GateCommand {
    /// Barrier arms raised, roadway open.
    Up,
    /// Barrier arms lowered across the roadway.
    #[default]
    Down,
}

impl GateCommand {
    /// Returns the command as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            GateCommand::Up => "up",
            GateCommand::Down => "down",
        }
    }
}

/// Deck motor travel direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MotorDirection {
    /// Raise the deck (open the span).
    Up,
    /// Lower the deck (close the span).
    Down,
}

impl MotorDirection {
    /// Returns the direction as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MotorDirection::Up => "up",
            MotorDirection::Down => "down",
        }
    }
}

// ============================================================================
// Sensor Readings
// ============================================================================

/// Result of a discrete sensor query.
///
/// `Unknown` means the read could not be trusted (timeout, open circuit,
/// out-of-window echo). Callers must choose the safe interpretation with
/// [`or_assume_active`](Self::or_assume_active) /
/// [`or_assume_inactive`](Self::or_assume_inactive) rather than letting the
/// driver pick a default.
///
/// # Example
///
/// ```rust
/// use rs_bascule::traits::SensorReading;
///
/// // An unknown e-stop circuit fails toward "pressed"
/// assert!(SensorReading::Unknown.or_assume_active());
///
/// // An unknown limit switch fails toward "not yet reached"
/// assert!(!SensorReading::Unknown.or_assume_inactive());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SensorReading {
    /// The input is asserted.
    Active,
    /// The input is not asserted.
    Inactive,
    /// The read could not complete or cannot be trusted.
    Unknown,
}

impl SensorReading {
    /// `true` only for a trusted [`Active`](Self::Active) reading.
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, SensorReading::Active)
    }

    /// `true` if the reading is untrusted.
    #[inline]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, SensorReading::Unknown)
    }

    /// Resolve to `bool`, treating `Unknown` as asserted.
    #[inline]
    pub const fn or_assume_active(&self) -> bool {
        !matches!(self, SensorReading::Inactive)
    }

    /// Resolve to `bool`, treating `Unknown` as not asserted.
    #[inline]
    pub const fn or_assume_inactive(&self) -> bool {
        matches!(self, SensorReading::Active)
    }
}

impl From<bool> for SensorReading {
    fn from(asserted: bool) -> Self {
        if asserted {
            SensorReading::Active
        } else {
            SensorReading::Inactive
        }
    }
}

/// One ultrasonic range measurement.
///
/// A `Timeout` means no echo returned within the sensor's window. Distance
/// validation against the configured min/max window happens in
/// [`crate::sensing`]; an out-of-window distance is just as untrusted as a
/// timeout and must never be read as "clear".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeSample {
    /// Measured distance in millimetres.
    Distance(u32),
    /// No echo within the measurement window.
    Timeout,
}

// ============================================================================
// Effector Capability Set
// ============================================================================

/// Effector capability set: signals, gates, and the deck motor.
///
/// The state machine never touches hardware directly; it is generic over an
/// implementation of this trait injected at construction, so the same
/// control logic runs against simulated outputs in tests.
///
/// # Implementation Notes
///
/// - All commands are idempotent: the machine re-commands the full output
///   set every tick, so setting an unchanged value must be safe and cheap.
/// - Gate confirmation is part of this trait because the gate driver owns
///   its feedback switch; return [`SensorReading::Unknown`] when the
///   feedback circuit cannot be trusted.
pub trait BridgeEffectors {
    /// Error type for effector operations.
    type Error;

    /// Command the road traffic signal.
    fn set_road_signal(&mut self, signal: RoadSignal) -> Result<(), Self::Error>;

    /// Command the marine traffic signal.
    fn set_marine_signal(&mut self, signal: MarineSignal) -> Result<(), Self::Error>;

    /// Command the gate barriers.
    fn command_gates(&mut self, command: GateCommand) -> Result<(), Self::Error>;

    /// Query the gate-down feedback switch.
    ///
    /// Return `Unknown` when the feedback circuit cannot be trusted; the
    /// machine treats that as "not yet confirmed" and holds before motion.
    fn gates_confirmed_down(&self) -> SensorReading;

    /// Enable the motor driver output stage.
    fn motor_enable(&mut self) -> Result<(), Self::Error>;

    /// Disable the motor driver output stage.
    fn motor_disable(&mut self) -> Result<(), Self::Error>;

    /// Set the deck travel direction.
    fn motor_set_direction(&mut self, direction: MotorDirection) -> Result<(), Self::Error>;

    /// Set the motor duty (0-255).
    fn motor_set_duty(&mut self, duty: u8) -> Result<(), Self::Error>;

    /// Convenience method to stop the deck motor.
    ///
    /// Removes the duty and disables the output stage.
    fn motor_stop(&mut self) -> Result<(), Self::Error> {
        self.motor_set_duty(0)?;
        self.motor_disable()
    }
}

// ============================================================================
// Sensor Capability Traits
// ============================================================================

/// Discrete safety switches: e-stop plus top/bottom deck limits.
///
/// All three are typically normally-closed circuits read through GPIO; a
/// broken wire shows up as `Unknown`, not as a clean boolean.
pub trait LimitSwitches {
    /// Emergency-stop input.
    fn estop(&self) -> SensorReading;

    /// Asserted when the deck reaches the fully-open position.
    fn top(&self) -> SensorReading;

    /// Asserted when the deck reaches the fully-closed position.
    fn bottom(&self) -> SensorReading;
}

/// Vehicle-on-bridge detection.
///
/// How presence is derived (inductive loop, light curtain, camera) is the
/// adapter's concern; the core only consumes the resolved reading.
pub trait VehicleDetector {
    /// Returns whether a vehicle is on the deck.
    fn vehicle_present(&self) -> SensorReading;
}

/// Ultrasonic rangefinder.
///
/// One instance per monitored zone (boat waiting area, under-span area).
/// Raw echo timing lives in the adapter; the core only sees millimetres or
/// a timeout.
pub trait RangeFinder {
    /// Take one distance measurement.
    fn distance_mm(&mut self) -> RangeSample;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for motion timing. On desktop
/// this wraps `std::time::Instant`; on embedded, a hardware timer.
///
/// # Example
///
/// ```rust
/// use rs_bascule::traits::Clock;
/// use rs_bascule::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically non-decreasing.
    fn now_ms(&self) -> u64;
}
