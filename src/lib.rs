//! # rs-bascule
//!
//! A single-leaf drawbridge controller: road and marine traffic signals,
//! gate barriers, and a reversible deck motor sequenced by a
//! safety-critical state machine.
//!
//! ## Features
//!
//! - **Hardware abstraction**: traits for signals, gates, the deck motor,
//!   limit switches, and ultrasonic rangefinders, with untrusted reads
//!   surfaced as an explicit tri-state
//! - **Safety backbone**: emergency states reachable from every motion,
//!   dominating every other guard; time-bounded motions with fault codes
//! - **Velocity profiling**: cruise-then-decelerate with a one-way latch
//!   per motion, immune to sensor noise near a limit switch
//! - **Validated configuration**: every parameter range-checked at the
//!   boundary, mutable one parameter at a time while the machine runs
//! - **Control panel**: optional axum web API and embedded panel page
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware capability abstractions
//! - `machine` - The bridge state machine
//! - `profile` - Motion velocity profiling
//! - `sensing` - Fail-safe input sampling and debounce
//! - `config` - Validated runtime configuration
//! - `hal` - Mock implementations for testing and simulation
//! - `services` - Control-panel web API (feature `web`)
//!
//! ## Example
//!
//! ```rust
//! use rs_bascule::{BridgeConfig, BridgeMachine, BridgeState, TickInputs};
//! use rs_bascule::hal::MockBridgeIo;
//!
//! let config = BridgeConfig::default();
//! let mut machine = BridgeMachine::new(MockBridgeIo::new(), 0);
//!
//! // A boat arrives: the raise sequence begins with the yellow dwell
//! let boat = TickInputs { boat_waiting: true, ..TickInputs::default() };
//! machine.tick(0, boat, &config).unwrap();
//! assert_eq!(machine.state(), BridgeState::PrepRaise);
//!
//! // Yellow elapsed and gates confirmed down: the deck starts moving
//! machine.tick(2000, TickInputs::default(), &config).unwrap();
//! assert_eq!(machine.state(), BridgeState::Raising);
//!
//! // Top limit ends the motion
//! let at_top = TickInputs { top_limit: true, ..TickInputs::default() };
//! machine.tick(6000, at_top, &config).unwrap();
//! assert_eq!(machine.state(), BridgeState::Up);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Validated runtime configuration.
pub mod config;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// The bridge control state machine.
pub mod machine;
/// JSON parsing helpers for builds without serde.
pub mod parsing;
/// Cruise-then-decelerate velocity profiling.
pub mod profile;
/// Fail-safe input sampling, request flags, and debounce.
pub mod sensing;
/// Core traits for hardware abstraction.
pub mod traits;

/// Shared message types for the control-panel API (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// Control-panel services (feature-gated).
#[cfg(feature = "web")]
pub mod services;

// Re-exports for convenience
pub use config::{
    BridgeConfig, ConfigError, DetectionConfig, DriveConfig, SafetyConfig, TimingConfig, WebConfig,
};
pub use machine::{
    BridgeMachine, BridgeState, BridgeStatus, FaultReason, FaultRecord, SignalPlan, TickInputs,
    Transition,
};
pub use profile::{duty_for, MotionProfile};
pub use sensing::{classify_presence, Debounce, InputSampler, PanelCommand, RequestFlags};
pub use traits::{
    // Hardware
    BridgeEffectors,
    Clock,
    GateCommand,
    LimitSwitches,
    MarineSignal,
    MotorDirection,
    RangeFinder,
    RangeSample,
    RoadSignal,
    SensorReading,
    VehicleDetector,
};

// Message re-exports (for the panel API)
#[cfg(feature = "serde")]
pub use messages::{CommandRequest, SetParamRequest};

// Parsing function re-exports (serde-json-core based)
#[cfg(feature = "serde-json-core")]
pub use messages::{parse_command_request, parse_param_request};
