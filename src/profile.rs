//! Cruise-then-decelerate velocity profiling for deck motions.
//!
//! Every powered motion runs at a cruise duty for the bulk of its travel,
//! then drops to a slow creep duty as it approaches the limit switch. The
//! switchover is a one-way latch per motion: once deceleration starts it
//! never returns to cruise, so sensor noise near a limit cannot make the
//! deck oscillate between speeds.
//!
//! The profiler is deliberately a pure function of elapsed time plus the
//! single latched bit, isolated from the state machine's control flow so it
//! can be tested on its own.
//!
//! # Example
//!
//! ```rust
//! use rs_bascule::profile::{duty_for, MotionProfile};
//!
//! let profile = MotionProfile {
//!     expected_ms: 5200,
//!     cruise: 170,
//!     slow: 110,
//! };
//! let mut decelerating = false;
//!
//! assert_eq!(duty_for(0, &profile, &mut decelerating), 170);
//! assert_eq!(duty_for(5199, &profile, &mut decelerating), 170);
//! assert_eq!(duty_for(5200, &profile, &mut decelerating), 110);
//! assert!(decelerating);
//!
//! // Latched: even if elapsed were to read low again, the duty stays slow
//! assert_eq!(duty_for(100, &profile, &mut decelerating), 110);
//! ```

/// Velocity profile for one motion.
///
/// `expected_ms` is the nominal travel time; past it the motion is assumed
/// to be near its limit switch and drops to `slow`. Cruise/slow duties are
/// read live from configuration each tick, so a profile is cheap to build
/// per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotionProfile {
    /// Nominal travel time in milliseconds; deceleration starts here.
    pub expected_ms: u64,
    /// Duty for the bulk of the motion (0-255).
    pub cruise: u8,
    /// Creep duty near the limit switch (0-255).
    pub slow: u8,
}

/// Select the motor duty for a motion at `elapsed_ms` into its travel.
///
/// `decelerating` is the motion-scoped latch: it transitions `false` →
/// `true` at most once, when `elapsed_ms` first reaches
/// `profile.expected_ms`, and is never cleared here. Callers reset it when
/// a new motion starts.
pub fn duty_for(elapsed_ms: u64, profile: &MotionProfile, decelerating: &mut bool) -> u8 {
    if !*decelerating && elapsed_ms >= profile.expected_ms {
        *decelerating = true;
    }
    if *decelerating {
        profile.slow
    } else {
        profile.cruise
    }
}
