//! Input sampling: turning untrusted sensor reads into per-tick booleans.
//!
//! The state machine consumes clean booleans; this layer is where every
//! untrusted reading gets its safe interpretation:
//!
//! - a distance outside the validated sensing window, or an echo timeout,
//!   counts as *boat present* — an invalid reading must never read as
//!   "clear";
//! - an unknown limit switch counts as *not yet reached* — the motion
//!   timeout is the backstop;
//! - an unknown e-stop circuit counts as *pressed* — a broken
//!   normally-closed loop fails safe;
//! - an unknown vehicle detector counts as *vehicle present*.
//!
//! Boat-presence debounce also lives here, not in the machine: presence is
//! asserted only after `confirm_samples` consecutive positive samples, and
//! clears immediately on a negative one.
//!
//! # Example
//!
//! ```rust
//! use rs_bascule::config::DetectionConfig;
//! use rs_bascule::sensing::classify_presence;
//! use rs_bascule::traits::{RangeSample, SensorReading};
//!
//! let det = DetectionConfig::default(); // window 20..=4000 mm, detect at 400 mm
//!
//! assert_eq!(classify_presence(RangeSample::Distance(350), 400, &det), SensorReading::Active);
//! assert_eq!(classify_presence(RangeSample::Distance(900), 400, &det), SensorReading::Inactive);
//!
//! // Out of window or timed out: untrusted, not "clear"
//! assert_eq!(classify_presence(RangeSample::Distance(9999), 400, &det), SensorReading::Unknown);
//! assert_eq!(classify_presence(RangeSample::Timeout, 400, &det), SensorReading::Unknown);
//! ```

use log::{debug, warn};

use crate::config::DetectionConfig;
use crate::machine::TickInputs;
use crate::traits::{LimitSwitches, RangeFinder, RangeSample, SensorReading, VehicleDetector};

// ============================================================================
// Request Flags
// ============================================================================

/// Level-sensitive operator request flags.
///
/// Owned by the input sources (panel API, physical buttons): a source sets a
/// flag and later clears it; the core only ever reads the value it is handed
/// each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestFlags {
    /// Open the span.
    pub raise: bool,
    /// Close the span.
    pub lower: bool,
    /// Abandon the current motion.
    pub abort: bool,
}

impl RequestFlags {
    /// Clear all flags.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Apply a panel command to the flags.
    ///
    /// `Raise` and `Lower` are mutually exclusive and replace each other;
    /// `Abort` latches until `Clear`.
    pub fn apply(&mut self, command: PanelCommand) {
        match command {
            PanelCommand::Raise => {
                self.raise = true;
                self.lower = false;
            }
            PanelCommand::Lower => {
                self.lower = true;
                self.raise = false;
            }
            PanelCommand::Abort => {
                self.abort = true;
            }
            PanelCommand::Clear => {
                self.clear();
            }
        }
    }
}

/// Panel command verbs.
///
/// Every verb maps onto a level-sensitive request flag; a source sets a
/// flag and clears it again with [`Clear`](Self::Clear) — the core never
/// clears flags itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PanelCommand {
    /// Request the span to open.
    Raise,
    /// Request the span to close.
    Lower,
    /// Request the current motion to abort.
    Abort,
    /// Clear all pending request flags.
    Clear,
}

impl PanelCommand {
    /// Returns the verb as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PanelCommand::Raise => "raise",
            PanelCommand::Lower => "lower",
            PanelCommand::Abort => "abort",
            PanelCommand::Clear => "clear",
        }
    }

    /// Parse a verb from text input.
    ///
    /// Input is trimmed and case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_bascule::sensing::PanelCommand;
    ///
    /// assert_eq!(PanelCommand::from_text("raise"), Some(PanelCommand::Raise));
    /// assert_eq!(PanelCommand::from_text("  LOWER "), Some(PanelCommand::Lower));
    /// assert_eq!(PanelCommand::from_text("open"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("raise") {
            Some(PanelCommand::Raise)
        } else if s.eq_ignore_ascii_case("lower") {
            Some(PanelCommand::Lower)
        } else if s.eq_ignore_ascii_case("abort") {
            Some(PanelCommand::Abort)
        } else if s.eq_ignore_ascii_case("clear") {
            Some(PanelCommand::Clear)
        } else {
            None
        }
    }
}

// ============================================================================
// Debounce
// ============================================================================

/// Consecutive-sample debounce for presence detection.
///
/// Asserts after `required` consecutive positive samples; a single negative
/// sample clears immediately. With `required = 1` this is transparent.
#[derive(Clone, Copy, Debug, Default)]
pub struct Debounce {
    streak: u8,
}

impl Debounce {
    /// Create a cleared debounce counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample; returns the debounced presence.
    ///
    /// `required` is read per call so a configuration change takes effect on
    /// the next sample without re-initialisation.
    pub fn update(&mut self, present: bool, required: u8) -> bool {
        let required = required.max(1);
        if present {
            self.streak = self.streak.saturating_add(1).min(required);
        } else {
            self.streak = 0;
        }
        self.streak >= required
    }
}

// ============================================================================
// Range Classification
// ============================================================================

/// Classify one range measurement against a presence threshold.
///
/// A reading is trusted only inside the configured
/// `[range_min_mm, range_max_mm]` window; anything else — including a
/// timeout — is [`SensorReading::Unknown`] and must not be taken as a valid
/// "clear".
pub fn classify_presence(
    sample: RangeSample,
    threshold_mm: u32,
    det: &DetectionConfig,
) -> SensorReading {
    match sample {
        RangeSample::Timeout => SensorReading::Unknown,
        RangeSample::Distance(mm) if mm < det.range_min_mm || mm > det.range_max_mm => {
            SensorReading::Unknown
        }
        RangeSample::Distance(mm) => SensorReading::from(mm <= threshold_mm),
    }
}

// ============================================================================
// Input Sampler
// ============================================================================

/// Samples every sensor once per tick and builds [`TickInputs`].
///
/// Owns the two rangefinders (waiting zone and under-span zone), the limit
/// switches, the vehicle detector, and the per-zone debounce state. Request
/// flags are passed in each call — their lifetime belongs to the sources.
pub struct InputSampler<L, V, W, U> {
    limits: L,
    vehicles: V,
    waiting_zone: W,
    under_span_zone: U,
    waiting_debounce: Debounce,
    under_debounce: Debounce,
}

impl<L, V, W, U> InputSampler<L, V, W, U>
where
    L: LimitSwitches,
    V: VehicleDetector,
    W: RangeFinder,
    U: RangeFinder,
{
    /// Create a sampler over the given sensor set.
    pub fn new(limits: L, vehicles: V, waiting_zone: W, under_span_zone: U) -> Self {
        Self {
            limits,
            vehicles,
            waiting_zone,
            under_span_zone,
            waiting_debounce: Debounce::new(),
            under_debounce: Debounce::new(),
        }
    }

    /// Sample all sensors and resolve them into clean tick inputs.
    pub fn sample(&mut self, det: &DetectionConfig, requests: RequestFlags) -> TickInputs {
        let estop_reading = self.limits.estop();
        if estop_reading.is_unknown() {
            warn!("e-stop circuit unreadable, failing toward pressed");
        }

        let waiting_raw = classify_presence(
            self.waiting_zone.distance_mm(),
            det.boat_detect_mm,
            det,
        );
        let under_raw = classify_presence(
            self.under_span_zone.distance_mm(),
            det.area_clear_mm,
            det,
        );
        if waiting_raw.is_unknown() || under_raw.is_unknown() {
            debug!("untrusted range sample, failing toward boat present");
        }

        TickInputs {
            request_raise: requests.raise,
            request_lower: requests.lower,
            request_abort: requests.abort,
            estop: estop_reading.or_assume_active(),
            top_limit: self.limits.top().or_assume_inactive(),
            bottom_limit: self.limits.bottom().or_assume_inactive(),
            car_on_bridge: self.vehicles.vehicle_present().or_assume_active(),
            boat_waiting: self
                .waiting_debounce
                .update(waiting_raw.or_assume_active(), det.confirm_samples),
            boat_under_span: self
                .under_debounce
                .update(under_raw.or_assume_active(), det.confirm_samples),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockLimits, MockRange, MockVehicleSensor};

    fn det() -> DetectionConfig {
        DetectionConfig::default()
    }

    fn sampler(
        limits: MockLimits,
        vehicles: MockVehicleSensor,
        waiting: MockRange,
        under: MockRange,
    ) -> InputSampler<MockLimits, MockVehicleSensor, MockRange, MockRange> {
        InputSampler::new(limits, vehicles, waiting, under)
    }

    // =========================================================================
    // classify_presence
    // =========================================================================

    #[test]
    fn presence_within_threshold() {
        assert_eq!(
            classify_presence(RangeSample::Distance(200), 400, &det()),
            SensorReading::Active
        );
        assert_eq!(
            classify_presence(RangeSample::Distance(400), 400, &det()),
            SensorReading::Active
        );
    }

    #[test]
    fn clear_beyond_threshold() {
        assert_eq!(
            classify_presence(RangeSample::Distance(401), 400, &det()),
            SensorReading::Inactive
        );
    }

    #[test]
    fn out_of_window_is_unknown_not_clear() {
        // Below the credible minimum
        assert_eq!(
            classify_presence(RangeSample::Distance(5), 400, &det()),
            SensorReading::Unknown
        );
        // Beyond the credible maximum
        assert_eq!(
            classify_presence(RangeSample::Distance(5000), 400, &det()),
            SensorReading::Unknown
        );
    }

    #[test]
    fn timeout_is_unknown() {
        assert_eq!(
            classify_presence(RangeSample::Timeout, 400, &det()),
            SensorReading::Unknown
        );
    }

    // =========================================================================
    // RequestFlags and PanelCommand
    // =========================================================================

    #[test]
    fn panel_command_from_text() {
        assert_eq!(PanelCommand::from_text("raise"), Some(PanelCommand::Raise));
        assert_eq!(PanelCommand::from_text("lower"), Some(PanelCommand::Lower));
        assert_eq!(PanelCommand::from_text("ABORT"), Some(PanelCommand::Abort));
        assert_eq!(PanelCommand::from_text(" clear\t"), Some(PanelCommand::Clear));
        assert_eq!(PanelCommand::from_text(""), None);
        assert_eq!(PanelCommand::from_text("open"), None);
    }

    #[test]
    fn raise_and_lower_replace_each_other() {
        let mut flags = RequestFlags::default();

        flags.apply(PanelCommand::Raise);
        assert!(flags.raise);
        assert!(!flags.lower);

        flags.apply(PanelCommand::Lower);
        assert!(!flags.raise);
        assert!(flags.lower);
    }

    #[test]
    fn abort_latches_until_clear() {
        let mut flags = RequestFlags::default();

        flags.apply(PanelCommand::Abort);
        flags.apply(PanelCommand::Raise);
        assert!(flags.abort);

        flags.apply(PanelCommand::Clear);
        assert_eq!(flags, RequestFlags::default());
    }

    // =========================================================================
    // Debounce
    // =========================================================================

    #[test]
    fn debounce_single_sample_is_transparent() {
        let mut d = Debounce::new();
        assert!(d.update(true, 1));
        assert!(!d.update(false, 1));
    }

    #[test]
    fn debounce_requires_consecutive_samples() {
        let mut d = Debounce::new();
        assert!(!d.update(true, 3));
        assert!(!d.update(true, 3));
        assert!(d.update(true, 3));
        // Holds while positive
        assert!(d.update(true, 3));
    }

    #[test]
    fn debounce_clears_immediately() {
        let mut d = Debounce::new();
        d.update(true, 2);
        d.update(true, 2);
        assert!(!d.update(false, 2));
        assert!(!d.update(true, 2));
    }

    #[test]
    fn debounce_zero_required_behaves_as_one() {
        let mut d = Debounce::new();
        assert!(d.update(true, 0));
    }

    // =========================================================================
    // InputSampler fail-safe defaults
    // =========================================================================

    #[test]
    fn clean_inputs_pass_through() {
        let mut s = sampler(
            MockLimits::new(),
            MockVehicleSensor::new(),
            MockRange::fixed(RangeSample::Distance(2000)),
            MockRange::fixed(RangeSample::Distance(2000)),
        );
        let inputs = s.sample(&det(), RequestFlags::default());

        assert!(!inputs.estop);
        assert!(!inputs.top_limit);
        assert!(!inputs.bottom_limit);
        assert!(!inputs.car_on_bridge);
        assert!(!inputs.boat_waiting);
        assert!(!inputs.boat_under_span);
    }

    #[test]
    fn request_flags_pass_through() {
        let mut s = sampler(
            MockLimits::new(),
            MockVehicleSensor::new(),
            MockRange::fixed(RangeSample::Distance(2000)),
            MockRange::fixed(RangeSample::Distance(2000)),
        );
        let inputs = s.sample(
            &det(),
            RequestFlags {
                raise: true,
                lower: false,
                abort: true,
            },
        );

        assert!(inputs.request_raise);
        assert!(!inputs.request_lower);
        assert!(inputs.request_abort);
    }

    #[test]
    fn unknown_estop_fails_toward_pressed() {
        let mut limits = MockLimits::new();
        limits.estop = SensorReading::Unknown;
        let mut s = sampler(
            limits,
            MockVehicleSensor::new(),
            MockRange::fixed(RangeSample::Distance(2000)),
            MockRange::fixed(RangeSample::Distance(2000)),
        );

        assert!(s.sample(&det(), RequestFlags::default()).estop);
    }

    #[test]
    fn unknown_limit_fails_toward_not_reached() {
        let mut limits = MockLimits::new();
        limits.top = SensorReading::Unknown;
        limits.bottom = SensorReading::Unknown;
        let mut s = sampler(
            limits,
            MockVehicleSensor::new(),
            MockRange::fixed(RangeSample::Distance(2000)),
            MockRange::fixed(RangeSample::Distance(2000)),
        );

        let inputs = s.sample(&det(), RequestFlags::default());
        assert!(!inputs.top_limit);
        assert!(!inputs.bottom_limit);
    }

    #[test]
    fn range_timeout_fails_toward_boat_present() {
        let mut s = sampler(
            MockLimits::new(),
            MockVehicleSensor::new(),
            MockRange::fixed(RangeSample::Timeout),
            MockRange::fixed(RangeSample::Timeout),
        );

        let inputs = s.sample(&det(), RequestFlags::default());
        assert!(inputs.boat_waiting);
        assert!(inputs.boat_under_span);
    }

    #[test]
    fn unknown_vehicle_fails_toward_present() {
        let mut vehicles = MockVehicleSensor::new();
        vehicles.present = SensorReading::Unknown;
        let mut s = sampler(
            MockLimits::new(),
            vehicles,
            MockRange::fixed(RangeSample::Distance(2000)),
            MockRange::fixed(RangeSample::Distance(2000)),
        );

        assert!(s.sample(&det(), RequestFlags::default()).car_on_bridge);
    }

    #[test]
    fn debounced_boat_detection() {
        let config = det().with_confirm_samples(2);
        let mut waiting = MockRange::fixed(RangeSample::Distance(2000));
        waiting.queue_sample(RangeSample::Distance(300));
        waiting.queue_sample(RangeSample::Distance(300));
        let mut s = sampler(
            MockLimits::new(),
            MockVehicleSensor::new(),
            waiting,
            MockRange::fixed(RangeSample::Distance(2000)),
        );

        // First positive sample is not yet confirmed
        assert!(!s.sample(&config, RequestFlags::default()).boat_waiting);
        // Second consecutive positive confirms
        assert!(s.sample(&config, RequestFlags::default()).boat_waiting);
        // Queue exhausted: fallback distance clears immediately
        assert!(!s.sample(&config, RequestFlags::default()).boat_waiting);
    }
}
