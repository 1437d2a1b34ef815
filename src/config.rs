//! Runtime configuration for the bridge controller.
//!
//! All operating parameters live here: motion timings, motor duties,
//! detection thresholds, and safety feature flags. The state machine never
//! mutates configuration; it receives a `&BridgeConfig` each tick and always
//! observes the latest committed values.
//!
//! Persistence is an external concern. What this module guarantees is the
//! *effect* of a persisted configuration: a mapping from parameter name to a
//! range-validated value, mutable only through [`BridgeConfig::set_param`],
//! so the core never sees an out-of-range setting.
//!
//! # Example
//!
//! ```rust
//! use rs_bascule::config::{BridgeConfig, TimingConfig};
//!
//! // Use defaults
//! let config = BridgeConfig::default();
//! assert_eq!(config.timing.open_max_ms, 7000);
//!
//! // Or customize
//! let config = BridgeConfig::default()
//!     .with_timing(TimingConfig::default().with_yellow_ms(3000));
//!
//! // Runtime mutation goes through the validated setter
//! let mut config = BridgeConfig::default();
//! config.set_param("open_max_ms", "9000").unwrap();
//! assert!(config.set_param("open_max_ms", "50").is_err()); // below range
//! ```

use heapless::String as HString;

/// Maximum length of a parameter name accepted by [`BridgeConfig::set_param`].
pub const MAX_PARAM_NAME: usize = 32;

// ============================================================================
// Timing
// ============================================================================

/// Motion and signal timings, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Road-signal yellow dwell before raising begins.
    pub yellow_ms: u64,
    /// Nominal opening travel time; deceleration starts here.
    pub open_expected_ms: u64,
    /// Hard ceiling for an opening motion before emergency abort.
    pub open_max_ms: u64,
    /// Nominal closing travel time; deceleration starts here.
    pub close_expected_ms: u64,
    /// Hard ceiling for a closing motion before emergency abort.
    pub close_max_ms: u64,
    /// Maximum time an emergency motion may drive the motor.
    pub emergency_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            yellow_ms: 2000,
            open_expected_ms: 5200,
            open_max_ms: 7000,
            close_expected_ms: 5200,
            close_max_ms: 7000,
            emergency_ms: 2000,
        }
    }
}

impl TimingConfig {
    /// Set the yellow dwell duration.
    pub fn with_yellow_ms(mut self, ms: u64) -> Self {
        self.yellow_ms = ms;
        self
    }

    /// Set the expected opening duration.
    pub fn with_open_expected_ms(mut self, ms: u64) -> Self {
        self.open_expected_ms = ms;
        self
    }

    /// Set the maximum opening duration.
    pub fn with_open_max_ms(mut self, ms: u64) -> Self {
        self.open_max_ms = ms;
        self
    }

    /// Set the expected closing duration.
    pub fn with_close_expected_ms(mut self, ms: u64) -> Self {
        self.close_expected_ms = ms;
        self
    }

    /// Set the maximum closing duration.
    pub fn with_close_max_ms(mut self, ms: u64) -> Self {
        self.close_max_ms = ms;
        self
    }

    /// Set the emergency motion ceiling.
    pub fn with_emergency_ms(mut self, ms: u64) -> Self {
        self.emergency_ms = ms;
        self
    }
}

// ============================================================================
// Drive
// ============================================================================

/// Motor duty values (0-255) for opening and closing motions.
///
/// Opening and closing carry separate duties because the deck works against
/// gravity in one direction and with it in the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveConfig {
    /// Cruise duty while opening.
    pub open_cruise: u8,
    /// Creep duty approaching the top limit.
    pub open_slow: u8,
    /// Cruise duty while closing.
    pub close_cruise: u8,
    /// Creep duty approaching the bottom limit.
    pub close_slow: u8,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            open_cruise: 170,
            open_slow: 110,
            close_cruise: 160,
            close_slow: 100,
        }
    }
}

impl DriveConfig {
    /// Set the opening duties.
    pub fn with_open_duties(mut self, cruise: u8, slow: u8) -> Self {
        self.open_cruise = cruise;
        self.open_slow = slow;
        self
    }

    /// Set the closing duties.
    pub fn with_close_duties(mut self, cruise: u8, slow: u8) -> Self {
        self.close_cruise = cruise;
        self.close_slow = slow;
        self
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Boat-detection thresholds and the validated sensing window, millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectionConfig {
    /// A waiting-zone echo at or under this distance means a boat is waiting.
    pub boat_detect_mm: u32,
    /// An under-span echo at or under this distance means the span is occupied.
    pub area_clear_mm: u32,
    /// Minimum distance the rangefinder can credibly report.
    pub range_min_mm: u32,
    /// Maximum distance the rangefinder can credibly report.
    pub range_max_mm: u32,
    /// Consecutive positive samples required before presence is asserted.
    pub confirm_samples: u8,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            boat_detect_mm: 400,
            area_clear_mm: 300,
            range_min_mm: 20,
            range_max_mm: 4000,
            confirm_samples: 1,
        }
    }
}

impl DetectionConfig {
    /// Set the boat-waiting threshold.
    pub fn with_boat_detect_mm(mut self, mm: u32) -> Self {
        self.boat_detect_mm = mm;
        self
    }

    /// Set the under-span occupancy threshold.
    pub fn with_area_clear_mm(mut self, mm: u32) -> Self {
        self.area_clear_mm = mm;
        self
    }

    /// Set the credible sensing window.
    pub fn with_range_window(mut self, min_mm: u32, max_mm: u32) -> Self {
        self.range_min_mm = min_mm;
        self.range_max_mm = max_mm;
        self
    }

    /// Set the debounce sample count.
    pub fn with_confirm_samples(mut self, samples: u8) -> Self {
        self.confirm_samples = samples;
        self
    }
}

// ============================================================================
// Safety
// ============================================================================

/// Safety feature flags.
///
/// Both default to enabled; disabling either is a maintenance-bay setting,
/// never an operating one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SafetyConfig {
    /// Whether the e-stop input is honored.
    pub estop_enabled: bool,
    /// Whether motions abort to an emergency state on exceeding their ceiling.
    pub motion_timeout_enabled: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            estop_enabled: true,
            motion_timeout_enabled: true,
        }
    }
}

impl SafetyConfig {
    /// Enable or disable the e-stop input.
    pub fn with_estop_enabled(mut self, enabled: bool) -> Self {
        self.estop_enabled = enabled;
        self
    }

    /// Enable or disable the motion timeout guard.
    pub fn with_motion_timeout_enabled(mut self, enabled: bool) -> Self {
        self.motion_timeout_enabled = enabled;
        self
    }
}

// ============================================================================
// Web
// ============================================================================

/// Control-panel web server configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS for all origins.
    pub cors_permissive: bool,
    /// Polling interval hint for the panel UI (milliseconds).
    pub poll_interval_ms: u32,
    /// Whether the web server is enabled.
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_permissive: true,
            poll_interval_ms: 500,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode.
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Set the poll interval hint.
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Enable or disable the web server.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Bridge Config
// ============================================================================

/// Complete controller configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BridgeConfig {
    /// Motion and signal timings.
    pub timing: TimingConfig,
    /// Motor duty values.
    pub drive: DriveConfig,
    /// Boat detection thresholds.
    pub detection: DetectionConfig,
    /// Safety feature flags.
    pub safety: SafetyConfig,
    /// Control-panel web server.
    pub web: WebConfig,
}

impl BridgeConfig {
    /// Set timing configuration.
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set drive configuration.
    pub fn with_drive(mut self, drive: DriveConfig) -> Self {
        self.drive = drive;
        self
    }

    /// Set detection configuration.
    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = detection;
        self
    }

    /// Set safety configuration.
    pub fn with_safety(mut self, safety: SafetyConfig) -> Self {
        self.safety = safety;
        self
    }

    /// Set web configuration.
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }
}

// ============================================================================
// Validated Parameter Interface
// ============================================================================

/// Error returned by [`BridgeConfig::set_param`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConfigError {
    /// The parameter name is not recognised.
    UnknownParameter,
    /// The value could not be parsed for this parameter's type.
    InvalidValue,
    /// The value parsed but falls outside the safe operating range.
    OutOfRange {
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
    },
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::UnknownParameter => write!(f, "unknown parameter"),
            ConfigError::InvalidValue => write!(f, "invalid value"),
            ConfigError::OutOfRange { min, max } => {
                write!(f, "value out of range ({min}..={max})")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

fn parse_u64(value: &str, min: u64, max: u64) -> Result<u64, ConfigError> {
    let v: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidValue)?;
    if v < min || v > max {
        return Err(ConfigError::OutOfRange { min, max });
    }
    Ok(v)
}

fn parse_duty(value: &str) -> Result<u8, ConfigError> {
    parse_u64(value, 20, 255).map(|v| v as u8)
}

fn parse_distance(value: &str, min: u64, max: u64) -> Result<u32, ConfigError> {
    parse_u64(value, min, max).map(|v| v as u32)
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("on") || v.eq_ignore_ascii_case("true") || v == "1" {
        Ok(true)
    } else if v.eq_ignore_ascii_case("off") || v.eq_ignore_ascii_case("false") || v == "0" {
        Ok(false)
    } else {
        Err(ConfigError::InvalidValue)
    }
}

impl BridgeConfig {
    /// Set a parameter by name with full range validation.
    ///
    /// This is the single mutation path for runtime configuration changes
    /// (panel API, serial console). Names are case-insensitive; values are
    /// trimmed. Booleans accept `on`/`off`, `true`/`false`, `1`/`0`.
    ///
    /// Each call mutates exactly one parameter; a rejected value leaves the
    /// configuration untouched.
    ///
    /// # Parameters and ranges
    ///
    /// | Name | Range |
    /// |------|-------|
    /// | `yellow_ms` | 100..=60000 |
    /// | `open_expected_ms`, `close_expected_ms` | 100..=120000 |
    /// | `open_max_ms`, `close_max_ms` | 1000..=120000 |
    /// | `emergency_ms` | 500..=10000 |
    /// | `open_cruise`, `open_slow`, `close_cruise`, `close_slow` | 20..=255 |
    /// | `boat_detect_mm`, `area_clear_mm` | 50..=10000 |
    /// | `range_min_mm` | 10..=500 |
    /// | `range_max_mm` | 1000..=10000 |
    /// | `confirm_samples` | 1..=10 |
    /// | `estop_enabled`, `motion_timeout_enabled` | boolean |
    pub fn set_param(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let mut key: HString<MAX_PARAM_NAME> = HString::new();
        for c in name.trim().chars() {
            key.push(c.to_ascii_lowercase())
                .map_err(|_| ConfigError::UnknownParameter)?;
        }

        match key.as_str() {
            "yellow_ms" => self.timing.yellow_ms = parse_u64(value, 100, 60_000)?,
            "open_expected_ms" => self.timing.open_expected_ms = parse_u64(value, 100, 120_000)?,
            "open_max_ms" => self.timing.open_max_ms = parse_u64(value, 1_000, 120_000)?,
            "close_expected_ms" => self.timing.close_expected_ms = parse_u64(value, 100, 120_000)?,
            "close_max_ms" => self.timing.close_max_ms = parse_u64(value, 1_000, 120_000)?,
            "emergency_ms" => self.timing.emergency_ms = parse_u64(value, 500, 10_000)?,
            "open_cruise" => self.drive.open_cruise = parse_duty(value)?,
            "open_slow" => self.drive.open_slow = parse_duty(value)?,
            "close_cruise" => self.drive.close_cruise = parse_duty(value)?,
            "close_slow" => self.drive.close_slow = parse_duty(value)?,
            "boat_detect_mm" => self.detection.boat_detect_mm = parse_distance(value, 50, 10_000)?,
            "area_clear_mm" => self.detection.area_clear_mm = parse_distance(value, 50, 10_000)?,
            "range_min_mm" => self.detection.range_min_mm = parse_distance(value, 10, 500)?,
            "range_max_mm" => self.detection.range_max_mm = parse_distance(value, 1_000, 10_000)?,
            "confirm_samples" => {
                self.detection.confirm_samples = parse_u64(value, 1, 10)? as u8;
            }
            "estop_enabled" => self.safety.estop_enabled = parse_bool(value)?,
            "motion_timeout_enabled" => self.safety.motion_timeout_enabled = parse_bool(value)?,
            _ => return Err(ConfigError::UnknownParameter),
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
