//! Shared message types for the control-panel API.
//!
//! These types are `no_std` compatible and can be deserialized using either
//! `serde_json` (desktop) or `serde-json-core` (embedded panels).
//!
//! # Example
//!
//! ```
//! use rs_bascule::messages::CommandRequest;
//!
//! // Desktop: using serde_json
//! #[cfg(feature = "std")]
//! {
//!     let json = r#"{"command": "raise"}"#;
//!     let req: CommandRequest = serde_json::from_str(json).unwrap();
//! }
//! ```

use heapless::String as HString;
use serde::{Deserialize, Serialize};

use crate::config::MAX_PARAM_NAME;
use crate::sensing::PanelCommand;

/// Maximum length of a parameter value in a [`SetParamRequest`].
pub const MAX_PARAM_VALUE: usize = 32;

// ============================================================================
// Request Types
// ============================================================================

/// Request to set a bridge request flag.
///
/// # JSON Examples
///
/// ```json
/// {"command": "raise"}
/// {"command": "abort"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// The verb to apply.
    pub command: PanelCommand,
}

impl CommandRequest {
    /// Create a new command request.
    pub fn new(command: PanelCommand) -> Self {
        Self { command }
    }
}

/// Request to change one configuration parameter.
///
/// Routed through [`BridgeConfig::set_param`], so the full validation table
/// applies before anything reaches the controller.
///
/// # JSON Example
///
/// ```json
/// {"name": "open_max_ms", "value": "9000"}
/// ```
///
/// [`BridgeConfig::set_param`]: crate::config::BridgeConfig::set_param
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetParamRequest {
    /// Parameter name.
    pub name: HString<MAX_PARAM_NAME>,
    /// Parameter value, parsed per the parameter's type.
    pub value: HString<MAX_PARAM_VALUE>,
}

// ============================================================================
// Embedded Parse Helpers (serde-json-core)
// ============================================================================

/// Parse a [`CommandRequest`] from a JSON byte slice without allocating.
#[cfg(feature = "serde-json-core")]
pub fn parse_command_request(json: &[u8]) -> Option<CommandRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a [`SetParamRequest`] from a JSON byte slice without allocating.
#[cfg(feature = "serde-json-core")]
pub fn parse_param_request(json: &[u8]) -> Option<SetParamRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

// ============================================================================
// Tests
// ============================================================================
