//! API request and response types for the control-panel HTTP interface.

use serde::{Deserialize, Serialize};

use crate::machine::{BridgeState, BridgeStatus, FaultRecord};
use crate::sensing::RequestFlags;
use crate::traits::{GateCommand, MarineSignal, RoadSignal};

// Re-export shared request types
pub use crate::messages::{CommandRequest, SetParamRequest};
pub use crate::sensing::PanelCommand;

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Current bridge state response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    /// Active state
    pub state: BridgeState,
    /// Time spent in the active state
    pub elapsed_in_state_ms: u64,
    /// Whether the current motion has latched into its slow phase
    pub decelerating: bool,
    /// Commanded road signal
    pub road: RoadSignal,
    /// Commanded marine signal
    pub marine: MarineSignal,
    /// Commanded gate position
    pub gates: GateCommand,
    /// Most recent fault, if not yet cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<FaultResponse>,
    /// Pending panel request flags
    pub requests: RequestFlags,
    /// Whether the operator e-stop latch is set
    pub estop_latched: bool,
}

impl StateResponse {
    /// Build a response from a machine snapshot plus the panel state.
    pub fn new(status: &BridgeStatus, requests: RequestFlags, estop_latched: bool) -> Self {
        Self {
            state: status.state,
            elapsed_in_state_ms: status.elapsed_in_state_ms,
            decelerating: status.decelerating,
            road: status.road,
            marine: status.marine,
            gates: status.gates,
            fault: status.fault.as_ref().map(FaultResponse::from),
            requests,
            estop_latched,
        }
    }
}

/// Captured fault response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultResponse {
    /// Reason code (e.g. `CLOSE_TIMEOUT`)
    pub code: String,
    /// State that was active when the fault occurred
    pub during: BridgeState,
    /// Tick timestamp of the fault
    pub at_ms: u64,
}

impl From<&FaultRecord> for FaultResponse {
    fn from(record: &FaultRecord) -> Self {
        Self {
            code: record.reason.code().into(),
            during: record.during,
            at_ms: record.at_ms,
        }
    }
}

/// Command result response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Whether the command was accepted
    pub accepted: bool,
    /// Result details
    pub result: String,
}

impl CommandResponse {
    /// Create an accepted response
    pub fn accepted(result: impl Into<String>) -> Self {
        Self {
            accepted: true,
            result: result.into(),
        }
    }

    /// Create a rejected response
    pub fn rejected(result: impl Into<String>) -> Self {
        Self {
            accepted: false,
            result: result.into(),
        }
    }
}
