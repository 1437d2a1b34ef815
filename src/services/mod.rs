//! Control-panel services for the bridge controller.
//!
//! This module provides the optional HTTP surface around the core:
//! - `web` feature: Axum-based control-panel API with JSON endpoints
//!
//! The service integrates with the core through [`SharedBridge`], wrapped
//! in `Arc` for thread-safe access. Handlers only set request flags and
//! read snapshots; one tick driver loop keeps sole ownership of the control
//! cycle.
//!
//! # Shared State Pattern
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_bascule::services::SharedBridge;
//!
//! // Create single shared state
//! let state = Arc::new(SharedBridge::new(machine, config));
//!
//! // The web router and the tick driver use the same state
//! let router = build_router(Arc::clone(&state), &web_config);
//! ```

// Shared state and API types
pub mod api;
pub mod shared;

pub mod web;

// Re-exports
pub use api::*;
pub use shared::*;
pub use web::*;
