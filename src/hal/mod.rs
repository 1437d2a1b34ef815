//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: test implementations for desktop development and the
//!   simulator. Panel I/O boards implement the same traits out of tree;
//!   the driver layer (PWM registers, echo timing, pin tables) is not part
//!   of this crate.

pub mod mock;

pub use mock::*;
