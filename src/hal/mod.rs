//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//!
//! On a robot, the [`crate::traits::DigitalLine`] seam is implemented
//! over the platform's GPIO crate and the vision traits over its
//! camera and inference stack; those backends live with the firmware,
//! not here.

pub mod mock;

pub use mock::*;
