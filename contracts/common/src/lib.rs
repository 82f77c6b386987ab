//! Stratos Common Library
//!
//! Shared types, constants, and utilities for the Stratos vault strategies.
//!
//! A Vault routes deposited collateral into pluggable Strategies. The
//! strategy crates in this workspace build on this library:
//!
//! - **Native Staking**: validator lifecycle and beacon chain sweep accounting
//! - **AMO**: single sided liquidity management against a two asset pool
//!
//! ## Contents
//!
//! - **Errors**: one typed error enum with stable codes
//! - **Events**: borsh/serde serialisable strategy events and an event log
//! - **Math**: 18-decimal fixed point with truncating semantics
//! - **Access Control**: role book and explicit caller context
//! - **Emergency**: pause circuit breaker with typed causes
//! - **Config**: deployment thresholds with validated defaults
//! - **Interfaces**: wrapped native asset and deposit contract collaborators
//!
//! This crate is `no_std` compatible when built without the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export Vec for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::vec::Vec;
#[cfg(feature = "std")]
pub use std::vec::Vec;

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod access_control;
pub mod emergency;
pub mod config;
pub mod interfaces;
pub mod validation;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use access_control::*;
pub use emergency::*;
pub use config::*;
pub use interfaces::*;
