// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host-side streaming boot engine.
//!
//! Drives a recovery target from address assignment to a booted image over
//! any [`Transport`]. Timing goes through a [`Clock`], so the same engine
//! runs against real hardware with [`SystemClock`] and against
//! a simulated device with a virtual clock in tests.
//!
//! The `sim` feature exposes that device model as the `sim` module for
//! downstream test suites.

pub mod clock;
pub mod config;
pub mod error;
pub mod monitor;
pub mod session;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod transport;

pub use clock::{Clock, Deadline, SystemClock};
pub use config::{SessionConfig, TimingConfig};
pub use error::{BusOp, ConfigError, RecoveryError, Result, Stage};
pub use session::{
    run_recovery, Completion, RecoveryOutcome, RecoveryReport, RecoverySession, SessionState,
};
pub use transport::{BusFault, RecoveryInterface, Transport};
