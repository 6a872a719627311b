// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error types for recovery sessions.

use std::fmt;

use streamboot_common::address::AddressError;
use streamboot_common::{CodecError, CommandId, Incompatibility, RecoveryStatus, TargetRole};
use thiserror::Error;

/// Result type alias for recovery operations.
pub type Result<T> = std::result::Result<T, RecoveryError>;

/// Session step a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AddressAssignment,
    Capabilities,
    DeviceReady,
    FifoConfiguration,
    Upload,
    BootCompletion,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::AddressAssignment => "address assignment",
            Stage::Capabilities => "capability check",
            Stage::DeviceReady => "device ready wait",
            Stage::FifoConfiguration => "FIFO configuration",
            Stage::Upload => "image upload",
            Stage::BootCompletion => "boot completion wait",
        };
        f.write_str(name)
    }
}

/// Direction of a failed bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
}

impl fmt::Display for BusOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusOp::Read => f.write_str("read"),
            BusOp::Write => f.write_str("write"),
        }
    }
}

/// Every way a recovery session can end without booting the image.
///
/// All variants are fatal to the session; none are retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("dynamic address assignment failed for {role} endpoint 0x{static_address:02x}")]
    AddressAssignment {
        role: TargetRole,
        static_address: u8,
    },

    #[error("bus {op} of {command} failed")]
    Transport { op: BusOp, command: CommandId },

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("unsupported device: {0}")]
    UnsupportedDevice(Incompatibility),

    #[error("device entered recovery for reason 0x{actual:04x}, expected 0x{expected:04x}")]
    UnexpectedRecoveryReason { expected: u16, actual: u16 },

    #[error("unexpected recovery status {status:?} during {stage}")]
    UnexpectedRecoveryStatus { stage: Stage, status: RecoveryStatus },

    #[error("device rejected the image during {stage}: {status:?}")]
    DeviceRejectedImage { stage: Stage, status: RecoveryStatus },

    #[error("image failed to boot: {status:?}")]
    BootFailed { status: RecoveryStatus },

    #[error("timed out during {stage}")]
    Timeout { stage: Stage },

    #[error("invalid image: {0}")]
    InvalidImage(&'static str),

    #[error("session already ran")]
    SessionReused,

    #[error("device reported a zero maximum transfer size")]
    InvalidTransferSize,

    #[error("invalid target addresses: {0}")]
    InvalidAddress(AddressError),
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
