// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Wire protocol and flow control for streaming boot over a recovery interface.
//!
//! This crate supports both `no_std` and `std` environments:
//! - Default: `no_std` mode, usable from a bus controller's firmware
//! - `std` feature: implements `std::error::Error` for host tools

#![cfg_attr(not(feature = "std"), no_std)]

pub mod address;
pub mod fifo;
pub mod protocol;

// Re-export commonly used types
pub use address::{BusAddress, TargetRole, Targets, CCC_SETDASA};
pub use fifo::{available_space, next_chunk, FlowDecision, UploadCursor};
pub use protocol::{decode, encode, words_for, CodecError, CommandId, Message, Payload};
pub use protocol::{
    Capabilities, DeviceReset, DeviceStatus, DeviceStatusCode, FifoCtrl, FifoStatus,
    Incompatibility, ProtocolCapabilities, RecoveryCtrl, RecoveryReason, RecoveryStatus,
};
pub use protocol::{MAX_MESSAGE_LEN, PROTOCOL_MAJOR, PROTOCOL_MINOR, PROT_CAP_MAGIC, WORD_SIZE};
