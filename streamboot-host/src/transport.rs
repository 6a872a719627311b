// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Bus transport boundary and the typed recovery command channel on top of it.

use streamboot_common::{CommandId, Message};
use thiserror::Error;
use tracing::debug;

use crate::error::{BusOp, RecoveryError, Result};

/// A bus transaction was not acknowledged.
///
/// The engine treats this as a protocol failure and never retries it; link
/// level retries belong to the transport implementation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("bus transaction not acknowledged")]
pub struct BusFault;

/// Byte-oriented access to a two-wire bus controller.
pub trait Transport {
    /// Assign `dynamic_address` to the device answering at `static_address`.
    fn assign_address(&mut self, static_address: u8, dynamic_address: u8)
        -> std::result::Result<(), BusFault>;

    /// Write a recovery command to the device at dynamic address `target`.
    fn command_write(
        &mut self,
        target: u8,
        command: CommandId,
        payload: &[u8],
    ) -> std::result::Result<(), BusFault>;

    /// Read up to `len` bytes of a recovery command from `target`.
    fn command_read(
        &mut self,
        target: u8,
        command: CommandId,
        len: u16,
    ) -> std::result::Result<Vec<u8>, BusFault>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn assign_address(
        &mut self,
        static_address: u8,
        dynamic_address: u8,
    ) -> std::result::Result<(), BusFault> {
        (**self).assign_address(static_address, dynamic_address)
    }

    fn command_write(
        &mut self,
        target: u8,
        command: CommandId,
        payload: &[u8],
    ) -> std::result::Result<(), BusFault> {
        (**self).command_write(target, command, payload)
    }

    fn command_read(
        &mut self,
        target: u8,
        command: CommandId,
        len: u16,
    ) -> std::result::Result<Vec<u8>, BusFault> {
        (**self).command_read(target, command, len)
    }
}

/// Typed recovery commands addressed to one endpoint.
pub struct RecoveryInterface<T: Transport> {
    transport: T,
    target: u8,
}

impl<T: Transport> RecoveryInterface<T> {
    pub fn new(transport: T, target: u8) -> Self {
        Self { transport, target }
    }

    /// Read and decode a fixed-layout message.
    pub fn read<M: Message>(&mut self) -> Result<M> {
        let bytes = self
            .transport
            .command_read(self.target, M::COMMAND, M::LEN as u16)
            .map_err(|_| RecoveryError::Transport {
                op: BusOp::Read,
                command: M::COMMAND,
            })?;
        debug!(
            target_addr = self.target,
            command = %M::COMMAND,
            len = bytes.len(),
            "read"
        );
        Ok(M::decode(&bytes)?)
    }

    /// Encode and write a fixed-layout message.
    pub fn write<M: Message>(&mut self, message: &M) -> Result<()> {
        let frame = message.encode();
        debug!(target_addr = self.target, command = %M::COMMAND, "write");
        self.transport
            .command_write(self.target, M::COMMAND, &frame)
            .map_err(|_| RecoveryError::Transport {
                op: BusOp::Write,
                command: M::COMMAND,
            })
    }

    /// Push a chunk of image bytes into the indirect FIFO.
    pub fn write_data(&mut self, chunk: &[u8]) -> Result<()> {
        self.transport
            .command_write(self.target, CommandId::IndirectFifoData, chunk)
            .map_err(|_| RecoveryError::Transport {
                op: BusOp::Write,
                command: CommandId::IndirectFifoData,
            })
    }
}
