// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-memory recovery target and virtual clock.
//!
//! [`SimulatedTarget`] answers the recovery command set the way a device's
//! recovery firmware does: it only talks once its endpoints have dynamic
//! addresses, enters streaming boot on the matching `DEVICE_RESET`, accepts
//! the image size through `INDIRECT_FIFO_CTRL`, drains its indirect FIFO a
//! few words per status poll, and boots on `RECOVERY_CTRL`. Every
//! transaction is logged so tests can check what went over the bus.
//!
//! [`ManualClock`] advances only when slept on, so timeouts are reached
//! without real delays.

use std::cell::Cell;
use std::collections::VecDeque;
use std::time::Duration;

use streamboot_common::protocol::{
    ACTIVATE_RECOVERY_IMAGE, FIFO_STATUS_EMPTY, FIFO_STATUS_FULL, FORCED_RECOVERY_STREAMING_BOOT,
};
use streamboot_common::{
    Capabilities, CommandId, DeviceReset, DeviceStatus, DeviceStatusCode, FifoCtrl, FifoStatus,
    Message, ProtocolCapabilities, RecoveryCtrl, RecoveryReason, RecoveryStatus, TargetRole,
    Targets, PROTOCOL_MAJOR, PROTOCOL_MINOR, PROT_CAP_MAGIC, WORD_SIZE,
};

use crate::clock::Clock;
use crate::transport::{BusFault, Transport};

/// One bus transaction as seen by the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    AssignAddress {
        static_address: u8,
        dynamic_address: u8,
    },
    Write {
        target: u8,
        command: CommandId,
        payload: Vec<u8>,
    },
    Read {
        target: u8,
        command: CommandId,
    },
}

/// An `INDIRECT_FIFO_DATA` write and the FIFO room it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataWrite {
    pub len: usize,
    /// Free bytes in the FIFO when the write arrived.
    pub free_bytes: u32,
}

/// Capabilities of a device that supports streaming boot.
pub fn streaming_boot_capabilities() -> ProtocolCapabilities {
    ProtocolCapabilities {
        magic: PROT_CAP_MAGIC,
        major: PROTOCOL_MAJOR,
        minor: PROTOCOL_MINOR,
        capabilities: Capabilities::STREAMING_BOOT,
        cms_count: 1,
        max_response_time: 0x10,
        heartbeat_period: 0,
    }
}

/// Device model behind a [`Transport`].
#[derive(Debug)]
pub struct SimulatedTarget {
    targets: Targets,
    primary_dynamic: Option<u8>,
    recovery_dynamic: Option<u8>,

    capabilities: ProtocolCapabilities,
    reason: RecoveryReason,
    ready_after: Option<u32>,
    reset: Option<DeviceReset>,
    device_polls: u32,

    recovery_status: RecoveryStatus,
    status_script: VecDeque<RecoveryStatus>,
    boot_polls: u32,
    boot_remaining: u32,
    boot_result: RecoveryStatus,

    fifo_size_words: u32,
    max_transfer_words: u32,
    drain_words_per_poll: u32,
    drain_every: u32,
    fifo_polls: u32,
    max_image_words: u32,
    image_words: u32,
    staged: Vec<u8>,
    drained_words: u32,
    reject_after_bytes: Option<usize>,
    stalled: bool,

    failing: Option<CommandId>,
    truncated: Option<(CommandId, usize)>,

    events: Vec<BusEvent>,
    data_writes: Vec<DataWrite>,
    overruns: u32,
    oversized_transfers: u32,
}

impl Default for SimulatedTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTarget {
    /// Healthy device on the default addresses.
    pub fn new() -> Self {
        Self {
            targets: Targets::default(),
            primary_dynamic: None,
            recovery_dynamic: None,
            capabilities: streaming_boot_capabilities(),
            reason: RecoveryReason::STREAMING_BOOT,
            ready_after: Some(2),
            reset: None,
            device_polls: 0,
            recovery_status: RecoveryStatus::NotInRecovery,
            status_script: VecDeque::new(),
            boot_polls: 2,
            boot_remaining: 0,
            boot_result: RecoveryStatus::Success,
            fifo_size_words: 64,
            max_transfer_words: 16,
            drain_words_per_poll: 16,
            drain_every: 1,
            fifo_polls: 0,
            max_image_words: 64 * 1024,
            image_words: 0,
            staged: Vec::new(),
            drained_words: 0,
            reject_after_bytes: None,
            stalled: false,
            failing: None,
            truncated: None,
            events: Vec::new(),
            data_writes: Vec::new(),
            overruns: 0,
            oversized_transfers: 0,
        }
    }

    // --- Configuration ---

    pub fn with_targets(mut self, targets: Targets) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_capabilities(mut self, capabilities: ProtocolCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_recovery_reason(mut self, reason: RecoveryReason) -> Self {
        self.reason = reason;
        self
    }

    /// Report ready on the `polls + 1`-th `DEVICE_STATUS` read after reset.
    pub fn with_ready_after(mut self, polls: u32) -> Self {
        self.ready_after = Some(polls);
        self
    }

    /// Never leave the pending state after reset.
    pub fn never_ready(mut self) -> Self {
        self.ready_after = None;
        self
    }

    pub fn with_fifo(mut self, fifo_size_words: u32, max_transfer_words: u32) -> Self {
        self.fifo_size_words = fifo_size_words;
        self.max_transfer_words = max_transfer_words;
        self
    }

    /// Words consumed from the FIFO on each `INDIRECT_FIFO_STATUS` read.
    pub fn with_drain_rate(mut self, words_per_poll: u32) -> Self {
        self.drain_words_per_poll = words_per_poll;
        self
    }

    /// Only drain on every `polls`-th `INDIRECT_FIFO_STATUS` read.
    pub fn with_drain_every(mut self, polls: u32) -> Self {
        self.drain_every = polls.max(1);
        self
    }

    /// Largest image the device accepts through `INDIRECT_FIFO_CTRL`.
    pub fn with_max_image_words(mut self, words: u32) -> Self {
        self.max_image_words = words;
        self
    }

    /// Report `Booting` for `polls` reads after activation, then `result`.
    pub fn with_boot(mut self, polls: u32, result: RecoveryStatus) -> Self {
        self.boot_polls = polls;
        self.boot_result = result;
        self
    }

    /// Answer the next `RECOVERY_STATUS` reads from `script` instead of the model.
    pub fn with_recovery_script<I>(mut self, script: I) -> Self
    where
        I: IntoIterator<Item = RecoveryStatus>,
    {
        self.status_script = script.into_iter().collect();
        self
    }

    /// Give up on the image (status `FAILURE`, FIFO no longer drained) once
    /// `bytes` have been received.
    pub fn with_reject_after_bytes(mut self, bytes: usize) -> Self {
        self.reject_after_bytes = Some(bytes);
        self
    }

    /// NACK every transaction of `command`.
    pub fn with_failing_command(mut self, command: CommandId) -> Self {
        self.failing = Some(command);
        self
    }

    /// Answer reads of `command` with only `len` bytes.
    pub fn with_truncated_response(mut self, command: CommandId, len: usize) -> Self {
        self.truncated = Some((command, len));
        self
    }

    // --- Inspection ---

    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    pub fn data_writes(&self) -> &[DataWrite] {
        &self.data_writes
    }

    /// Image bytes received through the FIFO, in order.
    pub fn staged_image(&self) -> &[u8] {
        &self.staged
    }

    /// Data writes larger than the free FIFO space.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Data writes larger than the advertised maximum transfer size.
    pub fn oversized_transfers(&self) -> u32 {
        self.oversized_transfers
    }

    pub fn dynamic_address(&self, role: TargetRole) -> Option<u8> {
        match role {
            TargetRole::Primary => self.primary_dynamic,
            TargetRole::Recovery => self.recovery_dynamic,
        }
    }

    pub fn writes_of(&self, command: CommandId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BusEvent::Write { command: c, .. } if *c == command))
            .count()
    }

    pub fn reads_of(&self, command: CommandId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BusEvent::Read { command: c, .. } if *c == command))
            .count()
    }

    // --- Model ---

    fn written_words(&self) -> u32 {
        self.staged.len().div_ceil(WORD_SIZE) as u32
    }

    fn occupancy_words(&self) -> u32 {
        self.written_words() - self.drained_words
    }

    fn free_bytes(&self) -> u32 {
        self.fifo_size_words.saturating_sub(self.occupancy_words()) * WORD_SIZE as u32
    }

    fn fifo_status(&self) -> FifoStatus {
        let occupancy = self.occupancy_words();
        let mut flags = 0;
        if occupancy == 0 {
            flags |= FIFO_STATUS_EMPTY;
        }
        if occupancy >= self.fifo_size_words {
            flags |= FIFO_STATUS_FULL;
        }
        FifoStatus {
            flags,
            write_ptr: self
                .written_words()
                .checked_rem(self.fifo_size_words)
                .unwrap_or(0),
            read_ptr: self
                .drained_words
                .checked_rem(self.fifo_size_words)
                .unwrap_or(0),
            fifo_size_words: self.fifo_size_words,
            max_transfer_words: self.max_transfer_words,
        }
    }

    fn drain(&mut self) {
        self.fifo_polls += 1;
        if self.stalled || self.fifo_polls % self.drain_every != 0 {
            return;
        }
        self.drained_words =
            (self.drained_words + self.drain_words_per_poll).min(self.written_words());
    }

    fn device_status(&mut self) -> DeviceStatus {
        let in_streaming_boot = self
            .reset
            .is_some_and(|r| r.forced_recovery == FORCED_RECOVERY_STREAMING_BOOT);
        if !in_streaming_boot {
            return DeviceStatus {
                status: DeviceStatusCode::Healthy,
                protocol_error: 0,
                reason: RecoveryReason(0),
                heartbeat: 0,
                vendor_status_len: 0,
            };
        }

        self.device_polls += 1;
        let ready = self.ready_after.is_some_and(|n| self.device_polls > n);
        if !ready {
            return DeviceStatus {
                status: DeviceStatusCode::Pending,
                protocol_error: 0,
                reason: RecoveryReason(0),
                heartbeat: 0,
                vendor_status_len: 0,
            };
        }
        if self.recovery_status == RecoveryStatus::NotInRecovery {
            self.recovery_status = RecoveryStatus::AwaitingImage;
        }
        DeviceStatus {
            status: DeviceStatusCode::ReadyToAccept,
            protocol_error: 0,
            reason: self.reason,
            heartbeat: 0,
            vendor_status_len: 0,
        }
    }

    fn recovery_status(&mut self) -> RecoveryStatus {
        if let Some(status) = self.status_script.pop_front() {
            return status;
        }
        if self.recovery_status == RecoveryStatus::Booting {
            if self.boot_remaining == 0 {
                self.recovery_status = self.boot_result;
            } else {
                self.boot_remaining -= 1;
            }
        }
        self.recovery_status
    }

    fn respond(&mut self, command: CommandId) -> Vec<u8> {
        let frame = match command {
            CommandId::ProtCap => self.capabilities.encode(),
            CommandId::DeviceStatus => self.device_status().encode(),
            CommandId::RecoveryStatus => self.recovery_status().encode(),
            CommandId::IndirectFifoStatus => {
                self.drain();
                self.fifo_status().encode()
            }
            CommandId::DeviceReset => self
                .reset
                .unwrap_or(DeviceReset {
                    reset_ctrl: 0,
                    forced_recovery: 0,
                    interface_ctrl: 0,
                })
                .encode(),
            CommandId::IndirectFifoCtrl => FifoCtrl {
                component: 0,
                reset: 0,
                image_size_words: self.image_words,
            }
            .encode(),
            CommandId::RecoveryCtrl | CommandId::IndirectFifoData => return Vec::new(),
        };
        frame.to_vec()
    }

    fn handle_write(&mut self, command: CommandId, payload: &[u8]) -> Result<(), BusFault> {
        match command {
            CommandId::DeviceReset => {
                let reset = DeviceReset::decode(payload).map_err(|_| BusFault)?;
                self.reset = Some(reset);
                self.device_polls = 0;
            }
            CommandId::IndirectFifoCtrl => {
                let ctrl = FifoCtrl::decode(payload).map_err(|_| BusFault)?;
                if self.recovery_status == RecoveryStatus::AwaitingImage {
                    self.image_words = ctrl.image_size_words;
                    if ctrl.image_size_words > self.max_image_words {
                        self.recovery_status = RecoveryStatus::Failure;
                    }
                }
            }
            CommandId::IndirectFifoData => self.receive_data(payload),
            CommandId::RecoveryCtrl => {
                let ctrl = RecoveryCtrl::decode(payload).map_err(|_| BusFault)?;
                if ctrl.activate == ACTIVATE_RECOVERY_IMAGE {
                    self.activate();
                }
            }
            // Read-only registers.
            CommandId::ProtCap
            | CommandId::DeviceStatus
            | CommandId::RecoveryStatus
            | CommandId::IndirectFifoStatus => return Err(BusFault),
        }
        Ok(())
    }

    fn receive_data(&mut self, payload: &[u8]) {
        let free_bytes = self.free_bytes();
        self.data_writes.push(DataWrite {
            len: payload.len(),
            free_bytes,
        });
        if payload.len() > free_bytes as usize {
            self.overruns += 1;
            self.recovery_status = RecoveryStatus::Failure;
        }
        let max_transfer = self.max_transfer_words as usize * WORD_SIZE;
        if payload.len() > max_transfer {
            self.oversized_transfers += 1;
            self.recovery_status = RecoveryStatus::Failure;
        }
        self.staged.extend_from_slice(payload);
        if self.staged.len() > self.image_words as usize * WORD_SIZE {
            self.recovery_status = RecoveryStatus::Failure;
        }
        if self
            .reject_after_bytes
            .is_some_and(|limit| self.staged.len() >= limit)
        {
            self.recovery_status = RecoveryStatus::Failure;
            self.stalled = true;
        }
    }

    fn activate(&mut self) {
        let complete = self.image_words > 0 && self.written_words() == self.image_words;
        if self.recovery_status == RecoveryStatus::AwaitingImage && complete {
            self.recovery_status = RecoveryStatus::Booting;
            self.boot_remaining = self.boot_polls;
        } else if !self.recovery_status.is_failure() {
            self.recovery_status = RecoveryStatus::Failure;
        }
    }

    /// Only the recovery endpoint, once addressed, serves recovery commands.
    fn check_target(&self, target: u8, command: CommandId) -> Result<(), BusFault> {
        if self.failing == Some(command) {
            return Err(BusFault);
        }
        match self.recovery_dynamic {
            Some(addr) if addr == target => Ok(()),
            _ => Err(BusFault),
        }
    }
}

impl Transport for SimulatedTarget {
    fn assign_address(&mut self, static_address: u8, dynamic_address: u8) -> Result<(), BusFault> {
        self.events.push(BusEvent::AssignAddress {
            static_address,
            dynamic_address,
        });
        let slot = if static_address == self.targets.primary.static_address {
            &mut self.primary_dynamic
        } else if static_address == self.targets.recovery.static_address {
            &mut self.recovery_dynamic
        } else {
            return Err(BusFault);
        };
        // SETDASA only reaches devices without a dynamic address.
        if slot.is_some() {
            return Err(BusFault);
        }
        *slot = Some(dynamic_address);
        Ok(())
    }

    fn command_write(
        &mut self,
        target: u8,
        command: CommandId,
        payload: &[u8],
    ) -> Result<(), BusFault> {
        self.events.push(BusEvent::Write {
            target,
            command,
            payload: payload.to_vec(),
        });
        self.check_target(target, command)?;
        self.handle_write(command, payload)
    }

    fn command_read(
        &mut self,
        target: u8,
        command: CommandId,
        len: u16,
    ) -> Result<Vec<u8>, BusFault> {
        self.events.push(BusEvent::Read { target, command });
        self.check_target(target, command)?;
        let mut bytes = self.respond(command);
        bytes.truncate(len as usize);
        if let Some((truncated, limit)) = self.truncated {
            if truncated == command {
                bytes.truncate(limit);
            }
        }
        Ok(bytes)
    }
}

/// Virtual clock that moves only when slept on.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    sleeps: Cell<u32>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Number of times a poll loop slept.
    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration);
    }
}
