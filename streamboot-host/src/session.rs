// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Streaming-boot recovery session.
//!
//! A session drives one boot attempt end to end:
//! - assign dynamic addresses to the primary and recovery endpoints
//! - verify `PROT_CAP`
//! - reset the device into streaming-boot recovery and wait until it is ready
//! - announce the image size through `INDIRECT_FIFO_CTRL`
//! - stream the image through the indirect FIFO without overrunning it
//! - activate the image and wait for a terminal recovery status
//!
//! Every failure is fatal to the session. Retrying means building a new
//! session and starting again from `Idle`.

use std::time::Duration;

use crc::{Crc, CRC_32_ISO_HDLC};
use streamboot_common::address::{CCC_SETDASA, TARGET_ROLES};
use streamboot_common::{
    words_for, DeviceReset, FifoCtrl, FifoStatus, FlowDecision, ProtocolCapabilities,
    RecoveryCtrl, RecoveryReason, RecoveryStatus, Targets, UploadCursor,
};
use tracing::{debug, info, warn};

use crate::clock::{Clock, Deadline};
use crate::config::{SessionConfig, TimingConfig};
use crate::error::{RecoveryError, Result, Stage};
use crate::monitor::StatusMonitor;
use crate::transport::{RecoveryInterface, Transport};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Terminal result reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Success,
    Failure,
}

/// Where a session is in the recovery sequence.
///
/// After an error the state stays at the step that failed, except for a
/// device-reported boot failure which ends in `Completed(Failure)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AddressAssigned,
    CapabilitiesVerified,
    RecoveryRequested,
    AwaitingDeviceReady,
    FifoConfigured,
    Uploading,
    BootTriggered,
    Completed(Completion),
}

/// Summary of a successful boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    pub capabilities: ProtocolCapabilities,
    pub image_len: usize,
    pub image_words: u32,
    /// CRC-32 (ISO-HDLC) of the image as sent.
    pub crc32: u32,
    pub bytes_sent: usize,
    /// Number of `INDIRECT_FIFO_DATA` writes.
    pub chunks: u32,
    /// Backoff intervals spent waiting for FIFO space.
    pub fifo_backoffs: u32,
    pub max_transfer_bytes: u32,
    pub final_status: RecoveryStatus,
    pub elapsed: Duration,
}

/// Result of a complete recovery attempt.
pub type RecoveryOutcome = Result<RecoveryReport>;

/// Run one streaming boot with default polling intervals and the given
/// overall deadline, honored at full `Duration` precision.
pub fn run_recovery<T: Transport, C: Clock>(
    transport: T,
    clock: C,
    targets: &Targets,
    image: &[u8],
    deadline: Duration,
) -> RecoveryOutcome {
    let config = SessionConfig {
        targets: *targets,
        timing: TimingConfig::default(),
    };
    RecoverySession::new(transport, clock, config)?
        .with_timeout(deadline)
        .run(image)
}

/// One boot attempt against one target.
pub struct RecoverySession<T: Transport, C: Clock> {
    transport: T,
    clock: C,
    config: SessionConfig,
    timeout: Duration,
    state: SessionState,
}

impl<T: Transport, C: Clock> RecoverySession<T, C> {
    pub fn new(transport: T, clock: C, config: SessionConfig) -> Result<Self> {
        config
            .targets
            .validate()
            .map_err(RecoveryError::InvalidAddress)?;
        let timeout = config.timing.timeout();
        Ok(Self {
            transport,
            clock,
            config,
            timeout,
            state: SessionState::Idle,
        })
    }

    /// Override the configured overall deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Stream `image` to the target and boot it.
    ///
    /// A session runs once; calling `run` again after it left `Idle` fails
    /// with `SessionReused` without touching the bus.
    pub fn run(&mut self, image: &[u8]) -> RecoveryOutcome {
        if self.state != SessionState::Idle {
            return Err(RecoveryError::SessionReused);
        }
        if image.is_empty() {
            return Err(RecoveryError::InvalidImage("image is empty"));
        }
        let image_words =
            words_for(image.len()).ok_or(RecoveryError::InvalidImage("image too large"))?;

        let started = self.clock.now();
        let deadline = Deadline::after(&self.clock, self.timeout);
        let crc32 = CRC32.checksum(image);
        info!(
            len = image.len(),
            words = image_words,
            crc32 = format_args!("0x{:08x}", crc32),
            "starting streaming boot"
        );

        let mut run = Run {
            transport: &mut self.transport,
            state: &mut self.state,
            config: &self.config,
            monitor: StatusMonitor::new(&self.clock, deadline, self.config.timing.clone()),
        };
        let result = run.execute(image, image_words, crc32);

        match result {
            Ok(mut report) => {
                report.elapsed = self.clock.now().saturating_sub(started);
                info!(
                    chunks = report.chunks,
                    backoffs = report.fifo_backoffs,
                    elapsed_us = u64::try_from(report.elapsed.as_micros()).unwrap_or(u64::MAX),
                    "image booted"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(state = ?self.state, error = %err, "recovery aborted");
                Err(err)
            }
        }
    }
}

/// Borrowed session parts for the duration of `run`.
struct Run<'s, T: Transport, C: Clock> {
    transport: &'s mut T,
    state: &'s mut SessionState,
    config: &'s SessionConfig,
    monitor: StatusMonitor<'s, C>,
}

fn advance(state: &mut SessionState, next: SessionState) {
    info!(from = ?*state, to = ?next, "session state");
    *state = next;
}

impl<'s, T: Transport, C: Clock> Run<'s, T, C> {
    fn execute(&mut self, image: &[u8], image_words: u32, crc32: u32) -> RecoveryOutcome {
        self.assign_addresses()?;
        advance(self.state, SessionState::AddressAssigned);

        let recovery_addr = self.config.targets.recovery.dynamic_address;
        let mut iface = RecoveryInterface::new(&mut *self.transport, recovery_addr);

        let capabilities = iface.read::<ProtocolCapabilities>()?;
        capabilities
            .check()
            .map_err(RecoveryError::UnsupportedDevice)?;
        debug!(
            major = capabilities.major,
            minor = capabilities.minor,
            caps = capabilities.capabilities.bits(),
            "capabilities verified"
        );
        advance(self.state, SessionState::CapabilitiesVerified);

        iface.write(&DeviceReset::ENTER_STREAMING_BOOT)?;
        advance(self.state, SessionState::RecoveryRequested);

        advance(self.state, SessionState::AwaitingDeviceReady);
        let device = self.monitor.wait_device_ready(&mut iface)?;
        if device.reason != RecoveryReason::STREAMING_BOOT {
            return Err(RecoveryError::UnexpectedRecoveryReason {
                expected: RecoveryReason::STREAMING_BOOT.0,
                actual: device.reason.0,
            });
        }

        expect_awaiting_image(&mut iface)?;
        iface.write(&FifoCtrl {
            component: 0,
            reset: 0,
            image_size_words: image_words,
        })?;
        // The device rejects oversized images right after FIFO_CTRL.
        expect_awaiting_image(&mut iface)?;
        advance(self.state, SessionState::FifoConfigured);

        let fifo = iface.read::<FifoStatus>()?;
        if fifo.max_transfer_words == 0 {
            return Err(RecoveryError::InvalidTransferSize);
        }
        let mut cursor = UploadCursor::new(image.len(), fifo.max_transfer_bytes());
        advance(self.state, SessionState::Uploading);

        let mut chunks = 0u32;
        let mut fifo_backoffs = 0u32;
        while !cursor.is_done() {
            let space = self.monitor.wait_fifo_space(&mut iface)?;
            fifo_backoffs += space.backoffs;

            let len = match cursor.plan(&space.status) {
                FlowDecision::Send(len) => len,
                FlowDecision::Backoff => continue,
                FlowDecision::Done => break,
            };
            let span = cursor.span(len);
            debug!(offset = span.start, len, "fifo data");
            iface.write_data(&image[span])?;
            cursor.advance(len);
            chunks += 1;
        }

        // The device may give up on the image while the FIFO still has room.
        let status = iface.read::<RecoveryStatus>()?;
        if status.is_failure() {
            return Err(RecoveryError::DeviceRejectedImage {
                stage: Stage::Upload,
                status,
            });
        }

        iface.write(&RecoveryCtrl::BOOT_STAGED_IMAGE)?;
        advance(self.state, SessionState::BootTriggered);

        let final_status = self.monitor.wait_terminal(&mut iface)?;
        if final_status.is_failure() {
            advance(self.state, SessionState::Completed(Completion::Failure));
            return Err(RecoveryError::BootFailed {
                status: final_status,
            });
        }
        advance(self.state, SessionState::Completed(Completion::Success));

        Ok(RecoveryReport {
            capabilities,
            image_len: image.len(),
            image_words,
            crc32,
            bytes_sent: cursor.offset(),
            chunks,
            fifo_backoffs,
            max_transfer_bytes: cursor.max_transfer_bytes(),
            final_status,
            elapsed: Duration::ZERO,
        })
    }

    /// Directed dynamic address assignment for both endpoints.
    fn assign_addresses(&mut self) -> Result<()> {
        for role in TARGET_ROLES {
            let addr = self.config.targets.get(role);
            self.transport
                .assign_address(addr.static_address, addr.dynamic_address)
                .map_err(|_| RecoveryError::AddressAssignment {
                    role,
                    static_address: addr.static_address,
                })?;
            debug!(
                %role,
                ccc = CCC_SETDASA,
                static_addr = addr.static_address,
                setdasa = addr.setdasa_payload(),
                "address assigned"
            );
        }
        Ok(())
    }
}

/// Confirm the device is still waiting for an image.
fn expect_awaiting_image<T: Transport>(iface: &mut RecoveryInterface<T>) -> Result<()> {
    let status = iface.read::<RecoveryStatus>()?;
    match status {
        RecoveryStatus::AwaitingImage => Ok(()),
        status if status.is_failure() => Err(RecoveryError::DeviceRejectedImage {
            stage: Stage::FifoConfiguration,
            status,
        }),
        status => Err(RecoveryError::UnexpectedRecoveryStatus {
            stage: Stage::FifoConfiguration,
            status,
        }),
    }
}
