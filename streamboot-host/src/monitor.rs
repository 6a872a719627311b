// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Bounded status polling.
//!
//! Every wait in a session goes through [`StatusMonitor::poll_until`]: read,
//! test, sleep a fixed interval, repeat until the predicate holds or the
//! session deadline passes. The clock is injected, so tests drive these loops
//! in virtual time.

use std::time::Duration;

use streamboot_common::{available_space, DeviceStatus, FifoStatus, RecoveryStatus};
use tracing::{debug, warn};

use crate::clock::{Clock, Deadline};
use crate::config::TimingConfig;
use crate::error::{RecoveryError, Result, Stage};
use crate::transport::{RecoveryInterface, Transport};

/// FIFO status that has room for at least one byte.
#[derive(Debug, Clone, Copy)]
pub struct FifoSpace {
    pub status: FifoStatus,
    /// Backoff intervals spent before space appeared.
    pub backoffs: u32,
}

/// Polls device registers against a shared session deadline.
pub struct StatusMonitor<'c, C: Clock> {
    clock: &'c C,
    deadline: Deadline,
    timing: TimingConfig,
}

impl<'c, C: Clock> StatusMonitor<'c, C> {
    pub fn new(clock: &'c C, deadline: Deadline, timing: TimingConfig) -> Self {
        Self {
            clock,
            deadline,
            timing,
        }
    }

    /// Repeat `read` every `interval` until `done` accepts a value.
    ///
    /// Errors from `read` end the wait immediately. A value read after the
    /// deadline is still checked before giving up with `Timeout`.
    pub fn poll_until<T, R, P>(
        &self,
        stage: Stage,
        interval: Duration,
        mut read: R,
        mut done: P,
    ) -> Result<T>
    where
        R: FnMut() -> Result<T>,
        P: FnMut(&T) -> bool,
    {
        loop {
            let value = read()?;
            if done(&value) {
                return Ok(value);
            }
            if self.deadline.is_expired(self.clock) {
                warn!(%stage, "deadline expired");
                return Err(RecoveryError::Timeout { stage });
            }
            self.clock.sleep(interval);
        }
    }

    /// Wait for the device to report it is ready to accept an image.
    pub fn wait_device_ready<T: Transport>(
        &self,
        iface: &mut RecoveryInterface<T>,
    ) -> Result<DeviceStatus> {
        self.poll_until(
            Stage::DeviceReady,
            self.timing.device_poll_interval(),
            || iface.read::<DeviceStatus>(),
            |status| {
                debug!(status = ?status.status, "device status");
                status.is_ready()
            },
        )
    }

    /// Wait until the indirect FIFO has free space.
    ///
    /// While the FIFO is full the recovery status is checked as well, so an
    /// image the device stopped draining because it gave up is reported as
    /// rejected instead of running into the deadline.
    pub fn wait_fifo_space<T: Transport>(
        &self,
        iface: &mut RecoveryInterface<T>,
    ) -> Result<FifoSpace> {
        let mut polls = 0u32;
        let status = self.poll_until(
            Stage::Upload,
            self.timing.fifo_backoff(),
            || {
                polls += 1;
                let status = iface.read::<FifoStatus>()?;
                if available_space(&status) == 0 {
                    let recovery = iface.read::<RecoveryStatus>()?;
                    if recovery.is_failure() {
                        return Err(RecoveryError::DeviceRejectedImage {
                            stage: Stage::Upload,
                            status: recovery,
                        });
                    }
                }
                Ok(status)
            },
            |status| available_space(status) > 0,
        )?;
        Ok(FifoSpace {
            status,
            backoffs: polls - 1,
        })
    }

    /// Wait for the recovery status to reach `SUCCESS` or a failure code.
    pub fn wait_terminal<T: Transport>(
        &self,
        iface: &mut RecoveryInterface<T>,
    ) -> Result<RecoveryStatus> {
        self.poll_until(
            Stage::BootCompletion,
            self.timing.completion_poll_interval(),
            || iface.read::<RecoveryStatus>(),
            |status| {
                debug!(?status, "recovery status");
                status.is_terminal()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ManualClock;

    fn monitor(clock: &ManualClock, budget: Duration) -> StatusMonitor<'_, ManualClock> {
        StatusMonitor::new(clock, Deadline::after(clock, budget), TimingConfig::default())
    }

    #[test]
    fn test_poll_until_returns_first_match() {
        let clock = ManualClock::new();
        let monitor = monitor(&clock, Duration::from_millis(1));
        let mut reads = 0;

        let value = monitor
            .poll_until(
                Stage::DeviceReady,
                Duration::from_micros(10),
                || {
                    reads += 1;
                    Ok(reads)
                },
                |&v| v == 3,
            )
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(clock.sleeps(), 2);
        assert_eq!(clock.now(), Duration::from_micros(20));
    }

    #[test]
    fn test_poll_until_times_out() {
        let clock = ManualClock::new();
        let monitor = monitor(&clock, Duration::from_micros(100));

        let err = monitor
            .poll_until(Stage::Upload, Duration::from_micros(30), || Ok(()), |_| false)
            .unwrap_err();

        assert_eq!(err, RecoveryError::Timeout { stage: Stage::Upload });
        assert_eq!(clock.sleeps(), 4);
    }

    #[test]
    fn test_poll_until_checks_value_read_at_deadline() {
        let clock = ManualClock::new();
        let monitor = monitor(&clock, Duration::from_micros(10));
        clock.advance(Duration::from_micros(50));

        let value = monitor.poll_until(
            Stage::BootCompletion,
            Duration::from_micros(10),
            || Ok(7),
            |_| true,
        );
        assert_eq!(value, Ok(7));
    }

    #[test]
    fn test_poll_until_stops_on_read_error() {
        let clock = ManualClock::new();
        let monitor = monitor(&clock, Duration::from_millis(1));

        let err = monitor
            .poll_until(
                Stage::DeviceReady,
                Duration::from_micros(10),
                || -> Result<()> { Err(RecoveryError::InvalidTransferSize) },
                |_| true,
            )
            .unwrap_err();

        assert_eq!(err, RecoveryError::InvalidTransferSize);
        assert_eq!(clock.sleeps(), 0);
    }
}
