// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Recovery command set and its fixed binary layouts.
//!
//! Every multi-byte field on the wire is little-endian. Sizes in the FIFO
//! commands are expressed in 4-byte words. The layouts follow the OCP
//! secure-firmware recovery interface, version 1.1.

use core::fmt;

use serde::{Deserialize, Serialize};

// --- Protocol constants ---

/// Magic tag at the start of every `PROT_CAP` response.
pub const PROT_CAP_MAGIC: [u8; 8] = *b"OCP RECV";

pub const PROTOCOL_MAJOR: u8 = 1;
pub const PROTOCOL_MINOR: u8 = 1;

/// Unit of every size expressed in "words" by the FIFO commands.
pub const WORD_SIZE: usize = 4;

/// Largest fixed layout in the command set (`INDIRECT_FIFO_STATUS`).
pub const MAX_MESSAGE_LEN: usize = 20;

/// Encoded fixed-layout message.
pub type Frame = heapless::Vec<u8, MAX_MESSAGE_LEN>;

// DEVICE_RESET fields
pub const RESET_CTRL_MGMT: u8 = 0x02;
pub const FORCED_RECOVERY_STREAMING_BOOT: u8 = 0x0E;

// RECOVERY_CTRL fields
pub const IMAGE_SELECTION_FROM_CMS: u8 = 0x01;
pub const ACTIVATE_RECOVERY_IMAGE: u8 = 0x0F;

// INDIRECT_FIFO_STATUS flags
pub const FIFO_STATUS_EMPTY: u32 = 1 << 0;
pub const FIFO_STATUS_FULL: u32 = 1 << 1;

// --- Command identifiers ---

/// One-byte recovery command identifier.
#[repr(u8)]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    ProtCap = 34,
    DeviceStatus = 36,
    DeviceReset = 37,
    RecoveryCtrl = 38,
    RecoveryStatus = 39,
    IndirectFifoCtrl = 45,
    IndirectFifoStatus = 46,
    IndirectFifoData = 47,
}

impl CommandId {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            CommandId::ProtCap => "PROT_CAP",
            CommandId::DeviceStatus => "DEVICE_STATUS",
            CommandId::DeviceReset => "DEVICE_RESET",
            CommandId::RecoveryCtrl => "RECOVERY_CTRL",
            CommandId::RecoveryStatus => "RECOVERY_STATUS",
            CommandId::IndirectFifoCtrl => "INDIRECT_FIFO_CTRL",
            CommandId::IndirectFifoStatus => "INDIRECT_FIFO_STATUS",
            CommandId::IndirectFifoData => "INDIRECT_FIFO_DATA",
        }
    }
}

impl TryFrom<u8> for CommandId {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            34 => Ok(CommandId::ProtCap),
            36 => Ok(CommandId::DeviceStatus),
            37 => Ok(CommandId::DeviceReset),
            38 => Ok(CommandId::RecoveryCtrl),
            39 => Ok(CommandId::RecoveryStatus),
            45 => Ok(CommandId::IndirectFifoCtrl),
            46 => Ok(CommandId::IndirectFifoStatus),
            47 => Ok(CommandId::IndirectFifoData),
            other => Err(CodecError::UnknownCommand(other)),
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// --- Codec errors ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Response shorter than the command's fixed layout.
    Malformed {
        command: CommandId,
        expected: usize,
        actual: usize,
    },
    /// Byte does not name a command of this protocol.
    UnknownCommand(u8),
    /// Status byte outside the enumeration for this command.
    UnknownStatus { command: CommandId, value: u8 },
    /// Command carries raw data and has no fixed layout.
    NoLayout(CommandId),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Malformed {
                command,
                expected,
                actual,
            } => write!(
                f,
                "malformed {} response: expected {} bytes, got {}",
                command, expected, actual
            ),
            CodecError::UnknownCommand(id) => write!(f, "unknown command id {}", id),
            CodecError::UnknownStatus { command, value } => {
                write!(f, "unknown {} value 0x{:02x}", command, value)
            }
            CodecError::NoLayout(command) => write!(f, "{} has no fixed layout", command),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

// --- Fixed-layout messages ---

/// A command payload with a fixed binary layout.
pub trait Message: Sized {
    const COMMAND: CommandId;
    /// Length of the fixed layout in bytes.
    const LEN: usize;

    /// Serialize into `buf`, which is exactly `LEN` bytes long.
    fn write_to(&self, buf: &mut [u8]);

    /// Parse from `buf`, which is exactly `LEN` bytes long.
    fn read_from(buf: &[u8]) -> Result<Self, CodecError>;

    fn encode(&self) -> Frame {
        let mut buf = [0u8; MAX_MESSAGE_LEN];
        self.write_to(&mut buf[..Self::LEN]);
        Frame::from_slice(&buf[..Self::LEN]).unwrap_or_default()
    }

    /// Decode a response. Trailing bytes past the fixed layout are ignored;
    /// short input is never zero-filled.
    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < Self::LEN {
            return Err(CodecError::Malformed {
                command: Self::COMMAND,
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        Self::read_from(&bytes[..Self::LEN])
    }
}

fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Capability bit-set advertised in `PROT_CAP`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(pub u16);

impl Capabilities {
    pub const DEVICE_ID: Self = Self(1 << 0);
    pub const FORCED_RECOVERY: Self = Self(1 << 1);
    pub const MGMT_RESET: Self = Self(1 << 2);
    pub const DEVICE_STATUS: Self = Self(1 << 4);
    pub const MEMORY_ACCESS: Self = Self(1 << 5);
    pub const PUSH_IMAGE: Self = Self(1 << 7);
    pub const FLASHLESS_BOOT: Self = Self(1 << 11);

    /// Everything a streaming boot needs from the target.
    pub const STREAMING_BOOT: Self = Self(
        Self::DEVICE_ID.0
            | Self::FORCED_RECOVERY.0
            | Self::MGMT_RESET.0
            | Self::DEVICE_STATUS.0
            | Self::MEMORY_ACCESS.0
            | Self::PUSH_IMAGE.0
            | Self::FLASHLESS_BOOT.0,
    );

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bits of `required` that are not set in `self`.
    pub const fn missing(self, required: Self) -> Self {
        Self(required.0 & !self.0)
    }
}

/// Why a target cannot be driven through a streaming boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incompatibility {
    BadMagic([u8; 8]),
    VersionMismatch { major: u8, minor: u8 },
    MissingCapabilities(Capabilities),
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Incompatibility::BadMagic(magic) => write!(f, "bad magic {:02x?}", magic),
            Incompatibility::VersionMismatch { major, minor } => write!(
                f,
                "protocol version {}.{} (expected major {})",
                major, minor, PROTOCOL_MAJOR
            ),
            Incompatibility::MissingCapabilities(caps) => {
                write!(f, "missing capabilities 0x{:04x}", caps.bits())
            }
        }
    }
}

/// `PROT_CAP` response.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolCapabilities {
    pub magic: [u8; 8],
    pub major: u8,
    pub minor: u8,
    pub capabilities: Capabilities,
    pub cms_count: u8,
    pub max_response_time: u8,
    pub heartbeat_period: u8,
}

impl ProtocolCapabilities {
    /// Check the tag, the major version and the streaming-boot capability bits.
    pub fn check(&self) -> Result<(), Incompatibility> {
        if self.magic != PROT_CAP_MAGIC {
            return Err(Incompatibility::BadMagic(self.magic));
        }
        if self.major != PROTOCOL_MAJOR {
            return Err(Incompatibility::VersionMismatch {
                major: self.major,
                minor: self.minor,
            });
        }
        let missing = self.capabilities.missing(Capabilities::STREAMING_BOOT);
        if missing.bits() != 0 {
            return Err(Incompatibility::MissingCapabilities(missing));
        }
        Ok(())
    }
}

impl Message for ProtocolCapabilities {
    const COMMAND: CommandId = CommandId::ProtCap;
    const LEN: usize = 15;

    fn write_to(&self, buf: &mut [u8]) {
        buf[..8].copy_from_slice(&self.magic);
        buf[8] = self.major;
        buf[9] = self.minor;
        buf[10..12].copy_from_slice(&self.capabilities.bits().to_le_bytes());
        buf[12] = self.cms_count;
        buf[13] = self.max_response_time;
        buf[14] = self.heartbeat_period;
    }

    fn read_from(buf: &[u8]) -> Result<Self, CodecError> {
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&buf[..8]);
        Ok(Self {
            magic,
            major: buf[8],
            minor: buf[9],
            capabilities: Capabilities(le_u16(buf, 10)),
            cms_count: buf[12],
            max_response_time: buf[13],
            heartbeat_period: buf[14],
        })
    }
}

/// Device status code reported in `DEVICE_STATUS`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatusCode {
    Pending,
    Healthy,
    Error,
    /// Recovery mode, ready to accept a recovery image.
    ReadyToAccept,
    RecoveryPending,
    RunningRecoveryImage,
    BootFailure,
    FatalError,
    Other(u8),
}

impl DeviceStatusCode {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x00 => DeviceStatusCode::Pending,
            0x01 => DeviceStatusCode::Healthy,
            0x02 => DeviceStatusCode::Error,
            0x03 => DeviceStatusCode::ReadyToAccept,
            0x04 => DeviceStatusCode::RecoveryPending,
            0x05 => DeviceStatusCode::RunningRecoveryImage,
            0x0E => DeviceStatusCode::BootFailure,
            0x0F => DeviceStatusCode::FatalError,
            other => DeviceStatusCode::Other(other),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            DeviceStatusCode::Pending => 0x00,
            DeviceStatusCode::Healthy => 0x01,
            DeviceStatusCode::Error => 0x02,
            DeviceStatusCode::ReadyToAccept => 0x03,
            DeviceStatusCode::RecoveryPending => 0x04,
            DeviceStatusCode::RunningRecoveryImage => 0x05,
            DeviceStatusCode::BootFailure => 0x0E,
            DeviceStatusCode::FatalError => 0x0F,
            DeviceStatusCode::Other(other) => other,
        }
    }
}

/// Cause the device reports for being in recovery mode.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReason(pub u16);

impl RecoveryReason {
    pub const STREAMING_BOOT: Self = Self(0x12);
}

/// `DEVICE_STATUS` response.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    pub status: DeviceStatusCode,
    pub protocol_error: u8,
    /// Only meaningful once `status` is `ReadyToAccept`.
    pub reason: RecoveryReason,
    pub heartbeat: u16,
    pub vendor_status_len: u8,
}

impl DeviceStatus {
    pub fn is_ready(&self) -> bool {
        self.status == DeviceStatusCode::ReadyToAccept
    }
}

impl Message for DeviceStatus {
    const COMMAND: CommandId = CommandId::DeviceStatus;
    const LEN: usize = 7;

    fn write_to(&self, buf: &mut [u8]) {
        buf[0] = self.status.as_u8();
        buf[1] = self.protocol_error;
        buf[2..4].copy_from_slice(&self.reason.0.to_le_bytes());
        buf[4..6].copy_from_slice(&self.heartbeat.to_le_bytes());
        buf[6] = self.vendor_status_len;
    }

    fn read_from(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            status: DeviceStatusCode::from_u8(buf[0]),
            protocol_error: buf[1],
            reason: RecoveryReason(le_u16(buf, 2)),
            heartbeat: le_u16(buf, 4),
            vendor_status_len: buf[6],
        })
    }
}

/// `DEVICE_RESET` request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceReset {
    pub reset_ctrl: u8,
    pub forced_recovery: u8,
    pub interface_ctrl: u8,
}

impl DeviceReset {
    /// Reset the management interface and force streaming boot.
    pub const ENTER_STREAMING_BOOT: Self = Self {
        reset_ctrl: RESET_CTRL_MGMT,
        forced_recovery: FORCED_RECOVERY_STREAMING_BOOT,
        interface_ctrl: 0x00,
    };
}

impl Message for DeviceReset {
    const COMMAND: CommandId = CommandId::DeviceReset;
    const LEN: usize = 3;

    fn write_to(&self, buf: &mut [u8]) {
        buf[0] = self.reset_ctrl;
        buf[1] = self.forced_recovery;
        buf[2] = self.interface_ctrl;
    }

    fn read_from(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            reset_ctrl: buf[0],
            forced_recovery: buf[1],
            interface_ctrl: buf[2],
        })
    }
}

/// `RECOVERY_CTRL` request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryCtrl {
    pub component: u8,
    pub image_selection: u8,
    pub activate: u8,
}

impl RecoveryCtrl {
    /// Activate the image staged through the indirect FIFO.
    pub const BOOT_STAGED_IMAGE: Self = Self {
        component: 0x00,
        image_selection: IMAGE_SELECTION_FROM_CMS,
        activate: ACTIVATE_RECOVERY_IMAGE,
    };
}

impl Message for RecoveryCtrl {
    const COMMAND: CommandId = CommandId::RecoveryCtrl;
    const LEN: usize = 3;

    fn write_to(&self, buf: &mut [u8]) {
        buf[0] = self.component;
        buf[1] = self.image_selection;
        buf[2] = self.activate;
    }

    fn read_from(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            component: buf[0],
            image_selection: buf[1],
            activate: buf[2],
        })
    }
}

/// `RECOVERY_STATUS` response.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStatus {
    NotInRecovery,
    AwaitingImage,
    Booting,
    Success,
    Failure,
    AuthenticationError,
    EnterRecoveryError,
    InvalidComponent,
}

impl RecoveryStatus {
    pub const fn as_u8(self) -> u8 {
        match self {
            RecoveryStatus::NotInRecovery => 0x00,
            RecoveryStatus::AwaitingImage => 0x01,
            RecoveryStatus::Booting => 0x02,
            RecoveryStatus::Success => 0x03,
            RecoveryStatus::Failure => 0x0C,
            RecoveryStatus::AuthenticationError => 0x0D,
            RecoveryStatus::EnterRecoveryError => 0x0E,
            RecoveryStatus::InvalidComponent => 0x0F,
        }
    }

    /// Any status reporting that the recovery did not go through.
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            RecoveryStatus::Failure
                | RecoveryStatus::AuthenticationError
                | RecoveryStatus::EnterRecoveryError
                | RecoveryStatus::InvalidComponent
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, RecoveryStatus::Success) || self.is_failure()
    }
}

impl TryFrom<u8> for RecoveryStatus {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(RecoveryStatus::NotInRecovery),
            0x01 => Ok(RecoveryStatus::AwaitingImage),
            0x02 => Ok(RecoveryStatus::Booting),
            0x03 => Ok(RecoveryStatus::Success),
            0x0C => Ok(RecoveryStatus::Failure),
            0x0D => Ok(RecoveryStatus::AuthenticationError),
            0x0E => Ok(RecoveryStatus::EnterRecoveryError),
            0x0F => Ok(RecoveryStatus::InvalidComponent),
            value => Err(CodecError::UnknownStatus {
                command: CommandId::RecoveryStatus,
                value,
            }),
        }
    }
}

impl Message for RecoveryStatus {
    const COMMAND: CommandId = CommandId::RecoveryStatus;
    const LEN: usize = 1;

    fn write_to(&self, buf: &mut [u8]) {
        buf[0] = self.as_u8();
    }

    fn read_from(buf: &[u8]) -> Result<Self, CodecError> {
        Self::try_from(buf[0])
    }
}

/// Number of 4-byte words needed to hold `len` bytes, rounded up.
///
/// Returns `None` if the count does not fit the 32-bit wire field.
pub fn words_for(len: usize) -> Option<u32> {
    u32::try_from(len.div_ceil(WORD_SIZE)).ok()
}

/// `INDIRECT_FIFO_CTRL` request.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoCtrl {
    pub component: u8,
    pub reset: u8,
    pub image_size_words: u32,
}

impl FifoCtrl {
    /// Announce an image of `image_len` bytes.
    pub fn for_image_len(image_len: usize) -> Option<Self> {
        Some(Self {
            component: 0,
            reset: 0,
            image_size_words: words_for(image_len)?,
        })
    }
}

impl Message for FifoCtrl {
    const COMMAND: CommandId = CommandId::IndirectFifoCtrl;
    const LEN: usize = 6;

    fn write_to(&self, buf: &mut [u8]) {
        buf[0] = self.component;
        buf[1] = self.reset;
        buf[2..6].copy_from_slice(&self.image_size_words.to_le_bytes());
    }

    fn read_from(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            component: buf[0],
            reset: buf[1],
            image_size_words: le_u32(buf, 2),
        })
    }
}

/// `INDIRECT_FIFO_STATUS` response.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FifoStatus {
    pub flags: u32,
    pub write_ptr: u32,
    pub read_ptr: u32,
    pub fifo_size_words: u32,
    pub max_transfer_words: u32,
}

impl FifoStatus {
    pub fn is_empty(&self) -> bool {
        self.flags & FIFO_STATUS_EMPTY != 0
    }

    pub fn is_full(&self) -> bool {
        self.flags & FIFO_STATUS_FULL != 0
    }

    pub fn capacity_bytes(&self) -> u32 {
        self.fifo_size_words.saturating_mul(WORD_SIZE as u32)
    }

    pub fn max_transfer_bytes(&self) -> u32 {
        self.max_transfer_words.saturating_mul(WORD_SIZE as u32)
    }
}

impl Message for FifoStatus {
    const COMMAND: CommandId = CommandId::IndirectFifoStatus;
    const LEN: usize = 20;

    fn write_to(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.flags.to_le_bytes());
        buf[4..8].copy_from_slice(&self.write_ptr.to_le_bytes());
        buf[8..12].copy_from_slice(&self.read_ptr.to_le_bytes());
        buf[12..16].copy_from_slice(&self.fifo_size_words.to_le_bytes());
        buf[16..20].copy_from_slice(&self.max_transfer_words.to_le_bytes());
    }

    fn read_from(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            flags: le_u32(buf, 0),
            write_ptr: le_u32(buf, 4),
            read_ptr: le_u32(buf, 8),
            fifo_size_words: le_u32(buf, 12),
            max_transfer_words: le_u32(buf, 16),
        })
    }
}

// --- Dynamic dispatch over the command set ---

/// Any fixed-layout payload, tagged by its command.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    ProtCap(ProtocolCapabilities),
    DeviceStatus(DeviceStatus),
    DeviceReset(DeviceReset),
    RecoveryCtrl(RecoveryCtrl),
    RecoveryStatus(RecoveryStatus),
    FifoCtrl(FifoCtrl),
    FifoStatus(FifoStatus),
}

impl Payload {
    pub fn command(&self) -> CommandId {
        match self {
            Payload::ProtCap(_) => ProtocolCapabilities::COMMAND,
            Payload::DeviceStatus(_) => DeviceStatus::COMMAND,
            Payload::DeviceReset(_) => DeviceReset::COMMAND,
            Payload::RecoveryCtrl(_) => RecoveryCtrl::COMMAND,
            Payload::RecoveryStatus(_) => RecoveryStatus::COMMAND,
            Payload::FifoCtrl(_) => FifoCtrl::COMMAND,
            Payload::FifoStatus(_) => FifoStatus::COMMAND,
        }
    }
}

/// Encode a payload into its wire layout.
pub fn encode(payload: &Payload) -> Frame {
    match payload {
        Payload::ProtCap(m) => m.encode(),
        Payload::DeviceStatus(m) => m.encode(),
        Payload::DeviceReset(m) => m.encode(),
        Payload::RecoveryCtrl(m) => m.encode(),
        Payload::RecoveryStatus(m) => m.encode(),
        Payload::FifoCtrl(m) => m.encode(),
        Payload::FifoStatus(m) => m.encode(),
    }
}

/// Decode the bytes exchanged for `command` into a typed payload.
pub fn decode(command: CommandId, bytes: &[u8]) -> Result<Payload, CodecError> {
    Ok(match command {
        CommandId::ProtCap => Payload::ProtCap(ProtocolCapabilities::decode(bytes)?),
        CommandId::DeviceStatus => Payload::DeviceStatus(DeviceStatus::decode(bytes)?),
        CommandId::DeviceReset => Payload::DeviceReset(DeviceReset::decode(bytes)?),
        CommandId::RecoveryCtrl => Payload::RecoveryCtrl(RecoveryCtrl::decode(bytes)?),
        CommandId::RecoveryStatus => Payload::RecoveryStatus(RecoveryStatus::decode(bytes)?),
        CommandId::IndirectFifoCtrl => Payload::FifoCtrl(FifoCtrl::decode(bytes)?),
        CommandId::IndirectFifoStatus => Payload::FifoStatus(FifoStatus::decode(bytes)?),
        CommandId::IndirectFifoData => return Err(CodecError::NoLayout(command)),
    })
}

/// Length of the fixed layout for `command`, if it has one.
pub fn layout_len(command: CommandId) -> Option<usize> {
    match command {
        CommandId::ProtCap => Some(ProtocolCapabilities::LEN),
        CommandId::DeviceStatus => Some(DeviceStatus::LEN),
        CommandId::DeviceReset => Some(DeviceReset::LEN),
        CommandId::RecoveryCtrl => Some(RecoveryCtrl::LEN),
        CommandId::RecoveryStatus => Some(RecoveryStatus::LEN),
        CommandId::IndirectFifoCtrl => Some(FifoCtrl::LEN),
        CommandId::IndirectFifoStatus => Some(FifoStatus::LEN),
        CommandId::IndirectFifoData => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_boot_opcodes() {
        assert_eq!(&DeviceReset::ENTER_STREAMING_BOOT.encode()[..], &[0x02, 0x0E, 0x00]);
        assert_eq!(&RecoveryCtrl::BOOT_STAGED_IMAGE.encode()[..], &[0x00, 0x01, 0x0F]);
    }

    #[test]
    fn test_fifo_ctrl_rounds_up_to_words() {
        assert_eq!(FifoCtrl::for_image_len(0).unwrap().image_size_words, 0);
        assert_eq!(FifoCtrl::for_image_len(1).unwrap().image_size_words, 1);
        assert_eq!(FifoCtrl::for_image_len(4).unwrap().image_size_words, 1);
        assert_eq!(FifoCtrl::for_image_len(5).unwrap().image_size_words, 2);
        assert_eq!(FifoCtrl::for_image_len(11).unwrap().image_size_words, 3);
    }

    #[test]
    fn test_fifo_ctrl_layout_is_little_endian() {
        let ctrl = FifoCtrl {
            component: 0,
            reset: 0,
            image_size_words: 0x0403_0201,
        };
        assert_eq!(&ctrl.encode()[..], &[0, 0, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_short_response_is_malformed() {
        let err = FifoStatus::decode(&[0u8; 19]).unwrap_err();
        assert_eq!(
            err,
            CodecError::Malformed {
                command: CommandId::IndirectFifoStatus,
                expected: 20,
                actual: 19,
            }
        );
    }

    #[test]
    fn test_recovery_status_ignores_trailing_vendor_byte() {
        assert_eq!(
            RecoveryStatus::decode(&[0x03, 0xAA]).unwrap(),
            RecoveryStatus::Success
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RecoveryStatus::Success.is_terminal());
        assert!(RecoveryStatus::Failure.is_terminal());
        assert!(!RecoveryStatus::AwaitingImage.is_terminal());
        assert!(!RecoveryStatus::Booting.is_terminal());
        assert!(!RecoveryStatus::Success.is_failure());
    }
}
