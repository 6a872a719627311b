// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Bus addressing for the two logical endpoints of a recovery target.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Directed CCC that assigns a dynamic address to a static address.
pub const CCC_SETDASA: u8 = 0x87;

/// Broadcast address, never assignable to a single target.
pub const BROADCAST_ADDR: u8 = 0x7E;

/// Default primary endpoint addresses.
pub const PRIMARY_STATIC_ADDR: u8 = 0x5A;
pub const PRIMARY_DYNAMIC_ADDR: u8 = 0x52;

/// Default recovery (virtual) endpoint addresses.
pub const RECOVERY_STATIC_ADDR: u8 = 0x6A;
pub const RECOVERY_DYNAMIC_ADDR: u8 = 0x62;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    /// Value does not fit in 7 bits or is reserved.
    Invalid(u8),
    /// Two endpoints would share a dynamic address.
    Conflict(u8),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::Invalid(addr) => write!(f, "invalid bus address 0x{:02x}", addr),
            AddressError::Conflict(addr) => {
                write!(f, "dynamic address 0x{:02x} assigned twice", addr)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AddressError {}

fn check_addr(addr: u8) -> Result<u8, AddressError> {
    if addr == 0 || addr > 0x7F || addr == BROADCAST_ADDR {
        return Err(AddressError::Invalid(addr));
    }
    Ok(addr)
}

/// Static address of an endpoint and the dynamic address to give it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusAddress {
    pub static_address: u8,
    pub dynamic_address: u8,
}

impl BusAddress {
    pub fn new(static_address: u8, dynamic_address: u8) -> Result<Self, AddressError> {
        let addr = Self {
            static_address,
            dynamic_address,
        };
        addr.validate()?;
        Ok(addr)
    }

    pub fn validate(&self) -> Result<(), AddressError> {
        check_addr(self.static_address)?;
        check_addr(self.dynamic_address)?;
        Ok(())
    }

    /// Data byte carried by SETDASA: the dynamic address in bits 7:1.
    pub fn setdasa_payload(&self) -> u8 {
        self.dynamic_address << 1
    }
}

/// The two logical endpoints a recovery target exposes on the bus.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRole {
    /// Main function of the device.
    Primary,
    /// Virtual endpoint serving the recovery command set.
    Recovery,
}

/// All roles, in address assignment order.
pub const TARGET_ROLES: [TargetRole; 2] = [TargetRole::Primary, TargetRole::Recovery];

impl fmt::Display for TargetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRole::Primary => f.write_str("primary"),
            TargetRole::Recovery => f.write_str("recovery"),
        }
    }
}

/// Address pair for each role.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Targets {
    pub primary: BusAddress,
    pub recovery: BusAddress,
}

impl Targets {
    pub fn get(&self, role: TargetRole) -> BusAddress {
        match role {
            TargetRole::Primary => self.primary,
            TargetRole::Recovery => self.recovery,
        }
    }

    pub fn validate(&self) -> Result<(), AddressError> {
        self.primary.validate()?;
        self.recovery.validate()?;
        if self.primary.dynamic_address == self.recovery.dynamic_address {
            return Err(AddressError::Conflict(self.primary.dynamic_address));
        }
        Ok(())
    }
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            primary: BusAddress {
                static_address: PRIMARY_STATIC_ADDR,
                dynamic_address: PRIMARY_DYNAMIC_ADDR,
            },
            recovery: BusAddress {
                static_address: RECOVERY_STATIC_ADDR,
                dynamic_address: RECOVERY_DYNAMIC_ADDR,
            },
        }
    }
}
