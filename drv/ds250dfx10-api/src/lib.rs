// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! API types for the DS250DFx10 retimer driver.
//!
//! This is factored out of `drv/ds250dfx10` so that the PHY framework and the
//! bus transport can name errors, channels and modes without pulling in the
//! driver itself.

#![cfg_attr(not(test), no_std)]

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Number of channel slots on the largest part in the family.
pub const MAX_CHANNELS: usize = 8;

#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum RetimerError {
    /// A register read or write failed on the bus
    IoFailure = 1,
    /// The channel configuration id names a topology we don't know
    UnknownTopology,
    /// The requested mode/submode pair has no recipe
    UnsupportedMode,
    /// No endpoint exists for the requested channel
    InvalidChannel,
    /// Binding arguments did not carry exactly one channel cell
    InvalidBinding,
    /// Creating an endpoint failed
    AllocationFailure,
}

/// Transport fault, as reported by whatever implements the bus.  These mirror
/// the I2C server's response codes; the driver does not act on the
/// distinction, but it is kept for the trace buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum BusError {
    /// The device address was NACKed
    NoDevice = 1,
    /// A byte written to the device was NACKed
    NoRegister,
    /// The bus locked up and was reset
    BusLocked,
    /// The bus was spontaneously reset during the operation
    BusReset,
    /// The controller appeared to be busy and was reset
    ControllerBusy,
}

impl From<BusError> for RetimerError {
    fn from(_: BusError) -> Self {
        Self::IoFailure
    }
}

/// A single SerDes lane on the retimer.
///
/// A `Channel` is always within the 8-slot register layout; whether it is
/// populated on a particular part is a question for topology discovery.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Channel(u8);

impl Channel {
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < MAX_CHANNELS {
            Some(Self(index))
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// One-hot value for the channel select register.
    #[inline(always)]
    pub const fn select_mask(self) -> u8 {
        1 << self.0
    }

    /// Iterates over the first `count` channels, clamped to the slot count.
    pub fn first(count: u8) -> impl Iterator<Item = Channel> {
        (0..count.min(MAX_CHANNELS as u8)).map(Channel)
    }
}

/// Decodes binding arguments into a channel.  Exactly one cell is expected,
/// holding the channel index.
pub fn channel_from_args(args: &[u32]) -> Result<Channel, RetimerError> {
    match args {
        [index] => u8::try_from(*index)
            .ok()
            .and_then(Channel::new)
            .ok_or(RetimerError::InvalidChannel),
        _ => Err(RetimerError::InvalidBinding),
    }
}

/// PHY operating mode requested by the framework, numbered as the framework
/// numbers them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum PhyMode {
    Invalid = 0,
    UsbHost,
    UsbHostLs,
    UsbHostFs,
    UsbHostHs,
    UsbHostSs,
    UsbDevice,
    UsbDeviceLs,
    UsbDeviceFs,
    UsbDeviceHs,
    UsbDeviceSs,
    UsbOtg,
    UfsHsA,
    UfsHsB,
    Pcie,
    Ethernet = 15,
    MipiDphy,
    Sata,
    Lvds,
    Dp,
}

/// Ethernet interface submode, numbered as the PHY framework numbers them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum InterfaceMode {
    Na = 0,
    Internal,
    Mii,
    Gmii,
    Sgmii,
    Tbi,
    RevMii,
    Rmii,
    RevRmii,
    Rgmii,
    RgmiiId,
    RgmiiRxid,
    RgmiiTxid,
    Rtbi,
    Smii,
    Xgmii,
    Xlgmii,
    Moca,
    Psgmii,
    Qsgmii,
    Trgmii,
    OneHundredBaseX,
    OneThousandBaseX,
    TwoThousandFiveHundredBaseX,
    FiveGBaseR,
    Rxaui,
    Xaui,
    TenGBaseR,
    TwentyFiveGBaseR,
    Usxgmii,
}

impl PhyMode {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::from_u32(raw)
    }
}

impl InterfaceMode {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::from_u32(raw)
    }
}

/// The two line rates the retimer recipes can program.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineRate {
    /// 10.3125 Gbps
    TenG,
    /// 25.78125 Gbps
    TwentyFiveG,
}

impl LineRate {
    /// Maps a framework mode request onto a line rate.  Only Ethernet at
    /// 10GBASE-R and 25GBASE-R is supported.
    pub fn for_mode(
        mode: PhyMode,
        submode: InterfaceMode,
    ) -> Result<Self, RetimerError> {
        match (mode, submode) {
            (PhyMode::Ethernet, InterfaceMode::TenGBaseR) => Ok(Self::TenG),
            (PhyMode::Ethernet, InterfaceMode::TwentyFiveGBaseR) => {
                Ok(Self::TwentyFiveG)
            }
            _ => Err(RetimerError::UnsupportedMode),
        }
    }
}

/// Which member of the retimer family the binding layer declared.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Variant {
    Ds250df410,
    Ds250df810,
}

impl Variant {
    /// Matches a devicetree `compatible` string.
    pub fn from_compatible(compatible: &str) -> Option<Self> {
        match compatible {
            "ti,ds250df410" => Some(Self::Ds250df410),
            "ti,ds250df810" => Some(Self::Ds250df810),
            _ => None,
        }
    }

    /// Matches an I2C device id table name.
    pub fn from_i2c_name(name: &str) -> Option<Self> {
        match name {
            "ds250df410" => Some(Self::Ds250df410),
            "ds250df810" => Some(Self::Ds250df810),
            _ => None,
        }
    }

    /// Number of channels the part is sold with.
    pub const fn channels(self) -> u8 {
        match self {
            Self::Ds250df410 => 4,
            Self::Ds250df810 => 8,
        }
    }
}
