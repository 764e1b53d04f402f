// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identification and channel-count discovery

use crate::regs::{read_register, ChannelVersion, Register, FULL_MASK};
use crate::{RetimerBus, Trace};
use drv_ds250dfx10_api::RetimerError;
use ringbuf::ringbuf_entry_root as ringbuf_entry;

/// Device id reported by every part we have tested against.
pub const DEVICE_ID: u8 = 0x10;

const CHANNEL_CONFIG_ID_MASK: u8 = 0x0F;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChannelCount {
    Four = 4,
    Eight = 8,
}

impl ChannelCount {
    pub fn from_config_id(id: u8) -> Option<Self> {
        match id {
            0xC => Some(Self::Eight),
            0xE => Some(Self::Four),
            _ => None,
        }
    }

    pub const fn get(self) -> u8 {
        self as u8
    }
}

/// What the part told us about itself.  Only `channels` feeds into any
/// decision; the rest is kept for diagnostics.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TopologyInfo {
    pub device_id: u8,
    pub version: u8,
    pub channel_config_id: u8,
    pub channels: ChannelCount,
    pub channel_version: u8,
    pub share_version: u8,
}

/// Probes the identification registers.  Any bus failure ends discovery
/// immediately; an unexpected device id is only a warning.
pub fn discover<B: RetimerBus + ?Sized>(
    bus: &mut B,
) -> Result<TopologyInfo, RetimerError> {
    let device_id = read_register(bus, Register::DeviceId, FULL_MASK)?;
    let version = read_register(bus, Register::Version, FULL_MASK)?;
    ringbuf_entry!(Trace::Identity { device_id, version });

    if device_id != DEVICE_ID {
        // Keep going; it may well be a compatible part
        ringbuf_entry!(Trace::UnknownDeviceId(device_id));
    }

    let channel_config_id =
        read_register(bus, Register::ChannelConfigId, CHANNEL_CONFIG_ID_MASK)?;
    let channels = ChannelCount::from_config_id(channel_config_id)
        .ok_or_else(|| {
            ringbuf_entry!(Trace::UnknownChannelConfig(channel_config_id));
            RetimerError::UnknownTopology
        })?;
    ringbuf_entry!(Trace::Channels(channels.get()));

    let raw = read_register(bus, Register::ChannelVersion, FULL_MASK)?;
    let versions = ChannelVersion::from(raw);
    let (channel_version, share_version) =
        (versions.channel(), versions.share());
    ringbuf_entry!(Trace::Versions {
        channel: channel_version,
        share: share_version,
    });

    Ok(TopologyInfo {
        device_id,
        version,
        channel_config_id,
        channels,
        channel_version,
        share_version,
    })
}
