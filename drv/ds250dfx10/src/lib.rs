// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Driver for the TI DS250DF410 and DS250DF810 retimers
//!
//! The DS250DFx10 is a multi-channel 25G retimer managed over SMBus.  This
//! crate discovers the part's topology, exposes each SerDes channel as an
//! endpoint to the PHY framework, and programs a channel for 10GBASE-R or
//! 25GBASE-R when the framework asks for it.
//!
//! It relies on the trait [RetimerBus], which callers must implement.  This
//! trait is an abstraction over reading and writing raw retimer registers at
//! the device's (fixed) bus address.
//!
//! ## Bus ownership
//!
//! Channel programming goes through two global registers (SMBus control and
//! channel select), so two recipes must never interleave on the same part.
//! The recipe functions take `&mut B`: whoever holds exclusive access to the
//! bus owns the channel selection.  [Ds250dfx10] keeps the bus behind a lock
//! and holds it for the whole recipe.

#![cfg_attr(not(test), no_std)]

mod provider;
mod recipe;
mod regs;
mod topology;

#[cfg(test)]
mod fake;

pub use drv_ds250dfx10_api::{
    channel_from_args, BusError, Channel, InterfaceMode, LineRate, PhyMode,
    RetimerError, Variant, MAX_CHANNELS,
};
pub use provider::{
    ChannelEndpoint, Ds250dfx10, Endpoint, EndpointFactory, ProviderState,
};
pub use recipe::{
    configure, configure_for_10g, configure_for_25g, recipe, RECIPE_LEN,
};
pub use regs::{
    read_register, write_register, ChannelVersion, Register, RegisterOp,
    FULL_MASK,
};
pub use topology::{discover, ChannelCount, TopologyInfo, DEVICE_ID};

use ringbuf::*;

////////////////////////////////////////////////////////////////////////////////

/// Trait implementing byte access to the retimer's register file.
pub trait RetimerBus {
    /// Reads a single register.
    fn read_byte(&mut self, reg: u8) -> Result<u8, BusError>;

    /// Writes a single register.  No read-modify-write happens here; see
    /// [write_register] for masked writes.
    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), BusError>;
}

impl<B: RetimerBus + ?Sized> RetimerBus for &mut B {
    fn read_byte(&mut self, reg: u8) -> Result<u8, BusError> {
        (**self).read_byte(reg)
    }

    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        (**self).write_byte(reg, value)
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Copy, Clone, Debug, PartialEq)]
enum Trace {
    None,
    ReadFailed {
        reg: Register,
        code: BusError,
    },
    WriteFailed {
        reg: Register,
        value: u8,
        code: BusError,
    },
    Identity {
        device_id: u8,
        version: u8,
    },
    UnknownDeviceId(u8),
    UnknownChannelConfig(u8),
    Channels(u8),
    Versions {
        channel: u8,
        share: u8,
    },
    VariantMismatch {
        variant: Variant,
        channels: u8,
    },
    EndpointCreated(u8),
    EndpointCreateFailed {
        channel: u8,
        err: RetimerError,
    },
    EndpointDestroyed(u8),
    BadBindingArgs(usize),
    UnsupportedMode {
        channel: u8,
        mode: PhyMode,
        submode: InterfaceMode,
    },
    UnsupportedRawMode {
        channel: u8,
        mode: u32,
        submode: u32,
    },
    Configured {
        channel: u8,
        rate: LineRate,
    },
}
#[cfg(not(test))]
ringbuf!(Trace, 32, Trace::None);

// Host tests run in parallel and inspect the buffer afterwards, so it has to
// hold everything a full test run records.
#[cfg(test)]
ringbuf!(Trace, 1024, Trace::None);
