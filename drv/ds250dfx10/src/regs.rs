// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register map and masked register access

use crate::{RetimerBus, Trace};
use bitfield::bitfield;
use drv_ds250dfx10_api::RetimerError;
use num_derive::FromPrimitive;
use ringbuf::ringbuf_entry_root as ringbuf_entry;

/// A mask that selects the whole register; writes with this mask skip the
/// preceding read.
pub const FULL_MASK: u8 = 0xFF;

#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum Register {
    // Per-channel registers, addressed through `ChannelSelect`
    ChannelReset = 0x00,
    CdrControl = 0x0A,
    RateSelect = 0x2F,
    /// FIR enable (bit 7), main cursor sign (bit 6) and magnitude (4:0)
    MainCursor = 0x3D,
    /// Pre-cursor sign (bit 6) and magnitude (3:0)
    PreCursor = 0x3E,
    /// Post-cursor sign (bit 6) and magnitude (3:0)
    PostCursor = 0x3F,

    // Shared registers
    ChannelConfigId = 0xEF,
    Version = 0xF0,
    DeviceId = 0xF1,
    ChannelVersion = 0xF3,
    ChannelSelect = 0xFC,
    SmbusControl = 0xFF,
}

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct ChannelVersion(u8);
    impl Debug;
    pub channel, _: 7, 4;
    pub share, _: 3, 0;
}

impl From<u8> for ChannelVersion {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

/// A single masked register write.  Mode recipes are fixed arrays of these.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RegisterOp {
    pub reg: Register,
    pub value: u8,
    pub mask: u8,
}

impl RegisterOp {
    pub const fn new(reg: Register, value: u8, mask: u8) -> Self {
        Self { reg, value, mask }
    }

    pub fn apply<B: RetimerBus + ?Sized>(
        &self,
        bus: &mut B,
    ) -> Result<(), RetimerError> {
        write_register(bus, self.reg, self.value, self.mask)
    }
}

/// Reads `reg` and returns the bits selected by `mask`.
pub fn read_register<B: RetimerBus + ?Sized>(
    bus: &mut B,
    reg: Register,
    mask: u8,
) -> Result<u8, RetimerError> {
    match bus.read_byte(reg as u8) {
        Ok(value) => Ok(value & mask),
        Err(code) => {
            ringbuf_entry!(Trace::ReadFailed { reg, code });
            Err(code.into())
        }
    }
}

/// Writes the bits of `value` selected by `mask` into `reg`.
///
/// Unless `mask` is [FULL_MASK], the current register contents are read
/// first and the bits outside the mask are written back unchanged.  If that
/// read fails, nothing is written.  The read and the write are two separate
/// bus transactions; the caller must hold the bus for both.
pub fn write_register<B: RetimerBus + ?Sized>(
    bus: &mut B,
    reg: Register,
    value: u8,
    mask: u8,
) -> Result<(), RetimerError> {
    let value = if mask != FULL_MASK {
        let keep = read_register(bus, reg, !mask)?;
        (value & mask) | keep
    } else {
        value
    };

    bus.write_byte(reg as u8, value).map_err(|code| {
        ringbuf_entry!(Trace::WriteFailed { reg, value, code });
        code.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeBus, Txn};
    use proptest::prelude::*;

    #[test]
    fn full_mask_write_skips_read() {
        let mut bus = FakeBus::new().with(0xFC, 0xAA);
        write_register(&mut bus, Register::ChannelSelect, 0x04, FULL_MASK)
            .unwrap();

        assert_eq!(bus.log, [Txn::Write(0xFC, 0x04)]);
        assert_eq!(bus.regs[0xFC], 0x04);
    }

    #[test]
    fn masked_write_preserves_other_bits() {
        let mut bus = FakeBus::new().with(0x2F, 0x0A);
        write_register(&mut bus, Register::RateSelect, 0x50, 0xF0).unwrap();

        assert_eq!(bus.log, [Txn::Read(0x2F), Txn::Write(0x2F, 0x5A)]);
    }

    #[test]
    fn masked_write_ignores_value_bits_outside_mask() {
        let mut bus = FakeBus::new().with(0x3D, 0x80);
        write_register(&mut bus, Register::MainCursor, 0xFF, 0x1F).unwrap();

        assert_eq!(bus.regs[0x3D], 0x9F);
    }

    #[test]
    fn failed_read_suppresses_write() {
        let mut bus = FakeBus::new().fail_read(0x0A);
        let r = write_register(&mut bus, Register::CdrControl, 0x0C, 0x0C);

        assert_eq!(r, Err(RetimerError::IoFailure));
        assert_eq!(bus.log, [Txn::Read(0x0A)]);
    }

    #[test]
    fn failed_write_is_io_failure() {
        let mut bus = FakeBus::new().fail_write(0xFC);
        let r = write_register(&mut bus, Register::ChannelSelect, 1, FULL_MASK);

        assert_eq!(r, Err(RetimerError::IoFailure));
    }

    #[test]
    fn read_applies_mask() {
        let mut bus = FakeBus::new().with(0xEF, 0xAC);
        assert_eq!(
            read_register(&mut bus, Register::ChannelConfigId, 0x0F),
            Ok(0x0C)
        );
        assert_eq!(
            read_register(&mut bus, Register::ChannelConfigId, FULL_MASK),
            Ok(0xAC)
        );
    }

    #[test]
    fn channel_version_nibbles() {
        let v = ChannelVersion(0x21);
        assert_eq!(v.channel(), 2);
        assert_eq!(v.share(), 1);
    }

    proptest! {
        #[test]
        fn masked_write_merges(prior: u8, value: u8, mask: u8) {
            let mut bus = FakeBus::new().with(0x3E, prior);
            write_register(&mut bus, Register::PreCursor, value, mask)
                .unwrap();

            let expected = if mask == FULL_MASK {
                prop_assert_eq!(bus.reads(), 0);
                value
            } else {
                prop_assert_eq!(bus.reads(), 1);
                prop_assert_eq!(bus.log[0], Txn::Read(0x3E));
                (value & mask) | (prior & !mask)
            };
            prop_assert_eq!(bus.log.last(), Some(&Txn::Write(0x3E, expected)));
            prop_assert_eq!(bus.regs[0x3E], expected);
        }
    }
}
