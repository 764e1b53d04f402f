// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed per-channel programming recipes for 10GBASE-R and 25GBASE-R.
//!
//! Equalization, CDR and rate settings are fixed for the boards this part is
//! used on, so each supported line rate is one literal register sequence.
//! The two recipes differ only in the rate select field.

use crate::regs::{Register, RegisterOp, FULL_MASK};
use crate::{RetimerBus, Trace};
use drv_ds250dfx10_api::{Channel, LineRate, RetimerError, MAX_CHANNELS};
use ringbuf::ringbuf_entry_root as ringbuf_entry;
use static_assertions::const_assert;

pub const RECIPE_LEN: usize = 13;

// The channel select register is one-hot across a single byte
const_assert!(MAX_CHANNELS <= u8::BITS as usize);

const fn rate_field(rate: LineRate) -> u8 {
    match rate {
        LineRate::TenG => 0x00,
        LineRate::TwentyFiveG => 0x50,
    }
}

/// Returns the register sequence that programs `channel` for `rate`.
pub const fn recipe(
    channel: Channel,
    rate: LineRate,
) -> [RegisterOp; RECIPE_LEN] {
    use Register::*;
    [
        // enable SMBus access to a single channel
        RegisterOp::new(SmbusControl, 0x01, 0x03),
        RegisterOp::new(ChannelSelect, channel.select_mask(), FULL_MASK),
        // reset channel registers
        RegisterOp::new(ChannelReset, 0x04, 0x04),
        // hold the CDR in reset while we retune
        RegisterOp::new(CdrControl, 0x0C, 0x0C),
        RegisterOp::new(RateSelect, rate_field(rate), 0xF0),
        // enable pre- and post-cursor FIR
        RegisterOp::new(MainCursor, 0x80, 0x80),
        // main cursor +15
        RegisterOp::new(MainCursor, 0x00, 0x40),
        RegisterOp::new(MainCursor, 0x0F, 0x1F),
        // pre cursor -4
        RegisterOp::new(PreCursor, 0x40, 0x40),
        RegisterOp::new(PreCursor, 0x04, 0x0F),
        // post cursor -4
        RegisterOp::new(PostCursor, 0x40, 0x40),
        RegisterOp::new(PostCursor, 0x04, 0x0F),
        // release the CDR
        RegisterOp::new(CdrControl, 0x00, 0x0C),
    ]
}

/// Programs `channel` for `rate`.
///
/// Every step is attempted even if an earlier one failed: the part is left
/// in the most complete state we can get it to, and in particular the CDR
/// hold is always released.  Individual failures are traced as they happen;
/// the success trace is only recorded if every step went through, and the
/// call returns [RetimerError::IoFailure] otherwise.
pub fn configure<B: RetimerBus + ?Sized>(
    bus: &mut B,
    channel: Channel,
    rate: LineRate,
) -> Result<(), RetimerError> {
    let mut failed = false;

    for op in recipe(channel, rate).iter() {
        failed |= op.apply(bus).is_err();
    }

    if failed {
        return Err(RetimerError::IoFailure);
    }

    ringbuf_entry!(Trace::Configured {
        channel: channel.index(),
        rate
    });
    Ok(())
}

pub fn configure_for_10g<B: RetimerBus + ?Sized>(
    bus: &mut B,
    channel: Channel,
) -> Result<(), RetimerError> {
    configure(bus, channel, LineRate::TenG)
}

pub fn configure_for_25g<B: RetimerBus + ?Sized>(
    bus: &mut B,
    channel: Channel,
) -> Result<(), RetimerError> {
    configure(bus, channel, LineRate::TwentyFiveG)
}
