// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test doubles: a register-file bus that logs every transaction, and an
//! endpoint factory that records what it created and destroyed.

use crate::{EndpointFactory, RetimerBus, Trace};
use drv_ds250dfx10_api::{BusError, Channel, RetimerError};
use std::sync::{Arc, Mutex};

/// Counts how many times `entry` appears in the driver's trace buffer.
pub fn traced(entry: Trace) -> u32 {
    crate::__RINGBUF
        .lock()
        .iter()
        .filter(|ent| ent.payload == entry)
        .map(|ent| ent.count)
        .sum()
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Txn {
    Read(u8),
    Write(u8, u8),
}

pub struct FakeBus {
    pub regs: [u8; 256],
    pub log: Vec<Txn>,
    fail_reads: Vec<u8>,
    fail_writes: Vec<u8>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            log: vec![],
            fail_reads: vec![],
            fail_writes: vec![],
        }
    }

    /// A healthy retimer reporting `config_id` in its channel config register.
    pub fn retimer(config_id: u8) -> Self {
        Self::new()
            .with(0xF1, 0x10)
            .with(0xF0, 0x03)
            .with(0xEF, 0xF0 | config_id)
            .with(0xF3, 0x21)
    }

    pub fn with(mut self, reg: u8, value: u8) -> Self {
        self.regs[reg as usize] = value;
        self
    }

    pub fn fail_read(mut self, reg: u8) -> Self {
        self.fail_reads.push(reg);
        self
    }

    pub fn fail_write(mut self, reg: u8) -> Self {
        self.fail_writes.push(reg);
        self
    }

    pub fn reads(&self) -> usize {
        self.log
            .iter()
            .filter(|t| matches!(t, Txn::Read(_)))
            .count()
    }

    /// Every attempted write, successful or not, in order.
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.log
            .iter()
            .filter_map(|t| match *t {
                Txn::Write(reg, value) => Some((reg, value)),
                Txn::Read(_) => None,
            })
            .collect()
    }
}

impl RetimerBus for FakeBus {
    fn read_byte(&mut self, reg: u8) -> Result<u8, BusError> {
        self.log.push(Txn::Read(reg));
        if self.fail_reads.contains(&reg) {
            Err(BusError::NoRegister)
        } else {
            Ok(self.regs[reg as usize])
        }
    }

    fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        self.log.push(Txn::Write(reg, value));
        if self.fail_writes.contains(&reg) {
            Err(BusError::NoDevice)
        } else {
            self.regs[reg as usize] = value;
            Ok(())
        }
    }
}

/// Deliberately not `Copy` or `Clone`, so a handle can only be destroyed once.
#[derive(Debug, Eq, PartialEq)]
pub struct FakeHandle(pub u8);

#[derive(Debug, Default)]
pub struct FactoryLog {
    pub created: Vec<u8>,
    pub destroyed: Vec<u8>,
}

impl FactoryLog {
    /// Channels that were created and never destroyed.
    pub fn live(&self) -> Vec<u8> {
        self.created
            .iter()
            .copied()
            .filter(|c| !self.destroyed.contains(c))
            .collect()
    }
}

#[derive(Default)]
pub struct FakeFactory {
    pub log: Arc<Mutex<FactoryLog>>,
    fail_at: Option<u8>,
}

impl FakeFactory {
    pub fn failing_at(channel: u8) -> Self {
        Self {
            fail_at: Some(channel),
            ..Self::default()
        }
    }
}

impl EndpointFactory for FakeFactory {
    type Handle = FakeHandle;

    fn create(&mut self, channel: Channel) -> Result<FakeHandle, RetimerError> {
        if self.fail_at == Some(channel.index()) {
            return Err(RetimerError::AllocationFailure);
        }
        self.log.lock().unwrap().created.push(channel.index());
        Ok(FakeHandle(channel.index()))
    }

    fn destroy(&mut self, handle: FakeHandle) {
        self.log.lock().unwrap().destroyed.push(handle.0);
    }
}
