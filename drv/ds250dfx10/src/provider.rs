// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-channel endpoint lifecycle and lookup

use crate::recipe;
use crate::topology::{self, TopologyInfo};
use crate::{RetimerBus, Trace};
use drv_ds250dfx10_api::{
    channel_from_args, Channel, InterfaceMode, LineRate, PhyMode,
    RetimerError, Variant, MAX_CHANNELS,
};
use heapless::LinearMap;
use ringbuf::ringbuf_entry_root as ringbuf_entry;
use spin::{Mutex, MutexGuard};

/// Creates and destroys the framework's per-channel PHY objects.  This is
/// implemented by the PHY framework; the driver only decides when.
pub trait EndpointFactory {
    type Handle;

    fn create(
        &mut self,
        channel: Channel,
    ) -> Result<Self::Handle, RetimerError>;

    fn destroy(&mut self, handle: Self::Handle);
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProviderState {
    /// Nothing probed yet, or torn down
    Uninit,
    Discovering,
    CreatingEndpoints,
    /// Endpoints exist and can be resolved
    Ready,
    /// Probe failed; no endpoints exist
    Failed,
}

/// One SerDes lane, bound to its channel index.
pub struct ChannelEndpoint<H> {
    channel: Channel,
    handle: H,
}

impl<H> ChannelEndpoint<H> {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }
}

/// A DS250DFx10 acting as a PHY provider.
///
/// The bus lives behind a lock owned by this structure; every endpoint
/// borrows it, and a mode change holds it for the full recipe.
pub struct Ds250dfx10<B, F: EndpointFactory> {
    variant: Variant,
    bus: Mutex<B>,
    factory: F,
    state: ProviderState,
    topology: Option<TopologyInfo>,
    endpoints: LinearMap<Channel, ChannelEndpoint<F::Handle>, MAX_CHANNELS>,
}

impl<B, F: EndpointFactory> Ds250dfx10<B, F> {
    pub fn state(&self) -> ProviderState {
        self.state
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Topology found by the last successful probe.
    pub fn topology(&self) -> Option<&TopologyInfo> {
        self.topology.as_ref()
    }

    /// Takes exclusive use of the bus.  While the guard is held no endpoint
    /// can program its channel, which makes it safe to drive the recipes (or
    /// any other channel-selected access) directly.
    ///
    /// The lock spins: calling [Endpoint::set_mode] or
    /// [Endpoint::set_mode_raw] on the same thread while the guard is held
    /// never returns.
    pub fn bus(&self) -> MutexGuard<'_, B> {
        self.bus.lock()
    }

    /// Destroys every endpoint.  Channels that were never populated are
    /// skipped, so this is safe to call more than once.
    pub fn remove(&mut self) {
        for channel in Channel::first(MAX_CHANNELS as u8) {
            if let Some(endpoint) = self.endpoints.remove(&channel) {
                self.factory.destroy(endpoint.handle);
                ringbuf_entry!(Trace::EndpointDestroyed(channel.index()));
            }
        }
        self.topology = None;
        self.state = ProviderState::Uninit;
    }
}

impl<B: RetimerBus, F: EndpointFactory> Ds250dfx10<B, F> {
    pub fn new(variant: Variant, bus: B, factory: F) -> Self {
        Self {
            variant,
            bus: Mutex::new(bus),
            factory,
            state: ProviderState::Uninit,
            topology: None,
            endpoints: LinearMap::new(),
        }
    }

    /// Identifies the part and creates one endpoint per channel.
    ///
    /// On failure no endpoints are left behind and the provider is `Failed`;
    /// probing again is allowed.  Probing a `Ready` provider does nothing.
    pub fn probe(&mut self) -> Result<(), RetimerError> {
        if self.state == ProviderState::Ready {
            return Ok(());
        }

        self.state = ProviderState::Discovering;
        self.topology = None;
        let topology = match topology::discover(self.bus.get_mut()) {
            Ok(topology) => topology,
            Err(e) => {
                self.state = ProviderState::Failed;
                return Err(e);
            }
        };

        let channels = topology.channels.get();
        if channels != self.variant.channels() {
            ringbuf_entry!(Trace::VariantMismatch {
                variant: self.variant,
                channels
            });
        }

        self.state = ProviderState::CreatingEndpoints;
        if let Err(e) = self.create_endpoints(channels) {
            self.state = ProviderState::Failed;
            return Err(e);
        }

        self.topology = Some(topology);
        self.state = ProviderState::Ready;
        Ok(())
    }

    fn create_endpoints(&mut self, count: u8) -> Result<(), RetimerError> {
        for channel in Channel::first(count) {
            let handle = match self.factory.create(channel) {
                Ok(handle) => handle,
                Err(err) => {
                    ringbuf_entry!(Trace::EndpointCreateFailed {
                        channel: channel.index(),
                        err
                    });
                    self.remove();
                    return Err(err);
                }
            };

            // Only reached from `Uninit` or `Failed`, so the map starts empty
            match self
                .endpoints
                .insert(channel, ChannelEndpoint { channel, handle })
            {
                Ok(previous) => debug_assert!(previous.is_none()),
                Err((_, endpoint)) => {
                    self.factory.destroy(endpoint.handle);
                    self.remove();
                    return Err(RetimerError::AllocationFailure);
                }
            }
            ringbuf_entry!(Trace::EndpointCreated(channel.index()));
        }
        Ok(())
    }

    /// Resolves binding arguments (a single channel index) to an endpoint.
    pub fn resolve(
        &self,
        args: &[u32],
    ) -> Result<Endpoint<'_, B, F::Handle>, RetimerError> {
        let channel = channel_from_args(args).map_err(|e| {
            if e == RetimerError::InvalidBinding {
                ringbuf_entry!(Trace::BadBindingArgs(args.len()));
            }
            e
        })?;
        self.endpoint(channel).ok_or(RetimerError::InvalidChannel)
    }

    pub fn endpoint(
        &self,
        channel: Channel,
    ) -> Option<Endpoint<'_, B, F::Handle>> {
        self.endpoints.get(&channel).map(|endpoint| Endpoint {
            bus: &self.bus,
            endpoint,
        })
    }

    /// Iterates over populated endpoints in channel order.
    pub fn endpoints(
        &self,
    ) -> impl Iterator<Item = Endpoint<'_, B, F::Handle>> + '_ {
        Channel::first(MAX_CHANNELS as u8).filter_map(|c| self.endpoint(c))
    }
}

impl<B, F: EndpointFactory> Drop for Ds250dfx10<B, F> {
    fn drop(&mut self) {
        self.remove();
    }
}

/// A resolved endpoint: a channel plus a borrow of the shared bus.
pub struct Endpoint<'a, B, H> {
    bus: &'a Mutex<B>,
    endpoint: &'a ChannelEndpoint<H>,
}

impl<'a, B: RetimerBus, H> Endpoint<'a, B, H> {
    pub fn channel(&self) -> Channel {
        self.endpoint.channel
    }

    pub fn handle(&self) -> &'a H {
        &self.endpoint.handle
    }

    /// Programs this channel for the requested mode.  Unsupported requests
    /// are refused before the bus is touched.
    pub fn set_mode(
        &self,
        mode: PhyMode,
        submode: InterfaceMode,
    ) -> Result<(), RetimerError> {
        let channel = self.channel();
        let rate = LineRate::for_mode(mode, submode).map_err(|e| {
            ringbuf_entry!(Trace::UnsupportedMode {
                channel: channel.index(),
                mode,
                submode
            });
            e
        })?;

        let mut bus = self.bus.lock();
        recipe::configure(&mut *bus, channel, rate)
    }

    /// As [Self::set_mode], with the framework's raw mode numbers.
    pub fn set_mode_raw(
        &self,
        mode: u32,
        submode: u32,
    ) -> Result<(), RetimerError> {
        match (PhyMode::from_raw(mode), InterfaceMode::from_raw(submode)) {
            (Some(mode), Some(submode)) => self.set_mode(mode, submode),
            _ => {
                ringbuf_entry!(Trace::UnsupportedRawMode {
                    channel: self.channel().index(),
                    mode,
                    submode
                });
                Err(RetimerError::UnsupportedMode)
            }
        }
    }
}
