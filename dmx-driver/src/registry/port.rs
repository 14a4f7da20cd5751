//! Per-port state
//!
//! [`HardwareContext`] lives for the whole program and is bound once at
//! boot. [`DriverInstance`] exists only between install and uninstall.

use core::cell::RefCell;

use dmx_core::{DmxConfig, DmxError, DoubleBuffer, Mode, PinAssignment, Receiver, Transmitter};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;

use crate::event::{CompletionSignal, EventQueue};

/// Peripheral handles and line settings for one physical port
pub struct HardwareContext<U, C> {
    pub(crate) uart: Option<U>,
    pub(crate) capture: Option<C>,
    /// Peripheral clock and interrupt line are up
    pub(crate) enabled: bool,
    pub(crate) pins: PinAssignment,
    pub(crate) config: DmxConfig,
}

impl<U, C> HardwareContext<U, C> {
    const fn new() -> Self {
        Self {
            uart: None,
            capture: None,
            enabled: false,
            pins: PinAssignment::unassigned(),
            config: DmxConfig::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Driver state for an installed port
pub struct DriverInstance {
    pub(crate) mode: Mode,
    pub(crate) buffers: DoubleBuffer,
    pub(crate) receiver: Receiver,
    pub(crate) transmitter: Transmitter,
    /// Pin the edge capture is armed on
    pub(crate) capture_pin: Option<u8>,
}

impl DriverInstance {
    pub(crate) fn new(buffers: DoubleBuffer, config: &DmxConfig) -> Self {
        Self {
            mode: Mode::Receive,
            buffers,
            receiver: Receiver::new(),
            transmitter: Transmitter::new(config),
            capture_pin: None,
        }
    }

    /// Begin a transmit frame at `now`
    ///
    /// Fails without touching the transmitter unless the port is in
    /// transmit mode and idle.
    pub(crate) fn start_frame(&mut self, now: Instant) -> Result<(), DmxError> {
        if self.mode != Mode::Transmit {
            return Err(DmxError::WrongMode);
        }
        self.transmitter.begin(now)
    }
}

/// State guarded by the port's mutex
pub(crate) struct PortState<U, C> {
    pub(crate) hw: HardwareContext<U, C>,
    pub(crate) instance: Option<DriverInstance>,
}

/// One registry slot
pub struct Port<M: RawMutex, U, C> {
    pub(crate) state: Mutex<M, RefCell<PortState<U, C>>>,
    pub(crate) events: EventQueue<M>,
    pub(crate) tx_done: CompletionSignal<M>,
}

impl<M: RawMutex, U, C> Port<M, U, C> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(PortState {
                hw: HardwareContext::new(),
                instance: None,
            })),
            events: EventQueue::new(),
            tx_done: CompletionSignal::new(),
        }
    }
}

impl<M: RawMutex, U, C> Default for Port<M, U, C> {
    fn default() -> Self {
        Self::new()
    }
}
