//! Boundary operations
//!
//! Every operation locks the port's mutex only around register access and
//! state updates. Break and mark timing on transmit is waited out with the
//! lock released.

use dmx_core::{
    ConfigError, DmxConfig, DmxError, DoubleBuffer, DriverConfig, Mode, PinAssignment,
};
use dmx_hal::{DmxUart, EdgeCapture, InterruptMask, StopBits, UartConfig};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{block_for, with_timeout, Duration, Instant};

use super::port::{DriverInstance, HardwareContext, Port, PortState};
use crate::error::from_hal;
use crate::event::EventReceiver;

/// Registry of `N` DMX ports
///
/// Meant to live in a `static`: construction is `const` and every
/// operation takes `&self`.
pub struct DmxDriver<M: RawMutex, U, C, const N: usize> {
    pub(crate) ports: [Port<M, U, C>; N],
}

impl<M: RawMutex, U, C, const N: usize> DmxDriver<M, U, C, N> {
    pub const fn new() -> Self {
        Self {
            ports: [const { Port::new() }; N],
        }
    }

    /// Number of ports in the registry
    pub const fn port_count(&self) -> usize {
        N
    }
}

impl<M: RawMutex, U, C, const N: usize> Default for DmxDriver<M, U, C, N> {
    fn default() -> Self {
        Self::new()
    }
}

fn uart_config(config: &DmxConfig) -> UartConfig {
    UartConfig {
        baudrate: config.baud_rate,
        stop_bits: StopBits::Two,
    }
}

fn uart_mut<U, C>(hw: &mut HardwareContext<U, C>) -> Result<&mut U, DmxError> {
    hw.uart.as_mut().ok_or(DmxError::HardwareError)
}

/// Bring the peripheral up for reception, undoing partial work on failure
fn bring_up<U: DmxUart>(uart: &mut U, config: &DmxConfig, priority: u8) -> Result<(), DmxError> {
    uart.enable(&uart_config(config)).map_err(from_hal)?;
    if let Err(e) = uart.attach_interrupt(priority) {
        uart.disable();
        return Err(from_hal(e));
    }
    uart.set_transmit_enable(false);
    uart.clear_interrupts(InterruptMask::ALL);
    uart.enable_interrupts(InterruptMask::RX_ALL);
    Ok(())
}

impl<M, U, C, const N: usize> DmxDriver<M, U, C, N>
where
    M: RawMutex,
    U: DmxUart,
    C: EdgeCapture,
{
    pub(crate) fn port(&self, port: usize) -> Result<&Port<M, U, C>, DmxError> {
        self.ports
            .get(port)
            .ok_or(DmxError::Config(ConfigError::InvalidPort))
    }

    fn with_state<R>(
        &self,
        port: usize,
        f: impl FnOnce(&mut PortState<U, C>) -> Result<R, DmxError>,
    ) -> Result<R, DmxError> {
        let p = self.port(port)?;
        p.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    fn with_installed<R>(
        &self,
        port: usize,
        f: impl FnOnce(&mut HardwareContext<U, C>, &mut DriverInstance) -> Result<R, DmxError>,
    ) -> Result<R, DmxError> {
        self.with_state(port, |st| {
            let PortState { hw, instance } = st;
            let inst = instance.as_mut().ok_or(DmxError::NotInstalled)?;
            f(hw, inst)
        })
    }

    /// Bind the peripherals for `port`
    ///
    /// Done once at boot. The capture peripheral is only needed for
    /// timing analysis.
    pub fn attach(&self, port: usize, uart: U, capture: Option<C>) -> Result<(), DmxError> {
        self.with_state(port, |st| {
            if st.instance.is_some() {
                return Err(DmxError::AlreadyInstalled);
            }
            st.hw.uart = Some(uart);
            st.hw.capture = capture;
            Ok(())
        })
    }

    /// Install the driver on `port` in receive mode
    ///
    /// Returns the handle on which packet events are delivered.
    pub fn install(
        &self,
        port: usize,
        config: DriverConfig,
    ) -> Result<EventReceiver<'_, M>, DmxError> {
        config.validate()?;
        let p = self.port(port)?;
        let buffers = DoubleBuffer::new(config.buffer_capacity)?;

        let generation = p.state.lock(|cell| {
            let mut st = cell.borrow_mut();
            if st.instance.is_some() {
                return Err(DmxError::AlreadyInstalled);
            }

            let hw = &mut st.hw;
            let line = hw.config;
            let uart = uart_mut(hw)?;

            // Open before the interrupt is armed so the first packet is kept
            let generation = p.events.open(config.queue_capacity);
            p.tx_done.open();

            if let Err(e) = bring_up(uart, &line, config.isr_priority) {
                p.events.close();
                p.tx_done.close();
                return Err(e);
            }

            hw.enabled = true;
            st.instance = Some(DriverInstance::new(buffers, &line));
            Ok(generation)
        })?;

        info!(
            "dmx port {}: installed, {} slots, queue {}",
            port,
            config.buffer_capacity,
            config.queue_capacity
        );
        Ok(EventReceiver::new(&p.events, generation))
    }

    /// Quiesce the port and release its driver state
    ///
    /// Waiting receivers and writers wake with `DmxError::Closed`.
    pub fn uninstall(&self, port: usize) -> Result<(), DmxError> {
        let p = self.port(port)?;

        p.state.lock(|cell| {
            let mut st = cell.borrow_mut();
            if st.instance.is_none() {
                return Err(DmxError::NotInstalled);
            }
            if let Some(uart) = st.hw.uart.as_mut() {
                uart.disable_interrupts(InterruptMask::ALL);
                uart.detach_interrupt();
                uart.clear_interrupts(InterruptMask::ALL);
            }
            if let Some(capture) = st.hw.capture.as_mut() {
                capture.disarm();
            }
            Ok(())
        })?;

        p.events.close();
        p.tx_done.close();

        p.state.lock(|cell| {
            let mut st = cell.borrow_mut();
            st.instance = None;
            if let Some(uart) = st.hw.uart.as_mut() {
                uart.set_break(false);
                uart.set_transmit_enable(false);
                uart.disable();
            }
            st.hw.enabled = false;
        });

        info!("dmx port {}: uninstalled", port);
        Ok(())
    }

    /// Check if a driver is installed on `port`
    pub fn is_installed(&self, port: usize) -> bool {
        self.with_state(port, |st| Ok(st.instance.is_some()))
            .unwrap_or(false)
    }

    /// Route the transceiver signals for `port`
    pub fn configure_pins(&self, port: usize, pins: PinAssignment) -> Result<(), DmxError> {
        self.with_state(port, |st| {
            let merged = PinAssignment {
                tx: pins.tx.or(st.hw.pins.tx),
                rx: pins.rx.or(st.hw.pins.rx),
                enable: pins.enable.or(st.hw.pins.enable),
            };
            if !merged.is_distinct() {
                return Err(DmxError::Config(ConfigError::InvalidPin));
            }
            uart_mut(&mut st.hw)?
                .set_pins(pins.tx, pins.rx, pins.enable)
                .map_err(from_hal)?;
            st.hw.pins = merged;
            Ok(())
        })
    }

    /// Apply a line configuration
    ///
    /// Takes effect immediately on an installed port; otherwise it is used
    /// at the next install.
    pub fn param_config(&self, port: usize, config: DmxConfig) -> Result<(), DmxError> {
        config.validate()?;
        self.with_state(port, |st| {
            let PortState { hw, instance } = st;
            if let Some(inst) = instance.as_mut() {
                if inst.transmitter.is_busy() {
                    return Err(DmxError::Busy);
                }
                if hw.enabled && hw.config.baud_rate != config.baud_rate {
                    uart_mut(hw)?
                        .enable(&uart_config(&config))
                        .map_err(from_hal)?;
                }
                inst.transmitter.set_timing(&config);
            }
            hw.config = config;
            Ok(())
        })
    }

    /// Line configuration currently applied to `port`
    pub fn line_config(&self, port: usize) -> Result<DmxConfig, DmxError> {
        self.with_state(port, |st| Ok(st.hw.config))
    }

    /// Start measuring break and mark-after-break on `pin`
    ///
    /// Calling again with the same pin is a no-op. Safe while packets are
    /// being received: the next complete break is the first one measured.
    pub fn enable_timing_capture(&self, port: usize, pin: u8) -> Result<(), DmxError> {
        self.with_installed(port, |hw, inst| {
            if inst.capture_pin == Some(pin) && inst.receiver.timing_enabled() {
                return Ok(());
            }
            let capture = hw.capture.as_mut().ok_or(DmxError::ResourceExhausted)?;
            if inst.capture_pin.is_some() {
                capture.disarm();
            }
            if let Err(e) = capture.arm(pin) {
                inst.capture_pin = None;
                inst.receiver.disable_timing();
                return Err(from_hal(e));
            }
            inst.capture_pin = Some(pin);
            inst.receiver.disable_timing();
            inst.receiver.enable_timing();
            info!("dmx port {}: timing capture on pin {}", port, pin);
            Ok(())
        })
    }

    /// Stop timing analysis; following events carry no timing
    pub fn disable_timing_capture(&self, port: usize) -> Result<(), DmxError> {
        self.with_installed(port, |hw, inst| {
            if let Some(capture) = hw.capture.as_mut() {
                capture.disarm();
            }
            inst.capture_pin = None;
            inst.receiver.disable_timing();
            info!("dmx port {}: timing capture off", port);
            Ok(())
        })
    }

    /// Copy the last completed packet, start code first
    ///
    /// Returns the number of bytes copied, at most `dest.len()`.
    pub fn read_packet(&self, port: usize, dest: &mut [u8]) -> Result<usize, DmxError> {
        self.with_installed(port, |_, inst| Ok(inst.buffers.copy_readable(dest)))
    }

    /// Current direction of `port`
    pub fn mode(&self, port: usize) -> Result<Mode, DmxError> {
        self.with_installed(port, |_, inst| Ok(inst.mode))
    }

    /// Switch `port` between receiving and transmitting
    pub fn set_mode(&self, port: usize, mode: Mode) -> Result<(), DmxError> {
        self.with_installed(port, |hw, inst| {
            if inst.mode == mode {
                return Ok(());
            }
            if inst.transmitter.is_busy() {
                return Err(DmxError::Busy);
            }

            let uart = uart_mut(hw)?;
            uart.disable_interrupts(InterruptMask::ALL);
            uart.clear_interrupts(InterruptMask::ALL);
            inst.receiver.reset();

            match mode {
                Mode::Receive => {
                    uart.set_transmit_enable(false);
                    inst.buffers.restart();
                    uart.enable_interrupts(InterruptMask::RX_ALL);
                }
                Mode::Transmit => {
                    uart.set_transmit_enable(true);
                }
            }

            inst.mode = mode;
            debug!("dmx port {}: mode {}", port, mode);
            Ok(())
        })
    }

    /// Copy `data` into the transmit staging buffer
    ///
    /// Returns the number of slots staged, clipped to the buffer capacity.
    pub fn stage_packet(&self, port: usize, data: &[u8]) -> Result<usize, DmxError> {
        self.with_installed(port, |_, inst| {
            if inst.mode != Mode::Transmit {
                return Err(DmxError::WrongMode);
            }
            Ok(inst.buffers.stage(data))
        })
    }

    /// Transmit the first `size` staged slots
    ///
    /// Generates the break and mark-after-break, then hands the slots to
    /// the interrupt handler. Waits first if the previous break started
    /// less than the minimum break-to-break time ago.
    pub fn send_packet(&self, port: usize, size: usize) -> Result<(), DmxError> {
        let p = self.port(port)?;

        let delay = self.with_installed(port, |_, inst| {
            if inst.mode != Mode::Transmit {
                return Err(DmxError::WrongMode);
            }
            if inst.transmitter.is_busy() {
                return Err(DmxError::Busy);
            }
            Ok(inst.transmitter.break_delay(Instant::now()))
        })?;
        if delay > Duration::from_ticks(0) {
            block_for(delay);
        }

        let (break_len, mab_len) = self.with_installed(port, |hw, inst| {
            let uart = uart_mut(hw)?;
            // The mode may have changed while the spacing was waited out
            inst.start_frame(Instant::now())?;
            if let Err(e) = p.tx_done.arm() {
                inst.transmitter.abort();
                return Err(e);
            }
            let sent = inst.buffers.promote_staged(size);
            trace!("dmx port {}: sending {} slots", port, sent);
            uart.set_break(true);
            Ok((inst.transmitter.break_len(), inst.transmitter.mab_len()))
        })?;

        block_for(break_len);
        self.with_installed(port, |hw, inst| {
            uart_mut(hw)?.set_break(false);
            inst.transmitter.end_break();
            Ok(())
        })?;

        block_for(mab_len);
        self.with_installed(port, |hw, inst| {
            let uart = uart_mut(hw)?;
            inst.transmitter.end_mark();
            uart.clear_interrupts(InterruptMask::TX_ALL);
            uart.enable_interrupts(InterruptMask::TX_READY);
            Ok(())
        })
    }

    /// Stage `data` and transmit all of it
    pub fn write_packet(&self, port: usize, data: &[u8]) -> Result<(), DmxError> {
        let size = self.stage_packet(port, data)?;
        self.send_packet(port, size)
    }

    /// Stage and transmit `data`, then wait for the last slot to leave
    pub async fn write_packet_confirmed(
        &self,
        port: usize,
        data: &[u8],
        timeout: Duration,
    ) -> Result<(), DmxError> {
        self.write_packet(port, data)?;
        self.wait_tx_done(port, timeout).await
    }

    /// Wait until no frame is in flight on `port`
    pub async fn wait_tx_done(&self, port: usize, timeout: Duration) -> Result<(), DmxError> {
        let p = self.port(port)?;
        if !self.is_installed(port) {
            return Err(DmxError::NotInstalled);
        }
        match with_timeout(timeout, p.tx_done.wait()).await {
            Ok(result) => result,
            Err(_) => Err(DmxError::Timeout),
        }
    }
}
