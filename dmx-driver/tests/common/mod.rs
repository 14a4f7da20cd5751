//! Scripted peripherals for driver tests
//!
//! Each mock shares its state through an `Rc` so the test can inject line
//! conditions and inspect register writes while the driver owns the mock.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use dmx_driver::DmxDriver;
use dmx_hal::{DmxUart, EdgeCapture, HalError, InterruptMask, UartConfig};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;

pub type TestDriver = DmxDriver<CriticalSectionRawMutex, MockUart, MockCapture, 2>;

#[derive(Debug, Default)]
pub struct UartState {
    pub enabled: bool,
    pub config: Option<UartConfig>,
    pub pins: (Option<u8>, Option<u8>, Option<u8>),
    pub interrupt_priority: Option<u8>,
    pub fail_attach: bool,
    /// Armed interrupt sources
    pub armed: InterruptMask,
    /// Line conditions raised and not yet acknowledged
    pub raised: InterruptMask,
    /// Received bytes with the line flags the FIFO stored alongside them
    pub rx_fifo: VecDeque<(u8, InterruptMask)>,
    /// In-band condition found while draining and not yet acknowledged
    pub held: InterruptMask,
    /// Everything written to the TX FIFO, in order
    pub tx_bytes: Vec<u8>,
    /// Bytes the TX FIFO accepts per interrupt; `None` for unlimited
    pub tx_fifo_room: Option<usize>,
    /// Interrupts during which the last frame is still shifting out
    pub tx_drain_polls: usize,
    tx_written: usize,
    pub breaking: bool,
    pub breaks_sent: usize,
    pub transmit_enable: bool,
}

#[derive(Clone, Default)]
pub struct MockUart(pub Rc<RefCell<UartState>>);

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::cell::RefMut<'_, UartState> {
        self.0.borrow_mut()
    }

    /// Queue received bytes in the RX FIFO
    pub fn receive(&self, bytes: &[u8]) {
        let mut s = self.state();
        s.rx_fifo
            .extend(bytes.iter().map(|&b| (b, InterruptMask::NONE)));
    }

    /// Queue a break the way a PL011 stores it: a zero byte flagged in
    /// the FIFO, behind the slots received before it
    pub fn receive_break_in_fifo(&self) {
        self.state().rx_fifo.push_back((0, InterruptMask::RX_BREAK));
    }

    /// Check if an armed source still wants service
    pub fn wants_service(&self) -> bool {
        let s = self.state();
        let mut status = s.raised | s.held;
        if !s.rx_fifo.is_empty() {
            status |= InterruptMask::RX_DATA;
        }
        status.intersects(s.armed)
    }

    /// Raise a line condition
    pub fn raise(&self, mask: InterruptMask) {
        self.state().raised |= mask;
    }

    pub fn tx_bytes(&self) -> Vec<u8> {
        self.state().tx_bytes.clone()
    }

    pub fn armed(&self) -> InterruptMask {
        self.state().armed
    }
}

impl DmxUart for MockUart {
    fn enable(&mut self, config: &UartConfig) -> Result<(), HalError> {
        let mut s = self.state();
        s.enabled = true;
        s.config = Some(*config);
        Ok(())
    }

    fn disable(&mut self) {
        self.state().enabled = false;
    }

    fn set_pins(
        &mut self,
        tx: Option<u8>,
        rx: Option<u8>,
        enable: Option<u8>,
    ) -> Result<(), HalError> {
        if [tx, rx, enable].iter().flatten().any(|&pin| pin > 29) {
            return Err(HalError::InvalidPin);
        }
        let mut s = self.state();
        s.pins = (tx.or(s.pins.0), rx.or(s.pins.1), enable.or(s.pins.2));
        Ok(())
    }

    fn attach_interrupt(&mut self, priority: u8) -> Result<(), HalError> {
        let mut s = self.state();
        if s.fail_attach {
            return Err(HalError::InterruptUnavailable);
        }
        s.interrupt_priority = Some(priority);
        Ok(())
    }

    fn detach_interrupt(&mut self) {
        self.state().interrupt_priority = None;
    }

    fn enable_interrupts(&mut self, mask: InterruptMask) {
        self.state().armed |= mask;
    }

    fn disable_interrupts(&mut self, mask: InterruptMask) {
        let mut s = self.state();
        s.armed = s.armed.without(mask);
    }

    fn pending_interrupts(&mut self) -> InterruptMask {
        let mut s = self.state();
        s.tx_written = 0;
        if !s.held.is_empty() {
            let held = s.held.intersection(s.armed);
            if !held.is_empty() {
                return held;
            }
            s.held = InterruptMask::NONE;
        }
        let mut status = s.raised | InterruptMask::TX_READY;
        if s.armed.contains(InterruptMask::TX_DONE) {
            if s.tx_drain_polls > 0 {
                s.tx_drain_polls -= 1;
            } else {
                status |= InterruptMask::TX_DONE;
            }
        }
        if !s.rx_fifo.is_empty() {
            status |= InterruptMask::RX_DATA;
        }
        status.intersection(s.armed)
    }

    fn clear_interrupts(&mut self, mask: InterruptMask) {
        let mut s = self.state();
        s.raised = s.raised.without(mask);
        s.held = s.held.without(mask);
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut s = self.state();
        if !s.held.is_empty() {
            return None;
        }
        let (byte, flags) = s.rx_fifo.pop_front()?;
        if !flags.is_empty() {
            s.held |= flags;
            return None;
        }
        Some(byte)
    }

    fn write_byte(&mut self, byte: u8) -> bool {
        let mut s = self.state();
        if s.tx_fifo_room.is_some_and(|room| s.tx_written >= room) {
            return false;
        }
        s.tx_written += 1;
        s.tx_bytes.push(byte);
        true
    }

    fn set_break(&mut self, active: bool) {
        let mut s = self.state();
        if active && !s.breaking {
            s.breaks_sent += 1;
        }
        s.breaking = active;
    }

    fn set_transmit_enable(&mut self, transmit: bool) {
        self.state().transmit_enable = transmit;
    }
}

#[derive(Debug, Default)]
pub struct CaptureState {
    pub armed_pin: Option<u8>,
    pub arm_calls: usize,
}

#[derive(Clone, Default)]
pub struct MockCapture(pub Rc<RefCell<CaptureState>>);

impl MockCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed_pin(&self) -> Option<u8> {
        self.0.borrow().armed_pin
    }

    pub fn arm_calls(&self) -> usize {
        self.0.borrow().arm_calls
    }
}

impl EdgeCapture for MockCapture {
    fn arm(&mut self, pin: u8) -> Result<(), HalError> {
        if pin > 29 {
            return Err(HalError::InvalidPin);
        }
        let mut s = self.0.borrow_mut();
        s.armed_pin = Some(pin);
        s.arm_calls += 1;
        Ok(())
    }

    fn disarm(&mut self) {
        self.0.borrow_mut().armed_pin = None;
    }

    fn is_armed(&self) -> bool {
        self.0.borrow().armed_pin.is_some()
    }
}

/// Driver with mocks attached to port 0 and port 1
pub fn setup() -> (TestDriver, [MockUart; 2], [MockCapture; 2]) {
    let driver = TestDriver::new();
    let uarts = [MockUart::new(), MockUart::new()];
    let captures = [MockCapture::new(), MockCapture::new()];
    for port in 0..2 {
        driver
            .attach(port, uarts[port].clone(), Some(captures[port].clone()))
            .unwrap();
    }
    (driver, uarts, captures)
}

pub fn at(us: u64) -> Instant {
    Instant::from_micros(us)
}

/// Drive one received frame through port `port` starting at `t0`
///
/// Returns the time of the last slot. The frame is completed by the next
/// break, which the caller raises.
pub fn receive_frame(driver: &TestDriver, uart: &MockUart, port: usize, t0: u64, slots: &[u8]) -> u64 {
    uart.raise(InterruptMask::RX_BREAK);
    driver.on_uart_interrupt(port, at(t0));
    uart.raise(InterruptMask::RX_MARK);
    driver.on_uart_interrupt(port, at(t0 + 176));

    // Slots arrive in FIFO-sized bursts
    let mut t = t0 + 188;
    for chunk in slots.chunks(16) {
        t += 44 * chunk.len() as u64;
        uart.receive(chunk);
        driver.on_uart_interrupt(port, at(t));
    }
    t
}

/// Raise a break that completes the frame in progress
pub fn end_frame(driver: &TestDriver, uart: &MockUart, port: usize, t: u64) {
    uart.raise(InterruptMask::RX_BREAK);
    driver.on_uart_interrupt(port, at(t));
}

/// Take interrupts on `port` until the UART has nothing left pending
///
/// Stands in for the handler pending itself again after an in-band
/// condition is acknowledged.
pub fn service_until_idle(driver: &TestDriver, uart: &MockUart, port: usize, t: u64) {
    for _ in 0..64 {
        if !uart.wants_service() {
            return;
        }
        driver.on_uart_interrupt(port, at(t));
    }
    panic!("receive interrupts never settled");
}

/// Service transmit interrupts until the port stops asking for them
pub fn pump_transmit(driver: &TestDriver, uart: &MockUart, port: usize) {
    for _ in 0..1024 {
        if uart.armed().intersection(InterruptMask::TX_ALL).is_empty() {
            return;
        }
        driver.on_uart_interrupt(port, Instant::now());
    }
    panic!("transmit never completed");
}
