//! Edge capture on the timing-analysis pin
//!
//! Edge interrupts on RP2040 are consumed through an async
//! [`Input`](embassy_rp::gpio::Input), so the capture is split in two.
//! [`CaptureLine`] lives in a `static` and is handed to the driver as the
//! [`EdgeCapture`] implementation; a firmware task owns the input and
//! calls [`CaptureLine::run`], which forwards edges only while armed.
//!
//! `IO_IRQ_BANK0` belongs to the embassy GPIO driver, so the task is meant
//! to run on an interrupt-mode executor above every other priority. The
//! timestamp is then taken in interrupt context a fixed few cycles after
//! the pin interrupt.

use core::sync::atomic::{AtomicBool, Ordering};

use dmx_hal::{Edge, EdgeCapture, HalError};
use embassy_rp::gpio::Input;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Instant;

/// Arming state for one capture pin
pub struct CaptureLine {
    pin: u8,
    armed: AtomicBool,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl CaptureLine {
    /// Capture line for GPIO `pin`
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            armed: AtomicBool::new(false),
            wake: Signal::new(),
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Forward edges on `input` to `on_edge` while the line is armed
    ///
    /// Parks on a signal while disarmed so the pin interrupt stays quiet.
    /// Waits alternate between the two levels, so the reported direction
    /// is the one waited for and never a level read back after the fact.
    pub async fn run<F>(&self, input: &mut Input<'_>, mut on_edge: F) -> !
    where
        F: FnMut(Edge, Instant),
    {
        loop {
            if !self.armed.load(Ordering::Acquire) {
                self.wake.wait().await;
                continue;
            }

            let expected = Edge::leaving(input.is_high());
            match expected {
                Edge::Falling => input.wait_for_low().await,
                Edge::Rising => input.wait_for_high().await,
            }
            let now = Instant::now();
            if self.armed.load(Ordering::Acquire) {
                on_edge(expected, now);
            }
        }
    }
}

impl EdgeCapture for &'static CaptureLine {
    fn arm(&mut self, pin: u8) -> Result<(), HalError> {
        if pin != self.pin {
            return Err(HalError::InvalidPin);
        }
        self.armed.store(true, Ordering::Release);
        self.wake.signal(());
        Ok(())
    }

    fn disarm(&mut self) {
        self.armed.store(false, Ordering::Release);
    }

    fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}
