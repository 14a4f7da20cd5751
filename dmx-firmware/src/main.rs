//! DMX512 timing monitor
//!
//! Receives on UART1, measures break and mark-after-break on an auxiliary
//! pin, and logs packet metadata once per second over RTT. The port is
//! uninstalled when the signal is lost.
//!
//! Edge forwarding runs on an interrupt-mode executor at the highest
//! priority so capture timestamps are taken in interrupt context.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;
use {defmt_rtt as _, panic_probe as _};

use dmx_driver::{DmxDriver, DriverConfig, PinAssignment};
use dmx_hal_rp2040::{CaptureLine, Rp2040Uart, UartId};

mod board;
mod tasks;

pub type Uart = Rp2040Uart<Output<'static>>;
pub type Driver = DmxDriver<CriticalSectionRawMutex, Uart, &'static CaptureLine, 1>;

/// Driver registry shared by tasks and interrupt handlers
pub static DMX: Driver = DmxDriver::new();

static CAPTURE: CaptureLine = CaptureLine::new(board::CAPTURE_PIN);

static EXECUTOR_CAPTURE: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
fn UART1_IRQ() {
    DMX.on_uart_interrupt(board::DMX_PORT, Instant::now());
}

#[interrupt]
unsafe fn SWI_IRQ_0() {
    unsafe { EXECUTOR_CAPTURE.on_interrupt() }
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("DMX timing monitor starting...");

    let p = embassy_rp::init(Default::default());

    let enable = Output::new(p.PIN_6, Level::Low);
    let uart = Rp2040Uart::new(UartId::Uart1, enable, board::ENABLE_PIN);
    let capture_input = Input::new(p.PIN_7, Pull::Up);

    if let Err(e) = DMX.attach(board::DMX_PORT, uart, Some(&CAPTURE)) {
        error!("attach failed: {}", e);
        return;
    }
    let pins = PinAssignment::new(board::TX_PIN, board::RX_PIN, board::ENABLE_PIN);
    if let Err(e) = DMX.configure_pins(board::DMX_PORT, pins) {
        error!("pin routing failed: {}", e);
        return;
    }

    let config = DriverConfig {
        isr_priority: board::DMX_IRQ_PRIORITY,
        ..DriverConfig::default()
    };
    let events = match DMX.install(board::DMX_PORT, config) {
        Ok(events) => events,
        Err(e) => {
            error!("install failed: {}", e);
            return;
        }
    };

    if let Err(e) = DMX.enable_timing_capture(board::DMX_PORT, board::CAPTURE_PIN) {
        warn!("timing capture unavailable: {}", e);
    }

    interrupt::SWI_IRQ_0.set_priority(Priority::P0);
    let capture_spawner = EXECUTOR_CAPTURE.start(interrupt::SWI_IRQ_0);
    capture_spawner
        .spawn(tasks::edge_task(&CAPTURE, capture_input))
        .unwrap();
    spawner.spawn(tasks::monitor_task(events)).unwrap();

    info!("All tasks spawned, firmware running");
}
