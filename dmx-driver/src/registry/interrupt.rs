//! Interrupt entry points
//!
//! Platform glue calls these from the UART and GPIO interrupt handlers,
//! passing the time sampled on entry. Neither blocks: each call drains what
//! the peripheral has pending and returns.
//!
//! The port lock is taken once per slot rather than around the drain loop,
//! so interrupts stay masked only for a single state machine step. Events
//! are published after the lock is released.

use dmx_core::{FillStep, LineEvent, Mode, PacketEvent};
use dmx_hal::{DmxUart, Edge, EdgeCapture, InterruptMask};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;

use super::driver::DmxDriver;
use super::port::{DriverInstance, Port, PortState};

/// Line conditions in the order they are applied after the FIFO is drained
const LINE_CONDITIONS: [(InterruptMask, LineEvent); 5] = [
    (InterruptMask::RX_FRAMING, LineEvent::FramingError),
    (InterruptMask::RX_OVERRUN, LineEvent::Overrun),
    (InterruptMask::RX_BREAK, LineEvent::Break),
    (InterruptMask::RX_MARK, LineEvent::MarkAfterBreak),
    (InterruptMask::RX_TIMEOUT, LineEvent::IdleTimeout),
];

/// Run `f` on the port's UART and instance if it is installed in `mode`
fn with_mode<M, U, C, R>(
    p: &Port<M, U, C>,
    mode: Mode,
    f: impl FnOnce(&mut U, &mut DriverInstance) -> Option<R>,
) -> Option<R>
where
    M: RawMutex,
    U: DmxUart,
{
    p.state.lock(|cell| {
        let mut st = cell.borrow_mut();
        let PortState { hw, instance } = &mut *st;
        let uart = hw.uart.as_mut()?;
        let inst = instance.as_mut().filter(|inst| inst.mode == mode)?;
        f(uart, inst)
    })
}

fn publish<M: RawMutex, U, C>(port: usize, p: &Port<M, U, C>, event: Option<PacketEvent>) {
    if let Some(event) = event {
        if !p.events.push(event) {
            warn!("dmx port {}: event queue full, packet dropped", port);
        }
    }
}

fn service_receive<M: RawMutex, U: DmxUart, C>(
    port: usize,
    p: &Port<M, U, C>,
    pending: InterruptMask,
    now: Instant,
) {
    // Slots already in the FIFO precede any condition raised alongside them
    if pending.contains(InterruptMask::RX_DATA) {
        while let Some(event) = with_mode(p, Mode::Receive, |uart, inst| {
            let byte = uart.read_byte()?;
            Some(
                inst.receiver
                    .handle(LineEvent::Slot(byte), now, &mut inst.buffers),
            )
        }) {
            publish(port, p, event);
        }
    }

    for (mask, line_event) in LINE_CONDITIONS {
        if !pending.contains(mask) {
            continue;
        }
        // A break also violates the stop bit; report it once, as a break
        if line_event == LineEvent::FramingError && pending.contains(InterruptMask::RX_BREAK) {
            continue;
        }
        let event = with_mode(p, Mode::Receive, |_, inst| {
            Some(inst.receiver.handle(line_event, now, &mut inst.buffers))
        });
        publish(port, p, event.flatten());
    }
}

/// Returns `true` when the frame in flight has fully left the line
fn service_transmit<M: RawMutex, U: DmxUart, C>(p: &Port<M, U, C>, pending: InterruptMask) -> bool {
    if pending.contains(InterruptMask::TX_READY) {
        while let Some(FillStep::Queued) = with_mode(p, Mode::Transmit, |uart, inst| {
            let step = inst
                .transmitter
                .fill_one(&mut inst.buffers, |byte| uart.write_byte(byte));
            if step == FillStep::Complete {
                uart.disable_interrupts(InterruptMask::TX_READY);
                uart.enable_interrupts(InterruptMask::TX_DONE);
            }
            Some(step)
        }) {}
    }

    pending.contains(InterruptMask::TX_DONE)
        && with_mode(p, Mode::Transmit, |uart, inst| {
            let done = inst.transmitter.finish();
            if done {
                uart.disable_interrupts(InterruptMask::TX_DONE);
            }
            Some(done)
        })
        .unwrap_or(false)
}

impl<M, U, C, const N: usize> DmxDriver<M, U, C, N>
where
    M: RawMutex,
    U: DmxUart,
    C: EdgeCapture,
{
    /// UART interrupt handler body for `port`
    pub fn on_uart_interrupt(&self, port: usize, now: Instant) {
        let Ok(p) = self.port(port) else {
            return;
        };

        let acknowledged = p.state.lock(|cell| {
            let mut st = cell.borrow_mut();
            let PortState { hw, instance } = &mut *st;
            let uart = hw.uart.as_mut()?;

            let pending = uart.pending_interrupts();
            uart.clear_interrupts(pending);

            match instance.as_ref() {
                Some(inst) => Some((inst.mode, pending)),
                None => {
                    // Nothing installed to consume it; keep the line quiet
                    uart.disable_interrupts(InterruptMask::ALL);
                    None
                }
            }
        });
        let Some((mode, pending)) = acknowledged else {
            return;
        };

        match mode {
            Mode::Receive => service_receive(port, p, pending, now),
            Mode::Transmit => {
                if service_transmit(p, pending) && !p.tx_done.release() {
                    warn!("dmx port {}: spurious transmit completion", port);
                }
            }
        }
    }

    /// Capture pin interrupt handler body for `port`
    pub fn on_capture_edge(&self, port: usize, edge: Edge, now: Instant) {
        let Ok(p) = self.port(port) else {
            return;
        };

        p.state.lock(|cell| {
            let mut st = cell.borrow_mut();
            if let Some(inst) = st.instance.as_mut() {
                if inst.mode == Mode::Receive {
                    inst.receiver.on_edge(edge == Edge::Rising, now);
                }
            }
        });
    }
}
