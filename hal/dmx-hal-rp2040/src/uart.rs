//! PL011 UART driven for DMX512
//!
//! The PL011 reports line errors in-band: every byte popped from the data
//! register carries its own break, framing and overrun flags. Errors are
//! therefore found while draining the FIFO. The erroneous byte is dropped,
//! the condition is held, and draining stops so no slot after it can be
//! attributed to the wrong packet. While a condition is held it is the
//! only thing reported pending, and clearing it pends the interrupt again
//! so the slots behind it are drained in order.
//!
//! The peripheral has no mark-after-break or line-idle interrupt, so
//! `RX_MARK` and `RX_TIMEOUT` are never raised. The receive timeout
//! interrupt only means "bytes are waiting" and is folded into `RX_DATA`.
//!
//! There is no transmit-complete interrupt either. While `TX_DONE` is
//! armed the handler checks the FIFO and shift register on each entry and
//! pends itself again until both are empty.

use dmx_hal::{DmxUart, HalError, InterruptMask, StopBits, UartConfig};
use embassy_rp::interrupt::{Interrupt, InterruptExt, Priority};
use embassy_rp::pac;
use embedded_hal::digital::OutputPin;

use crate::pins::{can_route, route_uart, UartId, UartSignal};

// UARTIMSC / UARTMIS / UARTICR bit positions
const PL011_RX: u32 = 1 << 4;
const PL011_TX: u32 = 1 << 5;
const PL011_RT: u32 = 1 << 6;
const PL011_FE: u32 = 1 << 7;
const PL011_BE: u32 = 1 << 9;
const PL011_OE: u32 = 1 << 10;

/// Data word length select for eight bits
const WLEN_8: u8 = 0b11;

/// PL011 interrupt sources that serve `mask`
pub fn pl011_sources(mask: InterruptMask) -> u32 {
    let mut bits = 0;
    if mask.contains(InterruptMask::RX_DATA) {
        bits |= PL011_RX | PL011_RT;
    }
    if mask.contains(InterruptMask::RX_BREAK) {
        bits |= PL011_BE;
    }
    if mask.contains(InterruptMask::RX_FRAMING) {
        bits |= PL011_FE;
    }
    if mask.contains(InterruptMask::RX_OVERRUN) {
        bits |= PL011_OE;
    }
    if mask.intersects(InterruptMask::TX_READY | InterruptMask::TX_DONE) {
        bits |= PL011_TX;
    }
    bits
}

/// Integer and fractional baud divisors for `baudrate` from `clk_peri`
///
/// Fails if the clock is stopped or the rate lands more than 2% off.
pub fn baud_divisors(clk_peri: u32, baudrate: u32) -> Result<(u32, u32), HalError> {
    if clk_peri == 0 {
        return Err(HalError::Clock);
    }
    if baudrate == 0 {
        return Err(HalError::BaudRate);
    }

    let div = (8 * clk_peri as u64) / baudrate as u64;
    let ibrd = (div >> 7) as u32;
    let fbrd = (((div & 0x7f) + 1) / 2) as u32;
    if ibrd == 0 || ibrd >= 65535 {
        return Err(HalError::BaudRate);
    }

    let actual = (4 * clk_peri as u64) / (64 * ibrd as u64 + fbrd as u64);
    if actual.abs_diff(baudrate as u64) * 50 > baudrate as u64 {
        return Err(HalError::BaudRate);
    }
    Ok((ibrd, fbrd))
}

/// One PL011 UART with its transceiver enable line
///
/// `E` is the GPIO driving the transceiver's DE/RE pair.
pub struct Rp2040Uart<E: OutputPin> {
    id: UartId,
    enable: E,
    enable_pin: u8,
    armed: InterruptMask,
    /// Error conditions found in the FIFO and not yet reported
    held: InterruptMask,
}

impl<E: OutputPin> Rp2040Uart<E> {
    /// Wrap UART `id`; `enable` is the already-configured output on GPIO
    /// `enable_pin`
    pub fn new(id: UartId, enable: E, enable_pin: u8) -> Self {
        Self {
            id,
            enable,
            enable_pin,
            armed: InterruptMask::NONE,
            held: InterruptMask::NONE,
        }
    }

    pub fn id(&self) -> UartId {
        self.id
    }

    fn regs(&self) -> pac::uart::Uart {
        match self.id {
            UartId::Uart0 => pac::UART0,
            UartId::Uart1 => pac::UART1,
        }
    }

    fn irq(&self) -> Interrupt {
        match self.id {
            UartId::Uart0 => Interrupt::UART0_IRQ,
            UartId::Uart1 => Interrupt::UART1_IRQ,
        }
    }

    fn unreset(&self) {
        pac::RESETS.reset().modify(|w| match self.id {
            UartId::Uart0 => w.set_uart0(false),
            UartId::Uart1 => w.set_uart1(false),
        });
        loop {
            let done = pac::RESETS.reset_done().read();
            let ready = match self.id {
                UartId::Uart0 => done.uart0(),
                UartId::Uart1 => done.uart1(),
            };
            if ready {
                break;
            }
        }
    }

    /// Check if the last stop bit has left the line
    fn is_idle(&self) -> bool {
        let fr = self.regs().uartfr().read();
        fr.txfe() && !fr.busy()
    }

    /// Wait for the shift register to empty
    fn wait_idle(&self) {
        while !self.is_idle() {
            cortex_m::asm::nop();
        }
    }

    fn write_imsc(&self) {
        self.regs()
            .uartimsc()
            .write_value(pac::uart::regs::Uartimsc(pl011_sources(self.armed)));
    }
}

impl<E: OutputPin> DmxUart for Rp2040Uart<E> {
    fn enable(&mut self, config: &UartConfig) -> Result<(), HalError> {
        let (ibrd, fbrd) = baud_divisors(embassy_rp::clocks::clk_peri_freq(), config.baudrate)?;
        self.unreset();

        let r = self.regs();
        r.uartcr().write(|w| w.set_uarten(false));
        r.uartibrd().write_value(pac::uart::regs::Uartibrd(ibrd));
        r.uartfbrd().write_value(pac::uart::regs::Uartfbrd(fbrd));
        // The LCR_H write latches the divisors
        r.uartlcr_h().write(|w| {
            w.set_wlen(WLEN_8);
            w.set_pen(false);
            w.set_stp2(config.stop_bits == StopBits::Two);
            w.set_fen(true);
            w.set_brk(false);
        });
        // Lowest trigger levels: an interrupt per four slots either way
        r.uartifls().write(|w| {
            w.set_rxiflsel(0);
            w.set_txiflsel(0);
        });
        self.write_imsc();
        r.uartcr().write(|w| {
            w.set_uarten(true);
            w.set_rxe(true);
            w.set_txe(true);
        });
        Ok(())
    }

    fn disable(&mut self) {
        let r = self.regs();
        r.uartimsc().write_value(pac::uart::regs::Uartimsc(0));
        r.uartcr().write(|w| w.set_uarten(false));
        self.held = InterruptMask::NONE;
    }

    fn set_pins(
        &mut self,
        tx: Option<u8>,
        rx: Option<u8>,
        enable: Option<u8>,
    ) -> Result<(), HalError> {
        if let Some(pin) = tx {
            if !can_route(self.id, UartSignal::Tx, pin) {
                return Err(HalError::InvalidPin);
            }
        }
        if let Some(pin) = rx {
            if !can_route(self.id, UartSignal::Rx, pin) {
                return Err(HalError::InvalidPin);
            }
        }
        // The enable line is owned as a typed output and cannot move
        if enable.is_some_and(|pin| pin != self.enable_pin) {
            return Err(HalError::InvalidPin);
        }

        if let Some(pin) = tx {
            route_uart(pin, UartSignal::Tx);
        }
        if let Some(pin) = rx {
            route_uart(pin, UartSignal::Rx);
        }
        Ok(())
    }

    fn attach_interrupt(&mut self, priority: u8) -> Result<(), HalError> {
        let priority = match priority {
            0 => Priority::P0,
            1 => Priority::P1,
            2 => Priority::P2,
            3 => Priority::P3,
            _ => return Err(HalError::InterruptUnavailable),
        };
        let irq = self.irq();
        irq.set_priority(priority);
        irq.unpend();
        // SAFETY: the firmware defines the handler for this vector and it
        // only takes the driver's critical-section mutex.
        #[allow(unsafe_code)]
        unsafe {
            irq.enable()
        };
        Ok(())
    }

    fn detach_interrupt(&mut self) {
        let irq = self.irq();
        irq.disable();
        irq.unpend();
    }

    fn enable_interrupts(&mut self, mask: InterruptMask) {
        self.armed |= mask;
        self.write_imsc();

        // The TX level interrupt fires on crossing the threshold, not on
        // sitting below it
        if mask.intersects(InterruptMask::TX_ALL) {
            self.irq().pend();
        }
    }

    fn disable_interrupts(&mut self, mask: InterruptMask) {
        self.armed = self.armed.without(mask);
        self.write_imsc();
    }

    fn pending_interrupts(&mut self) -> InterruptMask {
        // A held condition sits between the slots before and after it
        if !self.held.is_empty() {
            let held = self.held.intersection(self.armed);
            if !held.is_empty() {
                return held;
            }
            self.held = InterruptMask::NONE;
        }

        let r = self.regs();
        let mis = r.uartmis().read().0;
        let fr = r.uartfr().read();
        let mut pending = InterruptMask::NONE;

        if mis & (PL011_RX | PL011_RT | PL011_FE | PL011_BE | PL011_OE) != 0 || !fr.rxfe() {
            pending |= InterruptMask::RX_DATA;
        }
        if !fr.txff() {
            pending |= InterruptMask::TX_READY;
        }
        if self.armed.contains(InterruptMask::TX_DONE) {
            if self.is_idle() {
                pending |= InterruptMask::TX_DONE;
            } else {
                self.irq().pend();
            }
        }
        pending.intersection(self.armed)
    }

    fn clear_interrupts(&mut self, mask: InterruptMask) {
        if self.held.intersects(mask) {
            self.held = self.held.without(mask);
            if self.held.is_empty() {
                self.irq().pend();
            }
        }
        let mut bits = pl011_sources(mask);
        if mask.intersects(InterruptMask::RX_ALL) {
            bits |= PL011_FE | PL011_BE | PL011_OE;
        }
        self.regs()
            .uarticr()
            .write_value(pac::uart::regs::Uarticr(bits));
    }

    fn read_byte(&mut self) -> Option<u8> {
        if !self.held.is_empty() {
            return None;
        }
        let r = self.regs();
        if r.uartfr().read().rxfe() {
            return None;
        }

        let dr = r.uartdr().read();
        if dr.be() {
            self.held |= InterruptMask::RX_BREAK;
        } else if dr.fe() {
            self.held |= InterruptMask::RX_FRAMING;
        }
        if dr.oe() {
            self.held |= InterruptMask::RX_OVERRUN;
        }
        if !self.held.is_empty() {
            self.irq().pend();
            return None;
        }
        Some(dr.data())
    }

    fn write_byte(&mut self, byte: u8) -> bool {
        let r = self.regs();
        if r.uartfr().read().txff() {
            return false;
        }
        r.uartdr().write(|w| w.set_data(byte));
        true
    }

    fn set_break(&mut self, active: bool) {
        if active {
            // Holding the line low mid-slot would corrupt it
            self.wait_idle();
        }
        self.regs().uartlcr_h().modify(|w| w.set_brk(active));
    }

    fn set_transmit_enable(&mut self, transmit: bool) {
        if transmit {
            self.enable.set_high().ok();
        } else {
            self.enable.set_low().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dmx_divisors_from_125mhz() {
        assert_eq!(baud_divisors(125_000_000, 250_000), Ok((31, 16)));
    }

    #[test]
    fn test_divisor_failures() {
        assert_eq!(baud_divisors(0, 250_000), Err(HalError::Clock));
        assert_eq!(baud_divisors(125_000_000, 0), Err(HalError::BaudRate));
        assert_eq!(baud_divisors(1_000, 250_000), Err(HalError::BaudRate));
    }

    #[test]
    fn test_source_mapping() {
        assert_eq!(
            pl011_sources(InterruptMask::RX_DATA),
            PL011_RX | PL011_RT
        );
        assert_eq!(pl011_sources(InterruptMask::TX_DONE), PL011_TX);
        // No hardware source for these
        assert_eq!(
            pl011_sources(InterruptMask::RX_MARK | InterruptMask::RX_TIMEOUT),
            0
        );
    }
}
