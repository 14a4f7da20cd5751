//! UART pin routing
//!
//! Each RP2040 GPIO can carry one fixed UART signal. This module maps pin
//! numbers to the peripheral and signal they can serve and switches a pin
//! over to the UART function.

use embassy_rp::pac;

/// Number of user GPIOs on RP2040
pub const GPIO_COUNT: u8 = 30;

/// IO_BANK0 function select for UART signals
const FUNCSEL_UART: u8 = 2;

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

/// UART signal a pin can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartSignal {
    Tx,
    Rx,
}

/// Peripheral and signal available on `gpio`
///
/// Only TX and RX are considered; the CTS/RTS alternates are unused on a
/// DMX line.
pub fn uart_signal(gpio: u8) -> Option<(UartId, UartSignal)> {
    if gpio >= GPIO_COUNT {
        return None;
    }
    // Banks of four alternate U0, U1, U1, U0, ...
    let id = if ((gpio + 4) / 8) % 2 == 0 {
        UartId::Uart0
    } else {
        UartId::Uart1
    };
    match gpio % 4 {
        0 => Some((id, UartSignal::Tx)),
        1 => Some((id, UartSignal::Rx)),
        _ => None,
    }
}

/// Check that `gpio` can carry `signal` for `id`
pub fn can_route(id: UartId, signal: UartSignal, gpio: u8) -> bool {
    uart_signal(gpio) == Some((id, signal))
}

/// Hand `gpio` to its UART function
///
/// The receive pin gets a pull-up so an unpowered transceiver reads as
/// mark instead of a permanent break.
pub(crate) fn route_uart(gpio: u8, signal: UartSignal) {
    let n = gpio as usize;
    pac::PADS_BANK0.gpio(n).write(|w| {
        w.set_ie(signal == UartSignal::Rx);
        w.set_od(false);
        w.set_pue(signal == UartSignal::Rx);
        w.set_pde(false);
    });
    pac::IO_BANK0.gpio(n).ctrl().write(|w| w.set_funcsel(FUNCSEL_UART));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uart_signal_table() {
        assert_eq!(uart_signal(0), Some((UartId::Uart0, UartSignal::Tx)));
        assert_eq!(uart_signal(1), Some((UartId::Uart0, UartSignal::Rx)));
        assert_eq!(uart_signal(4), Some((UartId::Uart1, UartSignal::Tx)));
        assert_eq!(uart_signal(5), Some((UartId::Uart1, UartSignal::Rx)));
        assert_eq!(uart_signal(8), Some((UartId::Uart1, UartSignal::Tx)));
        assert_eq!(uart_signal(12), Some((UartId::Uart0, UartSignal::Tx)));
        assert_eq!(uart_signal(16), Some((UartId::Uart0, UartSignal::Tx)));
        assert_eq!(uart_signal(21), Some((UartId::Uart1, UartSignal::Rx)));
        assert_eq!(uart_signal(29), Some((UartId::Uart0, UartSignal::Rx)));

        // CTS/RTS positions and out-of-range pins
        assert_eq!(uart_signal(2), None);
        assert_eq!(uart_signal(30), None);
    }

    #[test]
    fn test_can_route() {
        assert!(can_route(UartId::Uart1, UartSignal::Tx, 8));
        assert!(!can_route(UartId::Uart0, UartSignal::Tx, 8));
        assert!(!can_route(UartId::Uart1, UartSignal::Rx, 8));
    }
}
