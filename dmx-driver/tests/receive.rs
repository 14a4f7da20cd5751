mod common;

use common::{at, end_frame, receive_frame, service_until_idle, setup};
use dmx_core::{LinkMonitor, LinkTransition};
use dmx_driver::{DmxError, DriverConfig, PacketStatus, Timing};
use dmx_hal::{Edge, InterruptMask};
use embassy_futures::block_on;
use embassy_time::Duration;

fn frame(len: usize) -> Vec<u8> {
    let mut data = vec![0x00];
    data.extend((1..len).map(|i| (i * 7) as u8));
    data
}

#[test]
fn test_well_formed_packet() {
    let (driver, uarts, _) = setup();
    let rx = driver.install(0, DriverConfig::default()).unwrap();

    let data = frame(25);
    let t = receive_frame(&driver, &uarts[0], 0, 1_000, &data);
    assert_eq!(rx.try_receive(), Ok(None));
    end_frame(&driver, &uarts[0], 0, t + 200);

    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.status, PacketStatus::Ok);
    assert_eq!(event.size, 24);
    assert_eq!(event.start_code, Some(0x00));
    assert_eq!(event.duration, Duration::from_micros(t + 200 - 1_000));
    assert_eq!(event.timing, None);
    assert!(!event.truncated);

    let mut dest = [0u8; 513];
    let n = driver.read_packet(0, &mut dest).unwrap();
    assert_eq!(&dest[..n], data.as_slice());
}

#[test]
fn test_full_universe() {
    let (driver, uarts, _) = setup();
    let rx = driver.install(0, DriverConfig::default()).unwrap();

    let data = frame(513);
    let t = receive_frame(&driver, &uarts[0], 0, 0, &data);
    end_frame(&driver, &uarts[0], 0, t + 100);

    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.size, 512);
    assert_eq!(event.len(), 513);

    let mut dest = [0u8; 513];
    assert_eq!(driver.read_packet(0, &mut dest).unwrap(), 513);
    assert_eq!(dest.as_slice(), data.as_slice());
}

#[test]
fn test_break_mid_packet_starts_fresh() {
    let (driver, uarts, _) = setup();
    let config = DriverConfig {
        queue_capacity: 4,
        ..DriverConfig::default()
    };
    let rx = driver.install(0, config).unwrap();

    let t = receive_frame(&driver, &uarts[0], 0, 0, &[0x00, 1, 2]);
    // The next break cuts the packet short
    let t = receive_frame(&driver, &uarts[0], 0, t + 100, &[0x00, 9, 9, 9, 9]);
    end_frame(&driver, &uarts[0], 0, t + 100);

    let first = rx.try_receive().unwrap().unwrap();
    assert_eq!(first.status, PacketStatus::Ok);
    assert_eq!(first.size, 2);

    let second = rx.try_receive().unwrap().unwrap();
    assert_eq!(second.status, PacketStatus::Ok);
    assert_eq!(second.size, 4);
    assert_eq!(rx.dropped(), 0);

    let mut dest = [0u8; 8];
    let n = driver.read_packet(0, &mut dest).unwrap();
    assert_eq!(&dest[..n], &[0x00, 9, 9, 9, 9]);
}

#[test]
fn test_break_flagged_in_fifo_keeps_slot_order() {
    let (driver, uarts, _) = setup();
    let config = DriverConfig {
        queue_capacity: 4,
        ..DriverConfig::default()
    };
    let rx = driver.install(0, config).unwrap();
    let uart = &uarts[0];

    uart.receive_break_in_fifo();
    uart.receive(&[0x00, 1, 2]);
    service_until_idle(&driver, uart, 0, 1_000);
    assert_eq!(rx.try_receive(), Ok(None));

    // The break behind the first packet's slots completes that packet
    uart.receive_break_in_fifo();
    uart.receive(&[0x00, 7, 8]);
    service_until_idle(&driver, uart, 0, 24_000);

    let first = rx.try_receive().unwrap().unwrap();
    assert_eq!(first.status, PacketStatus::Ok);
    assert_eq!(first.size, 2);
    assert_eq!(first.start_code, Some(0x00));
    assert_eq!(first.duration, Duration::from_micros(23_000));
    let mut dest = [0u8; 8];
    let n = driver.read_packet(0, &mut dest).unwrap();
    assert_eq!(&dest[..n], &[0x00, 1, 2]);

    uart.receive_break_in_fifo();
    service_until_idle(&driver, uart, 0, 47_000);

    let second = rx.try_receive().unwrap().unwrap();
    assert_eq!(second.size, 2);
    let n = driver.read_packet(0, &mut dest).unwrap();
    assert_eq!(&dest[..n], &[0x00, 7, 8]);
    assert_eq!(rx.try_receive(), Ok(None));
    assert_eq!(rx.dropped(), 0);
}

#[test]
fn test_overrun_then_clean_packet() {
    let (driver, uarts, _) = setup();
    let rx = driver.install(0, DriverConfig::default()).unwrap();
    let uart = &uarts[0];

    let t = receive_frame(&driver, uart, 0, 0, &[0x00, 1, 2]);
    uart.receive(&[3]);
    uart.raise(InterruptMask::RX_OVERRUN);
    driver.on_uart_interrupt(0, at(t + 44));

    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.status, PacketStatus::Overrun);
    assert_eq!(event.size, 3);

    // Slots after the error are ignored until the next break
    uart.receive(&[4, 5]);
    driver.on_uart_interrupt(0, at(t + 200));
    assert_eq!(rx.try_receive(), Ok(None));

    let t = receive_frame(&driver, uart, 0, t + 1_000, &[0x00, 42]);
    end_frame(&driver, uart, 0, t + 100);

    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.status, PacketStatus::Ok);
    assert_eq!(event.size, 1);
    let mut dest = [0u8; 4];
    let n = driver.read_packet(0, &mut dest).unwrap();
    assert_eq!(&dest[..n], &[0x00, 42]);
}

#[test]
fn test_framing_error_mid_packet() {
    let (driver, uarts, _) = setup();
    let rx = driver.install(0, DriverConfig::default()).unwrap();

    let t = receive_frame(&driver, &uarts[0], 0, 0, &[0x00, 1, 2, 3]);
    uarts[0].raise(InterruptMask::RX_FRAMING);
    driver.on_uart_interrupt(0, at(t + 44));

    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.status, PacketStatus::FramingError);
    assert_eq!(event.size, 3);
}

#[test]
fn test_break_reported_with_framing_error_is_one_break() {
    let (driver, uarts, _) = setup();
    let rx = driver.install(0, DriverConfig::default()).unwrap();

    let t = receive_frame(&driver, &uarts[0], 0, 0, &[0x00, 1]);
    uarts[0].raise(InterruptMask::RX_BREAK | InterruptMask::RX_FRAMING);
    driver.on_uart_interrupt(0, at(t + 100));

    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.status, PacketStatus::Ok);
    assert_eq!(rx.try_receive(), Ok(None));
}

#[test]
fn test_overflow_truncates_without_error() {
    let (driver, uarts, _) = setup();
    let config = DriverConfig {
        buffer_capacity: 24,
        ..DriverConfig::default()
    };
    let rx = driver.install(0, config).unwrap();

    let data = frame(40);
    let t = receive_frame(&driver, &uarts[0], 0, 0, &data);
    end_frame(&driver, &uarts[0], 0, t + 100);

    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.status, PacketStatus::Ok);
    assert!(event.truncated);
    assert_eq!(event.size, 23);

    let mut dest = [0u8; 513];
    let n = driver.read_packet(0, &mut dest).unwrap();
    assert_eq!(&dest[..n], &data[..24]);
}

#[test]
fn test_timing_capture() {
    let (driver, uarts, captures) = setup();
    let rx = driver.install(0, DriverConfig::default()).unwrap();
    let uart = &uarts[0];

    driver.enable_timing_capture(0, 5).unwrap();
    driver.enable_timing_capture(0, 5).unwrap();
    assert_eq!(captures[0].armed_pin(), Some(5));
    assert_eq!(captures[0].arm_calls(), 1);

    driver.on_capture_edge(0, Edge::Falling, at(1_000));
    uart.raise(InterruptMask::RX_BREAK);
    driver.on_uart_interrupt(0, at(1_100));
    driver.on_capture_edge(0, Edge::Rising, at(1_176));
    uart.raise(InterruptMask::RX_MARK);
    driver.on_uart_interrupt(0, at(1_176));
    driver.on_capture_edge(0, Edge::Falling, at(1_188));
    driver.on_capture_edge(0, Edge::Rising, at(1_192));
    uart.receive(&[0x00, 1, 2]);
    driver.on_uart_interrupt(0, at(1_320));

    // Slot bits toggle the pin too
    driver.on_capture_edge(0, Edge::Falling, at(1_400));
    driver.on_capture_edge(0, Edge::Rising, at(1_404));

    end_frame(&driver, uart, 0, 25_000);
    let event = rx.try_receive().unwrap().unwrap();
    let timing = event.timing.unwrap();
    assert_eq!(
        timing,
        Timing {
            break_len: Duration::from_micros(176),
            mab_len: Duration::from_micros(12),
        }
    );
    assert!(timing.is_compliant());

    driver.disable_timing_capture(0).unwrap();
    assert_eq!(captures[0].armed_pin(), None);
    let t = receive_frame(&driver, uart, 0, 26_000, &[0x00, 1]);
    end_frame(&driver, uart, 0, t + 100);
    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.timing, None);
}

#[test]
fn test_timing_capture_enabled_mid_packet() {
    let (driver, uarts, _) = setup();
    let rx = driver.install(0, DriverConfig::default()).unwrap();

    let t = receive_frame(&driver, &uarts[0], 0, 0, &[0x00, 1, 2]);
    driver.enable_timing_capture(0, 5).unwrap();
    end_frame(&driver, &uarts[0], 0, t + 100);

    // No break was measured for the packet already in progress
    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.status, PacketStatus::Ok);
    assert_eq!(event.timing, None);
}

#[test]
fn test_queue_full_drops_newest() {
    let (driver, uarts, _) = setup();
    let config = DriverConfig {
        queue_capacity: 2,
        ..DriverConfig::default()
    };
    let rx = driver.install(0, config).unwrap();

    let mut t = 0;
    for size in [2usize, 3, 4] {
        t = receive_frame(&driver, &uarts[0], 0, t + 100, &frame(size));
    }
    end_frame(&driver, &uarts[0], 0, t + 100);

    assert_eq!(rx.dropped(), 1);
    assert_eq!(rx.try_receive().unwrap().unwrap().size, 1);
    assert_eq!(rx.try_receive().unwrap().unwrap().size, 2);
    assert_eq!(rx.try_receive(), Ok(None));
}

#[test]
fn test_connection_lost_and_reconnect() {
    let (driver, uarts, _) = setup();
    let rx = driver.install(0, DriverConfig::default()).unwrap();
    let mut monitor = LinkMonitor::new();

    let t = receive_frame(&driver, &uarts[0], 0, 0, &frame(8));
    end_frame(&driver, &uarts[0], 0, t + 100);
    let event = block_on(rx.receive_timeout(Duration::from_millis(50))).unwrap();
    assert_eq!(monitor.on_event(&event), Some(LinkTransition::Connected));

    // Nothing arrives within the window
    let result = block_on(rx.receive_timeout(Duration::from_millis(20)));
    assert_eq!(result, Err(DmxError::Timeout));
    assert_eq!(monitor.on_receive_timeout(), Some(LinkTransition::Lost));

    let t = receive_frame(&driver, &uarts[0], 0, t + 30_000, &frame(8));
    end_frame(&driver, &uarts[0], 0, t + 100);
    let event = block_on(rx.receive_timeout(Duration::from_millis(50))).unwrap();
    assert_eq!(event.status, PacketStatus::Ok);
    assert_eq!(monitor.on_event(&event), Some(LinkTransition::Connected));
}

#[test]
fn test_slow_break_to_break_is_timeout_status() {
    let (driver, uarts, _) = setup();
    let rx = driver.install(0, DriverConfig::default()).unwrap();

    receive_frame(&driver, &uarts[0], 0, 0, &frame(4));
    end_frame(&driver, &uarts[0], 0, 1_300_000);

    let event = rx.try_receive().unwrap().unwrap();
    assert_eq!(event.status, PacketStatus::Timeout);
}

#[test]
fn test_ports_are_independent() {
    let (driver, uarts, _) = setup();
    let rx0 = driver.install(0, DriverConfig::default()).unwrap();
    let rx1 = driver.install(1, DriverConfig::default()).unwrap();

    let t = receive_frame(&driver, &uarts[1], 1, 0, &[0x00, 77]);
    end_frame(&driver, &uarts[1], 1, t + 100);

    assert_eq!(rx0.try_receive(), Ok(None));
    assert_eq!(rx1.try_receive().unwrap().unwrap().size, 1);
}
