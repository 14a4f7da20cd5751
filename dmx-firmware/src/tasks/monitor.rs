//! Consumer loop
//!
//! Waits on packet events with a deadline, tracks the link with a
//! [`LinkMonitor`], and prints one line of packet metadata per second while
//! connected. A missed deadline after the link was up counts as signal
//! loss and tears the port down.

use defmt::*;
use dmx_core::config::RX_PACKET_TIMEOUT_MS;
use dmx_core::{LinkMonitor, LinkTransition};
use dmx_driver::{DmxError, EventReceiver, PacketEvent};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant};

use crate::{board, DMX};

/// Slots shown in each report
const PREVIEW_SLOTS: usize = 4;

#[embassy_executor::task]
pub async fn monitor_task(events: EventReceiver<'static, CriticalSectionRawMutex>) {
    info!("Monitor task started");

    let deadline = Duration::from_millis(RX_PACKET_TIMEOUT_MS as u64);
    let mut link = LinkMonitor::new();

    loop {
        match events.receive_timeout(deadline).await {
            Ok(event) => {
                if link.on_event(&event) == Some(LinkTransition::Connected) {
                    info!("DMX is connected");
                }
                if !event.status.is_error() && link.should_report(Instant::now()) {
                    report(&event, &link, events.dropped());
                }
                if event.status.is_error() {
                    debug!("packet error: {}", event.status);
                }
            }
            Err(DmxError::Timeout) => {
                if link.on_receive_timeout() == Some(LinkTransition::Lost) {
                    warn!("DMX was disconnected");
                    break;
                }
            }
            Err(e) => {
                warn!("event stream ended: {}", e);
                break;
            }
        }
    }

    if let Err(e) = DMX.uninstall(board::DMX_PORT) {
        error!("uninstall failed: {}", e);
    }
    info!("Monitor task finished");
}

fn report(event: &PacketEvent, link: &LinkMonitor, dropped: u32) {
    let mut slots = [0u8; PREVIEW_SLOTS + 1];
    let copied = DMX.read_packet(board::DMX_PORT, &mut slots).unwrap_or(0);

    info!(
        "start code {=u8:02x}, {} slots, first slots {=[u8]:02x}, {} ok / {} errors, {} dropped",
        event.start_code.unwrap_or(0),
        event.size,
        slots.get(1..copied).unwrap_or(&[]),
        link.packets(),
        link.errors(),
        dropped
    );
    match event.timing {
        Some(timing) => info!(
            "break {} us, mark {} us{}",
            timing.break_len.as_micros(),
            timing.mab_len.as_micros(),
            if timing.is_compliant() { "" } else { " (below receive minimum)" }
        ),
        None => debug!("no timing for this packet"),
    }
}
