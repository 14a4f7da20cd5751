//! Capture pin forwarding
//!
//! Feeds edges on the timing-analysis pin into the driver. Spawned on the
//! interrupt-mode capture executor, above the UART interrupt.

use dmx_hal_rp2040::CaptureLine;
use embassy_rp::gpio::Input;

use crate::{board, DMX};

#[embassy_executor::task]
pub async fn edge_task(line: &'static CaptureLine, mut input: Input<'static>) {
    defmt::info!("Edge task started on GPIO{}", line.pin());
    line.run(&mut input, |edge, now| {
        DMX.on_capture_edge(board::DMX_PORT, edge, now)
    })
    .await
}
