//! Receive frame state machine
//!
//! Runs in interrupt context. Every call is bounded: one line event, at most
//! one slot written and at most one packet event produced.

use embassy_time::{Duration, Instant};

use crate::buffer::DoubleBuffer;
use crate::config::RX_PACKET_TIMEOUT_MS;
use crate::packet::{PacketEvent, PacketStatus, Timing};
use crate::state::{LineEvent, RxState};
use crate::timing::EdgeTiming;

/// Receive state for one port
#[derive(Debug, Clone, Default)]
pub struct Receiver {
    state: RxState,
    /// When the current packet's break was reported
    packet_start: Option<Instant>,
    /// First slot of the current packet
    start_code: Option<u8>,
    /// Slots dropped because the buffer was full
    truncated: bool,
    /// Edge capture, present while timing analysis is enabled
    edges: Option<EdgeTiming>,
    /// Timing latched when the start code arrived
    packet_timing: Option<Timing>,
}

impl Receiver {
    /// Create a receiver waiting for the first break
    pub fn new() -> Self {
        Self::default()
    }

    /// Current receive state
    pub fn state(&self) -> RxState {
        self.state
    }

    /// Drop any packet in progress and wait for the next break
    pub fn reset(&mut self) {
        self.state = RxState::WaitBreak;
        self.packet_start = None;
        self.start_code = None;
        self.truncated = false;
        self.packet_timing = None;
    }

    /// Start edge timing analysis
    ///
    /// Returns `false` if it was already running.
    pub fn enable_timing(&mut self) -> bool {
        if self.edges.is_some() {
            return false;
        }
        self.edges = Some(EdgeTiming::new());
        true
    }

    /// Stop edge timing analysis
    pub fn disable_timing(&mut self) {
        self.edges = None;
        self.packet_timing = None;
    }

    /// Check if edge timing analysis is running
    pub fn timing_enabled(&self) -> bool {
        self.edges.is_some()
    }

    /// Feed an edge from the capture pin
    pub fn on_edge(&mut self, rising: bool, now: Instant) {
        if let Some(edges) = self.edges.as_mut() {
            if rising {
                edges.on_rising_edge(now);
            } else {
                edges.on_falling_edge(now);
            }
        }
    }

    /// Process one line event
    ///
    /// Returns the event for the packet this line event completed, if any.
    pub fn handle(
        &mut self,
        event: LineEvent,
        now: Instant,
        buffers: &mut DoubleBuffer,
    ) -> Option<PacketEvent> {
        let mut status = self.state.completion(event);
        let new_break = self.state.starts_break(event);

        if new_break && status == Some(PacketStatus::Ok) && self.break_to_break_exceeded(now) {
            status = Some(PacketStatus::Timeout);
        }

        let completed = status.map(|status| self.finish(status, now, buffers));

        if new_break {
            self.begin(now, buffers);
        } else if let LineEvent::Slot(byte) = event {
            if !matches!(self.state, RxState::WaitBreak) {
                self.store(byte, now, buffers);
            }
        }

        self.state = self.state.transition(event);
        completed
    }

    fn break_to_break_exceeded(&self, now: Instant) -> bool {
        self.packet_start.is_some_and(|start| {
            now.saturating_duration_since(start)
                > Duration::from_millis(RX_PACKET_TIMEOUT_MS as u64)
        })
    }

    fn begin(&mut self, now: Instant, buffers: &mut DoubleBuffer) {
        buffers.restart();
        self.packet_start = Some(now);
        self.start_code = None;
        self.truncated = false;
        self.packet_timing = None;
        if let Some(edges) = self.edges.as_mut() {
            edges.on_break();
        }
    }

    fn store(&mut self, byte: u8, now: Instant, buffers: &mut DoubleBuffer) {
        if self.start_code.is_none() {
            self.start_code = Some(byte);
            self.packet_timing = self.edges.as_mut().and_then(|e| e.on_start_code(now));
        }
        if !buffers.write_slot(byte) {
            self.truncated = true;
        }
    }

    fn finish(
        &mut self,
        status: PacketStatus,
        now: Instant,
        buffers: &mut DoubleBuffer,
    ) -> PacketEvent {
        let stored = buffers.complete();
        let duration = self
            .packet_start
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::from_ticks(0));

        PacketEvent {
            status,
            size: stored.saturating_sub(1),
            start_code: self.start_code.take(),
            duration,
            timing: if self.edges.is_some() {
                self.packet_timing.take()
            } else {
                None
            },
            truncated: core::mem::take(&mut self.truncated),
        }
    }
}
