//! Link monitor implementation
//!
//! Connection loss is a consumer judgment: the driver only reports packets.
//! A receive deadline expiring while connected means the line is lost; a
//! packet that ends cleanly means it is (again) connected.

use embassy_time::{Duration, Instant};

use crate::packet::{PacketEvent, PacketStatus};

/// How often a connected consumer reports packet metadata
pub const REPORT_INTERVAL_MS: u64 = 1000;

/// Link condition as seen by the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No clean packet seen yet
    #[default]
    Waiting,
    /// Clean packets are arriving
    Connected,
    /// Receive deadline expired after being connected
    Lost,
}

/// Change of link condition worth reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkTransition {
    Connected,
    Lost,
}

/// Consumer-side connection tracker
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    state: LinkState,
    /// Clean packets since the last connect
    packets: u32,
    /// Errored packets since the last connect
    errors: u32,
    /// Last time `should_report` returned true
    last_report: Option<Instant>,
    report_interval: Duration,
}

impl Default for LinkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkMonitor {
    /// Create a monitor waiting for the first packet
    pub fn new() -> Self {
        Self::with_report_interval(Duration::from_millis(REPORT_INTERVAL_MS))
    }

    /// Create a monitor reporting at a custom interval
    pub fn with_report_interval(report_interval: Duration) -> Self {
        Self {
            state: LinkState::Waiting,
            packets: 0,
            errors: 0,
            last_report: None,
            report_interval,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Clean packets since the last connect
    pub fn packets(&self) -> u32 {
        self.packets
    }

    /// Errored packets since the last connect
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Record a packet event
    pub fn on_event(&mut self, event: &PacketEvent) -> Option<LinkTransition> {
        if event.status != PacketStatus::Ok {
            self.errors = self.errors.saturating_add(1);
            return None;
        }

        self.packets = self.packets.saturating_add(1);
        if self.state == LinkState::Connected {
            return None;
        }

        self.state = LinkState::Connected;
        self.packets = 1;
        self.errors = 0;
        self.last_report = None;
        Some(LinkTransition::Connected)
    }

    /// Record a receive deadline that expired with no event
    pub fn on_receive_timeout(&mut self) -> Option<LinkTransition> {
        if self.state != LinkState::Connected {
            return None;
        }
        self.state = LinkState::Lost;
        Some(LinkTransition::Lost)
    }

    /// Rate limit for periodic reporting
    ///
    /// Returns `true` at most once per report interval while connected.
    pub fn should_report(&mut self, now: Instant) -> bool {
        if !self.is_connected() {
            return false;
        }
        let due = match self.last_report {
            Some(last) => now.saturating_duration_since(last) >= self.report_interval,
            None => true,
        };
        if due {
            self.last_report = Some(now);
        }
        due
    }
}
