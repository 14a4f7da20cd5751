//! Line events that trigger receive transitions

/// Conditions reported by the serial peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineEvent {
    /// Break condition detected (line held low past a frame)
    Break,
    /// Line returned to mark after a break
    MarkAfterBreak,
    /// A slot was received
    Slot(u8),
    /// Stop bit missing on a received frame
    FramingError,
    /// Slot arrived before the previous one was consumed
    Overrun,
    /// Peripheral saw the line idle mid-packet
    IdleTimeout,
}

impl LineEvent {
    /// Check if this event is a peripheral-reported error
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            LineEvent::FramingError | LineEvent::Overrun | LineEvent::IdleTimeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_events() {
        assert!(LineEvent::FramingError.is_error());
        assert!(LineEvent::Overrun.is_error());
        assert!(LineEvent::IdleTimeout.is_error());
        assert!(!LineEvent::Break.is_error());
        assert!(!LineEvent::Slot(0).is_error());
    }
}
