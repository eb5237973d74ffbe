//! CDC control events and change detection.

use crate::line::LineEncoding;

/// Control-plane notification from the virtual serial channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    /// Host issued SET_LINE_CODING with a new encoding.
    LineEncodingChanged(LineEncoding),
    /// Host issued SET_CONTROL_LINE_STATE with a new DTR value.
    ControlLineStateChanged { dtr: bool },
}

/// Turns control-state snapshots into [`ControlEvent`]s.
///
/// USB stacks that expose only the latest line coding and DTR value (plus a
/// "something changed" signal) feed each snapshot through
/// [`observe`](Self::observe), which yields one event per field that
/// differs from the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTracker {
    encoding: LineEncoding,
    dtr: bool,
}

impl ControlTracker {
    /// Start from the encoding already programmed into the UART, DTR clear.
    #[must_use]
    pub const fn new(encoding: LineEncoding) -> Self {
        Self { encoding, dtr: false }
    }

    /// Compare a snapshot against the last one seen.
    pub fn observe(&mut self, encoding: LineEncoding, dtr: bool) -> ControlChanges {
        let mut changes = ControlChanges::default();
        if encoding != self.encoding {
            self.encoding = encoding;
            changes.encoding = Some(encoding);
        }
        if dtr != self.dtr {
            self.dtr = dtr;
            changes.dtr = Some(dtr);
        }
        changes
    }
}

/// Events produced by one [`ControlTracker::observe`] call, line encoding
/// first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlChanges {
    encoding: Option<LineEncoding>,
    dtr: Option<bool>,
}

impl ControlChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.encoding.is_none() && self.dtr.is_none()
    }
}

impl Iterator for ControlChanges {
    type Item = ControlEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(encoding) = self.encoding.take() {
            return Some(ControlEvent::LineEncodingChanged(encoding));
        }
        self.dtr.take().map(|dtr| ControlEvent::ControlLineStateChanged { dtr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{Parity, StopBits};

    #[test]
    fn test_unchanged_snapshot_yields_nothing() {
        let mut tracker = ControlTracker::new(LineEncoding::DEFAULT);
        let changes = tracker.observe(LineEncoding::DEFAULT, false);
        assert!(changes.is_empty());
        assert_eq!(changes.count(), 0);
    }

    #[test]
    fn test_both_fields_changed() {
        let mut tracker = ControlTracker::new(LineEncoding::DEFAULT);
        let fast = LineEncoding::new(115_200, Parity::None, StopBits::One, 8);
        let mut changes = tracker.observe(fast, true);

        assert_eq!(changes.next(), Some(ControlEvent::LineEncodingChanged(fast)));
        assert_eq!(changes.next(), Some(ControlEvent::ControlLineStateChanged { dtr: true }));
        assert_eq!(changes.next(), None);
    }

    #[test]
    fn test_repeated_request_reported_once() {
        let mut tracker = ControlTracker::new(LineEncoding::DEFAULT);
        let slow = LineEncoding::new(1200, Parity::Even, StopBits::Two, 7);
        assert_eq!(tracker.observe(slow, false).count(), 1);
        assert_eq!(tracker.observe(slow, false).count(), 0);
    }

    #[test]
    fn test_dtr_sequence() {
        let mut tracker = ControlTracker::new(LineEncoding::DEFAULT);
        let mut dtr_events = [None; 3];
        for (slot, dtr) in dtr_events.iter_mut().zip([true, true, false]) {
            *slot = tracker.observe(LineEncoding::DEFAULT, dtr).next();
        }
        assert_eq!(
            dtr_events,
            [
                Some(ControlEvent::ControlLineStateChanged { dtr: true }),
                None,
                Some(ControlEvent::ControlLineStateChanged { dtr: false }),
            ]
        );
    }
}
