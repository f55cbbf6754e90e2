//! Notifications emitted by a tracker for whoever hosts it.
//!
//! Delivery is fire-and-forget: a handler that fails or lags never affects
//! what the tracker records.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::timeline::EventRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerSignal {
    EventRecorded(EventRecord),
    StatsUpdated,
    PlayerIdentified {
        name: Option<String>,
        id: Option<String>,
        game_version: Option<String>,
        current_vehicle: Option<String>,
    },
    VehicleDestroyed {
        vehicle: String,
        status: String,
        caused_by: String,
        is_own: bool,
    },
    RolloverDetected,
    /// The log reports a different session than the stored stats. The host
    /// must answer with `Tracker::resolve_session_switch`.
    SessionSwitchPending {
        old: String,
        new: String,
    },
    InitialScanComplete {
        lines: usize,
    },
}

/// Trait for hosts that react to tracker signals.
pub trait SignalHandler: Send {
    fn handle_signal(&mut self, source: &str, signal: &TrackerSignal);
}

/// A signal tagged with the source that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSignal {
    pub source: String,
    pub signal: TrackerSignal,
}

/// Forwards signals into an unbounded channel. Sends to a closed channel are dropped.
pub struct ChannelSink {
    tx: UnboundedSender<SourceSignal>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<SourceSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn from_sender(tx: UnboundedSender<SourceSignal>) -> Self {
        Self { tx }
    }
}

impl SignalHandler for ChannelSink {
    fn handle_signal(&mut self, source: &str, signal: &TrackerSignal) {
        let _ = self.tx.send(SourceSignal {
            source: source.to_string(),
            signal: signal.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_tags_source() {
        let (mut sink, mut rx) = ChannelSink::new();
        sink.handle_signal("LIVE", &TrackerSignal::StatsUpdated);
        let received = rx.try_recv().unwrap();
        assert_eq!(received.source, "LIVE");
        assert_eq!(received.signal, TrackerSignal::StatsUpdated);
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        sink.handle_signal("LIVE", &TrackerSignal::RolloverDetected);
    }
}
