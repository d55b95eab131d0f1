//! Tracking sources and observer registration
//!
//! A [`TrackingSource`] produces batched change notifications. A
//! [`TrackingSession`] owns one source and at most one registered
//! [`TrackablesObserver`], and delivers pending batches to it synchronously
//! when pumped from the thread that owns the observer.
//!
//! Sources that run on another thread hand batches over through
//! [`ChannelTrackingSource`]; the session drains them in send order, so the
//! observer is only ever touched from its owning thread.

use super::TrackablesChanged;
use log::{debug, trace};
use std::collections::VecDeque;
use std::sync::mpsc;

/// Receives batched change notifications
pub trait TrackablesObserver {
    /// Apply one batch. Must not fail: a malformed batch is absorbed.
    fn on_trackables_changed(&mut self, batch: &TrackablesChanged);
}

/// Produces batched change notifications once per tracking frame
pub trait TrackingSource {
    /// Take the next pending batch, if any
    fn next_batch(&mut self) -> Option<TrackablesChanged>;
}

/// Source that replays a fixed list of batches in order
#[derive(Debug, Clone, Default)]
pub struct ScriptedTrackingSource {
    pending: VecDeque<TrackablesChanged>,
}

impl ScriptedTrackingSource {
    /// Create a source from an ordered list of batches
    pub fn new(batches: impl IntoIterator<Item = TrackablesChanged>) -> Self {
        Self {
            pending: batches.into_iter().collect(),
        }
    }

    /// Append a batch to the end of the script
    pub fn push(&mut self, batch: TrackablesChanged) {
        self.pending.push_back(batch);
    }

    /// Number of batches not yet delivered
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl TrackingSource for ScriptedTrackingSource {
    fn next_batch(&mut self) -> Option<TrackablesChanged> {
        self.pending.pop_front()
    }
}

/// Sending half used by producer threads to hand batches to the owning thread
#[derive(Debug, Clone)]
pub struct BatchSender {
    sender: mpsc::Sender<TrackablesChanged>,
}

impl BatchSender {
    /// Queue a batch for delivery on the owning thread
    ///
    /// Returns the batch back if the receiving source has been dropped.
    pub fn send(&self, batch: TrackablesChanged) -> Result<(), TrackablesChanged> {
        self.sender.send(batch).map_err(|err| err.0)
    }
}

/// Source fed from other threads through a channel
#[derive(Debug)]
pub struct ChannelTrackingSource {
    receiver: mpsc::Receiver<TrackablesChanged>,
}

impl ChannelTrackingSource {
    /// Create a source and the sender that feeds it
    pub fn new() -> (Self, BatchSender) {
        let (sender, receiver) = mpsc::channel();
        (Self { receiver }, BatchSender { sender })
    }
}

impl TrackingSource for ChannelTrackingSource {
    fn next_batch(&mut self) -> Option<TrackablesChanged> {
        // Disconnected and empty both mean nothing to deliver this frame
        self.receiver.try_recv().ok()
    }
}

/// Owns a tracking source and delivers its batches to a single observer
pub struct TrackingSession<S, O> {
    source: S,
    observer: Option<O>,
    delivered: u64,
}

impl<S: TrackingSource, O: TrackablesObserver> TrackingSession<S, O> {
    /// Create a session with no observer attached
    pub fn new(source: S) -> Self {
        Self {
            source,
            observer: None,
            delivered: 0,
        }
    }

    /// Register the observer, returning the one it replaces
    pub fn attach(&mut self, observer: O) -> Option<O> {
        debug!("Tracking session observer attached");
        self.observer.replace(observer)
    }

    /// Unregister and return the observer
    pub fn detach(&mut self) -> Option<O> {
        let observer = self.observer.take();
        if observer.is_some() {
            debug!("Tracking session observer detached");
        }
        observer
    }

    /// The registered observer
    pub fn observer(&self) -> Option<&O> {
        self.observer.as_ref()
    }

    /// The registered observer, mutably
    pub fn observer_mut(&mut self) -> Option<&mut O> {
        self.observer.as_mut()
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The underlying source, mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Total batches delivered to an observer so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Deliver at most one pending batch. Returns whether one was delivered.
    ///
    /// With no observer attached nothing is taken from the source, so
    /// batches wait until an observer is registered.
    pub fn step(&mut self) -> bool {
        let Some(observer) = self.observer.as_mut() else {
            return false;
        };
        let Some(batch) = self.source.next_batch() else {
            return false;
        };

        trace!(
            "Delivering batch: {} added, {} updated, {} removed",
            batch.added.len(),
            batch.updated.len(),
            batch.removed.len()
        );
        observer.on_trackables_changed(&batch);
        self.delivered += 1;
        true
    }

    /// Deliver every pending batch in order. Returns the number delivered.
    pub fn pump(&mut self) -> usize {
        let mut count = 0;
        while self.step() {
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Pose;
    use crate::tracking::{TrackableId, TrackableRecord};

    #[derive(Default)]
    struct RecordingObserver {
        batches: Vec<TrackablesChanged>,
    }

    impl TrackablesObserver for RecordingObserver {
        fn on_trackables_changed(&mut self, batch: &TrackablesChanged) {
            self.batches.push(batch.clone());
        }
    }

    fn add(id: u64) -> TrackablesChanged {
        TrackablesChanged::new().with_added(TrackableRecord::new(id, Pose::identity()))
    }

    #[test]
    fn test_pump_delivers_in_order() {
        let source = ScriptedTrackingSource::new(vec![add(1), add(2), add(3)]);
        let mut session = TrackingSession::new(source);
        session.attach(RecordingObserver::default());

        assert_eq!(session.pump(), 3);
        assert_eq!(session.delivered(), 3);
        assert_eq!(session.source().remaining(), 0);

        let observer = session.detach().expect("observer attached");
        let ids: Vec<TrackableId> = observer.batches.iter().map(|b| b.added[0].id).collect();
        assert_eq!(ids, vec![1.into(), 2.into(), 3.into()]);
    }

    #[test]
    fn test_batches_wait_without_observer() {
        let source = ScriptedTrackingSource::new(vec![add(1)]);
        let mut session: TrackingSession<_, RecordingObserver> = TrackingSession::new(source);

        assert_eq!(session.pump(), 0);
        assert_eq!(session.source().remaining(), 1);

        session.attach(RecordingObserver::default());
        assert_eq!(session.pump(), 1);
    }

    #[test]
    fn test_attach_replaces_previous_observer() {
        let mut session = TrackingSession::new(ScriptedTrackingSource::default());
        assert!(session.attach(RecordingObserver::default()).is_none());
        assert!(session.attach(RecordingObserver::default()).is_some());
        assert!(session.detach().is_some());
        assert!(session.detach().is_none());
    }

    #[test]
    fn test_channel_source_marshals_across_threads() {
        let (source, sender) = ChannelTrackingSource::new();
        let producer = std::thread::spawn(move || {
            for id in 1..=5 {
                sender.send(add(id)).expect("receiver alive");
            }
        });
        producer.join().expect("producer thread");

        let mut session = TrackingSession::new(source);
        session.attach(RecordingObserver::default());
        assert_eq!(session.pump(), 5);

        let observer = session.observer().expect("observer attached");
        let ids: Vec<TrackableId> = observer.batches.iter().map(|b| b.added[0].id).collect();
        assert_eq!(ids, (1..=5).map(TrackableId::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_send_after_source_dropped_returns_batch() {
        let (source, sender) = ChannelTrackingSource::new();
        drop(source);
        let returned = sender.send(add(1)).expect_err("source dropped");
        assert_eq!(returned.added[0].id, TrackableId::from(1));
    }
}
