//! Naive in-memory implementations of the host interfaces, primarily for testing.

use std::collections::VecDeque;

use crate::carry::CarryBatch;
use crate::message::{Message, StepId};

use super::{Committer, Controller, Dispatcher, FailReason};

/// A [`Dispatcher`] which queues broadcast messages for a harness to route by hand.
#[derive(Debug, Default)]
pub struct QueueDispatcher {
    messages: VecDeque<Message>,
}

/// A [`Committer`] which records applied batches in memory.
#[derive(Debug, Default)]
pub struct InMemoryCommitter {
    committed: Vec<CarryBatch>,
    step: StepId,
    failures: Vec<FailReason>,
}

/// A [`Controller`] which records the calls made to it.
#[derive(Debug, Default)]
pub struct RecordingController {
    stopped: bool,
    lost_steps: Vec<(StepId, StepId)>,
}

//
// QueueDispatcher impls
//

impl QueueDispatcher {
    /// Constructs a dispatcher with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the oldest queued broadcast.
    pub fn pop(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    /// Returns the number of queued broadcasts.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns whether no broadcasts are queued.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Dispatcher for QueueDispatcher {
    fn broadcast(&mut self, message: Message) {
        self.messages.push_back(message);
    }
}

//
// InMemoryCommitter impls
//

impl InMemoryCommitter {
    /// Constructs a committer with no recorded state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the batches applied so far, oldest first.
    pub fn committed(&self) -> &[CarryBatch] {
        &self.committed
    }

    /// Returns the durable round counter.
    pub fn step(&self) -> StepId {
        self.step
    }

    /// Returns the first fatal failure signaled, if any.
    pub fn failure(&self) -> Option<FailReason> {
        self.failures.first().copied()
    }

    /// Returns every fatal failure signaled, oldest first.
    pub fn failures(&self) -> &[FailReason] {
        &self.failures
    }
}

impl Committer for InMemoryCommitter {
    type Error = ();

    fn commit(&mut self, batch: &CarryBatch) -> Result<(), ()> {
        self.committed.push(batch.clone());
        Ok(())
    }

    fn inc_step(&mut self) {
        self.step += 1;
    }

    fn fail(&mut self, reason: FailReason) {
        self.failures.push(reason);
    }
}

//
// RecordingController impls
//

impl RecordingController {
    /// Constructs a controller with no recorded calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether [`stop`](Controller::stop) has been called.
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Returns the `(current, latest)` pairs passed to [`lost_steps`](Controller::lost_steps).
    pub fn recorded_lost_steps(&self) -> &[(StepId, StepId)] {
        &self.lost_steps
    }
}

impl Controller for RecordingController {
    fn stop(&mut self) {
        self.stopped = true;
    }

    fn lost_steps(&mut self, current: StepId, latest: StepId) {
        self.lost_steps.push((current, latest));
    }
}

#[cfg(test)]
mod tests {
    use crate::message::MemberId;

    use super::*;

    #[test]
    fn test_queue_dispatcher_preserves_order() {
        let mut dispatcher = QueueDispatcher::new();
        dispatcher.broadcast(Message::empty(MemberId { id: 1 }));
        dispatcher.broadcast(Message::empty(MemberId { id: 2 }));
        assert_eq!(dispatcher.len(), 2);
        assert_eq!(dispatcher.pop().map(|msg| msg.from), Some(MemberId { id: 1 }));
        assert_eq!(dispatcher.pop().map(|msg| msg.from), Some(MemberId { id: 2 }));
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_committer_records_failures() {
        let mut committer = InMemoryCommitter::new();
        assert_eq!(committer.failure(), None);
        committer.fail(FailReason::LostMajority);
        assert_eq!(committer.failure(), Some(FailReason::LostMajority));
        assert_eq!(committer.failures(), &[FailReason::LostMajority]);
    }

    #[test]
    fn test_committer_counts_steps() {
        let mut committer = InMemoryCommitter::new();
        committer.commit(&CarryBatch::new()).unwrap();
        committer.inc_step();
        assert_eq!(committer.step(), StepId { id: 1 });
        assert_eq!(committer.committed().len(), 1);
    }
}
