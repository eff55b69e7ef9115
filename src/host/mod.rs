//! Interfaces between the consensus core and its hosting runtime.
//!
//! The core performs no I/O of its own. Outbound message delivery and durable application of
//! agreed batches are supplied to [`Node`](crate::node::Node) as [`Dispatcher`] and [`Committer`]
//! implementations; [`Controller`] is the capability a node's host exposes back to its runtime
//! for lifecycle and catch-up.

use core::fmt;

use crate::carry::CarryBatch;
use crate::message::{Message, StepId};

pub mod memory;

/// An interface for delivering broadcast messages to the other members of the group.
///
/// The core assumes nothing about acknowledgment, ordering, or retries; a broadcast is a
/// synchronous, fire-and-forget callout, and everything beyond that belongs to the
/// implementation.
pub trait Dispatcher {
    /// Delivers `message` to every other current member of the group.
    fn broadcast(&mut self, message: Message);
}

/// An interface for durably applying agreed batches.
///
/// One committer backs one [`Node`](crate::node::Node); it owns the durable round counter and is
/// the destination of the single fatal signal the core can raise.
pub trait Committer {
    /// The type of error returned by fallible operations.
    type Error;

    /// Durably applies an agreed batch.
    ///
    /// # Errors
    ///
    /// If the batch could not be applied, an error is returned. The core propagates the error to
    /// its caller without resetting the round.
    fn commit(&mut self, batch: &CarryBatch) -> Result<(), Self::Error>;

    /// Advances the durable round counter after a successful commit.
    fn inc_step(&mut self);

    /// Signals a fatal, terminal protocol failure.
    ///
    /// This is a one-way notification: the core stops processing the message that raised it and
    /// never retries.
    fn fail(&mut self, reason: FailReason);
}

/// A capability exposed by a node's host for lifecycle control and catch-up.
///
/// The recovery algorithm itself lives in the host, not in this crate; this trait only fixes the
/// contract a host must meet.
pub trait Controller {
    /// Terminates this node's participation in the group.
    fn stop(&mut self);

    /// Recovers a node which has discovered it fell behind the group.
    ///
    /// An implementation must apply the committed state of every step between `current` and
    /// `latest`, then rejoin the membership group with refreshed state.
    fn lost_steps(&mut self, current: StepId, latest: StepId);
}

/// The reason for a fatal failure reported through [`Committer::fail`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailReason {
    /// The working membership is no longer a strict majority of the baseline group.
    LostMajority,
}

impl fmt::Display for FailReason {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::LostMajority => fmt.write_str("lost majority"),
        }
    }
}
