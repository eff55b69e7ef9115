//! Message types for sending between group members.
//!
//! This module provides data types for messages to be sent between the members of a lockstep
//! group. The top-level message type is [`Message`]. How messages travel between members is
//! entirely up to the hosting runtime; see [`Dispatcher`](crate::host::Dispatcher).

use core::cmp::Ordering;
use core::fmt;
use core::ops::AddAssign;

use crate::carry::CarryBatch;
use crate::member::MemberSet;

/// The unique identifier of a group member, stable for the lifetime of its process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemberId {
    /// The non-negative integer assigned to this member.
    pub id: u32,
}

/// The unique, monotonically-increasing ID of one round of the commit protocol.
///
/// A step is incremented exactly once per completed commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepId {
    /// The non-negative integer assigned to this step.
    pub id: u64,
}

/// A per-message sequence stamp.
///
/// The stamp is carried on every message but is not interpreted by the state machine; it is
/// reserved for hosts that need a send-order tie-break.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stamp {
    /// The non-negative integer assigned to this stamp.
    pub id: u64,
}

/// A message sent between the members of a lockstep group.
///
/// # Equality
///
/// Message equality deliberately tracks only the fields a receiver acts upon:
///
/// - [`Empty`](MessageKind::Empty) messages are equal whenever their senders match;
/// - [`Vote`](MessageKind::Vote) messages are equal when sender, node set, voted set, stamp and
///   step all match (the carry batch is not compared);
/// - [`Commit`](MessageKind::Commit) messages are equal when sender, carry batch, stamp and step
///   all match.
#[derive(Clone, Debug)]
pub struct Message {
    /// The sender of this message.
    pub from: MemberId,

    /// The sequence stamp of this message (reserved; see [`Stamp`]).
    pub stamp: Stamp,

    /// The step of the round during which this message was sent.
    pub step: StepId,

    /// The payload of this message.
    pub kind: MessageKind,
}

/// The payload of a [`Message`].
#[derive(Clone, Debug)]
pub enum MessageKind {
    /// A vote carrying the sender's accumulated view of the current round.
    Vote(Vote),

    /// An announcement that the sender has committed a batch and finished its round.
    Commit(Commit),

    /// A message with no payload, usable as a placeholder value.
    Empty,
}

/// The accumulated view of a round carried by a [`Vote`](MessageKind::Vote) message.
#[derive(Clone, Debug)]
pub struct Vote {
    /// The carries accumulated by the sender so far this round.
    pub carries: CarryBatch,

    /// The members the sender has seen a consistent vote from so far this round.
    pub voted: MemberSet,

    /// The members the sender still believes reachable this round.
    pub members: MemberSet,
}

/// The batch carried by a [`Commit`](MessageKind::Commit) message.
#[derive(Clone, Debug)]
pub struct Commit {
    /// The batch the sender has committed.
    pub carries: CarryBatch,
}

//
// Message impls
//

impl Message {
    /// Constructs a vote message carrying the sender's accumulated round view.
    pub fn vote(
        from: MemberId,
        step: StepId,
        carries: CarryBatch,
        voted: MemberSet,
        members: MemberSet,
    ) -> Self {
        Self {
            from,
            stamp: Stamp::default(),
            step,
            kind: MessageKind::Vote(Vote {
                carries,
                voted,
                members,
            }),
        }
    }

    /// Constructs a commit message carrying an agreed batch.
    pub fn commit(from: MemberId, step: StepId, carries: CarryBatch) -> Self {
        Self {
            from,
            stamp: Stamp::default(),
            step,
            kind: MessageKind::Commit(Commit { carries }),
        }
    }

    /// Constructs a message with no payload.
    pub fn empty(from: MemberId) -> Self {
        Self {
            from,
            stamp: Stamp::default(),
            step: StepId::default(),
            kind: MessageKind::Empty,
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        if self.from != other.from {
            return false;
        }
        match (&self.kind, &other.kind) {
            (MessageKind::Empty, MessageKind::Empty) => true,
            (MessageKind::Vote(lhs), MessageKind::Vote(rhs)) => {
                self.stamp == other.stamp
                    && self.step == other.step
                    && lhs.members == rhs.members
                    && lhs.voted == rhs.voted
            }
            (MessageKind::Commit(lhs), MessageKind::Commit(rhs)) => {
                self.stamp == other.stamp && self.step == other.step && lhs.carries == rhs.carries
            }
            _ => false,
        }
    }
}

impl Eq for Message {}

impl fmt::Display for Message {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            from,
            stamp: _,
            step,
            kind,
        } = self;
        let mut debug = fmt.debug_tuple("");
        debug.field(&format_args!("{}", from));
        debug.field(&format_args!("{}", step));
        debug.field(&format_args!("{}", kind));
        debug.finish()
    }
}

//
// MessageKind impls
//

impl fmt::Display for MessageKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            MessageKind::Vote(msg) => fmt::Display::fmt(msg, fmt),
            MessageKind::Commit(msg) => fmt::Display::fmt(msg, fmt),
            MessageKind::Empty => fmt.write_str("Empty"),
        }
    }
}

//
// Vote impls
//

impl fmt::Display for Vote {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            carries,
            voted,
            members,
        } = self;
        fmt.debug_struct("Vote")
            .field("carries", &carries.len())
            .field("voted", &format_args!("{}", voted))
            .field("members", &format_args!("{}", members))
            .finish()
    }
}

//
// Commit impls
//

impl fmt::Display for Commit {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { carries } = self;
        fmt.debug_struct("Commit")
            .field("carries", &carries.len())
            .finish()
    }
}

//
// MemberId impls
//

impl fmt::Display for MemberId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { id } = self;
        fmt.debug_tuple("Member").field(id).finish()
    }
}

impl PartialOrd for MemberId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MemberId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

//
// StepId impls
//

impl fmt::Display for StepId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { id } = self;
        fmt.debug_tuple("Step").field(id).finish()
    }
}

impl PartialOrd for StepId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StepId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl AddAssign<u64> for StepId {
    fn add_assign(&mut self, rhs: u64) {
        self.id = self
            .id
            .checked_add(rhs)
            .unwrap_or_else(|| panic!("overflow"));
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::carry::{Carry, CarryBatch, CarryId, ElementaryCarry};

    use super::*;

    fn member(id: u32) -> MemberId {
        MemberId { id }
    }

    fn batch(ids: &[u64]) -> CarryBatch {
        let mut batch = CarryBatch::new();
        for &id in ids {
            let id = CarryId { id };
            batch.append(Carry::new(id, ElementaryCarry::new(id, Bytes::new())));
        }
        batch
    }

    fn members(ids: &[u32]) -> MemberSet {
        ids.iter().map(|&id| member(id)).collect()
    }

    #[test]
    fn test_empty_messages_equal_by_sender() {
        assert_eq!(Message::empty(member(1)), Message::empty(member(1)));
        assert_ne!(Message::empty(member(1)), Message::empty(member(2)));
    }

    #[test]
    fn test_vote_equality_tracks_sets_not_carries() {
        let step = StepId { id: 3 };
        let lhs = Message::vote(
            member(1),
            step,
            batch(&[1]),
            members(&[1]),
            members(&[1, 2]),
        );
        let rhs = Message::vote(
            member(1),
            step,
            batch(&[1, 2, 3]),
            members(&[1]),
            members(&[1, 2]),
        );
        assert_eq!(lhs, rhs);

        let other_voted = Message::vote(
            member(1),
            step,
            batch(&[1]),
            members(&[1, 2]),
            members(&[1, 2]),
        );
        assert_ne!(lhs, other_voted);

        let other_step = Message::vote(
            member(1),
            StepId { id: 4 },
            batch(&[1]),
            members(&[1]),
            members(&[1, 2]),
        );
        assert_ne!(lhs, other_step);
    }

    #[test]
    fn test_commit_equality_tracks_carries() {
        let step = StepId { id: 1 };
        assert_eq!(
            Message::commit(member(2), step, batch(&[4, 5])),
            Message::commit(member(2), step, batch(&[4, 5])),
        );
        assert_ne!(
            Message::commit(member(2), step, batch(&[4, 5])),
            Message::commit(member(2), step, batch(&[4])),
        );
        assert_ne!(
            Message::commit(member(2), step, batch(&[4])),
            Message::commit(member(3), step, batch(&[4])),
        );
    }

    #[test]
    fn test_messages_of_different_kinds_never_equal() {
        let vote = Message::vote(
            member(1),
            StepId::default(),
            batch(&[]),
            members(&[]),
            members(&[]),
        );
        let commit = Message::commit(member(1), StepId::default(), batch(&[]));
        assert_ne!(vote, commit);
        assert_ne!(vote, Message::empty(member(1)));
        assert_ne!(commit, Message::empty(member(1)));
    }

    #[test]
    fn test_step_increment() {
        let mut step = StepId::default();
        step += 1;
        assert_eq!(step, StepId { id: 1 });
        assert!(step > StepId::default());
    }
}
