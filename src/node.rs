//! Higher-level API for a lockstep node.

use crate::carry::{Carry, CarryBatch};
use crate::core::{RoundState, State};
use crate::host::{Committer, Dispatcher};
use crate::member::MemberSet;
use crate::message::{MemberId, Message, StepId};

/// A lockstep node, used for agreeing with its peers, round by round, on batches of carries that
/// every reachable member has acknowledged identically before commit.
///
/// One `Node` runs on each member of a replicated group. A round starts when any member
/// [proposes][`propose`] a carry; the proposal circulates as votes which every member merges into
/// its own accumulated view, and once a node has seen a consistent vote from every member it still
/// believes reachable, it applies the accumulated batch through its [`Committer`] and resets for
/// the next step. Members that vanish mid-round only ever shrink the working membership; should
/// the working membership stop being a strict majority of the baseline group, the round is
/// terminally poisoned and reported once through [`Committer::fail`].
///
/// # Proposing carries
///
/// Carries passed to [`propose`] are not guaranteed to commit in the round they were proposed in:
/// a diverging view on another member restarts the round, and the restarted round commits the
/// union of every carry proposed before the restart. The committed batch is deduplicated and
/// sorted by carry ID, so all members commit the identical batch no matter the order votes
/// reached them in.
///
/// # Message delivery
///
/// Outbound messages are handed to the [`Dispatcher`] as synchronous, fire-and-forget broadcasts;
/// the core assumes no acknowledgment, ordering, or retry behavior. Inbound messages from senders
/// outside the working membership are silently discarded. Catching a lagging node up with rounds
/// it missed is the host's job, via its [`Controller`](crate::host::Controller).
///
/// # Serialized access
///
/// A `Node` is single-writer: [`propose`], [`receive`], and [`disconnect`] mutate the same round
/// state and none of them synchronizes internally. The hosting runtime must serialize all calls
/// against one instance, for example by routing inbound messages and local proposals through one
/// sequential processing loop. No entry point suspends or blocks.
///
/// [`propose`]: Self::propose
/// [`receive`]: Self::receive
/// [`disconnect`]: Self::disconnect
/// [`Committer::fail`]: crate::host::Committer::fail
pub struct Node<D, C> {
    state: State<D, C>,
}

/// An error returned while proposing a carry for agreement.
#[derive(Debug)]
pub enum ProposeError<E> {
    /// A round is already in progress. Proposing is only permitted between rounds; calling
    /// [`propose`](Node::propose) mid-round is a caller contract violation and hosts should
    /// treat it as fatal.
    RoundInProgress {
        /// The carry that was rejected.
        carry: Carry,
    },
    /// An error was returned by the [`Committer`](crate::host::Committer) implementation.
    CommitErr(E),
}

impl<D, C> Node<D, C>
where
    D: Dispatcher,
    C: Committer,
{
    /// Constructs a new lockstep node with the specified baseline membership.
    ///
    /// Each node in a group must be constructed with the same `members`. `members` may contain
    /// `member_id` or omit it to the same effect.
    pub fn new(member_id: MemberId, members: MemberSet, dispatcher: D, committer: C) -> Self {
        Self {
            state: State::new(member_id, members, dispatcher, committer),
        }
    }

    /// Proposes a carry for agreement in a new round, voting for it as if the vote had been
    /// received from this node itself.
    ///
    /// # Errors
    ///
    /// If a round is already in progress, or if committing through the [`Committer`] fails, an
    /// error is returned.
    ///
    /// [`Committer`]: crate::host::Committer
    pub fn propose(&mut self, carry: Carry) -> Result<(), ProposeError<C::Error>> {
        self.state.propose(carry)
    }

    /// Processes receipt of a broadcast `msg` from a peer.
    ///
    /// Messages from senders outside the working membership are silently discarded; they are
    /// stale or foreign, not an error.
    ///
    /// # Errors
    ///
    /// If the message completes the round and committing through the [`Committer`] fails, the
    /// error is returned and the round is left un-reset.
    ///
    /// [`Committer`]: crate::host::Committer
    pub fn receive(&mut self, msg: Message) -> Result<(), C::Error> {
        self.state.receive(msg)
    }

    /// Processes the disconnect of the peer with ID `id`, without waiting for a timeout.
    ///
    /// This applies the same shrink-and-recheck logic a lost vote would eventually trigger: the
    /// working membership and voted set are reduced by `id` and the result is fed through the
    /// vote path. A disconnect of a member already outside the working membership is a no-op.
    ///
    /// # Errors
    ///
    /// As for [`receive`](Self::receive).
    pub fn disconnect(&mut self, id: MemberId) -> Result<(), C::Error> {
        self.state.disconnect(id)
    }

    /// Returns the phase of the current round. Side-effect-free, for observability and testing.
    pub fn state(&self) -> RoundState {
        self.state.state()
    }

    /// Returns this node's member ID.
    pub fn member_id(&self) -> MemberId {
        self.state.member_id()
    }

    /// Returns the step of the current round.
    pub fn step(&self) -> StepId {
        self.state.step()
    }

    /// Returns the baseline group membership.
    pub fn members(&self) -> &MemberSet {
        self.state.members()
    }

    /// Returns the members still believed reachable this round.
    pub fn current_members(&self) -> &MemberSet {
        self.state.current_members()
    }

    /// Returns the members a consistent vote has been seen from this round.
    pub fn voted(&self) -> &MemberSet {
        self.state.voted()
    }

    /// Returns the carries accumulated this round.
    pub fn carries(&self) -> &CarryBatch {
        self.state.carries()
    }

    /// Returns a reference to the committer.
    pub fn committer(&self) -> &C {
        self.state.committer()
    }

    /// Returns a mutable reference to the committer.
    pub fn committer_mut(&mut self) -> &mut C {
        self.state.committer_mut()
    }

    /// Returns a reference to the dispatcher.
    pub fn dispatcher(&self) -> &D {
        self.state.dispatcher()
    }

    /// Returns a mutable reference to the dispatcher.
    pub fn dispatcher_mut(&mut self) -> &mut D {
        self.state.dispatcher_mut()
    }

    /// Returns a reference to the low-level state of the node.
    pub fn low_level_state(&self) -> &State<D, C> {
        &self.state
    }
}
