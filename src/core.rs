//! Unstable, low-level API for the complete state of a lockstep node.

use core::fmt;

use log::{debug, info, warn};

use crate::carry::{Carry, CarryBatch};
use crate::host::{Committer, Dispatcher, FailReason};
use crate::member::MemberSet;
use crate::message::{MemberId, Message, MessageKind, StepId, Vote};
use crate::node::ProposeError;

use self::RoundState::*;

/// The phase of the current agreement round.
///
/// Commit is a transition event, not a resting state; completing a commit returns the machine to
/// [`Initial`] for the next step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    /// No round in progress.
    Initial,

    /// At least one vote has been seen this round and commit is still believed possible.
    MayCommit,

    /// Diverging views were detected; commit is blocked until the round restarts.
    CannotCommit,
}

/// The complete state of a lockstep node.
pub struct State<D, C> {
    dispatcher: D,
    committer: C,

    member_id: MemberId,
    state: RoundState,
    step: StepId,

    /// The baseline group membership the majority requirement is measured against.
    members: MemberSet,

    /// The members still believed reachable this round; shrinks, never grows, within a round.
    current_members: MemberSet,

    /// The members a consistent vote has been seen from this round.
    voted: MemberSet,

    /// The carries accumulated this round.
    carries: CarryBatch,
}

#[allow(missing_docs)]
impl<D, C> State<D, C>
where
    D: Dispatcher,
    C: Committer,
{
    pub fn new(member_id: MemberId, mut members: MemberSet, dispatcher: D, committer: C) -> Self {
        members.insert(member_id);
        Self {
            dispatcher,
            committer,
            member_id,
            state: Initial,
            step: StepId::default(),
            current_members: members.clone(),
            members,
            voted: MemberSet::new(),
            carries: CarryBatch::new(),
        }
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    pub fn members(&self) -> &MemberSet {
        &self.members
    }

    pub fn current_members(&self) -> &MemberSet {
        &self.current_members
    }

    pub fn voted(&self) -> &MemberSet {
        &self.voted
    }

    pub fn carries(&self) -> &CarryBatch {
        &self.carries
    }

    pub fn committer(&self) -> &C {
        &self.committer
    }

    pub fn committer_mut(&mut self) -> &mut C {
        &mut self.committer
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    pub fn propose(&mut self, carry: Carry) -> Result<(), ProposeError<C::Error>> {
        if self.state != Initial {
            return Err(ProposeError::RoundInProgress { carry });
        }

        debug!("member {}: propose {}", self.member_id, &carry);
        let vote = Vote {
            carries: CarryBatch::from(carry),
            voted: self.voted.clone(),
            members: self.current_members.clone(),
        };
        self.handle_vote(self.member_id, vote)
            .map_err(ProposeError::CommitErr)
    }

    pub fn receive(&mut self, msg: Message) -> Result<(), C::Error> {
        if !self.current_members.contains(msg.from) {
            verbose!("member {}: dropping message from non-member: {}", self.member_id, &msg);
            return Ok(());
        }

        match msg.kind {
            MessageKind::Vote(vote) => self.handle_vote(msg.from, vote),
            MessageKind::Commit(_) => self.commit(),
            MessageKind::Empty => Ok(()),
        }
    }

    pub fn disconnect(&mut self, id: MemberId) -> Result<(), C::Error> {
        if !self.current_members.contains(id) {
            return Ok(());
        }

        info!("member {}: disconnect of {}", self.member_id, &id);
        let disconnected = MemberSet::from(id);
        let vote = Vote {
            carries: self.carries.clone(),
            voted: self.voted.difference(&disconnected),
            members: self.current_members.difference(&disconnected),
        };
        self.handle_vote(id, vote)
    }

    // The steps below run in a load-bearing order: the divergence check reads the pre-merge
    // view, and the majority check runs before any promotion or broadcast.
    fn handle_vote(&mut self, from: MemberId, vote: Vote) -> Result<(), C::Error> {
        if self.state == MayCommit && !self.is_consistent(&vote) {
            info!(
                "member {}: view diverges from {}, commit blocked this round",
                self.member_id, &from
            );
            self.state = CannotCommit;
        }

        self.voted.insert(self.member_id);
        self.voted.insert(from);

        self.carries.union(&vote.carries);
        self.current_members.intersect(&vote.members);
        // votes from members that just fell out of the working set no longer count
        self.voted.intersect(&self.current_members);

        if !self.current_members.is_majority_of(&self.members) {
            warn!(
                "member {}: working membership {} is no longer a majority of {}",
                self.member_id, &self.current_members, &self.members
            );
            self.committer.fail(FailReason::LostMajority);
            return Ok(());
        }

        if self.state == Initial {
            self.state = MayCommit;
            self.broadcast_vote();
        }

        if self.voted == self.current_members {
            if self.state == MayCommit {
                self.commit()?;
            } else {
                // every working member has voted but views diverged along the way: restart the
                // round, re-soliciting votes under the merged view
                info!("member {}: restarting round at {}", self.member_id, self.step);
                self.state = MayCommit;
                self.voted.clear();
                self.voted.insert(self.member_id);
                self.broadcast_vote();
            }
        }
        Ok(())
    }

    fn is_consistent(&self, vote: &Vote) -> bool {
        self.carries == vote.carries && self.current_members == vote.members
    }

    fn broadcast_vote(&mut self) {
        let msg = Message::vote(
            self.member_id,
            self.step,
            self.carries.clone(),
            self.voted.clone(),
            self.current_members.clone(),
        );
        self.dispatcher.broadcast(msg);
    }

    fn commit(&mut self) -> Result<(), C::Error> {
        info!(
            "member {}: committing {} carries at {}",
            self.member_id,
            self.carries.len(),
            self.step
        );
        self.committer.commit(&self.carries)?;
        let msg = Message::commit(self.member_id, self.step, self.carries.clone());
        self.dispatcher.broadcast(msg);
        self.prepare_next_step();
        Ok(())
    }

    fn clean_up(&mut self) {
        self.state = Initial;
        self.members = self.current_members.clone();
        self.carries.clear();
        self.voted.clear();
    }

    fn prepare_next_step(&mut self) {
        self.clean_up();
        self.step += 1;
        self.committer.inc_step();
    }
}

impl<D, C> fmt::Display for State<D, C> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("State")
            .field("member_id", &format_args!("{}", self.member_id))
            .field("state", &self.state)
            .field("step", &format_args!("{}", self.step))
            .field("members", &format_args!("{}", self.members))
            .field("current_members", &format_args!("{}", self.current_members))
            .field("voted", &format_args!("{}", self.voted))
            .field("carries", &self.carries.len())
            .finish()
    }
}
