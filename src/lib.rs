//! A lockstep commit protocol for replicated groups of nodes.
//!
//! Round by round ("steps"), a group of nodes decides which batch of application payloads
//! ("carries") gets committed, requiring that every currently-reachable member has observed and
//! acknowledged the identical batch and the identical membership before commit. Nodes vanishing
//! or messages being lost (fail-stop and omission faults; nodes never lie) shrink the working
//! membership, and a round refuses to commit once the working membership no longer represents a
//! strict majority of the original group.
//!
//! The crate contains only the consensus state machine and its supporting data structures; the
//! transport that delivers broadcasts, durable storage of committed batches, and the catch-up of
//! lagging nodes are capabilities of the hosting runtime, injected through the traits in
//! [`host`]. Start with [`node::Node`].

#[macro_use]
mod macros;

pub mod carry;
pub mod core;
pub mod host;
pub mod member;
pub mod message;
pub mod node;
