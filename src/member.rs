//! Membership sets of group members.

use core::fmt;
use core::iter::FromIterator;
use std::collections::BTreeSet;

use crate::message::MemberId;

/// An unordered set of [`MemberId`]s.
///
/// Equality is set equality regardless of insertion order. All operations are total; there are no
/// error conditions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberSet {
    members: BTreeSet<MemberId>,
}

impl MemberSet {
    /// Constructs an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a member, returning whether it was newly inserted.
    pub fn insert(&mut self, id: MemberId) -> bool {
        self.members.insert(id)
    }

    /// Returns whether `id` is a member of this set.
    pub fn contains(&self, id: MemberId) -> bool {
        self.members.contains(&id)
    }

    /// Adds every member of `other` to this set.
    pub fn union(&mut self, other: &MemberSet) {
        self.members.extend(other.members.iter().copied());
    }

    /// Removes every member of this set not also present in `other`.
    pub fn intersect(&mut self, other: &MemberSet) {
        let members = &other.members;
        self.members.retain(|id| members.contains(id));
    }

    /// Returns a new set holding the members of this set absent from `other`.
    pub fn difference(&self, other: &MemberSet) -> MemberSet {
        Self {
            members: (self.members.difference(&other.members))
                .copied()
                .collect(),
        }
    }

    /// Returns whether this set constitutes a strict majority of `whole`.
    pub fn is_majority_of(&self, whole: &MemberSet) -> bool {
        whole.len() < self.len().saturating_mul(2)
    }

    /// Removes all members.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Returns the number of members in this set.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether this set has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns an iterator over the members of this set in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.members.iter().copied()
    }
}

impl From<MemberId> for MemberSet {
    fn from(id: MemberId) -> Self {
        let mut set = Self::new();
        set.insert(id);
        set
    }
}

impl FromIterator<MemberId> for MemberSet {
    fn from_iter<I: IntoIterator<Item = MemberId>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl Extend<MemberId> for MemberSet {
    fn extend<I: IntoIterator<Item = MemberId>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

impl fmt::Display for MemberSet {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = fmt.debug_set();
        for id in &self.members {
            debug.entry(&format_args!("{}", id));
        }
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u32]) -> MemberSet {
        ids.iter().map(|&id| MemberId { id }).collect()
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        assert_eq!(set(&[3, 1, 2]), set(&[1, 2, 3]));
        assert_ne!(set(&[1, 2]), set(&[1, 2, 3]));
    }

    #[test]
    fn test_union() {
        let mut lhs = set(&[1, 2]);
        lhs.union(&set(&[2, 4]));
        assert_eq!(lhs, set(&[1, 2, 4]));
    }

    #[test]
    fn test_intersect() {
        let mut lhs = set(&[1, 2, 3]);
        lhs.intersect(&set(&[2, 3, 4]));
        assert_eq!(lhs, set(&[2, 3]));

        lhs.intersect(&MemberSet::new());
        assert!(lhs.is_empty());
    }

    #[test]
    fn test_difference_leaves_operands_unchanged() {
        let lhs = set(&[1, 2, 3]);
        let rhs = set(&[2]);
        assert_eq!(lhs.difference(&rhs), set(&[1, 3]));
        assert_eq!(lhs, set(&[1, 2, 3]));
        assert_eq!(rhs, set(&[2]));
    }

    #[test]
    fn test_insert_contains_clear() {
        let mut members = MemberSet::new();
        assert!(members.insert(MemberId { id: 7 }));
        assert!(!members.insert(MemberId { id: 7 }));
        assert!(members.contains(MemberId { id: 7 }));
        assert_eq!(members.len(), 1);
        members.clear();
        assert!(members.is_empty());
    }

    #[test]
    fn test_strict_majority() {
        assert!(set(&[1, 2]).is_majority_of(&set(&[1, 2, 3])));
        assert!(set(&[1, 2, 3]).is_majority_of(&set(&[1, 2, 3, 4, 5])));
        // half is not a strict majority
        assert!(!set(&[1]).is_majority_of(&set(&[1, 2])));
        assert!(!set(&[1, 2]).is_majority_of(&set(&[1, 2, 3, 4])));
        assert!(!MemberSet::new().is_majority_of(&MemberSet::new()));
    }
}
