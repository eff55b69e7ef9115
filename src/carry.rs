//! Carries: the application payload bundles a group agrees on.
//!
//! A [`Carry`] is a named bundle of opaque payload data proposed for agreement. During one round
//! every member accumulates the carries it has seen into a [`CarryBatch`]; keeping the batch
//! deduplicated and sorted by ID makes it independent of the order votes arrive in, so members
//! merging the same votes in different orders still reach identical batches.

use core::cmp::Ordering;
use core::fmt;

use bytes::Bytes;

/// The unique identifier of a [`Carry`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CarryId {
    /// The non-negative integer assigned to this carry.
    pub id: u64,
}

/// The smallest unit of application payload, immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementaryCarry {
    id: CarryId,
    data: Bytes,
}

/// A named bundle of [`ElementaryCarry`] payloads.
///
/// Equality and batch membership track the ID only; payloads are never compared.
#[derive(Clone, Debug)]
pub struct Carry {
    id: CarryId,
    parts: Vec<ElementaryCarry>,
}

/// The deduplicated, sorted-by-ID collection of carries accumulated during one round.
///
/// A batch is owned by exactly one round of one state machine and cleared when the round resets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CarryBatch {
    carries: Vec<Carry>,
}

//
// ElementaryCarry impls
//

impl ElementaryCarry {
    /// Constructs a payload unit with the given ID and data.
    pub fn new(id: CarryId, data: Bytes) -> Self {
        Self { id, data }
    }

    /// Returns the ID of this payload unit.
    pub fn id(&self) -> CarryId {
        self.id
    }

    /// Returns the payload data of this unit.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

//
// Carry impls
//

impl Carry {
    /// Constructs a carry holding a single payload unit.
    pub fn new(id: CarryId, part: ElementaryCarry) -> Self {
        Self {
            id,
            parts: vec![part],
        }
    }

    /// Returns the ID of this carry.
    pub fn id(&self) -> CarryId {
        self.id
    }

    /// Appends a payload unit to this carry.
    pub fn push(&mut self, part: ElementaryCarry) {
        self.parts.push(part);
    }

    /// Returns the number of payload units in this carry.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns whether this carry holds no payload units.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns an iterator over the payload units of this carry.
    pub fn parts(&self) -> impl Iterator<Item = &ElementaryCarry> {
        self.parts.iter()
    }
}

impl PartialEq for Carry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Carry {}

impl fmt::Display for Carry {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { id, parts } = self;
        fmt.debug_struct("Carry")
            .field("id", &id.id)
            .field("parts", &parts.len())
            .finish()
    }
}

//
// CarryBatch impls
//

impl CarryBatch {
    /// Constructs an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a carry at its sorted position, or does nothing if a carry with the same ID is
    /// already present.
    pub fn append(&mut self, carry: Carry) {
        if let Err(position) = self.position(carry.id) {
            self.carries.insert(position, carry);
        }
    }

    /// Appends every carry of `other` not already present in this batch.
    pub fn union(&mut self, other: &CarryBatch) {
        for carry in &other.carries {
            self.append(carry.clone());
        }
    }

    /// Returns whether a carry with the same ID as `carry` is present in this batch.
    pub fn contains(&self, carry: &Carry) -> bool {
        self.position(carry.id).is_ok()
    }

    /// Returns the carry at a given index in ID order.
    pub fn get(&self, index: usize) -> Option<&Carry> {
        self.carries.get(index)
    }

    /// Returns an iterator over the carries of this batch in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Carry> {
        self.carries.iter()
    }

    /// Returns the number of carries in this batch.
    pub fn len(&self) -> usize {
        self.carries.len()
    }

    /// Returns whether this batch holds no carries.
    pub fn is_empty(&self) -> bool {
        self.carries.is_empty()
    }

    /// Removes all carries.
    pub fn clear(&mut self) {
        self.carries.clear();
    }

    fn position(&self, id: CarryId) -> Result<usize, usize> {
        self.carries.binary_search_by(|carry| carry.id.cmp(&id))
    }
}

impl From<Carry> for CarryBatch {
    fn from(carry: Carry) -> Self {
        Self {
            carries: vec![carry],
        }
    }
}

//
// CarryId impls
//

impl fmt::Display for CarryId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { id } = self;
        fmt.debug_tuple("Carry").field(id).finish()
    }
}

impl PartialOrd for CarryId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CarryId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carry(id: u64) -> Carry {
        carry_with_data(id, Bytes::new())
    }

    fn carry_with_data(id: u64, data: Bytes) -> Carry {
        let id = CarryId { id };
        Carry::new(id, ElementaryCarry::new(id, data))
    }

    fn batch(ids: &[u64]) -> CarryBatch {
        let mut batch = CarryBatch::new();
        for &id in ids {
            batch.append(carry(id));
        }
        batch
    }

    #[test]
    fn test_append_keeps_ids_sorted() {
        let batch = batch(&[9, 2, 5]);
        let ids: Vec<u64> = batch.iter().map(|carry| carry.id().id).collect();
        assert_eq!(ids, [2, 5, 9]);
    }

    #[test]
    fn test_append_ignores_duplicate_ids() {
        let mut lhs = batch(&[1]);
        lhs.append(carry_with_data(1, Bytes::from_static(b"other payload")));
        assert_eq!(lhs.len(), 1);
        assert_eq!(lhs.get(0).map(|carry| carry.parts().count()), Some(1));
    }

    #[test]
    fn test_union_is_order_independent() {
        let mut lhs = batch(&[1, 4]);
        lhs.union(&batch(&[2, 4, 8]));

        let mut rhs = batch(&[2, 4, 8]);
        rhs.union(&batch(&[1, 4]));

        assert_eq!(lhs, rhs);
        assert_eq!(lhs, batch(&[1, 2, 4, 8]));
    }

    #[test]
    fn test_equality_ignores_payload() {
        let mut lhs = CarryBatch::new();
        lhs.append(carry_with_data(3, Bytes::from_static(b"lhs")));
        let mut rhs = CarryBatch::new();
        rhs.append(carry_with_data(3, Bytes::from_static(b"rhs")));
        assert_eq!(lhs, rhs);
        assert_ne!(lhs, batch(&[4]));
        assert_ne!(lhs, batch(&[3, 4]));
    }

    #[test]
    fn test_clear() {
        let mut batch = batch(&[1, 2]);
        batch.clear();
        assert!(batch.is_empty());
        assert!(!batch.contains(&carry(1)));
    }
}
