//! # Dense Component Table
//!
//! Live records packed at the front of a `Vec`. Deleting moves the last
//! record into the hole:
//!
//! ```text
//! before: [A][B][C][D]      destroy B
//! after:  [A][D][C]         D moved 3 -> 1, caller patches D's slot
//! ```
//!
//! The table itself knows nothing about IDs beyond reporting who moved.

use cadence_shared::SgId;

/// Anything that can live in a [`DenseTable`].
pub trait TableRecord {
    /// The record's ID.
    fn id(&self) -> SgId;

    /// The record's display name.
    fn name(&self) -> &str;

    /// Replaces the display name (clamped to the name limit).
    fn set_name(&mut self, name: &str);
}

/// A densely packed table of records.
#[derive(Clone, Debug)]
pub struct DenseTable<T> {
    records: Vec<T>,
}

impl<T> Default for DenseTable<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: TableRecord> DenseTable<T> {
    /// Creates a table with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Number of live records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the table holds nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record and returns its index.
    pub fn push(&mut self, record: T) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Record at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.records.get(index)
    }

    /// Mutable record at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.records.get_mut(index)
    }

    /// Removes the record at `index`, filling the hole with the last record.
    ///
    /// Returns the removed record and, if a record was moved, its ID. The
    /// moved record now lives at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn swap_remove(&mut self, index: usize) -> (T, Option<SgId>) {
        let removed = self.records.swap_remove(index);
        let moved = self.records.get(index).map(TableRecord::id);
        (removed, moved)
    }

    /// Iterates records in storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// Mutably iterates records in storage order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.records.iter_mut()
    }

    /// All records as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row {
        id: SgId,
        name: String,
    }

    impl TableRecord for Row {
        fn id(&self) -> SgId {
            self.id
        }
        fn name(&self) -> &str {
            &self.name
        }
        fn set_name(&mut self, name: &str) {
            self.name = name.to_owned();
        }
    }

    fn row(id: u64) -> Row {
        Row {
            id: SgId(id),
            name: format!("row{id}"),
        }
    }

    #[test]
    fn test_swap_remove_middle_reports_moved() {
        let mut table = DenseTable::default();
        for id in 1..=4 {
            table.push(row(id));
        }

        let (removed, moved) = table.swap_remove(1);
        assert_eq!(removed.id, SgId(2));
        assert_eq!(moved, Some(SgId(4)));
        assert_eq!(table.get(1).map(|r| r.id), Some(SgId(4)));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_swap_remove_last_moves_nothing() {
        let mut table = DenseTable::with_capacity(2);
        table.push(row(1));
        table.push(row(2));

        let (removed, moved) = table.swap_remove(1);
        assert_eq!(removed.id, SgId(2));
        assert_eq!(moved, None);
    }
}
