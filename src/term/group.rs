use std::ops::{BitAnd, BitOr};

use serde::{Deserialize, Serialize};

use crate::HpoTermId;

/// A set of [`HpoTermId`] representing a group of HPO terms
///
/// Each term can occur only once in the group and the ids are kept
/// sorted, so that lookups are binary searches.
///
/// The group is used e.g. for the ancestors or descendants of a term,
/// or for the query terms of a classifier.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpoGroup {
    ids: Vec<HpoTermId>,
}

impl HpoGroup {
    /// Constructs a new, empty [`HpoGroup`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a new, empty [`HpoGroup`] with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Returns `true` if the group contains no [`HpoTermId`]s
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the number of [`HpoTermId`]s in the group
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Adds a new [`HpoTermId`] to the group
    ///
    /// Returns whether the `HpoTermId` was newly inserted. That is:
    ///
    /// - If the group did not previously contain this `HpoTermId`, true is returned.
    /// - If the group already contained this `HpoTermId`, false is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use phenocorr::term::HpoGroup;
    ///
    /// let mut group = HpoGroup::new();
    /// assert!(group.insert(12u32));
    /// assert!(!group.insert(12u32));
    /// assert_eq!(group.len(), 1);
    /// ```
    pub fn insert<I: Into<HpoTermId>>(&mut self, id: I) -> bool {
        let id = id.into();
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(idx) => {
                self.ids.insert(idx, id);
                true
            }
        }
    }

    /// Adds a new [`HpoTermId`] to the end of the group
    ///
    /// The caller must ensure that `id` is larger than every id already present
    fn insert_unchecked(&mut self, id: HpoTermId) {
        self.ids.push(id);
    }

    /// Returns `true` if the group contains the [`HpoTermId`]
    pub fn contains(&self, id: &HpoTermId) -> bool {
        self.ids.binary_search(id).is_ok()
    }

    /// Returns an Iterator of the [`HpoTermId`]s inside the group
    pub fn iter(&self) -> HpoTermIds<'_> {
        HpoTermIds::new(self.ids.iter())
    }

    /// Returns the [`HpoTermId`] at the given index
    ///
    /// If the index is out of bounds, `None` is returned.
    pub fn get(&self, index: usize) -> Option<&HpoTermId> {
        self.ids.get(index)
    }
}

impl FromIterator<HpoTermId> for HpoGroup {
    fn from_iter<T: IntoIterator<Item = HpoTermId>>(iter: T) -> Self {
        let mut ids: Vec<HpoTermId> = iter.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }
}

impl<'a> IntoIterator for &'a HpoGroup {
    type Item = HpoTermId;
    type IntoIter = HpoTermIds<'a>;

    fn into_iter(self) -> HpoTermIds<'a> {
        HpoTermIds::new(self.ids.iter())
    }
}

/// An iterator over [`HpoTermId`]s
pub struct HpoTermIds<'a> {
    inner: std::slice::Iter<'a, HpoTermId>,
}

impl<'a> HpoTermIds<'a> {
    fn new(inner: std::slice::Iter<'a, HpoTermId>) -> Self {
        Self { inner }
    }
}

impl Iterator for HpoTermIds<'_> {
    type Item = HpoTermId;
    fn next(&mut self) -> Option<HpoTermId> {
        self.inner.next().copied()
    }
}

impl BitOr for &HpoGroup {
    type Output = HpoGroup;

    fn bitor(self, rhs: &HpoGroup) -> HpoGroup {
        let mut group = HpoGroup::with_capacity(self.len() + rhs.len());
        let (mut left, mut right) = (self.ids.iter().peekable(), rhs.ids.iter().peekable());
        loop {
            let next = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) if l < r => left.next(),
                (Some(l), Some(r)) if l > r => right.next(),
                (Some(_), Some(_)) => {
                    right.next();
                    left.next()
                }
                (Some(_), None) => left.next(),
                (None, Some(_)) => right.next(),
                (None, None) => break,
            };
            if let Some(id) = next {
                group.insert_unchecked(*id);
            }
        }
        group
    }
}

impl BitAnd for &HpoGroup {
    type Output = HpoGroup;

    fn bitand(self, rhs: &HpoGroup) -> HpoGroup {
        let (large, small) = if self.len() > rhs.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let mut group = HpoGroup::with_capacity(small.len());
        for id in &small.ids {
            if large.contains(id) {
                group.insert_unchecked(*id);
            }
        }
        group
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn iterate_group() {
        let mut group = HpoGroup::new();
        group.insert(3u32);
        group.insert(1u32);
        group.insert(2u32);

        let ids: Vec<u32> = group.iter().map(|id| id.as_u32()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn collect_deduplicates() {
        let group: HpoGroup = [5u32, 1, 5, 3]
            .into_iter()
            .map(HpoTermId::from)
            .collect();
        assert_eq!(group.len(), 3);
        assert!(group.contains(&5u32.into()));
        assert!(!group.contains(&4u32.into()));
    }

    #[test]
    fn union_and_intersection() {
        let a: HpoGroup = [1u32, 2, 4].into_iter().map(HpoTermId::from).collect();
        let b: HpoGroup = [2u32, 3, 4, 6].into_iter().map(HpoTermId::from).collect();

        let union = &a | &b;
        let ids: Vec<u32> = union.iter().map(|id| id.as_u32()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 6]);

        let common = &a & &b;
        let ids: Vec<u32> = common.iter().map(|id| id.as_u32()).collect();
        assert_eq!(ids, vec![2, 4]);
    }
}
