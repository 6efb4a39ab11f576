use crate::extractor::{Identifier, MembershipSet};
use serde::Serialize;
use std::collections::BTreeSet;

/// Accounts present in "following" but absent from "followers", strictly
/// ascending by byte value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiffResult(Vec<Identifier>);

impl DiffResult {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identifier> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Identifier] {
        &self.0
    }
}

impl FromIterator<Identifier> for DiffResult {
    fn from_iter<I: IntoIterator<Item = Identifier>>(iter: I) -> Self {
        let ordered: BTreeSet<Identifier> = iter.into_iter().collect();
        Self(ordered.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a Identifier;
    type IntoIter = std::slice::Iter<'a, Identifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub fn diff(following: &MembershipSet, followers: &MembershipSet) -> DiffResult {
    let mut missing: Vec<Identifier> = following
        .iter()
        .filter(|id| !followers.contains(id))
        .cloned()
        .collect();

    // Set members are unique, so sorting alone keeps the output duplicate-free.
    missing.sort_unstable();
    DiffResult(missing)
}
