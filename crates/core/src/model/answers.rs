use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selected option per question index.
///
/// A missing key means "unanswered". Keys are only added by `record`, which
/// never overwrites: the first answer for an index is final until the whole
/// map is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<usize, usize>);

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Records `option` for `index` if the index is still unanswered.
    ///
    /// Returns `false` and leaves the map untouched when an answer already exists.
    pub fn record(&mut self, index: usize, option: usize) -> bool {
        if self.0.contains_key(&index) {
            return false;
        }
        self.0.insert(index, option);
        true
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<usize> {
        self.0.get(&index).copied()
    }

    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        self.0.contains_key(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Iterates `(question index, selected option)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(usize, usize)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (usize, usize)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
