//! Mapping between graph vertex ids and dense helper-problem indices.

use std::collections::BTreeMap;

use crate::models::VertexId;

/// Bidirectional table between vertex ids and indices `0..len`.
///
/// Built for one matching or flow instance and dropped with it, so indices
/// never leak between unrelated helper problems.
#[derive(Debug, Clone, Default)]
pub(crate) struct Correspondence {
    ids: Vec<VertexId>,
    index: BTreeMap<VertexId, usize>,
}

impl Correspondence {
    /// Assigns indices in iteration order, skipping repeated ids.
    pub(crate) fn new(ids: impl IntoIterator<Item = VertexId>) -> Self {
        let mut table = Self::default();
        for id in ids {
            if !table.index.contains_key(&id) {
                table.index.insert(id, table.ids.len());
                table.ids.push(id);
            }
        }
        table
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn index_of(&self, id: VertexId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub(crate) fn vertex(&self, index: usize) -> Option<VertexId> {
        self.ids.get(index).copied()
    }

    pub(crate) fn ids(&self) -> &[VertexId] {
        &self.ids
    }
}
