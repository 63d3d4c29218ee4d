use std::collections::hash_map::Values;
use std::collections::HashMap;

use crate::term::HpoGroup;
use crate::HpoTermId;

/// The internal representation of a term inside the [`Ontology`](crate::Ontology)
#[derive(Debug)]
pub(crate) struct TermInternal {
    id: HpoTermId,
    name: String,
    parents: HpoGroup,
    children: HpoGroup,
    all_parents: HpoGroup,
}

impl TermInternal {
    pub fn new(name: String, id: HpoTermId) -> Self {
        Self {
            id,
            name,
            parents: HpoGroup::new(),
            children: HpoGroup::new(),
            all_parents: HpoGroup::new(),
        }
    }

    pub fn id(&self) -> &HpoTermId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parents(&self) -> &HpoGroup {
        &self.parents
    }

    pub fn children(&self) -> &HpoGroup {
        &self.children
    }

    pub fn all_parents(&self) -> &HpoGroup {
        &self.all_parents
    }

    pub fn all_parents_mut(&mut self) -> &mut HpoGroup {
        &mut self.all_parents
    }

    pub fn parents_cached(&self) -> bool {
        self.parents.is_empty() || !self.all_parents.is_empty()
    }

    pub fn add_parent(&mut self, parent_id: HpoTermId) {
        self.parents.insert(parent_id);
    }

    pub fn add_child(&mut self, child_id: HpoTermId) {
        self.children.insert(child_id);
    }
}

#[derive(Default)]
pub(crate) struct Arena {
    terms: HashMap<HpoTermId, TermInternal>,
}

impl Arena {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn insert(&mut self, term: TermInternal) {
        self.terms.insert(*term.id(), term);
    }

    pub fn get(&self, id: HpoTermId) -> Option<&TermInternal> {
        self.terms.get(&id)
    }

    pub fn get_mut(&mut self, id: HpoTermId) -> Option<&mut TermInternal> {
        self.terms.get_mut(&id)
    }

    pub fn values(&self) -> Values<'_, HpoTermId, TermInternal> {
        self.terms.values()
    }

    pub fn keys(&self) -> Vec<HpoTermId> {
        let mut keys: Vec<HpoTermId> = self.terms.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}
