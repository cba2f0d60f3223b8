use std::collections::HashMap;

use crate::model::{EntityId, EntityKind, FilterSelection};

/// Saved ids waiting for their field's options to resolve.
#[derive(Debug)]
pub(crate) struct PendingRestore {
    pub term: EntityId,
    ids: HashMap<EntityKind, Vec<EntityId>>,
}

impl PendingRestore {
    pub fn capture(saved: &FilterSelection, term: EntityId) -> Self {
        let ids = [
            EntityKind::Block,
            EntityKind::Subject,
            EntityKind::Instructor,
            EntityKind::Building,
            EntityKind::Room,
        ]
        .into_iter()
        .map(|kind| (kind, saved.ids(kind)))
        .filter(|(_, ids)| !ids.is_empty())
        .collect();

        PendingRestore { term, ids }
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.ids.contains_key(&kind)
    }

    pub fn take(&mut self, kind: EntityKind) -> Option<Vec<EntityId>> {
        self.ids.remove(&kind)
    }

    pub fn is_done(&self) -> bool {
        self.ids.is_empty()
    }
}
