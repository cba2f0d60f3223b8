//! The dependent filter graph: term → blocks → {subjects, instructors, buildings}.
//!
//! Selections are edited synchronously. Every edit that changes an upstream field
//! cancels the derivations it invalidates and spawns new ones; the owner drives
//! them to completion with [`FilterGraph::next_change`] or [`FilterGraph::settle`].
//! A derivation that was superseded while in flight is discarded when it lands,
//! so options always reflect the latest upstream selection.

mod field;
mod restore;

pub use field::{Field, FieldState, FieldStatus};

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::catalog::EntityCatalog;
use crate::constants::BLOCK_SETTLE_DELAY;
use crate::model::{
    Block, BuildingOption, Color, CrossFilters, EntityId, EntityKind, FilterSelection,
    Identified, MeetingType, NamedEntity, RoomOption, Term, dedupe_by_id,
};
use field::Slot;
use restore::PendingRestore;

enum Options {
    Blocks { term: EntityId, blocks: Vec<Block> },
    Subjects(Vec<NamedEntity>),
    Instructors(Vec<NamedEntity>),
    Buildings(Vec<BuildingOption>),
}

struct Resolution {
    field: Field,
    generation: u64,
    /// `None` when the derivation was cancelled.
    options: Option<Options>,
}

pub struct FilterGraph {
    catalog: Arc<EntityCatalog>,
    selection: FilterSelection,

    blocks: FieldState<Block>,
    subjects: FieldState<NamedEntity>,
    instructors: FieldState<NamedEntity>,
    buildings: FieldState<BuildingOption>,
    disable_search: bool,

    session: CancellationToken,
    slots: HashMap<Field, Slot>,
    in_flight: JoinSet<Resolution>,

    /// The term the current block selection was made under.
    blocks_term: Option<EntityId>,
    pending_restore: Option<PendingRestore>,
}

impl FilterGraph {
    pub fn new(catalog: Arc<EntityCatalog>) -> Self {
        FilterGraph {
            catalog,
            selection: FilterSelection::default(),
            blocks: FieldState::Unset,
            subjects: FieldState::Unset,
            instructors: FieldState::Unset,
            buildings: FieldState::Unset,
            disable_search: true,
            session: CancellationToken::new(),
            slots: HashMap::new(),
            in_flight: JoinSet::new(),
            blocks_term: None,
            pending_restore: None,
        }
    }

    pub fn catalog(&self) -> &Arc<EntityCatalog> {
        &self.catalog
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn blocks(&self) -> &FieldState<Block> {
        &self.blocks
    }

    pub fn subjects(&self) -> &FieldState<NamedEntity> {
        &self.subjects
    }

    pub fn instructors(&self) -> &FieldState<NamedEntity> {
        &self.instructors
    }

    pub fn buildings(&self) -> &FieldState<BuildingOption> {
        &self.buildings
    }

    /// Rooms of every building option, in option order.
    pub fn rooms(&self) -> Vec<RoomOption> {
        self.buildings
            .options()
            .iter()
            .flat_map(|b| b.rooms.iter().cloned())
            .collect()
    }

    /// True while a search would be unconstrained: no blocks, or neither
    /// subjects nor instructors picked.
    pub fn disable_search(&self) -> bool {
        self.disable_search
    }

    pub fn status(&self, kind: EntityKind) -> FieldStatus {
        let has_selection = !self.selection.is_empty(kind);

        match kind {
            EntityKind::Block => FieldStatus::of(&self.blocks, has_selection),
            EntityKind::Subject => FieldStatus::of(&self.subjects, has_selection),
            EntityKind::Instructor => FieldStatus::of(&self.instructors, has_selection),
            EntityKind::Building | EntityKind::Room => {
                FieldStatus::of(&self.buildings, has_selection)
            }
        }
    }

    /// No derivation is in flight.
    pub fn is_settled(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Cancelling this token tears the graph down from outside.
    pub fn session_token(&self) -> CancellationToken {
        self.session.clone()
    }

    /// Every term on offer. A failed fetch yields no terms.
    pub async fn terms(&self) -> Vec<Term> {
        self.catalog.fetch_terms().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Terms unavailable");
            Vec::new()
        })
    }

    // EDITS:

    pub fn select_term(&mut self, term: Option<Term>) {
        let term_id = term.as_ref().map(|t| t.id);
        if self.selection.term.as_ref().map(|t| t.id) == term_id {
            return;
        }

        if self
            .pending_restore
            .as_ref()
            .is_some_and(|r| Some(r.term) != term_id)
        {
            self.pending_restore = None;
        }

        tracing::debug!(term = ?term_id, "Term changed");
        self.selection.term = term.clone();

        self.unset(Field::Blocks);
        self.selection.clear(EntityKind::Block);
        self.on_blocks_changed();

        if let Some(term) = term {
            self.derive_blocks(term);
        }
    }

    /// Replace the block selection with the ready options matching `ids`.
    /// Returns how many were selected.
    pub fn select_blocks(&mut self, ids: &[EntityId]) -> usize {
        let chosen = pick(self.blocks.options(), ids);
        let count = chosen.len();
        if !self.replace_ids(EntityKind::Block, &chosen) {
            return count;
        }

        self.selection.blocks = chosen;
        self.blocks_term = self.selection.term.as_ref().map(|t| t.id);
        self.on_blocks_changed();
        count
    }

    pub fn select_subjects(&mut self, ids: &[EntityId]) -> usize {
        let chosen = pick(self.subjects.options(), ids);
        let count = chosen.len();
        if !self.replace_ids(EntityKind::Subject, &chosen) {
            return count;
        }

        self.selection.subjects = chosen;
        self.on_subjects_changed();
        count
    }

    pub fn select_instructors(&mut self, ids: &[EntityId]) -> usize {
        let chosen = pick(self.instructors.options(), ids);
        let count = chosen.len();
        if !self.replace_ids(EntityKind::Instructor, &chosen) {
            return count;
        }

        self.selection.instructors = chosen;
        self.on_instructors_changed();
        count
    }

    pub fn select_buildings(&mut self, ids: &[EntityId]) -> usize {
        let chosen = pick(self.buildings.options(), ids);
        let count = chosen.len();
        if self.replace_ids(EntityKind::Building, &chosen) {
            self.selection.buildings = chosen;
            self.refresh_disable_search();
        }
        count
    }

    pub fn select_rooms(&mut self, ids: &[EntityId]) -> usize {
        let chosen = pick(&self.rooms(), ids);
        let count = chosen.len();
        if self.replace_ids(EntityKind::Room, &chosen) {
            self.selection.rooms = chosen;
            self.refresh_disable_search();
        }
        count
    }

    /// Remove one selected item and propagate as if the field was re-picked.
    pub fn deselect(&mut self, kind: EntityKind, id: EntityId) -> bool {
        if !self.selection.remove(kind, id) {
            return false;
        }

        match kind {
            EntityKind::Block => self.on_blocks_changed(),
            EntityKind::Subject => self.on_subjects_changed(),
            EntityKind::Instructor => self.on_instructors_changed(),
            EntityKind::Building | EntityKind::Room => self.refresh_disable_search(),
        }
        true
    }

    pub fn set_cross_filters(&mut self, cross: CrossFilters) {
        self.set_subjects_by_instructors(cross.subjects_by_instructors);
        self.set_instructors_by_subjects(cross.instructors_by_subjects);
    }

    /// Narrow subject options to the selected instructors.
    pub fn set_subjects_by_instructors(&mut self, on: bool) {
        let cross = &mut self.selection.ui.cross;
        if cross.subjects_by_instructors == on {
            return;
        }
        cross.subjects_by_instructors = on;

        // The constraint only bites with instructors picked.
        if !self.selection.instructors.is_empty() {
            self.derive_subjects();
        }
    }

    /// Narrow instructor options to the selected subjects.
    pub fn set_instructors_by_subjects(&mut self, on: bool) {
        let cross = &mut self.selection.ui.cross;
        if cross.instructors_by_subjects == on {
            return;
        }
        cross.instructors_by_subjects = on;

        if !self.selection.subjects.is_empty() {
            self.derive_instructors();
        }
    }

    pub fn set_show_all_day(&mut self, on: bool) {
        self.selection.ui.show_all_day = on;
    }

    pub fn set_meeting_types(&mut self, types: impl IntoIterator<Item = MeetingType>) {
        self.selection.ui.meeting_types = types.into_iter().collect::<BTreeSet<_>>();
    }

    pub fn set_color(&mut self, kind: EntityKind, id: EntityId, color: Color) {
        self.selection.ui.colors.set(kind, id, color);
    }

    pub fn remove_color(&mut self, kind: EntityKind, id: EntityId) -> Option<Color> {
        self.selection.ui.colors.remove(kind, id)
    }

    /// Color for a `"<kind>-<id>"` label, if one is set.
    pub fn color_for_label(&self, label: &str) -> Option<&Color> {
        self.selection.ui.colors.get_by_label(label)
    }

    /// Drop every selection, option list and in-flight derivation.
    pub fn clear(&mut self) {
        for field in Field::ALL {
            self.unset(field);
        }
        // Dropping the set aborts whatever was still running.
        self.in_flight = JoinSet::new();

        self.selection = FilterSelection::default();
        self.blocks_term = None;
        self.pending_restore = None;
        self.refresh_disable_search();
    }

    /// Reapply a saved selection. Saved ids are matched against freshly derived
    /// options field by field, so entities that no longer exist fall away.
    pub fn restore(&mut self, saved: FilterSelection) {
        self.clear();
        self.selection.ui = saved.ui.clone();

        let Some(term) = saved.term.clone() else {
            return;
        };

        tracing::debug!(term = term.id, "Restoring saved filters");
        self.pending_restore = Some(PendingRestore::capture(&saved, term.id));
        self.select_term(Some(term));
    }

    /// Cancel every outstanding derivation. The graph derives nothing afterwards.
    pub fn teardown(&mut self) {
        self.session.cancel();
        self.in_flight.abort_all();
    }

    // RESOLUTION:

    /// Wait for the next derivation to land and apply it. Returns the field that
    /// changed, or `None` once nothing is left in flight.
    pub async fn next_change(&mut self) -> Option<Field> {
        while let Some(joined) = self.in_flight.join_next().await {
            match joined {
                Ok(resolution) => {
                    if let Some(field) = self.apply(resolution) {
                        return Some(field);
                    }
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::warn!(error = %e, "Filter derivation panicked"),
            }
        }
        None
    }

    /// Apply derivations until nothing is in flight.
    pub async fn settle(&mut self) {
        while self.next_change().await.is_some() {}
    }

    fn apply(&mut self, resolution: Resolution) -> Option<Field> {
        let Resolution {
            field,
            generation,
            options,
        } = resolution;

        let slot = self.slots.entry(field).or_default();
        if slot.generation != generation {
            tracing::debug!(%field, generation, "Discarding stale options");
            return None;
        }
        let options = options?;
        slot.token = None;

        match options {
            Options::Blocks { term, blocks } => {
                tracing::debug!(count = blocks.len(), "Block options ready");
                self.blocks = FieldState::Ready(blocks);
                self.after_blocks_ready(term);
            }
            Options::Subjects(subjects) => {
                tracing::debug!(count = subjects.len(), "Subject options ready");
                self.subjects = FieldState::Ready(subjects);
                self.retain_offered(EntityKind::Subject);
                self.restore_field(EntityKind::Subject);
            }
            Options::Instructors(instructors) => {
                tracing::debug!(count = instructors.len(), "Instructor options ready");
                self.instructors = FieldState::Ready(instructors);
                self.retain_offered(EntityKind::Instructor);
                self.restore_field(EntityKind::Instructor);
            }
            Options::Buildings(buildings) => {
                tracing::debug!(count = buildings.len(), "Building options ready");
                self.buildings = FieldState::Ready(buildings);
                self.retain_offered(EntityKind::Building);
                self.retain_offered(EntityKind::Room);
                self.restore_field(EntityKind::Building);
            }
        }

        Some(field)
    }

    fn after_blocks_ready(&mut self, term: EntityId) {
        if let Some(restore) = self.pending_restore.as_mut().filter(|r| r.term == term) {
            let ids = restore.take(EntityKind::Block).unwrap_or_default();
            self.selection.blocks = pick(self.blocks.options(), &ids);
            self.blocks_term = Some(term);

            if self.selection.blocks.is_empty() {
                self.pending_restore = None;
            }
            self.on_blocks_changed();
            return;
        }

        if !self.selection.blocks.is_empty() && self.blocks_term == Some(term) {
            return;
        }

        if let Some(full) = self.blocks.options().iter().find(|b| b.is_full_term()).cloned() {
            tracing::debug!(block = full.id, "Selecting full-term block");
            self.selection.blocks = vec![full];
            self.blocks_term = Some(term);
            self.on_blocks_changed();
        }
    }

    fn restore_field(&mut self, kind: EntityKind) {
        let Some(restore) = self.pending_restore.as_mut() else {
            return;
        };

        // A list narrowed by a field that is still being restored will be
        // derived again once that field is back; match against that one.
        let cross = &self.selection.ui.cross;
        let waits = match kind {
            EntityKind::Instructor => {
                cross.instructors_by_subjects && restore.contains(EntityKind::Subject)
            }
            EntityKind::Subject => {
                cross.subjects_by_instructors
                    && !cross.instructors_by_subjects
                    && restore.contains(EntityKind::Instructor)
            }
            _ => false,
        };
        if waits {
            return;
        }

        let Some(ids) = restore.take(kind) else {
            return;
        };
        let room_ids = match kind {
            EntityKind::Building => restore.take(EntityKind::Room),
            _ => None,
        };
        if restore.is_done() {
            self.pending_restore = None;
        }

        match kind {
            EntityKind::Subject => {
                self.selection.subjects = pick(self.subjects.options(), &ids);
                self.on_subjects_changed();
            }
            EntityKind::Instructor => {
                self.selection.instructors = pick(self.instructors.options(), &ids);
                self.on_instructors_changed();
            }
            EntityKind::Building => {
                self.selection.buildings = pick(self.buildings.options(), &ids);
                if let Some(room_ids) = room_ids {
                    self.selection.rooms = pick(&self.rooms(), &room_ids);
                }
                self.refresh_disable_search();
            }
            EntityKind::Block | EntityKind::Room => {}
        }
    }

    /// Drop selected items of `kind` that fresh options no longer offer.
    fn retain_offered(&mut self, kind: EntityKind) {
        let ids = self.selection.ids(kind);
        if ids.is_empty() {
            return;
        }

        match kind {
            EntityKind::Subject => {
                let kept = pick(self.subjects.options(), &ids);
                if self.replace_ids(kind, &kept) {
                    tracing::debug!(kept = kept.len(), "Subjects no longer offered dropped");
                    self.selection.subjects = kept;
                    self.on_subjects_changed();
                }
            }
            EntityKind::Instructor => {
                let kept = pick(self.instructors.options(), &ids);
                if self.replace_ids(kind, &kept) {
                    tracing::debug!(kept = kept.len(), "Instructors no longer offered dropped");
                    self.selection.instructors = kept;
                    self.on_instructors_changed();
                }
            }
            EntityKind::Building => {
                let kept = pick(self.buildings.options(), &ids);
                if self.replace_ids(kind, &kept) {
                    self.selection.buildings = kept;
                }
            }
            EntityKind::Room => {
                let kept = pick(&self.rooms(), &ids);
                if self.replace_ids(kind, &kept) {
                    self.selection.rooms = kept;
                }
            }
            EntityKind::Block => {}
        }
    }

    // PROPAGATION:

    fn on_blocks_changed(&mut self) {
        if self.selection.blocks.is_empty() {
            for field in [Field::Subjects, Field::Instructors, Field::Buildings] {
                self.unset(field);
            }
            for kind in [
                EntityKind::Subject,
                EntityKind::Instructor,
                EntityKind::Building,
                EntityKind::Room,
            ] {
                self.selection.clear(kind);
            }
        } else {
            self.derive_subjects();
            self.derive_instructors();
            self.derive_buildings();
        }

        self.refresh_disable_search();
    }

    fn on_subjects_changed(&mut self) {
        if self.selection.ui.cross.instructors_by_subjects {
            self.derive_instructors();
        }
        self.refresh_disable_search();
    }

    fn on_instructors_changed(&mut self) {
        if self.selection.ui.cross.subjects_by_instructors {
            self.derive_subjects();
        }
        self.refresh_disable_search();
    }

    fn refresh_disable_search(&mut self) {
        let selection = &self.selection;
        self.disable_search = selection.blocks.is_empty()
            || (selection.subjects.is_empty() && selection.instructors.is_empty());
    }

    /// Drop the options of `field` and anything deriving it.
    fn unset(&mut self, field: Field) {
        self.slots.entry(field).or_default().advance();

        match field {
            Field::Blocks => self.blocks = FieldState::Unset,
            Field::Subjects => self.subjects = FieldState::Unset,
            Field::Instructors => self.instructors = FieldState::Unset,
            Field::Buildings => self.buildings = FieldState::Unset,
        }
    }

    /// Drop colors of ids leaving `kind`. Returns false when the selection
    /// would not change.
    fn replace_ids<T: Identified>(&mut self, kind: EntityKind, chosen: &[T]) -> bool {
        let keep: Vec<EntityId> = chosen.iter().map(Identified::id).collect();
        let current = self.selection.ids(kind);
        if current == keep {
            return false;
        }

        for id in current.into_iter().filter(|id| !keep.contains(id)) {
            self.selection.ui.colors.remove(kind, id);
        }
        true
    }

    // DERIVATIONS:

    fn derive_blocks(&mut self, term: Term) {
        let catalog = Arc::clone(&self.catalog);
        self.blocks = FieldState::Loading;

        self.spawn(Field::Blocks, async move {
            // Let the term selection settle before listing its blocks.
            tokio::time::sleep(BLOCK_SETTLE_DELAY).await;
            Options::Blocks {
                term: term.id,
                blocks: catalog.blocks_for(&term),
            }
        });
    }

    fn derive_subjects(&mut self) {
        if self.selection.blocks.is_empty() {
            self.unset(Field::Subjects);
            self.selection.clear(EntityKind::Subject);
            return;
        }

        let catalog = Arc::clone(&self.catalog);
        let blocks = self.selection.blocks.clone();
        let instructors = (self.selection.ui.cross.subjects_by_instructors
            && !self.selection.instructors.is_empty())
        .then(|| self.selection.instructors.clone());
        self.subjects = FieldState::Loading;

        self.spawn(Field::Subjects, async move {
            let subjects = catalog
                .fetch_subjects(&blocks, instructors.as_deref())
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Subject options unavailable");
                    Vec::new()
                });
            Options::Subjects(subjects)
        });
    }

    fn derive_instructors(&mut self) {
        if self.selection.blocks.is_empty() {
            self.unset(Field::Instructors);
            self.selection.clear(EntityKind::Instructor);
            return;
        }

        let catalog = Arc::clone(&self.catalog);
        let blocks = self.selection.blocks.clone();
        let subjects = (self.selection.ui.cross.instructors_by_subjects
            && !self.selection.subjects.is_empty())
        .then(|| self.selection.subjects.clone());
        self.instructors = FieldState::Loading;

        self.spawn(Field::Instructors, async move {
            let instructors = catalog
                .fetch_instructors(&blocks, subjects.as_deref())
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Instructor options unavailable");
                    Vec::new()
                });
            Options::Instructors(instructors)
        });
    }

    fn derive_buildings(&mut self) {
        let catalog = Arc::clone(&self.catalog);
        let blocks = self.selection.blocks.clone();
        self.buildings = FieldState::Loading;

        self.spawn(Field::Buildings, async move {
            let buildings = catalog.fetch_buildings(&blocks).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Building options unavailable");
                Vec::new()
            });
            Options::Buildings(buildings)
        });
    }

    fn spawn<F>(&mut self, field: Field, work: F)
    where
        F: Future<Output = Options> + Send + 'static,
    {
        let slot = self.slots.entry(field).or_default();
        let generation = slot.advance();

        if self.session.is_cancelled() {
            tracing::debug!(%field, "Graph torn down, not deriving");
            self.unset(field);
            return;
        }

        let token = self.session.child_token();
        slot.token = Some(token.clone());

        self.in_flight.spawn(async move {
            let options = tokio::select! {
                _ = token.cancelled() => None,
                options = work => Some(options),
            };
            Resolution {
                field,
                generation,
                options,
            }
        });
    }
}

impl Drop for FilterGraph {
    fn drop(&mut self) {
        self.session.cancel();
    }
}

/// The options matching `ids`, in `ids` order.
fn pick<T: Identified + Clone>(options: &[T], ids: &[EntityId]) -> Vec<T> {
    dedupe_by_id(
        ids.iter()
            .filter_map(|id| options.iter().find(|o| o.id() == *id).cloned()),
    )
}
