//! The live filter selection and its UI-only sub-filters.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_EVENT_COLOR;
use crate::error::ClassplanError;
use crate::model::building::{BuildingOption, RoomOption};
use crate::model::entity::{EntityId, EntityKind, NamedEntity};
use crate::model::section::MeetingType;
use crate::model::term::{Block, Term};

/// A hex color, normalized to lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Color(DEFAULT_EVENT_COLOR.to_string())
    }
}

impl FromStr for Color {
    type Err = ClassplanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let valid = s
            .strip_prefix('#')
            .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));

        if !valid {
            return Err(ClassplanError::InvalidColor(s.to_string()));
        }

        Ok(Color(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Color {
    type Error = ClassplanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{kind}-{id}`, the label a rendering layer attaches to a selected option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorKey {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

impl FromStr for ColorKey {
    type Err = ClassplanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClassplanError::InvalidColorKey(s.to_string());
        let (kind, id) = s.split_once('-').ok_or_else(invalid)?;

        Ok(ColorKey {
            kind: kind.parse().map_err(|_| invalid())?,
            id: id.parse().map_err(|_| invalid())?,
        })
    }
}

/// Per-entity color overrides, keyed by entity kind then id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorMatrix {
    entries: BTreeMap<EntityKind, BTreeMap<EntityId, Color>>,
}

impl ColorMatrix {
    pub fn set(&mut self, kind: EntityKind, id: EntityId, color: Color) {
        self.entries.entry(kind).or_default().insert(id, color);
    }

    pub fn remove(&mut self, kind: EntityKind, id: EntityId) -> Option<Color> {
        let colors = self.entries.get_mut(&kind)?;
        let removed = colors.remove(&id);

        if colors.is_empty() {
            self.entries.remove(&kind);
        }

        removed
    }

    pub fn get(&self, kind: EntityKind, id: EntityId) -> Option<&Color> {
        self.entries.get(&kind)?.get(&id)
    }

    pub fn get_by_key(&self, key: ColorKey) -> Option<&Color> {
        self.get(key.kind, key.id)
    }

    /// Pure label lookup for rendering layers, e.g. `"subject-12"`.
    pub fn get_by_label(&self, label: &str) -> Option<&Color> {
        self.get_by_key(label.parse().ok()?)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColorKey, &Color)> {
        self.entries.iter().flat_map(|(kind, colors)| {
            colors
                .iter()
                .map(|(id, color)| (ColorKey { kind: *kind, id: *id }, color))
        })
    }
}

/// The two cross-filter toggles. Each only narrows an option list, it never
/// changes which lists are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossFilters {
    #[serde(rename = "filterSubjectsByInstructors")]
    pub subjects_by_instructors: bool,
    #[serde(rename = "filterInstructorsBySubjects")]
    pub instructors_by_subjects: bool,
}

impl Default for CrossFilters {
    fn default() -> Self {
        CrossFilters {
            subjects_by_instructors: false,
            instructors_by_subjects: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiFilters {
    pub show_all_day: bool,
    pub meeting_types: BTreeSet<MeetingType>,
    pub colors: ColorMatrix,
    pub cross: CrossFilters,
}

impl Default for UiFilters {
    fn default() -> Self {
        UiFilters {
            show_all_day: false,
            meeting_types: BTreeSet::from([MeetingType::Class]),
            colors: ColorMatrix::default(),
            cross: CrossFilters::default(),
        }
    }
}

/// What the user has picked in each filter field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub term: Option<Term>,
    pub blocks: Vec<Block>,
    pub subjects: Vec<NamedEntity>,
    pub instructors: Vec<NamedEntity>,
    pub buildings: Vec<BuildingOption>,
    pub rooms: Vec<RoomOption>,
    pub ui: UiFilters,
}

impl FilterSelection {
    pub fn ids(&self, kind: EntityKind) -> Vec<EntityId> {
        match kind {
            EntityKind::Block => self.blocks.iter().map(|b| b.id).collect(),
            EntityKind::Subject => self.subjects.iter().map(|s| s.id).collect(),
            EntityKind::Instructor => self.instructors.iter().map(|i| i.id).collect(),
            EntityKind::Building => self.buildings.iter().map(|b| b.id).collect(),
            EntityKind::Room => self.rooms.iter().map(|r| r.id).collect(),
        }
    }

    pub fn is_empty(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Block => self.blocks.is_empty(),
            EntityKind::Subject => self.subjects.is_empty(),
            EntityKind::Instructor => self.instructors.is_empty(),
            EntityKind::Building => self.buildings.is_empty(),
            EntityKind::Room => self.rooms.is_empty(),
        }
    }

    /// Empty one field. Returns false (and touches nothing) when it was already empty.
    pub fn clear(&mut self, kind: EntityKind) -> bool {
        if self.is_empty(kind) {
            return false;
        }

        match kind {
            EntityKind::Block => self.blocks.clear(),
            EntityKind::Subject => self.subjects.clear(),
            EntityKind::Instructor => self.instructors.clear(),
            EntityKind::Building => self.buildings.clear(),
            EntityKind::Room => self.rooms.clear(),
        }

        true
    }

    /// Remove one selected item together with its color entry.
    pub fn remove(&mut self, kind: EntityKind, id: EntityId) -> bool {
        let before = self.ids(kind).len();

        match kind {
            EntityKind::Block => self.blocks.retain(|b| b.id != id),
            EntityKind::Subject => self.subjects.retain(|s| s.id != id),
            EntityKind::Instructor => self.instructors.retain(|i| i.id != id),
            EntityKind::Building => self.buildings.retain(|b| b.id != id),
            EntityKind::Room => self.rooms.retain(|r| r.id != id),
        }

        self.ui.colors.remove(kind, id);

        before != self.ids(kind).len()
    }
}
