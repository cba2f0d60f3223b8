use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type EntityId = u32;

/// Entity types a section references and a user can filter or color by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Block,
    Subject,
    Instructor,
    Building,
    Room,
}

impl EntityKind {
    /// Color specificity, most specific first.
    pub const COLOR_PRECEDENCE: [EntityKind; 5] = [
        EntityKind::Instructor,
        EntityKind::Room,
        EntityKind::Building,
        EntityKind::Subject,
        EntityKind::Block,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Block => "block",
            EntityKind::Subject => "subject",
            EntityKind::Instructor => "instructor",
            EntityKind::Building => "building",
            EntityKind::Room => "room",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(EntityKind::Block),
            "subject" => Ok(EntityKind::Subject),
            "instructor" => Ok(EntityKind::Instructor),
            "building" => Ok(EntityKind::Building),
            "room" => Ok(EntityKind::Room),
            other => Err(format!("unknown entity kind '{other}'")),
        }
    }
}

/// A subject or instructor as listed by the catalog.
///
/// `meta` is a cosmetic annotation (for example the owning block's name) added
/// when the entity was fetched in a block-scoped context. It is not identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl NamedEntity {
    pub fn new(id: EntityId, name: &str) -> Self {
        NamedEntity {
            id,
            name: name.to_string(),
            meta: None,
        }
    }
}

pub type Subject = NamedEntity;
pub type Instructor = NamedEntity;

pub trait Identified {
    fn id(&self) -> EntityId;
}

impl Identified for NamedEntity {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Drop repeated ids, keeping the first-seen instance and arrival order.
pub fn dedupe_by_id<T: Identified>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();

    items
        .into_iter()
        .filter(|item| seen.insert(item.id()))
        .collect()
}
