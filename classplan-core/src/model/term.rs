use serde::{Deserialize, Serialize};

use crate::constants::FULL_TERM_BLOCK_NAMES;
use crate::model::entity::{EntityId, Identified};

/// An academic term and its ordered sub-term blocks. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: EntityId,
    pub name: String,
    pub year: i32,
    pub semester: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// The term fields a block carries back to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRef {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub semester: String,
}

/// A sub-term window inside a term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<TermRef>,
}

impl Term {
    pub fn to_ref(&self) -> TermRef {
        TermRef {
            id: self.id,
            name: self.name.clone(),
            year: self.year,
            semester: self.semester.clone(),
        }
    }

    /// Fill in each block's back-reference to this term.
    pub fn link_blocks(mut self) -> Self {
        let owner = self.to_ref();
        for block in &mut self.blocks {
            block.term = Some(owner.clone());
        }
        self
    }

    /// The block selected by default when this term's blocks first resolve.
    pub fn full_term_block(&self) -> Option<&Block> {
        self.blocks.iter().find(|b| b.is_full_term())
    }
}

impl Block {
    pub fn is_full_term(&self) -> bool {
        FULL_TERM_BLOCK_NAMES.contains(&self.name.as_str())
    }

    pub fn term_id(&self) -> Option<EntityId> {
        self.term.as_ref().map(|t| t.id)
    }
}

impl Identified for Block {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Identified for Term {
    fn id(&self) -> EntityId {
        self.id
    }
}
