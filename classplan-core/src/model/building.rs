use serde::{Deserialize, Serialize};

use crate::model::entity::{EntityId, Identified, NamedEntity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus: Option<NamedEntity>,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: EntityId,
    pub number: String,
}

/// A building as offered by the building/room picker, rooms labelled and sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingOption {
    pub id: EntityId,
    pub name: String,
    pub rooms: Vec<RoomOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomOption {
    pub id: EntityId,
    /// `"{short_name} - {number}"`
    pub name: String,
    pub sort_name: String,
}

impl RoomOption {
    pub fn new(building: &Building, room: &Room) -> Self {
        let name = format!("{} - {}", building.short_name, room.number);

        RoomOption {
            id: room.id,
            sort_name: name.to_lowercase(),
            name,
        }
    }
}

impl From<&Building> for BuildingOption {
    fn from(building: &Building) -> Self {
        let mut rooms: Vec<RoomOption> = building
            .rooms
            .iter()
            .map(|room| RoomOption::new(building, room))
            .collect();

        rooms.sort_by(|a, b| a.sort_name.cmp(&b.sort_name));

        BuildingOption {
            id: building.id,
            name: building.name.clone(),
            rooms,
        }
    }
}

impl Identified for BuildingOption {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Identified for RoomOption {
    fn id(&self) -> EntityId {
        self.id
    }
}
