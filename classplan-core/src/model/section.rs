use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::building::Room;
use crate::model::de;
use crate::model::entity::{EntityId, EntityKind, Identified, NamedEntity};
use crate::model::selection::FilterSelection;
use crate::model::term::Block;
use crate::transport::ApiParams;

/// Enumerated classification of a section meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum MeetingType {
    Exam = 0,
    Class = 1,
    Web = 2,
    Lab = 3,
    Conference = 4,
}

impl MeetingType {
    pub const ALL: [MeetingType; 5] = [
        MeetingType::Exam,
        MeetingType::Class,
        MeetingType::Web,
        MeetingType::Lab,
        MeetingType::Conference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingType::Exam => "Exam",
            MeetingType::Class => "Class",
            MeetingType::Web => "Web",
            MeetingType::Lab => "Lab",
            MeetingType::Conference => "Conference",
        }
    }
}

impl TryFrom<u8> for MeetingType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        MeetingType::ALL
            .into_iter()
            .find(|t| *t as u8 == value)
            .ok_or_else(|| format!("unknown meeting type {value}"))
    }
}

impl From<MeetingType> for u8 {
    fn from(value: MeetingType) -> Self {
        value as u8
    }
}

impl fmt::Display for MeetingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<u8>() {
            return MeetingType::try_from(n);
        }

        MeetingType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown meeting type '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: EntityId,
    #[serde(deserialize_with = "de::string_or_number")]
    pub number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: String,
}

/// One scheduled offering of a course meeting, as projected by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: EntityId,
    pub crn: u32,
    #[serde(default)]
    pub status: i32,
    #[serde(deserialize_with = "de::string_or_number")]
    pub number: String,
    /// Compact day codes, "MWF" or "M/W/F". Some imports store a number.
    #[serde(default, deserialize_with = "de::optional_string_or_number")]
    pub days: Option<String>,
    #[serde(default)]
    pub num_enrolled: u32,
    #[serde(default)]
    pub maximum_enrollment: u32,
    pub meeting_type: MeetingType,
    #[serde(deserialize_with = "de::catalog_date")]
    pub start: NaiveDate,
    #[serde(deserialize_with = "de::catalog_date")]
    pub end: NaiveDate,
    /// Raw "HHMM" or "HMM".
    #[serde(default, deserialize_with = "de::time_string")]
    pub start_time: String,
    #[serde(default, deserialize_with = "de::time_string")]
    pub end_time: String,

    pub subject: NamedEntity,
    pub course: Course,
    pub block: Block,
    #[serde(default)]
    pub campus: Option<NamedEntity>,
    #[serde(default)]
    pub building: Option<NamedEntity>,
    #[serde(default)]
    pub room: Option<Room>,
    #[serde(default)]
    pub instructor: Option<NamedEntity>,
}

impl Section {
    /// The id of the entity of `kind` this section references, if any.
    pub fn entity_id(&self, kind: EntityKind) -> Option<EntityId> {
        match kind {
            EntityKind::Block => Some(self.block.id),
            EntityKind::Subject => Some(self.subject.id),
            EntityKind::Instructor => self.instructor.as_ref().map(|i| i.id),
            EntityKind::Building => self.building.as_ref().map(|b| b.id),
            EntityKind::Room => self.room.as_ref().map(|r| r.id),
        }
    }

    pub fn days(&self) -> &str {
        self.days.as_deref().unwrap_or("")
    }

    pub fn building_name(&self) -> Option<&str> {
        self.building.as_ref().map(|b| b.name.as_str())
    }
}

impl Identified for Section {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Parameters of a section search, shared by `section/find.json` and the export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionQuery {
    pub block: Vec<EntityId>,
    pub subject: Vec<EntityId>,
    pub instructor: Vec<EntityId>,
    pub building: Vec<EntityId>,
    pub room: Vec<EntityId>,
    pub meeting_type: Vec<MeetingType>,
}

impl SectionQuery {
    pub fn from_selection(selection: &FilterSelection) -> Self {
        SectionQuery {
            block: selection.ids(EntityKind::Block),
            subject: selection.ids(EntityKind::Subject),
            instructor: selection.ids(EntityKind::Instructor),
            building: selection.ids(EntityKind::Building),
            room: selection.ids(EntityKind::Room),
            meeting_type: selection.ui.meeting_types.iter().copied().collect(),
        }
    }

    /// A search without blocks has nothing to scope it and is never sent.
    pub fn has_blocks(&self) -> bool {
        !self.block.is_empty()
    }

    pub fn to_params(&self) -> ApiParams {
        let mut params = ApiParams::new();

        params.insert_list("block", &self.block);
        params.insert_list("subject", &self.subject);
        params.insert_list("instructor", &self.instructor);
        params.insert_list("building", &self.building);
        params.insert_list("room", &self.room);
        params.insert_list(
            "meeting_type",
            self.meeting_type.iter().map(|t| u8::from(*t)),
        );

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_type_uses_numeric_wire_form() {
        let parsed: Vec<MeetingType> = serde_json::from_str("[0, 1, 4]").unwrap();
        assert_eq!(
            parsed,
            vec![MeetingType::Exam, MeetingType::Class, MeetingType::Conference]
        );
        assert_eq!(serde_json::to_string(&MeetingType::Lab).unwrap(), "3");
        assert!(serde_json::from_str::<MeetingType>("9").is_err());
    }

    #[test]
    fn meeting_type_parses_names_and_numbers() {
        assert_eq!("lab".parse::<MeetingType>(), Ok(MeetingType::Lab));
        assert_eq!("2".parse::<MeetingType>(), Ok(MeetingType::Web));
        assert!("seminar".parse::<MeetingType>().is_err());
    }

    #[test]
    fn section_accepts_numeric_course_numbers_and_null_times() {
        let section: Section = serde_json::from_value(serde_json::json!({
            "id": 1,
            "crn": 40112,
            "number": "001",
            "days": null,
            "meeting_type": 2,
            "start": "2024-01-08",
            "end": "2024-05-03T00:00:00+00:00",
            "start_time": null,
            "end_time": 1700,
            "subject": {"id": 3, "name": "BIO"},
            "course": {"id": 9, "number": 101},
            "block": {"id": 5, "name": "Full Semester"}
        }))
        .unwrap();

        assert_eq!(section.course.number, "101");
        assert_eq!(section.start_time, "");
        assert_eq!(section.end_time, "1700");
        assert_eq!(section.days(), "");
        assert_eq!(section.entity_id(EntityKind::Room), None);
        assert_eq!(section.entity_id(EntityKind::Block), Some(5));
    }

    #[test]
    fn query_serializes_lists_as_bracketed_form_fields() {
        let query = SectionQuery {
            block: vec![5, 6],
            subject: vec![3],
            meeting_type: vec![MeetingType::Class],
            ..Default::default()
        };

        assert_eq!(
            query.to_params().form_body(),
            "block[]=5&block[]=6&meeting_type[]=1&subject[]=3"
        );
    }
}
