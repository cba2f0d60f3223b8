//! Calendar events in the shape FullCalendar consumes.
//!
//! See https://fullcalendar.io/docs/event-object

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::entity::EntityId;
use crate::model::section::{MeetingType, Section};
use crate::model::selection::Color;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: EntityId,
    pub title: String,
    pub all_day: bool,
    /// 0 = Sunday .. 6 = Saturday
    pub days_of_week: Vec<u8>,
    #[serde(flatten)]
    pub timing: EventTiming,
    pub background_color: Color,
    pub extended_props: ExtendedProps,
}

/// Timed events recur weekly inside a window; all-day events span explicit dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventTiming {
    Recurring {
        #[serde(rename = "startRecur")]
        start_recur: NaiveDate,
        #[serde(rename = "endRecur")]
        end_recur: NaiveDate,
        #[serde(rename = "startTime")]
        start_time: String,
        #[serde(rename = "endTime")]
        end_time: String,
    },
    AllDay {
        start: NaiveDate,
        end: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedProps {
    pub section: Section,
}

impl CalendarEvent {
    /// The date the event's recurrence starts, or its explicit start when all-day.
    pub fn anchor_date(&self) -> NaiveDate {
        match &self.timing {
            EventTiming::Recurring { start_recur, .. } => *start_recur,
            EventTiming::AllDay { start, .. } => *start,
        }
    }

    pub fn section(&self) -> &Section {
        &self.extended_props.section
    }

    pub fn meeting_type(&self) -> MeetingType {
        self.extended_props.section.meeting_type
    }
}
