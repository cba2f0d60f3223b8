//! Where the calendar should open when a new event set arrives.

use chrono::{Days, NaiveDate, Utc};

use crate::constants::DEFAULT_HOLIDAY_OFFSET_DAYS;
use crate::model::{CalendarEvent, MeetingType};

/// The earliest recurrence start (or all-day start) across `events`, or today
/// when there are none. Ties keep the first event in iteration order.
pub fn earliest_start(events: &[CalendarEvent]) -> NaiveDate {
    events
        .iter()
        .map(CalendarEvent::anchor_date)
        .min()
        .unwrap_or_else(|| Utc::now().date_naive())
}

pub fn has_exam(events: &[CalendarEvent]) -> bool {
    events.iter().any(|e| e.meeting_type() == MeetingType::Exam)
}

#[derive(Debug, Clone)]
pub struct ViewportPlanner {
    holiday_offset: Days,
}

impl Default for ViewportPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_HOLIDAY_OFFSET_DAYS)
    }
}

impl ViewportPlanner {
    /// `holiday_offset_days` skips the early-term holiday week(s).
    pub fn new(holiday_offset_days: u64) -> Self {
        ViewportPlanner {
            holiday_offset: Days::new(holiday_offset_days),
        }
    }

    /// The date to jump to for `events`.
    ///
    /// The earliest start is pushed forward by the holiday offset, except when
    /// any event is an exam: exams fall outside the normal early weeks and are
    /// shown where they are. An empty set opens on today.
    pub fn initial_date(&self, events: &[CalendarEvent]) -> NaiveDate {
        let earliest = earliest_start(events);

        if events.is_empty() || has_exam(events) {
            return earliest;
        }

        earliest
            .checked_add_days(self.holiday_offset)
            .unwrap_or(earliest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, ColorMatrix, Course, NamedEntity, Section};
    use crate::synthesis::EventSynthesizer;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn event(start: &str, meeting_type: MeetingType, days: &str) -> CalendarEvent {
        let section = Section {
            id: 1,
            crn: 1,
            status: 1,
            number: "001".to_string(),
            days: Some(days.to_string()),
            num_enrolled: 0,
            maximum_enrollment: 0,
            meeting_type,
            start: date(start),
            end: date("2024-05-03"),
            start_time: "0800".to_string(),
            end_time: if days.is_empty() { "0800" } else { "0900" }.to_string(),
            subject: NamedEntity::new(1, "BIO"),
            course: Course {
                id: 1,
                number: "101".to_string(),
                name: String::new(),
                level: String::new(),
            },
            block: Block {
                id: 1,
                name: "Full Semester".to_string(),
                term: None,
            },
            campus: None,
            building: None,
            room: None,
            instructor: None,
        };

        EventSynthesizer::default().to_event(&section, &ColorMatrix::default())
    }

    #[test]
    fn exam_in_the_set_suppresses_the_offset() {
        let events = [
            event("2024-01-08", MeetingType::Class, "MWF"),
            event("2024-01-15", MeetingType::Exam, "M"),
        ];

        assert_eq!(earliest_start(&events), date("2024-01-08"));
        assert_eq!(ViewportPlanner::default().initial_date(&events), date("2024-01-08"));
    }

    #[test]
    fn classes_only_are_shifted_two_weeks() {
        let events = [event("2024-01-08", MeetingType::Class, "MWF")];

        assert_eq!(earliest_start(&events), date("2024-01-08"));
        assert_eq!(ViewportPlanner::default().initial_date(&events), date("2024-01-22"));
    }

    #[test]
    fn all_day_events_compare_by_their_start() {
        let events = [
            event("2024-02-01", MeetingType::Class, "TR"),
            event("2024-01-20", MeetingType::Class, ""),
        ];

        assert!(events[1].all_day);
        assert_eq!(earliest_start(&events), date("2024-01-20"));
    }

    #[test]
    fn offset_is_configurable() {
        let events = [event("2024-01-08", MeetingType::Class, "MWF")];
        assert_eq!(ViewportPlanner::new(0).initial_date(&events), date("2024-01-08"));
        assert_eq!(ViewportPlanner::new(7).initial_date(&events), date("2024-01-15"));
    }

    #[test]
    fn empty_set_opens_on_today() {
        let today = Utc::now().date_naive();
        let opened = ViewportPlanner::default().initial_date(&[]);
        assert!(opened == today || opened == today.succ_opt().unwrap());
    }
}
