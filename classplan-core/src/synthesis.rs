//! Section → calendar event mapping.
//!
//! Everything here is a pure function of its inputs: the same sections, UI
//! filters and colors always yield the same events.

use crate::model::{
    CalendarEvent, Color, ColorMatrix, EntityKind, EventTiming, ExtendedProps, MeetingType,
    Section, UiFilters,
};

/// Day codes indexed by weekday, 0 = Sunday.
pub const DAY_CODES: [char; 7] = ['U', 'M', 'T', 'W', 'R', 'F', 'S'];

const ONLINE_BUILDING: &str = "WEB";

#[derive(Debug, Clone, Default)]
pub struct EventSynthesizer {
    default_color: Color,
}

impl EventSynthesizer {
    pub fn new(default_color: Color) -> Self {
        EventSynthesizer { default_color }
    }

    pub fn default_color(&self) -> &Color {
        &self.default_color
    }

    /// Keep sections of a selected meeting type (dropping all-day ones unless
    /// `show_all_day`), then emit one event per survivor.
    pub fn synthesize(&self, sections: &[Section], ui: &UiFilters) -> Vec<CalendarEvent> {
        sections
            .iter()
            .filter(|section| ui.meeting_types.contains(&section.meeting_type))
            .filter(|section| ui.show_all_day || !is_all_day(section))
            .map(|section| self.to_event(section, &ui.colors))
            .collect()
    }

    pub fn to_event(&self, section: &Section, colors: &ColorMatrix) -> CalendarEvent {
        let all_day = is_all_day(section);

        let timing = if all_day {
            EventTiming::AllDay {
                start: section.start,
                end: section.end,
            }
        } else {
            EventTiming::Recurring {
                start_recur: section.start,
                end_recur: section.end,
                start_time: format_time(&section.start_time),
                end_time: format_time(&section.end_time),
            }
        };

        CalendarEvent {
            id: section.id,
            title: format!(
                "{} {}: {}",
                section.subject.name, section.course.number, section.number
            ),
            all_day,
            days_of_week: weekdays(section, all_day),
            timing,
            background_color: self.resolve_color(colors, section),
            extended_props: ExtendedProps {
                section: section.clone(),
            },
        }
    }

    /// The color of the most specific entity of `section` that has one,
    /// instructor > room > building > subject > block.
    pub fn resolve_color(&self, colors: &ColorMatrix, section: &Section) -> Color {
        EntityKind::COLOR_PRECEDENCE
            .into_iter()
            .find_map(|kind| colors.get(kind, section.entity_id(kind)?))
            .unwrap_or(&self.default_color)
            .clone()
    }
}

/// Taught online: the "WEB" building or a Web meeting.
pub fn is_online(section: &Section) -> bool {
    section.building_name() == Some(ONLINE_BUILDING) || section.meeting_type == MeetingType::Web
}

/// Online sections are always all-day. Otherwise a section is all-day only when
/// it has no days and a zero-length time range.
pub fn is_all_day(section: &Section) -> bool {
    is_online(section)
        || (section.days().trim().is_empty() && section.start_time == section.end_time)
}

fn weekdays(section: &Section, all_day: bool) -> Vec<u8> {
    if all_day {
        return (0..DAY_CODES.len() as u8).collect();
    }

    parse_days(section.days()).unwrap_or_else(|| {
        tracing::warn!(
            section = section.id,
            days = section.days(),
            "Unrecognized day codes, event will have no weekdays"
        );
        Vec::new()
    })
}

/// "M/W/F" or "MWF" → `[1, 3, 5]`. `None` if any code is unknown.
pub fn parse_days(days: &str) -> Option<Vec<u8>> {
    let days = days.trim();

    let codes: Vec<String> = if days.contains('/') {
        days.split('/')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        days.chars()
            .filter(|c| !c.is_whitespace())
            .map(String::from)
            .collect()
    };

    codes
        .iter()
        .map(|code| {
            let mut chars = code.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => DAY_CODES
                    .iter()
                    .position(|d| *d == c.to_ascii_uppercase())
                    .map(|i| i as u8),
                _ => None,
            }
        })
        .collect()
}

/// "930" → "09:30", "1415" → "14:15". Anything else passes through untouched.
pub fn format_time(raw: &str) -> String {
    let raw = raw.trim();

    if raw.is_empty() || raw.len() > 4 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.to_string();
    }

    let padded = format!("{raw:0>4}");
    format!("{}:{}", &padded[..2], &padded[2..])
}
