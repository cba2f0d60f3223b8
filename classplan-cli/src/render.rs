//! Terminal rendering for classplan-core types, colored with owo_colors.

use classplan_core::catalog::UpdateStatus;
use classplan_core::model::{
    Block, BuildingOption, CalendarEvent, EventTiming, NamedEntity, Term,
};
use classplan_core::{FieldState, FieldStatus};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Term {
    fn render(&self) -> String {
        format!("{} {}", self.name.bold(), format!("#{}", self.id).dimmed())
    }
}

impl Render for Block {
    fn render(&self) -> String {
        let marker = if self.is_full_term() { "*" } else { " " };
        format!("{} {:>5}  {}", marker.green(), self.id, self.name)
    }
}

impl Render for NamedEntity {
    fn render(&self) -> String {
        match &self.meta {
            Some(meta) => format!("  {:>5}  {} {}", self.id, self.name, meta.dimmed()),
            None => format!("  {:>5}  {}", self.id, self.name),
        }
    }
}

impl Render for BuildingOption {
    fn render(&self) -> String {
        let rooms: Vec<_> = self
            .rooms
            .iter()
            .map(|r| format!("{} ({})", r.name, r.id))
            .collect();
        format!(
            "  {:>5}  {}\n         {}",
            self.id,
            self.name,
            rooms.join(", ").dimmed()
        )
    }
}

impl Render for FieldStatus {
    fn render(&self) -> String {
        match self {
            FieldStatus::Unset => "unset".dimmed().to_string(),
            FieldStatus::Loading => "loading".yellow().to_string(),
            FieldStatus::Ready => "ready".to_string(),
            FieldStatus::Selected => "selected".green().to_string(),
        }
    }
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        let when = match &self.timing {
            EventTiming::Recurring {
                start_time,
                end_time,
                ..
            } => format!("{start_time}-{end_time}"),
            EventTiming::AllDay { .. } => "all-day".to_string(),
        };
        let days: String = self
            .days_of_week
            .iter()
            .filter_map(|d| classplan_core::synthesis::DAY_CODES.get(usize::from(*d)))
            .collect();
        let section = self.section();
        let place = section
            .building_name()
            .map(|b| match &section.room {
                Some(room) => format!("{b} {}", room.number),
                None => b.to_string(),
            })
            .unwrap_or_default();
        let instructor = section
            .instructor
            .as_ref()
            .map(|i| i.name.as_str())
            .unwrap_or_default();

        format!(
            "  {:<7} {:>11}  {} {} {} {}",
            days,
            when,
            self.title,
            format!("[{}]", self.background_color).dimmed(),
            place.dimmed(),
            instructor.dimmed()
        )
    }
}

impl Render for UpdateStatus {
    fn render(&self) -> String {
        if self.is_complete() {
            format!(
                "{} catalog import #{} from {:?} finished {}",
                "✓".green(),
                self.id,
                self.source,
                self.end.as_deref().unwrap_or(&self.start)
            )
        } else {
            format!(
                "{} catalog import #{} running ({}%), started {}",
                "…".yellow(),
                self.id,
                self.percent(),
                self.start
            )
        }
    }
}

/// One heading line per option list: "Subjects (ready, 12)".
pub fn render_field<T>(label: &str, status: FieldStatus, state: &FieldState<T>) -> String {
    format!(
        "{} ({}, {})",
        label.bold(),
        status.render(),
        state.options().len()
    )
}
