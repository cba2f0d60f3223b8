//! Catalog entities and the filter/event types built from them.

mod building;
mod de;
mod entity;
mod event;
mod section;
mod selection;
mod term;

pub use building::{Building, BuildingOption, Room, RoomOption};
pub use entity::{EntityId, EntityKind, Identified, Instructor, NamedEntity, Subject, dedupe_by_id};
pub use event::{CalendarEvent, EventTiming, ExtendedProps};
pub use section::{Course, MeetingType, Section, SectionQuery};
pub use selection::{Color, ColorKey, ColorMatrix, CrossFilters, FilterSelection, UiFilters};
pub use term::{Block, Term, TermRef};
