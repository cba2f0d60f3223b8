//! Selection → calendar events, the read side the calendar view consumes.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::EntityCatalog;
use crate::error::ClassplanResult;
use crate::model::{CalendarEvent, FilterSelection, Section, SectionQuery};
use crate::synthesis::EventSynthesizer;
use crate::viewport::ViewportPlanner;

/// Events for one selection plus where the calendar should open.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBatch {
    pub events: Vec<CalendarEvent>,
    pub initial_date: NaiveDate,
    /// Name of the term the first event belongs to.
    pub title: Option<String>,
}

pub struct EventFeed {
    catalog: Arc<EntityCatalog>,
    synthesizer: EventSynthesizer,
    planner: ViewportPlanner,
}

impl EventFeed {
    pub fn new(
        catalog: Arc<EntityCatalog>,
        synthesizer: EventSynthesizer,
        planner: ViewportPlanner,
    ) -> Self {
        EventFeed {
            catalog,
            synthesizer,
            planner,
        }
    }

    pub fn synthesizer(&self) -> &EventSynthesizer {
        &self.synthesizer
    }

    pub fn planner(&self) -> &ViewportPlanner {
        &self.planner
    }

    pub async fn events(&self, selection: &FilterSelection) -> EventBatch {
        let query = SectionQuery::from_selection(selection);
        let sections = self.sections(&query).await;

        let events = self.synthesizer.synthesize(&sections, &selection.ui);
        let initial_date = self.planner.initial_date(&events);
        let title = events
            .first()
            .and_then(|event| event.section().block.term.as_ref())
            .map(|term| term.name.clone());

        EventBatch {
            events,
            initial_date,
            title,
        }
    }

    /// Sections matching `query`. Nothing is requested without blocks, and a
    /// failed search yields no sections.
    ///
    /// Searches go through the catalog cache, so color and display toggles
    /// re-synthesize without another request until the catalog is re-imported.
    pub async fn sections(&self, query: &SectionQuery) -> Vec<Section> {
        if !query.has_blocks() {
            return Vec::new();
        }

        self.catalog.fetch_sections(query).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Section search failed");
            Vec::new()
        })
    }

    /// CSV export of the sections `selection` matches. Empty without blocks.
    pub async fn export(&self, selection: &FilterSelection) -> ClassplanResult<Vec<u8>> {
        let query = SectionQuery::from_selection(selection);
        if !query.has_blocks() {
            return Ok(Vec::new());
        }

        self.catalog.export_sections(&query).await
    }
}
