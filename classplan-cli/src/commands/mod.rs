pub mod events;
pub mod export;
pub mod options;
pub mod status;
pub mod terms;

use anyhow::{Context, Result};
use classplan_core::FilterGraph;
use classplan_core::model::{EntityId, EntityKind, MeetingType, Term};

use crate::app::App;
use crate::utils::tui::create_spinner;
use crate::{FilterArgs, SearchArgs};

/// Drive a fresh filter graph through `filters`, one field at a time, the way
/// a user would pick them.
pub async fn resolve(app: &App, filters: &FilterArgs) -> Result<FilterGraph> {
    let mut graph = FilterGraph::new(app.catalog.clone());
    let term = find_term(&graph.terms().await, &filters.term)?;

    let spinner = create_spinner(format!("Resolving filters for {}", term.name));

    graph.set_subjects_by_instructors(filters.subjects_by_instructors);
    graph.set_instructors_by_subjects(!filters.no_instructors_by_subjects);
    graph.select_term(Some(term));
    graph.settle().await;

    if !filters.block.is_empty() {
        pick(&mut graph, EntityKind::Block, &filters.block).await;
    }
    if !filters.subject.is_empty() {
        pick(&mut graph, EntityKind::Subject, &filters.subject).await;
    }
    if !filters.instructor.is_empty() {
        pick(&mut graph, EntityKind::Instructor, &filters.instructor).await;
    }

    spinner.finish_and_clear();
    Ok(graph)
}

/// `resolve`, then the search-only filters.
pub async fn resolve_search(app: &App, search: &SearchArgs) -> Result<FilterGraph> {
    let mut graph = resolve(app, &search.filters).await?;

    if !search.building.is_empty() {
        pick(&mut graph, EntityKind::Building, &search.building).await;
    }
    if !search.room.is_empty() {
        pick(&mut graph, EntityKind::Room, &search.room).await;
    }

    if !search.meeting_type.is_empty() {
        let types = search
            .meeting_type
            .iter()
            .map(|t| {
                t.parse::<MeetingType>()
                    .map_err(|_| anyhow::anyhow!("Unknown meeting type '{t}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        graph.set_meeting_types(types);
    }
    graph.set_show_all_day(search.show_all_day);

    if graph.disable_search() {
        anyhow::bail!(
            "Nothing to search.\n\n\
            Pick at least one subject or instructor, e.g.:\n  \
            classplan events --term \"{}\" --subject <id>\n\n\
            List the ids on offer with:\n  \
            classplan options --term \"{}\"",
            search.filters.term,
            search.filters.term
        );
    }

    Ok(graph)
}

async fn pick(graph: &mut FilterGraph, kind: EntityKind, ids: &[EntityId]) {
    let picked = match kind {
        EntityKind::Block => graph.select_blocks(ids),
        EntityKind::Subject => graph.select_subjects(ids),
        EntityKind::Instructor => graph.select_instructors(ids),
        EntityKind::Building => graph.select_buildings(ids),
        EntityKind::Room => graph.select_rooms(ids),
    };

    if picked < ids.len() {
        tracing::warn!(%kind, requested = ids.len(), picked, "Some ids are not on offer");
    }

    graph.settle().await;
}

/// A term by id, or by name ignoring case.
fn find_term(terms: &[Term], wanted: &str) -> Result<Term> {
    let by_id = wanted.parse::<EntityId>().ok();

    terms
        .iter()
        .find(|t| Some(t.id) == by_id || t.name.eq_ignore_ascii_case(wanted.trim()))
        .cloned()
        .with_context(|| {
            let available: Vec<_> = terms.iter().map(|t| t.name.as_str()).collect();
            format!(
                "Term '{wanted}' not found. Available: {}",
                available.join(", ")
            )
        })
}
