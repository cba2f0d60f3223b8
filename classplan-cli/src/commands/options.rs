use anyhow::Result;
use classplan_core::model::{EntityKind, FilterSelection};
use classplan_core::{FieldStatus, FilterGraph};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::resolve;
use crate::FilterArgs;
use crate::app::App;
use crate::render::{Render, render_field};

#[derive(Serialize)]
struct OptionsReport<'a> {
    selection: &'a FilterSelection,
    blocks: &'a [classplan_core::model::Block],
    subjects: &'a [classplan_core::model::NamedEntity],
    instructors: &'a [classplan_core::model::NamedEntity],
    buildings: &'a [classplan_core::model::BuildingOption],
    disable_search: bool,
}

pub async fn run(app: &App, filters: &FilterArgs, json: bool) -> Result<()> {
    let graph = resolve(app, filters).await?;

    if json {
        let report = OptionsReport {
            selection: graph.selection(),
            blocks: graph.blocks().options(),
            subjects: graph.subjects().options(),
            instructors: graph.instructors().options(),
            buildings: graph.buildings().options(),
            disable_search: graph.disable_search(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_options(&graph);
    Ok(())
}

fn print_options(graph: &FilterGraph) {
    let selection = graph.selection();

    println!(
        "{}",
        render_field("Blocks", graph.status(EntityKind::Block), graph.blocks())
    );
    for block in graph.blocks().options() {
        let line = block.render();
        println!("  {}", mark(line, selection.ids(EntityKind::Block).contains(&block.id)));
    }

    let lists = [
        ("Subjects", EntityKind::Subject, graph.subjects()),
        ("Instructors", EntityKind::Instructor, graph.instructors()),
    ];
    for (label, kind, state) in lists {
        println!();
        println!("{}", render_field(label, graph.status(kind), state));
        let selected = selection.ids(kind);
        for option in state.options() {
            println!("{}", mark(option.render(), selected.contains(&option.id)));
        }
    }

    println!();
    println!(
        "{}",
        render_field(
            "Buildings",
            graph.status(EntityKind::Building),
            graph.buildings()
        )
    );
    for building in graph.buildings().options() {
        println!("{}", building.render());
    }

    println!();
    if graph.disable_search() {
        println!("{}", "Search disabled: pick a subject or instructor".yellow());
    } else if graph.status(EntityKind::Block) == FieldStatus::Selected {
        println!("{}", "Ready to search".green());
    }
}

fn mark(line: String, selected: bool) -> String {
    if selected {
        line.green().to_string()
    } else {
        line
    }
}
