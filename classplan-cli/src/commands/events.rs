use anyhow::{Context, Result};
use classplan_core::model::{Color, ColorKey};
use owo_colors::OwoColorize;

use super::resolve_search;
use crate::SearchArgs;
use crate::app::App;
use crate::render::Render;

pub async fn run(app: &App, search: &SearchArgs, colors: &[String], json: bool) -> Result<()> {
    let mut graph = resolve_search(app, search).await?;

    for entry in colors {
        let (key, color) = parse_color(entry)?;
        graph.set_color(key.kind, key.id, color);
    }

    let batch = app.feed().events(graph.selection()).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    if let Some(title) = &batch.title {
        println!("{}", title.bold());
    }

    if batch.events.is_empty() {
        println!("{}", "No sections found".dimmed());
        return Ok(());
    }

    for event in &batch.events {
        println!("{}", event.render());
    }

    println!();
    println!(
        "{} {}",
        "Calendar opens on".dimmed(),
        batch.initial_date.format("%a %b %-d, %Y")
    );

    Ok(())
}

/// `instructor-12=#ff8800`
fn parse_color(entry: &str) -> Result<(ColorKey, Color)> {
    let (key, color) = entry
        .split_once('=')
        .with_context(|| format!("Invalid color '{entry}'. Expected <kind>-<id>=#hex"))?;

    Ok((key.trim().parse()?, color.trim().parse()?))
}
