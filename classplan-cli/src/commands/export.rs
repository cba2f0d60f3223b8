use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use super::resolve_search;
use crate::SearchArgs;
use crate::app::App;

pub async fn run(app: &App, search: &SearchArgs, output: &Path) -> Result<()> {
    let graph = resolve_search(app, search).await?;

    let csv = app.feed().export(graph.selection()).await?;

    std::fs::write(output, &csv)
        .with_context(|| format!("Could not write {}", output.display()))?;

    println!(
        "{} {} ({} bytes)",
        "Exported".green(),
        output.display(),
        csv.len()
    );
    Ok(())
}
