use anyhow::Result;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

pub async fn run(app: &App) -> Result<()> {
    let terms = app.catalog.fetch_terms().await?;

    if terms.is_empty() {
        println!("{}", "No terms found".dimmed());
        return Ok(());
    }

    for (i, term) in terms.iter().enumerate() {
        println!("{}", term.render());
        for block in &term.blocks {
            println!("  {}", block.render());
        }

        if i < terms.len() - 1 {
            println!();
        }
    }

    Ok(())
}
