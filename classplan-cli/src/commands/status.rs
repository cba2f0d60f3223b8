use anyhow::Result;
use classplan_core::{CatalogEvent, UpdateMonitor};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use crate::app::App;
use crate::render::Render;
use crate::utils::tui::create_progress;

pub async fn run(app: &App, wait: bool) -> Result<()> {
    if !wait {
        let status = app.catalog.fetch_update_status().await?;
        println!("{}", status.render());
        return Ok(());
    }

    let monitor = UpdateMonitor::new(app.catalog.clone(), app.config.update_poll());
    let mut events = monitor.subscribe();
    let token = CancellationToken::new();

    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let bar = create_progress("Catalog import".to_string());
    let progress = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                CatalogEvent::UpdatePending { progress } => {
                    bar.set_position((progress.clamp(0.0, 1.0) * 100.0) as u64);
                }
                CatalogEvent::UpdateFinished => break,
                CatalogEvent::UpdateStarted => {}
            }
        }
        bar.finish_and_clear();
    });

    let result = monitor.wait_until_ready(token).await;
    drop(monitor);
    let _ = progress.await;

    match result? {
        Some(status) => println!("{}", status.render()),
        None => println!("{}", "Stopped waiting".dimmed()),
    }

    Ok(())
}
