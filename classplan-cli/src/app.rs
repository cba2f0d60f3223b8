//! Wiring shared by every command: config, transport and catalog.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use classplan_core::{
    ClassplanConfig, EntityCatalog, EventFeed, EventSynthesizer, MemoryTransport, Transport,
    ViewportPlanner,
};

use crate::client::HttpTransport;

pub struct App {
    pub config: ClassplanConfig,
    pub catalog: Arc<EntityCatalog>,
}

impl App {
    /// Load the config and apply command-line overrides.
    pub fn load(api_url: Option<String>, fixture: Option<PathBuf>) -> Result<Self> {
        let mut config = ClassplanConfig::load()?;

        if let Some(api_url) = api_url {
            config.api_url = api_url;
        }
        if fixture.is_some() {
            config.fixture = fixture;
        }

        let transport: Arc<dyn Transport> = match config.fixture_path() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Serving catalog from fixture");
                Arc::new(
                    MemoryTransport::from_fixture(&path)
                        .with_context(|| format!("Could not load fixture {}", path.display()))?,
                )
            }
            None => Arc::new(HttpTransport::new(&config.api_url, config.request_timeout())?),
        };

        Ok(App {
            config,
            catalog: Arc::new(EntityCatalog::new(transport)),
        })
    }

    pub fn feed(&self) -> EventFeed {
        EventFeed::new(
            Arc::clone(&self.catalog),
            EventSynthesizer::new(self.config.default_color.clone()),
            ViewportPlanner::new(self.config.holiday_offset_days),
        )
    }
}
