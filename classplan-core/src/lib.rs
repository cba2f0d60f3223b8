//! Core of classplan: course-section catalog access, the dependent filter graph,
//! and calendar event synthesis.
//!
//! - `catalog` fetches and caches terms, option lists and sections
//! - `filter` keeps the user's selection consistent as upstream fields change
//! - `synthesis`, `viewport` and `feed` turn a selection into calendar events

pub mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod feed;
pub mod filter;
pub mod model;
pub mod synthesis;
pub mod transport;
pub mod viewport;

pub use cache::{CacheKey, ResultCache};
pub use catalog::{CatalogEvent, EntityCatalog, UpdateMonitor, UpdateStatus};
pub use config::ClassplanConfig;
pub use error::{ClassplanError, ClassplanResult};
pub use feed::{EventBatch, EventFeed};
pub use filter::{Field, FieldState, FieldStatus, FilterGraph};
pub use synthesis::EventSynthesizer;
pub use transport::{ApiParams, ApiRequest, MemoryTransport, Method, Transport};
pub use viewport::ViewportPlanner;
