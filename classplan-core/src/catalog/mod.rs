//! Data access for every catalog entity type.
//!
//! `EntityCatalog` knows the endpoint layout and payload shapes, fans block-scoped
//! lookups out one request per (block, constraining entity) pair, and joins them
//! back together only once every request has settled.

mod update;

pub use update::{CatalogEvent, UpdateMonitor, UpdateSource, UpdateState, UpdateStatus};

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheKey, ResultCache};
use crate::error::{ClassplanError, ClassplanResult};
use crate::model::{
    Block, Building, BuildingOption, EntityId, NamedEntity, Section, SectionQuery, Term,
    dedupe_by_id,
};
use crate::transport::{ApiRequest, Transport};

#[derive(Deserialize)]
struct TermsPayload {
    terms: Vec<Term>,
}

#[derive(Deserialize)]
struct TermPayload {
    term: Term,
}

#[derive(Deserialize)]
struct BlockSubjectsPayload {
    #[serde(default)]
    block: Option<Block>,
    subjects: Vec<NamedEntity>,
}

#[derive(Deserialize)]
struct BlockInstructorsPayload {
    #[serde(default)]
    block: Option<Block>,
    /// Instructors grouped by subject name.
    instructors: BTreeMap<String, Vec<NamedEntity>>,
}

#[derive(Deserialize)]
struct BuildingsPayload {
    buildings: Vec<Building>,
}

/// Records are decoded one by one so a malformed section only costs itself.
#[derive(Deserialize)]
struct SectionsPayload {
    sections: Vec<serde_json::Value>,
}

pub struct EntityCatalog {
    transport: Arc<dyn Transport>,
    cache: Arc<ResultCache>,
}

impl EntityCatalog {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        EntityCatalog {
            transport,
            cache: Arc::new(ResultCache::new()),
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// The catalog was re-imported; forget everything fetched so far.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Invalidate the cache whenever an import finishes, until `token` is cancelled.
    pub fn listen_for_updates(
        &self,
        mut events: broadcast::Receiver<CatalogEvent>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(CatalogEvent::UpdateFinished) => cache.invalidate_all(),
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Missed catalog events, invalidating cache");
                            cache.invalidate_all();
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    // TERMS + BLOCKS:

    pub async fn fetch_terms(&self) -> ClassplanResult<Vec<Term>> {
        let payload: TermsPayload = self.fetch_json(ApiRequest::get("terms.json")).await?;
        Ok(payload.terms.into_iter().map(Term::link_blocks).collect())
    }

    pub async fn fetch_term(&self, id: EntityId) -> ClassplanResult<Term> {
        let payload: TermPayload = self
            .fetch_json(ApiRequest::get(format!("term/{id}.json")))
            .await?;
        Ok(payload.term.link_blocks())
    }

    /// Blocks are embedded in the term payload.
    pub fn blocks_for(&self, term: &Term) -> Vec<Block> {
        term.clone().link_blocks().blocks
    }

    // BLOCK-SCOPED LISTS:

    /// Subjects taught in `blocks`, narrowed to `instructors` when given.
    pub async fn fetch_subjects(
        &self,
        blocks: &[Block],
        instructors: Option<&[NamedEntity]>,
    ) -> ClassplanResult<Vec<NamedEntity>> {
        let instructors = instructors.filter(|i| !i.is_empty());

        let requests = blocks.iter().flat_map(|block| {
            let uris: Vec<String> = match instructors {
                Some(instructors) => instructors
                    .iter()
                    .map(|i| format!("term/{}/instructor/{}/subjects.json", block.id, i.id))
                    .collect(),
                None => vec![format!("term/{}/subjects.json", block.id)],
            };

            uris.into_iter().map(move |uri| async move {
                let payload: BlockSubjectsPayload = self.fetch_json(ApiRequest::get(uri)).await?;
                let block_name = payload.block.map_or_else(|| block.name.clone(), |b| b.name);

                Ok::<_, ClassplanError>(
                    payload
                        .subjects
                        .into_iter()
                        .map(|subject| NamedEntity {
                            meta: Some(block_name.clone()),
                            ..subject
                        })
                        .collect::<Vec<_>>(),
                )
            })
        });

        let results = try_join_all(requests).await?;
        Ok(dedupe_by_id(results.into_iter().flatten()))
    }

    /// Instructors teaching in `blocks`, narrowed to `subjects` when given.
    pub async fn fetch_instructors(
        &self,
        blocks: &[Block],
        subjects: Option<&[NamedEntity]>,
    ) -> ClassplanResult<Vec<NamedEntity>> {
        let subject_ids: Vec<EntityId> = match subjects.filter(|s| !s.is_empty()) {
            Some(subjects) => subjects.iter().map(|s| s.id).collect(),
            // 0 asks for every subject
            None => vec![0],
        };

        let requests = blocks.iter().flat_map(|block| {
            subject_ids.iter().map(move |subject_id| async move {
                let uri = format!("term/{}/subject/{}/instructors.json", block.id, subject_id);
                let payload: BlockInstructorsPayload = self.fetch_json(ApiRequest::get(uri)).await?;
                let block_name = payload.block.map_or_else(|| block.name.clone(), |b| b.name);

                Ok::<_, ClassplanError>(
                    payload
                        .instructors
                        .into_iter()
                        .flat_map(|(subject, instructors)| {
                            let meta = format!("{block_name} - {subject}");
                            instructors.into_iter().map(move |instructor| NamedEntity {
                                meta: Some(meta.clone()),
                                ..instructor
                            })
                        })
                        .collect::<Vec<_>>(),
                )
            })
        });

        let results = try_join_all(requests).await?;
        Ok(dedupe_by_id(results.into_iter().flatten()))
    }

    /// Buildings (with labelled, sorted rooms) used by sections in `blocks`.
    pub async fn fetch_buildings(&self, blocks: &[Block]) -> ClassplanResult<Vec<BuildingOption>> {
        let requests = blocks.iter().map(|block| async move {
            let uri = format!("term/{}/buildings.json", block.id);
            let payload: BuildingsPayload = self.fetch_json(ApiRequest::get(uri)).await?;

            Ok::<_, ClassplanError>(
                payload
                    .buildings
                    .iter()
                    .map(BuildingOption::from)
                    .collect::<Vec<_>>(),
            )
        });

        let results = try_join_all(requests).await?;
        Ok(dedupe_by_id(results.into_iter().flatten()))
    }

    // SECTIONS:

    pub async fn fetch_sections(&self, query: &SectionQuery) -> ClassplanResult<Vec<Section>> {
        let request = ApiRequest::post("section/find.json", query.to_params());
        let payload: SectionsPayload = self.fetch_json(request).await?;
        let received = payload.sections.len();

        let sections: Vec<Section> = payload
            .sections
            .iter()
            .filter_map(|record| match Section::deserialize(record) {
                Ok(section) => Some(section),
                Err(e) => {
                    let id = record.get("id").cloned().unwrap_or_default();
                    tracing::warn!(section = %id, error = %e, "Skipping malformed section");
                    None
                }
            })
            .collect();

        tracing::debug!(received, count = sections.len(), "Fetched sections");
        Ok(sections)
    }

    /// The CSV export for `query`. Downloads are never cached.
    pub async fn export_sections(&self, query: &SectionQuery) -> ClassplanResult<Vec<u8>> {
        let request = ApiRequest::post("section/export.csv", query.to_params());
        self.transport.send(&request).await
    }

    /// Latest import log entry. Always fetched fresh.
    pub async fn fetch_update_status(&self) -> ClassplanResult<UpdateStatus> {
        let request = ApiRequest::get("update.json");
        let body = self.transport.send(&request).await?;

        serde_json::from_slice(&body).map_err(|source| ClassplanError::Decode {
            uri: request.uri,
            source,
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClassplanResult<T> {
        let key = CacheKey::from(&request);

        let value = self
            .cache
            .get_or_fetch(key, || async {
                tracing::debug!(%request, "Fetching");
                let body = self.transport.send(&request).await?;

                serde_json::from_slice(&body).map_err(|source| ClassplanError::Decode {
                    uri: request.uri.clone(),
                    source,
                })
            })
            .await?;

        T::deserialize(&value).map_err(|source| ClassplanError::Decode {
            uri: request.uri,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use serde_json::json;

    fn block(id: EntityId, name: &str) -> Block {
        Block {
            id,
            name: name.to_string(),
            term: None,
        }
    }

    fn catalog(transport: &Arc<MemoryTransport>) -> EntityCatalog {
        EntityCatalog::new(transport.clone())
    }

    #[tokio::test]
    async fn subjects_fan_out_per_block_and_dedupe_by_id() {
        let transport = Arc::new(
            MemoryTransport::new()
                .with(
                    "term/1/subjects.json",
                    json!({"block": {"id": 1, "name": "Full Semester"},
                           "subjects": [{"id": 10, "name": "BIO"}, {"id": 11, "name": "CHEM"}]}),
                )
                .with(
                    "term/2/subjects.json",
                    json!({"subjects": [{"id": 11, "name": "CHEM"}, {"id": 12, "name": "ART"}]}),
                ),
        );

        let subjects = catalog(&transport)
            .fetch_subjects(&[block(1, "Full Semester"), block(2, "Second 8 Weeks")], None)
            .await
            .unwrap();

        let ids: Vec<_> = subjects.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(subjects[1].meta.as_deref(), Some("Full Semester"));
        assert_eq!(subjects[2].meta.as_deref(), Some("Second 8 Weeks"));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn instructors_fan_out_over_blocks_and_subjects() {
        let transport = Arc::new(MemoryTransport::new());
        for (block_id, subject_id) in [(1, 10), (1, 11), (2, 10), (2, 11)] {
            transport.respond(
                &format!("term/{block_id}/subject/{subject_id}/instructors.json"),
                json!({"instructors": {"BIO": [{"id": 100 + subject_id, "name": "Smith"}]}}),
            );
        }

        let subjects = [NamedEntity::new(10, "BIO"), NamedEntity::new(11, "CHEM")];
        let instructors = catalog(&transport)
            .fetch_instructors(&[block(1, "A"), block(2, "B")], Some(&subjects))
            .await
            .unwrap();

        assert_eq!(transport.requests().len(), 4);
        let ids: Vec<_> = instructors.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![110, 111]);
        assert_eq!(instructors[0].meta.as_deref(), Some("A - BIO"));
    }

    #[tokio::test]
    async fn unconstrained_instructors_use_subject_zero() {
        let transport = Arc::new(MemoryTransport::new().with(
            "term/1/subject/0/instructors.json",
            json!({"instructors": {}}),
        ));

        let instructors = catalog(&transport)
            .fetch_instructors(&[block(1, "A")], Some(&[]))
            .await
            .unwrap();

        assert!(instructors.is_empty());
        assert_eq!(transport.request_count("term/1/subject/0/instructors.json"), 1);
    }

    #[tokio::test]
    async fn any_failed_request_fails_the_whole_fan_out() {
        let transport = Arc::new(
            MemoryTransport::new().with("term/1/buildings.json", json!({"buildings": []})),
        );
        transport.fail("term/2/buildings.json");

        let result = catalog(&transport)
            .fetch_buildings(&[block(1, "A"), block(2, "B")])
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn repeated_lookups_hit_the_cache_until_invalidated() {
        let transport = Arc::new(MemoryTransport::new().with(
            "terms.json",
            json!({"terms": [{"id": 1, "name": "Spring", "year": 2024, "semester": "Spring",
                              "blocks": [{"id": 5, "name": "Full Semester"}]}]}),
        ));
        let catalog = catalog(&transport);

        let terms = catalog.fetch_terms().await.unwrap();
        catalog.fetch_terms().await.unwrap();
        assert_eq!(transport.request_count("terms.json"), 1);
        assert_eq!(terms[0].blocks[0].term_id(), Some(1));

        catalog.invalidate_all();
        catalog.fetch_terms().await.unwrap();
        assert_eq!(transport.request_count("terms.json"), 2);
    }

    fn section(id: u32, days: serde_json::Value, meeting_type: u8) -> serde_json::Value {
        json!({
            "id": id, "crn": 40000 + id, "number": "001", "days": days,
            "meeting_type": meeting_type, "start": "2024-01-08", "end": "2024-05-03",
            "start_time": "930", "end_time": "1045",
            "subject": {"id": 3, "name": "BIO"},
            "course": {"id": 9, "number": "101"},
            "block": {"id": 6, "name": "Full Semester"}
        })
    }

    #[tokio::test]
    async fn malformed_sections_are_skipped_not_fatal() {
        let mut bad_date = section(4, json!("MWF"), 1);
        bad_date["start"] = json!("someday");
        let transport = Arc::new(MemoryTransport::new().with(
            "section/find.json",
            json!({"sections": [
                section(1, json!("MWF"), 1),
                section(2, json!("TR"), 7),
                section(3, json!(135), 1),
                bad_date,
            ]}),
        ));
        let query = SectionQuery {
            block: vec![6],
            ..SectionQuery::default()
        };

        let sections = catalog(&transport).fetch_sections(&query).await.unwrap();

        let ids: Vec<_> = sections.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(sections[1].days(), "135");
    }

    #[tokio::test]
    async fn finished_import_invalidates_the_cache() {
        let transport = Arc::new(
            MemoryTransport::new().with("terms.json", json!({"terms": []})),
        );
        let catalog = catalog(&transport);
        catalog.fetch_terms().await.unwrap();
        assert_eq!(catalog.cache().len(), 1);

        let (tx, rx) = broadcast::channel(8);
        let token = CancellationToken::new();
        let listener = catalog.listen_for_updates(rx, token.clone());

        tx.send(CatalogEvent::UpdateStarted).unwrap();
        tx.send(CatalogEvent::UpdateFinished).unwrap();
        drop(tx);
        listener.await.unwrap();

        assert!(catalog.cache().is_empty());
    }
}
