#![allow(dead_code)]

use std::sync::Arc;

use classplan_core::model::Term;
use classplan_core::{EntityCatalog, MemoryTransport};
use serde_json::{Value, json};

pub fn spring() -> Term {
    serde_json::from_value(json!({
        "id": 1, "name": "Spring 2024", "year": 2024, "semester": "Spring",
        "blocks": [
            {"id": 5, "name": "First 8 Weeks"},
            {"id": 6, "name": "Full Semester"}
        ]
    }))
    .unwrap()
}

pub fn summer() -> Term {
    serde_json::from_value(json!({
        "id": 2, "name": "Summer 2024", "year": 2024, "semester": "Summer",
        "blocks": [{"id": 7, "name": "Full Term"}]
    }))
    .unwrap()
}

fn named(entries: &[(u32, &str)]) -> Vec<Value> {
    entries
        .iter()
        .map(|(id, name)| json!({"id": id, "name": name}))
        .collect()
}

pub fn section(id: u32, instructor: u32, start: &str) -> Value {
    json!({
        "id": id, "crn": 40000 + id, "number": "001", "days": "M/W/F",
        "meeting_type": 1, "start": start, "end": "2024-05-03",
        "start_time": 900, "end_time": 950,
        "subject": {"id": 10, "name": "BIO"},
        "course": {"id": 9, "number": 101},
        "block": {"id": 6, "name": "Full Semester",
                  "term": {"id": 1, "name": "Spring 2024"}},
        "building": {"id": 20, "name": "Science Hall"},
        "room": {"id": 200, "number": "101"},
        "instructor": {"id": instructor, "name": "Smith"}
    })
}

/// A small two-term catalog.
///
/// Spring has blocks 5 and 6 (6 is the full semester); subjects BIO (10) and
/// CHEM (11); instructors Smith (100, BIO) and Jones (101, CHEM).
pub fn transport() -> Arc<MemoryTransport> {
    let transport = MemoryTransport::new()
        .with("terms.json", json!({"terms": [spring(), summer()]}))
        .with(
            "term/5/subjects.json",
            json!({"subjects": named(&[(10, "BIO")])}),
        )
        .with(
            "term/6/subjects.json",
            json!({"subjects": named(&[(10, "BIO"), (11, "CHEM")])}),
        )
        .with(
            "term/7/subjects.json",
            json!({"subjects": named(&[(12, "ART")])}),
        )
        .with(
            "term/5/instructor/100/subjects.json",
            json!({"subjects": named(&[(10, "BIO")])}),
        )
        .with(
            "term/6/instructor/100/subjects.json",
            json!({"subjects": named(&[(10, "BIO")])}),
        )
        .with(
            "term/5/subject/0/instructors.json",
            json!({"instructors": {"BIO": named(&[(100, "Smith")])}}),
        )
        .with(
            "term/6/subject/0/instructors.json",
            json!({"instructors": {
                "BIO": named(&[(100, "Smith")]),
                "CHEM": named(&[(101, "Jones")])
            }}),
        )
        .with(
            "term/6/subject/10/instructors.json",
            json!({"instructors": {"BIO": named(&[(100, "Smith")])}}),
        )
        .with(
            "term/7/subject/0/instructors.json",
            json!({"instructors": {}}),
        )
        .with("term/5/buildings.json", json!({"buildings": []}))
        .with(
            "term/6/buildings.json",
            json!({"buildings": [{
                "id": 20, "name": "Science Hall", "short_name": "SCI",
                "rooms": [{"id": 201, "number": "B2"}, {"id": 200, "number": "101"}]
            }]}),
        )
        .with("term/7/buildings.json", json!({"buildings": []}))
        .with(
            "section/find.json",
            json!({"sections": [
                section(1, 100, "2024-01-08"),
                section(2, 101, "2024-01-10")
            ]}),
        )
        .with("section/export.csv", Value::String("crn,title\n40001,BIO 101\n".into()));

    Arc::new(transport)
}

pub fn catalog(transport: &Arc<MemoryTransport>) -> Arc<EntityCatalog> {
    Arc::new(EntityCatalog::new(transport.clone()))
}
