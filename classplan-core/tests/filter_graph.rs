mod common;

use std::time::Duration;

use classplan_core::model::{EntityKind, MeetingType};
use classplan_core::{Field, FieldState, FieldStatus, FilterGraph};

fn ids<T>(items: &[T], id: impl Fn(&T) -> u32) -> Vec<u32> {
    items.iter().map(id).collect()
}

#[tokio::test(start_paused = true)]
async fn terms_are_listed_with_linked_blocks() {
    let transport = common::transport();
    let graph = FilterGraph::new(common::catalog(&transport));

    let terms = graph.terms().await;

    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0].blocks[1].term_id(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn narrowing_subjects_by_instructor_fetches_once_per_block() {
    let transport = common::transport();
    let mut graph = FilterGraph::new(common::catalog(&transport));
    graph.select_term(Some(common::spring()));
    graph.settle().await;
    graph.select_blocks(&[5, 6]);
    graph.set_subjects_by_instructors(true);
    graph.settle().await;
    transport.clear_requests();

    assert_eq!(graph.select_instructors(&[100]), 1);
    graph.settle().await;

    let uris: Vec<_> = transport.requests().into_iter().map(|r| r.uri).collect();
    assert_eq!(uris.len(), 2);
    assert!(uris.contains(&"term/5/instructor/100/subjects.json".to_string()));
    assert!(uris.contains(&"term/6/instructor/100/subjects.json".to_string()));
    assert_eq!(ids(graph.subjects().options(), |s| s.id), vec![10]);
}

#[tokio::test(start_paused = true)]
async fn subject_options_union_blocks_in_request_order() {
    let transport = common::transport();
    let mut graph = FilterGraph::new(common::catalog(&transport));
    graph.select_term(Some(common::spring()));
    graph.settle().await;

    graph.select_blocks(&[5, 6]);
    graph.settle().await;

    let subjects = graph.subjects().options();
    assert_eq!(ids(subjects, |s| s.id), vec![10, 11]);
    assert_eq!(subjects[0].meta.as_deref(), Some("First 8 Weeks"));
    let instructors = graph.instructors().options();
    assert_eq!(instructors[0].meta.as_deref(), Some("First 8 Weeks - BIO"));
}

#[tokio::test(start_paused = true)]
async fn clearing_the_term_resets_every_field() {
    let transport = common::transport();
    let mut graph = FilterGraph::new(common::catalog(&transport));
    graph.select_term(Some(common::spring()));
    graph.settle().await;
    graph.select_subjects(&[10]);
    graph.select_buildings(&[20]);
    graph.select_rooms(&[200]);
    graph.settle().await;
    assert!(!graph.disable_search());

    graph.select_term(None);

    let selection = graph.selection();
    assert!(selection.term.is_none());
    for kind in [
        EntityKind::Block,
        EntityKind::Subject,
        EntityKind::Instructor,
        EntityKind::Building,
        EntityKind::Room,
    ] {
        assert!(selection.is_empty(kind), "{kind} still selected");
        assert_eq!(graph.status(kind), FieldStatus::Unset);
    }
    assert!(graph.disable_search());
    assert!(graph.is_settled());
}

#[tokio::test(start_paused = true)]
async fn switching_terms_mid_flight_keeps_only_the_latest() {
    let transport = common::transport();
    let mut graph = FilterGraph::new(common::catalog(&transport));

    graph.select_term(Some(common::spring()));
    graph.select_term(Some(common::summer()));
    graph.settle().await;

    assert_eq!(ids(graph.blocks().options(), |b| b.id), vec![7]);
    assert_eq!(graph.selection().ids(EntityKind::Block), vec![7]);
    assert_eq!(ids(graph.subjects().options(), |s| s.id), vec![12]);
    assert_eq!(transport.request_count("term/6/subjects.json"), 0);
}

#[tokio::test(start_paused = true)]
async fn term_change_replaces_a_manual_block_choice() {
    let transport = common::transport();
    let mut graph = FilterGraph::new(common::catalog(&transport));
    graph.select_term(Some(common::spring()));
    graph.settle().await;

    graph.select_blocks(&[5]);
    graph.settle().await;
    assert_eq!(graph.selection().ids(EntityKind::Block), vec![5]);

    graph.select_term(Some(common::summer()));
    graph.settle().await;
    assert_eq!(graph.selection().ids(EntityKind::Block), vec![7]);
}

#[tokio::test(start_paused = true)]
async fn slow_subjects_leave_the_field_loading() {
    let transport = common::transport();
    transport.delay("term/6/subjects.json", Duration::from_secs(3));
    let mut graph = FilterGraph::new(common::catalog(&transport));
    graph.select_term(Some(common::spring()));

    let mut order = Vec::new();
    while let Some(field) = graph.next_change().await {
        if field == Field::Buildings {
            assert_eq!(graph.status(EntityKind::Subject), FieldStatus::Loading);
        }
        order.push(field);
    }

    assert_eq!(order.first(), Some(&Field::Blocks));
    assert_eq!(order.last(), Some(&Field::Subjects));
    assert_eq!(graph.subjects().options().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn restore_reapplies_saved_filters_by_id() {
    let transport = common::transport();
    let catalog = common::catalog(&transport);

    let mut original = FilterGraph::new(catalog.clone());
    original.select_term(Some(common::spring()));
    original.settle().await;
    original.select_subjects(&[10]);
    original.settle().await;
    original.select_instructors(&[100]);
    original.select_buildings(&[20]);
    original.select_rooms(&[200]);
    original.set_show_all_day(true);
    original.set_meeting_types([MeetingType::Class, MeetingType::Lab]);
    original.set_color(EntityKind::Instructor, 100, "#FF8800".parse().unwrap());
    original.settle().await;
    let saved = original.selection().clone();
    drop(original);

    let mut restored = FilterGraph::new(catalog);
    restored.restore(saved.clone());
    assert!(restored.selection().ui.show_all_day);
    restored.settle().await;

    assert_eq!(restored.selection(), &saved);
    assert_eq!(
        restored.color_for_label("instructor-100").map(|c| c.as_str()),
        Some("#ff8800")
    );
    assert!(!restored.disable_search());
}

#[tokio::test(start_paused = true)]
async fn restore_drops_ids_that_no_longer_exist() {
    let transport = common::transport();
    let catalog = common::catalog(&transport);
    let mut original = FilterGraph::new(catalog.clone());
    original.select_term(Some(common::spring()));
    original.settle().await;
    original.select_subjects(&[11]);
    original.settle().await;
    let saved = original.selection().clone();

    transport.respond(
        "term/6/subjects.json",
        serde_json::json!({"subjects": [{"id": 10, "name": "BIO"}]}),
    );
    catalog.invalidate_all();

    let mut restored = FilterGraph::new(catalog);
    restored.restore(saved);
    restored.settle().await;

    assert_eq!(restored.selection().ids(EntityKind::Block), vec![6]);
    assert!(restored.selection().subjects.is_empty());
    assert!(restored.disable_search());
}

#[tokio::test(start_paused = true)]
async fn failed_option_fetch_is_an_empty_list() {
    let transport = common::transport();
    transport.fail("term/6/subject/0/instructors.json");
    let mut graph = FilterGraph::new(common::catalog(&transport));

    graph.select_term(Some(common::spring()));
    graph.settle().await;

    assert_eq!(graph.instructors(), &FieldState::Ready(Vec::new()));
    assert_eq!(graph.subjects().options().len(), 2);

    transport.recover("term/6/subject/0/instructors.json");
    graph.select_blocks(&[5]);
    graph.select_blocks(&[6]);
    graph.settle().await;
    assert_eq!(graph.instructors().options().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn deselecting_the_last_subject_disables_search() {
    let transport = common::transport();
    let mut graph = FilterGraph::new(common::catalog(&transport));
    graph.select_term(Some(common::spring()));
    graph.settle().await;
    graph.select_subjects(&[10]);
    graph.set_color(EntityKind::Subject, 10, "#112233".parse().unwrap());
    graph.settle().await;

    assert!(graph.deselect(EntityKind::Subject, 10));
    assert!(!graph.deselect(EntityKind::Subject, 10));

    assert!(graph.disable_search());
    assert!(graph.color_for_label("subject-10").is_none());
    graph.settle().await;
    assert_eq!(graph.instructors().options().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn rooms_are_labelled_and_sorted() {
    let transport = common::transport();
    let mut graph = FilterGraph::new(common::catalog(&transport));
    graph.select_term(Some(common::spring()));
    graph.settle().await;

    let rooms = graph.rooms();
    let names: Vec<_> = rooms.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["SCI - 101", "SCI - B2"]);
}
