//! Annotation Store Integration Tests
//!
//! Upsert semantics against the file-backed store: replace-by-key, timestamps,
//! ordering, concurrent saves, and the export join over a persisted snapshot.

use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use lesson_annotator::core::{export_all, list_lessons};
use lesson_annotator::{
    AnnotationFields, AnnotationStore, Catalog, JsonFileStore, Lesson, Segment, SegmentKey,
};

async fn create_test_store() -> (JsonFileStore, TempDir) {
    let temp = TempDir::new().unwrap();
    let store = JsonFileStore::open(temp.path().join("annotations.json"))
        .await
        .unwrap();
    (store, temp)
}

fn catalog() -> Catalog {
    Catalog::from_lessons(vec![
        Lesson::new(
            "math_101",
            "Fractions",
            (0..5)
                .map(|i| Segment::new(i, format!("line {}", i), "T", i as f64, i as f64 + 1.0))
                .collect(),
        ),
        Lesson::new("L2", "Reading", vec![Segment::new(0, "read", "S", 0.0, 0.8)]),
    ])
}

#[tokio::test]
async fn test_upsert_then_read_back() {
    let (store, _temp) = create_test_store().await;
    let before = Utc::now();

    let fields = AnnotationFields::default()
        .with_category("explanation")
        .with_subcategory("worked example")
        .with_reasoning("instructor walks through a problem")
        .with_confidence(0.8);
    let saved = store.upsert("math_101", 3, fields.clone()).await.unwrap();

    assert!(saved.timestamp >= before);
    assert_eq!(saved.fields(), fields);

    let loaded = store
        .get(&SegmentKey::new("math_101", 3))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, saved);
}

#[tokio::test]
async fn test_repeated_upsert_keeps_one_record_with_latest_values() {
    let (store, _temp) = create_test_store().await;

    let first = store
        .upsert("math_101", 1, AnnotationFields::default().with_category("a"))
        .await
        .unwrap();
    let second = store
        .upsert(
            "math_101",
            1,
            AnnotationFields::default().with_category("b").with_confidence("low"),
        )
        .await
        .unwrap();

    let snapshot = store.get_all().await.unwrap();
    assert_eq!(snapshot.len(), 1);

    let stored = snapshot.get("math_101_1").unwrap();
    assert_eq!(stored.category.as_deref(), Some("b"));
    assert_eq!(stored, &second);
    assert!(second.timestamp >= first.timestamp);
}

#[tokio::test]
async fn test_snapshot_order_is_first_creation_order_across_reopen() {
    let (store, temp) = create_test_store().await;

    for (lesson, segment) in [("L2", 0), ("math_101", 4), ("math_101", 0)] {
        store
            .upsert(lesson, segment, AnnotationFields::default())
            .await
            .unwrap();
    }
    // Updating an existing key does not move it
    store
        .upsert("L2", 0, AnnotationFields::default().with_category("late edit"))
        .await
        .unwrap();

    let reopened = JsonFileStore::open(temp.path().join("annotations.json"))
        .await
        .unwrap();
    let keys: Vec<String> = reopened
        .load_all()
        .await
        .unwrap()
        .keys()
        .map(|k| k.to_string())
        .collect();
    assert_eq!(keys, vec!["L2_0", "math_101_4", "math_101_0"]);
}

#[tokio::test]
async fn test_concurrent_upserts_lose_nothing() {
    let (store, _temp) = create_test_store().await;
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for i in 0..25 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .upsert("math_101", i, AnnotationFields::default().with_category("c"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = store.load_all().await.unwrap();
    assert_eq!(snapshot.len(), 25);
    for i in 0..25 {
        assert!(snapshot.contains_key(&SegmentKey::new("math_101", i)));
    }
}

#[tokio::test]
async fn test_lesson_counts_and_export_over_persisted_snapshot() {
    let (store, _temp) = create_test_store().await;
    let catalog = catalog();

    store
        .upsert("math_101", 0, AnnotationFields::default().with_category("x"))
        .await
        .unwrap();
    store
        .upsert("math_101", 2, AnnotationFields::default().with_category("y"))
        .await
        .unwrap();
    store
        .upsert("math_101", 99, AnnotationFields::default())
        .await
        .unwrap();
    store
        .upsert("gone", 0, AnnotationFields::default())
        .await
        .unwrap();

    let snapshot = store.get_all().await.unwrap();

    let lessons = list_lessons(&catalog, &snapshot);
    assert_eq!(lessons[0].annotated_count, 2);
    assert_eq!(lessons[1].annotated_count, 0);

    let report = export_all(&catalog, &snapshot);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.skipped.missing_segment, 1);
    assert_eq!(report.skipped.missing_lesson, 1);

    // Every resolvable entry has exactly one matching record
    for (key, annotation) in snapshot.iter() {
        let Some((lesson_id, segment_id)) = key.split() else {
            continue;
        };
        let Some(segment) = catalog.lesson(lesson_id).and_then(|l| l.segment(segment_id)) else {
            continue;
        };
        let matches: Vec<_> = report
            .records
            .iter()
            .filter(|r| r.annotation == *annotation)
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, segment.text);
        assert_eq!(matches[0].speaker, segment.speaker);
        assert_eq!(matches[0].start_time, segment.start_time);
        assert_eq!(matches[0].end_time, segment.end_time);
    }
}
