use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::{doc, Bson, Document};

use sync_data::models::{Result, SyncError};
use sync_data::storage::{RecordStore, SyncWriter, TIME_RECEIVED_FIELD};

/// Mongo semantics for the dedup filter: a Null probe also matches documents
/// missing the field entirely.
fn filter_matches(doc: &Document, probe: &Bson) -> bool {
    match doc.get(TIME_RECEIVED_FIELD) {
        Some(value) => value == probe,
        None => *probe == Bson::Null,
    }
}

#[derive(Clone, Default)]
struct InMemoryStore {
    docs: Arc<Mutex<Vec<Document>>>,
    index_calls: Arc<AtomicUsize>,
    fail_lookups: Arc<AtomicBool>,
    fail_inserts: Arc<AtomicBool>,
}

impl InMemoryStore {
    fn contents(&self) -> Vec<Document> {
        self.docs.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn ensure_time_received_index(&self) -> Result<()> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_by_time_received(&self, value: &Bson) -> Result<Option<Document>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(SyncError::Write("lookup refused".into()));
        }
        let docs = self.docs.lock().unwrap();
        Ok(docs.iter().find(|d| filter_matches(d, value)).cloned())
    }

    async fn insert(&self, record: Document) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(SyncError::Write("insert refused".into()));
        }
        self.docs.lock().unwrap().push(record);
        Ok(())
    }
}

fn records_with_times(times: &[i64]) -> Vec<Document> {
    times.iter().map(|t| doc! { TIME_RECEIVED_FIELD: *t, "reading": t * 10 }).collect()
}

#[tokio::test]
async fn write_all_inserts_fresh_records_and_reruns_insert_zero() {
    let store = InMemoryStore::default();
    let writer = SyncWriter::new(store.clone());
    let records = records_with_times(&[1, 2, 3]);

    writer.ensure_index().await.unwrap();
    assert_eq!(writer.write_all(&records).await.unwrap(), 3);
    assert_eq!(store.contents().len(), 3);

    // Second run over the same window is a no-op: same contents, zero inserts.
    writer.ensure_index().await.unwrap();
    assert_eq!(writer.write_all(&records).await.unwrap(), 0);
    assert_eq!(store.contents().len(), 3);
    assert_eq!(store.index_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn equal_dedup_keys_yield_at_most_one_document() {
    let store = InMemoryStore::default();
    let writer = SyncWriter::new(store.clone());
    let records = vec![
        doc! { TIME_RECEIVED_FIELD: 7, "reading": "first" },
        doc! { TIME_RECEIVED_FIELD: 7, "reading": "second" },
    ];

    assert_eq!(writer.write_all(&records).await.unwrap(), 1);
    assert_eq!(store.contents().len(), 1);
    assert_eq!(store.contents()[0].get_str("reading").unwrap(), "first");
}

#[tokio::test]
async fn final_contents_do_not_depend_on_input_order() {
    let forward = InMemoryStore::default();
    SyncWriter::new(forward.clone())
        .write_all(&records_with_times(&[1, 2, 3]))
        .await
        .unwrap();

    let reversed = InMemoryStore::default();
    SyncWriter::new(reversed.clone())
        .write_all(&records_with_times(&[3, 2, 1]))
        .await
        .unwrap();

    let mut a: Vec<i64> = forward.contents().iter().map(|d| d.get_i64(TIME_RECEIVED_FIELD).unwrap()).collect();
    let mut b: Vec<i64> = reversed.contents().iter().map(|d| d.get_i64(TIME_RECEIVED_FIELD).unwrap()).collect();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[tokio::test]
async fn lookup_failure_aborts_immediately() {
    let store = InMemoryStore::default();
    let writer = SyncWriter::new(store.clone());
    store.fail_lookups.store(true, Ordering::SeqCst);

    let err = writer.write_all(&records_with_times(&[1, 2])).await.unwrap_err();
    assert!(matches!(err, SyncError::Write(_)));
    assert!(store.contents().is_empty());
}

#[tokio::test]
async fn insert_failure_aborts_immediately() {
    let store = InMemoryStore::default();
    let writer = SyncWriter::new(store.clone());
    store.fail_inserts.store(true, Ordering::SeqCst);

    let err = writer.write_all(&records_with_times(&[1])).await.unwrap_err();
    assert!(matches!(err, SyncError::Write(_)));
    assert!(store.contents().is_empty());
}

#[tokio::test]
async fn records_without_dedup_key_converge_on_rerun() {
    let store = InMemoryStore::default();
    let writer = SyncWriter::new(store.clone());
    let records = vec![doc! { "reading": "no timestamp" }];

    // New against an empty destination, then matched by the Null probe.
    assert_eq!(writer.write_all(&records).await.unwrap(), 1);
    assert_eq!(writer.write_all(&records).await.unwrap(), 0);
    assert_eq!(store.contents().len(), 1);
}
