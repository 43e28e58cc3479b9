//! Request orchestration for the problem pipeline.
//!
//! Each operation is a short linear pipeline with early exit on first
//! failure and no internal retries. The attach-data flow walks
//! file-stored → record-updated → message-encoded → published; a failed
//! step surfaces its error and does not advance. In particular, a publish
//! failure after the record update is a deliberate partial-success state:
//! the data reference stays persisted, the worker pool was never
//! notified, and recovery is an explicit re-attach (safe, because file
//! ingestion is content-addressed and the update is idempotent for the
//! same input).

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::codec::{self, CodecError};
use crate::dispatch::{DispatchMessage, PublishError, Publisher};
use crate::ingest::{FileStore, IngestError};
use crate::problem::{ProblemDetail, ProblemDraft, ProblemSummary, ValidationError};
use crate::store::{NewProblem, ProblemPatch, ProblemStore, StoreError};

/// Errors surfaced by service operations.
///
/// Every failure is converted to the uniform response envelope at the
/// operation boundary; nothing propagates past its originating call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Entity failed semantic validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Structured payload or message (de)serialization failed.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// File ingestion failed.
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// Persistence layer failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Pagination parameters were invalid.
    #[error("Invalid parameter: {0}")]
    Param(String),

    /// The broker rejected the dispatch message.
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
}

/// Orchestrates problem creation, data attachment, and reads.
///
/// Holds the process-wide shared capabilities: the record store, the
/// file store, and the broker publisher. All are constructed once at
/// startup and reused across requests.
pub struct ProblemService {
    store: Arc<dyn ProblemStore>,
    files: FileStore,
    publisher: Arc<dyn Publisher>,
    topic: String,
}

impl ProblemService {
    /// Creates a new service from its injected capabilities.
    pub fn new(
        store: Arc<dyn ProblemStore>,
        files: FileStore,
        publisher: Arc<dyn Publisher>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            store,
            files,
            publisher,
            topic: topic.into(),
        }
    }

    /// Creates a problem: validate, encode payloads, persist.
    ///
    /// The poster comes from the authenticated session, never from the
    /// client-bound draft.
    pub async fn create_problem(
        &self,
        draft: &ProblemDraft,
        poster: &str,
    ) -> Result<i64, ServiceError> {
        draft.validate()?;

        let example = codec::encode_payload(&draft.example)?;
        let output = codec::encode_payload(&draft.output)?;

        let problem_id = self
            .store
            .create(&NewProblem {
                title: draft.title.clone(),
                description: draft.description.clone(),
                example,
                output,
                solution: draft.solution.clone(),
                poster: poster.to_string(),
            })
            .await?;

        info!(problem_id, poster, "created problem");
        Ok(problem_id)
    }

    /// Attaches a test-data file to a problem and dispatches it for
    /// grading.
    ///
    /// Pipeline: fetch record → store file → update record → encode
    /// dispatch message → publish. Exactly one publish per call; the
    /// record update is not rolled back if the publish fails.
    pub async fn attach_data(&self, problem_id: i64, upload: &[u8]) -> Result<(), ServiceError> {
        let problem = self.store.fetch_one(problem_id).await?;

        let stored = self.files.store(upload).await?;

        self.store
            .update(problem_id, ProblemPatch::SetDataReference(stored.name.clone()))
            .await?;

        let message = DispatchMessage::new(
            problem_id,
            upload.to_vec(),
            problem.solution,
            problem.output,
        );
        let payload = message.encode()?;

        if let Err(e) = self.publisher.produce(&self.topic, &payload).await {
            // The data reference is already persisted; the record looks
            // attached but was never dispatched. Re-attaching the same
            // file is the documented recovery path.
            warn!(problem_id, error = %e, "record updated but dispatch publish failed");
            return Err(e.into());
        }

        info!(
            problem_id,
            data_reference = %stored.name,
            topic = %self.topic,
            "dispatched problem data"
        );
        Ok(())
    }

    /// Fetches a problem with its payloads decoded.
    pub async fn get_problem(&self, problem_id: i64) -> Result<ProblemDetail, ServiceError> {
        let problem = self.store.fetch_one(problem_id).await?;

        let example = codec::decode_payload(&problem.example)?;
        let output = codec::decode_payload(&problem.output)?;

        Ok(ProblemDetail {
            problem_id: problem.problem_id,
            title: problem.title,
            description: problem.description,
            example,
            output,
            poster: problem.poster,
        })
    }

    /// Lists problem summaries.
    ///
    /// Rejects negative pagination parameters before the store is
    /// reached; the store contract assumes they are non-negative.
    pub async fn list_problems(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ProblemSummary>, ServiceError> {
        if offset < 0 {
            return Err(ServiceError::Param(format!("offset must be >= 0, got {}", offset)));
        }
        if limit < 0 {
            return Err(ServiceError::Param(format!("limit must be >= 0, got {}", limit)));
        }

        Ok(self.store.list(offset, limit).await?)
    }

    /// Returns the total number of problems.
    pub async fn count_problems(&self) -> Result<i64, ServiceError> {
        Ok(self.store.total().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::store::StoredProblem;

    /// In-memory store that counts every call, so tests can assert the
    /// validation gate kept the store untouched.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<BTreeMap<i64, StoredProblem>>,
        next_id: AtomicUsize,
        calls: AtomicUsize,
    }

    impl MemoryStore {
        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProblemStore for MemoryStore {
        async fn create(&self, problem: &NewProblem) -> Result<i64, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
            let now = Utc::now();
            self.rows.lock().unwrap().insert(
                id,
                StoredProblem {
                    problem_id: id,
                    title: problem.title.clone(),
                    description: problem.description.clone(),
                    example: problem.example.clone(),
                    output: problem.output.clone(),
                    solution: problem.solution.clone(),
                    poster: problem.poster.clone(),
                    data_reference: None,
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(id)
        }

        async fn update(&self, problem_id: i64, patch: ProblemPatch) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(&problem_id)
                .ok_or(StoreError::NotFound(problem_id))?;
            match patch {
                ProblemPatch::SetDataReference(reference) => {
                    row.data_reference = Some(reference);
                }
            }
            row.updated_at = Utc::now();
            Ok(())
        }

        async fn fetch_one(&self, problem_id: i64) -> Result<StoredProblem, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rows
                .lock()
                .unwrap()
                .get(&problem_id)
                .cloned()
                .ok_or(StoreError::NotFound(problem_id))
        }

        async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ProblemSummary>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|row| ProblemSummary {
                    problem_id: row.problem_id,
                    title: row.title.clone(),
                    poster: row.poster.clone(),
                    has_data: row.data_reference.as_deref().map_or(false, |r| !r.is_empty()),
                    created_at: row.created_at,
                })
                .collect())
        }

        async fn total(&self) -> Result<i64, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().unwrap().len() as i64)
        }
    }

    /// Publisher that records everything it accepts.
    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl RecordingPublisher {
        fn published(&self) -> Vec<(String, Vec<u8>)> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn produce(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.to_vec()));
            Ok(())
        }
    }

    /// Publisher that simulates a broker outage.
    struct FailingPublisher;

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn produce(&self, _topic: &str, _payload: &[u8]) -> Result<(), PublishError> {
            Err(PublishError::ConnectionFailed("broker unreachable".to_string()))
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        publisher: Arc<RecordingPublisher>,
        service: ProblemService,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(MemoryStore::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let service = ProblemService::new(
            store.clone(),
            FileStore::new(dir.path()),
            publisher.clone(),
            crate::dispatch::DISPATCH_TOPIC,
        );
        Harness {
            store,
            publisher,
            service,
            _dir: dir,
        }
    }

    fn two_sum_draft() -> ProblemDraft {
        ProblemDraft::new(
            "Two Sum",
            "Given an array of integers, return indices of two numbers adding to a target.",
            serde_json::json!({"nums": [2, 7, 11, 15], "target": 9}),
            serde_json::json!([0, 1]),
            "def two_sum(nums, target): ...",
        )
    }

    #[tokio::test]
    async fn test_create_assigns_identifier_and_fetch_matches() {
        let h = harness();

        let id = h
            .service
            .create_problem(&two_sum_draft(), "alice")
            .await
            .expect("create should work");
        assert!(id > 0);

        let detail = h.service.get_problem(id).await.expect("get should work");
        assert_eq!(detail.title, "Two Sum");
        assert_eq!(detail.poster, "alice");
        assert_eq!(detail.example["target"], 9);
        assert_eq!(detail.output, serde_json::json!([0, 1]));
    }

    #[tokio::test]
    async fn test_validation_gate_keeps_store_untouched() {
        let h = harness();

        let mut draft = two_sum_draft();
        draft.title = String::new();

        let err = h
            .service
            .create_problem(&draft, "alice")
            .await
            .expect_err("should fail");
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(h.store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_attach_data_publishes_exactly_once() {
        let h = harness();
        let id = h.service.create_problem(&two_sum_draft(), "alice").await.unwrap();

        let upload = b"0123456789";
        h.service
            .attach_data(id, upload)
            .await
            .expect("attach should work");

        // Data reference is persisted.
        let row = h.store.fetch_one(id).await.unwrap();
        let reference = row.data_reference.expect("data_reference should be set");
        assert!(!reference.is_empty());

        // Exactly one message, carrying the id and the 10 bytes.
        let published = h.publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, crate::dispatch::DISPATCH_TOPIC);

        let message = DispatchMessage::decode(&published[0].1).expect("decode should work");
        assert_eq!(message.problem_id, id);
        assert_eq!(message.data_source, upload.to_vec());
        assert_eq!(
            crate::codec::decode_payload(&message.expected_output).unwrap(),
            serde_json::json!([0, 1])
        );
    }

    #[tokio::test]
    async fn test_attach_data_unknown_id_never_publishes() {
        let h = harness();

        let err = h
            .service
            .attach_data(999, b"0123456789")
            .await
            .expect_err("should fail");
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(999))));
        assert!(h.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_data_reference() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(MemoryStore::default());
        let service = ProblemService::new(
            store.clone(),
            FileStore::new(dir.path()),
            Arc::new(FailingPublisher),
            crate::dispatch::DISPATCH_TOPIC,
        );

        let id = service.create_problem(&two_sum_draft(), "alice").await.unwrap();
        let err = service
            .attach_data(id, b"0123456789")
            .await
            .expect_err("should fail");
        assert!(matches!(err, ServiceError::Publish(_)));

        // No rollback: the record still looks attached.
        let row = store.fetch_one(id).await.unwrap();
        assert!(row.data_reference.is_some());
    }

    #[tokio::test]
    async fn test_empty_upload_leaves_record_unchanged() {
        let h = harness();
        let id = h.service.create_problem(&two_sum_draft(), "alice").await.unwrap();

        let err = h
            .service
            .attach_data(id, b"")
            .await
            .expect_err("should fail");
        assert!(matches!(err, ServiceError::Ingest(IngestError::EmptyUpload)));

        let row = h.store.fetch_one(id).await.unwrap();
        assert!(row.data_reference.is_none());
        assert!(h.publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_partial_update_isolation() {
        let h = harness();
        let id = h.service.create_problem(&two_sum_draft(), "alice").await.unwrap();
        let before = h.store.fetch_one(id).await.unwrap();

        h.service.attach_data(id, b"0123456789").await.unwrap();

        let after = h.store.fetch_one(id).await.unwrap();
        assert_eq!(before.title, after.title);
        assert_eq!(before.description, after.description);
        assert_eq!(before.example, after.example);
        assert_eq!(before.output, after.output);
        assert_eq!(before.solution, after.solution);
        assert_eq!(before.poster, after.poster);
        assert_ne!(before.data_reference, after.data_reference);
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let h = harness();
        for i in 0..5 {
            let mut draft = two_sum_draft();
            draft.title = format!("Problem {}", i);
            h.service.create_problem(&draft, "alice").await.unwrap();
        }

        let page = h.service.list_problems(1, 2).await.expect("list should work");
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "Problem 1");

        assert_eq!(h.service.count_problems().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_negative_pagination_rejected_before_store() {
        let h = harness();
        let calls_before = h.store.call_count();

        let err = h.service.list_problems(-1, 10).await.expect_err("should fail");
        assert!(matches!(err, ServiceError::Param(_)));

        let err = h.service.list_problems(0, -5).await.expect_err("should fail");
        assert!(matches!(err, ServiceError::Param(_)));

        assert_eq!(h.store.call_count(), calls_before);
    }

    #[tokio::test]
    async fn test_reattach_same_file_is_idempotent() {
        let h = harness();
        let id = h.service.create_problem(&two_sum_draft(), "alice").await.unwrap();

        h.service.attach_data(id, b"0123456789").await.unwrap();
        let first = h.store.fetch_one(id).await.unwrap().data_reference;

        h.service.attach_data(id, b"0123456789").await.unwrap();
        let second = h.store.fetch_one(id).await.unwrap().data_reference;

        // Content-addressed naming: the reference is stable across retries.
        assert_eq!(first, second);
        assert_eq!(h.publisher.published().len(), 2);
    }
}
