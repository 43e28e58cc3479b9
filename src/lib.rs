//! judgeforge: problem intake and asynchronous grading dispatch.
//!
//! This library lets a user define a programming-exercise problem and
//! later attach a bulk test-data file to it. Attaching data never blocks
//! on grading: the pipeline stores the file, updates the record, and
//! hands an encoded dispatch message to a broker topic that the external
//! grading worker pool consumes at its own pace.

// Core modules
pub mod cli;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod ingest;
pub mod problem;
pub mod response;
pub mod service;
pub mod store;

// Re-export commonly used error types
pub use codec::CodecError;
pub use config::ConfigError;
pub use dispatch::PublishError;
pub use ingest::IngestError;
pub use problem::ValidationError;
pub use service::ServiceError;
pub use store::StoreError;
