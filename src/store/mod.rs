//! PostgreSQL persistent storage for problem records.
//!
//! The store holds one row per problem; the structured `example` /
//! `output` payloads are persisted as opaque canonical-codec bytes and
//! decoded only by readers through the shared codec. Partial updates go
//! through a closed [`ProblemPatch`] set rather than a field-name map.

pub mod migrations;
pub mod problems;

pub use migrations::{MigrationError, MigrationRunner};
pub use problems::{
    NewProblem, PgProblemStore, ProblemPatch, ProblemStore, StoreError, StoredProblem,
};
