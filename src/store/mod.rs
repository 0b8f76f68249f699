//! # Balade Record Store
//!
//! A single document collection of Balade records with find, count,
//! grouping, distinct and update operations.
//!
//! The HTTP layer only sees the [`BaladeStore`] trait. [`DocumentStore`]
//! is the embedded implementation: records are kept in memory behind one
//! lock and, when a data directory is configured, rewritten to a JSON file
//! after every mutation. Writers take turns; readers are only held back
//! while a persisted version is swapped in.

pub mod balade;
pub mod collection;
pub mod config;
pub mod errors;
pub mod filter;
pub mod persist;

pub use balade::{parse_id, Balade, BaladeFields, NewBalade, ID_FIELD, REQUIRED_FIELDS};
pub use collection::{BaladeStore, DeleteOutcome, DocumentStore, GroupCount, UpdateOutcome};
pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use filter::{Filter, SortBy};
