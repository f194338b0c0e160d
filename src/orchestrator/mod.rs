//! Aggregation pipeline: bounded retry orchestration, record
//! normalisation, duplicate removal, and pagination.
//!
//! [`aggregate::Aggregator`] is the entry point; the sibling modules
//! are its pure pipeline stages.

pub mod aggregate;
pub mod dedup;
pub mod normalize;
pub mod paginate;
