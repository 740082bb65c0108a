//! Requirement-to-test traceability auditing
//!
//! Requirements and tests are declared in YAML item files, and tests may also
//! be declared with `HODOR-*` annotations inside any source file. The audit
//! merges both into one bidirectional link graph and computes coverage.

pub mod domain;
pub use domain::{
    Config, Link, LinkGraph, LinkStatus, Payload, Requirement, SkipList, Summary, Test,
};

/// Filesystem loading of item files and annotated sources.
pub mod storage;

pub mod audit;
pub use audit::{Audit, AuditError};

pub mod report;
