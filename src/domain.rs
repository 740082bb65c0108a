//! Domain models for traceability auditing.
//!
//! This module contains the filesystem-agnostic core: requirement and test
//! records, the directive-block parser, link resolution, coverage statistics
//! and configuration.

/// Requirement and test records.
pub mod item;
pub use item::{DuplicateId, Record, Requirement, Test};

mod config;
pub use config::{Config, SkipList, CONFIG_FILE};

/// In-source `HODOR-*` directive parsing.
pub mod directive;
pub use directive::{DirectiveBlock, DirectiveError};

pub mod graph;
pub use graph::{Link, LinkGraph, LinkStatus, ResolveError, ResolvedRequirement, ResolvedTest};

pub mod coverage;
pub use coverage::Summary;

mod payload;
pub use payload::Payload;
