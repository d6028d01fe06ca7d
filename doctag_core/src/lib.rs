//! `doctag_core` is the core library for doctag, a tool that keeps the tags of
//! javadoc comments consistent across a codebase. Given a declarative tag
//! policy it adds missing tags, moves or removes misplaced ones and
//! conditionally overwrites existing ones, leaving every other byte of the
//! file untouched.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Policy document (YAML)
//!   → TagPolicy (ordered, validated tag rules)
//! Java source file
//!   → Source scanner (finds /** … */ blocks, classifies the documented element)
//!   → Block model (existing tags with spans into the block's original text)
//!   → Engine (applies every rule in order, one edit list per block)
//!   → Orchestrator (tokenizes blocks, rewrites each exactly once, splices back)
//!   → Batch driver (walks the target, writes changed files, log-and-continue)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Tag policy loading and validation.
//! - [`project`]: Directory walking and batch runs.
//! - [`source_scanner`]: Documentation block discovery and element classification.
//!
//! ## Key Types
//!
//! - [`TagPolicy`] / [`TagRule`]: The configured tags.
//! - [`DocumentationBlock`]: One comment with its parsed [`ExistingTag`]s.
//! - [`CodeUnit`]: One source file split into blocks.
//! - [`BlockOutcome`] / [`FileRewrite`] / [`BatchReport`]: Results at block,
//!   file and run level.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use doctag_core::BatchMode;
//! use doctag_core::TagPolicy;
//! use doctag_core::run_batch;
//!
//! let policy = TagPolicy::load(Path::new("doctag.yml")).unwrap();
//! let report = run_batch(Path::new("src"), &policy, BatchMode::DryRun).unwrap();
//! println!("{} file(s) would change", report.changes.len());
//! ```

pub use block::*;
pub use config::*;
pub use element::*;
pub use engine::*;
pub use error::*;
pub use position::*;
pub use project::*;
pub use rewrite::*;
pub use source_scanner::*;
pub use template::*;
pub use version::*;

mod block;
pub mod config;
mod element;
mod engine;
#[allow(unused_assignments)]
mod error;
mod position;
pub mod project;
mod rewrite;
pub mod source_scanner;
mod template;
mod version;

#[cfg(test)]
mod __fixtures;
