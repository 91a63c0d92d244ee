//! Language adapters and query execution.
//!
//! Each supported language gets one adapter owning its tree-sitter parser,
//! its compiled capture query set, and every language-specific rule the rest
//! of the engine needs: scope boundaries, definition and reference
//! extraction, import path resolution, and test-file detection. The
//! indexing passes in [`crate::indexing`] stay language-agnostic by going
//! through the [`LanguageAdapter`] trait.

pub mod adapter;
pub mod javascript;
pub mod language;
pub mod python;
pub mod query;
pub mod rust;
pub mod typescript;

pub use adapter::{AdapterFactory, FileSet, LanguageAdapter, ScopeBoundary, same_node};
pub use language::Language;
pub use query::{CaptureCategory, CaptureNode, run_capture_query};
