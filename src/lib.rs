//! Ariadne: multi-language semantic code intelligence.
//!
//! Given JavaScript, TypeScript, Python, or Rust sources, builds a
//! queryable model of definitions, references, scopes, types, and call
//! edges with cross-file resolution and polymorphic dispatch. Files are
//! updated incrementally: changing one file reanalyzes it and its
//! dependents, nothing else.
//!
//! ```
//! use ariadne::Project;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut project = Project::new();
//! project.update_file(
//!     "a.ts",
//!     "function helper() { return 42; }\nexport function main() { helper(); }\n",
//! )?;
//!
//! let graph = project.get_call_graph();
//! assert_eq!(graph.entry_points.len(), 1); // main; helper is called
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod logging;
pub mod parsing;
pub mod project;
pub mod resolution;
pub mod storage;
pub mod symbol;
pub mod types;

pub use config::Settings;
pub use error::{Diagnostic, IndexError, IndexResult, ParseError, ParseResult, Severity};
pub use graph::{CallGraph, CallGraphBuilder, CallGraphNode};
pub use parsing::Language;
pub use project::{ExportedSymbol, FileState, ImportWithDefinition, Project};
pub use resolution::{CallReference, Confidence, Resolution, ResolutionReason};
pub use symbol::{
    CallType, Definition, DefinitionDetails, ImportKind, LexicalScope, MemberInfo, Receiver,
    Reference, ReferenceKind, TypeDescriptor,
};
pub use types::{
    DefinitionKind, FilePath, KindClass, Location, Point, ScopeId, ScopeKind, SymbolId, TypeId,
};
