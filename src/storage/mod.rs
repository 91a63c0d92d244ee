//! Project registries.
//!
//! All registries support atomic per-file update and removal; updating a
//! file is remove + insert. Membership is strictly partitioned by file, so
//! removing a file removes every trace of it.

pub mod definitions;
pub mod exports;
pub mod import_graph;
pub mod references;
pub mod scopes;
pub mod types;

pub use definitions::DefinitionRegistry;
pub use exports::{ExportEntry, ExportRegistry};
pub use import_graph::{ImportGraph, ResolvedImport};
pub use references::ReferenceRegistry;
pub use scopes::ScopeRegistry;
pub use types::TypeRegistry;
