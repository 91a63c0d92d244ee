//! Two-phase reference resolution.
//!
//! Phase 1 ([`NameResolver`]) is lexical: scope-chain lookup with
//! export-chain following for imports. Phase 2 ([`CallResolver`]) is
//! type-aware: method dispatch with inheritance and interface fan-out,
//! constructor resolution, module-member calls, collection and callback
//! dispatch. Both phases read registry snapshots and never mutate them;
//! their combined output is an immutable [`ResolutionState`].

pub mod call_resolver;
pub mod name_resolver;
pub mod state;

pub use call_resolver::{CallResolver, FileCallResolution};
pub use name_resolver::NameResolver;
pub use state::{CallReference, Confidence, Resolution, ResolutionReason, ResolutionState};
