//! Reference collection (pass 3).
//!
//! Drives the adapter's reference classification over reference captures.
//! Classification is position-based throughout: whether an identifier is
//! the function of a call, the property of a method call, or an assignment
//! target is decided by comparing node kinds and spans, never AST object
//! identity.

use crate::parsing::adapter::{ExtractionContext, LanguageAdapter};
use crate::parsing::query::{CaptureCategory, CaptureNode};
use crate::symbol::Reference;
use std::collections::HashSet;

pub struct ReferenceBuilder;

impl ReferenceBuilder {
    pub fn build(
        adapter: &dyn LanguageAdapter,
        captures: &[CaptureNode],
        source: &str,
        ctx: &ExtractionContext,
    ) -> Vec<Reference> {
        let mut references = Vec::new();
        let mut seen = HashSet::new();

        for cap in captures {
            if cap.category != CaptureCategory::Reference {
                continue;
            }
            let Some(reference) = adapter.classify_reference(cap, source, ctx) else {
                continue;
            };
            // A node can satisfy several query patterns; keep one record
            // per (position, kind).
            let key = (
                reference.location.start_line,
                reference.location.start_column,
                reference.location.end_line,
                reference.location.end_column,
                reference.kind,
            );
            if seen.insert(key) {
                references.push(reference);
            }
        }

        // Captures arrive outer-first; references are flat, so re-sort to
        // plain source order for deterministic downstream processing.
        references.sort_by_key(|r| (r.location.start_line, r.location.start_column));
        references
    }
}
