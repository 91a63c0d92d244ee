//! Definition collection (pass 2).
//!
//! Drives the adapter's definition extraction over definition and import
//! captures, deduplicates by symbol id, then applies export specs from
//! export captures. Malformed captures are skipped with a warning; a
//! file's definitions never fail wholesale.

use crate::error::Diagnostic;
use crate::parsing::adapter::{ExportSpec, ExtractionContext, LanguageAdapter};
use crate::parsing::query::{CaptureCategory, CaptureNode};
use crate::symbol::{Definition, DefinitionDetails};
use crate::types::{DefinitionKind, ScopeId, SymbolId};
use std::collections::HashSet;

pub struct DefinitionBuilder;

impl DefinitionBuilder {
    pub fn build(
        adapter: &dyn LanguageAdapter,
        captures: &[CaptureNode],
        source: &str,
        ctx: &ExtractionContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Definition> {
        let mut definitions: Vec<Definition> = Vec::new();
        let mut seen = HashSet::new();

        for cap in captures {
            if !matches!(
                cap.category,
                CaptureCategory::Definition | CaptureCategory::Import
            ) {
                continue;
            }
            for def in adapter.extract_definitions(cap, source, ctx, diagnostics) {
                // One record per id; repeated captures of the same node are
                // dropped, the same position-keyed dedup the reference pass
                // uses.
                if seen.insert(def.symbol_id.clone()) {
                    definitions.push(def);
                }
            }
        }

        let root_scope = ctx.scopes.root_id.clone();
        for cap in captures {
            if cap.category != CaptureCategory::Export {
                continue;
            }
            for spec in adapter.extract_exports(cap, source, ctx, diagnostics) {
                Self::apply_export(spec, &root_scope, &mut definitions, &mut seen, diagnostics);
            }
        }

        definitions
    }

    fn apply_export(
        spec: ExportSpec,
        root_scope: &ScopeId,
        definitions: &mut Vec<Definition>,
        seen: &mut HashSet<SymbolId>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        match spec {
            ExportSpec::Named {
                local_name,
                info,
                location,
            } => {
                // Exporting a name requires a backing definition or a
                // forwarded import in the same file.
                let target = definitions
                    .iter_mut()
                    .find(|d| d.name == local_name && d.kind != DefinitionKind::Parameter);
                match target {
                    Some(def) => {
                        def.is_exported = true;
                        def.export = Some(info);
                    }
                    None => {
                        tracing::warn!(
                            "export of '{local_name}' at {location} has no backing definition"
                        );
                        diagnostics.push(Diagnostic::CaptureMalformed {
                            category: "export".to_string(),
                            location,
                            reason: format!("no backing definition for '{local_name}'"),
                        });
                    }
                }
            }
            ExportSpec::Reexport {
                import,
                info,
                location,
            } => {
                let def = Definition::new(
                    DefinitionKind::Import,
                    &import.local_name.clone(),
                    location,
                    root_scope.clone(),
                )
                .with_details(DefinitionDetails::Import(import))
                .exported(info);
                if seen.insert(def.symbol_id.clone()) {
                    definitions.push(def);
                }
            }
        }
    }
}
