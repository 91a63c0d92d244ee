//! The reference registry: source of truth for call resolution input.

use crate::symbol::{Reference, ReferenceKind};
use crate::types::FilePath;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    by_file: HashMap<FilePath, Vec<Reference>>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, file_path: &FilePath, references: Vec<Reference>) {
        self.by_file.insert(file_path.clone(), references);
    }

    pub fn remove(&mut self, file_path: &FilePath) {
        self.by_file.remove(file_path);
    }

    /// References of a file, in source order.
    pub fn in_file(&self, file_path: &FilePath) -> &[Reference] {
        self.by_file
            .get(file_path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn calls_in_file(&self, file_path: &FilePath) -> impl Iterator<Item = &Reference> {
        self.in_file(file_path)
            .iter()
            .filter(|r| r.kind == ReferenceKind::Call)
    }

    pub fn files(&self) -> impl Iterator<Item = &FilePath> {
        self.by_file.keys()
    }
}
