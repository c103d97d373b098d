use std::collections::BTreeMap;

use crate::operation::{OpKind, Operation};

/// Append-only, issue-ordered trace of the operations sent in one scenario.
#[derive(Debug, Default)]
pub struct OperationLog {
    operations: Vec<Operation>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: Operation) -> &Operation {
        self.operations.push(operation);
        &self.operations[self.operations.len() - 1]
    }

    pub fn as_slice(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn last(&self) -> Option<&Operation> {
        self.operations.last()
    }

    pub fn counts_by_kind(&self) -> BTreeMap<OpKind, usize> {
        let mut counts = BTreeMap::new();
        for op in &self.operations {
            *counts.entry(op.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}
