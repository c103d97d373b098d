use crate::color_table::GcColorTable;
use crate::issue::ValidationIssue;
use crate::operation::{ArgValue, OpKind, Operation};
use crate::operation_log::OperationLog;

/// Everything a session accumulates for the oracle: the operation log, the GC color
/// table it resolves colors through, and the non-fatal validation issues.
#[derive(Debug, Default)]
pub struct TraceState {
    log: OperationLog,
    colors: GcColorTable,
    issues: Vec<ValidationIssue>,
}

/// Final contents of a scenario's trace, detached from the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub operations: Vec<Operation>,
    pub issues: Vec<ValidationIssue>,
}

impl SessionRecord {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl TraceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one operation. The color is looked up now, through `gc`, so it reflects the
    /// context's foreground at the time the request is issued.
    pub fn record(&mut self, kind: OpKind, gc: Option<u32>, args: Vec<ArgValue>) -> &Operation {
        let color = match gc {
            Some(gc) if kind.is_color_bearing() => self.resolve_color(kind, gc),
            _ => 0,
        };
        log::debug!(
            "record #{} {} color={:#08x} args={}",
            self.log.len(),
            kind,
            color,
            args.len()
        );
        self.log.push(Operation::new(kind, color, args))
    }

    fn resolve_color(&self, kind: OpKind, gc: u32) -> u32 {
        match self.colors.get(gc) {
            Some(color) => color,
            None => {
                log::warn!("{} references GC {:#x} before it was created", kind, gc);
                0
            },
        }
    }

    pub fn define_gc(&mut self, gc: u32, foreground: u32) {
        self.colors.insert(gc, foreground);
    }

    pub fn record_issue(&mut self, issue: ValidationIssue) {
        log::warn!("validation issue: {}", issue);
        self.issues.push(issue);
    }

    pub fn operations(&self) -> &[Operation] {
        self.log.as_slice()
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    pub fn colors(&self) -> &GcColorTable {
        &self.colors
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Resets the trace for the next scenario.
    pub fn clear(&mut self) {
        self.log.clear();
        self.colors.clear();
        self.issues.clear();
    }

    pub fn into_record(self) -> SessionRecord {
        SessionRecord {
            operations: self.log.into_operations(),
            issues: self.issues,
        }
    }
}
