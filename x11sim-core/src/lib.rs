pub mod color;
pub mod color_table;
pub mod issue;
pub mod observed;
pub mod operation;
pub mod operation_log;
pub mod oracle;
pub mod trace_state;

#[cfg(test)]
mod tests;

pub use color::{format_hex, parse_css_color};
pub use color_table::GcColorTable;
pub use issue::ValidationIssue;
pub use observed::{parse_observed_trace, ObservedOperation, TraceError};
pub use operation::{ArgValue, OpKind, Operation, Paint};
pub use operation_log::OperationLog;
pub use oracle::{compare, Discrepancy, OracleReport};
pub use trace_state::{SessionRecord, TraceState};
