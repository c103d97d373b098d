use std::fmt;

use x11sim_protocol::FontIssue;

use crate::operation::OpKind;

/// A protocol-level discrepancy found while the scenario kept running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    SequenceMismatch {
        kind: OpKind,
        expected: u16,
        received: u16,
    },
    Font {
        fid: u32,
        issue: FontIssue,
    },
    ListFontsCount {
        declared: u16,
        received: usize,
    },
    /// A reply was waiting in the slot before a synchronous request was sent.
    UnsolicitedReply {
        sequence: Option<u16>,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::SequenceMismatch {
                kind,
                expected,
                received,
            } => write!(
                f,
                "{} reply carries sequence {}, expected {}",
                kind, received, expected
            ),
            ValidationIssue::Font { fid, issue } => write!(f, "font {:#x}: {}", fid, issue),
            ValidationIssue::ListFontsCount { declared, received } => write!(
                f,
                "listFonts reply declares {} names but carries {}",
                declared, received
            ),
            ValidationIssue::UnsolicitedReply { sequence } => match sequence {
                Some(seq) => write!(f, "unsolicited reply with sequence {}", seq),
                None => write!(f, "unsolicited reply without a sequence number"),
            },
        }
    }
}
