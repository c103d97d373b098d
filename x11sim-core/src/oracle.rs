//! Semantic comparison of the reference operation log against an observed trace.

use std::collections::BTreeMap;
use std::fmt;

use crate::color::{format_hex, parse_css_color};
use crate::observed::ObservedOperation;
use crate::operation::{ArgValue, OpKind, Operation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// Reference count minus observed count for one kind.
    CountMismatch { kind: OpKind, delta: i64 },
    KindMismatch {
        index: usize,
        expected: OpKind,
        observed: OpKind,
    },
    ColorMismatch {
        index: usize,
        kind: OpKind,
        expected: u32,
        observed: Option<String>,
    },
    ArgCountMismatch {
        index: usize,
        kind: OpKind,
        expected: usize,
        observed: usize,
    },
    ArgMismatch {
        index: usize,
        arg_index: usize,
        kind: OpKind,
        path: String,
        expected: ArgValue,
        observed: ArgValue,
    },
    MissingKey {
        index: usize,
        arg_index: usize,
        kind: OpKind,
        path: String,
        key: String,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::CountMismatch { kind, delta } => write!(f, "{}: {:+}", kind, delta),
            Discrepancy::KindMismatch {
                index,
                expected,
                observed,
            } => write!(f, "op {}: expected {}, observed {}", index, expected, observed),
            Discrepancy::ColorMismatch {
                index,
                kind,
                expected,
                observed,
            } => write!(
                f,
                "op {} ({}): color {} observed as {}",
                index,
                kind,
                format_hex(*expected),
                observed.as_deref().unwrap_or("<none>")
            ),
            Discrepancy::ArgCountMismatch {
                index,
                kind,
                expected,
                observed,
            } => write!(
                f,
                "op {} ({}): {} args, observed {}",
                index, kind, expected, observed
            ),
            Discrepancy::ArgMismatch {
                index,
                arg_index,
                kind,
                path,
                expected,
                observed,
            } => write!(
                f,
                "op {} ({}) arg {}{}: expected {}, observed {}",
                index, kind, arg_index, path, expected, observed
            ),
            Discrepancy::MissingKey {
                index,
                arg_index,
                kind,
                path,
                key,
            } => write!(
                f,
                "op {} ({}) arg {}{}: key {:?} missing from observed record",
                index, kind, arg_index, path, key
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleReport {
    pub discrepancies: Vec<Discrepancy>,
    /// Positions compared; zero when the count check failed.
    pub compared: usize,
}

impl OracleReport {
    pub fn passed(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

impl fmt::Display for OracleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return write!(f, "PASS ({} operations)", self.compared);
        }
        writeln!(f, "FAIL ({} discrepancies)", self.discrepancies.len())?;
        for d in &self.discrepancies {
            writeln!(f, "  {}", d)?;
        }
        Ok(())
    }
}

pub fn compare(reference: &[Operation], observed: &[ObservedOperation]) -> OracleReport {
    if reference.len() != observed.len() {
        let discrepancies = count_deltas(reference, observed);
        log::info!(
            "trace length differs: {} reference vs {} observed",
            reference.len(),
            observed.len()
        );
        return OracleReport {
            discrepancies,
            compared: 0,
        };
    }

    let mut out = Vec::new();
    for (index, (r, o)) in reference.iter().zip(observed).enumerate() {
        compare_one(index, r, o, &mut out);
    }
    log::debug!(
        "compared {} operations, {} discrepancies",
        reference.len(),
        out.len()
    );
    OracleReport {
        discrepancies: out,
        compared: reference.len(),
    }
}

fn count_deltas(reference: &[Operation], observed: &[ObservedOperation]) -> Vec<Discrepancy> {
    let mut deltas: BTreeMap<OpKind, i64> = BTreeMap::new();
    for op in reference {
        *deltas.entry(op.kind).or_insert(0) += 1;
    }
    for op in observed {
        *deltas.entry(op.kind).or_insert(0) -= 1;
    }
    deltas
        .into_iter()
        .filter(|&(_, delta)| delta != 0)
        .map(|(kind, delta)| Discrepancy::CountMismatch { kind, delta })
        .collect()
}

fn compare_one(
    index: usize,
    reference: &Operation,
    observed: &ObservedOperation,
    out: &mut Vec<Discrepancy>,
) {
    let kind = reference.kind;
    if kind != observed.kind {
        // Color and args of unrelated kinds say nothing useful.
        out.push(Discrepancy::KindMismatch {
            index,
            expected: kind,
            observed: observed.kind,
        });
        return;
    }

    // Either side carrying a color is enough to compare, whatever the kind.
    let style = observed.style();
    if reference.color != 0 || style.is_some() {
        let parsed = style.and_then(parse_css_color);
        if parsed != Some(reference.color) {
            out.push(Discrepancy::ColorMismatch {
                index,
                kind,
                expected: reference.color,
                observed: style.map(str::to_string),
            });
        }
    }

    if reference.args.len() != observed.args.len() {
        out.push(Discrepancy::ArgCountMismatch {
            index,
            kind,
            expected: reference.args.len(),
            observed: observed.args.len(),
        });
        return;
    }

    for (arg_index, (r, o)) in reference.args.iter().zip(&observed.args).enumerate() {
        let mut ctx = ArgContext {
            index,
            arg_index,
            kind,
            out: &mut *out,
        };
        ctx.compare(String::new(), r, o, false);
    }
}

struct ArgContext<'a> {
    index: usize,
    arg_index: usize,
    kind: OpKind,
    out: &'a mut Vec<Discrepancy>,
}

impl ArgContext<'_> {
    fn compare(&mut self, path: String, expected: &ArgValue, observed: &ArgValue, as_i8: bool) {
        match (expected, observed) {
            (ArgValue::Int(a), ArgValue::Int(b)) => {
                let equal = if as_i8 { *a as i8 == *b as i8 } else { a == b };
                if !equal {
                    self.mismatch(path, expected, observed);
                }
            },
            (ArgValue::Text(a), ArgValue::Text(b)) => {
                if a != b {
                    self.mismatch(path, expected, observed);
                }
            },
            (ArgValue::List(a), ArgValue::List(b)) => {
                if a.len() != b.len() {
                    self.mismatch(path, expected, observed);
                    return;
                }
                for (i, (x, y)) in a.iter().zip(b).enumerate() {
                    self.compare(format!("{}[{}]", path, i), x, y, false);
                }
            },
            (ArgValue::Record(a), ArgValue::Record(b)) => {
                for (key, x) in a {
                    match b.get(key) {
                        Some(y) => self.compare(format!("{}.{}", path, key), x, y, key == "delta"),
                        None => self.out.push(Discrepancy::MissingKey {
                            index: self.index,
                            arg_index: self.arg_index,
                            kind: self.kind,
                            path: path.clone(),
                            key: key.clone(),
                        }),
                    }
                }
            },
            _ => self.mismatch(path, expected, observed),
        }
    }

    fn mismatch(&mut self, path: String, expected: &ArgValue, observed: &ArgValue) {
        self.out.push(Discrepancy::ArgMismatch {
            index: self.index,
            arg_index: self.arg_index,
            kind: self.kind,
            path,
            expected: expected.clone(),
            observed: observed.clone(),
        });
    }
}
