//! Schema of the trace recorded independently on the rendering side.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::color::format_hex;
use crate::operation::{ArgValue, OpKind, Operation, Paint};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("malformed trace JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArg(String),

    #[error("unknown operation type {0:?}")]
    UnknownKind(String),

    #[error("trace record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: Box<TraceError>,
    },
}

/// One operation as the rendering client reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedOperation {
    #[serde(rename = "type")]
    pub kind: OpKind,
    #[serde(default)]
    pub args: Vec<ArgValue>,
    #[serde(rename = "fillStyle", default, skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    #[serde(rename = "strokeStyle", default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
}

impl ObservedOperation {
    pub fn new(kind: OpKind, args: Vec<ArgValue>) -> Self {
        Self {
            kind,
            args,
            fill_style: None,
            stroke_style: None,
        }
    }

    pub fn with_fill(mut self, style: impl Into<String>) -> Self {
        self.fill_style = Some(style.into());
        self
    }

    pub fn with_stroke(mut self, style: impl Into<String>) -> Self {
        self.stroke_style = Some(style.into());
        self
    }

    /// The style string that carries this operation's color, if any. Empty strings count
    /// as absent.
    pub fn style(&self) -> Option<&str> {
        let fill = non_empty(self.fill_style.as_deref());
        let stroke = non_empty(self.stroke_style.as_deref());
        match self.kind.paint() {
            Some(Paint::Stroke) => stroke.or(fill),
            _ => fill.or(stroke),
        }
    }

    fn from_value(value: Value) -> Result<Self, TraceError> {
        let Value::Object(mut map) = value else {
            return Err(TraceError::InvalidArg(format!(
                "expected an object, found {}",
                value
            )));
        };

        let kind = match map.remove("type") {
            Some(Value::String(name)) => {
                serde_json::from_value::<OpKind>(Value::String(name.clone()))
                    .map_err(|_| TraceError::UnknownKind(name))?
            },
            Some(other) => return Err(TraceError::UnknownKind(other.to_string())),
            None => return Err(TraceError::InvalidArg("missing \"type\"".to_string())),
        };

        let args = match map.remove("args") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(ArgValue::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(TraceError::InvalidArg(format!(
                    "\"args\" must be an array, found {}",
                    other
                )))
            },
        };

        Ok(Self {
            kind,
            args,
            fill_style: style_field(&mut map, "fillStyle")?,
            stroke_style: style_field(&mut map, "strokeStyle")?,
        })
    }
}

/// The observation a faithful renderer would report for `op`: same args, with the
/// logged color in the style field its kind paints with.
impl From<&Operation> for ObservedOperation {
    fn from(op: &Operation) -> Self {
        let observed = ObservedOperation::new(op.kind, op.args.clone());
        match op.kind.paint() {
            Some(Paint::Stroke) => observed.with_stroke(format_hex(op.color)),
            Some(Paint::Fill) => observed.with_fill(format_hex(op.color)),
            None if op.color != 0 => observed.with_fill(format_hex(op.color)),
            None => observed,
        }
    }
}

fn non_empty(style: Option<&str>) -> Option<&str> {
    style.filter(|s| !s.trim().is_empty())
}

fn style_field(
    map: &mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<String>, TraceError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(TraceError::InvalidArg(format!(
            "{:?} must be a string, found {}",
            key, other
        ))),
    }
}

/// Parses a JSON array of observed operations. Errors carry the index of the first bad record.
pub fn parse_observed_trace(json: &str) -> Result<Vec<ObservedOperation>, TraceError> {
    let records: Vec<Value> = serde_json::from_str(json)?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            ObservedOperation::from_value(value).map_err(|err| TraceError::Record {
                index,
                source: Box::new(err),
            })
        })
        .collect()
}
