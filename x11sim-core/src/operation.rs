use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use x11sim_protocol::{Arc, Point, Rectangle, Segment, TextItem16, TextItem8};

use crate::observed::TraceError;

/// Semantic tag of a recorded operation, serialized the way the rendering client reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpKind {
    CreateWindow,
    MapWindow,
    ChangeProperty,
    OpenFont,
    CloseFont,
    QueryFont,
    ListFonts,
    #[serde(rename = "createGC")]
    CreateGc,
    PolyPoint,
    PolyLine,
    PolySegment,
    PolyRectangle,
    PolyArc,
    FillPoly,
    PolyFillRectangle,
    FillRectangle,
    PolyFillArc,
    PutImage,
    PolyText8,
    PolyText16,
    ImageText8,
    ImageText16,
    GrabPointer,
    UngrabPointer,
    GrabKeyboard,
    UngrabKeyboard,
}

/// Which canvas style carries the color of an operation on the observed side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Fill,
    Stroke,
}

impl OpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::CreateWindow => "createWindow",
            OpKind::MapWindow => "mapWindow",
            OpKind::ChangeProperty => "changeProperty",
            OpKind::OpenFont => "openFont",
            OpKind::CloseFont => "closeFont",
            OpKind::QueryFont => "queryFont",
            OpKind::ListFonts => "listFonts",
            OpKind::CreateGc => "createGC",
            OpKind::PolyPoint => "polyPoint",
            OpKind::PolyLine => "polyLine",
            OpKind::PolySegment => "polySegment",
            OpKind::PolyRectangle => "polyRectangle",
            OpKind::PolyArc => "polyArc",
            OpKind::FillPoly => "fillPoly",
            OpKind::PolyFillRectangle => "polyFillRectangle",
            OpKind::FillRectangle => "fillRectangle",
            OpKind::PolyFillArc => "polyFillArc",
            OpKind::PutImage => "putImage",
            OpKind::PolyText8 => "polyText8",
            OpKind::PolyText16 => "polyText16",
            OpKind::ImageText8 => "imageText8",
            OpKind::ImageText16 => "imageText16",
            OpKind::GrabPointer => "grabPointer",
            OpKind::UngrabPointer => "ungrabPointer",
            OpKind::GrabKeyboard => "grabKeyboard",
            OpKind::UngrabKeyboard => "ungrabKeyboard",
        }
    }

    /// `None` for operations that draw nothing and therefore carry no color.
    pub fn paint(self) -> Option<Paint> {
        match self {
            OpKind::PolyPoint
            | OpKind::PolyLine
            | OpKind::PolySegment
            | OpKind::PolyRectangle
            | OpKind::PolyArc => Some(Paint::Stroke),
            OpKind::FillPoly
            | OpKind::PolyFillRectangle
            | OpKind::FillRectangle
            | OpKind::PolyFillArc
            | OpKind::PutImage
            | OpKind::PolyText8
            | OpKind::PolyText16
            | OpKind::ImageText8
            | OpKind::ImageText16 => Some(Paint::Fill),
            OpKind::CreateWindow
            | OpKind::MapWindow
            | OpKind::ChangeProperty
            | OpKind::OpenFont
            | OpKind::CloseFont
            | OpKind::QueryFont
            | OpKind::ListFonts
            | OpKind::CreateGc
            | OpKind::GrabPointer
            | OpKind::UngrabPointer
            | OpKind::GrabKeyboard
            | OpKind::UngrabKeyboard => None,
        }
    }

    pub fn is_color_bearing(self) -> bool {
        self.paint().is_some()
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation argument. Every scalar widens to `Int` whatever its wire width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Int(i64),
    Text(String),
    List(Vec<ArgValue>),
    Record(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    pub fn text(text: impl Into<String>) -> Self {
        ArgValue::Text(text.into())
    }

    pub fn record<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ArgValue)>,
    {
        ArgValue::Record(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn ints<T, I>(values: I) -> Self
    where
        T: Into<i64>,
        I: IntoIterator<Item = T>,
    {
        ArgValue::List(values.into_iter().map(|v| ArgValue::Int(v.into())).collect())
    }

    pub fn points(points: &[Point]) -> Self {
        Self::ints(points.iter().flat_map(|p| [p.x, p.y]))
    }

    pub fn segments(segments: &[Segment]) -> Self {
        Self::ints(segments.iter().flat_map(|s| [s.x1, s.y1, s.x2, s.y2]))
    }

    pub fn rectangles(rects: &[Rectangle]) -> Self {
        ArgValue::List(
            rects
                .iter()
                .flat_map(|r| {
                    [
                        ArgValue::from(r.x),
                        ArgValue::from(r.y),
                        ArgValue::from(r.width),
                        ArgValue::from(r.height),
                    ]
                })
                .collect(),
        )
    }

    pub fn arcs(arcs: &[Arc]) -> Self {
        ArgValue::List(
            arcs.iter()
                .flat_map(|a| {
                    [
                        ArgValue::from(a.x),
                        ArgValue::from(a.y),
                        ArgValue::from(a.width),
                        ArgValue::from(a.height),
                        ArgValue::from(a.angle1),
                        ArgValue::from(a.angle2),
                    ]
                })
                .collect(),
        )
    }

    fn text_item(delta: i8, text: String) -> Self {
        Self::record([("delta", ArgValue::from(delta)), ("text", ArgValue::Text(text))])
    }

    pub fn text_items8(items: &[TextItem8]) -> Self {
        ArgValue::List(
            items
                .iter()
                .map(|item| {
                    Self::text_item(item.delta, String::from_utf8_lossy(&item.text).into_owned())
                })
                .collect(),
        )
    }

    pub fn text_items16(items: &[TextItem16]) -> Self {
        ArgValue::List(
            items
                .iter()
                .map(|item| Self::text_item(item.delta, String::from_utf16_lossy(&item.text)))
                .collect(),
        )
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ArgValue::Int(_) => "int",
            ArgValue::Text(_) => "text",
            ArgValue::List(_) => "list",
            ArgValue::Record(_) => "record",
        }
    }
}

macro_rules! impl_int_arg {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ArgValue {
                fn from(value: $ty) -> Self {
                    ArgValue::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_int_arg!(i8, u8, i16, u16, i32, u32, i64);

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Int(value as i64)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl TryFrom<Value> for ArgValue {
    type Error = TraceError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    return Ok(ArgValue::Int(v));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => {
                        Ok(ArgValue::Int(f as i64))
                    },
                    _ => Err(TraceError::InvalidArg(format!("non-integral number {}", n))),
                }
            },
            Value::String(s) => Ok(ArgValue::Text(s)),
            Value::Array(items) => items
                .into_iter()
                .map(ArgValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(ArgValue::List),
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| ArgValue::try_from(v).map(|v| (k, v)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(ArgValue::Record),
            Value::Bool(b) => Err(TraceError::InvalidArg(format!("boolean {}", b))),
            Value::Null => Err(TraceError::InvalidArg("null".to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ArgValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        ArgValue::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// One recorded drawing or resource action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OpKind,
    /// Foreground of the referenced graphics context at record time; 0 when not color-bearing.
    pub color: u32,
    pub args: Vec<ArgValue>,
}

impl Operation {
    pub fn new(kind: OpKind, color: u32, args: Vec<ArgValue>) -> Self {
        Self { kind, color, args }
    }
}
