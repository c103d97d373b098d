//! Scenario plumbing around a session: a canned scene, and the trace files the oracle
//! reads and writes.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::AsyncWrite;
use x11sim_core::{parse_observed_trace, ObservedOperation, Operation};
use x11sim_protocol::{
    Arc, CoordMode, GcValues, Point, PolyShape, Rectangle, Segment, TextItem16, TextItem8,
    WindowGeometry, WindowValues,
};

use crate::error::SessionError;
use crate::session::SimSession;

pub const SCENE_WINDOW: u32 = 0x0020_0001;
pub const SCENE_FONT: u32 = 0x0020_0002;
pub const SCENE_RED_GC: u32 = 0x0020_0003;
pub const SCENE_BLUE_GC: u32 = 0x0020_0004;

const WM_NAME: u32 = 39;
const STRING: u32 = 31;
const EXPOSURE_MASK: u32 = 1 << 15;

/// Draws a small scene touching every request family, including both round trips.
pub async fn draw_scene<W>(session: &mut SimSession<W>) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    let root = session.config().root_window;
    let geometry = WindowGeometry {
        x: 0,
        y: 0,
        width: 320,
        height: 240,
        border_width: 0,
    };
    let values = WindowValues {
        background_pixel: Some(0xffffff),
        event_mask: Some(EXPOSURE_MASK),
    };

    session
        .create_window(SCENE_WINDOW, root, geometry, &values)
        .await?;
    session
        .change_property(SCENE_WINDOW, WM_NAME, STRING, "x11sim scene")
        .await?;
    session.map_window(SCENE_WINDOW).await?;

    session.list_fonts(8, "*").await?;
    session.open_font(SCENE_FONT, "fixed").await?;
    session.query_font(SCENE_FONT).await?;

    let red = GcValues {
        font: Some(SCENE_FONT),
        ..GcValues::with_foreground(0xff0000)
    };
    session.create_gc(SCENE_RED_GC, SCENE_WINDOW, &red).await?;
    let blue = GcValues {
        line_width: Some(2),
        ..GcValues::with_foreground(0x0000ff)
    };
    session.create_gc(SCENE_BLUE_GC, SCENE_WINDOW, &blue).await?;

    let w = SCENE_WINDOW;
    session
        .poly_fill_rectangle(w, SCENE_RED_GC, &[Rectangle::new(10, 10, 60, 40)])
        .await?;
    session
        .fill_rectangle(w, SCENE_BLUE_GC, Rectangle::new(80, 10, 60, 40))
        .await?;
    session
        .poly_line(
            w,
            SCENE_BLUE_GC,
            CoordMode::Origin,
            &[Point::new(10, 70), Point::new(150, 70), Point::new(150, 120)],
        )
        .await?;
    session
        .poly_segment(
            w,
            SCENE_BLUE_GC,
            &[Segment {
                x1: 10,
                y1: 130,
                x2: 150,
                y2: 130,
            }],
        )
        .await?;
    session
        .poly_point(
            w,
            SCENE_RED_GC,
            CoordMode::Origin,
            &[Point::new(5, 5), Point::new(6, 6)],
        )
        .await?;
    session
        .poly_rectangle(w, SCENE_BLUE_GC, &[Rectangle::new(160, 10, 40, 40)])
        .await?;

    let arc = Arc {
        x: 210,
        y: 10,
        width: 40,
        height: 40,
        angle1: 0,
        angle2: 360 * 64,
    };
    session.poly_arc(w, SCENE_BLUE_GC, &[arc]).await?;
    session
        .poly_fill_arc(w, SCENE_RED_GC, &[Arc { y: 60, ..arc }])
        .await?;
    session
        .fill_poly(
            w,
            SCENE_RED_GC,
            PolyShape::Convex,
            CoordMode::Origin,
            &[Point::new(160, 60), Point::new(200, 60), Point::new(180, 100)],
        )
        .await?;

    let pixels = vec![0x80u8; 4 * 4 * 4];
    session
        .put_image(w, SCENE_RED_GC, 4, 4, Point::new(260, 100), &pixels)
        .await?;

    session
        .poly_text8(
            w,
            SCENE_RED_GC,
            Point::new(10, 160),
            &[TextItem8::new(0, "hello"), TextItem8::new(4, "world")],
        )
        .await?;
    session
        .poly_text16(
            w,
            SCENE_BLUE_GC,
            Point::new(10, 180),
            &[TextItem16::new(0, "wide")],
        )
        .await?;
    session
        .image_text8(w, SCENE_RED_GC, Point::new(10, 200), "image")
        .await?;
    session
        .image_text16(w, SCENE_BLUE_GC, Point::new(10, 220), "text16")
        .await?;

    session.grab_pointer(w, false, 0x0004).await?;
    session.ungrab_pointer(0).await?;
    session.grab_keyboard(w, true).await?;
    session.ungrab_keyboard(0).await?;
    session.close_font(SCENE_FONT).await?;

    log::info!("scene drawn: {} operations", session.operations().len());
    Ok(())
}

pub fn load_trace_file(path: impl AsRef<Path>) -> Result<Vec<ObservedOperation>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trace file {}", path.display()))?;
    parse_observed_trace(&json).with_context(|| format!("invalid trace in {}", path.display()))
}

/// A reference record in the observed-trace shape, keeping the numeric color alongside.
#[derive(Serialize)]
struct ExportedOperation {
    #[serde(flatten)]
    observed: ObservedOperation,
    color: u32,
}

pub fn reference_json(operations: &[Operation]) -> Result<String> {
    let exported: Vec<ExportedOperation> = operations
        .iter()
        .map(|op| ExportedOperation {
            observed: op.into(),
            color: op.color,
        })
        .collect();
    serde_json::to_string_pretty(&exported).context("failed to serialize reference trace")
}

/// Writes the reference log in the same JSON shape the observed trace uses, so it can be
/// replayed as an observed trace.
pub fn export_reference(operations: &[Operation], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = reference_json(operations)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write reference trace {}", path.display()))?;
    log::info!("wrote {} operations to {}", operations.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use x11sim_core::{ArgValue, OpKind};

    #[test]
    fn test_load_trace_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"[{{"type": "mapWindow", "args": [1]}}, {{"type": "fillPoly", "fillStyle": "#fff"}}]"##
        )
        .unwrap();

        let ops = load_trace_file(file.path()).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].kind, OpKind::FillPoly);
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_trace_file(dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read trace file"));
    }

    #[test]
    fn test_load_invalid_trace_has_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"type": "teleport"}}]"#).unwrap();

        let err = load_trace_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid trace"));
        assert!(format!("{:#}", err).contains("teleport"));
    }

    #[test]
    fn test_exported_reference_loads_as_passing_trace() {
        let operations = vec![
            Operation::new(OpKind::MapWindow, 0, vec![ArgValue::from(7u32)]),
            Operation::new(OpKind::FillRectangle, 0xff0000, vec![ArgValue::from(1u32)]),
            Operation::new(OpKind::PolyLine, 0x0000ff, vec![ArgValue::ints([1, 2, 3, 4])]),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.json");

        export_reference(&operations, &path).unwrap();
        let loaded = load_trace_file(&path).unwrap();

        assert_eq!(loaded[0].style(), None);
        assert_eq!(loaded[1].fill_style.as_deref(), Some("#ff0000"));
        assert_eq!(loaded[2].stroke_style.as_deref(), Some("#0000ff"));
        let report = x11sim_core::compare(&operations, &loaded);
        assert!(report.passed(), "{}", report);
    }

    #[test]
    fn test_reference_json_keeps_color() {
        let operations = vec![Operation::new(OpKind::FillPoly, 0x00ff00, vec![])];
        let json: serde_json::Value =
            serde_json::from_str(&reference_json(&operations).unwrap()).unwrap();

        assert_eq!(json[0]["type"], "fillPoly");
        assert_eq!(json[0]["color"], 0x00ff00);
        assert_eq!(json[0]["fillStyle"], "#00ff00");
    }
}
