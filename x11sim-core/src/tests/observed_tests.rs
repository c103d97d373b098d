use crate::observed::{parse_observed_trace, ObservedOperation, TraceError};
use crate::operation::{ArgValue, OpKind, Operation};

#[test]
fn test_parse_full_record() {
    let json = r##"[
        {"type": "fillPoly", "args": [1, 2, [10, 20, 30, 40]], "fillStyle": "#ff0000"},
        {"type": "polyLine", "args": [], "strokeStyle": "rgb(0, 0, 255)"}
    ]"##;
    let ops = parse_observed_trace(json).unwrap();

    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].kind, OpKind::FillPoly);
    assert_eq!(ops[0].args[2], ArgValue::ints([10, 20, 30, 40]));
    assert_eq!(ops[0].fill_style.as_deref(), Some("#ff0000"));
    assert_eq!(ops[1].stroke_style.as_deref(), Some("rgb(0, 0, 255)"));
}

#[test]
fn test_args_default_to_empty() {
    let ops = parse_observed_trace(r#"[{"type": "mapWindow"}]"#).unwrap();
    assert!(ops[0].args.is_empty());
    assert_eq!(ops[0].fill_style, None);
}

#[test]
fn test_integral_float_is_accepted() {
    let ops = parse_observed_trace(r#"[{"type": "polyPoint", "args": [3.0, -2]}]"#).unwrap();
    assert_eq!(ops[0].args, vec![ArgValue::Int(3), ArgValue::Int(-2)]);
}

#[test]
fn test_text_run_records() {
    let json = r#"[{"type": "polyText8", "args": [[{"delta": 2, "text": "hi"}]]}]"#;
    let ops = parse_observed_trace(json).unwrap();

    let expected = ArgValue::List(vec![ArgValue::record([
        ("delta", ArgValue::Int(2)),
        ("text", ArgValue::text("hi")),
    ])]);
    assert_eq!(ops[0].args[0], expected);
}

fn record_error(json: &str) -> (usize, TraceError) {
    match parse_observed_trace(json) {
        Err(TraceError::Record { index, source }) => (index, *source),
        other => panic!("expected a record error, got {:?}", other),
    }
}

#[test]
fn test_unknown_type_is_rejected() {
    let (index, err) = record_error(r#"[{"type": "mapWindow"}, {"type": "drawBanana"}]"#);
    assert_eq!(index, 1);
    assert!(matches!(err, TraceError::UnknownKind(ref name) if name == "drawBanana"));
}

#[test]
fn test_non_integral_number_is_rejected() {
    let (index, err) = record_error(r#"[{"type": "polyPoint", "args": [1.5]}]"#);
    assert_eq!(index, 0);
    assert!(matches!(err, TraceError::InvalidArg(_)));
}

#[test]
fn test_boolean_and_null_are_rejected() {
    let (_, err) = record_error(r#"[{"type": "polyPoint", "args": [true]}]"#);
    assert!(matches!(err, TraceError::InvalidArg(_)));

    let (_, err) = record_error(r#"[{"type": "polyPoint", "args": [[1, null]]}]"#);
    assert!(matches!(err, TraceError::InvalidArg(_)));
}

#[test]
fn test_missing_type_is_rejected() {
    let (_, err) = record_error(r#"[{"args": []}]"#);
    assert!(matches!(err, TraceError::InvalidArg(_)));
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        parse_observed_trace("[{"),
        Err(TraceError::Json(_))
    ));
    assert!(matches!(
        parse_observed_trace(r#"{"type": "mapWindow"}"#),
        Err(TraceError::Json(_))
    ));
}

#[test]
fn test_style_prefers_paint_kind() {
    let fill = ObservedOperation::new(OpKind::FillPoly, vec![])
        .with_fill("#111111")
        .with_stroke("#222222");
    assert_eq!(fill.style(), Some("#111111"));

    let stroke = ObservedOperation::new(OpKind::PolyLine, vec![])
        .with_fill("#111111")
        .with_stroke("#222222");
    assert_eq!(stroke.style(), Some("#222222"));
}

#[test]
fn test_style_falls_back_to_other_field() {
    let stroke = ObservedOperation::new(OpKind::PolyArc, vec![]).with_fill("#333333");
    assert_eq!(stroke.style(), Some("#333333"));

    let fill = ObservedOperation::new(OpKind::PutImage, vec![])
        .with_fill("")
        .with_stroke("#444444");
    assert_eq!(fill.style(), Some("#444444"));

    assert_eq!(ObservedOperation::new(OpKind::FillPoly, vec![]).style(), None);
}

#[test]
fn test_serde_derive_matches_parser() {
    let json = r##"{"type": "imageText8", "args": [1, "abc"], "fillStyle": "#abc"}"##;
    let derived: ObservedOperation = serde_json::from_str(json).unwrap();
    let parsed = parse_observed_trace(&format!("[{}]", json)).unwrap();

    assert_eq!(parsed, vec![derived]);
}

#[test]
fn test_from_operation_uses_painted_style() {
    let line = Operation::new(OpKind::PolyLine, 0x00ff00, vec![ArgValue::from(1u32)]);
    let observed = ObservedOperation::from(&line);
    assert_eq!(observed.stroke_style.as_deref(), Some("#00ff00"));
    assert_eq!(observed.fill_style, None);
    assert_eq!(observed.args, line.args);

    let fill = Operation::new(OpKind::PutImage, 0, vec![]);
    assert_eq!(ObservedOperation::from(&fill).style(), Some("#000000"));

    let map = Operation::new(OpKind::MapWindow, 0, vec![]);
    assert_eq!(ObservedOperation::from(&map).style(), None);
}
