use crate::color::{format_hex, parse_css_color};

#[test]
fn test_parse_long_hex() {
    assert_eq!(parse_css_color("#ff0000"), Some(0xff0000));
    assert_eq!(parse_css_color("#FF0000"), Some(0xff0000));
    assert_eq!(parse_css_color("#00a1B2"), Some(0x00a1b2));
}

#[test]
fn test_parse_short_hex_expands_each_digit() {
    assert_eq!(parse_css_color("#f00"), Some(0xff0000));
    assert_eq!(parse_css_color("#1a3"), Some(0x11aa33));
}

#[test]
fn test_parse_rgb_and_rgba() {
    assert_eq!(parse_css_color("rgb(255, 0, 0)"), Some(0xff0000));
    assert_eq!(parse_css_color("RGB(1,2,3)"), Some(0x010203));
    // Alpha is ignored.
    assert_eq!(parse_css_color("rgba(0, 128, 255, 0.5)"), Some(0x0080ff));
}

#[test]
fn test_parse_tolerates_whitespace() {
    assert_eq!(parse_css_color("  #00ff00 "), Some(0x00ff00));
}

#[test]
fn test_parse_rejects_garbage() {
    assert_eq!(parse_css_color("red"), None);
    assert_eq!(parse_css_color("#ff00"), None);
    assert_eq!(parse_css_color("#gg0000"), None);
    assert_eq!(parse_css_color("rgb(256, 0, 0)"), None);
    assert_eq!(parse_css_color("rgb(1, 2)"), None);
    assert_eq!(parse_css_color(""), None);
}

#[test]
fn test_format_hex() {
    assert_eq!(format_hex(0xff0000), "#ff0000");
    assert_eq!(format_hex(0x1), "#000001");
    assert_eq!(format_hex(0xab123456), "#123456");
}
