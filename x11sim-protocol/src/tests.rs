use proptest::prelude::*;

use crate::*;

fn u16_at(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn sample_char_info(ascent: i16, descent: i16) -> CharInfo {
    CharInfo {
        left_side_bearing: 0,
        right_side_bearing: 7,
        character_width: 8,
        ascent,
        descent,
        attributes: 0,
    }
}

fn sample_font(min_char: u16, max_char: u16, char_info_count: u32) -> FontQueryResult {
    FontQueryResult {
        sequence: 7,
        min_bounds: sample_char_info(10, 2),
        max_bounds: sample_char_info(12, 3),
        min_char,
        max_char,
        default_char: 32,
        property_count: 1,
        draw_direction: 0,
        min_byte1: 0,
        max_byte1: 0,
        all_chars_exist: true,
        font_ascent: 12,
        font_descent: 3,
        char_info_count,
        properties: vec![FontProp { name: 18, value: 99 }],
        char_infos: (0..char_info_count).map(|_| sample_char_info(11, 2)).collect(),
    }
}

// =============================================================================
// PADDING AND FRAMING
// =============================================================================

#[test]
fn test_pad_values() {
    assert_eq!(pad(0), 0);
    assert_eq!(pad(1), 3);
    assert_eq!(pad(2), 2);
    assert_eq!(pad(3), 1);
    assert_eq!(pad(4), 0);
    assert_eq!(padded_len(9), 12);
}

#[test]
fn test_request_header_layout() {
    let encoded = encode_request(70, 3, &[1, 2, 3, 4, 5]).unwrap();

    assert_eq!(encoded[0], 70);
    assert_eq!(encoded[1], 3);
    // 4 header bytes + 5 payload bytes padded to 8 = 3 words
    assert_eq!(u16_at(&encoded, 2), 3);
    assert_eq!(&encoded[4..], &[1, 2, 3, 4, 5, 0, 0, 0]);
}

#[test]
fn test_empty_payload_is_header_only() {
    let encoded = encode_request(8, 0, &[]).unwrap();
    assert_eq!(encoded.len(), 4);
    assert_eq!(u16_at(&encoded, 2), 1);
}

#[test]
fn test_oversized_request_rejected() {
    let payload = vec![0u8; 4 * 65535];
    let result = encode_request(72, 2, &payload);
    assert!(matches!(
        result,
        Err(ProtocolError::RequestTooLarge { units: 65536 })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_request_length_matches_padded_payload(
        opcode in any::<u8>(),
        flag in any::<u8>(),
        payload in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let encoded = encode_request(opcode, flag, &payload).unwrap();
        let declared = u16_at(&encoded, 2) as usize;

        prop_assert_eq!(declared, (4 + payload.len()).div_ceil(4));
        prop_assert_eq!(encoded.len(), declared * 4);
        prop_assert_eq!(encoded.len() % 4, 0);
        prop_assert_eq!(&encoded[4..4 + payload.len()], &payload[..]);
        prop_assert!(encoded[4 + payload.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn prop_text_item_padding_aligns(len in 0usize..=254, delta in any::<i8>()) {
        let item = TextItem8::new(delta, vec![b'a'; len]);
        let request = Request::poly_text8(1, 2, Point::new(0, 0), &[item]).unwrap();
        // 12 fixed bytes, then one padded item
        prop_assert_eq!(request.payload.len() - 12, padded_len(len + 2));
        prop_assert_eq!(request.payload[12], len as u8);
        prop_assert_eq!(request.payload[13] as i8, delta);
    }
}

// =============================================================================
// REQUEST ENCODERS
// =============================================================================

#[test]
fn test_create_window_layout() {
    let geometry = WindowGeometry {
        x: 10,
        y: -5,
        width: 640,
        height: 480,
        border_width: 1,
    };
    let values = WindowValues {
        background_pixel: Some(0x00ff_ffff),
        event_mask: Some(0x8000),
    };
    let request = Request::create_window(24, 0x0040_0001, 0x100, &geometry, WindowClass::InputOutput, 0, &values);

    assert_eq!(request.opcode, Opcode::CreateWindow);
    assert_eq!(request.flag, 24);
    let p = &request.payload;
    assert_eq!(u32_at(p, 0), 0x0040_0001);
    assert_eq!(u32_at(p, 4), 0x100);
    assert_eq!(u16_at(p, 8) as i16, 10);
    assert_eq!(u16_at(p, 10) as i16, -5);
    assert_eq!(u16_at(p, 12), 640);
    assert_eq!(u16_at(p, 14), 480);
    assert_eq!(u16_at(p, 16), 1);
    assert_eq!(u16_at(p, 18), 1);
    assert_eq!(u32_at(p, 24), WindowValues::BACKGROUND_PIXEL | WindowValues::EVENT_MASK);
    assert_eq!(u32_at(p, 28), 0x00ff_ffff);
    assert_eq!(u32_at(p, 32), 0x8000);
    assert_eq!(p.len(), 36);
}

#[test]
fn test_create_gc_values_follow_mask_order() {
    let values = GcValues {
        foreground: Some(0xff0000),
        background: None,
        line_width: Some(3),
        font: Some(0x0040_0010),
    };
    let request = Request::create_gc(5, 6, &values);
    let p = &request.payload;

    assert_eq!(request.opcode.code(), 55);
    assert_eq!(u32_at(p, 8), GcValues::FOREGROUND | GcValues::LINE_WIDTH | GcValues::FONT);
    assert_eq!(u32_at(p, 12), 0xff0000);
    assert_eq!(u32_at(p, 16), 3);
    assert_eq!(u32_at(p, 20), 0x0040_0010);
    assert_eq!(values.mask(), u32_at(p, 8));
}

#[test]
fn test_poly_line_carries_coordinate_mode() {
    let points = [Point::new(1, 2), Point::new(-3, 4)];
    let request = Request::poly_line(CoordMode::Previous, 9, 10, &points);

    assert_eq!(request.flag, 1);
    assert_eq!(request.payload.len(), 8 + 8);
    assert_eq!(u16_at(&request.payload, 12) as i16, -3);
}

#[test]
fn test_fill_poly_header_fields() {
    let points = [Point::new(0, 0), Point::new(10, 0), Point::new(5, 8)];
    let request = Request::fill_poly(1, 2, PolyShape::Convex, CoordMode::Origin, &points);

    assert_eq!(request.opcode.code(), 69);
    assert_eq!(request.payload[8], PolyShape::Convex as u8);
    assert_eq!(request.payload[9], 0);
    assert_eq!(request.payload.len(), 12 + 12);
}

#[test]
fn test_fill_rectangle_reuses_opcode_70() {
    let rects = [Rectangle::new(1, 2, 30, 40)];
    let request = Request::poly_fill_rectangle(1, 2, &rects);
    let encoded = request.encode().unwrap();

    assert_eq!(encoded[0], 70);
    assert_eq!(u16_at(&encoded, 2), 5);
}

#[test]
fn test_poly_arc_tuple_size() {
    let arcs = [Arc {
        x: 0,
        y: 0,
        width: 20,
        height: 20,
        angle1: 0,
        angle2: 360 * 64,
    }];
    let request = Request::poly_fill_arc(1, 2, &arcs);
    assert_eq!(request.opcode, Opcode::PolyFillArc);
    assert_eq!(request.payload.len(), 8 + 12);
    assert_eq!(u16_at(&request.payload, 18) as i16, 360 * 64);
}

#[test]
fn test_poly_text8_ten_byte_item_needs_no_padding() {
    let item = TextItem8::new(0, b"0123456789".to_vec());
    let request = Request::poly_text8(1, 2, Point::new(5, 6), &[item]).unwrap();

    assert_eq!(request.flag, 1);
    assert_eq!(request.payload.len(), 12 + 12);
    assert_eq!(request.payload[12], 10);
    assert_eq!(&request.payload[14..24], b"0123456789");
}

#[test]
fn test_poly_text8_seven_byte_item_padding() {
    let item = TextItem8::new(-2, b"seven!!".to_vec());
    let request = Request::poly_text8(1, 2, Point::new(0, 0), &[item]).unwrap();

    // len + delta + 7 bytes = 9, padded to 12
    assert_eq!(request.payload.len(), 12 + 12);
    assert_eq!(request.payload[13] as i8, -2);
    assert_eq!(&request.payload[21..24], &[0, 0, 0]);
}

#[test]
fn test_poly_text8_pads_each_item() {
    let items = [TextItem8::new(0, b"ab".to_vec()), TextItem8::new(3, b"xyz".to_vec())];
    let request = Request::poly_text8(1, 2, Point::new(0, 0), &items).unwrap();

    assert_eq!(request.flag, 2);
    // item 1: 2 + 2 = 4 bytes, item 2: 2 + 3 = 5 -> 8
    assert_eq!(request.payload.len(), 12 + 4 + 8);
    assert_eq!(request.payload[16], 3);
    assert_eq!(request.payload[17], 3);
}

#[test]
fn test_poly_text8_splits_long_runs() {
    let item = TextItem8::new(5, vec![b'a'; 300]);
    let request = Request::poly_text8(1, 2, Point::new(0, 0), &[item]).unwrap();

    assert_eq!(request.flag, 2);
    // 254 + 2 = 256 bytes, then 46 + 2 = 48
    assert_eq!(request.payload.len(), 12 + 256 + 48);
    assert_eq!(request.payload[12], 254);
    assert_eq!(request.payload[13] as i8, 5);
    assert_eq!(request.payload[12 + 256], 46);
    assert_eq!(request.payload[12 + 257], 0);
}

#[test]
fn test_split_long_keeps_short_and_empty_items() {
    let items = [TextItem8::new(1, Vec::new()), TextItem8::new(2, b"ab".to_vec())];
    assert_eq!(TextItem8::split_long(&items), items.to_vec());

    let wide = TextItem16::new(-3, &"w".repeat(MAX_TEXT_ITEM_UNITS + 1));
    let split = TextItem16::split_long(&[wide]);
    assert_eq!(split.len(), 2);
    assert_eq!(split[0].delta, -3);
    assert_eq!(split[0].text.len(), MAX_TEXT_ITEM_UNITS);
    assert_eq!(split[1].delta, 0);
    assert_eq!(split[1].text.len(), 1);
}

#[test]
fn test_poly_text_rejects_too_many_items() {
    let items = vec![TextItem8::new(0, b"x".to_vec()); MAX_TEXT_ITEMS + 1];
    let err = Request::poly_text8(1, 2, Point::new(0, 0), &items).unwrap_err();
    assert_eq!(
        err,
        ProtocolError::TooManyTextItems {
            count: MAX_TEXT_ITEMS + 1,
            max: MAX_TEXT_ITEMS,
        }
    );

    let items = vec![TextItem8::new(0, b"x".to_vec()); MAX_TEXT_ITEMS];
    let request = Request::poly_text8(1, 2, Point::new(0, 0), &items).unwrap();
    assert_eq!(request.flag, 255);
}

#[test]
fn test_poly_text16_uses_big_endian_units() {
    let item = TextItem16::new(1, "Hi");
    let request = Request::poly_text16(1, 2, Point::new(0, 0), &[item]).unwrap();

    assert_eq!(request.opcode.code(), 75);
    assert_eq!(request.payload[12], 2);
    assert_eq!(&request.payload[14..18], &[0, b'H', 0, b'i']);
    // 2 + 4 = 6 bytes, padded to 8
    assert_eq!(request.payload.len(), 12 + 8);
}

#[test]
fn test_image_text8_flag_is_length() {
    let request = Request::image_text8(1, 2, Point::new(3, 4), b"hello");
    assert_eq!(request.flag, 5);
    assert_eq!(&request.payload[12..], b"hello");
}

#[test]
fn test_image_text16_flag_counts_units() {
    let units: Vec<u16> = "héllo".encode_utf16().collect();
    let request = Request::image_text16(1, 2, Point::new(3, 4), &units);
    assert_eq!(request.flag, 5);
    assert_eq!(request.payload.len(), 12 + 10);
    assert_eq!(&request.payload[14..16], &[0x00, 0xe9]);
}

#[test]
fn test_open_font_and_list_fonts_lengths() {
    let open = Request::open_font(0x10, b"fixed");
    assert_eq!(u16_at(&open.payload, 4), 5);
    assert_eq!(&open.payload[8..], b"fixed");

    let list = Request::list_fonts(100, b"*-helvetica-*");
    assert_eq!(u16_at(&list.payload, 0), 100);
    assert_eq!(u16_at(&list.payload, 2), 13);
}

#[test]
fn test_change_property_counts_format_units() {
    let request = Request::change_property(PropertyMode::Replace, 1, 39, 31, 8, b"title");
    assert_eq!(request.payload[12], 8);
    assert_eq!(u32_at(&request.payload, 16), 5);
    assert_eq!(&request.payload[20..], b"title");
}

#[test]
fn test_put_image_header() {
    let data = vec![0xaa; 16];
    let request = Request::put_image(ImageFormat::ZPixmap, 1, 2, 2, 2, Point::new(7, 8), 0, 24, &data);
    assert_eq!(request.flag, 2);
    assert_eq!(u16_at(&request.payload, 8), 2);
    assert_eq!(u16_at(&request.payload, 12), 7);
    assert_eq!(request.payload[17], 24);
    assert_eq!(request.payload.len(), 20 + 16);
}

#[test]
fn test_grab_requests_layout() {
    let grab = Request::grab_pointer(true, 5, 0x4, GrabMode::Async, GrabMode::Async, 0, 0, 0);
    assert_eq!(grab.flag, 1);
    assert_eq!(grab.payload.len(), 20);
    assert_eq!(u16_at(&grab.payload, 4), 0x4);

    let keyboard = Request::grab_keyboard(false, 5, 0, GrabMode::Sync, GrabMode::Async);
    assert_eq!(keyboard.flag, 0);
    assert_eq!(keyboard.payload.len(), 12);
    assert_eq!(keyboard.payload[8], 0);
    assert_eq!(keyboard.payload[9], 1);

    assert_eq!(Request::ungrab_pointer(0).opcode.code(), 27);
    assert_eq!(Request::ungrab_keyboard(0).opcode.code(), 32);
}

#[test]
fn test_opcode_codes_roundtrip() {
    for code in 0..=u8::MAX {
        if let Some(opcode) = Opcode::from_code(code) {
            assert_eq!(opcode.code(), code);
        }
    }
    assert!(Opcode::QueryFont.awaits_reply());
    assert!(!Opcode::GrabPointer.awaits_reply());
}

// =============================================================================
// SERVER MESSAGES
// =============================================================================

#[test]
fn test_classify_error() {
    let mut header = [0u8; MESSAGE_LEN];
    header[1] = 2;
    header[2..4].copy_from_slice(&17u16.to_le_bytes());
    header[4..8].copy_from_slice(&0xdeadu32.to_le_bytes());
    header[10] = 55;

    match classify(&header).unwrap() {
        MessageKind::Error(err) => {
            assert_eq!(err.code, 2);
            assert_eq!(err.sequence, 17);
            assert_eq!(err.bad_value, 0xdead);
            assert_eq!(err.major_opcode, 55);
        },
        other => panic!("expected error, got {:?}", other),
    }
}

#[test]
fn test_classify_reply_trailing_len() {
    let mut header = [0u8; MESSAGE_LEN];
    header[0] = 1;
    header[2..4].copy_from_slice(&3u16.to_le_bytes());
    header[4..8].copy_from_slice(&5u32.to_le_bytes());

    match classify(&header).unwrap() {
        MessageKind::Reply(reply) => {
            assert_eq!(reply.sequence, 3);
            assert_eq!(reply.trailing_len(), 20);
        },
        other => panic!("expected reply, got {:?}", other),
    }
}

#[test]
fn test_classify_event_range() {
    let mut header = [0u8; MESSAGE_LEN];
    for code in [2u8, 12, 127] {
        header[0] = code;
        assert!(matches!(
            classify(&header).unwrap(),
            MessageKind::Event(EventHeader { code: c, .. }) if c == code
        ));
    }
}

#[test]
fn test_classify_unknown_type() {
    let mut header = [0u8; MESSAGE_LEN];
    header[0] = 200;
    assert_eq!(
        classify(&header),
        Err(ProtocolError::UnknownMessageType(200))
    );
}

#[test]
fn test_reply_sequence_needs_four_bytes() {
    assert_eq!(reply_sequence(&[1, 0, 9]), None);
    assert_eq!(reply_sequence(&[1, 0, 9, 1]), Some(0x0109));
}

// =============================================================================
// SETUP
// =============================================================================

#[test]
fn test_setup_request_layout() {
    let request = encode_setup_request(11);
    assert_eq!(request.len(), 12);
    assert_eq!(request[0], b'l');
    assert_eq!(u16_at(&request, 2), 11);
    assert_eq!(u16_at(&request, 4), 0);
    assert!(request[6..].iter().all(|&b| b == 0));
}

#[test]
fn test_setup_response_header_parse() {
    let header = SetupResponseHeader::success(11, 0, 3).encode();
    let parsed = SetupResponseHeader::parse(&header);
    assert!(parsed.is_success());
    assert_eq!(parsed.additional_len(), 12);

    let failed = SetupResponseHeader::parse(&[0, 6, 11, 0, 0, 0, 2, 0]);
    assert!(!failed.is_success());
    assert_eq!(failed.reason_len, 6);
}

// =============================================================================
// FONT REPLIES
// =============================================================================

#[test]
fn test_query_font_parse() {
    let font = sample_font(32, 34, 3);
    let encoded = font.encode();

    assert_eq!(encoded.len(), 60 + 8 + 36);
    assert_eq!(u32_at(&encoded, 4) as usize * 4 + 32, encoded.len());

    let parsed = FontQueryResult::parse(&encoded).unwrap();
    assert_eq!(parsed, font);
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_query_font_count_mismatch_is_single_issue() {
    let font = sample_font(32, 36, 3);
    let parsed = FontQueryResult::parse(&font.encode()).unwrap();

    let issues = parsed.validate();
    assert_eq!(
        issues,
        vec![FontIssue::CharInfoCount {
            declared: 3,
            expected: 5
        }]
    );
}

#[test]
fn test_query_font_non_positive_metrics() {
    let mut font = sample_font(65, 66, 2);
    font.font_descent = 0;
    font.char_infos[1].ascent = -1;

    let issues = FontQueryResult::parse(&font.encode()).unwrap().validate();
    assert_eq!(issues.len(), 2);
    assert!(matches!(
        issues[0],
        FontIssue::NonPositiveMetric {
            location: MetricLocation::Font,
            ..
        }
    ));
    assert!(matches!(
        issues[1],
        FontIssue::NonPositiveMetric {
            location: MetricLocation::CharInfo(1),
            ascent: -1,
            ..
        }
    ));
}

#[test]
fn test_query_font_truncated() {
    let font = sample_font(32, 34, 3);
    let encoded = font.encode();

    let err = FontQueryResult::parse(&encoded[..encoded.len() - 4]).unwrap_err();
    assert!(matches!(err, ProtocolError::Truncated { .. }));

    let err = FontQueryResult::parse(&encoded[..40]).unwrap_err();
    assert!(matches!(err, ProtocolError::Truncated { needed: 60, got: 40, .. }));
}

#[test]
fn test_list_fonts_parse() {
    let reply = ListFontsReply::new(
        9,
        vec![
            "fixed".to_string(),
            "-misc-fixed-medium-r-normal--13-120-75-75-c-70-iso8859-1".to_string(),
        ],
    );
    let encoded = reply.encode();
    assert_eq!(encoded.len() % 4, 0);

    let parsed = ListFontsReply::parse(&encoded).unwrap();
    assert_eq!(parsed, reply);
}

#[test]
fn test_list_fonts_declared_count_larger_than_data() {
    let mut reply = ListFontsReply::new(1, vec!["fixed".to_string()]);
    reply.declared_count = 3;

    let parsed = ListFontsReply::parse(&reply.encode()).unwrap();
    assert_eq!(parsed.declared_count, 3);
    assert_eq!(parsed.names, vec!["fixed".to_string()]);
}
