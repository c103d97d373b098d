use bytes::{BufMut, BytesMut};

use crate::error::ProtocolError;
use crate::opcode::Opcode;
use crate::{pad, padded_len, REQUEST_HEADER_LEN};

/// Text items longer than this would collide with the font-shift marker (255).
pub const MAX_TEXT_ITEM_UNITS: usize = 254;
pub const MAX_IMAGE_TEXT_UNITS: usize = 255;
/// PolyText carries its item count in the one-byte flag field.
pub const MAX_TEXT_ITEMS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Segment {
    pub x1: i16,
    pub y1: i16,
    pub x2: i16,
    pub y2: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rectangle {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Rectangle {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Angles are in 64ths of a degree, as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Arc {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub angle1: i16,
    pub angle2: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowGeometry {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CoordMode {
    #[default]
    Origin = 0,
    Previous = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PolyShape {
    #[default]
    Complex = 0,
    Nonconvex = 1,
    Convex = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GrabMode {
    Sync = 0,
    #[default]
    Async = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ImageFormat {
    Bitmap = 0,
    XyPixmap = 1,
    #[default]
    ZPixmap = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum WindowClass {
    CopyFromParent = 0,
    #[default]
    InputOutput = 1,
    InputOnly = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PropertyMode {
    #[default]
    Replace = 0,
    Prepend = 1,
    Append = 2,
}

/// One run of a PolyText8 request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem8 {
    pub delta: i8,
    pub text: Vec<u8>,
}

impl TextItem8 {
    pub fn new(delta: i8, text: impl Into<Vec<u8>>) -> Self {
        Self {
            delta,
            text: text.into(),
        }
    }

    /// Breaks runs longer than one item can hold into consecutive items. Only the first
    /// piece keeps the delta.
    pub fn split_long(items: &[TextItem8]) -> Vec<TextItem8> {
        items
            .iter()
            .flat_map(|item| split_run(item.delta, &item.text))
            .map(|(delta, text)| TextItem8::new(delta, text.to_vec()))
            .collect()
    }
}

/// One run of a PolyText16 request; each unit goes out as a big-endian CHAR2B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem16 {
    pub delta: i8,
    pub text: Vec<u16>,
}

impl TextItem16 {
    pub fn new(delta: i8, text: &str) -> Self {
        Self {
            delta,
            text: text.encode_utf16().collect(),
        }
    }

    pub fn split_long(items: &[TextItem16]) -> Vec<TextItem16> {
        items
            .iter()
            .flat_map(|item| split_run(item.delta, &item.text))
            .map(|(delta, text)| TextItem16 {
                delta,
                text: text.to_vec(),
            })
            .collect()
    }
}

fn split_run<T>(delta: i8, text: &[T]) -> Vec<(i8, &[T])> {
    if text.is_empty() {
        return vec![(delta, text)];
    }
    text.chunks(MAX_TEXT_ITEM_UNITS)
        .enumerate()
        .map(|(i, chunk)| (if i == 0 { delta } else { 0 }, chunk))
        .collect()
}

fn check_item_count(count: usize) -> Result<u8, ProtocolError> {
    u8::try_from(count).map_err(|_| ProtocolError::TooManyTextItems {
        count,
        max: MAX_TEXT_ITEMS,
    })
}

/// Graphics-context attributes the simulator knows how to set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GcValues {
    pub foreground: Option<u32>,
    pub background: Option<u32>,
    pub line_width: Option<u32>,
    pub font: Option<u32>,
}

impl GcValues {
    pub const FOREGROUND: u32 = 1 << 2;
    pub const BACKGROUND: u32 = 1 << 3;
    pub const LINE_WIDTH: u32 = 1 << 4;
    pub const FONT: u32 = 1 << 14;

    pub fn with_foreground(foreground: u32) -> Self {
        Self {
            foreground: Some(foreground),
            ..Self::default()
        }
    }

    /// Set attributes in value-mask bit order, which is also their wire order.
    pub fn entries(&self) -> Vec<(u32, u32)> {
        [
            (Self::FOREGROUND, self.foreground),
            (Self::BACKGROUND, self.background),
            (Self::LINE_WIDTH, self.line_width),
            (Self::FONT, self.font),
        ]
        .into_iter()
        .filter_map(|(bit, value)| value.map(|v| (bit, v)))
        .collect()
    }

    pub fn mask(&self) -> u32 {
        self.entries().iter().fold(0, |mask, (bit, _)| mask | bit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowValues {
    pub background_pixel: Option<u32>,
    pub event_mask: Option<u32>,
}

impl WindowValues {
    pub const BACKGROUND_PIXEL: u32 = 1 << 1;
    pub const EVENT_MASK: u32 = 1 << 11;

    pub fn entries(&self) -> Vec<(u32, u32)> {
        [
            (Self::BACKGROUND_PIXEL, self.background_pixel),
            (Self::EVENT_MASK, self.event_mask),
        ]
        .into_iter()
        .filter_map(|(bit, value)| value.map(|v| (bit, v)))
        .collect()
    }
}

fn put_value_list(buf: &mut BytesMut, entries: &[(u32, u32)]) {
    let mask = entries.iter().fold(0, |mask, (bit, _)| mask | bit);
    buf.put_u32_le(mask);
    for (_, value) in entries {
        buf.put_u32_le(*value);
    }
}

fn put_points(buf: &mut BytesMut, points: &[Point]) {
    for point in points {
        buf.put_i16_le(point.x);
        buf.put_i16_le(point.y);
    }
}

fn put_rectangles(buf: &mut BytesMut, rects: &[Rectangle]) {
    for rect in rects {
        buf.put_i16_le(rect.x);
        buf.put_i16_le(rect.y);
        buf.put_u16_le(rect.width);
        buf.put_u16_le(rect.height);
    }
}

fn put_arcs(buf: &mut BytesMut, arcs: &[Arc]) {
    for arc in arcs {
        buf.put_i16_le(arc.x);
        buf.put_i16_le(arc.y);
        buf.put_u16_le(arc.width);
        buf.put_u16_le(arc.height);
        buf.put_i16_le(arc.angle1);
        buf.put_i16_le(arc.angle2);
    }
}

/// Writes `len, delta, text` followed by the padding for this item alone.
fn put_text_item(buf: &mut BytesMut, units: usize, delta: i8, encoded: &[u8]) {
    buf.put_u8(units as u8);
    buf.put_i8(delta);
    buf.put_slice(encoded);
    buf.put_bytes(0, pad(encoded.len() + 2));
}

fn char2b_bytes(units: &[u16]) -> Vec<u8> {
    units.iter().flat_map(|unit| unit.to_be_bytes()).collect()
}

/// An encoded request body, ready to be framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub opcode: Opcode,
    pub flag: u8,
    pub payload: BytesMut,
}

impl Request {
    fn new(opcode: Opcode, flag: u8, capacity: usize) -> Self {
        Self {
            opcode,
            flag,
            payload: BytesMut::with_capacity(capacity),
        }
    }

    fn drawable_gc(opcode: Opcode, flag: u8, drawable: u32, gc: u32, extra: usize) -> Self {
        let mut request = Self::new(opcode, flag, 8 + extra);
        request.payload.put_u32_le(drawable);
        request.payload.put_u32_le(gc);
        request
    }

    pub fn create_window(
        depth: u8,
        wid: u32,
        parent: u32,
        geometry: &WindowGeometry,
        class: WindowClass,
        visual: u32,
        values: &WindowValues,
    ) -> Self {
        let entries = values.entries();
        let mut request = Self::new(Opcode::CreateWindow, depth, 28 + entries.len() * 4);
        let buf = &mut request.payload;
        buf.put_u32_le(wid);
        buf.put_u32_le(parent);
        buf.put_i16_le(geometry.x);
        buf.put_i16_le(geometry.y);
        buf.put_u16_le(geometry.width);
        buf.put_u16_le(geometry.height);
        buf.put_u16_le(geometry.border_width);
        buf.put_u16_le(class as u16);
        buf.put_u32_le(visual);
        put_value_list(buf, &entries);
        request
    }

    pub fn map_window(window: u32) -> Self {
        let mut request = Self::new(Opcode::MapWindow, 0, 4);
        request.payload.put_u32_le(window);
        request
    }

    /// `format` is 8, 16 or 32; the length field counts `format`-sized units.
    pub fn change_property(
        mode: PropertyMode,
        window: u32,
        property: u32,
        type_atom: u32,
        format: u8,
        data: &[u8],
    ) -> Self {
        let unit = (format as usize / 8).max(1);
        let mut request = Self::new(Opcode::ChangeProperty, mode as u8, 20 + data.len());
        let buf = &mut request.payload;
        buf.put_u32_le(window);
        buf.put_u32_le(property);
        buf.put_u32_le(type_atom);
        buf.put_u8(format);
        buf.put_bytes(0, 3);
        buf.put_u32_le((data.len() / unit) as u32);
        buf.put_slice(data);
        request
    }

    pub fn open_font(fid: u32, name: &[u8]) -> Self {
        let mut request = Self::new(Opcode::OpenFont, 0, 8 + name.len());
        let buf = &mut request.payload;
        buf.put_u32_le(fid);
        buf.put_u16_le(name.len() as u16);
        buf.put_bytes(0, 2);
        buf.put_slice(name);
        request
    }

    pub fn close_font(fid: u32) -> Self {
        let mut request = Self::new(Opcode::CloseFont, 0, 4);
        request.payload.put_u32_le(fid);
        request
    }

    pub fn query_font(fid: u32) -> Self {
        let mut request = Self::new(Opcode::QueryFont, 0, 4);
        request.payload.put_u32_le(fid);
        request
    }

    pub fn list_fonts(max_names: u16, pattern: &[u8]) -> Self {
        let mut request = Self::new(Opcode::ListFonts, 0, 4 + pattern.len());
        let buf = &mut request.payload;
        buf.put_u16_le(max_names);
        buf.put_u16_le(pattern.len() as u16);
        buf.put_slice(pattern);
        request
    }

    pub fn create_gc(gc: u32, drawable: u32, values: &GcValues) -> Self {
        let entries = values.entries();
        let mut request = Self::new(Opcode::CreateGc, 0, 12 + entries.len() * 4);
        request.payload.put_u32_le(gc);
        request.payload.put_u32_le(drawable);
        put_value_list(&mut request.payload, &entries);
        request
    }

    pub fn poly_point(mode: CoordMode, drawable: u32, gc: u32, points: &[Point]) -> Self {
        let mut request =
            Self::drawable_gc(Opcode::PolyPoint, mode as u8, drawable, gc, points.len() * 4);
        put_points(&mut request.payload, points);
        request
    }

    pub fn poly_line(mode: CoordMode, drawable: u32, gc: u32, points: &[Point]) -> Self {
        let mut request =
            Self::drawable_gc(Opcode::PolyLine, mode as u8, drawable, gc, points.len() * 4);
        put_points(&mut request.payload, points);
        request
    }

    pub fn poly_segment(drawable: u32, gc: u32, segments: &[Segment]) -> Self {
        let mut request =
            Self::drawable_gc(Opcode::PolySegment, 0, drawable, gc, segments.len() * 8);
        for segment in segments {
            request.payload.put_i16_le(segment.x1);
            request.payload.put_i16_le(segment.y1);
            request.payload.put_i16_le(segment.x2);
            request.payload.put_i16_le(segment.y2);
        }
        request
    }

    pub fn poly_rectangle(drawable: u32, gc: u32, rects: &[Rectangle]) -> Self {
        let mut request =
            Self::drawable_gc(Opcode::PolyRectangle, 0, drawable, gc, rects.len() * 8);
        put_rectangles(&mut request.payload, rects);
        request
    }

    pub fn poly_arc(drawable: u32, gc: u32, arcs: &[Arc]) -> Self {
        let mut request = Self::drawable_gc(Opcode::PolyArc, 0, drawable, gc, arcs.len() * 12);
        put_arcs(&mut request.payload, arcs);
        request
    }

    pub fn fill_poly(
        drawable: u32,
        gc: u32,
        shape: PolyShape,
        mode: CoordMode,
        points: &[Point],
    ) -> Self {
        let mut request =
            Self::drawable_gc(Opcode::FillPoly, 0, drawable, gc, 4 + points.len() * 4);
        request.payload.put_u8(shape as u8);
        request.payload.put_u8(mode as u8);
        request.payload.put_bytes(0, 2);
        put_points(&mut request.payload, points);
        request
    }

    pub fn poly_fill_rectangle(drawable: u32, gc: u32, rects: &[Rectangle]) -> Self {
        let mut request =
            Self::drawable_gc(Opcode::PolyFillRectangle, 0, drawable, gc, rects.len() * 8);
        put_rectangles(&mut request.payload, rects);
        request
    }

    pub fn poly_fill_arc(drawable: u32, gc: u32, arcs: &[Arc]) -> Self {
        let mut request =
            Self::drawable_gc(Opcode::PolyFillArc, 0, drawable, gc, arcs.len() * 12);
        put_arcs(&mut request.payload, arcs);
        request
    }

    #[allow(clippy::too_many_arguments)]
    pub fn put_image(
        format: ImageFormat,
        drawable: u32,
        gc: u32,
        width: u16,
        height: u16,
        dst: Point,
        left_pad: u8,
        depth: u8,
        data: &[u8],
    ) -> Self {
        let mut request =
            Self::drawable_gc(Opcode::PutImage, format as u8, drawable, gc, 12 + data.len());
        let buf = &mut request.payload;
        buf.put_u16_le(width);
        buf.put_u16_le(height);
        buf.put_i16_le(dst.x);
        buf.put_i16_le(dst.y);
        buf.put_u8(left_pad);
        buf.put_u8(depth);
        buf.put_bytes(0, 2);
        buf.put_slice(data);
        request
    }

    /// The flag byte carries the item count. Long runs are split into several items.
    pub fn poly_text8(
        drawable: u32,
        gc: u32,
        origin: Point,
        items: &[TextItem8],
    ) -> Result<Self, ProtocolError> {
        let items = TextItem8::split_long(items);
        let count = check_item_count(items.len())?;
        let body: usize = items.iter().map(|i| padded_len(i.text.len() + 2)).sum();
        let mut request = Self::drawable_gc(Opcode::PolyText8, count, drawable, gc, 4 + body);
        request.payload.put_i16_le(origin.x);
        request.payload.put_i16_le(origin.y);
        for item in &items {
            put_text_item(&mut request.payload, item.text.len(), item.delta, &item.text);
        }
        Ok(request)
    }

    pub fn poly_text16(
        drawable: u32,
        gc: u32,
        origin: Point,
        items: &[TextItem16],
    ) -> Result<Self, ProtocolError> {
        let items = TextItem16::split_long(items);
        let count = check_item_count(items.len())?;
        let body: usize = items.iter().map(|i| padded_len(i.text.len() * 2 + 2)).sum();
        let mut request = Self::drawable_gc(Opcode::PolyText16, count, drawable, gc, 4 + body);
        request.payload.put_i16_le(origin.x);
        request.payload.put_i16_le(origin.y);
        for item in &items {
            let encoded = char2b_bytes(&item.text);
            put_text_item(&mut request.payload, item.text.len(), item.delta, &encoded);
        }
        Ok(request)
    }

    /// The flag byte carries the string length; text past 255 bytes is dropped.
    pub fn image_text8(drawable: u32, gc: u32, origin: Point, text: &[u8]) -> Self {
        let text = &text[..text.len().min(MAX_IMAGE_TEXT_UNITS)];
        let mut request =
            Self::drawable_gc(Opcode::ImageText8, text.len() as u8, drawable, gc, 4 + text.len());
        request.payload.put_i16_le(origin.x);
        request.payload.put_i16_le(origin.y);
        request.payload.put_slice(text);
        request
    }

    pub fn image_text16(drawable: u32, gc: u32, origin: Point, text: &[u16]) -> Self {
        let text = &text[..text.len().min(MAX_IMAGE_TEXT_UNITS)];
        let mut request = Self::drawable_gc(
            Opcode::ImageText16,
            text.len() as u8,
            drawable,
            gc,
            4 + text.len() * 2,
        );
        request.payload.put_i16_le(origin.x);
        request.payload.put_i16_le(origin.y);
        request.payload.put_slice(&char2b_bytes(text));
        request
    }

    #[allow(clippy::too_many_arguments)]
    pub fn grab_pointer(
        owner_events: bool,
        window: u32,
        event_mask: u16,
        pointer_mode: GrabMode,
        keyboard_mode: GrabMode,
        confine_to: u32,
        cursor: u32,
        time: u32,
    ) -> Self {
        let mut request = Self::new(Opcode::GrabPointer, owner_events as u8, 20);
        let buf = &mut request.payload;
        buf.put_u32_le(window);
        buf.put_u16_le(event_mask);
        buf.put_u8(pointer_mode as u8);
        buf.put_u8(keyboard_mode as u8);
        buf.put_u32_le(confine_to);
        buf.put_u32_le(cursor);
        buf.put_u32_le(time);
        request
    }

    pub fn ungrab_pointer(time: u32) -> Self {
        let mut request = Self::new(Opcode::UngrabPointer, 0, 4);
        request.payload.put_u32_le(time);
        request
    }

    pub fn grab_keyboard(
        owner_events: bool,
        window: u32,
        time: u32,
        pointer_mode: GrabMode,
        keyboard_mode: GrabMode,
    ) -> Self {
        let mut request = Self::new(Opcode::GrabKeyboard, owner_events as u8, 12);
        let buf = &mut request.payload;
        buf.put_u32_le(window);
        buf.put_u32_le(time);
        buf.put_u8(pointer_mode as u8);
        buf.put_u8(keyboard_mode as u8);
        buf.put_bytes(0, 2);
        request
    }

    pub fn ungrab_keyboard(time: u32) -> Self {
        let mut request = Self::new(Opcode::UngrabKeyboard, 0, 4);
        request.payload.put_u32_le(time);
        request
    }

    /// Header plus zero-padded payload, exactly as it goes on the wire.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        encode_request(self.opcode.code(), self.flag, &self.payload)
    }
}

/// Total request length in 4-byte units, header included.
pub fn request_length_units(payload_len: usize) -> usize {
    (REQUEST_HEADER_LEN + padded_len(payload_len)) / 4
}

pub fn encode_request_header(
    opcode: u8,
    flag: u8,
    payload_len: usize,
) -> Result<[u8; REQUEST_HEADER_LEN], ProtocolError> {
    let units = request_length_units(payload_len);
    let length = u16::try_from(units).map_err(|_| ProtocolError::RequestTooLarge { units })?;
    let [lo, hi] = length.to_le_bytes();
    Ok([opcode, flag, lo, hi])
}

pub fn encode_request(opcode: u8, flag: u8, payload: &[u8]) -> Result<BytesMut, ProtocolError> {
    let header = encode_request_header(opcode, flag, payload.len())?;
    let mut buf = BytesMut::with_capacity(REQUEST_HEADER_LEN + padded_len(payload.len()));
    buf.put_slice(&header);
    buf.put_slice(payload);
    buf.put_bytes(0, pad(payload.len()));
    Ok(buf)
}
