//! Drawing request library. Every method logs exactly one operation, then sends.

use tokio::io::AsyncWrite;
use x11sim_core::{ArgValue, OpKind, ValidationIssue};
use x11sim_protocol::{
    Arc, CoordMode, FontQueryResult, GcValues, GrabMode, ImageFormat, ListFontsReply, Point,
    PolyShape, PropertyMode, Rectangle, Request, Segment, TextItem16, TextItem8, WindowClass,
    WindowGeometry, WindowValues, MAX_IMAGE_TEXT_UNITS,
};

use crate::error::SessionError;
use crate::session::SimSession;

const CURRENT_TIME: u32 = 0;
const NONE: u32 = 0;

fn gc_attributes(values: &GcValues) -> ArgValue {
    let attrs = [
        ("foreground", values.foreground),
        ("background", values.background),
        ("lineWidth", values.line_width),
        ("font", values.font),
    ];
    ArgValue::record(
        attrs
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, ArgValue::from(v)))),
    )
}

/// ImageText carries at most 255 bytes; cut on a char boundary so the log stays readable.
fn truncate_image_text(text: &str) -> &str {
    let mut end = text.len().min(MAX_IMAGE_TEXT_UNITS);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

impl<W> SimSession<W>
where
    W: AsyncWrite + Unpin,
{
    /// Creates an InputOutput window with the configured root depth and visual.
    pub async fn create_window(
        &mut self,
        wid: u32,
        parent: u32,
        geometry: WindowGeometry,
        values: &WindowValues,
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::CreateWindow,
            None,
            vec![
                wid.into(),
                parent.into(),
                geometry.x.into(),
                geometry.y.into(),
                geometry.width.into(),
                geometry.height.into(),
                geometry.border_width.into(),
            ],
        );
        let request = Request::create_window(
            self.config().root_depth,
            wid,
            parent,
            &geometry,
            WindowClass::InputOutput,
            self.config().root_visual,
            values,
        );
        self.send(&request).await
    }

    pub async fn map_window(&mut self, window: u32) -> Result<u16, SessionError> {
        self.record(OpKind::MapWindow, None, vec![window.into()]);
        self.send(&Request::map_window(window)).await
    }

    /// Replaces `property` with 8-bit `text`.
    pub async fn change_property(
        &mut self,
        window: u32,
        property: u32,
        type_atom: u32,
        text: &str,
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::ChangeProperty,
            None,
            vec![
                window.into(),
                property.into(),
                type_atom.into(),
                text.into(),
            ],
        );
        let request = Request::change_property(
            PropertyMode::Replace,
            window,
            property,
            type_atom,
            8,
            text.as_bytes(),
        );
        self.send(&request).await
    }

    pub async fn open_font(&mut self, fid: u32, name: &str) -> Result<u16, SessionError> {
        self.record(OpKind::OpenFont, None, vec![fid.into(), name.into()]);
        self.send(&Request::open_font(fid, name.as_bytes())).await
    }

    pub async fn close_font(&mut self, fid: u32) -> Result<u16, SessionError> {
        self.record(OpKind::CloseFont, None, vec![fid.into()]);
        self.send(&Request::close_font(fid)).await
    }

    /// Round-trips a QueryFont and checks the reply against the font invariants. Each
    /// violation becomes its own validation issue; the parsed result is returned either way.
    pub async fn query_font(&mut self, fid: u32) -> Result<FontQueryResult, SessionError> {
        self.record(OpKind::QueryFont, None, vec![fid.into()]);
        let (_, reply) = self
            .round_trip(OpKind::QueryFont, &Request::query_font(fid))
            .await?;

        let font = FontQueryResult::parse(&reply)?;
        log::debug!(
            "font {:#x}: chars {}..={}, {} char infos, ascent {} descent {}",
            fid,
            font.min_char,
            font.max_char,
            font.char_info_count,
            font.font_ascent,
            font.font_descent
        );
        for issue in font.validate() {
            self.record_issue(ValidationIssue::Font { fid, issue });
        }
        Ok(font)
    }

    pub async fn list_fonts(
        &mut self,
        max_names: u16,
        pattern: &str,
    ) -> Result<Vec<String>, SessionError> {
        self.record(
            OpKind::ListFonts,
            None,
            vec![max_names.into(), pattern.into()],
        );
        let (_, reply) = self
            .round_trip(
                OpKind::ListFonts,
                &Request::list_fonts(max_names, pattern.as_bytes()),
            )
            .await?;

        let listing = ListFontsReply::parse(&reply)?;
        if listing.names.len() != listing.declared_count as usize {
            self.record_issue(ValidationIssue::ListFontsCount {
                declared: listing.declared_count,
                received: listing.names.len(),
            });
        }
        Ok(listing.names)
    }

    /// Creates a graphics context. Its foreground (0 when unset) colors every later
    /// drawing operation that references `gc`.
    pub async fn create_gc(
        &mut self,
        gc: u32,
        drawable: u32,
        values: &GcValues,
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::CreateGc,
            None,
            vec![gc.into(), drawable.into(), gc_attributes(values)],
        );
        self.define_gc(gc, values.foreground.unwrap_or(0));
        self.send(&Request::create_gc(gc, drawable, values)).await
    }

    pub async fn poly_point(
        &mut self,
        drawable: u32,
        gc: u32,
        mode: CoordMode,
        points: &[Point],
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::PolyPoint,
            Some(gc),
            vec![drawable.into(), gc.into(), ArgValue::points(points)],
        );
        self.send(&Request::poly_point(mode, drawable, gc, points))
            .await
    }

    pub async fn poly_line(
        &mut self,
        drawable: u32,
        gc: u32,
        mode: CoordMode,
        points: &[Point],
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::PolyLine,
            Some(gc),
            vec![drawable.into(), gc.into(), ArgValue::points(points)],
        );
        self.send(&Request::poly_line(mode, drawable, gc, points))
            .await
    }

    pub async fn poly_segment(
        &mut self,
        drawable: u32,
        gc: u32,
        segments: &[Segment],
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::PolySegment,
            Some(gc),
            vec![drawable.into(), gc.into(), ArgValue::segments(segments)],
        );
        self.send(&Request::poly_segment(drawable, gc, segments))
            .await
    }

    pub async fn poly_rectangle(
        &mut self,
        drawable: u32,
        gc: u32,
        rects: &[Rectangle],
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::PolyRectangle,
            Some(gc),
            vec![drawable.into(), gc.into(), ArgValue::rectangles(rects)],
        );
        self.send(&Request::poly_rectangle(drawable, gc, rects))
            .await
    }

    pub async fn poly_arc(
        &mut self,
        drawable: u32,
        gc: u32,
        arcs: &[Arc],
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::PolyArc,
            Some(gc),
            vec![drawable.into(), gc.into(), ArgValue::arcs(arcs)],
        );
        self.send(&Request::poly_arc(drawable, gc, arcs)).await
    }

    pub async fn fill_poly(
        &mut self,
        drawable: u32,
        gc: u32,
        shape: PolyShape,
        mode: CoordMode,
        points: &[Point],
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::FillPoly,
            Some(gc),
            vec![
                drawable.into(),
                gc.into(),
                (shape as u8).into(),
                ArgValue::points(points),
            ],
        );
        self.send(&Request::fill_poly(drawable, gc, shape, mode, points))
            .await
    }

    pub async fn poly_fill_rectangle(
        &mut self,
        drawable: u32,
        gc: u32,
        rects: &[Rectangle],
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::PolyFillRectangle,
            Some(gc),
            vec![drawable.into(), gc.into(), ArgValue::rectangles(rects)],
        );
        self.send(&Request::poly_fill_rectangle(drawable, gc, rects))
            .await
    }

    /// A single-rectangle PolyFillRectangle, logged under its own kind with flat args.
    pub async fn fill_rectangle(
        &mut self,
        drawable: u32,
        gc: u32,
        rect: Rectangle,
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::FillRectangle,
            Some(gc),
            vec![
                drawable.into(),
                gc.into(),
                rect.x.into(),
                rect.y.into(),
                rect.width.into(),
                rect.height.into(),
            ],
        );
        self.send(&Request::poly_fill_rectangle(drawable, gc, &[rect]))
            .await
    }

    pub async fn poly_fill_arc(
        &mut self,
        drawable: u32,
        gc: u32,
        arcs: &[Arc],
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::PolyFillArc,
            Some(gc),
            vec![drawable.into(), gc.into(), ArgValue::arcs(arcs)],
        );
        self.send(&Request::poly_fill_arc(drawable, gc, arcs))
            .await
    }

    /// ZPixmap image at the configured root depth.
    pub async fn put_image(
        &mut self,
        drawable: u32,
        gc: u32,
        width: u16,
        height: u16,
        dst: Point,
        data: &[u8],
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::PutImage,
            Some(gc),
            vec![
                drawable.into(),
                gc.into(),
                dst.x.into(),
                dst.y.into(),
                width.into(),
                height.into(),
            ],
        );
        let request = Request::put_image(
            ImageFormat::ZPixmap,
            drawable,
            gc,
            width,
            height,
            dst,
            0,
            self.config().root_depth,
            data,
        );
        self.send(&request).await
    }

    pub async fn poly_text8(
        &mut self,
        drawable: u32,
        gc: u32,
        origin: Point,
        items: &[TextItem8],
    ) -> Result<u16, SessionError> {
        let items = TextItem8::split_long(items);
        let request = Request::poly_text8(drawable, gc, origin, &items)?;
        self.record(
            OpKind::PolyText8,
            Some(gc),
            vec![
                drawable.into(),
                gc.into(),
                origin.x.into(),
                origin.y.into(),
                ArgValue::text_items8(&items),
            ],
        );
        self.send(&request).await
    }

    pub async fn poly_text16(
        &mut self,
        drawable: u32,
        gc: u32,
        origin: Point,
        items: &[TextItem16],
    ) -> Result<u16, SessionError> {
        let items = TextItem16::split_long(items);
        let request = Request::poly_text16(drawable, gc, origin, &items)?;
        self.record(
            OpKind::PolyText16,
            Some(gc),
            vec![
                drawable.into(),
                gc.into(),
                origin.x.into(),
                origin.y.into(),
                ArgValue::text_items16(&items),
            ],
        );
        self.send(&request).await
    }

    pub async fn image_text8(
        &mut self,
        drawable: u32,
        gc: u32,
        origin: Point,
        text: &str,
    ) -> Result<u16, SessionError> {
        let text = truncate_image_text(text);
        self.record(
            OpKind::ImageText8,
            Some(gc),
            vec![
                drawable.into(),
                gc.into(),
                origin.x.into(),
                origin.y.into(),
                text.into(),
            ],
        );
        self.send(&Request::image_text8(drawable, gc, origin, text.as_bytes()))
            .await
    }

    pub async fn image_text16(
        &mut self,
        drawable: u32,
        gc: u32,
        origin: Point,
        text: &str,
    ) -> Result<u16, SessionError> {
        let units: Vec<u16> = text
            .encode_utf16()
            .take(MAX_IMAGE_TEXT_UNITS)
            .collect();
        self.record(
            OpKind::ImageText16,
            Some(gc),
            vec![
                drawable.into(),
                gc.into(),
                origin.x.into(),
                origin.y.into(),
                ArgValue::text(String::from_utf16_lossy(&units)),
            ],
        );
        self.send(&Request::image_text16(drawable, gc, origin, &units))
            .await
    }

    /// Asynchronous grab with no confinement or cursor. The server's reply is not awaited.
    pub async fn grab_pointer(
        &mut self,
        window: u32,
        owner_events: bool,
        event_mask: u16,
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::GrabPointer,
            None,
            vec![window.into(), owner_events.into(), event_mask.into()],
        );
        let request = Request::grab_pointer(
            owner_events,
            window,
            event_mask,
            GrabMode::Async,
            GrabMode::Async,
            NONE,
            NONE,
            CURRENT_TIME,
        );
        self.send(&request).await
    }

    pub async fn ungrab_pointer(&mut self, time: u32) -> Result<u16, SessionError> {
        self.record(OpKind::UngrabPointer, None, vec![time.into()]);
        self.send(&Request::ungrab_pointer(time)).await
    }

    pub async fn grab_keyboard(
        &mut self,
        window: u32,
        owner_events: bool,
    ) -> Result<u16, SessionError> {
        self.record(
            OpKind::GrabKeyboard,
            None,
            vec![window.into(), owner_events.into()],
        );
        let request = Request::grab_keyboard(
            owner_events,
            window,
            CURRENT_TIME,
            GrabMode::Async,
            GrabMode::Async,
        );
        self.send(&request).await
    }

    pub async fn ungrab_keyboard(&mut self, time: u32) -> Result<u16, SessionError> {
        self.record(OpKind::UngrabKeyboard, None, vec![time.into()]);
        self.send(&Request::ungrab_keyboard(time)).await
    }
}
