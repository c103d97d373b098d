//! Wire model for the simulated X11 session: request framing, server message
//! classification, connection setup and the reply layouts the simulator parses.
//!
//! Everything here is pure byte manipulation. The async plumbing lives in
//! `x11sim-bridge`.

pub mod error;
pub mod font;
pub mod message;
pub mod opcode;
pub mod request;
pub mod setup;

#[cfg(test)]
mod tests;

pub use error::ProtocolError;
pub use font::{CharInfo, FontIssue, FontProp, FontQueryResult, ListFontsReply, MetricLocation};
pub use message::{classify, reply_sequence, EventHeader, MessageKind, ReplyHeader, ServerError};
pub use opcode::Opcode;
pub use request::{
    encode_request, encode_request_header, request_length_units, Arc, CoordMode, GcValues,
    GrabMode, ImageFormat, Point, PolyShape, PropertyMode, Rectangle, Request, Segment,
    TextItem16, TextItem8, WindowClass, WindowGeometry, WindowValues, MAX_IMAGE_TEXT_UNITS,
    MAX_TEXT_ITEMS, MAX_TEXT_ITEM_UNITS,
};
pub use setup::{encode_setup_request, SetupResponseHeader};

pub const PROTOCOL_MAJOR_VERSION: u16 = 11;
pub const PROTOCOL_MINOR_VERSION: u16 = 0;

/// Byte-order marker sent as the first setup byte ('l' = least significant byte first).
pub const BYTE_ORDER_LSB_FIRST: u8 = b'l';

pub const REQUEST_HEADER_LEN: usize = 4;

/// Fixed size of every error, event and reply header coming from the server.
pub const MESSAGE_LEN: usize = 32;

pub const DEFAULT_MAX_REPLY_BYTES: usize = 1_048_576; // 1 MB

/// Number of zero bytes needed to bring `n` up to a 4-byte boundary.
pub fn pad(n: usize) -> usize {
    (4 - (n % 4)) % 4
}

pub fn padded_len(n: usize) -> usize {
    n + pad(n)
}
