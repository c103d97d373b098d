//! A scripted stand-in for a display server, used by the integration tests and the
//! `fake_server` demo. It accepts setup, records every request and answers the two
//! synchronous requests with canned replies.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use x11sim_protocol::setup::SETUP_REQUEST_LEN;
use x11sim_protocol::{
    pad, CharInfo, FontQueryResult, ListFontsReply, Opcode, SetupResponseHeader,
    BYTE_ORDER_LSB_FIRST, MESSAGE_LEN, PROTOCOL_MINOR_VERSION, REQUEST_HEADER_LEN,
};

use crate::error::SessionError;

/// One request as the server saw it. `payload` keeps the wire padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedRequest {
    pub sequence: u16,
    pub opcode: u8,
    pub flag: u8,
    pub payload: Bytes,
}

impl ReceivedRequest {
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_code(self.opcode)
    }
}

#[derive(Debug, Clone)]
pub struct FakeServer {
    /// Refuse setup with this reason instead of accepting.
    pub refuse_setup: Option<String>,
    pub setup_data_words: u16,
    pub font: FontQueryResult,
    pub font_names: Vec<String>,
    /// Count written in the ListFonts reply header; defaults to `font_names.len()`.
    pub declared_font_count: Option<u16>,
    /// Added to the sequence number echoed in every reply.
    pub sequence_skew: u16,
    /// Send an event ahead of each reply.
    pub event_before_reply: bool,
    /// Send an error ahead of each reply.
    pub error_before_reply: bool,
}

impl Default for FakeServer {
    fn default() -> Self {
        Self {
            refuse_setup: None,
            setup_data_words: 2,
            font: sample_font(),
            font_names: vec!["fixed".to_string(), "cursor".to_string()],
            declared_font_count: None,
            sequence_skew: 0,
            event_before_reply: false,
            error_before_reply: false,
        }
    }
}

/// A small consistent font covering the printable ASCII range.
pub fn sample_font() -> FontQueryResult {
    let glyph = CharInfo {
        left_side_bearing: 0,
        right_side_bearing: 6,
        character_width: 6,
        ascent: 10,
        descent: 3,
        attributes: 0,
    };
    let (min_char, max_char) = (0x20u16, 0x7eu16);
    let count = u32::from(max_char - min_char) + 1;
    FontQueryResult {
        min_bounds: glyph,
        max_bounds: glyph,
        min_char,
        max_char,
        default_char: min_char,
        all_chars_exist: true,
        font_ascent: 10,
        font_descent: 3,
        char_info_count: count,
        char_infos: vec![glyph; count as usize],
        ..Default::default()
    }
}

impl FakeServer {
    /// Serves one connection until the client closes it, returning every request received.
    pub async fn serve<S>(&self, mut stream: S) -> Result<Vec<ReceivedRequest>, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut setup = [0u8; SETUP_REQUEST_LEN];
        stream.read_exact(&mut setup).await?;
        let major = u16::from_le_bytes([setup[2], setup[3]]);
        if setup[0] != BYTE_ORDER_LSB_FIRST {
            log::warn!("client byte order marker {:#x}", setup[0]);
        }

        if let Some(reason) = &self.refuse_setup {
            let reason = &reason.as_bytes()[..reason.len().min(255)];
            let padded = reason.len() + pad(reason.len());
            let header = SetupResponseHeader {
                status: 0,
                reason_len: reason.len() as u8,
                protocol_major: major,
                protocol_minor: PROTOCOL_MINOR_VERSION,
                additional_words: (padded / 4) as u16,
            };
            stream.write_all(&header.encode()).await?;
            stream.write_all(reason).await?;
            stream.write_all(&vec![0u8; pad(reason.len())]).await?;
            stream.flush().await?;
            log::info!("fake server refused setup");
            return Ok(Vec::new());
        }

        let header =
            SetupResponseHeader::success(major, PROTOCOL_MINOR_VERSION, self.setup_data_words);
        stream.write_all(&header.encode()).await?;
        stream
            .write_all(&vec![0u8; header.additional_len()])
            .await?;
        stream.flush().await?;
        log::info!("fake server accepted setup (protocol {})", major);

        let mut received = Vec::new();
        let mut sequence = 0u16;
        loop {
            let mut header = [0u8; REQUEST_HEADER_LEN];
            match stream.read_exact(&mut header).await {
                Ok(_) => {},
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let units = u16::from_le_bytes([header[2], header[3]]) as usize;
            let body_len = (units * 4).saturating_sub(REQUEST_HEADER_LEN);
            let mut payload = BytesMut::zeroed(body_len);
            stream.read_exact(&mut payload).await?;
            sequence = sequence.wrapping_add(1);

            let request = ReceivedRequest {
                sequence,
                opcode: header[0],
                flag: header[1],
                payload: payload.freeze(),
            };
            log::debug!(
                "fake server got #{} opcode {} ({} bytes)",
                sequence,
                request.opcode,
                body_len
            );

            if let Some(reply) = self.reply_to(&request) {
                if self.error_before_reply {
                    stream.write_all(&error_message(sequence, request.opcode)).await?;
                }
                if self.event_before_reply {
                    stream.write_all(&expose_event(sequence)).await?;
                }
                stream.write_all(&reply).await?;
                stream.flush().await?;
            }
            received.push(request);
        }

        log::info!("fake server saw {} requests", received.len());
        Ok(received)
    }

    fn reply_to(&self, request: &ReceivedRequest) -> Option<BytesMut> {
        let sequence = request.sequence.wrapping_add(self.sequence_skew);
        match request.opcode()? {
            Opcode::QueryFont => {
                let mut font = self.font.clone();
                font.sequence = sequence;
                Some(font.encode())
            },
            Opcode::ListFonts => {
                let mut listing = ListFontsReply::new(sequence, self.font_names.clone());
                if let Some(declared) = self.declared_font_count {
                    listing.declared_count = declared;
                }
                Some(listing.encode())
            },
            _ => None,
        }
    }
}

fn error_message(sequence: u16, major_opcode: u8) -> [u8; MESSAGE_LEN] {
    let mut m = [0u8; MESSAGE_LEN];
    m[1] = 7; // BadFont
    m[2..4].copy_from_slice(&sequence.to_le_bytes());
    m[10] = major_opcode;
    m
}

fn expose_event(sequence: u16) -> [u8; MESSAGE_LEN] {
    let mut m = [0u8; MESSAGE_LEN];
    m[0] = 12;
    m[2..4].copy_from_slice(&sequence.to_le_bytes());
    m
}
