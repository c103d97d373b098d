use crate::error::ProtocolError;
use crate::MESSAGE_LEN;

const ERROR_TYPE: u8 = 0;
const REPLY_TYPE: u8 = 1;
const LAST_EVENT_TYPE: u8 = 127;

/// Error message from the server; never followed by trailing bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerError {
    pub code: u8,
    pub sequence: u16,
    pub bad_value: u32,
    pub minor_opcode: u16,
    pub major_opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    pub data: u8,
    pub sequence: u16,
    pub extra_words: u32,
}

impl ReplyHeader {
    pub fn trailing_len(&self) -> usize {
        self.extra_words as usize * 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHeader {
    pub code: u8,
    pub sequence: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Error(ServerError),
    Reply(ReplyHeader),
    Event(EventHeader),
}

fn u16_at(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Classify a fixed-size server message by its leading type byte.
pub fn classify(header: &[u8; MESSAGE_LEN]) -> Result<MessageKind, ProtocolError> {
    match header[0] {
        ERROR_TYPE => Ok(MessageKind::Error(ServerError {
            code: header[1],
            sequence: u16_at(header, 2),
            bad_value: u32_at(header, 4),
            minor_opcode: u16_at(header, 8),
            major_opcode: header[10],
        })),
        REPLY_TYPE => Ok(MessageKind::Reply(ReplyHeader {
            data: header[1],
            sequence: u16_at(header, 2),
            extra_words: u32_at(header, 4),
        })),
        code @ 2..=LAST_EVENT_TYPE => Ok(MessageKind::Event(EventHeader {
            code,
            sequence: u16_at(header, 2),
        })),
        other => Err(ProtocolError::UnknownMessageType(other)),
    }
}

/// Sequence number echoed in bytes 2-3 of a reply buffer.
pub fn reply_sequence(reply: &[u8]) -> Option<u16> {
    (reply.len() >= 4).then(|| u16_at(reply, 2))
}
