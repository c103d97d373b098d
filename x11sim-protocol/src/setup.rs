use crate::{BYTE_ORDER_LSB_FIRST, PROTOCOL_MINOR_VERSION};

pub const SETUP_REQUEST_LEN: usize = 12;
pub const SETUP_RESPONSE_HEADER_LEN: usize = 8;

const STATUS_SUCCESS: u8 = 1;

/// Connection setup with no authorization data.
pub fn encode_setup_request(protocol_major: u16) -> [u8; SETUP_REQUEST_LEN] {
    let mut request = [0u8; SETUP_REQUEST_LEN];
    request[0] = BYTE_ORDER_LSB_FIRST;
    request[2..4].copy_from_slice(&protocol_major.to_le_bytes());
    request[4..6].copy_from_slice(&PROTOCOL_MINOR_VERSION.to_le_bytes());
    request
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupResponseHeader {
    pub status: u8,
    /// Length of the failure reason; unused on success.
    pub reason_len: u8,
    pub protocol_major: u16,
    pub protocol_minor: u16,
    pub additional_words: u16,
}

impl SetupResponseHeader {
    pub fn success(protocol_major: u16, protocol_minor: u16, additional_words: u16) -> Self {
        Self {
            status: STATUS_SUCCESS,
            reason_len: 0,
            protocol_major,
            protocol_minor,
            additional_words,
        }
    }

    pub fn parse(header: &[u8; SETUP_RESPONSE_HEADER_LEN]) -> Self {
        Self {
            status: header[0],
            reason_len: header[1],
            protocol_major: u16::from_le_bytes([header[2], header[3]]),
            protocol_minor: u16::from_le_bytes([header[4], header[5]]),
            additional_words: u16::from_le_bytes([header[6], header[7]]),
        }
    }

    pub fn encode(&self) -> [u8; SETUP_RESPONSE_HEADER_LEN] {
        let mut header = [0u8; SETUP_RESPONSE_HEADER_LEN];
        header[0] = self.status;
        header[1] = self.reason_len;
        header[2..4].copy_from_slice(&self.protocol_major.to_le_bytes());
        header[4..6].copy_from_slice(&self.protocol_minor.to_le_bytes());
        header[6..8].copy_from_slice(&self.additional_words.to_le_bytes());
        header
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn additional_len(&self) -> usize {
        self.additional_words as usize * 4
    }
}
