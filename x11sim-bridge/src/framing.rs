use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use x11sim_protocol::{encode_request_header, pad, padded_len, Request};

use crate::error::SessionError;

/// Writes framed requests and owns the session's sequence counter.
#[derive(Debug)]
pub struct RequestWriter<W> {
    writer: W,
    sequence: u16,
}

impl<W> RequestWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            sequence: 0,
        }
    }

    /// Sequence number of the last successful send; 0 before the first one.
    pub fn last_sequence(&self) -> u16 {
        self.sequence
    }

    /// Header, then padded payload, then flush. The counter only moves once both writes
    /// have gone through.
    pub async fn send(&mut self, opcode: u8, flag: u8, payload: &[u8]) -> Result<u16, SessionError> {
        let header = encode_request_header(opcode, flag, payload.len())?;
        self.writer.write_all(&header).await?;

        let mut body = BytesMut::with_capacity(padded_len(payload.len()));
        body.put_slice(payload);
        body.put_bytes(0, pad(payload.len()));
        self.writer.write_all(&body).await?;
        self.writer.flush().await?;

        self.sequence = self.sequence.wrapping_add(1);
        log::debug!(
            "sent opcode {} flag {} ({} bytes) as #{}",
            opcode,
            flag,
            header.len() + body.len(),
            self.sequence
        );
        Ok(self.sequence)
    }

    pub async fn send_request(&mut self, request: &Request) -> Result<u16, SessionError> {
        self.send(request.opcode.code(), request.flag, &request.payload)
            .await
    }

    pub async fn shutdown(&mut self) -> Result<(), SessionError> {
        self.writer.shutdown().await?;
        Ok(())
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
