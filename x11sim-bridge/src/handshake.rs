use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use x11sim_protocol::setup::SETUP_RESPONSE_HEADER_LEN;
use x11sim_protocol::{encode_setup_request, SetupResponseHeader};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Init,
    RequestSent,
    AwaitingResponse,
    Established,
    Failed,
    Closed,
}

/// Server side of a successful setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupOutcome {
    pub protocol_major: u16,
    pub protocol_minor: u16,
    /// Bytes of setup data that followed the header and were skipped.
    pub additional_len: usize,
}

#[derive(Debug)]
pub struct Handshake {
    protocol_major: u16,
    state: HandshakeState,
}

impl Handshake {
    pub fn new(protocol_major: u16) -> Self {
        Self {
            protocol_major,
            state: HandshakeState::Init,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub async fn run<R, W>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<SetupOutcome, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let result = self.exchange(reader, writer).await;
        if result.is_err() {
            self.state = HandshakeState::Failed;
        }
        result
    }

    async fn exchange<R, W>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<SetupOutcome, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        writer
            .write_all(&encode_setup_request(self.protocol_major))
            .await?;
        writer.flush().await?;
        self.state = HandshakeState::RequestSent;
        log::debug!("setup request sent (protocol {})", self.protocol_major);

        self.state = HandshakeState::AwaitingResponse;
        let mut raw = [0u8; SETUP_RESPONSE_HEADER_LEN];
        reader.read_exact(&mut raw).await?;
        let header = SetupResponseHeader::parse(&raw);

        if header.is_success() {
            let mut data = (&mut *reader).take(header.additional_len() as u64);
            let skipped = tokio::io::copy(&mut data, &mut tokio::io::sink()).await?;
            if skipped < header.additional_len() as u64 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed inside setup data",
                )
                .into());
            }

            self.state = HandshakeState::Established;
            log::info!(
                "session established: server protocol {}.{}, {} bytes of setup data",
                header.protocol_major,
                header.protocol_minor,
                header.additional_len()
            );
            return Ok(SetupOutcome {
                protocol_major: header.protocol_major,
                protocol_minor: header.protocol_minor,
                additional_len: header.additional_len(),
            });
        }

        let mut additional = vec![0u8; header.additional_len()];
        reader.read_exact(&mut additional).await?;
        let reason_len = (header.reason_len as usize).min(additional.len());
        let reason = String::from_utf8_lossy(&additional[..reason_len]).into_owned();

        log::warn!(
            "setup refused (status {}, server protocol {}.{}): {}",
            header.status,
            header.protocol_major,
            header.protocol_minor,
            reason
        );
        Err(SessionError::SetupFailed {
            major: header.protocol_major,
            minor: header.protocol_minor,
            reason,
        })
    }

    pub fn close(&mut self) {
        if self.state != HandshakeState::Closed {
            log::debug!("handshake state {:?} -> Closed", self.state);
        }
        self.state = HandshakeState::Closed;
    }
}

pub async fn run_handshake<R, W>(
    reader: &mut R,
    writer: &mut W,
    protocol_major: u16,
) -> Result<SetupOutcome, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    Handshake::new(protocol_major).run(reader, writer).await
}
