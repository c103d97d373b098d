use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use x11sim_protocol::{classify, MessageKind, ProtocolError, MESSAGE_LEN};

use crate::error::SessionError;

/// What the reader saw before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub errors: u64,
    pub replies: u64,
    pub events: u64,
    /// Replies that arrived while the slot was still occupied.
    pub dropped_replies: u64,
}

/// Drains server messages until EOF, cancellation or a protocol-fatal message.
/// Replies go to `replies`; errors and events are only logged.
pub async fn run_reader<R>(
    mut reader: R,
    replies: mpsc::Sender<Bytes>,
    max_reply_bytes: usize,
    cancel: CancellationToken,
) -> Result<ReaderStats, SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut stats = ReaderStats::default();

    loop {
        let mut header = [0u8; MESSAGE_LEN];
        tokio::select! {
            _ = cancel.cancelled() => {
                log::debug!("reader cancelled");
                return Ok(stats);
            }
            read = reader.read_exact(&mut header) => {
                if let Err(e) = read {
                    return end_of_stream(e, stats);
                }
            }
        }

        let kind = match classify(&header) {
            Ok(kind) => kind,
            Err(e) => {
                log::error!("reader stopping: {}", e);
                return Err(e.into());
            },
        };

        match kind {
            MessageKind::Error(err) => {
                stats.errors += 1;
                log::warn!(
                    "server error code {} seq {} bad value {:#x} opcode {}.{}",
                    err.code,
                    err.sequence,
                    err.bad_value,
                    err.major_opcode,
                    err.minor_opcode
                );
            },
            MessageKind::Event(event) => {
                stats.events += 1;
                log::debug!("event {} seq {} discarded", event.code, event.sequence);
            },
            MessageKind::Reply(reply) => {
                let trailing = reply.trailing_len();
                if trailing > max_reply_bytes {
                    let err = ProtocolError::ReplyTooLarge {
                        len: trailing,
                        max: max_reply_bytes,
                    };
                    log::error!("reader stopping: {}", err);
                    return Err(err.into());
                }

                let mut buf = BytesMut::zeroed(MESSAGE_LEN + trailing);
                buf[..MESSAGE_LEN].copy_from_slice(&header);
                tokio::select! {
                    _ = cancel.cancelled() => {
                        log::debug!("reader cancelled mid-reply");
                        return Ok(stats);
                    }
                    read = reader.read_exact(&mut buf[MESSAGE_LEN..]) => {
                        if let Err(e) = read {
                            return end_of_stream(e, stats);
                        }
                    }
                }

                stats.replies += 1;
                log::debug!("reply seq {} ({} trailing bytes)", reply.sequence, trailing);
                match replies.try_send(buf.freeze()) {
                    Ok(()) => {},
                    Err(TrySendError::Full(_)) => {
                        stats.dropped_replies += 1;
                        log::error!(
                            "reply seq {} dropped: previous reply was never taken",
                            reply.sequence
                        );
                    },
                    Err(TrySendError::Closed(_)) => {
                        log::debug!("session gone, reader exiting");
                        return Ok(stats);
                    },
                }
            },
        }
    }
}

fn end_of_stream(e: std::io::Error, stats: ReaderStats) -> Result<ReaderStats, SessionError> {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        log::info!("server closed the channel");
        Ok(stats)
    } else {
        log::error!("reader stopping: {}", e);
        Err(e.into())
    }
}

/// Handle to a spawned reader.
#[derive(Debug)]
pub struct ReaderTask {
    handle: JoinHandle<Result<ReaderStats, SessionError>>,
    cancel: CancellationToken,
}

impl ReaderTask {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Result<ReaderStats, SessionError> {
        self.handle
            .await
            .map_err(|e| SessionError::ReaderTask(e.to_string()))?
    }
}

/// Spawns the reader with a single-slot reply channel.
pub fn spawn_reader<R>(reader: R, max_reply_bytes: usize) -> (ReaderTask, mpsc::Receiver<Bytes>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run_reader(reader, tx, max_reply_bytes, cancel.clone()));
    (ReaderTask { handle, cancel }, rx)
}
