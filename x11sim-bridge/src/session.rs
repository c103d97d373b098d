use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::sync::mpsc;
use x11sim_core::{
    compare, ArgValue, ObservedOperation, OpKind, Operation, OracleReport, SessionRecord,
    TraceState, ValidationIssue,
};
use x11sim_protocol::{reply_sequence, Request};

use crate::classifier::{spawn_reader, ReaderStats, ReaderTask};
use crate::config::SimulatorConfig;
use crate::error::SessionError;
use crate::framing::RequestWriter;
use crate::handshake::{Handshake, HandshakeState, SetupOutcome};

/// An established connection plus everything recorded on it.
///
/// Drawing requests are methods on this type (see `requests.rs`), so nothing can be sent
/// before setup succeeds. Every method takes `&mut self`, which keeps at most one
/// synchronous request in flight.
pub struct SimSession<W> {
    writer: RequestWriter<W>,
    replies: mpsc::Receiver<Bytes>,
    reader: ReaderTask,
    handshake: Handshake,
    setup: SetupOutcome,
    trace: TraceState,
    config: SimulatorConfig,
}

/// What `finish` hands back once the channel is closed.
#[derive(Debug)]
pub struct SessionSummary {
    pub record: SessionRecord,
    pub reader_stats: Option<ReaderStats>,
    pub reader_error: Option<SessionError>,
}

impl<S> SimSession<WriteHalf<S>>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Splits `stream`, runs setup on it and starts the reader.
    pub async fn connect(stream: S, config: SimulatorConfig) -> Result<Self, SessionError> {
        let (reader, writer) = tokio::io::split(stream);
        Self::from_halves(reader, writer, config).await
    }
}

impl<W> SimSession<W>
where
    W: AsyncWrite + Unpin,
{
    pub async fn from_halves<R>(
        mut reader: R,
        mut writer: W,
        config: SimulatorConfig,
    ) -> Result<Self, SessionError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut handshake = Handshake::new(config.protocol_major);
        let setup = handshake.run(&mut reader, &mut writer).await?;
        let (reader, replies) = spawn_reader(reader, config.max_reply_bytes);

        Ok(Self {
            writer: RequestWriter::new(writer),
            replies,
            reader,
            handshake,
            setup,
            trace: TraceState::new(),
            config,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn setup(&self) -> &SetupOutcome {
        &self.setup
    }

    pub fn state(&self) -> HandshakeState {
        self.handshake.state()
    }

    pub fn trace(&self) -> &TraceState {
        &self.trace
    }

    pub fn operations(&self) -> &[Operation] {
        self.trace.operations()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        self.trace.issues()
    }

    pub fn last_sequence(&self) -> u16 {
        self.writer.last_sequence()
    }

    /// Starts a new scenario on the same connection. The sequence counter keeps running.
    pub fn clear_trace(&mut self) {
        log::debug!("trace cleared ({} operations)", self.trace.operations().len());
        self.trace.clear();
    }

    pub fn compare(&self, observed: &[ObservedOperation]) -> OracleReport {
        compare(self.trace.operations(), observed)
    }

    pub(crate) fn record(&mut self, kind: OpKind, gc: Option<u32>, args: Vec<ArgValue>) {
        self.trace.record(kind, gc, args);
    }

    pub(crate) fn define_gc(&mut self, gc: u32, foreground: u32) {
        self.trace.define_gc(gc, foreground);
    }

    pub(crate) fn record_issue(&mut self, issue: ValidationIssue) {
        self.trace.record_issue(issue);
    }

    pub(crate) async fn send(&mut self, request: &Request) -> Result<u16, SessionError> {
        self.writer.send_request(request).await
    }

    /// Sends `request` and waits for the reply in the slot. A reply whose sequence number
    /// does not match is still returned, with the mismatch recorded.
    pub(crate) async fn round_trip(
        &mut self,
        kind: OpKind,
        request: &Request,
    ) -> Result<(u16, Bytes), SessionError> {
        self.drain_stale_replies();
        let sequence = self.send(request).await?;
        let reply = self.await_reply().await?;

        let received = reply_sequence(&reply).unwrap_or_default();
        if received != sequence {
            self.record_issue(ValidationIssue::SequenceMismatch {
                kind,
                expected: sequence,
                received,
            });
        }
        Ok((sequence, reply))
    }

    async fn await_reply(&mut self) -> Result<Bytes, SessionError> {
        let timeout = self.config.reply_timeout;
        match tokio::time::timeout(timeout, self.replies.recv()).await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(SessionError::ReplyChannelClosed),
            Err(_) => {
                log::warn!("no reply after {:?}", timeout);
                Err(SessionError::ReplyTimeout(timeout))
            },
        }
    }

    fn drain_stale_replies(&mut self) {
        while let Ok(stale) = self.replies.try_recv() {
            self.record_issue(ValidationIssue::UnsolicitedReply {
                sequence: reply_sequence(&stale),
            });
        }
    }

    /// Idles for `idle_period`, closes the writer, stops the reader and returns the trace.
    pub async fn finish(mut self) -> SessionSummary {
        tokio::time::sleep(self.config.idle_period).await;
        self.drain_stale_replies();

        if let Err(e) = self.writer.shutdown().await {
            log::warn!("writer shutdown failed: {}", e);
        }
        self.reader.cancel();
        let (reader_stats, reader_error) = match self.reader.join().await {
            Ok(stats) => (Some(stats), None),
            Err(e) => {
                log::error!("reader ended with error: {}", e);
                (None, Some(e))
            },
        };
        self.handshake.close();

        let record = self.trace.into_record();
        log::info!(
            "session closed: {} operations, {} issues, last sequence {}",
            record.operations.len(),
            record.issues.len(),
            self.writer.last_sequence()
        );
        SessionSummary {
            record,
            reader_stats,
            reader_error,
        }
    }
}
