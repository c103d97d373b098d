pub mod classifier;
pub mod config;
pub mod error;
pub mod fake_server;
pub mod framing;
pub mod handshake;
pub mod requests;
pub mod scenario;
pub mod session;

pub use classifier::{run_reader, spawn_reader, ReaderStats, ReaderTask};
pub use config::SimulatorConfig;
pub use error::SessionError;
pub use fake_server::{FakeServer, ReceivedRequest};
pub use framing::RequestWriter;
pub use handshake::{run_handshake, Handshake, HandshakeState, SetupOutcome};
pub use scenario::{draw_scene, export_reference, load_trace_file};
pub use session::{SessionSummary, SimSession};
