//! Session management for PIP wearable biosensors.
//!
//! A [`SessionFacade`] owns one device session: it runs discovery into a
//! [`DeviceRegistry`], drives the [`ConnectionController`] state machine, and
//! turns streamed analyzer samples into [`TrendState`]s. [`start_session`]
//! wraps the facade in a tokio actor fed by a [`Transport`].

mod app;
mod cli;
mod config;
mod error;
mod session;
mod telemetry;
mod terminal;
mod transport;

pub use app::{run, run_with_clients, run_with_clients_and_log_level};
pub use cli::{
    Args, Command, DiscoverArgs, LogLevel, OutputFormat, SimulatorArgs, StreamArgs,
};
pub use config::SessionConfig;
pub use error::{FixtureError, SessionError};
pub use session::{
    AnalyzerSample, ConnectFailure, ConnectionController, ConnectionState, DeviceId, DeviceInfo,
    DeviceRegistry, DiscoveryPolicy, DiscoverySession, EventSender, RELAXING_CODE, STRESSING_CODE,
    SessionEvent, SessionEvents, SessionFacade, SessionHandle, SessionSnapshot, StreamInterpreter,
    TransportStatus, TrendCodes, TrendState, start_session,
};
pub use terminal::{SystemTerminalClient, TerminalClient};
pub use transport::{
    RecordingTransport, SampleFixture, ScanFixture, SimulatedTransport, SimulatorConfig,
    Transport, TransportEvent, TransportRequest,
};
