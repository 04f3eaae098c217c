use thiserror::Error;

use crate::session::ConnectionState;

/// Synchronous rejections of session operations.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum SessionError {
    #[error("discovery is already in progress")]
    AlreadyInProgress,
    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectionState,
    },
    #[error("no device has been discovered; run discovery first")]
    NothingDiscovered,
    #[error("the session runtime has shut down")]
    SessionClosed,
}

/// Errors returned when parsing simulator fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("the scan fixture is empty")]
    EmptyFixture,
    #[error("scan records must contain two pipe-delimited fields")]
    InvalidRecordFieldCount,
    #[error("fixture records cannot contain empty mandatory fields")]
    EmptyRecordField,
    #[error("failed to parse numeric fixture field")]
    InvalidNumber(#[from] std::num::ParseIntError),
    #[error("sample records must look like `active:trend`, got `{record}`")]
    InvalidSampleRecord { record: String },
    #[error("sample activity flag must be `0` or `1`, got `{value}`")]
    InvalidActivityFlag { value: String },
}

/// Errors returned when validating command-line options.
#[derive(Debug, Error)]
pub(crate) enum CliConfigError {
    #[error("failed while waiting for Ctrl+C")]
    CtrlC { source: std::io::Error },
    #[error("the session event stream closed unexpectedly")]
    EventStreamClosed,
}

/// Errors returned by telemetry initialisation.
#[derive(Debug, Error)]
pub(crate) enum TelemetryError {
    #[error("failed to install tracing subscriber")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
