use tracing::{debug, warn};

use super::model::{ConnectFailure, ConnectionState, DeviceId, SessionEvent, TransportStatus};
use crate::error::SessionError;
use crate::transport::Transport;

/// Owns the connection lifecycle of the one selected device.
///
/// This is the only writer of [`ConnectionState`]. Discovery drives the
/// pre-connection states through the crate-private `enter_*` methods; every
/// other transition happens in response to a request or a transport event.
#[derive(Debug)]
pub struct ConnectionController {
    state: ConnectionState,
    device: Option<DeviceId>,
}

impl Default for ConnectionController {
    fn default() -> Self {
        Self {
            state: ConnectionState::Idle,
            device: None,
        }
    }
}

impl ConnectionController {
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the device selected by the latest `connect`.
    #[must_use]
    pub fn device(&self) -> Option<DeviceId> {
        self.device
    }

    pub(crate) fn enter_discovering(&mut self) {
        self.device = None;
        self.transition(ConnectionState::Discovering);
    }

    pub(crate) fn enter_discovered(&mut self) {
        self.transition(ConnectionState::Discovered);
    }

    pub(crate) fn enter_idle(&mut self) {
        self.transition(ConnectionState::Idle);
    }

    /// Requests a connection to `device`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the session is
    /// `Discovered`, `ConnectFailed` or `Disconnected`.
    pub fn connect(
        &mut self,
        device: DeviceId,
        transport: &dyn Transport,
    ) -> Result<(), SessionError> {
        if !self.state.accepts_connect() {
            return Err(SessionError::InvalidState {
                operation: "connect",
                state: self.state,
            });
        }

        self.device = Some(device);
        self.transition(ConnectionState::Connecting);
        transport.request_connect(device);
        Ok(())
    }

    /// Handles the outcome of a connection attempt.
    pub fn on_connected(
        &mut self,
        status: TransportStatus,
        device: DeviceId,
        transport: &dyn Transport,
    ) -> Option<SessionEvent> {
        if self.state != ConnectionState::Connecting || !self.is_current(device) {
            debug!(%device, state = %self.state, "ignoring stale connect result");
            return None;
        }

        if !status.is_success() {
            self.transition(ConnectionState::ConnectFailed);
            return Some(SessionEvent::ConnectFailed {
                device,
                reason: ConnectFailure::Status(status),
            });
        }

        self.transition(ConnectionState::Connected);
        self.start_streaming(device, transport);
        Some(SessionEvent::Connected { device })
    }

    /// Handles a failure of a pending or established link.
    pub fn on_connection_error(
        &mut self,
        status: TransportStatus,
        device: DeviceId,
    ) -> Option<SessionEvent> {
        let linked = matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Streaming
        );
        if !linked || !self.is_current(device) {
            debug!(%device, state = %self.state, "ignoring connection error");
            return None;
        }

        warn!(%device, %status, "device link failed");
        self.transition(ConnectionState::ConnectFailed);
        Some(SessionEvent::ConnectFailed {
            device,
            reason: ConnectFailure::Status(status),
        })
    }

    /// Requests that the current link be closed.
    ///
    /// Returns `false` without side effects when there is no link to close,
    /// including when a disconnect is already under way.
    pub fn disconnect(&mut self, transport: &dyn Transport) -> bool {
        let closable = matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Streaming
        );
        let Some(device) = self.device.filter(|_| closable) else {
            debug!(state = %self.state, "disconnect is a no-op");
            return false;
        };

        self.transition(ConnectionState::Disconnecting);
        transport.request_disconnect(device);
        true
    }

    /// Handles the transport closing the link.
    pub fn on_disconnected(
        &mut self,
        status: TransportStatus,
        device: DeviceId,
    ) -> Option<SessionEvent> {
        if self.state == ConnectionState::Disconnected || !self.is_current(device) {
            debug!(%device, state = %self.state, "ignoring disconnect notice");
            return None;
        }

        self.transition(ConnectionState::Disconnected);
        Some(SessionEvent::Disconnected { device, status })
    }

    /// Reconciles local state after the transport reconnected on resume.
    ///
    /// A pending disconnect wins over the resume: its `Disconnected` notice
    /// settles the state. A live stream is left as it is.
    pub fn on_resumed(
        &mut self,
        status: TransportStatus,
        transport: &dyn Transport,
    ) -> Option<SessionEvent> {
        let Some(device) = self.device else {
            debug!("resume reported without a selected device");
            return None;
        };

        if self.state == ConnectionState::Disconnecting {
            debug!(%device, %status, "ignoring resume while disconnecting");
            return None;
        }

        if status.is_success() {
            if self.state == ConnectionState::Streaming {
                debug!(%device, "resume found the stream already running");
                return None;
            }

            self.transition(ConnectionState::Connected);
            self.start_streaming(device, transport);
            return Some(SessionEvent::Connected { device });
        }

        if self.state == ConnectionState::Disconnected {
            return None;
        }
        self.transition(ConnectionState::Disconnected);
        Some(SessionEvent::Disconnected { device, status })
    }

    /// Gives up on a pending connection attempt.
    pub(crate) fn abort_connect(&mut self, transport: &dyn Transport) -> Option<SessionEvent> {
        let device = self
            .device
            .filter(|_| self.state == ConnectionState::Connecting)?;

        warn!(%device, "connection attempt timed out");
        self.transition(ConnectionState::ConnectFailed);
        transport.request_disconnect(device);
        Some(SessionEvent::ConnectFailed {
            device,
            reason: ConnectFailure::TimedOut,
        })
    }

    fn start_streaming(&mut self, device: DeviceId, transport: &dyn Transport) {
        transport.request_start_streaming(device);
        self.transition(ConnectionState::Streaming);
    }

    fn is_current(&self, device: DeviceId) -> bool {
        self.device == Some(device)
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!(from = %self.state, to = %next, "connection state transition");
        self.state = next;
    }
}
