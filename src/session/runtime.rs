use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, instrument, trace};

use super::facade::{SessionFacade, SessionSnapshot};
use super::model::{ConnectionState, DeviceInfo, SessionEvent};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::transport::{Transport, TransportEvent};

/// Stream of events published by a running session.
pub type SessionEvents = UnboundedReceiverStream<SessionEvent>;

/// Everything the session actor consumes, in arrival order.
#[derive(Debug)]
enum SessionInput {
    Command(SessionCommand),
    Transport(TransportEvent),
}

#[derive(Debug)]
enum SessionCommand {
    BeginDiscovery(oneshot::Sender<Result<(), SessionError>>),
    CancelDiscovery(oneshot::Sender<bool>),
    ConnectToDiscovered(oneshot::Sender<Result<DeviceInfo, SessionError>>),
    Disconnect(oneshot::Sender<bool>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Delivers transport events into a running session.
///
/// Delivery never blocks, so transports may call it from any thread or callback.
#[derive(Debug, Clone)]
pub struct EventSender {
    inbound: mpsc::UnboundedSender<SessionInput>,
}

impl EventSender {
    /// Queues one event. Returns `false` once the session has stopped.
    pub fn deliver(&self, event: TransportEvent) -> bool {
        match self.inbound.send(SessionInput::Transport(event)) {
            Ok(()) => true,
            Err(_closed) => {
                trace!("dropping transport event for a stopped session");
                false
            }
        }
    }
}

/// Client handle to a running session.
///
/// The session tears down when [`SessionHandle::shutdown`] is called or the
/// last clone of the handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inbound: mpsc::UnboundedSender<SessionInput>,
    shutdown: CancellationToken,
    _shutdown_on_drop: Arc<DropGuard>,
}

impl SessionHandle {
    /// Starts a fresh discovery.
    ///
    /// # Errors
    ///
    /// Returns the facade's rejection, or [`SessionError::SessionClosed`].
    pub async fn begin_discovery(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::BeginDiscovery).await?
    }

    /// Stops the running scan. Returns `false` when no scan was accepting devices.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionClosed`] after shutdown.
    pub async fn cancel_discovery(&self) -> Result<bool, SessionError> {
        self.request(SessionCommand::CancelDiscovery).await
    }

    /// Connects to the first discovered device.
    ///
    /// # Errors
    ///
    /// Returns the facade's rejection, or [`SessionError::SessionClosed`].
    pub async fn connect_to_discovered(&self) -> Result<DeviceInfo, SessionError> {
        self.request(SessionCommand::ConnectToDiscovered).await?
    }

    /// Closes the current link. Returns `false` when there was nothing to close.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionClosed`] after shutdown.
    pub async fn disconnect(&self) -> Result<bool, SessionError> {
        self.request(SessionCommand::Disconnect).await
    }

    /// Returns the current session state and discovery results.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionClosed`] after shutdown.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(SessionCommand::Snapshot).await
    }

    /// Stops the session, cancelling discovery and closing any link.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn request<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> SessionCommand,
    ) -> Result<R, SessionError> {
        let (reply, response) = oneshot::channel();
        self.inbound
            .send(SessionInput::Command(command(reply)))
            .map_err(|_closed| SessionError::SessionClosed)?;
        response.await.map_err(|_dropped| SessionError::SessionClosed)
    }
}

/// Spawns a session actor on the current tokio runtime.
///
/// `build_transport` receives the sender the transport uses to report events.
///
/// ```
/// # async fn demo() -> anyhow::Result<()> {
/// use tokio_stream::StreamExt;
///
/// let (session, mut events) =
///     pipstream::start_session(pipstream::SessionConfig::default(), |_events| {
///         pipstream::RecordingTransport::new()
///     });
/// session.begin_discovery().await?;
/// session.shutdown();
/// # let _ = events.next();
/// # Ok(())
/// # }
/// ```
pub fn start_session<T, F>(
    config: SessionConfig,
    build_transport: F,
) -> (SessionHandle, SessionEvents)
where
    T: Transport + 'static,
    F: FnOnce(EventSender) -> T,
{
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();

    let transport = build_transport(EventSender {
        inbound: inbound_tx.clone(),
    });
    let runtime = SessionRuntime {
        facade: SessionFacade::new(transport, &config),
        inbound: inbound_rx,
        events: events_tx,
        shutdown: shutdown.clone(),
        discovery_timeout: config.discovery_timeout(),
        connect_timeout: config.connect_timeout(),
        deadline: None,
    };
    tokio::spawn(runtime.run());

    let handle = SessionHandle {
        inbound: inbound_tx,
        shutdown: shutdown.clone(),
        _shutdown_on_drop: Arc::new(shutdown.drop_guard()),
    };
    (handle, UnboundedReceiverStream::new(events_rx))
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum TimedPhase {
    Discovery,
    Connect,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    phase: TimedPhase,
    // None once fired; the deadline stays recorded until the phase is left.
    at: Option<Instant>,
}

struct SessionRuntime<T> {
    facade: SessionFacade<T>,
    inbound: mpsc::UnboundedReceiver<SessionInput>,
    events: mpsc::UnboundedSender<SessionEvent>,
    shutdown: CancellationToken,
    discovery_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    deadline: Option<Deadline>,
}

impl<T: Transport> SessionRuntime<T> {
    #[instrument(skip(self), name = "session", level = "debug")]
    async fn run(mut self) {
        info!("session started");
        loop {
            let deadline = self.deadline.and_then(|deadline| deadline.at);
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                input = self.inbound.recv() => {
                    let Some(input) = input else {
                        break;
                    };
                    self.handle_input(input);
                }
                () = wait_until(deadline) => self.expire(),
            }
            self.rearm();
        }

        self.facade.teardown();
        info!("session stopped");
    }

    fn handle_input(&mut self, input: SessionInput) {
        match input {
            SessionInput::Transport(event) => {
                if let Some(event) = self.facade.handle_transport_event(event) {
                    self.publish(event);
                }
            }
            SessionInput::Command(SessionCommand::BeginDiscovery(reply)) => {
                respond(reply, self.facade.begin_discovery());
            }
            SessionInput::Command(SessionCommand::CancelDiscovery(reply)) => {
                respond(reply, self.facade.cancel_discovery());
            }
            SessionInput::Command(SessionCommand::ConnectToDiscovered(reply)) => {
                respond(reply, self.facade.connect_to_discovered());
            }
            SessionInput::Command(SessionCommand::Disconnect(reply)) => {
                respond(reply, self.facade.disconnect());
            }
            SessionInput::Command(SessionCommand::Snapshot(reply)) => {
                respond(reply, self.facade.snapshot());
            }
        }
    }

    fn expire(&mut self) {
        let Some(deadline) = self.deadline.as_mut() else {
            return;
        };
        deadline.at = None;
        match deadline.phase {
            TimedPhase::Discovery => self.facade.discovery_timed_out(),
            TimedPhase::Connect => {
                if let Some(event) = self.facade.connect_timed_out() {
                    self.publish(event);
                }
            }
        }
    }

    fn rearm(&mut self) {
        let wanted = match self.facade.state() {
            ConnectionState::Discovering => self
                .discovery_timeout
                .map(|after| (TimedPhase::Discovery, after)),
            ConnectionState::Connecting => self
                .connect_timeout
                .map(|after| (TimedPhase::Connect, after)),
            _ => None,
        };

        self.deadline = match (wanted, self.deadline) {
            (None, _) => None,
            (Some((phase, _after)), Some(armed)) if armed.phase == phase => Some(armed),
            (Some((phase, after)), _) => {
                debug!(?phase, ?after, "arming session deadline");
                Some(Deadline {
                    phase,
                    at: Some(Instant::now() + after),
                })
            }
        };
    }

    fn publish(&self, event: SessionEvent) {
        debug!(?event, "publishing session event");
        if self.events.send(event).is_err() {
            trace!("no collaborator is listening for session events");
        }
    }
}

fn respond<R>(reply: oneshot::Sender<R>, value: R) {
    if reply.send(value).is_err() {
        debug!("requester went away before the reply");
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
