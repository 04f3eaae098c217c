mod connection;
mod discovery;
mod facade;
mod interpreter;
mod model;
mod registry;
mod runtime;

pub use self::connection::ConnectionController;
pub use self::discovery::{DiscoveryPolicy, DiscoverySession};
pub use self::facade::{SessionFacade, SessionSnapshot};
pub use self::interpreter::{RELAXING_CODE, STRESSING_CODE, StreamInterpreter, TrendCodes};
pub use self::model::{
    AnalyzerSample, ConnectFailure, ConnectionState, DeviceId, DeviceInfo, SessionEvent,
    TransportStatus, TrendState,
};
pub use self::registry::DeviceRegistry;
pub use self::runtime::{EventSender, SessionEvents, SessionHandle, start_session};
