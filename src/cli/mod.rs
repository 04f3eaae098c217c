pub(crate) mod command;
pub(crate) mod discover;
pub(crate) mod output;
pub(crate) mod stream;
pub(crate) mod ui;

pub use self::command::{Args, Command, LogLevel, OutputFormat, SimulatorArgs};
pub use self::discover::DiscoverArgs;
pub use self::stream::StreamArgs;
