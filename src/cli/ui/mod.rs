mod painter;
mod session_view;
mod table;

pub(crate) use self::painter::Painter;
pub(crate) use self::session_view::{DeviceListView, SessionEventView, StreamSummaryView};
