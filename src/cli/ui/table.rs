use std::fmt::{self, Display, Formatter};

use strum::IntoEnumIterator;
use tabled::{builder::Builder, settings::Style as TableStyle};

use crate::cli::stream::TrendTally;
use crate::session::{DeviceInfo, TrendState};

use super::painter::Painter;
use super::session_view::trend_label;

/// Rounded tables for device lists and stream summaries.
#[derive(Debug)]
pub(crate) struct Table {
    inner: tabled::Table,
}

impl Table {
    /// One row per discovered device, in discovery order.
    pub(crate) fn devices(painter: &Painter, devices: &[DeviceInfo]) -> Self {
        let rows = devices.iter().map(|device| {
            [
                device.id().to_string(),
                painter.value(device.display_name()),
            ]
        });
        Self::build(["id", "name"], rows)
    }

    /// Sample counts for every trend state, including empty ones.
    pub(crate) fn tally(tally: &TrendTally) -> Self {
        let rows = TrendState::iter().map(|state| {
            [
                trend_label(state).to_string(),
                tally.count(state).to_string(),
            ]
        });
        Self::build(["trend", "samples"], rows)
    }

    /// Field/value pairs with muted field names.
    pub(crate) fn key_value(painter: &Painter, rows: Vec<(&str, String)>) -> Self {
        let rows = rows
            .into_iter()
            .map(|(field, value)| [painter.muted(field), value]);
        Self::build(["field", "value"], rows)
    }

    fn build(headers: [&str; 2], rows: impl IntoIterator<Item = [String; 2]>) -> Self {
        let mut builder = Builder::default();
        builder.push_record(headers);
        for row in rows {
            builder.push_record(row);
        }
        let mut inner = builder.build();
        inner.with(TableStyle::rounded());
        Self { inner }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}
