use std::io;

use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use crate::session::{SessionEvent, SessionSnapshot};
use crate::terminal::TerminalClient;

use super::command::OutputFormat;
use super::stream::StreamSummary;
use super::ui::{DeviceListView, Painter, SessionEventView, StreamSummaryView};

/// Writes command output in the selected format.
///
/// Progress lines only appear in pretty output; JSON output is one object per line.
pub(crate) struct Reporter<'a, W> {
    out: &'a mut W,
    format: OutputFormat,
    painter: Painter,
}

impl<'a, W> Reporter<'a, W>
where
    W: io::Write,
{
    pub(crate) fn new(
        out: &'a mut W,
        format: OutputFormat,
        terminal_client: &dyn TerminalClient,
    ) -> Self {
        let use_colour = format == OutputFormat::Pretty && terminal_client.stdout_is_terminal();
        Self {
            out,
            format,
            painter: Painter::new(use_colour),
        }
    }

    pub(crate) fn progress(&mut self, message: &str) -> Result<()> {
        if self.format == OutputFormat::Pretty {
            writeln!(self.out, "{}", self.painter.muted(message))?;
        }
        Ok(())
    }

    pub(crate) fn event(&mut self, event: &SessionEvent) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(self.out, "{}", SessionEventView::new(event, &self.painter))?;
                Ok(())
            }
            OutputFormat::Json => self.json_line(event),
        }
    }

    pub(crate) fn devices(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(self.out)?;
                writeln!(
                    self.out,
                    "{}",
                    DeviceListView::new(&snapshot.devices, &self.painter)
                )?;
                Ok(())
            }
            OutputFormat::Json => self.json_line(&json!({
                "event": "devices",
                "devices": snapshot.devices,
            })),
        }
    }

    pub(crate) fn summary(&mut self, summary: &StreamSummary) -> Result<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(self.out)?;
                writeln!(self.out, "{}", StreamSummaryView::new(summary, &self.painter))?;
                Ok(())
            }
            OutputFormat::Json => self.json_line(summary),
        }
    }

    fn json_line<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut *self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }
}
