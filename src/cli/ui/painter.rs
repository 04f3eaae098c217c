use owo_colors::{OwoColorize, Style as OwoStyle};

use crate::session::TrendState;

#[derive(Debug, Clone, Copy)]
enum Tone {
    Heading,
    Success,
    Warning,
    Muted,
    Value,
    Calm,
    Alert,
}

impl Tone {
    fn style(self) -> OwoStyle {
        match self {
            Tone::Heading => OwoStyle::new().bold().cyan(),
            Tone::Success => OwoStyle::new().bold().green(),
            Tone::Warning => OwoStyle::new().bold().yellow(),
            Tone::Muted => OwoStyle::new().dimmed(),
            Tone::Value => OwoStyle::new().bold(),
            Tone::Calm => OwoStyle::new().bold().blue(),
            Tone::Alert => OwoStyle::new().bold().red(),
        }
    }
}

/// Colours status output when stdout is a terminal.
#[derive(Debug)]
pub(crate) struct Painter {
    use_colour: bool,
}

impl Painter {
    pub(crate) fn new(use_colour: bool) -> Self {
        Self { use_colour }
    }

    pub(crate) fn heading<T: AsRef<str>>(&self, text: T) -> String {
        self.paint(Tone::Heading, text.as_ref())
    }

    pub(crate) fn success<T: AsRef<str>>(&self, text: T) -> String {
        self.paint(Tone::Success, text.as_ref())
    }

    pub(crate) fn warning<T: AsRef<str>>(&self, text: T) -> String {
        self.paint(Tone::Warning, text.as_ref())
    }

    pub(crate) fn muted<T: AsRef<str>>(&self, text: T) -> String {
        self.paint(Tone::Muted, text.as_ref())
    }

    pub(crate) fn value<T: AsRef<str>>(&self, text: T) -> String {
        self.paint(Tone::Value, text.as_ref())
    }

    /// Paints a trend label in the colour of its state.
    pub(crate) fn trend<T: AsRef<str>>(&self, state: TrendState, text: T) -> String {
        let tone = match state {
            TrendState::Relaxing => Tone::Calm,
            TrendState::Stressing => Tone::Alert,
            TrendState::Steady => Tone::Value,
            TrendState::Inactive => Tone::Muted,
        };
        self.paint(tone, text.as_ref())
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if self.use_colour {
            text.style(tone.style()).to_string()
        } else {
            text.to_string()
        }
    }
}
