use std::fmt;
use std::io::IsTerminal;

use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

// ANSI color codes
struct Colors {
    reset: &'static str,
    red: &'static str,
    yellow: &'static str,
    green: &'static str,
    cyan: &'static str,
    gray: &'static str,
}

impl Colors {
    fn new() -> Self {
        // Check if stderr is a TTY (terminal)
        if std::io::stderr().is_terminal() {
            Self {
                reset: "\x1b[0m",
                red: "\x1b[91m",
                yellow: "\x1b[93m",
                green: "\x1b[92m",
                cyan: "\x1b[96m",
                gray: "\x1b[90m",
            }
        } else {
            Self {
                reset: "",
                red: "",
                yellow: "",
                green: "",
                cyan: "",
                gray: "",
            }
        }
    }

    fn level_color(&self, level: Level) -> &'static str {
        match level {
            Level::ERROR => self.red,
            Level::WARN => self.yellow,
            Level::INFO => self.green,
            Level::DEBUG => self.cyan,
            _ => self.gray,
        }
    }
}

/// `2025-01-31 12:00:00,123 - INFO - message key=value`, on stderr.
struct LineFormat {
    colors: Colors,
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        let level = *event.metadata().level();
        write!(
            writer,
            "{timestamp} - {}{level}{} - ",
            self.colors.level_color(level),
            self.colors.reset
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Default filter directive for a `-v` count.
#[must_use]
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over `verbose`.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(LineFormat {
            colors: Colors::new(),
        })
        .try_init();
    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "info");
        assert_eq!(default_directive(2), "debug");
        assert_eq!(default_directive(7), "debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(0);
        init(2);
    }
}
