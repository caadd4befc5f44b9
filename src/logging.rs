use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Emoji-prefixed log lines: `ℹ️  INFO [12:00:00]: message`.
///
/// With `with_target` set, the emitting module is shown after the time,
/// which helps when following the scheduler at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFormatter {
    pub with_target: bool,
}

impl LogFormatter {
    pub fn new(with_target: bool) -> Self {
        Self { with_target }
    }
}

impl<S, N> FormatEvent<S, N> for LogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let timestamp = Local::now().format("%H:%M:%S%.3f");

        let (emoji, level_str) = match *metadata.level() {
            tracing::Level::TRACE => ("🔬", "TRACE"),
            tracing::Level::DEBUG => ("🐛", "DEBUG"),
            tracing::Level::INFO => ("ℹ️ ", "INFO"),
            tracing::Level::WARN => ("⚠️ ", "WARN"),
            tracing::Level::ERROR => ("❌", "ERROR"),
        };

        if self.with_target {
            write!(
                writer,
                "{} {} [{} {}]: ",
                emoji,
                level_str,
                timestamp,
                metadata.target()
            )?;
        } else {
            write!(writer, "{} {} [{}]: ", emoji, level_str, timestamp)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the verbosity flag.
pub fn init(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        "parasuite=debug,warn"
    } else {
        "parasuite=warn,error"
    };

    tracing_subscriber::fmt()
        .event_format(LogFormatter::new(verbose))
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();
}
