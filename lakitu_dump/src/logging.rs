use once_cell::sync::{Lazy, OnceCell};
use std::{
    backtrace::Backtrace,
    error::Error,
    fmt, fs,
    io::Write,
    panic::{self, PanicInfo},
    path::Path,
    sync::Mutex,
};
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_log::LogTracer;
use tracing_subscriber::{
    layer::Context, prelude::__tracing_subscriber_SubscriberExt, registry::LookupSpan, Layer,
};

static LOG_FILE: OnceCell<Mutex<fs::File>> = OnceCell::new();
static MAX_LEVEL: Lazy<Mutex<Level>> = Lazy::new(|| Mutex::new(Level::INFO));

/// Installs the global subscriber. Events are written to stderr and, if given, appended
/// to `log_file_path`.
pub(crate) fn init(log_file_path: Option<&Path>, verbose: bool) -> Result<(), Box<dyn Error>> {
    if let Some(path) = log_file_path {
        let log_file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)?;
        LOG_FILE
            .set(Mutex::new(log_file))
            .map_err(|_| "called logging::init more than once")?;
    }
    if verbose {
        *MAX_LEVEL.lock().unwrap_or_else(|e| e.into_inner()) = Level::DEBUG;
    }

    panic::set_hook(Box::new(panic_hook));
    LogTracer::init()?;
    tracing::subscriber::set_global_default(
        tracing_subscriber::Registry::default().with(LogLayer),
    )?;
    Ok(())
}

fn print_to_log_file(line: &str) {
    if let Some(log_file) = LOG_FILE.get() {
        let mut log_file = log_file.lock().unwrap_or_else(|e| e.into_inner());
        // A failed write has nowhere better to be reported.
        let _ = writeln!(log_file, "{}", line).and_then(|_| log_file.flush());
    }
}

fn log_callback(level: Level, message: &str) {
    let max_level = *MAX_LEVEL.lock().unwrap_or_else(|e| e.into_inner());
    if level <= max_level {
        let timestamp = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string();

        let line = format!("[{}] [{}] {}", timestamp, level, message);

        eprintln!("{}", line);
        print_to_log_file(&line);
    }
}

fn panic_hook(info: &PanicInfo<'_>) {
    let location = info
        .location()
        .map(|location| location.to_string())
        .unwrap_or_else(|| "<unknown>".to_owned());
    let msg = match info.payload().downcast_ref::<&'static str>() {
        Some(s) => *s,
        None => match info.payload().downcast_ref::<String>() {
            Some(s) => &s[..],
            None => "Box<Any>",
        },
    };
    let backtrace = Backtrace::force_capture();

    tracing::error!("Panicked at {}: {}\n{}", location, msg, backtrace);
}

struct LogLayer;

#[derive(Default)]
struct MessageVisitor {
    message: String,
    log_target: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "log.target" {
            self.log_target = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

impl<S> Layer<S> for LogLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let span = if let Some(scope) = ctx.event_scope(event) {
            format!(
                "[{}] ",
                scope
                    .from_root()
                    .map(|span| span.name())
                    .collect::<Vec<_>>()
                    .join(".")
            )
        } else {
            String::new()
        };

        let metadata = event.metadata();

        let target = visitor
            .log_target
            .unwrap_or_else(|| metadata.target().to_string());

        let message = format!("{}[{}] {}", span, target, visitor.message);

        log_callback(*metadata.level(), &message);
    }
}
