//! Routes `tracing` events from the core crate to the browser console.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use wasm_bindgen::JsValue;
use web_sys::console;

/// Writes one formatted line at the given level.
pub type LineWriter = fn(Level, &str);

/// A `tracing` layer that prints each event as a single console line:
/// `LEVEL target: message key=value ...`.
pub struct ConsoleLayer {
    max_level: Level,
    write: LineWriter,
}

impl ConsoleLayer {
    pub fn new(max_level: Level) -> Self {
        Self::with_writer(max_level, write_console)
    }

    pub fn with_writer(max_level: Level, write: LineWriter) -> Self {
        Self { max_level, write }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        *metadata.level() <= self.max_level
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut line = LineVisitor::default();
        event.record(&mut line);
        (self.write)(
            *metadata.level(),
            &format!(
                "{} {}: {}{}",
                metadata.level(),
                metadata.target(),
                line.message,
                line.fields
            ),
        );
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

fn write_console(level: Level, line: &str) {
    let line = JsValue::from_str(line);
    match level {
        Level::ERROR => console::error_1(&line),
        Level::WARN => console::warn_1(&line),
        Level::INFO => console::info_1(&line),
        _ => console::debug_1(&line),
    }
}

/// Install the console layer as the global subscriber.
///
/// Only the first call installs anything; later calls are no-ops.
pub fn init(max_level: Level) {
    let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(max_level));
    let _ = tracing::subscriber::set_global_default(subscriber);
}
