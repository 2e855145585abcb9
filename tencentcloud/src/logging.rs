//! Log setup and per-operation log helpers

use std::time::Instant;
use tfplug::Context;
use tracing::Level;

/// Maps the TF_LOG convention onto a tracing level. Unset or unknown → INFO.
pub fn level_from_tf_log(value: Option<&str>) -> Level {
    match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") | Some("JSON") => Level::TRACE,
        Some("DEBUG") => Level::DEBUG,
        Some("WARN") => Level::WARN,
        Some("ERROR") => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Installs a fmt subscriber writing to stderr. Safe to call more than once.
pub fn init() {
    let level = level_from_tf_log(std::env::var("TF_LOG").ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Span wrapping one lifecycle operation of a resource
pub fn operation_span(type_name: &str, operation: &'static str, ctx: &Context) -> tracing::Span {
    tracing::info_span!(
        "resource",
        type_name = %type_name,
        operation = operation,
        log_id = %ctx.log_id()
    )
}

/// Logs how long an operation took when dropped
pub struct Elapsed {
    label: String,
    started: Instant,
}

impl Elapsed {
    pub fn start(type_name: &str, operation: &str) -> Self {
        Self {
            label: format!("resource.{}.{}", type_name, operation),
            started: Instant::now(),
        }
    }
}

impl Drop for Elapsed {
    fn drop(&mut self) {
        tracing::debug!(
            "[ELAPSED] {} elapsed {} ms",
            self.label,
            self.started.elapsed().as_millis()
        );
    }
}
