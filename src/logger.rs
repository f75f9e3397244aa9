//! Structured logging (C13), set up the way the rest of this family of
//! crates does it: `tracing` events, routed through `tracing-subscriber`
//! with an `EnvFilter`, plus a `LogTracer` bridge so any dependency still
//! using the plain `log` facade ends up in the same stream.

use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// Configures the global subscriber. `level` is the filter used when
/// `RUST_LOG` is not set, e.g. `"scsi_dispatch_core=info"`.
pub fn init(level: &str) {
    LogTracer::init().expect("failed to initialise LogTracer");

    let builder = tracing_subscriber::fmt::Subscriber::builder().with_ansi(ansi_enabled());

    let subscriber = match EnvFilter::try_from_default_env() {
        Ok(filter) => builder.with_env_filter(filter).finish(),
        Err(_) => builder.with_env_filter(level).finish(),
    };

    tracing::subscriber::set_global_default(subscriber)
        .expect("failed to set default subscriber");
}

fn ansi_enabled() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}
