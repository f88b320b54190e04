use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
///
/// Other crates stay at `warn`; only the client's own targets get louder.
pub fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    format!("warn,nai={level}")
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `-v`.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
