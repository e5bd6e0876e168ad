use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global `tracing` subscriber that prints events to stdout.
///
/// `default_directive` (e.g. `"funnel_extract=info"`) applies unless `RUST_LOG` is set. Returns
/// `false` if a global subscriber was already installed, in which case nothing changes.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::init_logging;

    #[test]
    fn second_init_is_harmless() {
        let _ = init_logging("funnel_extract=debug");
        assert!(!init_logging("funnel_extract=info"));
    }
}
