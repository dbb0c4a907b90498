//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events; binaries call [`init`] once.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies to everything.
pub fn init(default_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_cleanly() {
        // Whichever call lands first wins; the other must error, not panic.
        let first = init("debug");
        let second = init("debug");
        assert!(first.is_err() || second.is_err());
    }
}
