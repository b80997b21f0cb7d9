use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise warnings only, plus our own debug output in debug mode.
fn env_filter(debug: bool) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    build_filter(rust_log.as_deref(), debug)
}

fn build_filter(rust_log: Option<&str>, debug: bool) -> EnvFilter {
    let from_env = rust_log
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok());
    if let Some(env_filter) = from_env {
        return env_filter;
    }

    let mut env_filter = EnvFilter::default().add_directive(tracing::Level::WARN.into());
    if debug {
        if let Ok(parsed) = "docchat=debug".parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }

    env_filter
}

pub fn default_log_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;

    Ok(cache_dir.join("docchat").join("docchat.log"))
}

/// Log to a file so output does not draw over the TUI.
pub fn init_file(path: &Path, debug: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

/// Log to stderr for one-shot commands.
pub fn init_stderr(debug: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialise logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_overrides_defaults() {
        let filter = build_filter(Some("info"), false).to_string();
        assert_eq!(filter, "info");

        let filter = build_filter(Some("reqwest=trace"), true).to_string();
        assert!(filter.contains("reqwest=trace"));
        assert!(!filter.contains("docchat=debug"));
    }

    #[test]
    fn test_unset_or_invalid_rust_log_falls_back_to_warn() {
        assert_eq!(build_filter(None, false).to_string(), "warn");
        assert_eq!(build_filter(Some("  "), false).to_string(), "warn");
        assert_eq!(build_filter(Some("docchat=loud"), false).to_string(), "warn");
    }

    #[test]
    fn test_debug_mode_adds_crate_directive() {
        let filter = build_filter(None, true).to_string();
        assert!(filter.contains("warn"));
        assert!(filter.contains("docchat=debug"));
    }
}
