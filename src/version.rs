// Build-time version from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml). Also used as the metric namespace.
pub const NAME: &str = env!("CARGO_PKG_NAME");

pub const FULL_NAME: &str = "Simple Docker Stats Prometheus Exporter";

/// e.g. "Simple Docker Stats Prometheus Exporter (Version: 0.1.1)"
pub fn version_line() -> String {
    format!("{} (Version: {})", FULL_NAME, VERSION)
}
