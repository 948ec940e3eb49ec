use crate::cli::Cli;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Polling intervals below this are clamped up at startup.
pub const MIN_INTERVAL_SECS: u64 = 3;

/// Upper bound on the polling interval; one day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub docker: DockerConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 9487,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Remote daemon address; when unset the local default socket (or $DOCKER_HOST) is used.
    pub host_ip: Option<String>,
    pub host_port: Option<u16>,
    pub connect_timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            host_ip: None,
            host_port: None,
            connect_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub interval_secs: u64,
    /// Max concurrent stats calls against the daemon per tick.
    pub max_workers: usize,
    /// A container is evicted once unseen for `interval_secs * staleness_factor`.
    pub staleness_factor: u32,
    pub fetch_timeout_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            max_workers: 10,
            staleness_factor: 2,
            fetch_timeout_secs: 10,
        }
    }
}

/// Where to reach the Docker daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    LocalDefault,
    Tcp(String),
}

impl DockerConfig {
    pub fn endpoint(&self) -> DockerEndpoint {
        match (&self.host_ip, self.host_port) {
            (Some(ip), Some(port)) if !ip.is_empty() => {
                DockerEndpoint::Tcp(format!("tcp://{}:{}", ip, port))
            }
            _ => DockerEndpoint::LocalDefault,
        }
    }
}

impl MonitoringConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Saturates at `Duration::MAX` rather than overflowing.
    pub fn staleness_window(&self) -> Duration {
        self.interval()
            .checked_mul(self.staleness_factor)
            .unwrap_or(Duration::MAX)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl AppConfig {
    /// Defaults, then the config file (if any), then CLI flags.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let explicit = cli
            .config
            .clone()
            .or_else(|| std::env::var("CONFIG_FILE").ok().map(PathBuf::from));
        let mut config = match explicit {
            Some(path) => {
                let s = std::fs::read_to_string(&path).map_err(|e| {
                    anyhow::anyhow!("reading config {}: {}", path.display(), e)
                })?;
                toml::from_str(&s)?
            }
            None => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
                Ok(s) => toml::from_str(&s)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
                Err(e) => return Err(e.into()),
            },
        };
        config.apply_cli(cli);
        config.finish()
    }

    /// Parse, normalize and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.finish()
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(interval) = cli.interval {
            self.monitoring.interval_secs = interval;
        }
        if let Some(workers) = cli.workers {
            self.monitoring.max_workers = workers;
        }
        if let Some(ip) = &cli.host_ip {
            self.docker.host_ip = Some(ip.clone());
        }
        if let Some(port) = cli.host_port {
            self.docker.host_port = Some(port);
        }
    }

    fn finish(mut self) -> anyhow::Result<Self> {
        self.normalize();
        self.validate()?;
        Ok(self)
    }

    fn normalize(&mut self) {
        if self.monitoring.interval_secs < MIN_INTERVAL_SECS {
            tracing::warn!(
                configured = self.monitoring.interval_secs,
                min = MIN_INTERVAL_SECS,
                "interval below minimum; clamping"
            );
            self.monitoring.interval_secs = MIN_INTERVAL_SECS;
        }
        if self.docker.host_ip.as_deref() == Some("") {
            self.docker.host_ip = None;
        }
        if self.docker.host_port == Some(0) {
            self.docker.host_port = None;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.monitoring.interval_secs <= MAX_INTERVAL_SECS,
            "monitoring.interval_secs must be <= {}, got {}",
            MAX_INTERVAL_SECS,
            self.monitoring.interval_secs
        );
        anyhow::ensure!(
            self.monitoring.max_workers > 0,
            "monitoring.max_workers must be > 0, got {}",
            self.monitoring.max_workers
        );
        anyhow::ensure!(
            self.monitoring.max_workers <= Semaphore::MAX_PERMITS,
            "monitoring.max_workers must be <= {}, got {}",
            Semaphore::MAX_PERMITS,
            self.monitoring.max_workers
        );
        anyhow::ensure!(
            self.monitoring.staleness_factor > 0,
            "monitoring.staleness_factor must be > 0, got {}",
            self.monitoring.staleness_factor
        );
        anyhow::ensure!(
            self.monitoring.fetch_timeout_secs > 0,
            "monitoring.fetch_timeout_secs must be > 0, got {}",
            self.monitoring.fetch_timeout_secs
        );
        anyhow::ensure!(
            self.docker.host_ip.is_some() == self.docker.host_port.is_some(),
            "docker.host_ip and docker.host_port must be set together"
        );
        Ok(())
    }
}
