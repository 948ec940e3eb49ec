// Docker container list + one-shot stats via bollard

mod stats;

pub use stats::to_snapshot;

use crate::config::{DockerConfig, DockerEndpoint};
use crate::error::SourceError;
use crate::models::{ContainerRef, StatsSnapshot};
use crate::source::SnapshotSource;
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};

const PING_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    /// Build a client for the configured endpoint and negotiate the API version.
    /// Does not verify reachability; call `ping` for that.
    pub async fn connect(config: &DockerConfig) -> anyhow::Result<Self> {
        let docker = match config.endpoint() {
            DockerEndpoint::Tcp(addr) => {
                info!("Connecting to Docker on {}...", addr);
                Docker::connect_with_http(
                    &addr,
                    config.connect_timeout_secs,
                    bollard::API_DEFAULT_VERSION,
                )?
            }
            DockerEndpoint::LocalDefault => {
                info!("Connecting to Docker on default socket (/var/run/docker.sock)...");
                Docker::connect_with_defaults()?
            }
        };
        let docker = docker.negotiate_version().await?;
        Ok(Self { docker })
    }

    /// Fail-fast reachability check used at startup.
    pub async fn ping(&self) -> anyhow::Result<()> {
        tokio::time::timeout(PING_TIMEOUT, self.docker.ping())
            .await
            .map_err(|_| anyhow::anyhow!("ping timed out after {:?}", PING_TIMEOUT))??;
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    async fn list_containers(&self) -> Result<Vec<ContainerRef>, SourceError> {
        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);

        let filter = ListContainersOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(filter))
            .await
            .map_err(|e| SourceError::List(e.to_string()))?;

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let id = c.id?;
                let names = c.names.unwrap_or_default();
                Some(ContainerRef::from_names(id, &names))
            })
            .collect())
    }

    async fn fetch_stats(&self, id: &str) -> Result<StatsSnapshot, SourceError> {
        let options = StatsOptions {
            stream: false,
            one_shot: true,
        };
        let mut stream = self.docker.stats(id, Some(options));
        let response = match stream.next().await {
            Some(Ok(r)) => r,
            Some(Err(e)) => {
                return Err(SourceError::Fetch {
                    id: id.to_string(),
                    reason: e.to_string(),
                });
            }
            None => {
                return Err(SourceError::Fetch {
                    id: id.to_string(),
                    reason: "empty stats stream".into(),
                });
            }
        };
        to_snapshot(&response).map_err(|reason| SourceError::Decode {
            id: id.to_string(),
            reason,
        })
    }
}
