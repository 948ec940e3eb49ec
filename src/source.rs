// Where container lists and stats snapshots come from. DockerRepo in production, fakes in tests.

use crate::error::SourceError;
use crate::models::{ContainerRef, StatsSnapshot};
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Currently running containers only.
    async fn list_containers(&self) -> Result<Vec<ContainerRef>, SourceError>;

    /// One point-in-time stats sample for `id`.
    async fn fetch_stats(&self, id: &str) -> Result<StatsSnapshot, SourceError>;
}
