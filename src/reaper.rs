// Evict containers that have not been sampled within the staleness window.

use crate::delta_store::DeltaStore;
use crate::metrics::{ContainerMetrics, SeriesLabels};
use crate::models::short_id;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Remove baselines and published series for every stale container. Returns the eviction count.
/// Must not run concurrently with a tick's sampling tasks.
pub fn reap(
    store: &DeltaStore,
    metrics: &ContainerMetrics,
    now: Instant,
    window: Duration,
) -> usize {
    let stale = store.stale(now, window);
    for (id, name) in &stale {
        info!(
            container = %name,
            id = %short_id(id),
            "Container gone. Removing from tracking."
        );
        metrics.remove_series(&SeriesLabels::new(name, id));
        store.remove(id);
    }
    stale.len()
}
