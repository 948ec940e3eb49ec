// Domain models

mod container;
mod snapshot;

pub use container::{ContainerRef, SHORT_ID_LEN, UNKNOWN_NAME, display_name, short_id};
pub use snapshot::{BlkioEntry, CpuSample, MemorySample, NetworkSample, StatsSnapshot};
