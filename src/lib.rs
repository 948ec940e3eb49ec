// Library for tests to access modules

pub mod cli;
pub mod config;
pub mod delta_store;
pub mod docker_repo;
pub mod error;
pub mod metrics;
pub mod models;
pub mod processor;
pub mod reaper;
pub mod routes;
pub mod source;
pub mod version;
pub mod worker;
