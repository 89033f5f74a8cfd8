pub mod host;
pub mod metrics_defs;
