//! Metrics definitions for tenant resolution and the connection cache.

use shared::metrics_defs::{MetricDef, MetricType};

pub const TENANT_CACHE_HIT: MetricDef = MetricDef {
    name: "tenant_cache.hit",
    metric_type: MetricType::Counter,
    description: "Connection cache lookups served from a live handle",
};

pub const TENANT_CACHE_MISS: MetricDef = MetricDef {
    name: "tenant_cache.miss",
    metric_type: MetricType::Counter,
    description: "Connection cache lookups that had to decrypt and connect",
};

pub const TENANT_CACHE_ROTATION: MetricDef = MetricDef {
    name: "tenant_cache.rotation",
    metric_type: MetricType::Counter,
    description: "Entries discarded because the connection string fingerprint changed",
};

pub const TENANT_CACHE_EVICTED_IDLE: MetricDef = MetricDef {
    name: "tenant_cache.evicted_idle",
    metric_type: MetricType::Counter,
    description: "Entries reclaimed by the idle-TTL sweep",
};

pub const TENANT_CACHE_EVICTED_LRU: MetricDef = MetricDef {
    name: "tenant_cache.evicted_lru",
    metric_type: MetricType::Counter,
    description: "Entries evicted least-recently-used at capacity",
};

pub const NEGATIVE_CACHE_HIT: MetricDef = MetricDef {
    name: "tenant_resolver.negative_cache.hit",
    metric_type: MetricType::Counter,
    description: "Domain lookups short-circuited by a cached not-found",
};

pub const NEGATIVE_CACHE_MISS: MetricDef = MetricDef {
    name: "tenant_resolver.negative_cache.miss",
    metric_type: MetricType::Counter,
    description: "Domain lookups that went through to the catalog",
};

pub const RESOLVER_RESOLVED: MetricDef = MetricDef {
    name: "tenant_resolver.resolved",
    metric_type: MetricType::Counter,
    description: "Requests resolved to a ready tenant",
};

pub const RESOLVER_UNKNOWN_HOST: MetricDef = MetricDef {
    name: "tenant_resolver.unknown_host",
    metric_type: MetricType::Counter,
    description: "Requests whose host matched no workspace",
};

pub const RESOLVER_NOT_READY: MetricDef = MetricDef {
    name: "tenant_resolver.not_ready",
    metric_type: MetricType::Counter,
    description: "Requests for workspaces still provisioning or failed",
};

pub const RESOLVER_ERROR: MetricDef = MetricDef {
    name: "tenant_resolver.error",
    metric_type: MetricType::Counter,
    description: "Resolutions that failed closed on an internal error",
};

pub const ALL_METRICS: &[MetricDef] = &[
    TENANT_CACHE_HIT,
    TENANT_CACHE_MISS,
    TENANT_CACHE_ROTATION,
    TENANT_CACHE_EVICTED_IDLE,
    TENANT_CACHE_EVICTED_LRU,
    NEGATIVE_CACHE_HIT,
    NEGATIVE_CACHE_MISS,
    RESOLVER_RESOLVED,
    RESOLVER_UNKNOWN_HOST,
    RESOLVER_NOT_READY,
    RESOLVER_ERROR,
];
