// Remembers recent "no workspace for this host" results so bots and typo
// traffic don't hammer the catalog. Only definitive not-found results are
// recorded; catalog errors must stay uncached so the next request retries.

use crate::metrics_defs::{NEGATIVE_CACHE_HIT, NEGATIVE_CACHE_MISS};
use moka::sync::Cache;
use shared::counter;
use std::time::Duration;

const SIZE: u64 = 10_000;
const TTL_SECS: u64 = 60;

pub struct NegativeCache {
    cache: Cache<String, ()>,
}

impl NegativeCache {
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(SIZE)
            .time_to_live(Duration::from_secs(TTL_SECS))
            .build();

        NegativeCache { cache }
    }

    pub fn mark_not_found(&self, host: &str) {
        self.cache.insert(host.to_string(), ());
    }

    pub fn recently_not_found(&self, host: &str) -> bool {
        let cache_hit = self.cache.contains_key(host);
        let metric_def = if cache_hit {
            NEGATIVE_CACHE_HIT
        } else {
            NEGATIVE_CACHE_MISS
        };
        counter!(metric_def).increment(1);
        cache_hit
    }
}

impl Default for NegativeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_marked_hosts() {
        let cache = NegativeCache::new();
        assert!(!cache.recently_not_found("nobody.example.com"));

        cache.mark_not_found("nobody.example.com");
        assert!(cache.recently_not_found("nobody.example.com"));
        assert!(!cache.recently_not_found("somebody.example.com"));
    }
}
