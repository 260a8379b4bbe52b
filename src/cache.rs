//! In-memory TTL cache for expensive analysis results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const ANALYSIS_TTL: Duration = Duration::from_secs(1800);
pub const DOMAIN_INFO_TTL: Duration = Duration::from_secs(3600);
pub const BACKLINKS_TTL: Duration = Duration::from_secs(7200);

struct Entry {
    value: Value,
    expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub active_entries: usize,
    pub expired_entries: usize,
}

#[derive(Clone)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::with_capacity(64)),
        }
    }

    /// Expired entries are evicted on read, not just by `cleanup_expired`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn remove_containing(&self, fragment: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(fragment));
        before.saturating_sub(self.entries.len())
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut active = 0;
        let mut expired = 0;
        for entry in self.entries.iter() {
            if entry.expires_at > now {
                active += 1;
            } else {
                expired += 1;
            }
        }
        CacheStats {
            total_entries: active + expired,
            active_entries: active,
            expired_entries: expired,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Namespaced view over [`MemoryCache`] with one TTL per payload kind.
#[derive(Clone)]
pub struct AnalysisCache {
    inner: MemoryCache,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(),
        }
    }

    pub fn get_analysis(&self, domain: &str) -> Option<Value> {
        self.inner.get(&analysis_key(domain))
    }

    pub fn store_analysis(&self, domain: &str, payload: Value) {
        self.inner.set(&analysis_key(domain), payload, ANALYSIS_TTL);
    }

    pub fn get_domain_info(&self, domain: &str) -> Option<Value> {
        self.inner.get(&domain_info_key(domain))
    }

    pub fn store_domain_info(&self, domain: &str, payload: Value) {
        self.inner
            .set(&domain_info_key(domain), payload, DOMAIN_INFO_TTL);
    }

    pub fn get_backlinks(&self, domain: &str) -> Option<Value> {
        self.inner.get(&backlinks_key(domain))
    }

    pub fn store_backlinks(&self, domain: &str, payload: Value) {
        self.inner.set(&backlinks_key(domain), payload, BACKLINKS_TTL);
    }

    /// Drops every cached payload whose key mentions `domain`.
    pub fn invalidate_domain(&self, domain: &str) -> usize {
        self.inner.remove_containing(domain)
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn cleanup_expired(&self) -> usize {
        self.inner.cleanup_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new()
    }
}

fn analysis_key(domain: &str) -> String {
    format!("analysis:{domain}:full")
}

fn domain_info_key(domain: &str) -> String {
    format!("domain_info:{domain}")
}

fn backlinks_key(domain: &str) -> String {
    format!("backlinks:{domain}")
}
