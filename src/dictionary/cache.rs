//! 查询结果缓存
//!
//! 有界 LRU，条目按写入时间过期。过期条目在读取时惰性删除，另有后台清扫。

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tokio::time::Instant;

use super::types::{LookupKey, LookupResult};

/// 缓存配置
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
    /// 为零时不启动后台清扫
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15 * 60),
            capacity: 1000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub data: Arc<LookupResult>,
    pub stored_at: Instant,
}

impl CacheRecord {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > ttl
    }
}

/// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner {
    entries: LruCache<LookupKey, CacheRecord>,
    stats: CacheStats,
}

/// 查询结果缓存
pub struct ResultCache {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            ttl: config.ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 读取未过期的结果；过期条目在此删除
    pub fn get(&self, key: &LookupKey) -> Option<Arc<LookupResult>> {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(record) if !record.is_expired(self.ttl, now) => {
                inner.stats.hits += 1;
                return Some(record.data.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.pop(key);
            inner.stats.expired += 1;
        }
        inner.stats.misses += 1;
        None
    }

    /// 与 [`get`](Self::get) 相同但不影响统计和 LRU 顺序
    pub fn peek(&self, key: &LookupKey) -> Option<Arc<LookupResult>> {
        let now = Instant::now();
        let inner = self.lock();
        inner
            .entries
            .peek(key)
            .filter(|record| !record.is_expired(self.ttl, now))
            .map(|record| record.data.clone())
    }

    /// 写入结果，替换同键旧值
    pub fn put(&self, key: LookupKey, data: Arc<LookupResult>) {
        let record = CacheRecord {
            data,
            stored_at: Instant::now(),
        };

        let mut guard = self.lock();
        let inner = &mut *guard;
        if let Some((evicted_key, _)) = inner.entries.push(key.clone(), record) {
            if evicted_key != key {
                inner.stats.evictions += 1;
                tracing::trace!("缓存已满，淘汰: {}", evicted_key);
            }
        }
        inner.stats.inserts += 1;
    }

    /// 删除所有过期条目，返回删除数量
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let stale: Vec<LookupKey> = inner
            .entries
            .iter()
            .filter(|(_, record)| record.is_expired(self.ttl, now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            inner.entries.pop(key);
        }
        inner.stats.expired += stale.len() as u64;
        stale.len()
    }

    /// 清空缓存，返回删除数量
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.entries.len(),
            ..inner.stats
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
