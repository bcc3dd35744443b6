//! 인메모리 캐시 -- 네임스페이스별 용량 제한과 TTL 만료
//!
//! [`MemoryCache`]는 [`CacheStore`]의 기본 구현입니다.
//! 네임스페이스(`events`, `logs:<logset>`)마다 삽입 순서를 유지하는 큐를 두고,
//! 용량을 넘으면 가장 오래된 엔트리부터 제거합니다.
//!
//! # 동시성
//! 네임스페이스는 `DashMap` 샤드에 저장되며 쓰기는 샤드 쓰기 가드 아래에서 수행됩니다.
//! 같은 네임스페이스에 대한 쓰기는 직렬화되고, 다른 네임스페이스는 독립적으로 진행됩니다.
//!
//! # 만료
//! 쓰기 시점에 해당 네임스페이스의 만료 엔트리를 정리하고,
//! 읽기 시점에는 만료 엔트리를 반환하지 않습니다.
//! 더 이상 쓰기가 없는 네임스페이스는 [`MemoryCache::purge_expired`]가 주기적으로 정리하며,
//! 비게 된 네임스페이스는 맵에서 제거됩니다.

use std::collections::VecDeque;
use std::time::Instant;

use dashmap::DashMap;
use tapflow_core::metrics as m;
use tapflow_core::pipeline::{CacheEntry, CachePayload, CacheStore, RetentionPolicy};

/// 네임스페이스 하나의 상태
#[derive(Debug)]
struct Namespace {
    policy: RetentionPolicy,
    entries: VecDeque<CacheEntry>,
}

impl Namespace {
    fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            entries: VecDeque::with_capacity(policy.cap.min(1024)),
        }
    }

    /// 만료 엔트리를 앞에서부터 제거합니다. 제거된 수를 반환합니다.
    fn prune(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        while self
            .entries
            .front()
            .is_some_and(|e| e.is_expired(self.policy.ttl, now))
        {
            self.entries.pop_front();
        }
        before - self.entries.len()
    }
}

/// `DashMap` 기반 캐시 저장소
#[derive(Debug, Default)]
pub struct MemoryCache {
    namespaces: DashMap<String, Namespace>,
}

impl MemoryCache {
    /// 빈 캐시를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 주어진 시각으로 값을 추가합니다.
    ///
    /// 가장 최근 정책이 네임스페이스에 적용됩니다.
    /// 추가 후 용량 초과분은 가장 오래된 엔트리부터 제거됩니다.
    pub fn push_at(
        &self,
        namespace: &str,
        payload: CachePayload,
        policy: RetentionPolicy,
        now: Instant,
    ) {
        let mut ns = self
            .namespaces
            .entry(namespace.to_owned())
            .or_insert_with(|| Namespace::new(policy));
        ns.policy = policy;

        let expired = ns.prune(now);
        ns.entries.push_back(CacheEntry {
            written_at: now,
            payload,
        });

        let mut evicted = 0usize;
        while ns.entries.len() > policy.cap {
            ns.entries.pop_front();
            evicted += 1;
        }

        if expired > 0 || evicted > 0 {
            tracing::trace!(namespace, expired, evicted, "cache namespace pruned");
        }
    }

    /// 주어진 시각 기준으로 만료되지 않은 엔트리를 오래된 순서로 반환합니다.
    pub fn entries_at(&self, namespace: &str, now: Instant) -> Vec<CacheEntry> {
        self.namespaces
            .get(namespace)
            .map(|ns| {
                ns.entries
                    .iter()
                    .filter(|e| !e.is_expired(ns.policy.ttl, now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 네임스페이스의 저장 엔트리 수 (만료 엔트리 포함)
    pub fn stored_len(&self, namespace: &str) -> usize {
        self.namespaces
            .get(namespace)
            .map_or(0, |ns| ns.entries.len())
    }

    /// 모든 네임스페이스에서 만료 엔트리를 제거합니다.
    ///
    /// 비게 된 네임스페이스는 삭제됩니다. 제거된 엔트리 수를 반환합니다.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// 주어진 시각 기준으로 [`purge_expired`](Self::purge_expired)를 수행합니다.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut expired = 0usize;
        let before = self.namespaces.len();
        self.namespaces.retain(|_, ns| {
            expired += ns.prune(now);
            !ns.entries.is_empty()
        });
        let dropped = before.saturating_sub(self.namespaces.len());

        if expired > 0 {
            metrics::counter!(m::CACHE_EXPIRED_TOTAL).increment(expired as u64);
            tracing::debug!(expired, dropped, "expired cache entries purged");
        }
        expired
    }

    /// 존재하는 네임스페이스 이름 목록 (정렬됨)
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }
}

impl CacheStore for MemoryCache {
    fn push(&self, namespace: &str, payload: CachePayload, policy: RetentionPolicy) {
        self.push_at(namespace, payload, policy, Instant::now());
    }

    fn entries(&self, namespace: &str) -> Vec<CacheEntry> {
        self.entries_at(namespace, Instant::now())
    }

    fn clear(&self, namespace: &str) {
        self.namespaces.remove(namespace);
    }
}
