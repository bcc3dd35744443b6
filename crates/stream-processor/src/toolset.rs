//! 핸들러가 사용하는 공유 서비스 묶음
//!
//! [`Toolset`]은 캐시 저장소, 인벤토리 업데이트 생산자, 호스트 싱크를
//! trait 객체로 보관합니다. 모든 프로세서가 같은 인스턴스를 공유합니다.
//!
//! [`MemorySink`]는 수신한 업데이트를 메모리에 보관하는 기본 싱크입니다.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tapflow_core::pipeline::{CacheStore, HostInventory, InventoryProducer};
use tapflow_core::record::Record;
use tapflow_core::types::InventoryUpdate;

use crate::cache::MemoryCache;

/// 공유 서비스 묶음
#[derive(Clone)]
pub struct Toolset {
    /// 네임스페이스 캐시
    pub cache: Arc<dyn CacheStore>,
    /// 인벤토리 업데이트 생산자
    pub inventory: Arc<dyn InventoryProducer>,
    /// 호스트 업데이트 싱크
    pub hosts: Arc<dyn HostInventory>,
}

impl Toolset {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        inventory: Arc<dyn InventoryProducer>,
        hosts: Arc<dyn HostInventory>,
    ) -> Self {
        Self {
            cache,
            inventory,
            hosts,
        }
    }

    /// 메모리 캐시와 메모리 싱크로 구성합니다.
    ///
    /// 생성된 캐시와 싱크도 함께 반환하므로 호출자가 결과를 조회할 수 있습니다.
    pub fn in_memory() -> (Self, Arc<MemoryCache>, Arc<MemorySink>) {
        let cache = Arc::new(MemoryCache::new());
        let sink = Arc::new(MemorySink::new());
        let toolset = Self::new(cache.clone(), sink.clone(), sink.clone());
        (toolset, cache, sink)
    }
}

impl std::fmt::Debug for Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolset").finish_non_exhaustive()
    }
}

/// 인벤토리 업데이트와 호스트 레코드를 메모리에 보관하는 싱크
#[derive(Debug, Default)]
pub struct MemorySink {
    updates: Mutex<Vec<InventoryUpdate>>,
    hosts: Mutex<Vec<Record>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 받은 인벤토리 업데이트
    pub fn updates(&self) -> Vec<InventoryUpdate> {
        lock(&self.updates).clone()
    }

    /// 지금까지 받은 호스트 레코드
    pub fn hosts(&self) -> Vec<Record> {
        lock(&self.hosts).clone()
    }
}

impl InventoryProducer for MemorySink {
    fn produce_inventory_update(&self, update: InventoryUpdate) {
        tracing::debug!(host = %update.host.id, module = %update.origin.module, "inventory update");
        lock(&self.updates).push(update);
    }
}

impl HostInventory for MemorySink {
    fn update_host(&self, record: &Record) {
        lock(&self.hosts).push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tapflow_core::types::InventoryHostFragment;

    #[test]
    fn in_memory_toolset_shares_sink() {
        let (toolset, _cache, sink) = Toolset::in_memory();
        let host = InventoryHostFragment::new("host-1").unwrap();
        toolset
            .inventory
            .produce_inventory_update(InventoryUpdate::new(host, "linux-system"));
        toolset.hosts.update_host(&Record::new(json!({ "host": { "id": "host-1" } })));

        assert_eq!(sink.updates().len(), 1);
        assert!(sink.updates()[0].origin.inventory_update);
        assert_eq!(sink.hosts().len(), 1);
    }
}
