//! Test doubles.

use async_trait::async_trait;
use edgesync_core::store::{EntityRepository, MemoryRepository, StoredEntity};
use edgesync_core::{CoreError, CoreResult, EntityId, EventQueue, TenantId};
use edgesync_engine::{FollowUpRequest, FollowUpRequester, SyncError, SyncResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A repository that fails on demand.
///
/// Reads and writes go to an inner [`MemoryRepository`] until failure is
/// switched on, after which they return a storage error without touching
/// it.
#[derive(Debug)]
pub struct FailingRepository<E> {
    inner: MemoryRepository<E>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl<E: StoredEntity> FailingRepository<E> {
    /// Creates a repository recording changes into `events`.
    pub fn new(events: Arc<EventQueue>) -> Self {
        Self {
            inner: MemoryRepository::new(events),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes reads fail or succeed.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes writes fail or succeed.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored entities.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn check(flag: &AtomicBool, op: &str) -> CoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(CoreError::storage(format!("{} {op} unavailable", E::KIND)));
        }
        Ok(())
    }
}

#[async_trait]
impl<E: StoredEntity> EntityRepository<E> for FailingRepository<E> {
    async fn find_by_id(&self, tenant_id: TenantId, id: EntityId) -> CoreResult<Option<E>> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.find_by_id(tenant_id, id).await
    }

    async fn upsert(&self, tenant_id: TenantId, entity: E) -> CoreResult<()> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.upsert(tenant_id, entity).await
    }

    async fn delete(&self, tenant_id: TenantId, id: EntityId) -> CoreResult<bool> {
        Self::check(&self.fail_writes, "write")?;
        self.inner.delete(tenant_id, id).await
    }

    async fn list(&self, tenant_id: TenantId) -> CoreResult<Vec<E>> {
        Self::check(&self.fail_reads, "read")?;
        self.inner.list(tenant_id).await
    }
}

/// A follow-up requester that keeps every request it is given.
#[derive(Debug, Default)]
pub struct RecordingRequester {
    requests: Mutex<Vec<FollowUpRequest>>,
    closed: AtomicBool,
}

impl RecordingRequester {
    /// Creates an open requester.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes further requests fail as if the session had gone away.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<FollowUpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl FollowUpRequester for RecordingRequester {
    async fn request(&self, request: FollowUpRequest) -> SyncResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SyncError::ChannelClosed);
        }
        self.requests.lock().push(request);
        Ok(())
    }
}
