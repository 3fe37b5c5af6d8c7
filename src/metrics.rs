use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::time::Instant;

/// Counters describing what a [`Pool`] has done so far.
///
/// All counters only ever grow. They are updated with relaxed ordering, so a
/// snapshot taken while the pool is busy is approximate.
///
/// [`Pool`]: super::Pool
#[derive(Debug, Default)]
#[must_use]
pub struct PoolMetrics {
    created: AtomicUsize,
    reused: AtomicUsize,
    handed_off: AtomicUsize,
    create_failures: AtomicUsize,
    abandoned_waits: AtomicUsize,
    total_waiting: AtomicU64,
}

// 64bit microseconds is 580000 years - really not important
#[allow(clippy::cast_possible_truncation)]
impl PoolMetrics {
    pub(crate) fn record_waiting(&self, start: Instant) {
        let waiting = start.elapsed().as_micros() as u64;
        let _ = self.total_waiting.fetch_add(waiting, Ordering::Relaxed);
    }

    pub(crate) fn record_created(&self) {
        let _ = self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reused(&self) {
        let _ = self.reused.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handed_off(&self) {
        let _ = self.handed_off.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_create_failure(&self) {
        let _ = self.create_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned_wait(&self) {
        let _ = self.abandoned_waits.fetch_add(1, Ordering::Relaxed);
    }
}

impl PoolMetrics {
    /// Number of objects successfully created by the [`Manager`].
    ///
    /// [`Manager`]: super::Manager
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Number of acquisitions served from the idle set.
    pub fn reused(&self) -> usize {
        self.reused.load(Ordering::Relaxed)
    }

    /// Number of released objects handed directly to a waiting acquirer.
    pub fn handed_off(&self) -> usize {
        self.handed_off.load(Ordering::Relaxed)
    }

    /// Number of failed (or abandoned) object creations.
    pub fn create_failures(&self) -> usize {
        self.create_failures.load(Ordering::Relaxed)
    }

    /// Number of waiting acquisitions given up because their context ended or
    /// their future was dropped.
    pub fn abandoned_waits(&self) -> usize {
        self.abandoned_waits.load(Ordering::Relaxed)
    }

    /// Total number of microseconds acquirers spent waiting for an object at
    /// full capacity.
    pub fn microseconds_waiting(&self) -> u64 {
        self.total_waiting.load(Ordering::Relaxed)
    }
}
