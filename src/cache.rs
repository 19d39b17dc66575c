//! Singleton instance cache
//!
//! One `OnceCell` per service identity. The cell is fetched (or inserted)
//! under a short shard lock, then initialised outside of it, so an activator
//! can resolve further services while its own cell is being filled.

use crate::factory::Instance;
use crate::registry::shard_amount;
use crate::{Result, ServiceId};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

type Cell = Arc<OnceCell<Instance>>;

/// Lazily populated map of singleton instances
pub(crate) struct SingletonCache {
    cells: DashMap<ServiceId, Cell, RandomState>,
}

impl SingletonCache {
    /// Create with pre-allocated capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount(capacity),
            ),
        }
    }

    /// Return the cached instance, running `activate` if there is none yet.
    ///
    /// Concurrent first calls for the same service block on the cell, so
    /// `activate` runs at most once per successful initialisation. An error
    /// leaves the cell empty and the next call tries again.
    pub fn get_or_create<F>(&self, service: ServiceId, activate: F) -> Result<Instance>
    where
        F: FnOnce() -> Result<Instance>,
    {
        let cell = self.cell(service);

        if let Some(instance) = cell.get() {
            #[cfg(feature = "logging")]
            trace!(
                target: "idiocy",
                service = service.type_name(),
                "Singleton already initialized, returning cached instance"
            );
            return Ok(Arc::clone(instance));
        }

        cell.get_or_try_init(|| {
            #[cfg(feature = "logging")]
            debug!(
                target: "idiocy",
                service = service.type_name(),
                "Singleton initializing on first access"
            );

            activate()
        })
        .map(Arc::clone)
    }

    /// Cached instance, if the singleton was already created
    #[inline]
    pub fn get(&self, service: &ServiceId) -> Option<Instance> {
        self.cells
            .get(service)
            .and_then(|cell| cell.get().map(Arc::clone))
    }

    /// Number of singletons created so far
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|cell| cell.get().is_some()).count()
    }

    /// Fetch the cell for a service, inserting an empty one if needed.
    ///
    /// Both guards are dropped before returning.
    fn cell(&self, service: ServiceId) -> Cell {
        let existing = self.cells.get(&service).map(|cell| Arc::clone(cell.value()));

        match existing {
            Some(cell) => cell,
            None => Arc::clone(self.cells.entry(service).or_default().value()),
        }
    }
}

impl Default for SingletonCache {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl std::fmt::Debug for SingletonCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonCache")
            .field("created", &self.len())
            .finish()
    }
}
