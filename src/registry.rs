//! Service registry
//!
//! Maps each service identity to exactly one `ComponentRegistration`.
//! Pure data store: it never instantiates anything.

use crate::factory::ComponentRegistration;
use crate::{DiError, Lifetime, Result, ServiceId};
use ahash::RandomState;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Pick a shard count for the expected number of services.
///
/// Default DashMap uses num_cpus * 4 shards which is overkill for
/// typical containers with <50 services.
#[inline]
pub(crate) fn shard_amount(capacity: usize) -> usize {
    if capacity <= 16 {
        8
    } else if capacity <= 64 {
        16
    } else {
        32
    }
}

/// Thread-safe store of component registrations
pub(crate) struct Registry {
    registrations: DashMap<ServiceId, ComponentRegistration, RandomState>,
}

impl Registry {
    /// Create an empty registry
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with pre-allocated capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registrations: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount(capacity),
            ),
        }
    }

    /// Insert a registration, rejecting a second one for the same service.
    ///
    /// Check and insert happen under the same shard lock, so two racing
    /// registrations cannot both succeed.
    pub fn register(&self, registration: ComponentRegistration) -> Result<()> {
        match self.registrations.entry(registration.service()) {
            Entry::Occupied(existing) => Err(DiError::already_registered(*existing.key())),
            Entry::Vacant(slot) => {
                slot.insert(registration);
                Ok(())
            }
        }
    }

    /// Find the registration for a service.
    ///
    /// Returns a clone so no map guard outlives the call; activators
    /// re-enter the registry while resolving dependencies.
    #[inline]
    pub fn lookup(&self, service: &ServiceId) -> Option<ComponentRegistration> {
        self.registrations.get(service).map(|entry| entry.value().clone())
    }

    /// Check if a service is registered
    #[inline]
    pub fn contains(&self, service: &ServiceId) -> bool {
        self.registrations.contains_key(service)
    }

    /// Declared lifetime of a registered service
    #[inline]
    pub fn lifetime_of(&self, service: &ServiceId) -> Option<Lifetime> {
        self.registrations.get(service).map(|entry| entry.lifetime())
    }

    /// Get number of registered services
    #[inline]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// All registered service identities
    pub fn service_ids(&self) -> Vec<ServiceId> {
        self.registrations.iter().map(|r| *r.key()).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Settings {
        verbose: bool,
    }

    fn settings(verbose: bool) -> ComponentRegistration {
        ComponentRegistration::from_factory::<Settings, _>(Lifetime::Singleton, move |_| {
            Ok(Arc::new(Settings { verbose }))
        })
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::new();
        let id = ServiceId::of::<Settings>();

        assert!(registry.lookup(&id).is_none());
        assert!(registry.is_empty());

        registry.register(settings(true)).unwrap();

        let registration = registry.lookup(&id).unwrap();
        assert_eq!(registration.service(), id);
        assert_eq!(registry.lifetime_of(&id), Some(Lifetime::Singleton));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.service_ids(), vec![id]);
    }

    #[test]
    fn test_duplicate_rejected_and_original_kept() {
        let registry = Registry::new();
        registry.register(settings(true)).unwrap();

        let err = registry.register(settings(false)).unwrap_err();
        assert!(matches!(err, DiError::AlreadyRegistered { .. }));
        assert_eq!(registry.len(), 1);

        let container = crate::Container::new();
        let instance = registry
            .lookup(&ServiceId::of::<Settings>())
            .unwrap()
            .activate(&container)
            .unwrap();
        let settings = instance.downcast_ref::<Arc<Settings>>().unwrap();
        assert!(settings.verbose);
    }

    #[test]
    fn test_shard_amount() {
        assert_eq!(shard_amount(0), 8);
        assert_eq!(shard_amount(40), 16);
        assert_eq!(shard_amount(500), 32);
    }
}
